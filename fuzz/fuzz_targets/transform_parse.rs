//! Fuzz target for transform parsing.
//!
//! Any transform that parses and validates must resolve to a geometry for a
//! small image without panicking.

#![no_main]

use augsync::transform::Transform;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(transform) = text.parse::<Transform>() else {
        return;
    };
    if transform.validate().is_ok() {
        let _ = transform.geometry(17, 5);
        let _ = transform.to_string().parse::<Transform>();
    }
});
