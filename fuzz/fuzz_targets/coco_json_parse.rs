//! Fuzz target for annotation store parsing.
//!
//! Feeds arbitrary bytes to the COCO JSON parser, then checks that any
//! store it accepts can be written back and parsed again.
//!
//! Run with:
//!   cargo +nightly fuzz run coco_json_parse

#![no_main]

use augsync::ir::io_coco_json::{from_coco_slice, from_coco_str, to_coco_string};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // 10MB is generous for annotation files.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let Ok(store) = from_coco_slice(data) else {
        return;
    };
    if let Ok(json) = to_coco_string(&store) {
        let _ = from_coco_str(&json);
    }
});
