//! Fuzz target for table CSV parsing.
//!
//! Also exercises fractured-row selection on every accepted table.

#![no_main]

use augsync::ir::io_table_csv::from_table_csv_slice;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    if let Ok(table) = from_table_csv_slice(data) {
        for source in table.fractured_rows() {
            let _ = table.with_image_id(&source, "IMG0000001.jpg");
        }
    }
});
