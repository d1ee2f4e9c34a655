//! Fuzz target for case-record CSV ingestion.

#![no_main]

use cv_core::dataset::read_records;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = read_records(data);
});
