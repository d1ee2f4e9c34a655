//! Fuzz target for engine.json parsing and validation.
//!
//! Parsing and validation must reject bad input with an error, never a panic.

#![no_main]

use cv_config::{validate_engine_config, EngineConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = EngineConfig::parse_json(text) {
        let _ = validate_engine_config(&config);
    }
});
