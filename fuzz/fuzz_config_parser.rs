//! Fuzz target for the TOML configuration parser.
//!
//! Run with: cargo +nightly fuzz run fuzz_config_parser

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Only panics matter; validation errors are expected.
        if let Ok(config) = refdex_config::IndexConfig::parse(s) {
            let _ = config.document_root();
            let _ = config.timeout();
        }
    }
});
