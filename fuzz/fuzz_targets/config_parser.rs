//! Fuzz target for the composer config parser.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_config_parser
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use tagsql_query::{Composer, ComposerConfig};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // The parser should never panic, only return errors
        if let Ok(config) = ComposerConfig::from_toml(input) {
            // A config that parsed and validated must build a composer
            assert!(Composer::new(config).is_ok());
        }
    }
});
