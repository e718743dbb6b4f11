//! Fuzz target for the manifest parsers.
//!
//! Run with: cargo +nightly fuzz run fuzz_manifest_parser
//!
//! Feeds arbitrary text to every manifest format. Whatever parses must
//! render and re-parse to the same entries.

#![no_main]

use libfuzzer_sys::fuzz_target;
use refdex_core::{ManifestFormat, ReferenceIndex};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    for format in [
        ManifestFormat::Toml,
        ManifestFormat::Json,
        ManifestFormat::Markdown,
    ] {
        let Ok(manifest) = format.parse(text) else {
            continue;
        };

        let index = ReferenceIndex::new(manifest.clone());
        assert_eq!(index.load_order().len(), manifest.len());
        for entry in &manifest {
            assert!(index.resolve(&entry.id).is_ok());
        }

        let rendered = format.render(&manifest).expect("render parsed manifest");
        let reparsed = format.parse(&rendered).expect("re-parse rendered manifest");
        assert_eq!(reparsed.entries(), manifest.entries());
    }
});
