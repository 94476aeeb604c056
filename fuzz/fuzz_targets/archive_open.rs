//! Fuzz target for ZipArchive::parse with arbitrary byte input.
//!
//! This target exercises the container parsing code with potentially
//! malformed or adversarial input. The goal is to find panics, hangs, or
//! memory issues in the parsing logic.
//!
//! Run with: cargo +nightly fuzz run archive_open
//!
//! The fuzzer will automatically discover and save interesting inputs that
//! trigger new code paths.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Attempt to open arbitrary bytes as a zip archive
    if let Ok(archive) = forgefix::ZipArchive::parse(data) {
        // Decompressing each entry exercises the inflate and CRC paths
        let names: Vec<String> = archive.names().map(str::to_owned).collect();
        for name in &names {
            let _ = archive.read(name);
        }

        // Anything that parsed must survive re-encoding
        let _ = archive.to_bytes();
    }
});
