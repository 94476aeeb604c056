//! Fuzz target for ClassFile::parse with arbitrary byte input.
//!
//! This target exercises the class file decoder with potentially malformed
//! or adversarial input. The goal is to find panics or hangs in the pool,
//! member, and bytecode parsing logic.
//!
//! Run with: cargo +nightly fuzz run class_parse

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(class) = forgefix::ClassFile::parse(data) {
        // Pool and member accessors must tolerate whatever parsed
        let _ = class.name();
        for method in &class.methods {
            let _ = class.member_name(method);
            let _ = method.code(&class.pool);
        }

        // The encoder's output must always be parseable again
        let encoded = class.to_bytes();
        let reparsed = forgefix::ClassFile::parse(&encoded);
        assert!(
            reparsed.is_ok(),
            "re-encoded class failed to parse: {:?}",
            reparsed.err()
        );
    }
});
