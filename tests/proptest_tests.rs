//! Property-based tests using proptest.
//!
//! These tests verify container and bytecode invariants against randomly
//! generated inputs.

use proptest::prelude::*;

use forgefix::bytecode::{self, Instruction, opcodes};
use forgefix::zip::ZipArchive;

/// Strategy for zip entry names: one to three word-ish path components.
fn entry_name_strategy() -> impl Strategy<Value = String> {
    proptest::collection::vec("[a-zA-Z0-9][a-zA-Z0-9_.-]{0,7}", 1..4)
        .prop_map(|parts| parts.join("/"))
}

/// Strategy for a set of entries with unique names.
fn entries_strategy() -> impl Strategy<Value = Vec<(String, Vec<u8>)>> {
    proptest::collection::btree_map(
        entry_name_strategy(),
        proptest::collection::vec(any::<u8>(), 0..512),
        0..8,
    )
    .prop_map(|entries| entries.into_iter().collect())
}

/// Strategy for one fixed-width instruction with random operand bytes.
fn instruction_strategy() -> impl Strategy<Value = Instruction> {
    prop_oneof![
        Just((opcodes::NOP, 0usize)),
        Just((opcodes::ACONST_NULL, 0)),
        Just((opcodes::ALOAD_0, 0)),
        Just((opcodes::POP, 0)),
        Just((opcodes::RETURN, 0)),
        Just((opcodes::BIPUSH, 1)),
        Just((opcodes::LDC, 1)),
        Just((opcodes::SIPUSH, 2)),
        Just((opcodes::GOTO, 2)),
        Just((opcodes::IINC, 2)),
        Just((opcodes::GETSTATIC, 2)),
        Just((opcodes::INVOKEINTERFACE, 4)),
    ]
    .prop_flat_map(|(opcode, width)| {
        proptest::collection::vec(any::<u8>(), width)
            .prop_map(move |operands| Instruction::new(opcode, operands))
    })
}

proptest! {
    /// Whatever goes into a container comes back out byte for byte.
    #[test]
    fn container_round_trip(entries in entries_strategy()) {
        let mut archive = ZipArchive::default();
        for (name, data) in &entries {
            archive.write(name, data).unwrap();
        }

        let reparsed = ZipArchive::parse(&archive.to_bytes().unwrap()).unwrap();
        prop_assert_eq!(reparsed.len(), entries.len());
        for (name, data) in &entries {
            prop_assert_eq!(&reparsed.read(name).unwrap(), data);
        }
    }

    /// Re-encoding a parsed container keeps names, order, and contents.
    #[test]
    fn container_reencode_is_stable(entries in entries_strategy()) {
        let mut archive = ZipArchive::default();
        for (name, data) in &entries {
            archive.write(name, data).unwrap();
        }

        let once = ZipArchive::parse(&archive.to_bytes().unwrap()).unwrap();
        let twice = ZipArchive::parse(&once.to_bytes().unwrap()).unwrap();
        let names: Vec<&str> = once.names().collect();
        prop_assert_eq!(names, twice.names().collect::<Vec<&str>>());
        for (name, _) in &entries {
            prop_assert_eq!(once.read(name).unwrap(), twice.read(name).unwrap());
        }
    }

    /// Parsing arbitrary bytes may fail but never panics.
    #[test]
    fn container_parse_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let _ = ZipArchive::parse(&bytes);
    }

    /// Structural decode inverts encode for fixed-width instructions, and
    /// assigns contiguous offsets.
    #[test]
    fn bytecode_round_trip(body in proptest::collection::vec(instruction_strategy(), 0..32)) {
        let encoded = bytecode::encode(&body);
        let decoded = bytecode::decode(&encoded).unwrap();

        prop_assert_eq!(decoded.len(), body.len());
        let mut offset = 0u32;
        for (out, input) in decoded.iter().zip(&body) {
            prop_assert_eq!(out.opcode, input.opcode);
            prop_assert_eq!(&out.operands, &input.operands);
            prop_assert_eq!(out.offset, offset);
            offset += out.byte_len();
        }
        prop_assert_eq!(bytecode::encode(&decoded), encoded);
    }
}
