//! Malformed input tests.
//!
//! Damaged containers and classes must come back as typed errors, never
//! panics, and must never leave a half-written archive behind.

mod common;

use std::path::PathBuf;

use forgefix::{Error, ZipArchive, apply_patch};
use tempfile::TempDir;

const SORT_PATCH: &str = "CoreModManager_Sort_Patch";

fn write_file(name: &str, bytes: &[u8]) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    (dir, path)
}

#[test]
fn test_not_an_archive() {
    let (_dir, path) = write_file("notes.txt", b"this is not a jar at all");
    let err = apply_patch(SORT_PATCH, &path).unwrap_err();
    assert!(matches!(err, Error::InvalidArchive(_)));
    assert!(err.is_corruption());
}

#[test]
fn test_empty_file() {
    let (_dir, path) = write_file("empty.jar", b"");
    let err = apply_patch(SORT_PATCH, &path).unwrap_err();
    assert!(matches!(err, Error::InvalidArchive(_)));
}

#[test]
fn test_truncated_archive() {
    let dir = TempDir::new().unwrap();
    let jar = dir.path().join("forge.jar");
    common::write_jar(&jar, common::FORGE_CLASS, &common::core_mod_manager_class());

    let bytes = std::fs::read(&jar).unwrap();
    std::fs::write(&jar, &bytes[..bytes.len() / 2]).unwrap();

    let err = apply_patch(SORT_PATCH, &jar).unwrap_err();
    assert!(err.is_corruption());
}

#[test]
fn test_garbage_where_the_class_should_be() {
    let dir = TempDir::new().unwrap();
    let jar = dir.path().join("forge.jar");
    common::write_jar(&jar, common::FORGE_CLASS, b"\xCA\xFE\xBA\xBEtruncated");
    let original = std::fs::read(&jar).unwrap();

    let err = apply_patch(SORT_PATCH, &jar).unwrap_err();
    assert!(matches!(err, Error::CorruptClass { .. }));

    // Decoding failed before any edit, so the archive is untouched.
    assert_eq!(std::fs::read(&jar).unwrap(), original);
}

#[test]
fn test_wrong_magic_in_the_class() {
    let dir = TempDir::new().unwrap();
    let jar = dir.path().join("forge.jar");
    common::write_jar(&jar, common::FORGE_CLASS, b"PK\x03\x04not a class");

    let err = apply_patch(SORT_PATCH, &jar).unwrap_err();
    assert!(matches!(err, Error::CorruptClass { .. }));
}

#[test]
fn test_tampered_entry_data() {
    let dir = TempDir::new().unwrap();
    let jar = dir.path().join("forge.jar");
    common::write_jar(&jar, common::FORGE_CLASS, &common::core_mod_manager_class());

    // Flip one bit in the middle of the first local entry's compressed
    // stream. The headers stay plausible; only the payload lies.
    let mut bytes = std::fs::read(&jar).unwrap();
    let name_end = 30 + "META-INF/MANIFEST.MF".len();
    bytes[name_end + 4] ^= 0x01;
    std::fs::write(&jar, &bytes).unwrap();

    let archive = ZipArchive::parse(&std::fs::read(&jar).unwrap()).unwrap();
    let err = archive.read("META-INF/MANIFEST.MF").unwrap_err();
    assert!(err.is_corruption());
}

#[test]
fn test_junk_bytes_never_panic() {
    // A few deliberately nasty shapes: signature-like prefixes, repeated
    // end-record magic, and high-bit noise.
    let samples: [&[u8]; 4] = [
        b"PK\x05\x06",
        b"PK\x05\x06\x00\x00\x00\x00\x00\x00\x00\x00\xff\xff\xff\xff\xff\xff\xff\xff\x00\x00",
        &[0x50; 100],
        &[0xff; 70000],
    ];
    for sample in samples {
        let _ = ZipArchive::parse(sample);
    }
}
