//! Shared test utilities for integration tests.
//!
//! Builders for synthetic jars shaped like the real patch targets: a
//! `CoreModManager` whose `sortTweakList` hands two statics to
//! `Collections.sort`, and a `SecureJarHandler` whose static initializer
//! captures a verifier field into `JV`.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test
//! file compiles as a separate crate and may only use a subset of these
//! helpers.

#![allow(dead_code)]

use std::path::Path;

use forgefix::bytecode::{Instruction, opcodes};
use forgefix::classfile::code::CODE_ATTRIBUTE;
use forgefix::classfile::{Attribute, ClassFile, CodeAttribute, ConstantPool, Member};
use forgefix::zip::ZipArchive;

/// Archive entry path of the Patch A target class.
pub const FORGE_CLASS: &str = "cpw/mods/fml/relauncher/CoreModManager.class";
/// Archive entry path of the Patch B target class.
pub const MODLAUNCHER_CLASS: &str = "cpw/mods/modlauncher/SecureJarHandler.class";
/// An entry the patches must never touch.
pub const RESOURCE: &str = "assets/fml/logo.png";

/// Builds a minimal `CoreModManager`: `sortTweakList` loads the tweak list
/// and its comparator from statics and calls `Collections.sort`.
pub fn core_mod_manager_class() -> Vec<u8> {
    build_core_mod_manager("sortTweakList")
}

/// Same class, but the sorting method goes by another name so the patch's
/// target lookup fails.
pub fn core_mod_manager_without_target() -> Vec<u8> {
    build_core_mod_manager("sortEverythingElse")
}

fn build_core_mod_manager(method_name: &str) -> Vec<u8> {
    let mut pool = ConstantPool::new();
    let this_class = pool.add_class("cpw/mods/fml/relauncher/CoreModManager").unwrap();
    let super_class = pool.add_class("java/lang/Object").unwrap();
    let tweak_list = pool
        .add_field_ref(
            "cpw/mods/fml/relauncher/CoreModManager",
            "tweakSorting",
            "Ljava/util/List;",
        )
        .unwrap();
    let comparator = pool
        .add_field_ref(
            "cpw/mods/fml/relauncher/CoreModManager",
            "tweakComparator",
            "Ljava/util/Comparator;",
        )
        .unwrap();
    let collections_sort = pool
        .add_method_ref(
            "java/util/Collections",
            "sort",
            "(Ljava/util/List;Ljava/util/Comparator;)V",
        )
        .unwrap();

    let code = CodeAttribute {
        max_stack: 2,
        max_locals: 0,
        body: vec![
            Instruction::new(opcodes::GETSTATIC, tweak_list.to_be_bytes().to_vec()),
            Instruction::new(opcodes::GETSTATIC, comparator.to_be_bytes().to_vec()),
            Instruction::invokestatic(collections_sort),
            Instruction::return_void(),
        ],
        exception_table: Vec::new(),
        attributes: Vec::new(),
    };

    let member = method(&mut pool, 0x000A, method_name, "()V", &code);
    assemble(pool, this_class, super_class, vec![member])
}

/// Builds a minimal `SecureJarHandler`: `<clinit>` captures a field through
/// a helper and stores it into the `JV` static.
pub fn secure_jar_handler_class() -> Vec<u8> {
    let mut pool = ConstantPool::new();
    let this_class = pool.add_class("cpw/mods/modlauncher/SecureJarHandler").unwrap();
    let super_class = pool.add_class("java/lang/Object").unwrap();
    let lookup = pool
        .add_method_ref(
            "cpw/mods/modlauncher/SecureJarHandler",
            "lookupVerifierField",
            "()Ljava/lang/reflect/Field;",
        )
        .unwrap();
    let jv_field = pool
        .add_field_ref(
            "cpw/mods/modlauncher/SecureJarHandler",
            "JV",
            "Ljava/lang/reflect/Field;",
        )
        .unwrap();

    let code = CodeAttribute {
        max_stack: 1,
        max_locals: 0,
        body: vec![
            Instruction::invokestatic(lookup),
            Instruction::new(opcodes::PUTSTATIC, jv_field.to_be_bytes().to_vec()),
            Instruction::return_void(),
        ],
        exception_table: Vec::new(),
        attributes: Vec::new(),
    };

    let member = method(&mut pool, 0x0008, "<clinit>", "()V", &code);
    assemble(pool, this_class, super_class, vec![member])
}

fn method(
    pool: &mut ConstantPool,
    access_flags: u16,
    name: &str,
    descriptor: &str,
    code: &CodeAttribute,
) -> Member {
    let name_index = pool.add_utf8(name).unwrap();
    let descriptor_index = pool.add_utf8(descriptor).unwrap();
    let code_name = pool.add_utf8(CODE_ATTRIBUTE).unwrap();
    Member {
        access_flags,
        name_index,
        descriptor_index,
        attributes: vec![Attribute {
            name_index: code_name,
            info: code.to_bytes(),
        }],
    }
}

fn assemble(
    pool: ConstantPool,
    this_class: u16,
    super_class: u16,
    methods: Vec<Member>,
) -> Vec<u8> {
    ClassFile {
        minor_version: 0,
        major_version: 52,
        pool,
        access_flags: 0x0021,
        this_class,
        super_class,
        interfaces: Vec::new(),
        fields: Vec::new(),
        methods,
        attributes: Vec::new(),
    }
    .to_bytes()
}

/// Writes a signed-looking jar: manifest and signature files under
/// `META-INF`, the class at `class_path`, and one unrelated resource.
pub fn write_jar(jar_path: &Path, class_path: &str, class_bytes: &[u8]) {
    let mut archive = ZipArchive::default();
    archive
        .write("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\n")
        .unwrap();
    archive
        .write("META-INF/FORGE.SF", b"Signature-Version: 1.0\n")
        .unwrap();
    archive.write("META-INF/FORGE.DSA", &[0x30, 0x82]).unwrap();
    archive.write(class_path, class_bytes).unwrap();
    archive.write(RESOURCE, b"\x89PNG\r\n\x1a\n").unwrap();
    std::fs::write(jar_path, archive.to_bytes().unwrap()).unwrap();
}

/// Writes a jar with no `META-INF` tree at all.
pub fn write_unsigned_jar(jar_path: &Path, class_path: &str, class_bytes: &[u8]) {
    let mut archive = ZipArchive::default();
    archive.write(class_path, class_bytes).unwrap();
    archive.write(RESOURCE, b"\x89PNG\r\n\x1a\n").unwrap();
    std::fs::write(jar_path, archive.to_bytes().unwrap()).unwrap();
}

/// Parses the jar on disk.
pub fn read_jar(jar_path: &Path) -> ZipArchive {
    ZipArchive::parse(&std::fs::read(jar_path).unwrap()).unwrap()
}

/// Decodes the class stored at `entry` inside the jar on disk.
pub fn read_class(jar_path: &Path, entry: &str) -> ClassFile {
    ClassFile::parse(&read_jar(jar_path).read(entry).unwrap()).unwrap()
}
