//! Copying a method from one class into another.
//!
//! The transplanted method arrives with private copies of every constant
//! pool entry its code references, appended to the destination pool.
//! Entries are never merged with ones the destination already has: existing
//! indices keep their meaning, and the only pool mutation is growth at the
//! end. Within one transplant the remap table is memoized, so a source
//! entry referenced from several instructions is appended once and every
//! operand agrees on its new index.

use std::collections::{HashMap, HashSet};

use crate::classfile::code::CODE_ATTRIBUTE;
use crate::classfile::{Attribute, ClassFile, Constant, ConstantPool, Member};
use crate::{Error, Result};

/// Copies the method named `name` from `source` into `destination`,
/// returning its index in `destination.methods`.
///
/// Fails with [`Error::TransplantConflict`] if the destination already has
/// a method of that name, before anything is copied. The copied method
/// carries its `Code` attribute only; debug tables referencing the source
/// pool are left behind.
pub fn transplant_method(
    source: &ClassFile,
    name: &str,
    destination: &mut ClassFile,
) -> Result<usize> {
    if destination.has_method(name) {
        return Err(Error::TransplantConflict {
            name: name.to_string(),
        });
    }
    let method = source
        .find_method(name)
        .map(|index| &source.methods[index])
        .ok_or_else(|| Error::target_not_found(format!("method '{name}' in donor class")))?;

    let mut copier = PoolCopier::new(&source.pool);
    let name_index = copier.copy(&mut destination.pool, method.name_index)?;
    let descriptor_index = copier.copy(&mut destination.pool, method.descriptor_index)?;

    let mut code = method.code(&source.pool)?;
    for instruction in &mut code.body {
        if let Some(operand) = instruction.pool_index() {
            let remapped = copier.copy(&mut destination.pool, operand)?;
            instruction.set_pool_index(remapped)?;
        }
    }
    for handler in &mut code.exception_table {
        if handler.catch_type != 0 {
            handler.catch_type = copier.copy(&mut destination.pool, handler.catch_type)?;
        }
    }
    code.attributes.clear();

    let code_name = destination.pool.add_utf8(CODE_ATTRIBUTE)?;
    destination.methods.push(Member {
        access_flags: method.access_flags,
        name_index,
        descriptor_index,
        attributes: vec![Attribute {
            name_index: code_name,
            info: code.to_bytes(),
        }],
    });
    Ok(destination.methods.len() - 1)
}

/// Deep-copies constants between pools, memoizing source-to-destination
/// index assignments.
struct PoolCopier<'a> {
    source: &'a ConstantPool,
    remap: HashMap<u16, u16>,
    visiting: HashSet<u16>,
}

impl<'a> PoolCopier<'a> {
    fn new(source: &'a ConstantPool) -> Self {
        Self {
            source,
            remap: HashMap::new(),
            visiting: HashSet::new(),
        }
    }

    fn copy(&mut self, dest: &mut ConstantPool, index: u16) -> Result<u16> {
        if let Some(&mapped) = self.remap.get(&index) {
            return Ok(mapped);
        }
        if !self.visiting.insert(index) {
            return Err(Error::corrupt_class(
                0,
                format!("circular constant pool reference at index {index}"),
            ));
        }
        let constant = self.source.get(index).ok_or_else(|| {
            Error::corrupt_class(0, format!("dangling constant pool index {index}"))
        })?;

        let copied = match constant {
            Constant::Placeholder => {
                return Err(Error::corrupt_class(
                    0,
                    format!("index {index} points into the middle of a wide constant"),
                ));
            }
            Constant::Utf8(_)
            | Constant::Integer(_)
            | Constant::Float(_)
            | Constant::Long(_)
            | Constant::Double(_) => constant.clone(),
            Constant::Class { name_index } => Constant::Class {
                name_index: self.copy(dest, *name_index)?,
            },
            Constant::String { string_index } => Constant::String {
                string_index: self.copy(dest, *string_index)?,
            },
            Constant::FieldRef {
                class_index,
                name_and_type_index,
            } => Constant::FieldRef {
                class_index: self.copy(dest, *class_index)?,
                name_and_type_index: self.copy(dest, *name_and_type_index)?,
            },
            Constant::MethodRef {
                class_index,
                name_and_type_index,
            } => Constant::MethodRef {
                class_index: self.copy(dest, *class_index)?,
                name_and_type_index: self.copy(dest, *name_and_type_index)?,
            },
            Constant::InterfaceMethodRef {
                class_index,
                name_and_type_index,
            } => Constant::InterfaceMethodRef {
                class_index: self.copy(dest, *class_index)?,
                name_and_type_index: self.copy(dest, *name_and_type_index)?,
            },
            Constant::NameAndType {
                name_index,
                descriptor_index,
            } => Constant::NameAndType {
                name_index: self.copy(dest, *name_index)?,
                descriptor_index: self.copy(dest, *descriptor_index)?,
            },
            Constant::MethodHandle {
                reference_kind,
                reference_index,
            } => Constant::MethodHandle {
                reference_kind: *reference_kind,
                reference_index: self.copy(dest, *reference_index)?,
            },
            Constant::MethodType { descriptor_index } => Constant::MethodType {
                descriptor_index: self.copy(dest, *descriptor_index)?,
            },
            Constant::Dynamic { .. } | Constant::InvokeDynamic { .. } => {
                // Their bootstrap arguments live in a class-level attribute
                // the transplant does not carry over.
                return Err(Error::UnsupportedFeature {
                    feature: "transplanting code that uses invokedynamic",
                });
            }
            Constant::Module { .. } | Constant::Package { .. } => {
                return Err(Error::corrupt_class(
                    0,
                    format!("module constant {index} referenced from code"),
                ));
            }
        };

        let new_index = dest.add(copied)?;
        self.remap.insert(index, new_index);
        Ok(new_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{Instruction, opcodes};
    use crate::classfile::{CodeAttribute, ExceptionHandler};

    fn empty_class(name: &str) -> ClassFile {
        let mut pool = ConstantPool::new();
        let this_class = pool.add_class(name).unwrap();
        let super_class = pool.add_class("java/lang/Object").unwrap();
        ClassFile {
            minor_version: 0,
            major_version: 52,
            pool,
            access_flags: 0x0021,
            this_class,
            super_class,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        }
    }

    fn add_method(class: &mut ClassFile, name: &str, descriptor: &str, code: &CodeAttribute) {
        let name_index = class.pool.add_utf8(name).unwrap();
        let descriptor_index = class.pool.add_utf8(descriptor).unwrap();
        let code_name = class.pool.add_utf8(CODE_ATTRIBUTE).unwrap();
        class.methods.push(Member {
            access_flags: 0x0009,
            name_index,
            descriptor_index,
            attributes: vec![Attribute {
                name_index: code_name,
                info: code.to_bytes(),
            }],
        });
    }

    /// A donor whose `helper` method calls `java/util/Arrays.sort` twice.
    fn donor_class() -> ClassFile {
        let mut donor = empty_class("demo/Donor");
        let sort_ref = donor
            .pool
            .add_method_ref("java/util/Arrays", "sort", "([Ljava/lang/Object;)V")
            .unwrap();
        let code = CodeAttribute {
            max_stack: 1,
            max_locals: 1,
            body: vec![
                Instruction::new(opcodes::ALOAD_0, Vec::new()),
                Instruction::invokestatic(sort_ref),
                Instruction::new(opcodes::ALOAD_0, Vec::new()),
                Instruction::invokestatic(sort_ref),
                Instruction::return_void(),
            ],
            exception_table: Vec::new(),
            attributes: Vec::new(),
        };
        add_method(&mut donor, "helper", "([Ljava/lang/Object;)V", &code);
        donor
    }

    #[test]
    fn test_transplant_copies_method_and_pool_entries() {
        let donor = donor_class();
        let mut target = empty_class("demo/Target");
        let slots_before = target.pool.slot_count();

        let method_index = transplant_method(&donor, "helper", &mut target).unwrap();

        assert!(target.has_method("helper"));
        let method = &target.methods[method_index];
        assert_eq!(target.member_name(method), Some("helper"));
        assert_eq!(
            target.pool.utf8(method.descriptor_index),
            Some("([Ljava/lang/Object;)V")
        );
        assert!(target.pool.slot_count() > slots_before);

        let code = method.code(&target.pool).unwrap();
        assert_eq!(code.body.len(), 5);
        let call = code.body[1].pool_index().unwrap();
        let resolved = target.pool.resolve_ref(call).unwrap();
        assert_eq!(resolved.class, "java/util/Arrays");
        assert_eq!(resolved.name, "sort");
        assert_eq!(resolved.descriptor, "([Ljava/lang/Object;)V");
    }

    #[test]
    fn test_repeated_references_share_one_copy() {
        let donor = donor_class();
        let mut target = empty_class("demo/Target");
        let index = transplant_method(&donor, "helper", &mut target).unwrap();
        let code = target.methods[index].code(&target.pool).unwrap();
        assert_eq!(code.body[1].pool_index(), code.body[3].pool_index());
    }

    #[test]
    fn test_existing_indices_survive() {
        let donor = donor_class();
        let mut target = empty_class("demo/Target");
        let marker = target.pool.add_utf8("landmark").unwrap();

        transplant_method(&donor, "helper", &mut target).unwrap();
        assert_eq!(target.pool.utf8(marker), Some("landmark"));
        assert_eq!(target.name(), Some("demo/Target"));
    }

    #[test]
    fn test_duplicates_are_appended_not_merged() {
        let donor = donor_class();
        let mut target = empty_class("demo/Target");
        // Pre-seed the destination with text the transplant also brings in.
        target.pool.add_utf8("helper").unwrap();
        target.pool.add_utf8("java/util/Arrays").unwrap();
        let slots_before = target.pool.slot_count();

        let index = transplant_method(&donor, "helper", &mut target).unwrap();

        let method = &target.methods[index];
        assert!(method.name_index >= slots_before);
        let duplicates = target
            .pool
            .iter()
            .filter(|&(_, constant)| matches!(constant, Constant::Utf8(text) if text == b"helper"))
            .count();
        assert_eq!(duplicates, 2);
    }

    #[test]
    fn test_conflict_leaves_destination_untouched() {
        let donor = donor_class();
        let mut target = empty_class("demo/Target");
        let noop = CodeAttribute {
            max_stack: 0,
            max_locals: 1,
            body: vec![Instruction::return_void()],
            exception_table: Vec::new(),
            attributes: Vec::new(),
        };
        add_method(&mut target, "helper", "()V", &noop);
        let snapshot = target.clone();

        let err = transplant_method(&donor, "helper", &mut target).unwrap_err();
        match err {
            Error::TransplantConflict { name } => assert_eq!(name, "helper"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(target, snapshot);
    }

    #[test]
    fn test_missing_donor_method() {
        let donor = donor_class();
        let mut target = empty_class("demo/Target");
        let err = transplant_method(&donor, "absent", &mut target).unwrap_err();
        assert!(matches!(err, Error::PatchTargetNotFound { .. }));
    }

    #[test]
    fn test_exception_handler_class_is_remapped() {
        let mut donor = empty_class("demo/Donor");
        let exception = donor.pool.add_class("java/lang/Exception").unwrap();
        let code = CodeAttribute {
            max_stack: 1,
            max_locals: 1,
            body: vec![
                Instruction::new(opcodes::NOP, Vec::new()),
                Instruction::return_void(),
            ],
            exception_table: vec![ExceptionHandler {
                start_pc: 0,
                end_pc: 1,
                handler_pc: 1,
                catch_type: exception,
            }],
            attributes: Vec::new(),
        };
        add_method(&mut donor, "guarded", "()V", &code);

        let mut target = empty_class("demo/Target");
        let index = transplant_method(&donor, "guarded", &mut target).unwrap();
        let code = target.methods[index].code(&target.pool).unwrap();
        let catch_type = code.exception_table[0].catch_type;
        assert_ne!(catch_type, exception);
        assert_eq!(
            target.pool.class_name(catch_type),
            Some("java/lang/Exception")
        );
    }

    #[test]
    fn test_invokedynamic_is_rejected() {
        let mut donor = empty_class("demo/Donor");
        let nat = donor.pool.add_name_and_type("lambda$0", "()V").unwrap();
        let indy = donor
            .pool
            .add(Constant::InvokeDynamic {
                bootstrap_method_attr_index: 0,
                name_and_type_index: nat,
            })
            .unwrap();
        let code = CodeAttribute {
            max_stack: 1,
            max_locals: 0,
            body: vec![
                Instruction::new(opcodes::INVOKEDYNAMIC, {
                    let mut operands = indy.to_be_bytes().to_vec();
                    operands.extend_from_slice(&[0, 0]);
                    operands
                }),
                Instruction::return_void(),
            ],
            exception_table: Vec::new(),
            attributes: Vec::new(),
        };
        add_method(&mut donor, "dynamic", "()V", &code);

        let mut target = empty_class("demo/Target");
        let err = transplant_method(&donor, "dynamic", &mut target).unwrap_err();
        match err {
            Error::UnsupportedFeature { feature } => assert!(feature.contains("invokedynamic")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
