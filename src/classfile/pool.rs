//! The constant pool: a class file's symbol table.
//!
//! The pool is an ordered, append-only sequence of typed entries referenced
//! by 1-based index from everywhere else in the class (the class header,
//! member declarations, attribute names, and instruction operands). Index
//! stability is the load-bearing invariant of the whole patch engine: edits
//! only ever append, so every index issued before an edit stays valid after
//! it.
//!
//! Slot 0 and the slot following each `long`/`double` entry are unusable per
//! the format; they are modeled as [`Constant::Placeholder`] so that pool
//! indices map 1:1 onto positions in the backing vector.

use crate::classfile::reader::ByteReader;
use crate::{Error, Result};

/// Constant pool entry tags.
pub(crate) mod tag {
    pub const UTF8: u8 = 1;
    pub const INTEGER: u8 = 3;
    pub const FLOAT: u8 = 4;
    pub const LONG: u8 = 5;
    pub const DOUBLE: u8 = 6;
    pub const CLASS: u8 = 7;
    pub const STRING: u8 = 8;
    pub const FIELD_REF: u8 = 9;
    pub const METHOD_REF: u8 = 10;
    pub const INTERFACE_METHOD_REF: u8 = 11;
    pub const NAME_AND_TYPE: u8 = 12;
    pub const METHOD_HANDLE: u8 = 15;
    pub const METHOD_TYPE: u8 = 16;
    pub const DYNAMIC: u8 = 17;
    pub const INVOKE_DYNAMIC: u8 = 18;
    pub const MODULE: u8 = 19;
    pub const PACKAGE: u8 = 20;
}

/// One constant pool entry.
///
/// Text constants keep their raw modified-UTF-8 bytes; the patches only ever
/// add ASCII names, where modified UTF-8 and UTF-8 coincide, and text parsed
/// from existing classes is carried through untouched. `Float` and `Double`
/// store raw IEEE-754 bits so NaN payloads survive a round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Constant {
    /// Slot 0, or the phantom slot after a `Long`/`Double`. Never encoded.
    Placeholder,
    /// Modified-UTF-8 text, kept as raw bytes.
    Utf8(Vec<u8>),
    Integer(i32),
    /// Raw IEEE-754 bits of an `f32`.
    Float(u32),
    Long(i64),
    /// Raw IEEE-754 bits of an `f64`.
    Double(u64),
    /// A class, pointing at its `Utf8` internal name.
    Class { name_index: u16 },
    /// A `java.lang.String` literal, pointing at its `Utf8` text.
    String { string_index: u16 },
    FieldRef { class_index: u16, name_and_type_index: u16 },
    MethodRef { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodRef { class_index: u16, name_and_type_index: u16 },
    /// A name/descriptor pair shared by the `*Ref` entries.
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { reference_kind: u8, reference_index: u16 },
    MethodType { descriptor_index: u16 },
    Dynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    InvokeDynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    Module { name_index: u16 },
    Package { name_index: u16 },
}

impl Constant {
    /// `true` for entries that occupy two pool slots.
    pub fn is_wide(&self) -> bool {
        matches!(self, Constant::Long(_) | Constant::Double(_))
    }
}

/// A fully resolved field or method reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRef<'a> {
    /// Internal class name, e.g. `java/util/Collections`.
    pub class: &'a str,
    /// Member name.
    pub name: &'a str,
    /// Member descriptor, e.g. `(Ljava/util/List;Ljava/util/Comparator;)V`.
    pub descriptor: &'a str,
}

/// A class file's constant pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantPool {
    entries: Vec<Constant>,
}

impl Default for ConstantPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstantPool {
    /// Creates an empty pool (slot 0 only).
    pub fn new() -> Self {
        Self {
            entries: vec![Constant::Placeholder],
        }
    }

    pub(crate) fn parse(r: &mut ByteReader<'_>) -> Result<Self> {
        let count = r.u16()?;
        if count == 0 {
            return Err(r.corrupt("constant pool count must be at least 1"));
        }
        let mut entries = Vec::with_capacity(count as usize);
        entries.push(Constant::Placeholder);

        let mut index: u16 = 1;
        while index < count {
            let tag = r.u8()?;
            let constant = match tag {
                tag::UTF8 => {
                    let len = r.u16()? as usize;
                    Constant::Utf8(r.take(len)?.to_vec())
                }
                tag::INTEGER => Constant::Integer(r.i32()?),
                tag::FLOAT => Constant::Float(r.u32()?),
                tag::LONG => {
                    let hi = u64::from(r.u32()?);
                    let lo = u64::from(r.u32()?);
                    Constant::Long(((hi << 32) | lo) as i64)
                }
                tag::DOUBLE => {
                    let hi = u64::from(r.u32()?);
                    let lo = u64::from(r.u32()?);
                    Constant::Double((hi << 32) | lo)
                }
                tag::CLASS => Constant::Class {
                    name_index: r.u16()?,
                },
                tag::STRING => Constant::String {
                    string_index: r.u16()?,
                },
                tag::FIELD_REF => Constant::FieldRef {
                    class_index: r.u16()?,
                    name_and_type_index: r.u16()?,
                },
                tag::METHOD_REF => Constant::MethodRef {
                    class_index: r.u16()?,
                    name_and_type_index: r.u16()?,
                },
                tag::INTERFACE_METHOD_REF => Constant::InterfaceMethodRef {
                    class_index: r.u16()?,
                    name_and_type_index: r.u16()?,
                },
                tag::NAME_AND_TYPE => Constant::NameAndType {
                    name_index: r.u16()?,
                    descriptor_index: r.u16()?,
                },
                tag::METHOD_HANDLE => Constant::MethodHandle {
                    reference_kind: r.u8()?,
                    reference_index: r.u16()?,
                },
                tag::METHOD_TYPE => Constant::MethodType {
                    descriptor_index: r.u16()?,
                },
                tag::DYNAMIC => Constant::Dynamic {
                    bootstrap_method_attr_index: r.u16()?,
                    name_and_type_index: r.u16()?,
                },
                tag::INVOKE_DYNAMIC => Constant::InvokeDynamic {
                    bootstrap_method_attr_index: r.u16()?,
                    name_and_type_index: r.u16()?,
                },
                tag::MODULE => Constant::Module {
                    name_index: r.u16()?,
                },
                tag::PACKAGE => Constant::Package {
                    name_index: r.u16()?,
                },
                other => {
                    return Err(r.corrupt(format!("unknown constant pool tag {other}")));
                }
            };

            let wide = constant.is_wide();
            entries.push(constant);
            index += 1;
            if wide {
                // Longs and doubles occupy the following slot as well.
                if index >= count {
                    return Err(r.corrupt("long/double constant overruns the pool"));
                }
                entries.push(Constant::Placeholder);
                index += 1;
            }
        }

        Ok(Self { entries })
    }

    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.entries.len() as u16).to_be_bytes());
        for constant in &self.entries {
            match constant {
                Constant::Placeholder => {}
                Constant::Utf8(bytes) => {
                    out.push(tag::UTF8);
                    out.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
                    out.extend_from_slice(bytes);
                }
                Constant::Integer(value) => {
                    out.push(tag::INTEGER);
                    out.extend_from_slice(&value.to_be_bytes());
                }
                Constant::Float(bits) => {
                    out.push(tag::FLOAT);
                    out.extend_from_slice(&bits.to_be_bytes());
                }
                Constant::Long(value) => {
                    out.push(tag::LONG);
                    out.extend_from_slice(&value.to_be_bytes());
                }
                Constant::Double(bits) => {
                    out.push(tag::DOUBLE);
                    out.extend_from_slice(&bits.to_be_bytes());
                }
                Constant::Class { name_index } => {
                    out.push(tag::CLASS);
                    out.extend_from_slice(&name_index.to_be_bytes());
                }
                Constant::String { string_index } => {
                    out.push(tag::STRING);
                    out.extend_from_slice(&string_index.to_be_bytes());
                }
                Constant::FieldRef {
                    class_index,
                    name_and_type_index,
                } => {
                    out.push(tag::FIELD_REF);
                    out.extend_from_slice(&class_index.to_be_bytes());
                    out.extend_from_slice(&name_and_type_index.to_be_bytes());
                }
                Constant::MethodRef {
                    class_index,
                    name_and_type_index,
                } => {
                    out.push(tag::METHOD_REF);
                    out.extend_from_slice(&class_index.to_be_bytes());
                    out.extend_from_slice(&name_and_type_index.to_be_bytes());
                }
                Constant::InterfaceMethodRef {
                    class_index,
                    name_and_type_index,
                } => {
                    out.push(tag::INTERFACE_METHOD_REF);
                    out.extend_from_slice(&class_index.to_be_bytes());
                    out.extend_from_slice(&name_and_type_index.to_be_bytes());
                }
                Constant::NameAndType {
                    name_index,
                    descriptor_index,
                } => {
                    out.push(tag::NAME_AND_TYPE);
                    out.extend_from_slice(&name_index.to_be_bytes());
                    out.extend_from_slice(&descriptor_index.to_be_bytes());
                }
                Constant::MethodHandle {
                    reference_kind,
                    reference_index,
                } => {
                    out.push(tag::METHOD_HANDLE);
                    out.push(*reference_kind);
                    out.extend_from_slice(&reference_index.to_be_bytes());
                }
                Constant::MethodType { descriptor_index } => {
                    out.push(tag::METHOD_TYPE);
                    out.extend_from_slice(&descriptor_index.to_be_bytes());
                }
                Constant::Dynamic {
                    bootstrap_method_attr_index,
                    name_and_type_index,
                } => {
                    out.push(tag::DYNAMIC);
                    out.extend_from_slice(&bootstrap_method_attr_index.to_be_bytes());
                    out.extend_from_slice(&name_and_type_index.to_be_bytes());
                }
                Constant::InvokeDynamic {
                    bootstrap_method_attr_index,
                    name_and_type_index,
                } => {
                    out.push(tag::INVOKE_DYNAMIC);
                    out.extend_from_slice(&bootstrap_method_attr_index.to_be_bytes());
                    out.extend_from_slice(&name_and_type_index.to_be_bytes());
                }
                Constant::Module { name_index } => {
                    out.push(tag::MODULE);
                    out.extend_from_slice(&name_index.to_be_bytes());
                }
                Constant::Package { name_index } => {
                    out.push(tag::PACKAGE);
                    out.extend_from_slice(&name_index.to_be_bytes());
                }
            }
        }
    }

    /// Number of pool slots, including slot 0 and phantom slots.
    ///
    /// This equals the `constant_pool_count` field of the encoded class.
    pub fn slot_count(&self) -> u16 {
        self.entries.len() as u16
    }

    /// Returns the entry at `index`, or `None` if out of range.
    ///
    /// Index 0 and the slot after a `long`/`double` resolve to
    /// [`Constant::Placeholder`].
    pub fn get(&self, index: u16) -> Option<&Constant> {
        self.entries.get(index as usize)
    }

    /// Iterates entries together with their indices, placeholders included.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Constant)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, constant)| (index as u16, constant))
    }

    /// The raw bytes of the `Utf8` entry at `index`.
    pub fn utf8_bytes(&self, index: u16) -> Option<&[u8]> {
        match self.get(index)? {
            Constant::Utf8(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// The `Utf8` entry at `index` as text, when it is valid UTF-8.
    pub fn utf8(&self, index: u16) -> Option<&str> {
        std::str::from_utf8(self.utf8_bytes(index)?).ok()
    }

    /// Resolves a `Class` entry to its internal name.
    pub fn class_name(&self, index: u16) -> Option<&str> {
        match self.get(index)? {
            Constant::Class { name_index } => self.utf8(*name_index),
            _ => None,
        }
    }

    /// Resolves a `NameAndType` entry to `(name, descriptor)`.
    pub fn name_and_type(&self, index: u16) -> Option<(&str, &str)> {
        match self.get(index)? {
            Constant::NameAndType {
                name_index,
                descriptor_index,
            } => Some((self.utf8(*name_index)?, self.utf8(*descriptor_index)?)),
            _ => None,
        }
    }

    /// Resolves a field, method, or interface-method reference to text.
    pub fn resolve_ref(&self, index: u16) -> Option<ResolvedRef<'_>> {
        let (class_index, name_and_type_index) = match self.get(index)? {
            Constant::FieldRef {
                class_index,
                name_and_type_index,
            }
            | Constant::MethodRef {
                class_index,
                name_and_type_index,
            }
            | Constant::InterfaceMethodRef {
                class_index,
                name_and_type_index,
            } => (*class_index, *name_and_type_index),
            _ => return None,
        };
        let class = self.class_name(class_index)?;
        let (name, descriptor) = self.name_and_type(name_and_type_index)?;
        Some(ResolvedRef {
            class,
            name,
            descriptor,
        })
    }

    /// Resolves a `String` entry to its text value.
    pub fn string_value(&self, index: u16) -> Option<&str> {
        match self.get(index)? {
            Constant::String { string_index } => self.utf8(*string_index),
            _ => None,
        }
    }

    /// `true` if any `String` constant resolves to exactly `text`.
    pub fn has_string(&self, text: &str) -> bool {
        self.iter()
            .any(|(index, constant)| {
                matches!(constant, Constant::String { .. }) && self.string_value(index) == Some(text)
            })
    }

    /// Appends an entry, returning its index.
    ///
    /// Entries are never deduplicated against existing ones, so indices
    /// issued earlier stay stable. `Long`/`Double` consume the following
    /// slot too.
    pub fn add(&mut self, constant: Constant) -> Result<u16> {
        let index = self.entries.len();
        let slots = if constant.is_wide() { 2 } else { 1 };
        if index + slots > u16::MAX as usize {
            return Err(Error::UnsupportedFeature {
                feature: "constant pool overflow",
            });
        }
        let wide = constant.is_wide();
        self.entries.push(constant);
        if wide {
            self.entries.push(Constant::Placeholder);
        }
        Ok(index as u16)
    }

    /// Appends a `Utf8` entry.
    pub fn add_utf8(&mut self, text: &str) -> Result<u16> {
        if text.len() > u16::MAX as usize {
            return Err(Error::UnsupportedFeature {
                feature: "utf8 constant longer than 65535 bytes",
            });
        }
        self.add(Constant::Utf8(text.as_bytes().to_vec()))
    }

    /// Appends a `Class` entry (and its name).
    pub fn add_class(&mut self, name: &str) -> Result<u16> {
        let name_index = self.add_utf8(name)?;
        self.add(Constant::Class { name_index })
    }

    /// Appends a `String` entry (and its text).
    pub fn add_string(&mut self, text: &str) -> Result<u16> {
        let string_index = self.add_utf8(text)?;
        self.add(Constant::String { string_index })
    }

    /// Appends a `NameAndType` entry (and both its texts).
    pub fn add_name_and_type(&mut self, name: &str, descriptor: &str) -> Result<u16> {
        let name_index = self.add_utf8(name)?;
        let descriptor_index = self.add_utf8(descriptor)?;
        self.add(Constant::NameAndType {
            name_index,
            descriptor_index,
        })
    }

    /// Appends a `Methodref` entry and everything it references.
    pub fn add_method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> Result<u16> {
        let class_index = self.add_class(class)?;
        let name_and_type_index = self.add_name_and_type(name, descriptor)?;
        self.add(Constant::MethodRef {
            class_index,
            name_and_type_index,
        })
    }

    /// Appends an `InterfaceMethodref` entry and everything it references.
    pub fn add_interface_method_ref(
        &mut self,
        class: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<u16> {
        let class_index = self.add_class(class)?;
        let name_and_type_index = self.add_name_and_type(name, descriptor)?;
        self.add(Constant::InterfaceMethodRef {
            class_index,
            name_and_type_index,
        })
    }

    /// Appends a `Fieldref` entry and everything it references.
    pub fn add_field_ref(&mut self, class: &str, name: &str, descriptor: &str) -> Result<u16> {
        let class_index = self.add_class(class)?;
        let name_and_type_index = self.add_name_and_type(name, descriptor)?;
        self.add(Constant::FieldRef {
            class_index,
            name_and_type_index,
        })
    }
}
