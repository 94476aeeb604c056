//! Java class file model and codec.
//!
//! [`ClassFile::parse`] decodes the raw bytes of one archive entry into a
//! mutable model: constant pool, interfaces, fields, methods, and class
//! attributes. [`ClassFile::to_bytes`] is the inverse. Parsing is
//! structure-preserving rather than interpreting: attribute payloads stay as
//! raw bytes, so everything a patch does not touch round-trips exactly. Only
//! the `Code` attribute of a method being edited is decoded further, via
//! [`Member::code`].
//!
//! Decode failures report [`Error::CorruptClass`] with the byte offset where
//! the structure stopped making sense.

pub mod code;
pub mod pool;
pub(crate) mod reader;

pub use code::{CodeAttribute, ExceptionHandler};
pub use pool::{Constant, ConstantPool, ResolvedRef};

use crate::{Error, Result};
use reader::ByteReader;

/// The class file magic number.
pub const MAGIC: u32 = 0xCAFE_BABE;

/// A field or method declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// `ACC_*` flag bits.
    pub access_flags: u16,
    /// Pool index of the member's name (`Utf8`).
    pub name_index: u16,
    /// Pool index of the member's descriptor (`Utf8`).
    pub descriptor_index: u16,
    /// The member's attributes, in declaration order.
    pub attributes: Vec<Attribute>,
}

/// An attribute with its payload kept as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Pool index of the attribute's name (`Utf8`).
    pub name_index: u16,
    /// The attribute payload, undecoded.
    pub info: Vec<u8>,
}

/// A decoded class file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFile {
    /// Format minor version.
    pub minor_version: u16,
    /// Format major version (52 = Java 8).
    pub major_version: u16,
    /// The constant pool.
    pub pool: ConstantPool,
    /// `ACC_*` flag bits of the class itself.
    pub access_flags: u16,
    /// Pool index of this class (`Class`).
    pub this_class: u16,
    /// Pool index of the superclass, or 0 for `java/lang/Object`.
    pub super_class: u16,
    /// Pool indices of the implemented interfaces (`Class` entries).
    pub interfaces: Vec<u16>,
    /// Declared fields.
    pub fields: Vec<Member>,
    /// Declared methods, in declaration order.
    pub methods: Vec<Member>,
    /// Class-level attributes.
    pub attributes: Vec<Attribute>,
}

impl ClassFile {
    /// Decodes a class file.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(bytes);

        let magic = r.u32()?;
        if magic != MAGIC {
            return Err(Error::corrupt_class(
                0,
                format!("bad magic {magic:#010x}, expected {MAGIC:#010x}"),
            ));
        }
        let minor_version = r.u16()?;
        let major_version = r.u16()?;
        let pool = ConstantPool::parse(&mut r)?;
        let access_flags = r.u16()?;
        let this_class = r.u16()?;
        let super_class = r.u16()?;

        let interface_count = r.u16()?;
        let mut interfaces = Vec::with_capacity(interface_count as usize);
        for _ in 0..interface_count {
            interfaces.push(r.u16()?);
        }

        let fields = parse_members(&mut r)?;
        let methods = parse_members(&mut r)?;
        let attributes = Attribute::parse_list(&mut r)?;

        if r.remaining() != 0 {
            return Err(r.corrupt(format!(
                "{} trailing bytes after class attributes",
                r.remaining()
            )));
        }

        Ok(Self {
            minor_version,
            major_version,
            pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    /// Re-encodes the class file.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC.to_be_bytes());
        out.extend_from_slice(&self.minor_version.to_be_bytes());
        out.extend_from_slice(&self.major_version.to_be_bytes());
        self.pool.encode(&mut out);
        out.extend_from_slice(&self.access_flags.to_be_bytes());
        out.extend_from_slice(&self.this_class.to_be_bytes());
        out.extend_from_slice(&self.super_class.to_be_bytes());
        out.extend_from_slice(&(self.interfaces.len() as u16).to_be_bytes());
        for interface in &self.interfaces {
            out.extend_from_slice(&interface.to_be_bytes());
        }
        encode_members(&self.fields, &mut out);
        encode_members(&self.methods, &mut out);
        Attribute::encode_list(&self.attributes, &mut out);
        out
    }

    /// This class's internal name, e.g. `cpw/mods/fml/relauncher/CoreModManager`.
    pub fn name(&self) -> Option<&str> {
        self.pool.class_name(self.this_class)
    }

    /// Index of the first method with the given name.
    ///
    /// Lookup is by name only; overloads are not disambiguated by
    /// descriptor. The patched methods are not overloaded, so first match
    /// is the match.
    pub fn find_method(&self, name: &str) -> Option<usize> {
        self.methods
            .iter()
            .position(|method| self.pool.utf8(method.name_index) == Some(name))
    }

    /// `true` if a method with the given name exists.
    pub fn has_method(&self, name: &str) -> bool {
        self.find_method(name).is_some()
    }

    /// The name of `member`, resolved through this class's pool.
    pub fn member_name(&self, member: &Member) -> Option<&str> {
        self.pool.utf8(member.name_index)
    }
}

fn parse_members(r: &mut ByteReader<'_>) -> Result<Vec<Member>> {
    let count = r.u16()?;
    let mut members = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let access_flags = r.u16()?;
        let name_index = r.u16()?;
        let descriptor_index = r.u16()?;
        let attributes = Attribute::parse_list(r)?;
        members.push(Member {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        });
    }
    Ok(members)
}

fn encode_members(members: &[Member], out: &mut Vec<u8>) {
    out.extend_from_slice(&(members.len() as u16).to_be_bytes());
    for member in members {
        out.extend_from_slice(&member.access_flags.to_be_bytes());
        out.extend_from_slice(&member.name_index.to_be_bytes());
        out.extend_from_slice(&member.descriptor_index.to_be_bytes());
        Attribute::encode_list(&member.attributes, out);
    }
}

impl Member {
    /// Index of this member's attribute named `name`, if present.
    pub fn find_attribute(&self, pool: &ConstantPool, name: &str) -> Option<usize> {
        self.attributes
            .iter()
            .position(|attribute| pool.utf8(attribute.name_index) == Some(name))
    }

    /// Decodes this member's `Code` attribute.
    pub fn code(&self, pool: &ConstantPool) -> Result<CodeAttribute> {
        let index = self
            .find_attribute(pool, code::CODE_ATTRIBUTE)
            .ok_or_else(|| Error::corrupt_class(0, "method has no Code attribute"))?;
        CodeAttribute::parse(&self.attributes[index].info)
    }

    /// Re-encodes `code` into this member's `Code` attribute.
    pub fn set_code(&mut self, pool: &ConstantPool, code: &CodeAttribute) -> Result<()> {
        let index = self
            .find_attribute(pool, code::CODE_ATTRIBUTE)
            .ok_or_else(|| Error::corrupt_class(0, "method has no Code attribute"))?;
        self.attributes[index].info = code.to_bytes();
        Ok(())
    }
}

impl Attribute {
    pub(crate) fn parse_list(r: &mut ByteReader<'_>) -> Result<Vec<Attribute>> {
        let count = r.u16()?;
        let mut attributes = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let name_index = r.u16()?;
            let length = r.u32()? as usize;
            let info = r.take(length)?.to_vec();
            attributes.push(Attribute { name_index, info });
        }
        Ok(attributes)
    }

    pub(crate) fn encode_list(attributes: &[Attribute], out: &mut Vec<u8>) {
        out.extend_from_slice(&(attributes.len() as u16).to_be_bytes());
        for attribute in attributes {
            out.extend_from_slice(&attribute.name_index.to_be_bytes());
            out.extend_from_slice(&(attribute.info.len() as u32).to_be_bytes());
            out.extend_from_slice(&attribute.info);
        }
    }
}
