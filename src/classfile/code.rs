//! The `Code` attribute of a method.
//!
//! This is the only attribute the patcher decodes beyond name and payload.
//! The instruction stream becomes a `Vec<Instruction>`; the exception table
//! and any nested attributes (`LineNumberTable`, `StackMapTable`, ...) are
//! carried through untouched. Edits that only rewrite same-width operands
//! or replace the stream tail leave every carried-through offset valid.

use crate::bytecode::{self, Instruction};
use crate::classfile::reader::ByteReader;
use crate::classfile::Attribute;
use crate::Result;

/// Attribute name of a method body.
pub const CODE_ATTRIBUTE: &str = "Code";

/// One `exception_table` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionHandler {
    /// First covered offset, inclusive.
    pub start_pc: u16,
    /// Last covered offset, exclusive.
    pub end_pc: u16,
    /// Offset of the handler.
    pub handler_pc: u16,
    /// Pool index of the caught class, or 0 for `finally`.
    pub catch_type: u16,
}

/// A decoded `Code` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeAttribute {
    /// Operand stack depth limit.
    pub max_stack: u16,
    /// Local variable slot count, parameters included.
    pub max_locals: u16,
    /// The decoded instruction stream.
    pub body: Vec<Instruction>,
    /// Exception handler rows, carried through unmodified.
    pub exception_table: Vec<ExceptionHandler>,
    /// Nested attributes (`LineNumberTable`, ...), carried through unmodified.
    pub attributes: Vec<Attribute>,
}

impl CodeAttribute {
    /// Decodes the attribute payload (the bytes after `attribute_length`).
    pub fn parse(info: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(info);
        let max_stack = r.u16()?;
        let max_locals = r.u16()?;

        let code_length = r.u32()? as usize;
        let body = bytecode::decode(r.take(code_length)?)?;

        let handler_count = r.u16()?;
        let mut exception_table = Vec::with_capacity(handler_count as usize);
        for _ in 0..handler_count {
            exception_table.push(ExceptionHandler {
                start_pc: r.u16()?,
                end_pc: r.u16()?,
                handler_pc: r.u16()?,
                catch_type: r.u16()?,
            });
        }

        let attributes = Attribute::parse_list(&mut r)?;
        if r.remaining() != 0 {
            return Err(r.corrupt(format!(
                "{} trailing bytes after Code attribute",
                r.remaining()
            )));
        }

        Ok(Self {
            max_stack,
            max_locals,
            body,
            exception_table,
            attributes,
        })
    }

    /// Re-encodes the attribute payload.
    pub fn to_bytes(&self) -> Vec<u8> {
        let code = bytecode::encode(&self.body);
        let mut out = Vec::new();
        out.extend_from_slice(&self.max_stack.to_be_bytes());
        out.extend_from_slice(&self.max_locals.to_be_bytes());
        out.extend_from_slice(&(code.len() as u32).to_be_bytes());
        out.extend_from_slice(&code);
        out.extend_from_slice(&(self.exception_table.len() as u16).to_be_bytes());
        for handler in &self.exception_table {
            out.extend_from_slice(&handler.start_pc.to_be_bytes());
            out.extend_from_slice(&handler.end_pc.to_be_bytes());
            out.extend_from_slice(&handler.handler_pc.to_be_bytes());
            out.extend_from_slice(&handler.catch_type.to_be_bytes());
        }
        Attribute::encode_list(&self.attributes, &mut out);
        out
    }

    /// Encoded byte length of the instruction stream.
    pub fn code_len(&self) -> u32 {
        self.body.iter().map(Instruction::byte_len).sum()
    }

    /// Positions of the instructions matching `predicate`, in stream order.
    ///
    /// The iterator borrows the body, so collect it before mutating.
    pub fn find_all(
        &self,
        predicate: impl Fn(&Instruction) -> bool,
    ) -> impl Iterator<Item = usize> {
        self.body
            .iter()
            .enumerate()
            .filter(move |&(_, instruction)| predicate(instruction))
            .map(|(position, _)| position)
    }

    /// Drops the trailing `drop_last` instructions (typically the final
    /// `return`) and appends `tail`, then recomputes every offset.
    ///
    /// The caller owns the bytecode-level obligations: `tail` must end in a
    /// terminator, and nothing may branch into the replaced region.
    pub fn truncate_and_append(&mut self, drop_last: usize, tail: Vec<Instruction>) {
        let keep = self.body.len().saturating_sub(drop_last);
        self.body.truncate(keep);
        self.body.extend(tail);
        bytecode::assign_offsets(&mut self.body);
    }
}
