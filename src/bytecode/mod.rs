//! Instruction stream decoding, encoding, and in-place editing.
//!
//! A method body decodes into a flat `Vec<Instruction>`; encoding is the
//! byte-wise inverse. Operands are carried as raw bytes, including the
//! alignment padding inside `tableswitch`/`lookupswitch`, so a decoded
//! stream re-encodes to exactly its input.
//!
//! The edits in scope never shift code: operand rewrites are same-width
//! ([`Instruction::set_pool_index`]), and structural changes only touch the
//! stream tail. That is what makes the raw-operand representation sound --
//! branch targets and switch padding in the preserved prefix stay valid
//! without any offset recomputation.

pub mod opcodes;

use crate::classfile::reader::ByteReader;
use crate::{Error, Result};

/// One decoded JVM instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Byte offset within the method body.
    pub offset: u32,
    /// The opcode byte; see [`opcodes`].
    pub opcode: u8,
    /// Raw operand bytes, exactly as they follow the opcode.
    pub operands: Vec<u8>,
}

impl Instruction {
    /// Builds an instruction with offset 0; [`assign_offsets`] lays out a
    /// whole stream.
    pub fn new(opcode: u8, operands: Vec<u8>) -> Self {
        Self {
            offset: 0,
            opcode,
            operands,
        }
    }

    /// Encoded length in bytes.
    pub fn byte_len(&self) -> u32 {
        1 + self.operands.len() as u32
    }

    /// The constant-pool index operand, for opcodes that carry one.
    pub fn pool_index(&self) -> Option<u16> {
        match self.opcode {
            opcodes::LDC => self.operands.first().map(|&b| u16::from(b)),
            opcodes::LDC_W
            | opcodes::LDC2_W
            | opcodes::GETSTATIC..=opcodes::INVOKESTATIC
            | opcodes::INVOKEINTERFACE
            | opcodes::INVOKEDYNAMIC
            | opcodes::NEW
            | opcodes::ANEWARRAY
            | opcodes::CHECKCAST
            | opcodes::INSTANCEOF
            | opcodes::MULTIANEWARRAY => {
                if self.operands.len() >= 2 {
                    Some(u16::from_be_bytes([self.operands[0], self.operands[1]]))
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Rewrites the constant-pool index operand in place.
    ///
    /// The instruction keeps its size, so no downstream offsets shift. `ldc`
    /// holds a single-byte index; widening it to `ldc_w` would shift every
    /// later offset, which is out of scope, so an index past 255 fails with
    /// [`Error::UnsupportedFeature`].
    pub fn set_pool_index(&mut self, index: u16) -> Result<()> {
        match self.opcode {
            opcodes::LDC => {
                let narrow = u8::try_from(index).map_err(|_| Error::UnsupportedFeature {
                    feature: "constant pool index beyond ldc range",
                })?;
                match self.operands.first_mut() {
                    Some(slot) => {
                        *slot = narrow;
                        Ok(())
                    }
                    None => Err(Error::corrupt_class(
                        u64::from(self.offset),
                        "ldc instruction without operand",
                    )),
                }
            }
            opcodes::LDC_W
            | opcodes::LDC2_W
            | opcodes::GETSTATIC..=opcodes::INVOKESTATIC
            | opcodes::INVOKEINTERFACE
            | opcodes::INVOKEDYNAMIC
            | opcodes::NEW
            | opcodes::ANEWARRAY
            | opcodes::CHECKCAST
            | opcodes::INSTANCEOF
            | opcodes::MULTIANEWARRAY => {
                if self.operands.len() < 2 {
                    return Err(Error::corrupt_class(
                        u64::from(self.offset),
                        "truncated constant-pool operand",
                    ));
                }
                self.operands[0..2].copy_from_slice(&index.to_be_bytes());
                Ok(())
            }
            _ => Err(Error::UnsupportedFeature {
                feature: "constant-pool operand rewrite for this opcode",
            }),
        }
    }

    /// `aconst_null`
    pub fn aconst_null() -> Self {
        Self::new(opcodes::ACONST_NULL, Vec::new())
    }

    /// `return`
    pub fn return_void() -> Self {
        Self::new(opcodes::RETURN, Vec::new())
    }

    /// `putstatic` of the given `Fieldref`.
    pub fn putstatic(field_ref: u16) -> Self {
        Self::new(opcodes::PUTSTATIC, field_ref.to_be_bytes().to_vec())
    }

    /// `invokestatic` of the given `Methodref`.
    pub fn invokestatic(method_ref: u16) -> Self {
        Self::new(opcodes::INVOKESTATIC, method_ref.to_be_bytes().to_vec())
    }

    /// `invokeinterface` of the given `InterfaceMethodref`.
    ///
    /// `count` is the argument slot count including the receiver, as the
    /// format requires; the trailing zero byte is mandatory.
    pub fn invokeinterface(method_ref: u16, count: u8) -> Self {
        let mut operands = method_ref.to_be_bytes().to_vec();
        operands.push(count);
        operands.push(0);
        Self::new(opcodes::INVOKEINTERFACE, operands)
    }
}

/// Decodes a complete method body.
///
/// Offsets in errors are relative to the start of the body.
pub fn decode(code: &[u8]) -> Result<Vec<Instruction>> {
    let mut r = ByteReader::new(code);
    let mut body = Vec::new();

    while r.remaining() > 0 {
        let offset = r.pos() as u32;
        let opcode = r.u8()?;
        let operands = match opcode {
            opcodes::WIDE => {
                let inner = r.u8()?;
                let extra = match inner {
                    opcodes::IINC => 4,
                    0x15..=0x19 | 0x36..=0x3A | opcodes::RET => 2,
                    other => {
                        return Err(Error::corrupt_class(
                            u64::from(offset),
                            format!("invalid wide form {other:#04x}"),
                        ));
                    }
                };
                let mut operands = vec![inner];
                operands.extend_from_slice(r.take(extra)?);
                operands
            }
            opcodes::TABLESWITCH => {
                let mut operands = switch_padding(&mut r)?;
                // default
                operands.extend_from_slice(r.take(4)?);
                let low_bytes = r.take(4)?;
                let low = i32::from_be_bytes([low_bytes[0], low_bytes[1], low_bytes[2], low_bytes[3]]);
                operands.extend_from_slice(low_bytes);
                let high_bytes = r.take(4)?;
                let high =
                    i32::from_be_bytes([high_bytes[0], high_bytes[1], high_bytes[2], high_bytes[3]]);
                operands.extend_from_slice(high_bytes);
                if high < low {
                    return Err(Error::corrupt_class(
                        u64::from(offset),
                        format!("tableswitch bounds inverted ({low}..{high})"),
                    ));
                }
                let jumps = (i64::from(high) - i64::from(low) + 1) as u64 * 4;
                operands.extend_from_slice(r.take(jumps as usize)?);
                operands
            }
            opcodes::LOOKUPSWITCH => {
                let mut operands = switch_padding(&mut r)?;
                // default
                operands.extend_from_slice(r.take(4)?);
                let count_bytes = r.take(4)?;
                let pairs = i32::from_be_bytes([
                    count_bytes[0],
                    count_bytes[1],
                    count_bytes[2],
                    count_bytes[3],
                ]);
                operands.extend_from_slice(count_bytes);
                if pairs < 0 {
                    return Err(Error::corrupt_class(
                        u64::from(offset),
                        format!("lookupswitch pair count is negative ({pairs})"),
                    ));
                }
                operands.extend_from_slice(r.take(pairs as usize * 8)?);
                operands
            }
            _ => match opcodes::fixed_operand_len(opcode) {
                Some(len) => r.take(len)?.to_vec(),
                None => {
                    return Err(Error::corrupt_class(
                        u64::from(offset),
                        format!("unknown opcode {opcode:#04x}"),
                    ));
                }
            },
        };
        body.push(Instruction {
            offset,
            opcode,
            operands,
        });
    }

    Ok(body)
}

/// Consumes and returns the 0-3 padding bytes that align a switch
/// instruction's first operand to a 4-byte boundary within the body.
fn switch_padding(r: &mut ByteReader<'_>) -> Result<Vec<u8>> {
    let pad = (4 - r.pos() % 4) % 4;
    Ok(r.take(pad)?.to_vec())
}

/// Encodes a method body; the exact inverse of [`decode`].
pub fn encode(body: &[Instruction]) -> Vec<u8> {
    let mut out = Vec::new();
    for instruction in body {
        out.push(instruction.opcode);
        out.extend_from_slice(&instruction.operands);
    }
    out
}

/// Recomputes every instruction's `offset` from the stream layout.
pub fn assign_offsets(body: &mut [Instruction]) {
    let mut offset = 0u32;
    for instruction in body {
        instruction.offset = offset;
        offset += instruction.byte_len();
    }
}
