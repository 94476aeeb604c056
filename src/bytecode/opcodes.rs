//! JVM opcode constants and operand widths.
//!
//! Only the opcodes the patches construct or inspect get named constants;
//! [`fixed_operand_len`] covers the complete fixed-width instruction set so
//! the decoder can walk any method body it encounters.

#![allow(missing_docs)]

pub const NOP: u8 = 0x00;
pub const ACONST_NULL: u8 = 0x01;
pub const ICONST_0: u8 = 0x03;
pub const ICONST_1: u8 = 0x04;
pub const BIPUSH: u8 = 0x10;
pub const SIPUSH: u8 = 0x11;
pub const LDC: u8 = 0x12;
pub const LDC_W: u8 = 0x13;
pub const LDC2_W: u8 = 0x14;
pub const ILOAD: u8 = 0x15;
pub const ALOAD: u8 = 0x19;
pub const ILOAD_3: u8 = 0x1D;
pub const ALOAD_0: u8 = 0x2A;
pub const ALOAD_1: u8 = 0x2B;
pub const ALOAD_2: u8 = 0x2C;
pub const ALOAD_3: u8 = 0x2D;
pub const AALOAD: u8 = 0x32;
pub const ISTORE: u8 = 0x36;
pub const ASTORE: u8 = 0x3A;
pub const ISTORE_3: u8 = 0x3E;
pub const ASTORE_2: u8 = 0x4D;
pub const POP: u8 = 0x57;
pub const DUP: u8 = 0x59;
pub const IINC: u8 = 0x84;
pub const IF_ICMPGE: u8 = 0xA2;
pub const GOTO: u8 = 0xA7;
pub const RET: u8 = 0xA9;
pub const TABLESWITCH: u8 = 0xAA;
pub const LOOKUPSWITCH: u8 = 0xAB;
pub const IRETURN: u8 = 0xAC;
pub const ARETURN: u8 = 0xB0;
pub const RETURN: u8 = 0xB1;
pub const GETSTATIC: u8 = 0xB2;
pub const PUTSTATIC: u8 = 0xB3;
pub const GETFIELD: u8 = 0xB4;
pub const PUTFIELD: u8 = 0xB5;
pub const INVOKEVIRTUAL: u8 = 0xB6;
pub const INVOKESPECIAL: u8 = 0xB7;
pub const INVOKESTATIC: u8 = 0xB8;
pub const INVOKEINTERFACE: u8 = 0xB9;
pub const INVOKEDYNAMIC: u8 = 0xBA;
pub const NEW: u8 = 0xBB;
pub const NEWARRAY: u8 = 0xBC;
pub const ANEWARRAY: u8 = 0xBD;
pub const ARRAYLENGTH: u8 = 0xBE;
pub const ATHROW: u8 = 0xBF;
pub const CHECKCAST: u8 = 0xC0;
pub const INSTANCEOF: u8 = 0xC1;
pub const WIDE: u8 = 0xC4;
pub const MULTIANEWARRAY: u8 = 0xC5;
pub const IFNULL: u8 = 0xC6;
pub const IFNONNULL: u8 = 0xC7;
pub const GOTO_W: u8 = 0xC8;
pub const JSR_W: u8 = 0xC9;

/// Operand byte count for fixed-width opcodes.
///
/// Returns `None` for `wide`, `tableswitch`, and `lookupswitch` (which the
/// decoder handles specially) and for byte values that are not valid
/// instructions.
pub(crate) fn fixed_operand_len(opcode: u8) -> Option<usize> {
    match opcode {
        // nop through dconst_1
        0x00..=0x0F => Some(0),
        BIPUSH | LDC => Some(1),
        SIPUSH | LDC_W | LDC2_W => Some(2),
        // iload through aload (explicit local index)
        0x15..=0x19 => Some(1),
        // iload_0 through saload
        0x1A..=0x35 => Some(0),
        // istore through astore (explicit local index)
        0x36..=0x3A => Some(1),
        // istore_0 through lxor
        0x3B..=0x83 => Some(0),
        IINC => Some(2),
        // i2l through dcmpg
        0x85..=0x98 => Some(0),
        // ifeq through jsr
        0x99..=0xA8 => Some(2),
        RET => Some(1),
        // ireturn through return
        0xAC..=0xB1 => Some(0),
        GETSTATIC..=INVOKESTATIC => Some(2),
        INVOKEINTERFACE | INVOKEDYNAMIC => Some(4),
        NEW => Some(2),
        NEWARRAY => Some(1),
        ANEWARRAY => Some(2),
        ARRAYLENGTH | ATHROW => Some(0),
        CHECKCAST | INSTANCEOF => Some(2),
        // monitorenter, monitorexit
        0xC2 | 0xC3 => Some(0),
        MULTIANEWARRAY => Some(3),
        IFNULL | IFNONNULL => Some(2),
        GOTO_W | JSR_W => Some(4),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_widths() {
        assert_eq!(fixed_operand_len(NOP), Some(0));
        assert_eq!(fixed_operand_len(ACONST_NULL), Some(0));
        assert_eq!(fixed_operand_len(LDC), Some(1));
        assert_eq!(fixed_operand_len(LDC_W), Some(2));
        assert_eq!(fixed_operand_len(IINC), Some(2));
        assert_eq!(fixed_operand_len(GOTO), Some(2));
        assert_eq!(fixed_operand_len(INVOKESTATIC), Some(2));
        assert_eq!(fixed_operand_len(INVOKEINTERFACE), Some(4));
        assert_eq!(fixed_operand_len(MULTIANEWARRAY), Some(3));
        assert_eq!(fixed_operand_len(GOTO_W), Some(4));
    }

    #[test]
    fn test_variable_and_invalid() {
        assert_eq!(fixed_operand_len(WIDE), None);
        assert_eq!(fixed_operand_len(TABLESWITCH), None);
        assert_eq!(fixed_operand_len(LOOKUPSWITCH), None);
        // Reserved/unassigned byte values
        assert_eq!(fixed_operand_len(0xCB), None);
        assert_eq!(fixed_operand_len(0xFE), None);
        assert_eq!(fixed_operand_len(0xFF), None);
    }

    /// Byte values the patches emit, against the instruction table. The
    /// rest of the crate compares these constants only to themselves, so
    /// a wrong value decodes and re-encodes without complaint.
    #[test]
    fn test_emitted_opcode_values() {
        assert_eq!(ACONST_NULL, 0x01);
        assert_eq!(ICONST_0, 0x03);
        assert_eq!(ILOAD_3, 0x1D);
        assert_eq!(ALOAD_0, 0x2A);
        assert_eq!(ALOAD_1, 0x2B);
        assert_eq!(ALOAD_2, 0x2C);
        assert_eq!(AALOAD, 0x32);
        assert_eq!(ISTORE_3, 0x3E);
        assert_eq!(ASTORE_2, 0x4D);
        assert_eq!(POP, 0x57);
        assert_eq!(IINC, 0x84);
        assert_eq!(IF_ICMPGE, 0xA2);
        assert_eq!(GOTO, 0xA7);
        assert_eq!(RETURN, 0xB1);
        assert_eq!(GETSTATIC, 0xB2);
        assert_eq!(PUTSTATIC, 0xB3);
        assert_eq!(INVOKESTATIC, 0xB8);
        assert_eq!(INVOKEINTERFACE, 0xB9);
        assert_eq!(ARRAYLENGTH, 0xBE);
    }
}
