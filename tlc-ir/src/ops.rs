//! The closed opcode set and compile-time evaluation of it

use crate::types::IrType;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    // Control
    Ret,
    RetVoid,
    Br,
    // Fused compare-and-branch; the target is operand 3
    Beq,
    Bne,
    Bgt,
    Bge,
    Blt,
    Ble,
    // Unsigned orderings
    Bugt,
    Buge,
    Bult,
    Bule,

    // Arithmetic
    Add,
    Sub,
    SMul,
    UMul,
    SDiv,
    UDiv,
    SRem,
    URem,
    And,
    Or,
    Xor,
    Not,
    Neg,

    // Memory
    Alloca,
    Load,
    Store,
    StructLoad,
    StructStore,
    Gep,

    Call,
}

impl Opcode {
    pub fn name(self) -> &'static str {
        match self {
            Opcode::Ret => "ret",
            Opcode::RetVoid => "retvoid",
            Opcode::Br => "br",
            Opcode::Beq => "beq",
            Opcode::Bne => "bne",
            Opcode::Bgt => "bgt",
            Opcode::Bge => "bge",
            Opcode::Blt => "blt",
            Opcode::Ble => "ble",
            Opcode::Bugt => "bugt",
            Opcode::Buge => "buge",
            Opcode::Bult => "bult",
            Opcode::Bule => "bule",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::SMul => "smul",
            Opcode::UMul => "umul",
            Opcode::SDiv => "sdiv",
            Opcode::UDiv => "udiv",
            Opcode::SRem => "srem",
            Opcode::URem => "urem",
            Opcode::And => "and",
            Opcode::Or => "or",
            Opcode::Xor => "xor",
            Opcode::Not => "not",
            Opcode::Neg => "neg",
            Opcode::Alloca => "alloca",
            Opcode::Load => "load",
            Opcode::Store => "store",
            Opcode::StructLoad => "load.struct",
            Opcode::StructStore => "store.struct",
            Opcode::Gep => "getelementptr",
            Opcode::Call => "call",
        }
    }

    /// Instructions that end a block
    pub fn is_terminator(self) -> bool {
        matches!(self, Opcode::Ret | Opcode::RetVoid | Opcode::Br)
    }

    pub fn is_compare_branch(self) -> bool {
        matches!(
            self,
            Opcode::Beq
                | Opcode::Bne
                | Opcode::Bgt
                | Opcode::Bge
                | Opcode::Blt
                | Opcode::Ble
                | Opcode::Bugt
                | Opcode::Buge
                | Opcode::Bult
                | Opcode::Bule
        )
    }

    /// Two-operand arithmetic and bitwise opcodes
    pub fn is_binary_arithmetic(self) -> bool {
        matches!(
            self,
            Opcode::Add
                | Opcode::Sub
                | Opcode::SMul
                | Opcode::UMul
                | Opcode::SDiv
                | Opcode::UDiv
                | Opcode::SRem
                | Opcode::URem
                | Opcode::And
                | Opcode::Or
                | Opcode::Xor
        )
    }

    pub fn is_unary_arithmetic(self) -> bool {
        matches!(self, Opcode::Not | Opcode::Neg)
    }

    /// Opcodes after which hardware-register numbering starts over
    pub fn clobbers_hardware_registers(self) -> bool {
        matches!(self, Opcode::Store | Opcode::StructStore | Opcode::Call)
    }

    /// Evaluate a binary arithmetic opcode on two constants at `ty`'s width.
    ///
    /// Returns `None` for non-arithmetic opcodes and for division or
    /// remainder by zero, which are left for run time.
    pub fn fold(self, ty: &IrType, lhs: i64, rhs: i64) -> Option<i64> {
        let (a, b) = (ty.wrap(lhs), ty.wrap(rhs));
        let (ua, ub) = (ty.zero_extend(lhs), ty.zero_extend(rhs));
        if matches!(self, Opcode::SDiv | Opcode::UDiv | Opcode::SRem | Opcode::URem) && b == 0 {
            return None;
        }
        let value = match self {
            Opcode::Add => a.wrapping_add(b),
            Opcode::Sub => a.wrapping_sub(b),
            Opcode::SMul => a.wrapping_mul(b),
            Opcode::UMul => ua.wrapping_mul(ub) as i64,
            Opcode::SDiv => a.wrapping_div(b),
            Opcode::UDiv => (ua / ub) as i64,
            Opcode::SRem => a.wrapping_rem(b),
            Opcode::URem => (ua % ub) as i64,
            Opcode::And => a & b,
            Opcode::Or => a | b,
            Opcode::Xor => a ^ b,
            _ => return None,
        };
        Some(ty.wrap(value))
    }

    /// Evaluate a compare-and-branch condition on two constants
    pub fn compare(self, ty: &IrType, lhs: i64, rhs: i64) -> Option<bool> {
        let (a, b) = (ty.wrap(lhs), ty.wrap(rhs));
        let (ua, ub) = (ty.zero_extend(lhs), ty.zero_extend(rhs));
        match self {
            Opcode::Beq => Some(a == b),
            Opcode::Bne => Some(a != b),
            Opcode::Bgt => Some(a > b),
            Opcode::Bge => Some(a >= b),
            Opcode::Blt => Some(a < b),
            Opcode::Ble => Some(a <= b),
            Opcode::Bugt => Some(ua > ub),
            Opcode::Buge => Some(ua >= ub),
            Opcode::Bult => Some(ua < ub),
            Opcode::Bule => Some(ua <= ub),
            _ => None,
        }
    }

    /// The compare-and-branch taken exactly when `self` is not
    pub fn inverse(self) -> Option<Opcode> {
        match self {
            Opcode::Beq => Some(Opcode::Bne),
            Opcode::Bne => Some(Opcode::Beq),
            Opcode::Bgt => Some(Opcode::Ble),
            Opcode::Bge => Some(Opcode::Blt),
            Opcode::Blt => Some(Opcode::Bge),
            Opcode::Ble => Some(Opcode::Bgt),
            Opcode::Bugt => Some(Opcode::Bule),
            Opcode::Buge => Some(Opcode::Bult),
            Opcode::Bult => Some(Opcode::Buge),
            Opcode::Bule => Some(Opcode::Bugt),
            _ => None,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
