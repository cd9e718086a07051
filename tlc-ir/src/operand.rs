//! IR Operands

use serde::{Deserialize, Serialize};
use std::fmt;
use tlc_common::{PhysId, RegId};

/// An instruction operand
///
/// `Imm`, `Reg`, `Label` and `StringPtr` come out of the builder. `Mem`,
/// `HReg`, `AReg` and `PReg` only appear after the transform pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operand {
    Imm(i64),
    Reg(RegId),
    /// Branch target, by block name
    Label(String),
    /// Module string constant: symbol name plus the literal text
    StringPtr { name: String, value: String },
    /// Stack slot of the alloca that defined register `RegId`
    Mem(RegId),
    HReg(PhysId),
    AReg(PhysId),
    PReg(PhysId),
}

impl Operand {
    pub fn label(name: impl Into<String>) -> Self {
        Operand::Label(name.into())
    }

    pub fn as_imm(&self) -> Option<i64> {
        match self {
            Operand::Imm(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_reg(&self) -> Option<RegId> {
        match self {
            Operand::Reg(reg) => Some(*reg),
            _ => None,
        }
    }

    pub fn as_label(&self) -> Option<&str> {
        match self {
            Operand::Label(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_imm(&self) -> bool {
        matches!(self, Operand::Imm(_))
    }

    /// Operands introduced by register/stack assignment
    pub fn is_physical(&self) -> bool {
        matches!(
            self,
            Operand::Mem(_) | Operand::HReg(_) | Operand::AReg(_) | Operand::PReg(_)
        )
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Imm(value) => write!(f, "{}", value),
            Operand::Reg(reg) => write!(f, "%{}", reg),
            Operand::Label(name) => write!(f, "{}", name),
            Operand::StringPtr { name, value } => write!(f, "{}({:?})", name, value),
            Operand::Mem(name) => write!(f, "[{}]", name),
            Operand::HReg(n) => write!(f, "r{}", n),
            Operand::AReg(n) => write!(f, "a{}", n),
            Operand::PReg(n) => write!(f, "p{}", n),
        }
    }
}
