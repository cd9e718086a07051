//! IR Instructions

use crate::operand::Operand;
use crate::ops::Opcode;
use crate::types::IrType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Callee and arguments of a `call`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallInfo {
    pub callee: String,
    pub args: Vec<Operand>,
}

/// One IR instruction: opcode, result type, up to three sources and an
/// optional destination.
///
/// The type is the result type for value-producing opcodes, the stored type
/// for `store`, the allocated type for `alloca`, the record type for the
/// struct accessors and the pointer type for `getelementptr`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    pub ty: IrType,
    pub dest: Option<Operand>,
    pub operands: [Option<Operand>; 3],
    pub call: Option<CallInfo>,
}

impl Instruction {
    pub fn new(opcode: Opcode, ty: IrType) -> Self {
        Self {
            opcode,
            ty,
            dest: None,
            operands: [None, None, None],
            call: None,
        }
    }

    pub fn with_dest(mut self, dest: Operand) -> Self {
        self.dest = Some(dest);
        self
    }

    pub fn with_operands(mut self, operands: impl IntoIterator<Item = Operand>) -> Self {
        for (slot, operand) in self.operands.iter_mut().zip(operands) {
            *slot = Some(operand);
        }
        self
    }

    pub fn with_call(mut self, callee: impl Into<String>, args: Vec<Operand>) -> Self {
        self.call = Some(CallInfo {
            callee: callee.into(),
            args,
        });
        self
    }

    /// Source operand `index` (0-based)
    pub fn operand(&self, index: usize) -> Option<&Operand> {
        self.operands.get(index).and_then(Option::as_ref)
    }

    /// All source operands, call arguments included
    pub fn sources(&self) -> impl Iterator<Item = &Operand> {
        self.operands
            .iter()
            .flatten()
            .chain(self.call.iter().flat_map(|call| call.args.iter()))
    }

    pub fn sources_mut(&mut self) -> impl Iterator<Item = &mut Operand> {
        self.operands
            .iter_mut()
            .flatten()
            .chain(self.call.iter_mut().flat_map(|call| call.args.iter_mut()))
    }

    pub fn is_terminator(&self) -> bool {
        self.opcode.is_terminator()
    }

    /// Block name this instruction may jump to
    pub fn branch_target(&self) -> Option<&str> {
        match self.opcode {
            Opcode::Br => self.operand(0).and_then(Operand::as_label),
            op if op.is_compare_branch() => self.operand(2).and_then(Operand::as_label),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(dest) = &self.dest {
            write!(f, "{} = ", dest)?;
        }

        if let Some(call) = &self.call {
            write!(f, "{} {} {}(", self.opcode, self.ty, call.callee)?;
            for (i, arg) in call.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            return write!(f, ");");
        }

        write!(f, "{}", self.opcode)?;
        if !self.ty.is_void() {
            write!(f, " {}", self.ty)?;
        }
        for (i, operand) in self.operands.iter().flatten().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{}{}", sep, operand)?;
        }
        write!(f, ";")
    }
}
