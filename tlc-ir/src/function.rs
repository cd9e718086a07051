//! Function definitions and declarations

use crate::block::Block;
use crate::error::IrError;
use crate::module::Linkage;
use crate::operand::Operand;
use crate::types::IrType;
use serde::{Deserialize, Serialize};
use std::fmt;
use tlc_common::{BlockId, RegId};

/// An incoming argument and the virtual register naming it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    pub reg: RegId,
    pub ty: IrType,
}

/// Frame slot reserved for one alloca, `offset` bytes below the frame base
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackSlot {
    pub name: RegId,
    pub offset: u32,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub linkage: Linkage,
    pub return_type: IrType,
    pub args: Vec<Argument>,
    pub variadic: bool,
    pub blocks: Vec<Block>,
    /// Bytes of locals reserved by the prologue, set by the transform pass
    pub stack_size: u32,
    pub stack_slots: Vec<StackSlot>,
}

impl Function {
    /// A function whose arguments are named `%0..%n-1`
    pub fn new(name: impl Into<String>, linkage: Linkage, return_type: IrType, params: Vec<IrType>) -> Self {
        let args = params
            .into_iter()
            .enumerate()
            .map(|(i, ty)| Argument { reg: i as RegId, ty })
            .collect();
        Self {
            name: name.into(),
            linkage,
            return_type,
            args,
            variadic: false,
            blocks: Vec::new(),
            stack_size: 0,
            stack_slots: Vec::new(),
        }
    }

    /// Declaration of an externally supplied symbol
    pub fn new_extern(name: impl Into<String>, return_type: IrType, params: Vec<IrType>, variadic: bool) -> Self {
        let mut function = Self::new(name, Linkage::Extern, return_type, params);
        function.variadic = variadic;
        function
    }

    pub fn is_extern(&self) -> bool {
        self.linkage == Linkage::Extern
    }

    pub fn arg(&self, index: usize) -> Option<Operand> {
        self.args.get(index).map(|arg| Operand::Reg(arg.reg))
    }

    pub fn param_types(&self) -> impl Iterator<Item = &IrType> {
        self.args.iter().map(|arg| &arg.ty)
    }

    pub fn entry(&self) -> Option<&Block> {
        self.blocks.first()
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| b.id == id)
    }

    pub fn block_by_name(&self, name: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.name == name)
    }

    fn position(&self, id: BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| b.id == id)
    }

    fn check_new_block(&self, block: &Block) -> Result<(), IrError> {
        if self.is_extern() {
            return Err(IrError::ExternBody(self.name.clone()));
        }
        if self.block_by_name(&block.name).is_some() {
            return Err(IrError::DuplicateBlock {
                function: self.name.clone(),
                name: block.name.clone(),
            });
        }
        Ok(())
    }

    /// Append a block at the end of the layout
    pub fn add_block(&mut self, block: Block) -> Result<BlockId, IrError> {
        self.check_new_block(&block)?;
        let id = block.id;
        self.blocks.push(block);
        Ok(id)
    }

    /// Splice a block in directly after block `after`
    pub fn add_block_after(&mut self, after: BlockId, block: Block) -> Result<BlockId, IrError> {
        self.check_new_block(&block)?;
        let position = self.position(after).ok_or_else(|| IrError::UnknownBlock {
            function: self.name.clone(),
            block: after,
        })?;
        let id = block.id;
        self.blocks.insert(position + 1, block);
        Ok(id)
    }

    pub fn slot(&self, name: RegId) -> Option<&StackSlot> {
        self.stack_slots.iter().find(|slot| slot.name == name)
    }

    pub fn instruction_count(&self) -> usize {
        self.blocks.iter().map(Block::len).sum()
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}(", self.linkage, self.return_type, self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "%{}:{}", arg.reg, arg.ty)?;
        }
        if self.variadic {
            write!(f, "{}...", if self.args.is_empty() { "" } else { ", " })?;
        }
        write!(f, ")")?;

        if self.is_extern() {
            return writeln!(f, ";");
        }

        writeln!(f, " {{")?;
        for block in &self.blocks {
            write!(f, "{}", block)?;
        }
        writeln!(f, "}}")
    }
}
