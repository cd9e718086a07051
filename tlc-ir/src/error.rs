//! Errors raised while building or transforming IR

use thiserror::Error;
use tlc_common::{BlockId, CompilerError, RegId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IrError {
    #[error("No function is currently being built")]
    NoCurrentFunction,

    #[error("No insertion point set in function '{0}'")]
    NoInsertPoint(String),

    #[error("Block {block} does not exist in function '{function}'")]
    UnknownBlock { function: String, block: BlockId },

    #[error("Duplicate block name '{name}' in function '{function}'")]
    DuplicateBlock { function: String, name: String },

    #[error("Extern function '{0}' cannot own blocks")]
    ExternBody(String),

    #[error("Unresolved virtual register %{reg} in function '{function}'")]
    UnresolvedRegister { function: String, reg: RegId },

    #[error("Invalid destination operand {operand} for '{opcode}' in function '{function}'")]
    InvalidDestination {
        function: String,
        opcode: String,
        operand: String,
    },
}

impl From<IrError> for CompilerError {
    fn from(err: IrError) -> Self {
        CompilerError::internal(err.to_string())
    }
}
