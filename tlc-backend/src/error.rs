//! Errors raised while emitting assembly
//!
//! All of these except `Io` mean the emitter met IR it cannot lower, which
//! is a defect in an earlier pass rather than a user error.

use thiserror::Error;
use tlc_codegen::AbiError;
use tlc_common::{CompilerError, RegId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmitError {
    #[error("Unexpected operand {operand} for '{opcode}' in function '{function}'")]
    UnexpectedOperand {
        function: String,
        opcode: String,
        operand: String,
    },

    #[error("'{opcode}' in function '{function}' is missing operand {index}")]
    MissingOperand {
        function: String,
        opcode: String,
        index: usize,
    },

    #[error("Cannot lower '{opcode}' of type {ty} in function '{function}'")]
    UnsupportedType {
        function: String,
        opcode: String,
        ty: String,
    },

    #[error("Call to unknown function '{callee}' in function '{function}'")]
    UnknownCallee { function: String, callee: String },

    #[error("No stack slot for [{slot}] in function '{function}'")]
    MissingStackSlot { function: String, slot: RegId },

    #[error("Argument a{index} does not exist in function '{function}'")]
    UnknownArgument { function: String, index: u32 },

    #[error("Frame layout failed: {0}")]
    Abi(#[from] AbiError),

    #[error("Cannot write '{path}': {message}")]
    Io { path: String, message: String },
}

impl From<EmitError> for CompilerError {
    fn from(err: EmitError) -> Self {
        match err {
            EmitError::Io { .. } => CompilerError::Io {
                message: err.to_string(),
            },
            other => CompilerError::internal(other.to_string()),
        }
    }
}
