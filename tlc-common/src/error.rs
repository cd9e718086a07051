//! Error handling for the compiler
//!
//! Every stage reports failures through its own `thiserror` type; all of
//! them convert into [`CompilerError`] at the driver boundary.

use crate::source_loc::SourceLocation;
use std::fmt;
use thiserror::Error;

/// Main compiler error type that encompasses all phases of compilation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompilerError {
    /// User-facing lowering diagnostic (unknown name, bad call, type mismatch)
    #[error("Lowering error at {location}: {message}")]
    Lowering {
        location: SourceLocation,
        message: String,
    },

    /// A pass met IR it cannot handle
    #[error("Internal compiler error: {message}")]
    Internal { message: String },

    /// An external assembler or linker failed
    #[error("{tool} failed with {status}")]
    Toolchain { tool: String, status: ExitStatus },

    #[error("IO error: {message}")]
    Io { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

/// Exit status of an external tool, `None` when it was killed by a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus(pub Option<i32>);

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(code) => write!(f, "exit code {}", code),
            None => write!(f, "a signal"),
        }
    }
}

impl CompilerError {
    pub fn lowering(location: SourceLocation, message: impl Into<String>) -> Self {
        CompilerError::Lowering {
            location,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CompilerError::Internal {
            message: message.into(),
        }
    }

    /// Process exit code the driver should terminate with
    pub fn exit_code(&self) -> i32 {
        match self {
            CompilerError::Toolchain {
                status: ExitStatus(Some(code)),
                ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }
}

impl From<std::io::Error> for CompilerError {
    fn from(err: std::io::Error) -> Self {
        CompilerError::Io {
            message: err.to_string(),
        }
    }
}

impl From<String> for CompilerError {
    fn from(message: String) -> Self {
        CompilerError::Internal { message }
    }
}
