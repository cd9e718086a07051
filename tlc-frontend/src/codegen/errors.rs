//! Lowering error types

use crate::ast::AstType;
use thiserror::Error;
use tlc_common::{CompilerError, SourceLocation};

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("undefined variable '{name}'")]
    UndefinedVariable { name: String, location: SourceLocation },

    #[error("undefined function '{name}'")]
    UndefinedFunction { name: String, location: SourceLocation },

    #[error("unknown record type '{name}'")]
    UnknownRecord { name: String, location: SourceLocation },

    #[error("record '{record}' has no field '{field}'")]
    UnknownField {
        record: String,
        field: String,
        location: SourceLocation,
    },

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: AstType,
        found: AstType,
        location: SourceLocation,
    },

    #[error("function '{name}' expects {expected} argument(s), got {found}")]
    ArgumentCount {
        name: String,
        expected: usize,
        found: usize,
        location: SourceLocation,
    },

    #[error("'{keyword}' outside of a loop")]
    OutsideLoop {
        keyword: &'static str,
        location: SourceLocation,
    },

    #[error("invalid return: {message}")]
    InvalidReturn { message: String, location: SourceLocation },

    #[error("'{name}' is defined more than once")]
    Redefinition { name: String, location: SourceLocation },

    #[error("unsupported construct: {construct}")]
    UnsupportedConstruct { construct: String, location: SourceLocation },
}

impl CodegenError {
    pub fn location(&self) -> &SourceLocation {
        match self {
            CodegenError::UndefinedVariable { location, .. }
            | CodegenError::UndefinedFunction { location, .. }
            | CodegenError::UnknownRecord { location, .. }
            | CodegenError::UnknownField { location, .. }
            | CodegenError::TypeMismatch { location, .. }
            | CodegenError::ArgumentCount { location, .. }
            | CodegenError::OutsideLoop { location, .. }
            | CodegenError::InvalidReturn { location, .. }
            | CodegenError::Redefinition { location, .. }
            | CodegenError::UnsupportedConstruct { location, .. } => location,
        }
    }
}

impl From<CodegenError> for CompilerError {
    fn from(err: CodegenError) -> Self {
        CompilerError::Lowering {
            location: err.location().clone(),
            message: err.to_string(),
        }
    }
}
