//! Tiny Lang Compiler - Common Types and Utilities
//!
//! This crate contains shared types, error definitions, and utilities
//! used across all stages of the compiler pipeline.

pub mod error;
pub mod source_loc;
pub mod types;

pub use error::CompilerError;
pub use source_loc::SourceLocation;
pub use types::*;
