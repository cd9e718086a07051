//! Abstract Syntax Tree consumed by the lowering
//!
//! The tree is produced by the parser (or read from JSON by the driver) and
//! is already typed: every declaration carries its [`AstType`].

mod expressions;
mod program;
mod statements;
mod types;

pub use expressions::{BinaryOp, Expression};
pub use program::{ExternDecl, FunctionDecl, Param, Program, RecordDecl, RecordField};
pub use statements::{ElifClause, Statement, StatementKind};
pub use types::AstType;
