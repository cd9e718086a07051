//! Tiny Lang Compiler - Frontend
//!
//! This crate provides the typed AST the parser hands over and the lowering
//! of that AST into the low-level IR:
//! - `ast`: statement/expression tree, records and extern declarations
//! - `codegen`: AST → IR lowering driven through the IR builder

pub mod ast;
pub mod codegen;

pub use ast::{AstType, BinaryOp, Expression, Program, Statement, StatementKind};
pub use codegen::{CodeGenerator, CodegenError};

use tlc_common::CompilerError;
use tlc_ir::Module;

/// High-level frontend interface
pub struct Frontend;

impl Frontend {
    /// Read a program serialized as JSON
    pub fn parse_json(source: &str) -> Result<Program, CompilerError> {
        serde_json::from_str(source).map_err(|e| CompilerError::InvalidInput {
            message: format!("malformed AST: {}", e),
        })
    }

    /// Lower a program into a module named `module_name`
    pub fn lower(program: &Program, module_name: &str) -> Result<Module, CompilerError> {
        CodeGenerator::new(module_name).generate(program)
    }
}
