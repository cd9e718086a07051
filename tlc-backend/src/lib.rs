//! Tiny Lang Compiler - Backend
//!
//! This crate lowers a transformed IR module (physical operands only) to
//! x86-64 assembly text for the GNU assembler, following the System V
//! AMD64 calling convention.

pub mod error;
mod lower;
mod naming;
mod regs;

pub use error::EmitError;
pub use lower::{lower_function, lower_module};
pub use tlc_codegen::AsmSyntax;

use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tlc_codegen::emit_instructions;
use tlc_ir::Module;

/// Options for emission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitOptions {
    pub syntax: AsmSyntax,
    /// Precede the code of every IR instruction with the instruction as a comment
    pub comments: bool,
}

/// Emit a transformed module as assembly text
pub fn emit_module(module: &Module, options: &EmitOptions) -> Result<String, EmitError> {
    let insts = lower_module(module, options)?;
    Ok(emit_instructions(&insts, options.syntax))
}

/// `<module name>.s`
pub fn default_output_path(module: &Module) -> PathBuf {
    PathBuf::from(format!("{}.s", module.name))
}

/// Emit a module to `path`, or to its default path, returning the path written
pub fn write_assembly(module: &Module, options: &EmitOptions, path: Option<&Path>) -> Result<PathBuf, EmitError> {
    let path = path.map_or_else(|| default_output_path(module), Path::to_path_buf);
    let text = emit_module(module, options)?;
    std::fs::write(&path, text).map_err(|e| EmitError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    info!("Wrote assembly for module '{}' to {}", module.name, path.display());
    Ok(path)
}
