//! Lowering of transformed IR to x86-64
//!
//! - `module`: preamble, string constants, functions, trailer
//! - `function`: frame setup, operand resolution, block layout
//! - `instruction`: per-opcode instruction selection

mod function;
mod instruction;
mod module;

pub use function::lower_function;
pub use module::lower_module;
