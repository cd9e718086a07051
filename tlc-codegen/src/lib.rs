//! Tiny Lang Compiler - x86-64 assembly model
//!
//! This crate describes the target side of code generation:
//!
//! - `asm`: registers, operands and instructions, rendered in Intel or
//!   AT&T syntax
//! - `abi`: System V AMD64 register roles and stack frame layout
//! - `emit`: turning instruction sequences into assembler text

pub mod abi;
pub mod asm;
pub mod emit;

pub use abi::{AbiError, CallingConvention, Frame};
pub use asm::{AsmInst, AsmOperand, AsmSyntax, Cond, Gpr, Width};
pub use emit::emit_instructions;
