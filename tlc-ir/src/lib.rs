//! Low-level intermediate representation
//!
//! The IR is "mostly single-assignment": computed values live in virtual
//! registers written exactly once, while locals are mutable stack cells
//! created by `alloca` and accessed through `load`/`store`.
//!
//! ## Architecture
//!
//! - `types` - integer, pointer and record types
//! - `operand` - virtual and physical operands
//! - `ops` - the closed opcode set and constant evaluation
//! - `instruction`, `block`, `function`, `module` - the entity graph
//! - `builder` - the only way lowering code creates instructions
//! - `transform` - rewrites virtual registers into physical operands

pub use self::block::Block;
pub use self::builder::IrBuilder;
pub use self::error::IrError;
pub use self::function::{Argument, Function, StackSlot};
pub use self::instruction::{CallInfo, Instruction};
pub use self::module::{Linkage, Module, StringConst};
pub use self::operand::Operand;
pub use self::ops::Opcode;
pub use self::transform::{transform_function, transform_module};
pub use self::types::IrType;

mod block;
mod builder;
mod error;
mod function;
mod instruction;
mod module;
mod operand;
mod ops;
pub mod transform;
mod types;
