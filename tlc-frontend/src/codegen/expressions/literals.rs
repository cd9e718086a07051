//! Literal expression code generation

use super::{FunctionGenerator, TypedOperand};
use crate::ast::AstType;
use tlc_common::CompilerError;
use tlc_ir::Operand;

/// Integer literals take the type the context expects and are wrapped to its
/// width. Without one they are `i32`, or `i64` when the value needs it.
pub fn generate_int_literal(
    gen: &mut FunctionGenerator,
    value: i64,
    expected: Option<&AstType>,
) -> Result<TypedOperand, CompilerError> {
    let ty = match expected.filter(|t| t.is_integer()) {
        Some(ty) => ty.clone(),
        None if i32::try_from(value).is_err() => AstType::I64,
        None => AstType::I32,
    };
    let ir_type = gen.ir_type(&ty)?;
    Ok(TypedOperand::new(Operand::Imm(ir_type.wrap(value)), ty))
}

/// String literals are interned in the module's constant pool
pub fn generate_string_literal(gen: &mut FunctionGenerator, value: &str) -> Result<TypedOperand, CompilerError> {
    let operand = gen.module.add_string(value);
    Ok(TypedOperand::new(operand, AstType::String))
}
