//! Identifier and indexed-load code generation

use super::{generate_expression, FunctionGenerator, TypedOperand};
use crate::ast::{AstType, Expression};
use crate::codegen::CodegenError;
use tlc_common::CompilerError;
use tlc_ir::Operand;

/// Load a scalar variable. A record variable evaluates to its address so
/// that it can be handed to a callee.
pub fn generate_identifier(gen: &mut FunctionGenerator, name: &str) -> Result<TypedOperand, CompilerError> {
    let var = gen.lookup(name)?;
    if var.ty.is_record() {
        return Ok(TypedOperand::new(var.storage, var.ty));
    }
    let ir_type = gen.ir_type(&var.ty)?;
    let value = gen.builder.create_load(ir_type, var.storage)?;
    Ok(TypedOperand::new(value, var.ty))
}

/// `name[index]`: element `index` of the array `name` points to
pub fn generate_index(gen: &mut FunctionGenerator, name: &str, index: &Expression) -> Result<TypedOperand, CompilerError> {
    let var = gen.lookup(name)?;
    let element = element_type(gen, &var.ty)?;

    let index = generate_expression(gen, index, Some(&AstType::I32))?;
    let address = element_address(gen, &var.ty, var.storage, index.operand)?;

    let ir_type = gen.ir_type(&element)?;
    let value = gen.builder.create_load(ir_type, address)?;
    Ok(TypedOperand::new(value, element))
}

/// Load the pointer held in `storage` and offset it by `index` elements
pub fn element_address(
    gen: &mut FunctionGenerator,
    pointer_ty: &AstType,
    storage: Operand,
    index: Operand,
) -> Result<Operand, CompilerError> {
    let ptr_ir = gen.ir_type(pointer_ty)?;
    let base = gen.builder.create_load(ptr_ir.clone(), storage)?;
    Ok(gen.builder.create_gep(ptr_ir, base, index)?)
}

/// Type reached by indexing a value of type `ty`
pub fn element_type(gen: &FunctionGenerator, ty: &AstType) -> Result<AstType, CodegenError> {
    match ty.element() {
        Some(element) if !element.is_void() && !element.is_record() => Ok(element),
        Some(element) => Err(gen.unsupported(format!("indexing a pointer to {}", element))),
        None => Err(CodegenError::TypeMismatch {
            expected: AstType::ptr_to(AstType::Void),
            found: ty.clone(),
            location: gen.location(),
        }),
    }
}
