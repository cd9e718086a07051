//! Assignment statement code generation

use super::FunctionGenerator;
use crate::ast::{AstType, Expression};
use crate::codegen::expressions::{element_address, element_type, generate_expression, generate_operands};
use crate::codegen::types::check_assignable;
use tlc_common::CompilerError;

/// `name := value`
pub fn generate_assign(gen: &mut FunctionGenerator, name: &str, value: &Expression) -> Result<(), CompilerError> {
    let var = gen.lookup(name)?;
    if var.ty.is_record() {
        return Err(gen
            .unsupported(format!("assigning record '{}' by value", name))
            .into());
    }
    let value = generate_expression(gen, value, Some(&var.ty))?;
    check_assignable(&var.ty, &value.ty, &gen.location())?;

    let ir_type = gen.ir_type(&var.ty)?;
    gen.builder.create_store(ir_type, value.operand, var.storage)?;
    Ok(())
}

/// `name[index] := value` through the pointer held in `name`
pub fn generate_index_assign(
    gen: &mut FunctionGenerator,
    name: &str,
    index: &Expression,
    value: &Expression,
) -> Result<(), CompilerError> {
    let var = gen.lookup(name)?;
    let element = element_type(gen, &var.ty)?;

    let types = [Some(AstType::I32), Some(element.clone())];
    let mut values = generate_operands(gen, &[index, value], &types)?.into_iter();
    let (Some(index), Some(value)) = (values.next(), values.next()) else {
        return Err(CompilerError::internal("indexed assignment lost an operand"));
    };
    check_assignable(&element, &value.ty, &gen.location())?;

    let address = element_address(gen, &var.ty, var.storage, index.operand)?;
    let ir_type = gen.ir_type(&element)?;
    gen.builder.create_store(ir_type, value.operand, address)?;
    Ok(())
}

/// `name.field := value`
pub fn generate_field_assign(
    gen: &mut FunctionGenerator,
    name: &str,
    field: &str,
    value: &Expression,
) -> Result<(), CompilerError> {
    let var = gen.lookup(name)?;
    let (record, index) = gen.field_of(&var, field)?;
    let field_ty = &record.fields[index].ty;

    let value = generate_expression(gen, value, Some(field_ty))?;
    check_assignable(field_ty, &value.ty, &gen.location())?;
    gen.builder
        .create_struct_store(record.ir_type.clone(), var.storage, index as u32, value.operand)?;
    Ok(())
}
