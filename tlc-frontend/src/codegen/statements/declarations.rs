//! Declaration statement code generation

use super::FunctionGenerator;
use crate::ast::{AstType, Expression};
use crate::codegen::expressions::generate_expression;
use crate::codegen::types::check_assignable;
use crate::codegen::VarInfo;
use log::trace;
use tlc_common::CompilerError;
use tlc_ir::Operand;

/// `var name : ty [:= init]`. A variable without initializer starts at zero.
/// Redeclaring a name binds it to a fresh cell.
pub fn generate_var_decl(
    gen: &mut FunctionGenerator,
    name: &str,
    ty: &AstType,
    init: Option<&Expression>,
) -> Result<(), CompilerError> {
    if ty.is_record() {
        return Err(gen
            .unsupported(format!("variable '{}' of record type declared as a scalar", name))
            .into());
    }
    if ty.is_void() {
        return Err(gen.unsupported(format!("variable '{}' of type void", name)).into());
    }
    let ir_type = gen.ir_type(ty)?;

    let value = match init {
        Some(expr) => {
            let value = generate_expression(gen, expr, Some(ty))?;
            check_assignable(ty, &value.ty, &gen.location())?;
            value.operand
        }
        None => Operand::Imm(0),
    };

    let slot = gen.builder.create_alloca(ir_type.clone())?;
    gen.builder.create_store(ir_type, value, slot.clone())?;
    trace!("{}: '{}' bound to {}", gen.scope.name, name, slot);
    gen.scope.variables.insert(
        name.to_string(),
        VarInfo {
            storage: slot,
            ty: ty.clone(),
        },
    );
    Ok(())
}

/// Local record variable; declared field defaults are stored unless
/// `no_init` is set
pub fn generate_record_decl(
    gen: &mut FunctionGenerator,
    name: &str,
    record_name: &str,
    no_init: bool,
) -> Result<(), CompilerError> {
    let record = gen.record(record_name)?;
    let slot = gen.builder.create_alloca(record.ir_type.clone())?;

    if !no_init {
        for (index, field) in record.fields.iter().enumerate() {
            let Some(default) = &field.default else {
                continue;
            };
            let value = generate_expression(gen, default, Some(&field.ty))?;
            check_assignable(&field.ty, &value.ty, &gen.location())?;
            gen.builder
                .create_struct_store(record.ir_type.clone(), slot.clone(), index as u32, value.operand)?;
        }
    }

    gen.scope.variables.insert(
        name.to_string(),
        VarInfo {
            storage: slot,
            ty: AstType::Struct(record_name.to_string()),
        },
    );
    Ok(())
}
