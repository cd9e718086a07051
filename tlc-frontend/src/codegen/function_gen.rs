//! Function code generation

use super::statements;
use super::types::convert_param_type;
use super::{CodegenError, FunctionGenerator, VarInfo};
use crate::ast::{AstType, FunctionDecl};
use log::debug;
use tlc_common::CompilerError;
use tlc_ir::{Function, IrType, Linkage, Operand};

/// Generate IR for a function
pub fn generate_function(gen: &mut FunctionGenerator, func: &FunctionDecl) -> Result<Function, CompilerError> {
    if func.return_type.is_record() {
        return Err(gen.unsupported(format!("returning record '{}' by value", func.return_type)).into());
    }
    let ret_type = gen.ir_type(&func.return_type)?;

    let mut param_types = Vec::with_capacity(func.params.len());
    for param in &func.params {
        param_types.push(convert_param_type(&param.ty, gen.records, &gen.location())?);
    }

    let linkage = if func.local { Linkage::Local } else { Linkage::Global };
    gen.builder
        .create_function(func.name.clone(), linkage, ret_type.clone(), param_types.clone());
    gen.builder.create_block("entry")?;

    // Records arrive by address and are used in place; everything else gets
    // a cell so that every named local is a memory location
    for (i, (param, ir_type)) in func.params.iter().zip(param_types).enumerate() {
        if gen.scope.variables.contains_key(&param.name) {
            return Err(CodegenError::Redefinition {
                name: param.name.clone(),
                location: gen.location(),
            }
            .into());
        }
        let arg = gen.builder.arg(i).ok_or_else(|| CompilerError::internal(format!(
            "function '{}' has no argument {}",
            func.name, i
        )))?;

        let storage = if let Some(record) = param_record_name(&param.ty) {
            gen.scope.record_params.insert(param.name.clone(), record);
            arg
        } else {
            let slot = gen.builder.create_alloca(ir_type.clone())?;
            gen.builder.create_store(ir_type, arg, slot.clone())?;
            slot
        };
        gen.scope.variables.insert(
            param.name.clone(),
            VarInfo {
                storage,
                ty: param.ty.clone(),
            },
        );
    }

    statements::generate_block(gen, &func.body)?;

    // Add implicit return if needed
    if !gen.builder.current_block_terminated() {
        debug!("Function '{}': adding implicit return", func.name);
        if ret_type == IrType::Void {
            gen.builder.create_ret_void()?;
        } else {
            gen.builder.create_ret(ret_type, Operand::Imm(0))?;
        }
    }

    Ok(gen.builder.finish_function()?)
}

fn param_record_name(ty: &AstType) -> Option<String> {
    match ty {
        AstType::Struct(name) => Some(name.clone()),
        _ => None,
    }
}
