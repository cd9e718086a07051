//! Jump statement code generation (break, continue, return)

use super::FunctionGenerator;
use crate::ast::Expression;
use crate::codegen::expressions::generate_expression;
use crate::codegen::types::check_assignable;
use crate::codegen::CodegenError;
use tlc_common::CompilerError;

pub fn generate_break(gen: &mut FunctionGenerator) -> Result<(), CompilerError> {
    if let Some(&target) = gen.scope.break_targets.last() {
        gen.builder.create_br(target)?;
        Ok(())
    } else {
        Err(CodegenError::OutsideLoop {
            keyword: "break",
            location: gen.location(),
        }
        .into())
    }
}

pub fn generate_continue(gen: &mut FunctionGenerator) -> Result<(), CompilerError> {
    if let Some(&target) = gen.scope.continue_targets.last() {
        gen.builder.create_br(target)?;
        Ok(())
    } else {
        Err(CodegenError::OutsideLoop {
            keyword: "continue",
            location: gen.location(),
        }
        .into())
    }
}

pub fn generate_return(gen: &mut FunctionGenerator, value: Option<&Expression>) -> Result<(), CompilerError> {
    let return_type = gen.scope.return_type.clone();

    match (value, return_type.is_void()) {
        (None, true) => {
            gen.builder.create_ret_void()?;
        }
        (Some(_), true) => {
            return Err(CodegenError::InvalidReturn {
                message: format!("function '{}' returns void", gen.scope.name),
                location: gen.location(),
            }
            .into());
        }
        (None, false) => {
            return Err(CodegenError::InvalidReturn {
                message: format!("function '{}' must return a {}", gen.scope.name, return_type),
                location: gen.location(),
            }
            .into());
        }
        (Some(expr), false) => {
            let value = generate_expression(gen, expr, Some(&return_type))?;
            if value.ty.is_record() {
                return Err(gen.unsupported("returning a record by value").into());
            }
            check_assignable(&return_type, &value.ty, &gen.location())?;
            let ir_type = gen.ir_type(&return_type)?;
            gen.builder.create_ret(ir_type, value.operand)?;
        }
    }
    Ok(())
}
