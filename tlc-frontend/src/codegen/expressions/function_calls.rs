//! Function call code generation

use super::{generate_operands, FunctionGenerator, TypedOperand};
use crate::ast::{AstType, Expression};
use crate::codegen::types::check_assignable;
use crate::codegen::{CodegenError, Signature};
use tlc_common::CompilerError;
use tlc_ir::Operand;

/// Call in statement position; any result is discarded
pub fn generate_call_statement(gen: &mut FunctionGenerator, name: &str, args: &[Expression]) -> Result<(), CompilerError> {
    let signature = gen.signature(name)?;
    let args = generate_arguments(gen, name, signature, args)?;
    gen.builder.create_void_call(name, args)?;
    Ok(())
}

/// Call whose result is used. The result is parked in a stack cell right
/// away since the next store or call reuses its register.
pub fn generate_call_expression(
    gen: &mut FunctionGenerator,
    name: &str,
    args: &[Expression],
) -> Result<TypedOperand, CompilerError> {
    let signature = gen.signature(name)?;
    if signature.return_type.is_void() {
        return Err(gen
            .unsupported(format!("using the result of void function '{}'", name))
            .into());
    }
    let args = generate_arguments(gen, name, signature, args)?;

    let ret_type = gen.ir_type(&signature.return_type)?;
    let result = gen.builder.create_call(ret_type.clone(), name, args)?;
    let slot = gen.builder.create_alloca(ret_type.clone())?;
    gen.builder.create_store(ret_type.clone(), result, slot.clone())?;
    let value = gen.builder.create_load(ret_type, slot)?;
    Ok(TypedOperand::new(value, signature.return_type.clone()))
}

fn generate_arguments(
    gen: &mut FunctionGenerator,
    name: &str,
    signature: &Signature,
    args: &[Expression],
) -> Result<Vec<Operand>, CompilerError> {
    let expected = signature.params.len();
    let arity_ok = if signature.variadic {
        args.len() >= expected
    } else {
        args.len() == expected
    };
    if !arity_ok {
        return Err(CodegenError::ArgumentCount {
            name: name.to_string(),
            expected,
            found: args.len(),
            location: gen.location(),
        }
        .into());
    }

    let exprs: Vec<&Expression> = args.iter().collect();
    let types: Vec<Option<AstType>> = (0..args.len()).map(|i| signature.params.get(i).cloned()).collect();
    let values = generate_operands(gen, &exprs, &types)?;

    for (value, param) in values.iter().zip(&signature.params) {
        if param.is_record() || value.ty.is_record() {
            if param != &value.ty {
                return Err(CodegenError::TypeMismatch {
                    expected: param.clone(),
                    found: value.ty.clone(),
                    location: gen.location(),
                }
                .into());
            }
        } else {
            check_assignable(param, &value.ty, &gen.location())?;
        }
    }

    Ok(values.into_iter().map(|v| v.operand).collect())
}
