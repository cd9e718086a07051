//! Binary operation code generation

use super::{conditions, generate_operands, operand_type, FunctionGenerator, TypedOperand};
use crate::ast::{AstType, BinaryOp, Expression};
use crate::codegen::CodegenError;
use tlc_common::CompilerError;
use tlc_ir::{IrType, Opcode, Operand};

pub fn generate_binary_operation(
    gen: &mut FunctionGenerator,
    op: BinaryOp,
    lhs: &Expression,
    rhs: &Expression,
    expected: Option<&AstType>,
) -> Result<TypedOperand, CompilerError> {
    let ty = operand_type(gen, lhs, rhs, expected)?;
    if !ty.is_integer() {
        return Err(CodegenError::TypeMismatch {
            expected: AstType::I32,
            found: ty,
            location: gen.location(),
        }
        .into());
    }

    let types = [Some(ty.clone()), Some(ty.clone())];
    let values = generate_operands(gen, &[lhs, rhs], &types)?;
    for value in &values {
        if !value.ty.is_integer() {
            return Err(CodegenError::TypeMismatch {
                expected: ty,
                found: value.ty.clone(),
                location: gen.location(),
            }
            .into());
        }
    }
    let [left, right]: [TypedOperand; 2] = values
        .try_into()
        .map_err(|_| CompilerError::internal("binary operation lost an operand"))?;

    let opcode = arithmetic_opcode(op, ty.is_unsigned())
        .ok_or_else(|| gen.unsupported(format!("binary op: {op:?}")))?;
    let ir_type = gen.ir_type(&ty)?;
    let result = gen
        .builder
        .create_binary_op(opcode, ir_type, left.operand, right.operand)?;
    Ok(TypedOperand::new(result, ty))
}

fn arithmetic_opcode(op: BinaryOp, unsigned: bool) -> Option<Opcode> {
    Some(match op {
        BinaryOp::Add => Opcode::Add,
        BinaryOp::Sub => Opcode::Sub,
        BinaryOp::Mul if unsigned => Opcode::UMul,
        BinaryOp::Mul => Opcode::SMul,
        BinaryOp::Div if unsigned => Opcode::UDiv,
        BinaryOp::Div => Opcode::SDiv,
        BinaryOp::Rem if unsigned => Opcode::URem,
        BinaryOp::Rem => Opcode::SRem,
        BinaryOp::BitAnd => Opcode::And,
        BinaryOp::BitOr => Opcode::Or,
        BinaryOp::BitXor => Opcode::Xor,
        _ => return None,
    })
}

/// A comparison or `and`/`or` used as a value: branch on it and store `1` or
/// `0` into an `i32` cell on the two paths, then load the cell
pub fn generate_materialized_condition(
    gen: &mut FunctionGenerator,
    expr: &Expression,
) -> Result<TypedOperand, CompilerError> {
    let slot = gen.builder.create_alloca(IrType::I32)?;

    let n = gen.scope.next_block_id();
    let current = gen.current_block()?;
    let set_true = gen.block_after(current, format!("set_true{n}"))?;
    let set_false = gen.block_after(set_true, format!("set_false{n}"))?;
    let set_end = gen.block_after(set_false, format!("set_end{n}"))?;

    conditions::generate_condition(gen, expr, set_true, set_false)?;

    gen.builder.set_insert_point(set_true)?;
    gen.builder.create_store(IrType::I32, Operand::Imm(1), slot.clone())?;
    gen.builder.create_br(set_end)?;

    gen.builder.set_insert_point(set_false)?;
    gen.builder.create_store(IrType::I32, Operand::Imm(0), slot.clone())?;
    gen.builder.create_br(set_end)?;

    gen.builder.set_insert_point(set_end)?;
    let value = gen.builder.create_load(IrType::I32, slot)?;
    Ok(TypedOperand::new(value, AstType::I32))
}
