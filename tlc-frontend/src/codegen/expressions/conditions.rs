//! Branching on boolean expressions
//!
//! Conditions never produce a value: comparisons become fused
//! compare-and-branch instructions and `and`/`or` short-circuit through an
//! extra block holding the right-hand side.

use super::{generate_expression, generate_operands, operand_type, FunctionGenerator};
use crate::ast::{BinaryOp, Expression};
use tlc_common::{BlockId, CompilerError};
use tlc_ir::{Opcode, Operand};

/// Emit code in the current block that transfers control to `on_true` or
/// `on_false` depending on `expr`. The current block is terminated.
pub fn generate_condition(
    gen: &mut FunctionGenerator,
    expr: &Expression,
    on_true: BlockId,
    on_false: BlockId,
) -> Result<(), CompilerError> {
    match expr {
        Expression::Binary { op: BinaryOp::And, lhs, rhs } => {
            let n = gen.scope.next_block_id();
            let current = gen.current_block()?;
            let rhs_block = gen.block_after(current, format!("and_rhs{n}"))?;
            generate_condition(gen, lhs, rhs_block, on_false)?;
            gen.builder.set_insert_point(rhs_block)?;
            generate_condition(gen, rhs, on_true, on_false)
        }

        Expression::Binary { op: BinaryOp::Or, lhs, rhs } => {
            let n = gen.scope.next_block_id();
            let current = gen.current_block()?;
            let rhs_block = gen.block_after(current, format!("or_rhs{n}"))?;
            generate_condition(gen, lhs, on_true, rhs_block)?;
            gen.builder.set_insert_point(rhs_block)?;
            generate_condition(gen, rhs, on_true, on_false)
        }

        Expression::Binary { op, lhs, rhs } if op.is_comparison() => {
            generate_comparison(gen, *op, lhs, rhs, on_true, on_false)
        }

        _ => {
            let value = generate_expression(gen, expr, None)?;
            if let Some(v) = value.operand.as_imm() {
                let target = if v != 0 { on_true } else { on_false };
                gen.builder.create_br(target)?;
                return Ok(());
            }
            let ir_type = gen.ir_type(&value.ty)?;
            gen.builder.create_bne(ir_type, value.operand, Operand::Imm(0), on_true)?;
            gen.builder.create_br(on_false)?;
            Ok(())
        }
    }
}

fn generate_comparison(
    gen: &mut FunctionGenerator,
    op: BinaryOp,
    lhs: &Expression,
    rhs: &Expression,
    on_true: BlockId,
    on_false: BlockId,
) -> Result<(), CompilerError> {
    let ty = operand_type(gen, lhs, rhs, None)?;
    let types = [Some(ty.clone()), Some(ty.clone())];
    let mut values = generate_operands(gen, &[lhs, rhs], &types)?.into_iter();
    let (Some(left), Some(right)) = (values.next(), values.next()) else {
        return Err(CompilerError::internal("comparison lost an operand"));
    };

    let opcode = branch_opcode(op, ty.is_unsigned())
        .ok_or_else(|| gen.unsupported(format!("comparison: {op:?}")))?;
    let ir_type = gen.ir_type(&ty)?;
    let folded = gen
        .builder
        .create_compare_branch(opcode, ir_type, left.operand, right.operand, on_true)?;

    let fallthrough = match folded.and_then(|v| v.as_imm()) {
        Some(taken) if taken != 0 => on_true,
        _ => on_false,
    };
    gen.builder.create_br(fallthrough)?;
    Ok(())
}

fn branch_opcode(op: BinaryOp, unsigned: bool) -> Option<Opcode> {
    Some(match op {
        BinaryOp::Eq => Opcode::Beq,
        BinaryOp::Ne => Opcode::Bne,
        BinaryOp::Gt if unsigned => Opcode::Bugt,
        BinaryOp::Ge if unsigned => Opcode::Buge,
        BinaryOp::Lt if unsigned => Opcode::Bult,
        BinaryOp::Le if unsigned => Opcode::Bule,
        BinaryOp::Gt => Opcode::Bgt,
        BinaryOp::Ge => Opcode::Bge,
        BinaryOp::Lt => Opcode::Blt,
        BinaryOp::Le => Opcode::Ble,
        _ => return None,
    })
}
