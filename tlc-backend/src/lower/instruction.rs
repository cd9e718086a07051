//! Instruction Lowering - one IR instruction to x86-64
//!
//! Values are computed in `r11` (`SCRATCH`); `r10` (`ADDRESS_SCRATCH`)
//! holds the second operand or a pointer being dereferenced.

use super::function::{normalize, scalar_width, zero_extend, FunctionContext};
use crate::error::EmitError;
use log::trace;
use tlc_codegen::{AsmInst, AsmOperand, CallingConvention, Cond, Gpr, Width};
use tlc_ir::{Instruction, IrType, Opcode};

const SCRATCH: Gpr = CallingConvention::SCRATCH;
const OPERAND: Gpr = CallingConvention::ADDRESS_SCRATCH;

/// Lower `inst` into `out`. `falls_into_epilogue` is set for the final
/// instruction of the function, which needs no jump to reach the epilogue.
pub fn lower_instruction(
    ctx: &FunctionContext,
    inst: &Instruction,
    falls_into_epilogue: bool,
    out: &mut Vec<AsmInst>,
) -> Result<(), EmitError> {
    let start = out.len();
    match inst.opcode {
        Opcode::Alloca => {}
        Opcode::Load => lower_load(ctx, inst, out)?,
        Opcode::Store => lower_store(ctx, inst, out)?,
        Opcode::StructLoad => lower_struct_load(ctx, inst, out)?,
        Opcode::StructStore => lower_struct_store(ctx, inst, out)?,
        Opcode::Gep => lower_gep(ctx, inst, out)?,
        Opcode::Add
        | Opcode::Sub
        | Opcode::SMul
        | Opcode::UMul
        | Opcode::And
        | Opcode::Or
        | Opcode::Xor => lower_arithmetic(ctx, inst, out)?,
        Opcode::SDiv | Opcode::SRem | Opcode::UDiv | Opcode::URem => lower_division(ctx, inst, out)?,
        Opcode::Neg | Opcode::Not => lower_unary(ctx, inst, out)?,
        Opcode::Beq
        | Opcode::Bne
        | Opcode::Bgt
        | Opcode::Bge
        | Opcode::Blt
        | Opcode::Ble
        | Opcode::Bugt
        | Opcode::Buge
        | Opcode::Bult
        | Opcode::Bule => lower_compare_branch(ctx, inst, out)?,
        Opcode::Br => {
            let target = ctx.operand(inst, 0)?;
            out.push(AsmInst::Jmp(ctx.label(inst, target)?));
        }
        Opcode::Call => lower_call(ctx, inst, out)?,
        Opcode::Ret => {
            lower_ret(ctx, inst, out)?;
            if !falls_into_epilogue {
                out.push(AsmInst::Jmp(ctx.epilogue()));
            }
        }
        Opcode::RetVoid => {
            if !falls_into_epilogue {
                out.push(AsmInst::Jmp(ctx.epilogue()));
            }
        }
    }
    for asm in &out[start..] {
        trace!("      {}", asm);
    }
    Ok(())
}

fn width_of(ctx: &FunctionContext, inst: &Instruction, ty: &IrType) -> Result<Width, EmitError> {
    scalar_width(ty).ok_or_else(|| ctx.unsupported(inst, ty))
}

/// Field type and byte offset selected by the index operand of a record
/// access
fn field_of<'i>(ctx: &FunctionContext, inst: &'i Instruction) -> Result<(&'i IrType, u32), EmitError> {
    let index = ctx.operand(inst, 1)?;
    let position = index
        .as_imm()
        .and_then(|i| usize::try_from(i).ok())
        .ok_or_else(|| ctx.unexpected(inst, index))?;
    match (inst.ty.field(position), inst.ty.field_offset(position)) {
        (Some(field), Some(offset)) => Ok((field, offset)),
        _ => Err(ctx.unexpected(inst, index)),
    }
}

fn lower_load(ctx: &FunctionContext, inst: &Instruction, out: &mut Vec<AsmInst>) -> Result<(), EmitError> {
    let width = width_of(ctx, inst, &inst.ty)?;
    let src = ctx.address(inst, ctx.operand(inst, 0)?, 0, width, out)?;
    out.push(AsmInst::Movsx(AsmOperand::reg(SCRATCH), src));
    ctx.write_result(inst, SCRATCH, out)
}

fn lower_store(ctx: &FunctionContext, inst: &Instruction, out: &mut Vec<AsmInst>) -> Result<(), EmitError> {
    let width = width_of(ctx, inst, &inst.ty)?;
    let value = ctx.source(inst, ctx.operand(inst, 0)?, width, SCRATCH, false, out)?;
    let dest = ctx.address(inst, ctx.operand(inst, 1)?, 0, width, out)?;
    out.push(AsmInst::Mov(dest, value));
    Ok(())
}

fn lower_struct_load(ctx: &FunctionContext, inst: &Instruction, out: &mut Vec<AsmInst>) -> Result<(), EmitError> {
    let (field, offset) = field_of(ctx, inst)?;
    let width = width_of(ctx, inst, field)?;
    let src = ctx.address(inst, ctx.operand(inst, 0)?, offset, width, out)?;
    out.push(AsmInst::Movsx(AsmOperand::reg(SCRATCH), src));
    ctx.write_result(inst, SCRATCH, out)
}

fn lower_struct_store(ctx: &FunctionContext, inst: &Instruction, out: &mut Vec<AsmInst>) -> Result<(), EmitError> {
    let (field, offset) = field_of(ctx, inst)?;
    let width = width_of(ctx, inst, field)?;
    let value = ctx.source(inst, ctx.operand(inst, 2)?, width, SCRATCH, false, out)?;
    let dest = ctx.address(inst, ctx.operand(inst, 0)?, offset, width, out)?;
    out.push(AsmInst::Mov(dest, value));
    Ok(())
}

/// `base + index * sizeof(pointee)`
fn lower_gep(ctx: &FunctionContext, inst: &Instruction, out: &mut Vec<AsmInst>) -> Result<(), EmitError> {
    let pointee = inst.ty.pointee().ok_or_else(|| ctx.unsupported(inst, &inst.ty))?;
    let scale = i64::from(pointee.size_in_bytes().max(1));
    ctx.load_value(inst, ctx.operand(inst, 0)?, SCRATCH, out)?;

    let index = ctx.operand(inst, 1)?;
    let constant = index
        .as_imm()
        .and_then(|i| i.checked_mul(scale))
        .filter(|disp| i32::try_from(*disp).is_ok());
    match constant {
        Some(0) => {}
        Some(disp) => out.push(AsmInst::Add(AsmOperand::reg(SCRATCH), AsmOperand::Imm(disp))),
        None => {
            ctx.load_value(inst, index, OPERAND, out)?;
            if scale != 1 {
                out.push(AsmInst::Imul(AsmOperand::reg(OPERAND), AsmOperand::Imm(scale)));
            }
            out.push(AsmInst::Add(AsmOperand::reg(SCRATCH), AsmOperand::reg(OPERAND)));
        }
    }
    ctx.write_result(inst, SCRATCH, out)
}

fn lower_arithmetic(ctx: &FunctionContext, inst: &Instruction, out: &mut Vec<AsmInst>) -> Result<(), EmitError> {
    let width = width_of(ctx, inst, &inst.ty)?;
    ctx.load_value(inst, ctx.operand(inst, 0)?, SCRATCH, out)?;
    let rhs = ctx.source(inst, ctx.operand(inst, 1)?, Width::Qword, OPERAND, true, out)?;
    let dst = AsmOperand::reg(SCRATCH);
    out.push(match inst.opcode {
        Opcode::Add => AsmInst::Add(dst, rhs),
        Opcode::Sub => AsmInst::Sub(dst, rhs),
        Opcode::SMul | Opcode::UMul => AsmInst::Imul(dst, rhs),
        Opcode::And => AsmInst::And(dst, rhs),
        Opcode::Or => AsmInst::Or(dst, rhs),
        _ => AsmInst::Xor(dst, rhs),
    });
    normalize(SCRATCH, width, out);
    ctx.write_result(inst, SCRATCH, out)
}

/// `cqo; idiv` for the signed forms, zero-extended operands and `div` for
/// the unsigned ones. The quotient is left in rax, the remainder in rdx.
fn lower_division(ctx: &FunctionContext, inst: &Instruction, out: &mut Vec<AsmInst>) -> Result<(), EmitError> {
    let width = width_of(ctx, inst, &inst.ty)?;
    ctx.load_value(inst, ctx.operand(inst, 0)?, SCRATCH, out)?;
    ctx.load_value(inst, ctx.operand(inst, 1)?, OPERAND, out)?;

    let signed = matches!(inst.opcode, Opcode::SDiv | Opcode::SRem);
    if !signed {
        zero_extend(SCRATCH, width, out);
        zero_extend(OPERAND, width, out);
    }
    out.push(AsmInst::Mov(AsmOperand::reg(Gpr::Rax), AsmOperand::reg(SCRATCH)));
    if signed {
        out.push(AsmInst::Cqo);
        out.push(AsmInst::Idiv(AsmOperand::reg(OPERAND)));
    } else {
        let edx = AsmOperand::Reg(Gpr::Rdx, Width::Dword);
        out.push(AsmInst::Xor(edx.clone(), edx));
        out.push(AsmInst::Div(AsmOperand::reg(OPERAND)));
    }

    let result = match inst.opcode {
        Opcode::SDiv | Opcode::UDiv => Gpr::Rax,
        _ => Gpr::Rdx,
    };
    out.push(AsmInst::Mov(AsmOperand::reg(SCRATCH), AsmOperand::reg(result)));
    normalize(SCRATCH, width, out);
    ctx.write_result(inst, SCRATCH, out)
}

fn lower_unary(ctx: &FunctionContext, inst: &Instruction, out: &mut Vec<AsmInst>) -> Result<(), EmitError> {
    let width = width_of(ctx, inst, &inst.ty)?;
    ctx.load_value(inst, ctx.operand(inst, 0)?, SCRATCH, out)?;
    out.push(if inst.opcode == Opcode::Neg {
        AsmInst::Neg(AsmOperand::reg(SCRATCH))
    } else {
        AsmInst::Not(AsmOperand::reg(SCRATCH))
    });
    normalize(SCRATCH, width, out);
    ctx.write_result(inst, SCRATCH, out)
}

/// Signed orderings compare the sign-extended registers directly; unsigned
/// ones compare both sides zero-extended from the operand width
fn lower_compare_branch(ctx: &FunctionContext, inst: &Instruction, out: &mut Vec<AsmInst>) -> Result<(), EmitError> {
    let cond = match inst.opcode {
        Opcode::Beq => Cond::E,
        Opcode::Bne => Cond::Ne,
        Opcode::Bgt => Cond::G,
        Opcode::Bge => Cond::Ge,
        Opcode::Blt => Cond::L,
        Opcode::Ble => Cond::Le,
        Opcode::Bugt => Cond::A,
        Opcode::Buge => Cond::Ae,
        Opcode::Bult => Cond::B,
        _ => Cond::Be,
    };
    let target = ctx.label(inst, ctx.operand(inst, 2)?)?;
    ctx.load_value(inst, ctx.operand(inst, 0)?, SCRATCH, out)?;
    let rhs = if matches!(cond, Cond::A | Cond::Ae | Cond::B | Cond::Be) {
        let width = width_of(ctx, inst, &inst.ty)?;
        ctx.load_value(inst, ctx.operand(inst, 1)?, OPERAND, out)?;
        zero_extend(SCRATCH, width, out);
        zero_extend(OPERAND, width, out);
        AsmOperand::reg(OPERAND)
    } else {
        ctx.source(inst, ctx.operand(inst, 1)?, Width::Qword, OPERAND, true, out)?
    };
    out.push(AsmInst::Cmp(AsmOperand::reg(SCRATCH), rhs));
    out.push(AsmInst::Jcc(cond, target));
    Ok(())
}

fn lower_ret(ctx: &FunctionContext, inst: &Instruction, out: &mut Vec<AsmInst>) -> Result<(), EmitError> {
    let width = width_of(ctx, inst, &inst.ty)?;
    let value = ctx.source(inst, ctx.operand(inst, 0)?, width, SCRATCH, true, out)?;
    out.push(AsmInst::Mov(AsmOperand::Reg(CallingConvention::RETURN, width), value));
    Ok(())
}

/// Arguments go to rdi..r9, the rest are pushed right to left with the
/// stack kept 16-byte aligned at the call
fn lower_call(ctx: &FunctionContext, inst: &Instruction, out: &mut Vec<AsmInst>) -> Result<(), EmitError> {
    let call = inst.call.as_ref().ok_or_else(|| EmitError::MissingOperand {
        function: ctx.function.name.clone(),
        opcode: inst.opcode.to_string(),
        index: 0,
    })?;
    let callee = ctx
        .module
        .get_function(&call.callee)
        .ok_or_else(|| EmitError::UnknownCallee {
            function: ctx.function.name.clone(),
            callee: call.callee.clone(),
        })?;

    let register_count = CallingConvention::ARG_REGS.len();
    let stack_args = call.args.len().saturating_sub(register_count);
    let padding = if stack_args % 2 == 1 { 8 } else { 0 };
    let rsp = AsmOperand::reg(Gpr::Rsp);

    if padding > 0 {
        out.push(AsmInst::Sub(rsp.clone(), AsmOperand::Imm(padding)));
    }
    for arg in call.args.iter().skip(register_count).rev() {
        ctx.load_value(inst, arg, SCRATCH, out)?;
        out.push(AsmInst::Push(AsmOperand::reg(SCRATCH)));
    }
    for (arg, &reg) in call.args.iter().zip(CallingConvention::ARG_REGS.iter()) {
        ctx.load_value(inst, arg, reg, out)?;
    }
    if callee.variadic {
        let eax = AsmOperand::Reg(Gpr::Rax, Width::Dword);
        out.push(AsmInst::Xor(eax.clone(), eax));
    }
    out.push(AsmInst::Call(call.callee.clone()));

    let cleanup = 8 * stack_args as i64 + padding;
    if cleanup > 0 {
        out.push(AsmInst::Add(rsp, AsmOperand::Imm(cleanup)));
    }

    if inst.dest.is_some() {
        let width = width_of(ctx, inst, &inst.ty)?;
        normalize(CallingConvention::RETURN, width, out);
        ctx.write_result(inst, CallingConvention::RETURN, out)?;
    }
    Ok(())
}
