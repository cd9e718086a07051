//! System V AMD64 ABI
//!
//! Register roles and the stack frame layout used by generated functions.
//!
//! Frame layout, growing down from `rbp`:
//!
//! ```text
//! [rbp+16+8k]  stack-passed argument k+6 (caller's frame)
//! [rbp+8]      return address
//! [rbp]        saved rbp
//!              locals (the function's stack slots)
//!              homes for register arguments 0..5
//!              saved callee-saved registers
//!              spill slots for register values that did not get a register
//! [rsp]        16-byte aligned
//! ```

use crate::asm::{AsmInst, AsmOperand, Gpr, Width};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error("Stack frame too large: {0} bytes")]
    FrameTooLarge(u64),

    #[error("Register {0} is not callee-saved")]
    NotCalleeSaved(Gpr),

    #[error("Spill slot {index} out of range (frame has {count})")]
    SpillOutOfRange { index: u32, count: u32 },
}

/// Register usage:
/// - rdi, rsi, rdx, rcx, r8, r9: integer arguments, homed in the prologue
/// - rbx, r12, r13: hardware-register values
/// - r14, r15: pointer-register values
/// - rax: return value, `div` dividend
/// - rdx: `div` remainder
/// - r10, r11: scratch, never live across an instruction
pub struct CallingConvention;

impl CallingConvention {
    pub const ARG_REGS: [Gpr; 6] = [Gpr::Rdi, Gpr::Rsi, Gpr::Rdx, Gpr::Rcx, Gpr::R8, Gpr::R9];
    pub const HREG_REGS: [Gpr; 3] = [Gpr::Rbx, Gpr::R12, Gpr::R13];
    pub const PREG_REGS: [Gpr; 2] = [Gpr::R14, Gpr::R15];
    pub const CALLEE_SAVED: [Gpr; 5] = [Gpr::Rbx, Gpr::R12, Gpr::R13, Gpr::R14, Gpr::R15];
    pub const RETURN: Gpr = Gpr::Rax;
    pub const SCRATCH: Gpr = Gpr::R11;
    pub const ADDRESS_SCRATCH: Gpr = Gpr::R10;
    pub const STACK_ALIGN: u32 = 16;
    pub const SLOT_SIZE: u32 = 8;

    /// Register carrying argument `index`, if it is passed in one
    pub fn arg_reg(index: usize) -> Option<Gpr> {
        Self::ARG_REGS.get(index).copied()
    }

    /// `rbp`-relative displacement of a stack-passed argument
    pub fn stack_arg_offset(index: usize) -> Option<i32> {
        let k = index.checked_sub(Self::ARG_REGS.len())?;
        i32::try_from(16 + 8 * k).ok()
    }

    pub fn is_callee_saved(reg: Gpr) -> bool {
        Self::CALLEE_SAVED.contains(&reg)
    }
}

fn align_up(value: u64, align: u64) -> u64 {
    value.div_ceil(align) * align
}

/// Stack frame of one function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    locals: u32,
    homes: u32,
    saved: Vec<Gpr>,
    spills: u32,
    size: u32,
}

impl Frame {
    /// Lay out a frame for `locals` bytes of stack slots, `arg_count`
    /// incoming arguments, the callee-saved registers the body uses and
    /// `spills` eight-byte spill slots
    pub fn new(locals: u32, arg_count: usize, saved: Vec<Gpr>, spills: u32) -> Result<Self, AbiError> {
        if let Some(&reg) = saved.iter().find(|r| !CallingConvention::is_callee_saved(**r)) {
            return Err(AbiError::NotCalleeSaved(reg));
        }
        let slot = u64::from(CallingConvention::SLOT_SIZE);
        let homes = arg_count.min(CallingConvention::ARG_REGS.len()) as u64;
        let locals_aligned = align_up(u64::from(locals), slot);
        let total = locals_aligned + slot * (homes + saved.len() as u64 + u64::from(spills));
        let size = align_up(total, u64::from(CallingConvention::STACK_ALIGN));
        if size > i32::MAX as u64 {
            return Err(AbiError::FrameTooLarge(size));
        }

        Ok(Self {
            locals: locals_aligned as u32,
            homes: homes as u32,
            saved,
            spills,
            size: size as u32,
        })
    }

    /// Bytes reserved below `rbp`
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn saved_registers(&self) -> &[Gpr] {
        &self.saved
    }

    /// Displacement of the home of register argument `index`
    pub fn arg_home(&self, index: usize) -> Option<i32> {
        let index = u32::try_from(index).ok().filter(|i| *i < self.homes)?;
        Some(-((self.locals + 8 * (index + 1)) as i32))
    }

    /// Where argument `index` can be read inside the body
    pub fn arg_location(&self, index: usize) -> Option<i32> {
        self.arg_home(index)
            .or_else(|| CallingConvention::stack_arg_offset(index))
    }

    pub fn saved_slot(&self, reg: Gpr) -> Option<i32> {
        let j = self.saved.iter().position(|r| *r == reg)? as u32;
        Some(-((self.locals + 8 * self.homes + 8 * (j + 1)) as i32))
    }

    pub fn spill_slot(&self, index: u32) -> Result<i32, AbiError> {
        if index >= self.spills {
            return Err(AbiError::SpillOutOfRange {
                index,
                count: self.spills,
            });
        }
        let base = self.locals + 8 * self.homes + 8 * self.saved.len() as u32;
        Ok(-((base + 8 * (index + 1)) as i32))
    }

    /// `push rbp; mov rbp, rsp; sub rsp, N`, then home the register
    /// arguments and save the callee-saved registers the body uses
    pub fn gen_prologue(&self) -> Vec<AsmInst> {
        let mut insts = vec![
            AsmInst::Push(AsmOperand::reg(Gpr::Rbp)),
            AsmInst::Mov(AsmOperand::reg(Gpr::Rbp), AsmOperand::reg(Gpr::Rsp)),
        ];
        if self.size > 0 {
            insts.push(AsmInst::Sub(AsmOperand::reg(Gpr::Rsp), AsmOperand::Imm(i64::from(self.size))));
        }

        for index in 0..self.homes as usize {
            if let (Some(reg), Some(disp)) = (CallingConvention::arg_reg(index), self.arg_home(index)) {
                insts.push(AsmInst::Mov(
                    AsmOperand::mem(Gpr::Rbp, disp, Width::Qword),
                    AsmOperand::reg(reg),
                ));
            }
        }

        for &reg in &self.saved {
            if let Some(disp) = self.saved_slot(reg) {
                insts.push(AsmInst::Mov(
                    AsmOperand::mem(Gpr::Rbp, disp, Width::Qword),
                    AsmOperand::reg(reg),
                ));
            }
        }
        insts
    }

    /// Restore the saved registers, then `leave; ret`
    pub fn gen_epilogue(&self) -> Vec<AsmInst> {
        let mut insts = Vec::new();
        for &reg in &self.saved {
            if let Some(disp) = self.saved_slot(reg) {
                insts.push(AsmInst::Mov(
                    AsmOperand::reg(reg),
                    AsmOperand::mem(Gpr::Rbp, disp, Width::Qword),
                ));
            }
        }
        insts.push(AsmInst::Leave);
        insts.push(AsmInst::Ret);
        insts
    }
}
