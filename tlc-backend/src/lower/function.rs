//! Function Lowering - frame setup, operand resolution and block emission
//!
//! Every instruction is lowered in isolation: operands are fetched into the
//! scratch registers `r11`/`r10`, computed, and the result is written back
//! to the location of the destination. Values held in registers are always
//! sign-extended to 64 bits.

use super::instruction::lower_instruction;
use crate::error::EmitError;
use crate::naming::{block_label, epilogue_label, string_label};
use crate::regs::{Location, RegisterMap};
use crate::EmitOptions;
use log::{debug, info, trace};
use std::collections::HashSet;
use tlc_codegen::{AsmInst, AsmOperand, CallingConvention, Frame, Gpr, Width};
use tlc_common::{PhysId, RegId};
use tlc_ir::{Function, Instruction, IrType, Linkage, Module, Operand};

/// Per-function lowering state
pub struct FunctionContext<'a> {
    pub module: &'a Module,
    pub function: &'a Function,
    pub frame: Frame,
    pub regs: RegisterMap,
}

impl<'a> FunctionContext<'a> {
    pub fn new(module: &'a Module, function: &'a Function) -> Result<Self, EmitError> {
        let regs = RegisterMap::scan(function);
        let frame = Frame::new(
            function.stack_size,
            function.args.len(),
            regs.saved_registers(),
            regs.spill_count(),
        )?;

        Ok(Self {
            module,
            function,
            frame,
            regs,
        })
    }

    pub fn unexpected(&self, inst: &Instruction, operand: &Operand) -> EmitError {
        EmitError::UnexpectedOperand {
            function: self.function.name.clone(),
            opcode: inst.opcode.to_string(),
            operand: operand.to_string(),
        }
    }

    pub fn unsupported(&self, inst: &Instruction, ty: &IrType) -> EmitError {
        EmitError::UnsupportedType {
            function: self.function.name.clone(),
            opcode: inst.opcode.to_string(),
            ty: ty.to_string(),
        }
    }

    /// Source operand `index` of `inst`, which must be present
    pub fn operand<'i>(&self, inst: &'i Instruction, index: usize) -> Result<&'i Operand, EmitError> {
        inst.operand(index).ok_or_else(|| EmitError::MissingOperand {
            function: self.function.name.clone(),
            opcode: inst.opcode.to_string(),
            index,
        })
    }

    /// Branch target of `operand` as an assembler label
    pub fn label(&self, inst: &Instruction, operand: &Operand) -> Result<String, EmitError> {
        operand
            .as_label()
            .map(|block| block_label(&self.function.name, block))
            .ok_or_else(|| self.unexpected(inst, operand))
    }

    pub fn epilogue(&self) -> String {
        epilogue_label(&self.function.name)
    }

    /// `rbp`-relative start of stack slot `name`, plus `offset` bytes
    fn slot_address(&self, name: RegId, offset: u32, width: Width) -> Result<AsmOperand, EmitError> {
        let slot = self.function.slot(name).ok_or_else(|| EmitError::MissingStackSlot {
            function: self.function.name.clone(),
            slot: name,
        })?;
        let disp = i64::from(offset) - i64::from(slot.offset);
        Ok(AsmOperand::mem(Gpr::Rbp, disp as i32, width))
    }

    fn spill(&self, location: Location, width: Width) -> Result<AsmOperand, EmitError> {
        Ok(match location {
            Location::Reg(reg) => AsmOperand::Reg(reg, width),
            Location::Spill(index) => AsmOperand::mem(Gpr::Rbp, self.frame.spill_slot(index)?, width),
        })
    }

    /// Memory holding incoming argument `n`, at the argument's width
    fn argument(&self, n: PhysId) -> Result<AsmOperand, EmitError> {
        let unknown = || EmitError::UnknownArgument {
            function: self.function.name.clone(),
            index: n,
        };
        let arg = self.function.args.get(n as usize).ok_or_else(unknown)?;
        let disp = self.frame.arg_location(n as usize).ok_or_else(unknown)?;
        let width = Width::from_bytes(arg.ty.size_in_bytes());
        Ok(AsmOperand::mem(Gpr::Rbp, disp, width))
    }

    /// Load the full 64-bit value of `operand` into `dst`. A stack slot
    /// used as a value is its address.
    pub fn load_value(
        &self,
        inst: &Instruction,
        operand: &Operand,
        dst: Gpr,
        out: &mut Vec<AsmInst>,
    ) -> Result<(), EmitError> {
        let target = AsmOperand::reg(dst);
        match operand {
            Operand::Imm(value) => out.push(AsmInst::Mov(target, AsmOperand::Imm(*value))),
            Operand::Mem(name) => out.push(AsmInst::Lea(target, self.slot_address(*name, 0, Width::Qword)?)),
            Operand::StringPtr { name, .. } => out.push(AsmInst::Lea(target, AsmOperand::RipSymbol(string_label(name)))),
            Operand::AReg(n) => out.push(AsmInst::Movsx(target, self.argument(*n)?)),
            Operand::HReg(_) | Operand::PReg(_) => {
                let location = self.regs.location(operand).ok_or_else(|| self.unexpected(inst, operand))?;
                if location != Location::Reg(dst) {
                    out.push(AsmInst::Mov(target, self.spill(location, Width::Qword)?));
                }
            }
            Operand::Reg(_) | Operand::Label(_) => return Err(self.unexpected(inst, operand)),
        }
        Ok(())
    }

    /// An x86 operand reading `operand` at `width`: an immediate when it
    /// fits in 32 bits, the value's register or spill slot, or else
    /// `scratch` after loading it there. Memory is only returned when
    /// `allow_memory` is set.
    pub fn source(
        &self,
        inst: &Instruction,
        operand: &Operand,
        width: Width,
        scratch: Gpr,
        allow_memory: bool,
        out: &mut Vec<AsmInst>,
    ) -> Result<AsmOperand, EmitError> {
        match operand {
            Operand::Imm(value) if i32::try_from(*value).is_ok() => return Ok(AsmOperand::Imm(*value)),
            Operand::HReg(_) | Operand::PReg(_) => {
                let location = self.regs.location(operand).ok_or_else(|| self.unexpected(inst, operand))?;
                if matches!(location, Location::Reg(_)) || allow_memory {
                    return self.spill(location, width);
                }
            }
            _ => {}
        }
        self.load_value(inst, operand, scratch, out)?;
        Ok(AsmOperand::Reg(scratch, width))
    }

    /// Memory reference `offset` bytes into the storage `operand` designates:
    /// a stack slot directly, anything else through the pointer it holds
    pub fn address(
        &self,
        inst: &Instruction,
        operand: &Operand,
        offset: u32,
        width: Width,
        out: &mut Vec<AsmInst>,
    ) -> Result<AsmOperand, EmitError> {
        match (operand, self.regs.location(operand)) {
            (Operand::Mem(name), _) => self.slot_address(*name, offset, width),
            (_, Some(Location::Reg(base))) => Ok(AsmOperand::mem(base, offset as i32, width)),
            (Operand::Imm(_), _) => Err(self.unexpected(inst, operand)),
            _ => {
                let base = CallingConvention::ADDRESS_SCRATCH;
                self.load_value(inst, operand, base, out)?;
                Ok(AsmOperand::mem(base, offset as i32, width))
            }
        }
    }

    /// Store the 64-bit value in `src` to the destination of `inst`
    pub fn write_result(&self, inst: &Instruction, src: Gpr, out: &mut Vec<AsmInst>) -> Result<(), EmitError> {
        let Some(dest) = inst.dest.as_ref() else {
            return Ok(());
        };
        let location = self.regs.location(dest).ok_or_else(|| self.unexpected(inst, dest))?;
        if location != Location::Reg(src) {
            out.push(AsmInst::Mov(self.spill(location, Width::Qword)?, AsmOperand::reg(src)));
        }
        Ok(())
    }
}

/// Width of a scalar IR type, `None` for void and records
pub fn scalar_width(ty: &IrType) -> Option<Width> {
    ty.bits().map(|bits| Width::from_bytes(bits / 8))
}

/// Sign-extend the low `width` bits of `reg` over the whole register
pub fn normalize(reg: Gpr, width: Width, out: &mut Vec<AsmInst>) {
    if width != Width::Qword {
        out.push(AsmInst::Movsx(AsmOperand::reg(reg), AsmOperand::Reg(reg, width)));
    }
}

/// Zero-extend the low `width` bits of `reg` over the whole register
pub fn zero_extend(reg: Gpr, width: Width, out: &mut Vec<AsmInst>) {
    if width != Width::Qword {
        out.push(AsmInst::Movzx(AsmOperand::reg(reg), AsmOperand::Reg(reg, width)));
    }
}

/// Lower one defined function: header, prologue, blocks, shared epilogue
pub fn lower_function(module: &Module, function: &Function, options: &EmitOptions) -> Result<Vec<AsmInst>, EmitError> {
    info!("Lowering function '{}' with {} blocks", function.name, function.blocks.len());
    let ctx = FunctionContext::new(module, function)?;
    debug!(
        "Function '{}': frame {} bytes, saves {:?}, {} spill slots",
        function.name,
        ctx.frame.size(),
        ctx.frame.saved_registers(),
        ctx.regs.spill_count()
    );

    let mut insts = Vec::new();
    if function.linkage == Linkage::Global {
        insts.push(AsmInst::Directive(format!(".globl {}", function.name)));
    }
    insts.push(AsmInst::Directive(format!(".type {}, @function", function.name)));
    insts.push(AsmInst::Label(function.name.clone()));
    insts.extend(ctx.frame.gen_prologue());

    let targets: HashSet<&str> = function
        .blocks
        .iter()
        .flat_map(|b| &b.instructions)
        .filter_map(Instruction::branch_target)
        .collect();

    let block_count = function.blocks.len();
    for (index, block) in function.blocks.iter().enumerate() {
        if index > 0 || targets.contains(block.name.as_str()) {
            insts.push(AsmInst::Label(block_label(&function.name, &block.name)));
        }
        debug!("  block {} ({} instructions)", block.name, block.len());

        let last_block = index + 1 == block_count;
        for (i, inst) in block.instructions.iter().enumerate() {
            trace!("    {}", inst);
            if options.comments {
                insts.push(AsmInst::Comment(inst.to_string()));
            }
            let falls_into_epilogue = last_block && i + 1 == block.instructions.len();
            lower_instruction(&ctx, inst, falls_into_epilogue, &mut insts)?;
        }
    }

    insts.push(AsmInst::Label(ctx.epilogue()));
    insts.extend(ctx.frame.gen_epilogue());
    insts.push(AsmInst::Directive(format!(".size {}, .-{}", function.name, function.name)));
    Ok(insts)
}
