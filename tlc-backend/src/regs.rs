//! Physical register numbering to x86-64 locations
//!
//! The transform pass numbers hardware (`rN`) and pointer (`pN`) registers
//! from independent counters. The first few of each class get a
//! callee-saved register; the rest live in eight-byte frame spill slots.

use tlc_codegen::{CallingConvention, Gpr};
use tlc_common::PhysId;
use tlc_ir::{Function, Operand};

/// Where a hardware or pointer register value lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Reg(Gpr),
    /// Index into the frame's spill slots
    Spill(u32),
}

/// Register assignment for one function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterMap {
    hregs: u32,
    pregs: u32,
}

impl RegisterMap {
    /// Count the hardware and pointer registers the function refers to
    pub fn scan(function: &Function) -> Self {
        let mut map = Self { hregs: 0, pregs: 0 };
        let operands = function.blocks.iter().flat_map(|b| &b.instructions).flat_map(|inst| {
            inst.dest.iter().chain(inst.sources())
        });
        for operand in operands {
            match operand {
                Operand::HReg(n) => map.hregs = map.hregs.max(n + 1),
                Operand::PReg(n) => map.pregs = map.pregs.max(n + 1),
                _ => {}
            }
        }
        map
    }

    fn hreg_spills(&self) -> u32 {
        self.hregs.saturating_sub(CallingConvention::HREG_REGS.len() as u32)
    }

    fn preg_spills(&self) -> u32 {
        self.pregs.saturating_sub(CallingConvention::PREG_REGS.len() as u32)
    }

    pub fn spill_count(&self) -> u32 {
        self.hreg_spills() + self.preg_spills()
    }

    /// Callee-saved registers the function body writes, in save order
    pub fn saved_registers(&self) -> Vec<Gpr> {
        let hregs = CallingConvention::HREG_REGS.iter().take(self.hregs as usize);
        let pregs = CallingConvention::PREG_REGS.iter().take(self.pregs as usize);
        hregs.chain(pregs).copied().collect()
    }

    pub fn hreg(&self, n: PhysId) -> Location {
        match CallingConvention::HREG_REGS.get(n as usize) {
            Some(&reg) => Location::Reg(reg),
            None => Location::Spill(n - CallingConvention::HREG_REGS.len() as u32),
        }
    }

    pub fn preg(&self, n: PhysId) -> Location {
        match CallingConvention::PREG_REGS.get(n as usize) {
            Some(&reg) => Location::Reg(reg),
            None => Location::Spill(self.hreg_spills() + n - CallingConvention::PREG_REGS.len() as u32),
        }
    }

    /// Location of an `rN`/`pN` operand
    pub fn location(&self, operand: &Operand) -> Option<Location> {
        match *operand {
            Operand::HReg(n) => Some(self.hreg(n)),
            Operand::PReg(n) => Some(self.preg(n)),
            _ => None,
        }
    }
}
