//! Register/stack assignment
//!
//! Rewrites every virtual register of a function into a physical operand in
//! one forward pass over blocks and instructions:
//!
//! - `alloca` results become `Mem` slots laid out in the frame,
//! - incoming arguments become `AReg`s in declaration order,
//! - `getelementptr` results become `PReg`s from their own counter,
//! - every other result becomes an `HReg` from a counter that starts over
//!   after each `store`, `store.struct` and `call`.
//!
//! A hardware register is therefore only valid until the next store or call;
//! code that needs a value across one must keep it in a stack slot.

use crate::error::IrError;
use crate::function::{Function, StackSlot};
use crate::instruction::Instruction;
use crate::module::Module;
use crate::operand::Operand;
use crate::ops::Opcode;
use log::{debug, trace};
use std::collections::{HashMap, HashSet};
use tlc_common::{PhysId, RegId};

/// Rewrite every defined function of the module
pub fn transform_module(module: &mut Module) -> Result<(), IrError> {
    for function in module.functions.iter_mut().filter(|f| !f.is_extern()) {
        transform_function(function)?;
    }
    Ok(())
}

/// Rewrite one function in place
pub fn transform_function(function: &mut Function) -> Result<(), IrError> {
    debug!("Transforming function '{}'", function.name);
    let mut ctx = Assignment::new(&function.name);

    for (index, arg) in function.args.iter().enumerate() {
        ctx.arg.insert(arg.reg, index as PhysId);
    }

    for block in &mut function.blocks {
        trace!("  block {}", block.name);
        for inst in &mut block.instructions {
            ctx.rewrite(inst)?;
        }
    }

    debug!(
        "Function '{}': {} stack slots, {} bytes",
        function.name,
        ctx.slots.len(),
        ctx.frame_size
    );
    function.stack_size = ctx.frame_size;
    function.stack_slots = ctx.slots;
    Ok(())
}

/// Per-function assignment state
struct Assignment<'f> {
    function: &'f str,
    mem: HashSet<RegId>,
    arg: HashMap<RegId, PhysId>,
    ptr: HashMap<RegId, PhysId>,
    reg: HashMap<RegId, PhysId>,
    next_hreg: PhysId,
    next_preg: PhysId,
    frame_size: u32,
    slots: Vec<StackSlot>,
}

impl<'f> Assignment<'f> {
    fn new(function: &'f str) -> Self {
        Self {
            function,
            mem: HashSet::new(),
            arg: HashMap::new(),
            ptr: HashMap::new(),
            reg: HashMap::new(),
            next_hreg: 0,
            next_preg: 0,
            frame_size: 0,
            slots: Vec::new(),
        }
    }

    fn rewrite(&mut self, inst: &mut Instruction) -> Result<(), IrError> {
        for operand in inst.sources_mut() {
            self.resolve(operand)?;
        }

        if let Some(dest) = inst.dest.as_mut() {
            match *dest {
                Operand::Reg(name) => {
                    *dest = match inst.opcode {
                        Opcode::Alloca => self.allocate_slot(name, inst.ty.size_in_bytes(), inst.ty.alignment()),
                        Opcode::Gep => {
                            let n = self.next_preg;
                            self.next_preg += 1;
                            self.ptr.insert(name, n);
                            Operand::PReg(n)
                        }
                        _ => {
                            let n = self.next_hreg;
                            self.next_hreg += 1;
                            self.reg.insert(name, n);
                            Operand::HReg(n)
                        }
                    };
                }
                Operand::Mem(name) if inst.opcode == Opcode::Alloca => {
                    self.allocate_slot(name, inst.ty.size_in_bytes(), inst.ty.alignment());
                }
                ref other if other.is_physical() => {}
                ref other => {
                    return Err(IrError::InvalidDestination {
                        function: self.function.to_string(),
                        opcode: inst.opcode.to_string(),
                        operand: other.to_string(),
                    });
                }
            }
        }

        if inst.opcode.clobbers_hardware_registers() {
            self.next_hreg = 0;
        }
        trace!("    {}", inst);
        Ok(())
    }

    fn allocate_slot(&mut self, name: RegId, size: u32, align: u32) -> Operand {
        let size = size.max(1);
        let align = align.max(1);
        let offset = (self.frame_size + size).div_ceil(align) * align;
        self.frame_size = offset;
        self.mem.insert(name);
        self.slots.push(StackSlot { name, offset, size });
        Operand::Mem(name)
    }

    /// Map a use of a virtual register: alloca, then argument, then pointer,
    /// then hardware register
    fn resolve(&self, operand: &mut Operand) -> Result<(), IrError> {
        let Operand::Reg(name) = *operand else {
            return Ok(());
        };
        *operand = if self.mem.contains(&name) {
            Operand::Mem(name)
        } else if let Some(&n) = self.arg.get(&name) {
            Operand::AReg(n)
        } else if let Some(&n) = self.ptr.get(&name) {
            Operand::PReg(n)
        } else if let Some(&n) = self.reg.get(&name) {
            Operand::HReg(n)
        } else {
            return Err(IrError::UnresolvedRegister {
                function: self.function.to_string(),
                reg: name,
            });
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IrBuilder, IrType, Linkage};
    use pretty_assertions::assert_eq;

    fn dests(function: &Function) -> Vec<Option<Operand>> {
        function
            .blocks
            .iter()
            .flat_map(|b| b.instructions.iter())
            .map(|i| i.dest.clone())
            .collect()
    }

    #[test]
    fn test_allocas_become_distinct_slots() {
        let mut b = IrBuilder::new();
        b.create_function("f", Linkage::Global, IrType::Void, vec![]);
        b.create_block("entry").unwrap();
        let x = b.create_alloca(IrType::I32).unwrap();
        let y = b.create_alloca(IrType::I8).unwrap();
        let z = b.create_alloca(IrType::I64).unwrap();
        b.create_store(IrType::I32, Operand::Imm(1), x).unwrap();
        b.create_store(IrType::I8, Operand::Imm(2), y).unwrap();
        b.create_store(IrType::I64, Operand::Imm(3), z).unwrap();
        b.create_ret_void().unwrap();
        let mut f = b.finish_function().unwrap();

        transform_function(&mut f).unwrap();

        assert_eq!(
            f.stack_slots,
            vec![
                StackSlot { name: 0, offset: 4, size: 4 },
                StackSlot { name: 1, offset: 5, size: 1 },
                StackSlot { name: 2, offset: 16, size: 8 },
            ]
        );
        assert_eq!(f.stack_size, 16);
        let store = &f.blocks[0].instructions[4];
        assert_eq!(store.operand(1), Some(&Operand::Mem(1)));
    }

    #[test]
    fn test_record_slots_align_to_widest_field() {
        let record = |name: &str, fields: Vec<IrType>| IrType::Struct { name: name.to_string(), fields };
        let mut b = IrBuilder::new();
        b.create_function("f", Linkage::Global, IrType::Void, vec![]);
        b.create_block("entry").unwrap();
        b.create_alloca(IrType::I8).unwrap();
        b.create_alloca(record("pair", vec![IrType::I8, IrType::I16])).unwrap();
        b.create_alloca(record("wide", vec![IrType::I8, IrType::I64])).unwrap();
        b.create_ret_void().unwrap();
        let mut f = b.finish_function().unwrap();

        transform_function(&mut f).unwrap();

        assert_eq!(
            f.stack_slots,
            vec![
                StackSlot { name: 0, offset: 1, size: 1 },
                StackSlot { name: 1, offset: 6, size: 4 },
                StackSlot { name: 2, offset: 24, size: 16 },
            ]
        );
        assert_eq!(f.stack_size, 24);
    }

    #[test]
    fn test_hardware_counter_resets_after_store_and_call() {
        let mut b = IrBuilder::new();
        b.create_function("f", Linkage::Global, IrType::I32, vec![IrType::I32]);
        b.create_block("entry").unwrap();
        let slot = b.create_alloca(IrType::I32).unwrap();
        let v0 = b.create_load(IrType::I32, slot.clone()).unwrap();
        let v1 = b.create_load(IrType::I32, slot.clone()).unwrap();
        let sum = b.create_add(IrType::I32, v0, v1).unwrap();
        b.create_store(IrType::I32, sum, slot.clone()).unwrap();
        let after_store = b.create_load(IrType::I32, slot.clone()).unwrap();
        let call = b.create_call(IrType::I32, "g", vec![after_store]).unwrap();
        let after_call = b.create_load(IrType::I32, slot).unwrap();
        let total = b.create_add(IrType::I32, call, after_call).unwrap();
        b.create_ret(IrType::I32, total).unwrap();
        let mut f = b.finish_function().unwrap();

        transform_function(&mut f).unwrap();

        assert_eq!(
            dests(&f),
            vec![
                Some(Operand::Mem(1)),
                Some(Operand::HReg(0)),
                Some(Operand::HReg(1)),
                Some(Operand::HReg(2)),
                None,
                Some(Operand::HReg(0)),
                Some(Operand::HReg(1)),
                Some(Operand::HReg(0)),
                Some(Operand::HReg(1)),
                None,
            ]
        );
        let ret = &f.blocks[0].instructions[9];
        assert_eq!(ret.operand(0), Some(&Operand::HReg(1)));
    }

    #[test]
    fn test_arguments_and_pointers() {
        let ptr = IrType::ptr_to(IrType::I32);
        let mut b = IrBuilder::new();
        b.create_function("f", Linkage::Global, IrType::I32, vec![ptr.clone(), IrType::I32]);
        b.create_block("entry").unwrap();
        let base = b.arg(0).unwrap();
        let index = b.arg(1).unwrap();
        let first = b.create_gep(ptr.clone(), base.clone(), index.clone()).unwrap();
        let second = b.create_gep(ptr, base, Operand::Imm(1)).unwrap();
        let a = b.create_load(IrType::I32, first).unwrap();
        let c = b.create_load(IrType::I32, second).unwrap();
        let sum = b.create_add(IrType::I32, a, c).unwrap();
        b.create_ret(IrType::I32, sum).unwrap();
        let mut f = b.finish_function().unwrap();

        transform_function(&mut f).unwrap();

        let insts = &f.blocks[0].instructions;
        assert_eq!(insts[0].dest, Some(Operand::PReg(0)));
        assert_eq!(insts[0].operand(0), Some(&Operand::AReg(0)));
        assert_eq!(insts[0].operand(1), Some(&Operand::AReg(1)));
        assert_eq!(insts[1].dest, Some(Operand::PReg(1)));
        assert_eq!(insts[2].operand(0), Some(&Operand::PReg(0)));
        assert_eq!(insts[3].operand(0), Some(&Operand::PReg(1)));
        assert_eq!(insts[4].dest, Some(Operand::HReg(2)));
        assert_eq!(f.stack_size, 0);
    }

    #[test]
    fn test_unresolved_register_is_an_error() {
        let mut b = IrBuilder::new();
        b.create_function("broken", Linkage::Global, IrType::I32, vec![]);
        b.create_block("entry").unwrap();
        b.create_ret(IrType::I32, Operand::Reg(42)).unwrap();
        let mut f = b.finish_function().unwrap();

        let err = transform_function(&mut f).unwrap_err();
        assert_eq!(
            err,
            IrError::UnresolvedRegister {
                function: "broken".to_string(),
                reg: 42
            }
        );
    }

    #[test]
    fn test_labels_strings_and_immediates_untouched() {
        let mut module = Module::new("m");
        let hello = module.add_string("hello");
        let mut b = IrBuilder::new();
        b.create_function("main", Linkage::Global, IrType::Void, vec![]);
        let entry = b.create_block("entry").unwrap();
        b.create_void_call("puts", vec![hello.clone()]).unwrap();
        b.create_br(entry).unwrap();
        module.add_function(b.finish_function().unwrap());
        module.add_function(Function::new_extern("puts", IrType::I32, vec![IrType::ptr_to(IrType::I8)], false));

        transform_module(&mut module).unwrap();

        let insts = &module.functions[0].blocks[0].instructions;
        assert_eq!(insts[0].call.as_ref().unwrap().args, vec![hello]);
        assert_eq!(insts[1].operand(0), Some(&Operand::label("entry")));
    }

    #[test]
    fn test_transform_twice_is_stable() {
        let mut b = IrBuilder::new();
        b.create_function("f", Linkage::Global, IrType::I32, vec![]);
        b.create_block("entry").unwrap();
        let slot = b.create_alloca(IrType::I32).unwrap();
        let v = b.create_load(IrType::I32, slot).unwrap();
        b.create_ret(IrType::I32, v).unwrap();
        let mut f = b.finish_function().unwrap();

        transform_function(&mut f).unwrap();
        let once = f.clone();
        transform_function(&mut f).unwrap();
        assert_eq!(f.blocks, once.blocks);
        assert_eq!(f.stack_slots, once.stack_slots);
        assert_eq!(f.stack_size, 4);
    }
}
