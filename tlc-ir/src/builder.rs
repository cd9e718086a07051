//! IR Builder
//!
//! The only component that creates register-producing instructions. It owns
//! the function under construction together with its insertion cursor and
//! register counter; starting a new function resets all of them.

use crate::block::Block;
use crate::error::IrError;
use crate::function::Function;
use crate::instruction::Instruction;
use crate::module::Linkage;
use crate::operand::Operand;
use crate::ops::Opcode;
use crate::types::IrType;
use tlc_common::{BlockId, RegId};

/// Builder for constructing IR one function at a time
#[derive(Debug, Default)]
pub struct IrBuilder {
    function: Option<Function>,
    insert_point: Option<BlockId>,
    next_reg: RegId,
    next_block_id: BlockId,
}

impl IrBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start building a function. Its arguments are `%0..%n-1` and fresh
    /// registers are numbered from `n`.
    pub fn create_function(
        &mut self,
        name: impl Into<String>,
        linkage: Linkage,
        return_type: IrType,
        params: Vec<IrType>,
    ) -> &mut Function {
        self.next_reg = params.len() as RegId;
        self.next_block_id = 0;
        self.insert_point = None;
        self.function.insert(Function::new(name, linkage, return_type, params))
    }

    /// Hand back the finished function
    pub fn finish_function(&mut self) -> Result<Function, IrError> {
        self.insert_point = None;
        self.function.take().ok_or(IrError::NoCurrentFunction)
    }

    pub fn function(&self) -> Option<&Function> {
        self.function.as_ref()
    }

    fn function_mut(&mut self) -> Result<&mut Function, IrError> {
        self.function.as_mut().ok_or(IrError::NoCurrentFunction)
    }

    fn new_reg(&mut self) -> Operand {
        let reg = self.next_reg;
        self.next_reg += 1;
        Operand::Reg(reg)
    }

    /// Argument register `index` of the current function
    pub fn arg(&self, index: usize) -> Option<Operand> {
        self.function.as_ref().and_then(|f| f.arg(index))
    }

    // ---- blocks -------------------------------------------------------

    /// Construct a detached block to be spliced in later
    pub fn new_block(&mut self, name: impl Into<String>) -> Block {
        let id = self.next_block_id;
        self.next_block_id += 1;
        Block::new(id, name)
    }

    /// Create a block at the end of the function and move the cursor to it
    pub fn create_block(&mut self, name: impl Into<String>) -> Result<BlockId, IrError> {
        let block = self.new_block(name);
        let id = self.add_block(block)?;
        self.insert_point = Some(id);
        Ok(id)
    }

    pub fn add_block(&mut self, block: Block) -> Result<BlockId, IrError> {
        self.function_mut()?.add_block(block)
    }

    pub fn add_block_after(&mut self, after: BlockId, block: Block) -> Result<BlockId, IrError> {
        self.function_mut()?.add_block_after(after, block)
    }

    pub fn set_insert_point(&mut self, block: BlockId) -> Result<(), IrError> {
        let function = self.function_mut()?;
        if function.block(block).is_none() {
            return Err(IrError::UnknownBlock {
                function: function.name.clone(),
                block,
            });
        }
        self.insert_point = Some(block);
        Ok(())
    }

    pub fn insert_point(&self) -> Option<BlockId> {
        self.insert_point
    }

    pub fn block_name(&self, block: BlockId) -> Option<&str> {
        self.function
            .as_ref()
            .and_then(|f| f.block(block))
            .map(|b| b.name.as_str())
    }

    /// Whether the block under the cursor already ends in a terminator
    pub fn current_block_terminated(&self) -> bool {
        self.insert_point
            .and_then(|id| self.function.as_ref()?.block(id))
            .is_some_and(Block::has_terminator)
    }

    fn label(&self, block: BlockId) -> Result<Operand, IrError> {
        let function = self.function.as_ref().ok_or(IrError::NoCurrentFunction)?;
        let block = function.block(block).ok_or_else(|| IrError::UnknownBlock {
            function: function.name.clone(),
            block,
        })?;
        Ok(Operand::Label(block.name.clone()))
    }

    fn append(&mut self, instruction: Instruction) -> Result<(), IrError> {
        let insert_point = self.insert_point;
        let function = self.function_mut()?;
        let id = insert_point.ok_or_else(|| IrError::NoInsertPoint(function.name.clone()))?;
        let name = function.name.clone();
        let block = function
            .block_mut(id)
            .ok_or(IrError::UnknownBlock { function: name, block: id })?;
        block.push(instruction);
        Ok(())
    }

    fn append_with_result(&mut self, instruction: Instruction) -> Result<Operand, IrError> {
        let dest = self.new_reg();
        self.append(instruction.with_dest(dest.clone()))?;
        Ok(dest)
    }

    // ---- memory -------------------------------------------------------

    /// Reserve a stack cell of type `ty`; the returned register names the cell
    pub fn create_alloca(&mut self, ty: IrType) -> Result<Operand, IrError> {
        self.append_with_result(Instruction::new(Opcode::Alloca, ty))
    }

    pub fn create_load(&mut self, ty: IrType, src: Operand) -> Result<Operand, IrError> {
        self.append_with_result(Instruction::new(Opcode::Load, ty).with_operands([src]))
    }

    pub fn create_store(&mut self, ty: IrType, value: Operand, dest: Operand) -> Result<(), IrError> {
        self.append(Instruction::new(Opcode::Store, ty).with_operands([value, dest]))
    }

    /// Load field `index` of the record `record_ty` stored at `src`
    pub fn create_struct_load(&mut self, record_ty: IrType, src: Operand, index: u32) -> Result<Operand, IrError> {
        let inst = Instruction::new(Opcode::StructLoad, record_ty)
            .with_operands([src, Operand::Imm(i64::from(index))]);
        self.append_with_result(inst)
    }

    /// Store `value` into field `index` of the record `record_ty` at `dest`
    pub fn create_struct_store(
        &mut self,
        record_ty: IrType,
        dest: Operand,
        index: u32,
        value: Operand,
    ) -> Result<(), IrError> {
        let inst = Instruction::new(Opcode::StructStore, record_ty)
            .with_operands([dest, Operand::Imm(i64::from(index)), value]);
        self.append(inst)
    }

    /// Address of element `index` of the array `base` points to; `ptr_ty`
    /// is the pointer type, its pointee gives the element size
    pub fn create_gep(&mut self, ptr_ty: IrType, base: Operand, index: Operand) -> Result<Operand, IrError> {
        self.append_with_result(Instruction::new(Opcode::Gep, ptr_ty).with_operands([base, index]))
    }

    // ---- arithmetic ---------------------------------------------------

    /// Shared constructor behind every two-operand arithmetic builder.
    /// Two constants fold to a constant and nothing is appended.
    pub fn create_binary_op(&mut self, opcode: Opcode, ty: IrType, lhs: Operand, rhs: Operand) -> Result<Operand, IrError> {
        if let (Some(a), Some(b)) = (lhs.as_imm(), rhs.as_imm()) {
            if let Some(value) = opcode.fold(&ty, a, b) {
                return Ok(Operand::Imm(value));
            }
        }
        self.append_with_result(Instruction::new(opcode, ty).with_operands([lhs, rhs]))
    }

    pub fn create_add(&mut self, ty: IrType, lhs: Operand, rhs: Operand) -> Result<Operand, IrError> {
        self.create_binary_op(Opcode::Add, ty, lhs, rhs)
    }

    pub fn create_sub(&mut self, ty: IrType, lhs: Operand, rhs: Operand) -> Result<Operand, IrError> {
        self.create_binary_op(Opcode::Sub, ty, lhs, rhs)
    }

    pub fn create_smul(&mut self, ty: IrType, lhs: Operand, rhs: Operand) -> Result<Operand, IrError> {
        self.create_binary_op(Opcode::SMul, ty, lhs, rhs)
    }

    pub fn create_umul(&mut self, ty: IrType, lhs: Operand, rhs: Operand) -> Result<Operand, IrError> {
        self.create_binary_op(Opcode::UMul, ty, lhs, rhs)
    }

    pub fn create_sdiv(&mut self, ty: IrType, lhs: Operand, rhs: Operand) -> Result<Operand, IrError> {
        self.create_binary_op(Opcode::SDiv, ty, lhs, rhs)
    }

    pub fn create_udiv(&mut self, ty: IrType, lhs: Operand, rhs: Operand) -> Result<Operand, IrError> {
        self.create_binary_op(Opcode::UDiv, ty, lhs, rhs)
    }

    pub fn create_srem(&mut self, ty: IrType, lhs: Operand, rhs: Operand) -> Result<Operand, IrError> {
        self.create_binary_op(Opcode::SRem, ty, lhs, rhs)
    }

    pub fn create_urem(&mut self, ty: IrType, lhs: Operand, rhs: Operand) -> Result<Operand, IrError> {
        self.create_binary_op(Opcode::URem, ty, lhs, rhs)
    }

    pub fn create_and(&mut self, ty: IrType, lhs: Operand, rhs: Operand) -> Result<Operand, IrError> {
        self.create_binary_op(Opcode::And, ty, lhs, rhs)
    }

    pub fn create_or(&mut self, ty: IrType, lhs: Operand, rhs: Operand) -> Result<Operand, IrError> {
        self.create_binary_op(Opcode::Or, ty, lhs, rhs)
    }

    pub fn create_xor(&mut self, ty: IrType, lhs: Operand, rhs: Operand) -> Result<Operand, IrError> {
        self.create_binary_op(Opcode::Xor, ty, lhs, rhs)
    }

    /// Two's complement negation; constants are negated in place
    pub fn create_neg(&mut self, ty: IrType, value: Operand) -> Result<Operand, IrError> {
        if let Some(v) = value.as_imm() {
            return Ok(Operand::Imm(ty.wrap(v.wrapping_neg())));
        }
        self.append_with_result(Instruction::new(Opcode::Neg, ty).with_operands([value]))
    }

    /// Bitwise complement; constants are complemented in place
    pub fn create_not(&mut self, ty: IrType, value: Operand) -> Result<Operand, IrError> {
        if let Some(v) = value.as_imm() {
            return Ok(Operand::Imm(ty.wrap(!v)));
        }
        self.append_with_result(Instruction::new(Opcode::Not, ty).with_operands([value]))
    }

    // ---- control flow -------------------------------------------------

    /// Shared constructor behind the fused compare-and-branch builders.
    ///
    /// Two constants fold to `Some(Imm(1))`/`Some(Imm(0))` and nothing is
    /// appended; the caller decides where control goes. Otherwise the branch
    /// to `target` is appended and `None` is returned.
    pub fn create_compare_branch(
        &mut self,
        opcode: Opcode,
        ty: IrType,
        lhs: Operand,
        rhs: Operand,
        target: BlockId,
    ) -> Result<Option<Operand>, IrError> {
        if let (Some(a), Some(b)) = (lhs.as_imm(), rhs.as_imm()) {
            if let Some(taken) = opcode.compare(&ty, a, b) {
                return Ok(Some(Operand::Imm(i64::from(taken))));
            }
        }
        let label = self.label(target)?;
        self.append(Instruction::new(opcode, ty).with_operands([lhs, rhs, label]))?;
        Ok(None)
    }

    pub fn create_beq(&mut self, ty: IrType, lhs: Operand, rhs: Operand, target: BlockId) -> Result<Option<Operand>, IrError> {
        self.create_compare_branch(Opcode::Beq, ty, lhs, rhs, target)
    }

    pub fn create_bne(&mut self, ty: IrType, lhs: Operand, rhs: Operand, target: BlockId) -> Result<Option<Operand>, IrError> {
        self.create_compare_branch(Opcode::Bne, ty, lhs, rhs, target)
    }

    pub fn create_bgt(&mut self, ty: IrType, lhs: Operand, rhs: Operand, target: BlockId) -> Result<Option<Operand>, IrError> {
        self.create_compare_branch(Opcode::Bgt, ty, lhs, rhs, target)
    }

    pub fn create_bge(&mut self, ty: IrType, lhs: Operand, rhs: Operand, target: BlockId) -> Result<Option<Operand>, IrError> {
        self.create_compare_branch(Opcode::Bge, ty, lhs, rhs, target)
    }

    pub fn create_blt(&mut self, ty: IrType, lhs: Operand, rhs: Operand, target: BlockId) -> Result<Option<Operand>, IrError> {
        self.create_compare_branch(Opcode::Blt, ty, lhs, rhs, target)
    }

    pub fn create_ble(&mut self, ty: IrType, lhs: Operand, rhs: Operand, target: BlockId) -> Result<Option<Operand>, IrError> {
        self.create_compare_branch(Opcode::Ble, ty, lhs, rhs, target)
    }

    pub fn create_br(&mut self, target: BlockId) -> Result<(), IrError> {
        let label = self.label(target)?;
        self.append(Instruction::new(Opcode::Br, IrType::Void).with_operands([label]))
    }

    /// Call whose result is kept in a fresh register
    pub fn create_call(&mut self, ty: IrType, callee: impl Into<String>, args: Vec<Operand>) -> Result<Operand, IrError> {
        self.append_with_result(Instruction::new(Opcode::Call, ty).with_call(callee, args))
    }

    /// Call whose result, if any, is discarded
    pub fn create_void_call(&mut self, callee: impl Into<String>, args: Vec<Operand>) -> Result<(), IrError> {
        self.append(Instruction::new(Opcode::Call, IrType::Void).with_call(callee, args))
    }

    pub fn create_ret(&mut self, ty: IrType, value: Operand) -> Result<(), IrError> {
        self.append(Instruction::new(Opcode::Ret, ty).with_operands([value]))
    }

    pub fn create_ret_void(&mut self) -> Result<(), IrError> {
        self.append(Instruction::new(Opcode::RetVoid, IrType::Void))
    }
}
