//! Expression code generation modules

mod binary_ops;
mod conditions;
mod function_calls;
mod identifiers;
mod literals;
mod records;

pub use conditions::generate_condition;
pub use function_calls::generate_call_statement;
pub use identifiers::{element_address, element_type};

use super::FunctionGenerator;
use crate::ast::{AstType, Expression};
use log::trace;
use tlc_common::CompilerError;
use tlc_ir::Operand;

/// Result of lowering an expression
#[derive(Debug, Clone, PartialEq)]
pub struct TypedOperand {
    pub operand: Operand,
    pub ty: AstType,
}

impl TypedOperand {
    pub fn new(operand: Operand, ty: AstType) -> Self {
        Self { operand, ty }
    }

    /// Whether the operand is a freshly computed register that a following
    /// store or call would invalidate
    fn is_volatile(&self) -> bool {
        matches!(self.operand, Operand::Reg(_)) && !self.ty.is_record()
    }
}

/// Generate IR for an expression. `expected` types untyped literals.
pub fn generate_expression(
    gen: &mut FunctionGenerator,
    expr: &Expression,
    expected: Option<&AstType>,
) -> Result<TypedOperand, CompilerError> {
    match expr {
        Expression::Int { value } => literals::generate_int_literal(gen, *value, expected),

        Expression::Char { value } => Ok(TypedOperand::new(Operand::Imm(i64::from(*value)), AstType::Char)),

        Expression::Bool { value } => Ok(TypedOperand::new(Operand::Imm(i64::from(*value)), AstType::Bool)),

        Expression::Str { value } => literals::generate_string_literal(gen, value),

        Expression::Ident { name } => identifiers::generate_identifier(gen, name),

        Expression::Index { name, index } => identifiers::generate_index(gen, name, index),

        Expression::Field { name, field } => records::generate_field_load(gen, name, field),

        Expression::Call { name, args } => function_calls::generate_call_expression(gen, name, args),

        Expression::Neg { operand } => {
            let value = generate_expression(gen, operand, expected)?;
            let ir_type = gen.ir_type(&value.ty)?;
            let result = gen.builder.create_neg(ir_type, value.operand)?;
            Ok(TypedOperand::new(result, value.ty))
        }

        Expression::BitNot { operand } => {
            let value = generate_expression(gen, operand, expected)?;
            let ir_type = gen.ir_type(&value.ty)?;
            let result = gen.builder.create_not(ir_type, value.operand)?;
            Ok(TypedOperand::new(result, value.ty))
        }

        Expression::Binary { op, .. } if op.is_comparison() || op.is_logical() => {
            binary_ops::generate_materialized_condition(gen, expr)
        }

        Expression::Binary { op, lhs, rhs } => binary_ops::generate_binary_operation(gen, *op, lhs, rhs, expected),
    }
}

/// Lower sibling operands left to right, each typed by its entry in `types`.
///
/// Hardware registers do not survive a store or a call, so an operand that
/// is followed by a sibling which emits one is parked in a stack slot and
/// reloaded once every operand has been evaluated.
pub fn generate_operands(
    gen: &mut FunctionGenerator,
    exprs: &[&Expression],
    types: &[Option<AstType>],
) -> Result<Vec<TypedOperand>, CompilerError> {
    let mut values = Vec::with_capacity(exprs.len());
    let mut spilled = Vec::with_capacity(exprs.len());

    for (i, expr) in exprs.iter().enumerate() {
        let expected = types.get(i).and_then(Option::as_ref);
        let value = generate_expression(gen, expr, expected)?;
        let clobbered_later = exprs[i + 1..].iter().any(|e| e.clobbers_registers());

        if clobbered_later && value.is_volatile() {
            trace!("{}: spilling operand {} across a clobbering sibling", gen.scope.name, i);
            let ir_type = gen.ir_type(&value.ty)?;
            let slot = gen.builder.create_alloca(ir_type.clone())?;
            gen.builder.create_store(ir_type, value.operand.clone(), slot.clone())?;
            spilled.push(Some(slot));
        } else {
            spilled.push(None);
        }
        values.push(value);
    }

    for (value, slot) in values.iter_mut().zip(spilled) {
        if let Some(slot) = slot {
            let ir_type = gen.ir_type(&value.ty)?;
            value.operand = gen.builder.create_load(ir_type, slot)?;
        }
    }
    Ok(values)
}

/// Type an expression would have, without emitting anything. Untyped
/// integer literals have none.
pub fn static_type(gen: &FunctionGenerator, expr: &Expression) -> Result<Option<AstType>, CompilerError> {
    Ok(match expr {
        Expression::Int { .. } => None,
        Expression::Char { .. } => Some(AstType::Char),
        Expression::Bool { .. } => Some(AstType::Bool),
        Expression::Str { .. } => Some(AstType::String),
        Expression::Ident { name } => Some(gen.lookup(name)?.ty),
        Expression::Index { name, .. } => {
            let var = gen.lookup(name)?;
            Some(identifiers::element_type(gen, &var.ty)?)
        }
        Expression::Field { name, field } => {
            let var = gen.lookup(name)?;
            let (record, index) = gen.field_of(&var, field)?;
            Some(record.fields[index].ty.clone())
        }
        Expression::Call { name, .. } => Some(gen.signature(name)?.return_type.clone()),
        Expression::Neg { operand } | Expression::BitNot { operand } => static_type(gen, operand)?,
        Expression::Binary { op, .. } if op.is_comparison() || op.is_logical() => Some(AstType::I32),
        Expression::Binary { lhs, rhs, .. } => match static_type(gen, lhs)? {
            Some(ty) => Some(ty),
            None => static_type(gen, rhs)?,
        },
    })
}

/// Common operand type of a binary expression: the left side's type unless
/// it is an untyped literal, then the right side's, then the context's
pub fn operand_type(
    gen: &FunctionGenerator,
    lhs: &Expression,
    rhs: &Expression,
    expected: Option<&AstType>,
) -> Result<AstType, CompilerError> {
    let ty = match static_type(gen, lhs)? {
        Some(ty) => Some(ty),
        None => static_type(gen, rhs)?,
    };
    let wide = [lhs, rhs]
        .iter()
        .any(|e| matches!(e, Expression::Int { value } if i32::try_from(*value).is_err()));
    Ok(ty
        .or_else(|| expected.filter(|t| t.is_integer()).cloned())
        .unwrap_or(if wide { AstType::I64 } else { AstType::I32 }))
}
