//! Record field access

use super::{FunctionGenerator, TypedOperand};
use tlc_common::CompilerError;

/// `name.field`, read straight out of the record's storage
pub fn generate_field_load(gen: &mut FunctionGenerator, name: &str, field: &str) -> Result<TypedOperand, CompilerError> {
    let var = gen.lookup(name)?;
    let (record, index) = gen.field_of(&var, field)?;
    let value = gen
        .builder
        .create_struct_load(record.ir_type.clone(), var.storage, index as u32)?;
    Ok(TypedOperand::new(value, record.fields[index].ty.clone()))
}
