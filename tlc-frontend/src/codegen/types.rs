//! AST type to IR type conversion and assignment compatibility

use super::errors::CodegenError;
use super::RecordInfo;
use crate::ast::AstType;
use std::collections::HashMap;
use tlc_common::SourceLocation;
use tlc_ir::IrType;

pub fn convert_type(
    ast_type: &AstType,
    records: &HashMap<String, RecordInfo>,
    location: &SourceLocation,
) -> Result<IrType, CodegenError> {
    Ok(match ast_type {
        AstType::Void => IrType::Void,
        AstType::Bool | AstType::Char | AstType::I8 | AstType::U8 => IrType::I8,
        AstType::I16 | AstType::U16 => IrType::I16,
        AstType::I32 | AstType::U32 => IrType::I32,
        AstType::I64 | AstType::U64 => IrType::I64,
        AstType::String => IrType::ptr_to(IrType::I8),
        AstType::Ptr(inner) if inner.is_void() => IrType::ptr_to(IrType::I8),
        AstType::Ptr(inner) => IrType::ptr_to(convert_type(inner, records, location)?),
        AstType::Struct(name) => records
            .get(name)
            .map(|info| info.ir_type.clone())
            .ok_or_else(|| CodegenError::UnknownRecord {
                name: name.clone(),
                location: location.clone(),
            })?,
    })
}

/// IR type of a parameter: records travel by address
pub fn convert_param_type(
    ast_type: &AstType,
    records: &HashMap<String, RecordInfo>,
    location: &SourceLocation,
) -> Result<IrType, CodegenError> {
    let ty = convert_type(ast_type, records, location)?;
    Ok(if ty.is_struct() { IrType::ptr_to(ty) } else { ty })
}

/// Whether a value of type `found` may be stored into a `target` location
pub fn is_assignable(target: &AstType, found: &AstType) -> bool {
    if target.is_integer() && found.is_integer() {
        return true;
    }
    match (target, found) {
        (AstType::String, AstType::String) => true,
        (AstType::String, AstType::Ptr(inner)) | (AstType::Ptr(inner), AstType::String) => {
            matches!(**inner, AstType::Char | AstType::I8 | AstType::U8)
        }
        (AstType::Ptr(a), AstType::Ptr(b)) => a == b || a.is_void() || b.is_void(),
        _ => false,
    }
}

pub fn check_assignable(target: &AstType, found: &AstType, location: &SourceLocation) -> Result<(), CodegenError> {
    if is_assignable(target, found) {
        Ok(())
    } else {
        Err(CodegenError::TypeMismatch {
            expected: target.clone(),
            found: found.clone(),
            location: location.clone(),
        })
    }
}
