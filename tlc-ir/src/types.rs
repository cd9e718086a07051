//! IR Type System
//!
//! Integer types are signless; signedness is a property of the opcode
//! (`SDiv` vs `UDiv`). Records are laid out in declaration order with each
//! field aligned to its own alignment.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IrType {
    Void,
    I8,
    I16,
    I32,
    I64,
    /// Pointer to a value of the inner type
    Ptr(Box<IrType>),
    /// Named record with ordered fields
    Struct { name: String, fields: Vec<IrType> },
}

fn align_up(value: u32, align: u32) -> u32 {
    if align <= 1 {
        value
    } else {
        value.div_ceil(align) * align
    }
}

impl IrType {
    pub fn ptr_to(pointee: IrType) -> Self {
        IrType::Ptr(Box::new(pointee))
    }

    /// Size of this type in bytes; `void` occupies nothing
    pub fn size_in_bytes(&self) -> u32 {
        match self {
            IrType::Void => 0,
            IrType::I8 => 1,
            IrType::I16 => 2,
            IrType::I32 => 4,
            IrType::I64 | IrType::Ptr(_) => 8,
            IrType::Struct { fields, .. } => {
                let mut size = 0;
                for field in fields {
                    size = align_up(size, field.alignment()) + field.size_in_bytes();
                }
                align_up(size, self.alignment())
            }
        }
    }

    pub fn alignment(&self) -> u32 {
        match self {
            IrType::Void => 1,
            IrType::Struct { fields, .. } => {
                fields.iter().map(IrType::alignment).max().unwrap_or(1)
            }
            scalar => scalar.size_in_bytes(),
        }
    }

    /// Bit width of integer and pointer types
    pub fn bits(&self) -> Option<u32> {
        match self {
            IrType::I8 => Some(8),
            IrType::I16 => Some(16),
            IrType::I32 => Some(32),
            IrType::I64 | IrType::Ptr(_) => Some(64),
            IrType::Void | IrType::Struct { .. } => None,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, IrType::Void)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, IrType::I8 | IrType::I16 | IrType::I32 | IrType::I64)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, IrType::Ptr(_))
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, IrType::Struct { .. })
    }

    pub fn pointee(&self) -> Option<&IrType> {
        match self {
            IrType::Ptr(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn field(&self, index: usize) -> Option<&IrType> {
        match self {
            IrType::Struct { fields, .. } => fields.get(index),
            _ => None,
        }
    }

    /// Byte offset of field `index` from the start of the record
    pub fn field_offset(&self, index: usize) -> Option<u32> {
        let IrType::Struct { fields, .. } = self else {
            return None;
        };
        if index >= fields.len() {
            return None;
        }
        let mut offset = 0;
        for field in &fields[..index] {
            offset = align_up(offset, field.alignment()) + field.size_in_bytes();
        }
        Some(align_up(offset, fields[index].alignment()))
    }

    /// Truncate `value` to this type's width and sign-extend it back
    pub fn wrap(&self, value: i64) -> i64 {
        match self.bits() {
            Some(8) => value as i8 as i64,
            Some(16) => value as i16 as i64,
            Some(32) => value as i32 as i64,
            _ => value,
        }
    }

    /// Truncate `value` to this type's width and zero-extend it
    pub fn zero_extend(&self, value: i64) -> u64 {
        match self.bits() {
            Some(8) => value as u8 as u64,
            Some(16) => value as u16 as u64,
            Some(32) => value as u32 as u64,
            _ => value as u64,
        }
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::Void => write!(f, "void"),
            IrType::I8 => write!(f, "i8"),
            IrType::I16 => write!(f, "i16"),
            IrType::I32 => write!(f, "i32"),
            IrType::I64 => write!(f, "i64"),
            IrType::Ptr(inner) => write!(f, "*{}", inner),
            IrType::Struct { name, fields } => {
                write!(f, "{}{{", name)?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", field)?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn point() -> IrType {
        IrType::Struct {
            name: "Point".to_string(),
            fields: vec![IrType::I8, IrType::I32, IrType::I16],
        }
    }

    #[test]
    fn test_scalar_sizes() {
        assert_eq!(IrType::I8.size_in_bytes(), 1);
        assert_eq!(IrType::I16.size_in_bytes(), 2);
        assert_eq!(IrType::I32.size_in_bytes(), 4);
        assert_eq!(IrType::I64.size_in_bytes(), 8);
        assert_eq!(IrType::ptr_to(IrType::I8).size_in_bytes(), 8);
        assert_eq!(IrType::Void.size_in_bytes(), 0);
    }

    #[test]
    fn test_struct_layout() {
        let ty = point();
        assert_eq!(ty.field_offset(0), Some(0));
        assert_eq!(ty.field_offset(1), Some(4));
        assert_eq!(ty.field_offset(2), Some(8));
        assert_eq!(ty.field_offset(3), None);
        assert_eq!(ty.size_in_bytes(), 12);
        assert_eq!(ty.alignment(), 4);
    }

    #[test]
    fn test_wrap_and_zero_extend() {
        assert_eq!(IrType::I8.wrap(200), -56);
        assert_eq!(IrType::I32.wrap(i64::from(u32::MAX)), -1);
        assert_eq!(IrType::I64.wrap(-5), -5);
        assert_eq!(IrType::I8.zero_extend(-1), 255);
        assert_eq!(IrType::I16.zero_extend(-1), 65535);
    }

    #[test]
    fn test_display() {
        assert_eq!(IrType::ptr_to(IrType::I8).to_string(), "*i8");
        assert_eq!(point().to_string(), "Point{i8, i32, i16}");
    }
}
