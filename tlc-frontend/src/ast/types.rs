//! Source-level types

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AstType {
    #[default]
    Void,
    Bool,
    Char,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    /// Pointer to NUL-terminated characters
    String,
    Ptr(Box<AstType>),
    /// Record type by name
    Struct(String),
}

impl AstType {
    pub fn ptr_to(inner: AstType) -> Self {
        AstType::Ptr(Box::new(inner))
    }

    /// Integer-like types, including `bool` and `char`
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            AstType::Bool
                | AstType::Char
                | AstType::I8
                | AstType::U8
                | AstType::I16
                | AstType::U16
                | AstType::I32
                | AstType::U32
                | AstType::I64
                | AstType::U64
        )
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            AstType::Bool | AstType::U8 | AstType::U16 | AstType::U32 | AstType::U64
        )
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, AstType::Ptr(_) | AstType::String)
    }

    pub fn is_record(&self) -> bool {
        matches!(self, AstType::Struct(_))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, AstType::Void)
    }

    /// Element type reached by indexing
    pub fn element(&self) -> Option<AstType> {
        match self {
            AstType::Ptr(inner) => Some((**inner).clone()),
            AstType::String => Some(AstType::Char),
            _ => None,
        }
    }
}

impl fmt::Display for AstType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstType::Void => write!(f, "void"),
            AstType::Bool => write!(f, "bool"),
            AstType::Char => write!(f, "char"),
            AstType::I8 => write!(f, "i8"),
            AstType::U8 => write!(f, "u8"),
            AstType::I16 => write!(f, "i16"),
            AstType::U16 => write!(f, "u16"),
            AstType::I32 => write!(f, "i32"),
            AstType::U32 => write!(f, "u32"),
            AstType::I64 => write!(f, "i64"),
            AstType::U64 => write!(f, "u64"),
            AstType::String => write!(f, "string"),
            AstType::Ptr(inner) => write!(f, "ptr {}", inner),
            AstType::Struct(name) => write!(f, "{}", name),
        }
    }
}
