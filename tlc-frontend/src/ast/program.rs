//! Top-level declarations

use super::{AstType, Expression, Statement};
use serde::{Deserialize, Serialize};

/// A whole translation unit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub records: Vec<RecordDecl>,
    #[serde(default)]
    pub externs: Vec<ExternDecl>,
    #[serde(default)]
    pub functions: Vec<FunctionDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordField {
    pub name: String,
    pub ty: AstType,
    #[serde(default)]
    pub default: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDecl {
    pub name: String,
    pub fields: Vec<RecordField>,
}

/// Function supplied by another object file or the runtime library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternDecl {
    pub name: String,
    pub params: Vec<AstType>,
    pub return_type: AstType,
    #[serde(default)]
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: AstType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<Param>,
    pub return_type: AstType,
    pub body: Vec<Statement>,
    /// File-scope function, not exported
    #[serde(default)]
    pub local: bool,
    #[serde(default)]
    pub line: u32,
}
