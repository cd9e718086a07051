//! Statement nodes

use super::{AstType, Expression};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    #[serde(default)]
    pub line: u32,
    #[serde(flatten)]
    pub kind: StatementKind,
}

impl Statement {
    pub fn new(line: u32, kind: StatementKind) -> Self {
        Self { line, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElifClause {
    pub condition: Expression,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stmt", rename_all = "snake_case")]
pub enum StatementKind {
    VarDecl {
        name: String,
        ty: AstType,
        #[serde(default)]
        init: Option<Expression>,
    },
    /// Local record variable, fields set to their declared defaults
    RecordDecl {
        name: String,
        record: String,
        #[serde(default)]
        no_init: bool,
    },
    Assign {
        name: String,
        value: Expression,
    },
    IndexAssign {
        name: String,
        index: Expression,
        value: Expression,
    },
    FieldAssign {
        name: String,
        field: String,
        value: Expression,
    },
    Call {
        name: String,
        args: Vec<Expression>,
    },
    Return {
        #[serde(default)]
        value: Option<Expression>,
    },
    If {
        condition: Expression,
        body: Vec<Statement>,
        #[serde(default)]
        elifs: Vec<ElifClause>,
        #[serde(default)]
        else_body: Option<Vec<Statement>>,
    },
    While {
        condition: Expression,
        body: Vec<Statement>,
    },
    Break,
    Continue,
}
