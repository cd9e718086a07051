//! Expression nodes

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    /// Short-circuit `and`
    And,
    /// Short-circuit `or`
    Or,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Lt | BinaryOp::Le
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "expr", rename_all = "snake_case")]
pub enum Expression {
    Int { value: i64 },
    Char { value: u8 },
    Bool { value: bool },
    Str { value: String },
    Ident { name: String },
    /// `name[index]` through a pointer or string variable
    Index { name: String, index: Box<Expression> },
    /// `name.field` of a record variable
    Field { name: String, field: String },
    Call { name: String, args: Vec<Expression> },
    Neg { operand: Box<Expression> },
    BitNot { operand: Box<Expression> },
    Binary {
        op: BinaryOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
}

impl Expression {
    pub fn int(value: i64) -> Self {
        Expression::Int { value }
    }

    pub fn ident(name: &str) -> Self {
        Expression::Ident { name: name.to_string() }
    }

    pub fn string(value: &str) -> Self {
        Expression::Str { value: value.to_string() }
    }

    pub fn call(name: &str, args: Vec<Expression>) -> Self {
        Expression::Call { name: name.to_string(), args }
    }

    pub fn binary(op: BinaryOp, lhs: Expression, rhs: Expression) -> Self {
        Expression::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Expression::Int { .. } | Expression::Char { .. } | Expression::Bool { .. }
        )
    }

    /// Whether lowering this expression emits a call or a store, after
    /// which previously computed register values are gone
    pub fn clobbers_registers(&self) -> bool {
        match self {
            Expression::Call { .. } => true,
            Expression::Binary { op, .. } if op.is_comparison() || op.is_logical() => true,
            Expression::Binary { lhs, rhs, .. } => lhs.clobbers_registers() || rhs.clobbers_registers(),
            Expression::Neg { operand } | Expression::BitNot { operand } => operand.clobbers_registers(),
            Expression::Index { index, .. } => index.clobbers_registers(),
            Expression::Int { .. }
            | Expression::Char { .. }
            | Expression::Bool { .. }
            | Expression::Str { .. }
            | Expression::Ident { .. }
            | Expression::Field { .. } => false,
        }
    }
}
