//! Expression AST nodes

use super::Spanned;
use serde::{Deserialize, Serialize};

/// Stable identity of a variable-reference occurrence.
///
/// Assigned by the parser, strictly increasing within a program. The resolver
/// keys its distance side table on these ids, so two occurrences of the same
/// name resolve independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExprId(pub u32);

/// Expression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    /// Literal constant
    Literal(Lit),

    /// Parenthesized expression
    Grouping(Box<Spanned<Expr>>),

    /// Unary operation
    Unary {
        op: UnOp,
        expr: Box<Spanned<Expr>>,
    },

    /// Binary operation
    Binary {
        left: Box<Spanned<Expr>>,
        op: BinOp,
        right: Box<Spanned<Expr>>,
    },

    /// Short-circuiting logical operation
    Logical {
        left: Box<Spanned<Expr>>,
        op: LogicOp,
        right: Box<Spanned<Expr>>,
    },

    /// Variable reference
    Variable { name: String, id: ExprId },

    /// Assignment to an existing variable
    Assign {
        name: String,
        id: ExprId,
        value: Box<Spanned<Expr>>,
    },

    /// Call: callee(args...)
    Call {
        callee: Box<Spanned<Expr>>,
        args: Vec<Spanned<Expr>>,
    },

    /// Property read: object.name
    Get {
        object: Box<Spanned<Expr>>,
        name: Spanned<String>,
    },

    /// Property write: object.name = value
    Set {
        object: Box<Spanned<Expr>>,
        name: Spanned<String>,
        value: Box<Spanned<Expr>>,
    },

    /// Method receiver reference
    This { id: ExprId },

    /// Superclass method reference: super.method
    Super {
        id: ExprId,
        method: Spanned<String>,
    },
}

/// Literal value embedded in the tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Lit {
    Number(f64),
    Str(String),
    Bool(bool),
    Nil,
}

/// Binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl std::fmt::Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinOp::Add => write!(f, "+"),
            BinOp::Sub => write!(f, "-"),
            BinOp::Mul => write!(f, "*"),
            BinOp::Div => write!(f, "/"),
            BinOp::Eq => write!(f, "=="),
            BinOp::Ne => write!(f, "!="),
            BinOp::Lt => write!(f, "<"),
            BinOp::Gt => write!(f, ">"),
            BinOp::Le => write!(f, "<="),
            BinOp::Ge => write!(f, ">="),
        }
    }
}

/// Short-circuiting logical operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicOp {
    And,
    Or,
}

impl std::fmt::Display for LogicOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogicOp::And => write!(f, "and"),
            LogicOp::Or => write!(f, "or"),
        }
    }
}

/// Unary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnOp {
    /// Numeric negation (-)
    Neg,
    /// Logical not (!)
    Not,
}

impl std::fmt::Display for UnOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnOp::Neg => write!(f, "-"),
            UnOp::Not => write!(f, "!"),
        }
    }
}
