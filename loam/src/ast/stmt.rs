//! Statement AST nodes

use super::{Expr, Span, Spanned};
use serde::{Deserialize, Serialize};

/// Statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stmt {
    /// Expression evaluated for its side effects, result discarded
    Expression(Spanned<Expr>),

    /// print expr;
    Print(Spanned<Expr>),

    /// var name = init;  (init defaults to nil)
    Var {
        name: Spanned<String>,
        init: Option<Spanned<Expr>>,
    },

    /// { ... } — runs in a fresh child scope
    Block(Vec<Spanned<Stmt>>),

    /// if (cond) then_branch else else_branch
    If {
        cond: Spanned<Expr>,
        then_branch: Box<Spanned<Stmt>>,
        else_branch: Option<Box<Spanned<Stmt>>>,
    },

    /// while (cond) body
    While {
        cond: Spanned<Expr>,
        body: Box<Spanned<Stmt>>,
    },

    /// fun name(params) { body }
    Function(FunctionDecl),

    /// return value;  (value defaults to nil)
    Return {
        keyword: Span,
        value: Option<Spanned<Expr>>,
    },

    /// class name < superclass { methods }
    Class {
        name: Spanned<String>,
        /// Superclass reference, constrained by the parser to a `Variable`
        superclass: Option<Box<Spanned<Expr>>>,
        methods: Vec<FunctionDecl>,
    },
}

/// A function or method declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: Spanned<String>,
    pub params: Vec<Spanned<String>>,
    pub body: Vec<Spanned<Stmt>>,
    pub span: Span,
}
