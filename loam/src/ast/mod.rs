//! Abstract Syntax Tree definitions

mod expr;
mod span;
mod stmt;

pub use expr::*;
pub use span::*;
pub use stmt::*;

use serde::{Deserialize, Serialize};

/// A program is a sequence of top-level statements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub statements: Vec<Spanned<Stmt>>,
}
