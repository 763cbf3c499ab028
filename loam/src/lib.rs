//! Loam interpreter library
//!
//! A tree-walking interpreter for a small dynamically typed, class-based
//! scripting language.

pub mod ast;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod resolver;

pub use ast::Span;
pub use error::{CompileError, Result};
