//! Runtime errors for the interpreter

use crate::ast::Span;
use std::fmt;

/// Runtime error during interpretation, carrying the span of the offending
/// token for diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
    pub span: Span,
}

/// Kinds of runtime errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong operand kind for an operator
    TypeMismatch,
    /// Undefined variable
    UndefinedVariable,
    /// Undefined property on an instance
    UndefinedProperty,
    /// Non-callable value invoked
    NotCallable,
    /// Argument count does not match the callable's arity
    ArityMismatch,
    /// Superclass expression did not evaluate to a class
    InvalidSuperclass,
    /// Property access on a value that is not an instance
    NotAnInstance,
    /// Failure writing to the output channel
    Io,
}

impl RuntimeError {
    pub fn operand_not_number(span: Span) -> Self {
        RuntimeError {
            kind: ErrorKind::TypeMismatch,
            message: "operand must be a number".to_string(),
            span,
        }
    }

    pub fn operands_not_numbers(span: Span) -> Self {
        RuntimeError {
            kind: ErrorKind::TypeMismatch,
            message: "operands must be numbers".to_string(),
            span,
        }
    }

    pub fn bad_addition(left: &str, right: &str, span: Span) -> Self {
        RuntimeError {
            kind: ErrorKind::TypeMismatch,
            message: format!(
                "operands must be two numbers or two strings, got {left} + {right}"
            ),
            span,
        }
    }

    pub fn undefined_variable(name: &str, span: Span) -> Self {
        RuntimeError {
            kind: ErrorKind::UndefinedVariable,
            message: format!("undefined variable '{name}'"),
            span,
        }
    }

    pub fn undefined_property(name: &str, span: Span) -> Self {
        RuntimeError {
            kind: ErrorKind::UndefinedProperty,
            message: format!("undefined property '{name}'"),
            span,
        }
    }

    pub fn not_callable(got: &str, span: Span) -> Self {
        RuntimeError {
            kind: ErrorKind::NotCallable,
            message: format!("can only call functions and classes, got {got}"),
            span,
        }
    }

    pub fn arity_mismatch(expected: usize, got: usize, span: Span) -> Self {
        RuntimeError {
            kind: ErrorKind::ArityMismatch,
            message: format!("expected {expected} argument(s), got {got}"),
            span,
        }
    }

    pub fn invalid_superclass(got: &str, span: Span) -> Self {
        RuntimeError {
            kind: ErrorKind::InvalidSuperclass,
            message: format!("superclass must be a class, got {got}"),
            span,
        }
    }

    pub fn not_an_instance(got: &str, span: Span) -> Self {
        RuntimeError {
            kind: ErrorKind::NotAnInstance,
            message: format!("only instances have properties, got {got}"),
            span,
        }
    }

    pub fn io(err: std::io::Error, span: Span) -> Self {
        RuntimeError {
            kind: ErrorKind::Io,
            message: format!("output error: {err}"),
            span,
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Runtime error: {}", self.message)
    }
}

impl std::error::Error for RuntimeError {}

/// Result type for interpreter operations
pub type InterpResult<T> = Result<T, RuntimeError>;
