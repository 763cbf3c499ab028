//! Error types and reporting

use crate::ast::Span;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, CompileError>;

/// Error detected before execution begins
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Lexer error at {span}: {message}")]
    Lexer { message: String, span: Span },

    #[error("Parser error at {span}: {message}")]
    Parser { message: String, span: Span },

    /// Static resolution error (bad variable/this/super/return usage)
    #[error("Resolve error at {span}: {message}")]
    Resolve { message: String, span: Span },

    #[error("IO error: {message}")]
    Io { message: String },
}

impl CompileError {
    pub fn lexer(message: impl Into<String>, span: Span) -> Self {
        Self::Lexer {
            message: message.into(),
            span,
        }
    }

    pub fn parser(message: impl Into<String>, span: Span) -> Self {
        Self::Parser {
            message: message.into(),
            span,
        }
    }

    pub fn resolve(message: impl Into<String>, span: Span) -> Self {
        Self::Resolve {
            message: message.into(),
            span,
        }
    }

    pub fn io_error(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Lexer { span, .. } => Some(*span),
            Self::Parser { span, .. } => Some(*span),
            Self::Resolve { span, .. } => Some(*span),
            Self::Io { .. } => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Lexer { message, .. } => message,
            Self::Parser { message, .. } => message,
            Self::Resolve { message, .. } => message,
            Self::Io { message, .. } => message,
        }
    }
}

/// Report a compile error with ariadne
pub fn report_error(filename: &str, source: &str, error: &CompileError) {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let kind = match error {
        CompileError::Lexer { .. } => "Lexer",
        CompileError::Parser { .. } => "Parser",
        CompileError::Resolve { .. } => "Resolve",
        CompileError::Io { .. } => "IO",
    };

    if let Some(span) = error.span() {
        let _ = Report::build(ReportKind::Error, (filename, span.start..span.end))
            .with_message(format!("{kind} error"))
            .with_label(
                Label::new((filename, span.start..span.end))
                    .with_message(error.message())
                    .with_color(Color::Red),
            )
            .finish()
            .print((filename, Source::from(source)));
    } else {
        let _ = Report::build(ReportKind::Error, (filename, 0..0))
            .with_message(format!("{kind} error: {}", error.message()))
            .finish()
            .print((filename, Source::from(source)));
    }
}

/// Report a runtime error with ariadne, pointing at the offending token
pub fn report_runtime_error(filename: &str, source: &str, error: &crate::interp::RuntimeError) {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let span = error.span;
    let _ = Report::build(ReportKind::Error, (filename, span.start..span.end))
        .with_message("Runtime error")
        .with_label(
            Label::new((filename, span.start..span.end))
                .with_message(&error.message)
                .with_color(Color::Red),
        )
        .finish()
        .print((filename, Source::from(source)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_span() {
        let err = CompileError::parser("unexpected token", Span::new(3, 5));
        assert_eq!(err.span(), Some(Span::new(3, 5)));
        assert_eq!(err.message(), "unexpected token");
    }

    #[test]
    fn test_io_error_has_no_span() {
        let err = CompileError::io_error("file not found");
        assert_eq!(err.span(), None);
    }

    #[test]
    fn test_error_display() {
        let err = CompileError::resolve("oops", Span::new(0, 1));
        assert!(err.to_string().contains("Resolve error"));
        assert!(err.to_string().contains("oops"));
    }
}
