//! Diagnostics: a single fail-fast `CompileError` carrying a source snippet
//! and caret, per the four categories the pipeline can fail in.

use std::fmt::{self, Display};

use crate::token::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Lex,
    Parse,
    Type,
    ConstantEval,
}

impl Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorCategory::Lex => "lex error",
            ErrorCategory::Parse => "parse error",
            ErrorCategory::Type => "type error",
            ErrorCategory::ConstantEval => "constant evaluation error",
        })
    }
}

#[derive(Debug, Clone)]
pub struct CompileError {
    pub category: ErrorCategory,
    pub message: String,
    pub span: Span,
}

impl CompileError {
    pub fn new(category: ErrorCategory, message: impl Into<String>, span: Span) -> Self {
        CompileError {
            category,
            message: message.into(),
            span,
        }
    }

    pub fn lex(message: impl Into<String>, span: Span) -> Self {
        CompileError::new(ErrorCategory::Lex, message, span)
    }

    pub fn parse(message: impl Into<String>, span: Span) -> Self {
        CompileError::new(ErrorCategory::Parse, message, span)
    }

    pub fn ty(message: impl Into<String>, span: Span) -> Self {
        CompileError::new(ErrorCategory::Type, message, span)
    }

    pub fn constant_eval(message: impl Into<String>, span: Span) -> Self {
        CompileError::new(ErrorCategory::ConstantEval, message, span)
    }

    /// Renders the offending line from `source` with a caret under the
    /// span's start column, the way a reader expects from a one-shot
    /// compiler diagnostic.
    pub fn render(&self, source: &str) -> String {
        let line = source.lines().nth(self.span.line.saturating_sub(1)).unwrap_or("");
        let caret_col = self.span.col.saturating_sub(1);
        let caret = format!("{}^", " ".repeat(caret_col));
        format!(
            "{}: {}\n  --> line {}, column {}\n{}\n{}",
            self.category, self.message, self.span.line, self.span.col, line, caret
        )
    }
}

impl Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category, self.message)
    }
}

impl std::error::Error for CompileError {}
