//! The single error sum type returned across the public API (spec §7).
//!
//! Mirrors the teacher's approach (`ParseError`, `ImplementationError`): a
//! plain enum, hand-written `Display`, no `thiserror`. Every variant carries
//! a [Location] (or `None` for errors raised before any location is known)
//! and a message, enough to reproduce the offending line for display.

use crate::source::{Location, SourceRegistry};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LangErrorKind {
    Tokenize,
    Ast,
    Name,
    Type,
    Inheritance,
    Value,
    Internal,
}

impl Display for LangErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LangErrorKind::Tokenize => "TokenizeError",
            LangErrorKind::Ast => "ASTError",
            LangErrorKind::Name => "NameError",
            LangErrorKind::Type => "TypeError",
            LangErrorKind::Inheritance => "InheritanceError",
            LangErrorKind::Value => "ValueError",
            LangErrorKind::Internal => "InternalError",
        };
        write!(f, "{}", s)
    }
}

/// The sum error type for tokenization, parsing, and semantic analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LangError {
    pub kind: LangErrorKind,
    pub location: Option<Location>,
    pub message: String,
}

impl LangError {
    pub fn new(kind: LangErrorKind, location: Option<Location>, message: impl Into<String>) -> Self {
        Self {
            kind,
            location,
            message: message.into(),
        }
    }

    pub fn tokenize(location: Location, message: impl Into<String>) -> Self {
        Self::new(LangErrorKind::Tokenize, Some(location), message)
    }

    pub fn ast(location: Location, message: impl Into<String>) -> Self {
        Self::new(LangErrorKind::Ast, Some(location), message)
    }

    pub fn name(location: Location, message: impl Into<String>) -> Self {
        Self::new(LangErrorKind::Name, Some(location), message)
    }

    pub fn type_error(location: Location, message: impl Into<String>) -> Self {
        Self::new(LangErrorKind::Type, Some(location), message)
    }

    pub fn inheritance(location: Location, message: impl Into<String>) -> Self {
        Self::new(LangErrorKind::Inheritance, Some(location), message)
    }

    pub fn value(location: Location, message: impl Into<String>) -> Self {
        Self::new(LangErrorKind::Value, Some(location), message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(LangErrorKind::Internal, None, message)
    }

    /// Render the error with the offending line of source text, the way the
    /// teacher's `Cache::create_error` appends `"Failed to parse at {}."`.
    pub fn render(&self, sources: &SourceRegistry) -> String {
        match self.location {
            Some(loc) => {
                let (name, line_text) = sources.describe(loc);
                let mut out = format!("{}: {} ({}:{}:{})", self.kind, self.message, name, loc.line, loc.column);
                if let Some(text) = line_text {
                    out.push('\n');
                    out.push_str(text);
                }
                out
            }
            None => format!("{}: {}", self.kind, self.message),
        }
    }
}

impl Display for LangError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.location {
            Some(loc) => write!(f, "{}: {} at {}", self.kind, self.message, loc),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for LangError {}

pub type LangResult<T> = Result<T, LangError>;
