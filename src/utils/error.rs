//! Error handling for Pipescript

use crate::utils::Span;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Front-end error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ==================== Lexer Errors ====================

    #[error("Unrecognized input {ch:?} at offset {}", .span.start)]
    UnrecognizedInput { ch: char, span: Span },

    #[error("Unterminated {rule}: no closing delimiter after offset {}", .span.start)]
    UnterminatedBoundary { rule: String, span: Span },

    // ==================== Parser Errors ====================

    #[error("Syntax error: {message}")]
    Syntax { message: String, span: Span },

    #[error("Unexpected end of input: {context}")]
    UnexpectedEnd { context: String, span: Span },

    #[error("Unclosed parenthesis")]
    UnclosedParen { span: Span },

    #[error("Unmatched closing parenthesis")]
    UnmatchedParen { span: Span },

    #[error("Unexpected token after a nested group; the group must be closed here")]
    TrailingAfterGroup { span: Span },

    #[error("Pipe is not followed by an expression")]
    DanglingPipe { span: Span },

    #[error("Arrow is not followed by a function body")]
    DanglingArrow { span: Span },

    #[error("Expected expression")]
    EmptyExpression { span: Span },

    #[error("Expression nesting exceeds the limit of {limit}")]
    DepthLimit { limit: usize, span: Span },

    // ==================== Configuration Errors ====================

    #[error("Invalid rule {name}: {message}")]
    InvalidRule { name: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl Error {
    /// Get the span associated with this error
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::UnrecognizedInput { span, .. } => Some(*span),
            Self::UnterminatedBoundary { span, .. } => Some(*span),
            Self::Syntax { span, .. } => Some(*span),
            Self::UnexpectedEnd { span, .. } => Some(*span),
            Self::UnclosedParen { span } => Some(*span),
            Self::UnmatchedParen { span } => Some(*span),
            Self::TrailingAfterGroup { span } => Some(*span),
            Self::DanglingPipe { span } => Some(*span),
            Self::DanglingArrow { span } => Some(*span),
            Self::EmptyExpression { span } => Some(*span),
            Self::DepthLimit { span, .. } => Some(*span),
            Self::InvalidRule { .. } | Self::Config(_) | Self::Io(_) => None,
        }
    }

    pub(crate) fn invalid_rule(name: &str, message: impl Into<String>) -> Self {
        Self::InvalidRule {
            name: name.to_string(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}
