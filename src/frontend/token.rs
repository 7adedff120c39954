//! Token definitions for Pipescript

use serde::Serialize;

use crate::utils::Span;

/// Token kind names the parser gives meaning to.
///
/// Kinds are rule names, so a rule set decides which of these ever appear.
pub mod kinds {
    pub const IDENTITY: &str = "IDENTITY";
    pub const NUMBER: &str = "NUMBER";
    pub const STRING: &str = "STRING";
    pub const OPERATOR: &str = "OPERATOR";
    pub const NEWLINE: &str = "NEWLINE";
    pub const ARROW: &str = "ARROW";
    pub const PAREN_OPEN: &str = "PAREN_OPEN";
    pub const PAREN_CLOSE: &str = "PAREN_CLOSE";
    pub const PIPE: &str = "PIPE";
    pub const EQUALS: &str = "EQUALS";
    pub const COMMENT: &str = "COMMENT";
}

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    /// Name of the rule that matched
    pub kind: String,
    /// Matched text, never empty
    pub value: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: impl Into<String>, value: impl Into<String>, span: Span) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
            span,
        }
    }

    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }

    pub fn is_any(&self, kinds: &[&str]) -> bool {
        kinds.iter().any(|k| self.is(k))
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:?}", self.kind, self.value)
    }
}
