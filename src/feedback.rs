//! Structured Feedback Module
//!
//! Provides machine-readable output for tooling:
//! - JSON error reports with stable codes and fix hints
//! - Lexer warnings for dropped input
//! - Front-end statistics

use serde::{Deserialize, Serialize};

use crate::frontend::lexer::LexDiagnostic;
use crate::frontend::Program;
use crate::utils::{Error, Span};

// ==================== Structured Error Report ====================

/// A structured error or warning report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Error code (e.g., "E0001")
    pub code: String,

    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    pub location: Option<Location>,

    /// Suggested fix, if there is an obvious one
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

/// Character range in the source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub start: usize,
    pub end: usize,
}

impl Location {
    fn new(file: &str, span: Span) -> Self {
        Self {
            file: file.to_string(),
            start: span.start,
            end: span.end,
        }
    }
}

// ==================== Front-end Report ====================

/// Complete front-end feedback for one file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub success: bool,

    pub source_file: String,

    /// All errors and warnings
    pub diagnostics: Vec<ErrorReport>,

    pub stats: Stats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub token_count: usize,
    pub statement_count: usize,
    /// Characters dropped by the lexer, whitespace included
    pub skipped_chars: usize,
}

// ==================== Error Conversion ====================

impl ErrorReport {
    /// Create an error report from a front-end error
    pub fn from_error(error: &Error, file_name: &str) -> Self {
        let (code, hint) = error_info(error);
        Self {
            code: code.to_string(),
            severity: Severity::Error,
            message: error.to_string(),
            location: error.span().map(|s| Location::new(file_name, s)),
            hint: hint.map(str::to_string),
        }
    }

    /// Create a warning report from a lexer diagnostic.
    ///
    /// Skipped whitespace is expected and yields `None`.
    pub fn from_diagnostic(diagnostic: &LexDiagnostic, file_name: &str) -> Option<Self> {
        let (code, message) = match diagnostic {
            LexDiagnostic::Unrecognized { ch, .. } if ch.is_whitespace() => return None,
            LexDiagnostic::Unrecognized { ch, .. } => {
                ("W0001", format!("Unrecognized character {:?} was skipped", ch))
            }
            LexDiagnostic::UnterminatedBoundary { rule, .. } => {
                ("W0002", format!("{} is never closed", rule))
            }
        };
        Some(Self {
            code: code.to_string(),
            severity: Severity::Warning,
            message,
            location: Some(Location::new(file_name, diagnostic.span())),
            hint: None,
        })
    }
}

/// Stable code and optional hint for each error kind
fn error_info(error: &Error) -> (&'static str, Option<&'static str>) {
    match error {
        Error::Syntax { .. } => (
            "E0001",
            Some("Put the number on its own line, or move it after a name"),
        ),
        Error::UnexpectedEnd { .. } => ("E0002", Some("Add an expression after '='")),
        Error::UnclosedParen { .. } => ("E0003", Some("Add the missing ')'")),
        Error::UnmatchedParen { .. } => ("E0004", Some("Remove the extra ')'")),
        Error::TrailingAfterGroup { .. } => (
            "E0014",
            Some("Close the group right after its nested group, or split the expression"),
        ),
        Error::DanglingPipe { .. } => ("E0005", Some("Add an expression after '|'")),
        Error::DanglingArrow { .. } => ("E0006", Some("Add a function body after '->'")),
        Error::EmptyExpression { .. } => ("E0007", None),
        Error::DepthLimit { .. } => ("E0008", Some("Flatten the expression or raise --max-depth")),
        Error::UnrecognizedInput { .. } => ("E0009", Some("Add a rule for this input or drop --strict")),
        Error::UnterminatedBoundary { .. } => ("E0010", Some("Add the closing delimiter")),
        Error::InvalidRule { .. } => ("E0011", None),
        Error::Config(_) => ("E0012", None),
        Error::Io(_) => ("E0013", None),
    }
}

impl Report {
    /// Create a successful report
    pub fn success(source_file: &str, program: &Program) -> Self {
        let diagnostics = program
            .diagnostics
            .iter()
            .filter_map(|d| ErrorReport::from_diagnostic(d, source_file))
            .collect();

        Self {
            success: true,
            source_file: source_file.to_string(),
            diagnostics,
            stats: Stats {
                token_count: program.tokens.len(),
                statement_count: program.statements.len(),
                skipped_chars: program.skipped_count(),
            },
        }
    }

    /// Create a failed report
    pub fn failure(source_file: &str, error: &Error) -> Self {
        Self {
            success: false,
            source_file: source_file.to_string(),
            diagnostics: vec![ErrorReport::from_error(error, source_file)],
            stats: Stats::default(),
        }
    }

    /// Output as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Output as compact JSON (for programmatic use)
    pub fn to_json_compact(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
