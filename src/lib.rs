//! Pipescript
//!
//! A rule-driven lexer and a recursive parser for a small language of
//! assignments, prefix calls, pipes and arrow functions.

pub mod feedback;
pub mod frontend;
pub mod utils;

pub use frontend::ast::{Assignment, Expression, ExpressionBody, FunctionCall, FunctionDefinition, Statement, Value};
pub use frontend::lexer::{tokenize, LexDiagnostic, Lexer, LexerOptions};
pub use frontend::parser::{parse_program, Parser, ParserOptions};
pub use frontend::rules::{Pattern, Rule, RuleSet};
pub use frontend::token::Token;
pub use frontend::{parse_source, FrontendOptions, Program};
pub use utils::{Error, Result, Span};
