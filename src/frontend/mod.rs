//! Frontend module - Character sources, Rules, Lexer, Parser

pub mod source;
pub mod rules;
pub mod token;
pub mod lexer;
pub mod ast;
pub mod parser;

use log::debug;

use crate::utils::Result;
use ast::Statement;
use lexer::{count_skipped, LexDiagnostic, Lexer, LexerOptions};
use parser::{Parser, ParserOptions};
use rules::RuleSet;
use source::StrSource;
use token::Token;

/// Everything the front end produced for one source text
#[derive(Debug, Clone)]
pub struct Program {
    pub tokens: Vec<Token>,
    pub statements: Vec<Statement>,
    pub diagnostics: Vec<LexDiagnostic>,
}

impl Program {
    /// Characters the lexer dropped, whitespace included
    pub fn skipped_count(&self) -> usize {
        count_skipped(&self.diagnostics)
    }
}

/// Front-end settings
#[derive(Debug, Clone, Copy, Default)]
pub struct FrontendOptions {
    pub lexer: LexerOptions,
    pub parser: ParserOptions,
}

/// Lex `text` completely, then parse the tokens
pub fn parse_source(text: &str, rules: &RuleSet, options: FrontendOptions) -> Result<Program> {
    let lexed = Lexer::with_options(StrSource::new(text), rules, options.lexer).tokenize()?;
    let statements = Parser::with_options(&lexed.tokens, options.parser).parse_program()?;
    debug!("parsed {} statements from {} tokens", statements.len(), lexed.tokens.len());

    Ok(Program {
        tokens: lexed.tokens,
        statements,
        diagnostics: lexed.diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::{Assignment, Expression};
    use crate::utils::Error;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_program() {
        let rules = RuleSet::builtin().unwrap();
        let source = "/* squares */\n\nsq = x -> * x x\n\nnums | map sq | sum\n";
        let program = parse_source(source, &rules, FrontendOptions::default()).unwrap();

        assert_eq!(
            program.statements,
            vec![
                Statement::Assignment(Assignment {
                    name: "sq".into(),
                    expr: Expression::function(
                        vec!["x".into()],
                        Expression::call("*", vec![Expression::identity("x"), Expression::identity("x")])
                    ),
                }),
                Statement::Expression(Expression::identity("nums").with_pipe(vec![
                    Expression::call("map", vec![Expression::identity("sq")]),
                    Expression::identity("sum"),
                ])),
            ]
        );
        assert!(program.diagnostics.iter().all(|d| matches!(
            d,
            LexDiagnostic::Unrecognized { ch, .. } if ch.is_whitespace()
        )));
    }

    #[test]
    fn test_unrecognized_input_does_not_stop_parsing() {
        let rules = RuleSet::builtin().unwrap();
        let program = parse_source("#x", &rules, FrontendOptions::default()).unwrap();
        assert_eq!(program.statements, vec![Statement::Expression(Expression::identity("x"))]);
        assert_eq!(program.diagnostics.len(), 1);
        assert_eq!(program.skipped_count(), 1);
    }

    #[test]
    fn test_strict_lexing_fails_whole_pipeline() {
        let rules = RuleSet::builtin().unwrap();
        let options = FrontendOptions {
            lexer: LexerOptions { strict: true },
            ..FrontendOptions::default()
        };
        let err = parse_source("#x", &rules, options).unwrap_err();
        assert!(matches!(err, Error::UnrecognizedInput { ch: '#', .. }));
    }

    #[test]
    fn test_custom_rules_with_strings() {
        let rules = RuleSet::from_json(
            r#"{
                "IDENTITY": { "match": { "head": "[a-z]", "tail": "[a-z0-9]" } },
                "STRING": { "boundary": { "start": "\"", "end": "\"" } },
                "PIPE": { "equals": "|" }
            }"#,
        )
        .unwrap();
        let program = parse_source("greet \"bob\" | shout", &rules, FrontendOptions::default()).unwrap();
        assert_eq!(
            program.statements,
            vec![Statement::Expression(
                Expression::call(
                    "greet",
                    vec![Expression::value(ast::Value::String("\"bob".into()))]
                )
                .with_pipe(vec![Expression::identity("shout")])
            )]
        );
    }
}
