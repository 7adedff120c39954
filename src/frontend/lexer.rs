//! Lexer for Pipescript
//!
//! Converts a character source into tokens by trying the rules of a
//! [`RuleSet`] in order at every cursor position. Input no rule matches
//! is skipped one character at a time and recorded as a diagnostic.

use log::{debug, trace};

use crate::frontend::rules::{Pattern, Rule, RuleSet};
use crate::frontend::source::CharSource;
use crate::frontend::token::Token;
use crate::utils::{Error, Result, Span};

/// Lexer behaviour switches
#[derive(Debug, Clone, Copy, Default)]
pub struct LexerOptions {
    /// Fail on unrecognized non-whitespace input and on unterminated
    /// boundaries instead of recording them
    pub strict: bool,
}

/// Recoverable events noticed while lexing
#[derive(Debug, Clone, PartialEq)]
pub enum LexDiagnostic {
    /// A character no rule matched; it was dropped
    Unrecognized { ch: char, span: Span },
    /// A boundary rule saw its start delimiter but never its end
    UnterminatedBoundary { rule: String, span: Span },
}

impl LexDiagnostic {
    pub fn span(&self) -> Span {
        match self {
            Self::Unrecognized { span, .. } | Self::UnterminatedBoundary { span, .. } => *span,
        }
    }
}

/// Result of a complete lexing pass
#[derive(Debug, Clone, Default)]
pub struct Lexed {
    pub tokens: Vec<Token>,
    pub diagnostics: Vec<LexDiagnostic>,
}

impl Lexed {
    /// Number of characters dropped because no rule matched them
    pub fn skipped_count(&self) -> usize {
        count_skipped(&self.diagnostics)
    }
}

/// Number of [`LexDiagnostic::Unrecognized`] entries in `diagnostics`
pub fn count_skipped(diagnostics: &[LexDiagnostic]) -> usize {
    diagnostics
        .iter()
        .filter(|d| matches!(d, LexDiagnostic::Unrecognized { .. }))
        .count()
}

enum Attempt {
    /// Token text plus the number of characters the match consumes
    Matched(String, usize),
    Missed,
    Unterminated,
}

impl Attempt {
    fn matched(value: String) -> Self {
        let len = value.chars().count();
        Attempt::Matched(value, len)
    }
}

/// The lexer state
pub struct Lexer<'r, S: CharSource> {
    source: S,
    rules: &'r RuleSet,
    options: LexerOptions,
}

impl<'r, S: CharSource> Lexer<'r, S> {
    pub fn new(source: S, rules: &'r RuleSet) -> Self {
        Self::with_options(source, rules, LexerOptions::default())
    }

    pub fn with_options(source: S, rules: &'r RuleSet, options: LexerOptions) -> Self {
        Self {
            source,
            rules,
            options,
        }
    }

    /// Run the lexer to the end of the input
    pub fn tokenize(mut self) -> Result<Lexed> {
        let mut lexed = Lexed::default();

        while let Some(ch) = self.source.peek() {
            let pos = self.source.position();

            match self.next_match(&mut lexed.diagnostics)? {
                Some((kind, value, len)) => {
                    let token = Token::new(kind, value, Span::new(pos, pos + len));
                    trace!("token {} at {}", token, token.span);
                    lexed.tokens.push(token);
                    self.source.advance(len);
                }
                None => {
                    let span = Span::new(pos, pos + 1);
                    if self.options.strict && !ch.is_whitespace() {
                        return Err(Error::UnrecognizedInput { ch, span });
                    }
                    debug!("skipping unrecognized {:?} at {}", ch, pos);
                    lexed.diagnostics.push(LexDiagnostic::Unrecognized { ch, span });
                    self.source.advance(1);
                }
            }
        }

        debug!(
            "lexed {} tokens, skipped {} characters",
            lexed.tokens.len(),
            lexed.skipped_count()
        );
        Ok(lexed)
    }

    /// First rule producing a non-empty match at the cursor
    fn next_match(
        &self,
        diagnostics: &mut Vec<LexDiagnostic>,
    ) -> Result<Option<(&'r str, String, usize)>> {
        let rules: &'r RuleSet = self.rules;
        let pos = self.source.position();

        for (name, rule) in rules.iter() {
            match self.try_rule(rule) {
                Attempt::Matched(value, len) if !value.is_empty() => {
                    return Ok(Some((name, value, len)))
                }
                Attempt::Unterminated => {
                    let span = Span::point(pos);
                    if self.options.strict {
                        return Err(Error::UnterminatedBoundary {
                            rule: name.to_string(),
                            span,
                        });
                    }
                    debug!("{} opened at {} is never closed", name, pos);
                    diagnostics.push(LexDiagnostic::UnterminatedBoundary {
                        rule: name.to_string(),
                        span,
                    });
                }
                _ => {}
            }
        }
        Ok(None)
    }

    fn try_rule(&self, rule: &Rule) -> Attempt {
        let pos = self.source.position();
        match rule {
            Rule::Equals(literal) => {
                if self.starts_with(pos, literal) {
                    Attempt::matched(literal.clone())
                } else {
                    Attempt::Missed
                }
            }
            Rule::OneOf(literals) => literals
                .iter()
                .find(|l| self.starts_with(pos, l))
                .map(|l| Attempt::matched(l.clone()))
                .unwrap_or(Attempt::Missed),
            Rule::Pattern(pattern) => Attempt::matched(self.match_pattern(pattern)),
            Rule::Boundary { start, end } => self.match_boundary(start, end),
        }
    }

    /// Check if `literal` occurs at `offset`
    fn starts_with(&self, offset: usize, literal: &str) -> bool {
        literal
            .chars()
            .enumerate()
            .all(|(i, c)| self.source.at(offset + i) == Some(c))
    }

    fn match_pattern(&self, pattern: &Pattern) -> String {
        let mut offset = self.source.position();
        let mut value = String::new();

        if let Some(head) = &pattern.head {
            match self.source.at(offset) {
                Some(c) if head.matches(c) => {
                    value.push(c);
                    offset += 1;
                }
                _ => return value,
            }
        }

        if let Some(tail) = &pattern.tail {
            let mut remaining = pattern.limit.clone();
            while let Some(c) = self.source.at(offset) {
                if !tail.matches(c) {
                    break;
                }
                // A used-up cap ends the match, keeping what we have
                if let Some(left) = remaining.get_mut(&c) {
                    if *left == 0 {
                        break;
                    }
                    *left -= 1;
                }
                value.push(c);
                offset += 1;
            }
        }

        value
    }

    /// `start` through the character before the next `end`; the end
    /// delimiter is consumed but not part of the value
    fn match_boundary(&self, start: &str, end: &str) -> Attempt {
        let pos = self.source.position();
        if !self.starts_with(pos, start) {
            return Attempt::Missed;
        }

        let mut offset = pos + start.chars().count();
        while self.source.at(offset).is_some() {
            if self.starts_with(offset, end) {
                let value = (pos..offset).filter_map(|i| self.source.at(i)).collect();
                let len = offset - pos + end.chars().count();
                return Attempt::Matched(value, len);
            }
            offset += 1;
        }
        Attempt::Unterminated
    }
}

/// Tokenize `source` with `rules`, recording rather than failing on bad input
pub fn tokenize<S: CharSource>(source: S, rules: &RuleSet) -> Result<Lexed> {
    Lexer::new(source, rules).tokenize()
}
