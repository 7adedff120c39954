//! Parser for Pipescript
//!
//! Recursive descent over a finished token list. There is no operator
//! precedence: an expression is a single flat call, a value, or an arrow
//! function, optionally followed by pipe stages.
//!
//! Each recursive read is a pure function of `(start index, frame)` that
//! returns the built expression together with the index of the last token
//! it consumed and the reason it stopped. Callers resume at `last + 1`.

use log::{debug, trace};

use crate::frontend::ast::{Assignment, Expression, Statement, Value};
use crate::frontend::token::{kinds, Token};
use crate::utils::{Error, Result, Span};

/// Default bound on nested parens, pipes and arrows
pub const DEFAULT_MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy)]
pub struct ParserOptions {
    /// Maximum recursion depth before failing with [`Error::DepthLimit`]
    pub max_depth: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// What a recursive read is parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    /// Right-hand side of an assignment or a bare expression statement
    Statement,
    /// Inside `( ... )`
    Group,
    /// After a `|`
    Stage,
    /// After a `->`
    Body,
}

/// Why a read stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    /// No tokens left
    End,
    /// Second consecutive newline (consumed)
    Newline,
    /// Closing paren. A group consumes it; stages and bodies leave it
    Close,
    /// Next pipe, left for the owning expression
    Pipe,
    /// Right after a nested group
    Group,
    /// Bare number literal
    Literal,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    role: Role,
    /// Some enclosing frame is a group
    in_group: bool,
    depth: usize,
    /// Token that opened this read, for error locations
    origin: usize,
}

impl Frame {
    fn statement(origin: usize) -> Self {
        Self {
            role: Role::Statement,
            in_group: false,
            depth: 0,
            origin,
        }
    }

    fn child(&self, role: Role, origin: usize) -> Self {
        Self {
            role,
            in_group: self.in_group || role == Role::Group,
            depth: self.depth + 1,
            origin,
        }
    }
}

struct Scan {
    expr: Expression,
    last: usize,
    stop: Stop,
}

pub struct Parser<'t> {
    tokens: &'t [Token],
    options: ParserOptions,
}

impl<'t> Parser<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        Self::with_options(tokens, ParserOptions::default())
    }

    pub fn with_options(tokens: &'t [Token], options: ParserOptions) -> Self {
        Self { tokens, options }
    }

    /// Parse every statement in the token list
    pub fn parse_program(&self) -> Result<Vec<Statement>> {
        let mut statements = Vec::new();
        let mut i = 0;

        while let Some(token) = self.tokens.get(i) {
            if token.is(kinds::COMMENT) {
                i += 1;
                continue;
            }

            if token.is(kinds::IDENTITY) && self.peek_is(i + 1, kinds::EQUALS) {
                let scan = self.scan(i + 2, Frame::statement(i + 1))?;
                statements.push(Statement::Assignment(Assignment {
                    name: token.value.clone(),
                    expr: scan.expr,
                }));
                i = scan.last + 1;
            } else if token.is_any(&[
                kinds::IDENTITY,
                kinds::NUMBER,
                kinds::OPERATOR,
                kinds::STRING,
                kinds::PAREN_OPEN,
            ]) {
                let scan = self.scan(i, Frame::statement(i))?;
                statements.push(Statement::Expression(scan.expr));
                i = scan.last + 1;
            } else if token.is(kinds::PAREN_CLOSE) {
                return Err(Error::UnmatchedParen { span: token.span });
            } else {
                i += 1;
                continue;
            }

            if let Some(stmt) = statements.last() {
                debug!("parsed statement {:?}", stmt);
            }
        }

        Ok(statements)
    }

    /// Read one expression starting at `index`.
    ///
    /// Returns the expression and the index of the last token it consumed.
    pub fn read_expression(&self, index: usize) -> Result<(Expression, usize)> {
        let scan = self.scan(index, Frame::statement(index))?;
        Ok((scan.expr, scan.last))
    }

    fn scan(&self, start: usize, frame: Frame) -> Result<Scan> {
        if frame.depth > self.options.max_depth {
            return Err(Error::DepthLimit {
                limit: self.options.max_depth,
                span: self.span_at(frame.origin),
            });
        }

        let Some(first) = self.tokens.get(start) else {
            return Err(self.missing(frame));
        };

        // Numbers never start a larger expression
        if first.is(kinds::NUMBER) {
            return match self.tokens.get(start + 1) {
                Some(next) if !next.is(kinds::NEWLINE) => Err(Error::Syntax {
                    message: format!(
                        "Expressions that begin with a number cannot be followed by anything else (found {})",
                        next
                    ),
                    span: next.span,
                }),
                _ => Ok(Scan {
                    expr: Expression::number(first.value.clone()),
                    last: start,
                    stop: Stop::Literal,
                }),
            };
        }

        let mut buf: Vec<Expression> = Vec::new();
        let mut operator: Option<String> = None;
        let mut pipe: Vec<Expression> = Vec::new();
        let mut function: Option<Expression> = None;
        let mut newline = false;

        let mut last = self.tokens.len() - 1;
        let mut stop = Stop::End;
        let mut i = start;

        while let Some(token) = self.tokens.get(i) {
            trace!("{:?} frame at depth {} reads {}", frame.role, frame.depth, token);

            if !token.is(kinds::NEWLINE) {
                newline = false;
            }

            match token.kind.as_str() {
                kinds::IDENTITY => buf.push(Expression::identity(token.value.clone())),
                kinds::NUMBER => buf.push(Expression::number(token.value.clone())),
                kinds::STRING => buf.push(Expression::value(Value::String(token.value.clone()))),
                // Last operator wins
                kinds::OPERATOR => operator = Some(token.value.clone()),
                kinds::NEWLINE => {
                    if newline {
                        last = i;
                        stop = Stop::Newline;
                        break;
                    }
                    newline = true;
                }
                kinds::ARROW => {
                    let params = self.tokens[start..i].iter().map(|t| t.value.clone()).collect();
                    let body = self.scan(i + 1, frame.child(Role::Body, i))?;
                    function = Some(Expression::function(params, body.expr));
                    last = body.last;
                    stop = body.stop;
                    // The body left our closing paren for us
                    if stop == Stop::Close && frame.role == Role::Group {
                        last += 1;
                    }
                    break;
                }
                kinds::PAREN_OPEN => {
                    let group = self.scan(i + 1, frame.child(Role::Group, i))?;
                    if group.stop != Stop::Close {
                        return Err(Error::UnclosedParen { span: token.span });
                    }
                    buf.push(group.expr);
                    last = group.last;
                    stop = Stop::Group;
                    break;
                }
                kinds::PAREN_CLOSE => {
                    if frame.role == Role::Group {
                        last = i;
                    } else if frame.in_group {
                        last = i - 1;
                    } else {
                        return Err(Error::UnmatchedParen { span: token.span });
                    }
                    stop = Stop::Close;
                    break;
                }
                kinds::PIPE => {
                    if frame.role == Role::Stage {
                        last = i - 1;
                        stop = Stop::Pipe;
                        break;
                    }
                    let stage = self.scan(i + 1, frame.child(Role::Stage, i))?;
                    pipe.push(stage.expr);
                    if matches!(stage.stop, Stop::Newline | Stop::End) {
                        last = stage.last;
                        stop = stage.stop;
                        break;
                    }
                    i = stage.last + 1;
                    continue;
                }
                _ => {}
            }
            i += 1;
        }

        // A group owns the paren that follows whatever ended its scan.
        // A nested group ends the scan, so nothing else may follow it.
        if frame.role == Role::Group && stop != Stop::Close {
            match self.tokens.get(last + 1) {
                Some(next) if next.is(kinds::PAREN_CLOSE) => {
                    last += 1;
                    stop = Stop::Close;
                }
                Some(next) if stop == Stop::Group => {
                    return Err(Error::TrailingAfterGroup { span: next.span });
                }
                _ => {}
            }
        }

        let mut expr = match (function, operator) {
            (Some(function), _) => function,
            (None, Some(name)) => Expression::call(name, buf),
            (None, None) => self.resolve_head(buf, frame)?,
        };
        expr.pipe.extend(pipe);

        Ok(Scan { expr, last, stop })
    }

    /// Without an operator the first buffered expression names the call
    fn resolve_head(&self, mut buf: Vec<Expression>, frame: Frame) -> Result<Expression> {
        if buf.is_empty() {
            return Err(self.empty(frame));
        }
        if buf.len() == 1 {
            return Ok(buf.remove(0));
        }

        // Groups end the scan, so only the last item can be a group
        let head = buf.remove(0);
        match head.literal() {
            Some(name) => Ok(Expression::call(name, buf)),
            None => Err(Error::Syntax {
                message: "A parenthesized group cannot be called".to_string(),
                span: self.span_at(frame.origin),
            }),
        }
    }

    /// The read started past the last token
    fn missing(&self, frame: Frame) -> Error {
        let span = self.span_at(frame.origin);
        match frame.role {
            Role::Stage => Error::DanglingPipe { span },
            Role::Body => Error::DanglingArrow { span },
            Role::Group => Error::UnclosedParen { span },
            Role::Statement => Error::UnexpectedEnd {
                context: "expected an expression".to_string(),
                span,
            },
        }
    }

    /// The read found nothing to build an expression from
    fn empty(&self, frame: Frame) -> Error {
        let span = self.span_at(frame.origin);
        match frame.role {
            Role::Stage => Error::DanglingPipe { span },
            Role::Body => Error::DanglingArrow { span },
            Role::Group | Role::Statement => Error::EmptyExpression { span },
        }
    }

    fn peek_is(&self, index: usize, kind: &str) -> bool {
        self.tokens.get(index).map_or(false, |t| t.is(kind))
    }

    fn span_at(&self, index: usize) -> Span {
        match self.tokens.get(index).or(self.tokens.last()) {
            Some(token) => token.span,
            None => Span::dummy(),
        }
    }
}

/// Parse a token list with default options
pub fn parse_program(tokens: &[Token]) -> Result<Vec<Statement>> {
    Parser::new(tokens).parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::tokenize;
    use crate::frontend::rules::RuleSet;
    use crate::frontend::source::StrSource;
    use pretty_assertions::assert_eq;

    fn lex(input: &str) -> Vec<Token> {
        let rules = RuleSet::builtin().unwrap();
        tokenize(StrSource::new(input), &rules).unwrap().tokens
    }

    fn parse(input: &str) -> Result<Vec<Statement>> {
        parse_program(&lex(input))
    }

    fn single(input: &str) -> Expression {
        let mut stmts = parse(input).unwrap();
        assert_eq!(stmts.len(), 1, "Expected one statement for {:?}", input);
        match stmts.remove(0) {
            Statement::Expression(expr) => expr,
            other => panic!("Expected expression statement, got {:?}", other),
        }
    }

    fn id(name: &str) -> Expression {
        Expression::identity(name)
    }

    #[test]
    fn test_assignment_of_number() {
        let stmts = parse("x = 1").unwrap();
        assert_eq!(
            stmts,
            vec![Statement::Assignment(Assignment {
                name: "x".to_string(),
                expr: Expression::number("1"),
            })]
        );
    }

    #[test]
    fn test_pipe_chaining() {
        let expr = single("a |b |c");
        assert_eq!(expr, id("a").with_pipe(vec![id("b"), id("c")]));
    }

    #[test]
    fn test_arrow_function() {
        let expr = single("x -> x");
        assert_eq!(expr, Expression::function(vec!["x".into()], id("x")));
    }

    #[test]
    fn test_number_continuation_fails() {
        let err = parse("1 x").unwrap_err();
        assert!(matches!(err, Error::Syntax { .. }), "got {:?}", err);
    }

    #[test]
    fn test_number_before_newline_is_fine() {
        let stmts = parse("1\nx").unwrap();
        assert_eq!(
            stmts,
            vec![Statement::Expression(Expression::number("1")), Statement::Expression(id("x"))]
        );
    }

    #[test]
    fn test_call_takes_head_as_name() {
        let expr = single("add a 2");
        assert_eq!(expr, Expression::call("add", vec![id("a"), Expression::number("2")]));
    }

    #[test]
    fn test_operator_call_keeps_all_args() {
        let expr = single("a + b");
        assert_eq!(expr, Expression::call("+", vec![id("a"), id("b")]));
    }

    #[test]
    fn test_last_operator_wins() {
        let expr = single("a + b * c");
        assert_eq!(expr, Expression::call("*", vec![id("a"), id("b"), id("c")]));
    }

    #[test]
    fn test_operator_statement() {
        let expr = single("+ a b");
        assert_eq!(expr, Expression::call("+", vec![id("a"), id("b")]));
    }

    #[test]
    fn test_params_are_raw_token_text() {
        let stmts = parse("f = a + b -> b").unwrap();
        assert_eq!(
            stmts,
            vec![Statement::Assignment(Assignment {
                name: "f".into(),
                expr: Expression::function(vec!["a".into(), "+".into(), "b".into()], id("b")),
            })]
        );
    }

    #[test]
    fn test_arrow_body_owns_its_pipes() {
        let expr = single("x -> x | inc | dbl");
        assert_eq!(
            expr,
            Expression::function(vec!["x".into()], id("x").with_pipe(vec![id("inc"), id("dbl")]))
        );
    }

    #[test]
    fn test_single_newline_continues() {
        let expr = single("f a\nb");
        assert_eq!(expr, Expression::call("f", vec![id("a"), id("b")]));
    }

    #[test]
    fn test_double_newline_ends_statement() {
        let stmts = parse("f a\n\ng b").unwrap();
        assert_eq!(
            stmts,
            vec![
                Statement::Expression(Expression::call("f", vec![id("a")])),
                Statement::Expression(Expression::call("g", vec![id("b")])),
            ]
        );
    }

    #[test]
    fn test_newlines_must_be_consecutive() {
        let expr = single("f a\nb\nc");
        assert_eq!(expr, Expression::call("f", vec![id("a"), id("b"), id("c")]));
    }

    #[test]
    fn test_pipe_stage_ending_statement() {
        let stmts = parse("a | b\n\nc d").unwrap();
        assert_eq!(
            stmts,
            vec![
                Statement::Expression(id("a").with_pipe(vec![id("b")])),
                Statement::Expression(Expression::call("c", vec![id("d")])),
            ]
        );
    }

    #[test]
    fn test_paren_group_argument() {
        let expr = single("f (g x)");
        assert_eq!(expr, Expression::call("f", vec![Expression::call("g", vec![id("x")])]));
    }

    #[test]
    fn test_group_statement_is_transparent() {
        let expr = single("(g x)");
        assert_eq!(expr, Expression::call("g", vec![id("x")]));
    }

    #[test]
    fn test_nested_groups() {
        let expr = single("f ((a b))");
        assert_eq!(expr, Expression::call("f", vec![Expression::call("a", vec![id("b")])]));
    }

    #[test]
    fn test_group_ends_enclosing_scan() {
        let stmts = parse("f (a) b").unwrap();
        assert_eq!(
            stmts,
            vec![
                Statement::Expression(Expression::call("f", vec![id("a")])),
                Statement::Expression(id("b")),
            ]
        );
    }

    #[test]
    fn test_pipes_inside_group() {
        let expr = single("f (a | b | c)");
        assert_eq!(
            expr,
            Expression::call("f", vec![id("a").with_pipe(vec![id("b"), id("c")])])
        );
    }

    #[test]
    fn test_arrow_inside_group() {
        let expr = single("map (x -> * x x)");
        assert_eq!(
            expr,
            Expression::call(
                "map",
                vec![Expression::function(
                    vec!["x".into()],
                    Expression::call("*", vec![id("x"), id("x")])
                )]
            )
        );
    }

    #[test]
    fn test_group_as_pipe_stage() {
        let expr = single("a | (f b) | c");
        assert_eq!(
            expr,
            id("a").with_pipe(vec![Expression::call("f", vec![id("b")]), id("c")])
        );
    }

    #[test]
    fn test_comments_are_skipped_between_statements() {
        let stmts = parse("/* note */\n\nx = 1").unwrap();
        assert_eq!(stmts.len(), 1);
        assert!(matches!(&stmts[0], Statement::Assignment(a) if a.name == "x"));
    }

    #[test]
    fn test_read_expression_reports_last_index() {
        let tokens = lex("f a\n\ng");
        let parser = Parser::new(&tokens);
        let (expr, last) = parser.read_expression(0).unwrap();
        assert_eq!(expr, Expression::call("f", vec![id("a")]));
        assert_eq!(last, 3);
        assert!(tokens[last].is(kinds::NEWLINE));
    }

    #[test]
    fn test_unclosed_paren() {
        assert!(matches!(parse("f (a b").unwrap_err(), Error::UnclosedParen { .. }));
        assert!(matches!(parse("f (").unwrap_err(), Error::UnclosedParen { .. }));
    }

    #[test]
    fn test_unmatched_paren() {
        let err = parse("f a)").unwrap_err();
        assert_eq!(err, Error::UnmatchedParen { span: Span::new(3, 4) });
        assert!(matches!(parse("f (a))").unwrap_err(), Error::UnmatchedParen { .. }));
    }

    #[test]
    fn test_dangling_pipe() {
        assert!(matches!(parse("a |").unwrap_err(), Error::DanglingPipe { .. }));
        assert!(matches!(parse("a | | b").unwrap_err(), Error::DanglingPipe { .. }));
        assert!(matches!(parse("f (a |)").unwrap_err(), Error::DanglingPipe { .. }));
    }

    #[test]
    fn test_dangling_arrow() {
        let err = parse("f = x ->").unwrap_err();
        assert_eq!(err, Error::DanglingArrow { span: Span::new(6, 8) });
    }

    #[test]
    fn test_missing_assignment_value() {
        assert!(matches!(parse("x =").unwrap_err(), Error::UnexpectedEnd { .. }));
        assert!(matches!(parse("x = \n\n").unwrap_err(), Error::EmptyExpression { .. }));
        assert!(matches!(parse("f ()").unwrap_err(), Error::EmptyExpression { .. }));
    }

    #[test]
    fn test_error_discards_earlier_statements() {
        let result = parse("a = b\n\n1 c");
        assert!(result.is_err());
    }

    #[test]
    fn test_depth_limit() {
        let tokens = lex("f (a (b (c d)))");
        let shallow = Parser::with_options(&tokens, ParserOptions { max_depth: 2 });
        assert!(matches!(
            shallow.parse_program().unwrap_err(),
            Error::DepthLimit { limit: 2, .. }
        ));

        let deep = Parser::with_options(&tokens, ParserOptions { max_depth: 3 });
        assert!(deep.parse_program().is_ok());
    }

    #[test]
    fn test_pathological_nesting_is_bounded() {
        let input = format!("f {}x{}", "(".repeat(10_000), ")".repeat(10_000));
        let err = parse(&input).unwrap_err();
        assert!(matches!(err, Error::DepthLimit { limit: DEFAULT_MAX_DEPTH, .. }));
    }

    #[test]
    fn test_empty_token_list() {
        assert_eq!(parse("").unwrap(), vec![]);
        assert_eq!(parse("   \n").unwrap(), vec![]);
    }

    #[test]
    fn test_grouped_number_is_still_a_literal() {
        let err = parse("f (1)").unwrap_err();
        assert!(matches!(err, Error::Syntax { .. }));
    }

    #[test]
    fn test_tokens_after_nested_group() {
        let err = parse("f ((a b) c)").unwrap_err();
        assert_eq!(err, Error::TrailingAfterGroup { span: Span::new(9, 10) });

        let err = parse("f (g (x) y)").unwrap_err();
        assert_eq!(err, Error::TrailingAfterGroup { span: Span::new(9, 10) });
    }

    #[test]
    fn test_nested_group_closing_together() {
        let stmts = parse("f (g (x))").unwrap();
        assert_eq!(
            stmts,
            vec![Statement::Expression(Expression::call(
                "f",
                vec![Expression::call("g", vec![id("x")])]
            ))]
        );
    }

    #[test]
    fn test_group_is_never_a_call_head() {
        let stmts = parse("(a) b").unwrap();
        assert_eq!(
            stmts,
            vec![
                Statement::Expression(id("a")),
                Statement::Expression(id("b")),
            ]
        );
    }
}
