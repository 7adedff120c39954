//! Abstract Syntax Tree for Pipescript
//!
//! Every node owns its children; trees are built bottom-up by the parser
//! and handed to the caller as a list of statements.

use serde::Serialize;

/// A top-level statement
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value")]
pub enum Statement {
    Assignment(Assignment),
    Expression(Expression),
}

/// `name = expr`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    pub name: String,
    pub expr: Expression,
}

/// A value or call, followed by the stages piped after it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expression {
    pub body: ExpressionBody,
    /// Expressions chained after this one, in source order
    pub pipe: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "body")]
pub enum ExpressionBody {
    Value(Value),
    Call(FunctionCall),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value")]
pub enum Value {
    Identity(String),
    Number(String),
    String(String),
    Function(FunctionDefinition),
}

/// Arrow function literal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDefinition {
    /// Raw text of every token before the arrow
    pub params: Vec<String>,
    pub body: Box<Expression>,
}

/// A named operation applied to arguments
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expression>,
}

impl Expression {
    pub fn value(value: Value) -> Self {
        Self {
            body: ExpressionBody::Value(value),
            pipe: Vec::new(),
        }
    }

    pub fn call(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Self {
            body: ExpressionBody::Call(FunctionCall {
                name: name.into(),
                args,
            }),
            pipe: Vec::new(),
        }
    }

    pub fn identity(name: impl Into<String>) -> Self {
        Self::value(Value::Identity(name.into()))
    }

    pub fn number(text: impl Into<String>) -> Self {
        Self::value(Value::Number(text.into()))
    }

    pub fn function(params: Vec<String>, body: Expression) -> Self {
        Self::value(Value::Function(FunctionDefinition {
            params,
            body: Box::new(body),
        }))
    }

    pub fn with_pipe(mut self, pipe: Vec<Expression>) -> Self {
        self.pipe = pipe;
        self
    }

    /// Literal text of a plain value; `None` for calls and functions
    pub fn literal(&self) -> Option<&str> {
        match &self.body {
            ExpressionBody::Value(Value::Identity(s))
            | ExpressionBody::Value(Value::Number(s))
            | ExpressionBody::Value(Value::String(s)) => Some(s),
            _ => None,
        }
    }
}
