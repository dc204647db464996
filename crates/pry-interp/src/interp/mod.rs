// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The evaluator implementation.
//!
//! A total function from (AST node, scope) to (value, error), defined by
//! structural recursion. Control transfers (break, continue, return, channel
//! retries) travel as sentinel errors caught by the enclosing construct.

mod assign;
mod call;
mod eval_expr;
mod exec_stmt;

use pry_ast::stmt::Stmt;

use crate::scope::Scope;
use crate::value::Value;

/// A runtime error.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("can't find EXPR {0}")]
    UnknownIdent(String),

    #[error("unknown field {0:?}")]
    UnknownField(String),

    #[error("undefined {0}")]
    Undefined(String),

    #[error("{0}")]
    TypeError(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("unknown operation {op} between {x} and {y}")]
    UnknownOperation {
        op: &'static str,
        x: &'static str,
        y: &'static str,
    },

    #[error("unknown unary operation {op} on {x}")]
    UnknownUnaryOperation { op: &'static str, x: &'static str },

    #[error("slice index out of range")]
    IndexOutOfRange,

    #[error("slice: index out of bounds")]
    SliceOutOfBounds,

    #[error("array index {index} out of bounds [0:{len}]")]
    ArrayOutOfBounds { index: usize, len: usize },

    #[error("assignment count mismatch: {lhs} = {rhs}")]
    AssignCountMismatch { lhs: usize, rhs: usize },

    #[error("number of arguments doesn't match function; expected {expected}; got {got}")]
    ArityMismatch { expected: usize, got: usize },

    #[error("expected func; got {0}")]
    NotAFunction(&'static str),

    #[error("defer: can't find function scope")]
    DeferOutsideFunction,

    #[error("{0}")]
    ParseFailed(String),

    #[error("interpreting {expr:?}: {cause}")]
    Panicked { expr: String, cause: String },

    // Control sentinels - caught by the enclosing construct, never shown.
    #[error("branch break")]
    Break,

    #[error("branch continue")]
    Continue,

    #[error("failed to send, channel full or no receivers")]
    ChanSendFailed,

    #[error("failed to receive, channel closed")]
    ChanRecvFailed,

    #[error("receive in select")]
    ChanRecvInSelect,

    #[error("return")]
    Return(Value),
}

impl RuntimeError {
    /// Whether this error is a control sentinel rather than a failure.
    pub fn is_sentinel(&self) -> bool {
        matches!(
            self,
            RuntimeError::Break
                | RuntimeError::Continue
                | RuntimeError::ChanSendFailed
                | RuntimeError::ChanRecvFailed
                | RuntimeError::ChanRecvInSelect
                | RuntimeError::Return(_)
        )
    }
}

impl Scope {
    /// Parse a string of host-language code into statements.
    pub fn parse_string(src: &str) -> Result<Vec<Stmt>, RuntimeError> {
        let lexed = pry_lexer::Lexer::new(src).tokenize();
        if let Some(err) = lexed.errors.first() {
            return Err(RuntimeError::ParseFailed(err.to_string()));
        }
        let result = pry_parser::Parser::new(lexed.tokens).parse_stmts();
        if let Some(err) = result.errors.first() {
            return Err(RuntimeError::ParseFailed(err.to_string()));
        }
        Ok(result.stmts)
    }

    /// Interpret a string of code and return the result.
    pub fn interpret_string(&self, src: &str) -> Result<Value, RuntimeError> {
        let stmts = Self::parse_string(src)?;
        self.interpret_block(&stmts)
    }

    /// Interpret a statement list in this scope, returning the last value.
    pub fn interpret_block(&self, stmts: &[Stmt]) -> Result<Value, RuntimeError> {
        let mut out = Value::Nil;
        for stmt in stmts {
            out = self.exec_stmt(stmt)?;
        }
        Ok(out)
    }
}
