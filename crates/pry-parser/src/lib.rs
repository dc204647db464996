// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Parser for the interpreted Go subset.
//!
//! Consumes the token stream from the lexer and produces `pry-ast` nodes.
//! Errors are collected rather than thrown so a single pass can report
//! several problems.

mod parser;

pub use parser::{FileResult, ParseError, Parser, StmtResult};
