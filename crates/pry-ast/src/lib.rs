// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Abstract Syntax Tree types for the interpreted Go subset.
//!
//! This crate defines the AST nodes shared between the lexer, parser,
//! checker, injector, and interpreter.

pub mod span;
pub mod token;
pub mod expr;
pub mod stmt;
pub mod decl;

pub use span::{LineMap, Span};
