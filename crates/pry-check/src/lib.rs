// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Best-effort static vetting of REPL input.
//!
//! Before a line is interpreted it is checked against the breakpoint's
//! enclosing file: the statement is spliced (into a working copy) at the
//! breakpoint line and scanned with the names lexically visible there plus
//! the runtime scope. Ill-formed input is rejected without evaluation;
//! unused-variable complaints are never produced.

mod env;

use std::collections::HashSet;

use pry_ast::expr::{Expr, ExprKind};
use pry_ast::stmt::{AssignOp, Stmt, StmtKind};
use pry_interp::Scope;

pub use env::file_names_at_line;

/// A static error found in a REPL line.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CheckError {
    #[error("undefined: {0}")]
    Undefined(String),

    #[error("invalid operation: mismatched kinds {x} and {y}")]
    MismatchedKinds { x: &'static str, y: &'static str },
}

/// Check a parsed REPL statement list against the breakpoint context.
///
/// Returns the problems found; an empty vector admits the input. When the
/// session has no parsed files (a bare REPL), only the runtime scope and
/// builtins participate.
pub fn check_statement(scope: &Scope, stmts: &[Stmt]) -> Vec<CheckError> {
    let mut known: HashSet<String> = HashSet::new();

    // Names visible at the breakpoint in the surrounding file.
    let session = scope.session();
    if let Some(shadow) = session.breakpoint_path() {
        let line = session.breakpoint_line();
        let files = session.files.lock().unwrap();
        for (path, sf) in files.iter() {
            if pry_interp::shadow_path(path) == shadow {
                known.extend(file_names_at_line(&sf.file, &sf.lines, line));
            }
        }
    }

    // Names bound in the live scope.
    for key in scope.keys() {
        known.insert(key);
    }

    let mut checker = Checker {
        known,
        errors: Vec::new(),
    };
    for stmt in stmts {
        checker.check_stmt(stmt);
    }
    checker.errors
}

struct Checker {
    known: HashSet<String>,
    errors: Vec<CheckError>,
}

impl Checker {
    fn check_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Expr(e) => self.check_expr(e),
            StmtKind::Assign { lhs, rhs, op } => {
                for e in rhs {
                    self.check_expr(e);
                }
                for target in lhs {
                    match (&target.kind, op) {
                        // A short declaration introduces its names.
                        (ExprKind::Ident(name), AssignOp::Define) => {
                            self.known.insert(name.clone());
                        }
                        _ => self.check_expr(target),
                    }
                }
            }
            StmtKind::IncDec { x, .. } => self.check_expr(x),
            StmtKind::Var { names, values, .. } => {
                for e in values {
                    self.check_expr(e);
                }
                for name in names {
                    self.known.insert(name.clone());
                }
            }
            StmtKind::Return(exprs) => {
                for e in exprs {
                    self.check_expr(e);
                }
            }
            StmtKind::Break | StmtKind::Continue => {}
            StmtKind::Block(stmts) => {
                for s in stmts {
                    self.check_stmt(s);
                }
            }
            StmtKind::If {
                init,
                cond,
                then,
                els,
            } => {
                if let Some(init) = init {
                    self.check_stmt(init);
                }
                self.check_expr(cond);
                for s in then {
                    self.check_stmt(s);
                }
                if let Some(els) = els {
                    self.check_stmt(els);
                }
            }
            StmtKind::For {
                init,
                cond,
                post,
                body,
            } => {
                if let Some(init) = init {
                    self.check_stmt(init);
                }
                if let Some(cond) = cond {
                    self.check_expr(cond);
                }
                if let Some(post) = post {
                    self.check_stmt(post);
                }
                for s in body {
                    self.check_stmt(s);
                }
            }
            StmtKind::Range {
                key,
                value,
                x,
                body,
            } => {
                self.check_expr(x);
                if let Some(key) = key {
                    self.known.insert(key.clone());
                }
                if let Some(value) = value {
                    self.known.insert(value.clone());
                }
                for s in body {
                    self.check_stmt(s);
                }
            }
            StmtKind::Switch { init, tag, cases } => {
                if let Some(init) = init {
                    self.check_stmt(init);
                }
                if let Some(tag) = tag {
                    self.check_expr(tag);
                }
                for cc in cases {
                    for c in &cc.list {
                        self.check_expr(c);
                    }
                    for s in &cc.body {
                        self.check_stmt(s);
                    }
                }
            }
            StmtKind::TypeSwitch {
                init,
                binding,
                x,
                cases,
            } => {
                if let Some(init) = init {
                    self.check_stmt(init);
                }
                self.check_expr(x);
                if let Some(binding) = binding {
                    self.known.insert(binding.clone());
                }
                for cc in cases {
                    for c in &cc.list {
                        self.check_expr(c);
                    }
                    for s in &cc.body {
                        self.check_stmt(s);
                    }
                }
            }
            StmtKind::Select { cases } => {
                for cc in cases {
                    if let Some(comm) = &cc.comm {
                        self.check_stmt(comm);
                    }
                    for s in &cc.body {
                        self.check_stmt(s);
                    }
                }
            }
            StmtKind::Go(call) | StmtKind::Defer(call) => self.check_expr(call),
            StmtKind::Send { chan, value } => {
                self.check_expr(chan);
                self.check_expr(value);
            }
        }
    }

    fn check_expr(&mut self, e: &Expr) {
        match &e.kind {
            ExprKind::Ident(name) => {
                if !self.is_known(name) {
                    self.errors.push(CheckError::Undefined(name.clone()));
                }
            }
            ExprKind::Binary { op: _, x, y } => {
                self.check_expr(x);
                self.check_expr(y);
                if let (Some(kx), Some(ky)) = (literal_kind(x), literal_kind(y)) {
                    if kx != ky {
                        self.errors.push(CheckError::MismatchedKinds { x: kx, y: ky });
                    }
                }
            }
            ExprKind::Unary { x, .. } => self.check_expr(x),
            ExprKind::Call { fun, args } => {
                self.check_expr(fun);
                for a in args {
                    self.check_expr(a);
                }
            }
            // The selected member is resolved dynamically; only the base is
            // checked statically.
            ExprKind::Selector { x, .. } => self.check_expr(x),
            ExprKind::Index { x, index } => {
                self.check_expr(x);
                self.check_expr(index);
            }
            ExprKind::Slice { x, low, high } => {
                self.check_expr(x);
                if let Some(low) = low {
                    self.check_expr(low);
                }
                if let Some(high) = high {
                    self.check_expr(high);
                }
            }
            ExprKind::Paren(inner) => self.check_expr(inner),
            ExprKind::FuncLit(lit) => {
                let saved = self.known.clone();
                for param in &lit.params {
                    for name in &param.names {
                        self.known.insert(name.clone());
                    }
                }
                for result in &lit.results {
                    for name in &result.names {
                        self.known.insert(name.clone());
                    }
                }
                for s in &lit.body {
                    self.check_stmt(s);
                }
                self.known = saved;
            }
            ExprKind::CompositeLit { elts, .. } => {
                for elt in elts {
                    self.check_expr(elt);
                }
            }
            ExprKind::KeyValue { key, value } => {
                // Struct literal keys are field names, not identifiers in
                // scope; skip bare idents in key position.
                if !matches!(key.kind, ExprKind::Ident(_)) {
                    self.check_expr(key);
                }
                self.check_expr(value);
            }
            ExprKind::TypeAssert { x, .. } => self.check_expr(x),
            ExprKind::ArrayType { len, .. } => {
                if let Some(len) = len {
                    self.check_expr(len);
                }
            }
            ExprKind::MapType { .. }
            | ExprKind::ChanType { .. }
            | ExprKind::StructType { .. }
            | ExprKind::InterfaceType { .. }
            | ExprKind::FuncType { .. } => {}
            ExprKind::Int(_)
            | ExprKind::UintBig(_)
            | ExprKind::Float(_)
            | ExprKind::Imag(_)
            | ExprKind::Char(_)
            | ExprKind::String(_) => {}
        }
    }

    fn is_known(&self, name: &str) -> bool {
        if self.known.contains(name) {
            return true;
        }
        if pry_interp::GoType::by_name(name).is_some() {
            return true;
        }
        matches!(
            name,
            "nil" | "true" | "false" | "append" | "make" | "len" | "close" | "_"
        )
    }
}

/// The literal kind class of an expression, when it is a bare literal.
fn literal_kind(e: &Expr) -> Option<&'static str> {
    match &e.kind {
        ExprKind::Int(_) => Some("int"),
        ExprKind::Float(_) | ExprKind::Imag(_) => Some("float64"),
        ExprKind::String(_) => Some("string"),
        ExprKind::Char(_) => Some("rune"),
        ExprKind::Paren(inner) => literal_kind(inner),
        _ => None,
    }
}
