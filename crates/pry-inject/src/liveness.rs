// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Liveness analysis: which names are visible at each breakpoint marker.
//!
//! The walk carries the accumulated name list through declarations in
//! lexical order; a marker snapshots the list as it stands, so names
//! introduced after it are never captured while enclosing blocks always
//! are.

use pry_ast::decl::{DeclKind, File};
use pry_ast::expr::{Expr, ExprKind};
use pry_ast::stmt::{Stmt, StmtKind};

/// A recorded breakpoint: the byte range of the marker call and the names
/// live at that point.
#[derive(Debug, Clone)]
pub struct PryContext {
    pub start: usize,
    pub end: usize,
    pub vars: Vec<String>,
}

/// Walk a file and record a context for each `Pry()`/`Apply(...)` marker.
pub fn find_contexts(file: &File, debug: bool) -> Vec<PryContext> {
    let mut walker = Walker {
        contexts: Vec::new(),
        debug,
    };

    // Top-level declarations are visible everywhere.
    let mut globals: Vec<String> = Vec::new();
    for decl in &file.decls {
        match &decl.kind {
            DeclKind::Func(f) => push_name(&mut globals, &f.name),
            DeclKind::Var(spec) | DeclKind::Const(spec) => {
                for n in &spec.names {
                    push_name(&mut globals, n);
                }
            }
            DeclKind::Type(td) => push_name(&mut globals, &td.name),
        }
    }

    for decl in &file.decls {
        if let DeclKind::Func(f) = &decl.kind {
            let mut vars = globals.clone();
            if let Some(recv) = &f.recv {
                for n in &recv.names {
                    push_name(&mut vars, n);
                }
            }
            for param in f.params.iter().chain(f.results.iter()) {
                for n in &param.names {
                    push_name(&mut vars, n);
                }
            }
            walker.handle_stmts(vars, &f.body);
        }
    }

    walker.contexts
}

struct Walker {
    contexts: Vec<PryContext>,
    debug: bool,
}

impl Walker {
    fn debug(&self, msg: &str) {
        if self.debug {
            eprintln!("{}", msg);
        }
    }

    fn handle_stmts(&mut self, mut vars: Vec<String>, stmts: &[Stmt]) -> Vec<String> {
        for s in stmts {
            vars = self.handle_stmt(vars, s);
        }
        vars
    }

    fn handle_stmt(&mut self, mut vars: Vec<String>, s: &Stmt) -> Vec<String> {
        match &s.kind {
            StmtKind::Expr(e) => self.handle_expr(vars, e),

            StmtKind::Assign { lhs, .. } => {
                for target in lhs {
                    vars = self.handle_expr(vars, target);
                }
                vars
            }

            StmtKind::Var { names, .. } => {
                for n in names {
                    push_name(&mut vars, n);
                }
                vars
            }

            StmtKind::Block(body) => self.handle_stmts(vars, body),

            StmtKind::If {
                init, then, els, ..
            } => {
                // Names inside the branches stay scoped to them.
                let mut inner = vars.clone();
                if let Some(init) = init {
                    inner = self.handle_stmt(inner, init);
                }
                let inner = self.handle_stmts(inner, then);
                if let Some(els) = els {
                    self.handle_stmt(inner, els);
                }
                vars
            }

            StmtKind::For { init, body, .. } => {
                let mut inner = vars.clone();
                if let Some(init) = init {
                    inner = self.handle_stmt(inner, init);
                }
                self.handle_stmts(inner, body);
                vars
            }

            StmtKind::Range {
                key, value, body, ..
            } => {
                let mut inner = vars.clone();
                if let Some(key) = key {
                    push_name(&mut inner, key);
                }
                if let Some(value) = value {
                    push_name(&mut inner, value);
                }
                self.handle_stmts(inner, body);
                vars
            }

            StmtKind::Switch { init, cases, .. }
            | StmtKind::TypeSwitch { init, cases, .. } => {
                let mut inner = vars.clone();
                if let Some(init) = init {
                    inner = self.handle_stmt(inner, init);
                }
                for cc in cases {
                    self.handle_stmts(inner.clone(), &cc.body);
                }
                vars
            }

            StmtKind::Select { cases } => {
                for cc in cases {
                    let mut inner = vars.clone();
                    if let Some(comm) = &cc.comm {
                        inner = self.handle_stmt(inner, comm);
                    }
                    self.handle_stmts(inner, &cc.body);
                }
                vars
            }

            StmtKind::Go(call) | StmtKind::Defer(call) => {
                self.handle_expr(vars.clone(), call);
                vars
            }

            StmtKind::Send { .. }
            | StmtKind::IncDec { .. }
            | StmtKind::Return(_)
            | StmtKind::Break
            | StmtKind::Continue => vars,
        }
    }

    fn handle_expr(&mut self, mut vars: Vec<String>, e: &Expr) -> Vec<String> {
        match &e.kind {
            ExprKind::Ident(name) => {
                push_name(&mut vars, name);
                vars
            }

            ExprKind::Call { fun, args } => {
                match &fun.kind {
                    ExprKind::Selector { sel, .. } => {
                        if sel == "Pry" || sel == "Apply" {
                            self.contexts.push(PryContext {
                                start: e.span.start,
                                end: e.span.end,
                                vars: vars.clone(),
                            });
                        }
                    }
                    ExprKind::FuncLit(_) => {
                        self.handle_expr(vars.clone(), fun);
                    }
                    other => {
                        self.debug(&format!("Unknown function type {:?}", other));
                    }
                }
                for arg in args {
                    self.handle_expr(vars.clone(), arg);
                }
                vars
            }

            ExprKind::FuncLit(lit) => {
                for param in lit.params.iter().chain(lit.results.iter()) {
                    for n in &param.names {
                        push_name(&mut vars, n);
                    }
                }
                self.handle_stmts(vars.clone(), &lit.body);
                vars
            }

            other => {
                self.debug(&format!("Unknown {:?}", other));
                vars
            }
        }
    }
}

fn push_name(vars: &mut Vec<String>, name: &str) {
    if !vars.iter().any(|v| v == name) {
        vars.push(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contexts_of(src: &str) -> Vec<PryContext> {
        let file = crate::parse_file(std::path::Path::new("test.go"), src).unwrap();
        find_contexts(&file, false)
    }

    #[test]
    fn captures_names_declared_before_the_marker() {
        let src = "package main\nimport \"pry\"\nfunc main() {\n\ta := 1\n\tpry.Pry()\n\tb := a\n\t_ = b\n}\n";
        let ctxs = contexts_of(src);
        assert_eq!(ctxs.len(), 1);
        assert!(ctxs[0].vars.contains(&"a".to_string()));
        assert!(!ctxs[0].vars.contains(&"b".to_string()));
    }

    #[test]
    fn captures_params_receivers_and_results() {
        let src = "package main\nimport \"pry\"\nfunc (t MyT) Work(x int) (out int) {\n\tpry.Pry()\n\treturn x\n}\n";
        let ctxs = contexts_of(src);
        assert_eq!(ctxs.len(), 1);
        for name in ["t", "x", "out", "Work"] {
            assert!(
                ctxs[0].vars.contains(&name.to_string()),
                "missing {}",
                name
            );
        }
    }

    #[test]
    fn captures_range_variables_inside_the_loop() {
        let src = "package main\nimport \"pry\"\nfunc main() {\n\tfor i, v := range []int{1} {\n\t\tpry.Pry()\n\t\t_ = i\n\t\t_ = v\n\t}\n}\n";
        let ctxs = contexts_of(src);
        assert_eq!(ctxs.len(), 1);
        assert!(ctxs[0].vars.contains(&"i".to_string()));
        assert!(ctxs[0].vars.contains(&"v".to_string()));
    }

    #[test]
    fn enclosing_block_names_are_captured() {
        let src = "package main\nimport \"pry\"\nfunc main() {\n\touter := 1\n\tif outer > 0 {\n\t\tinner := 2\n\t\t_ = inner\n\t\tpry.Pry()\n\t}\n}\n";
        let ctxs = contexts_of(src);
        assert_eq!(ctxs.len(), 1);
        assert!(ctxs[0].vars.contains(&"outer".to_string()));
        assert!(ctxs[0].vars.contains(&"inner".to_string()));
    }

    #[test]
    fn multiple_markers_snapshot_independently() {
        let src = "package main\nimport \"pry\"\nfunc main() {\n\ta := 1\n\tpry.Pry()\n\tb := a\n\tpry.Pry()\n\t_ = b\n}\n";
        let ctxs = contexts_of(src);
        assert_eq!(ctxs.len(), 2);
        assert!(!ctxs[0].vars.contains(&"b".to_string()));
        assert!(ctxs[1].vars.contains(&"b".to_string()));
    }

    #[test]
    fn top_level_functions_are_always_visible() {
        let src = "package main\nimport \"pry\"\nfunc helper() {}\nfunc main() {\n\tpry.Pry()\n}\n";
        let ctxs = contexts_of(src);
        assert!(ctxs[0].vars.contains(&"helper".to_string()));
    }

    #[test]
    fn goroutine_closures_are_walked() {
        let src = "package main\nimport \"pry\"\nfunc main() {\n\tn := 1\n\tgo func(m int) {\n\t\tpry.Pry()\n\t}(n)\n}\n";
        let ctxs = contexts_of(src);
        assert_eq!(ctxs.len(), 1);
        assert!(ctxs[0].vars.contains(&"n".to_string()));
        assert!(ctxs[0].vars.contains(&"m".to_string()));
    }
}
