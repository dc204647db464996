//! Lexical name environments over a parsed file.
//!
//! Mirrors the injector's liveness rule: names introduced after the given
//! line are not visible, names in enclosing (and earlier) blocks are.

use pry_ast::decl::{DeclKind, File};
use pry_ast::expr::ExprKind;
use pry_ast::stmt::{AssignOp, Stmt, StmtKind};
use pry_ast::LineMap;

/// Collect every name lexically visible at the given 1-based line.
pub fn file_names_at_line(file: &File, lines: &LineMap, line: u32) -> Vec<String> {
    let mut names = Vec::new();

    for imp in &file.imports {
        push(&mut names, imp.local_name().to_string());
    }

    for decl in &file.decls {
        match &decl.kind {
            DeclKind::Func(f) => push(&mut names, f.name.clone()),
            DeclKind::Var(spec) | DeclKind::Const(spec) => {
                for n in &spec.names {
                    push(&mut names, n.clone());
                }
            }
            DeclKind::Type(td) => push(&mut names, td.name.clone()),
        }
    }

    for decl in &file.decls {
        if let DeclKind::Func(f) = &decl.kind {
            let (start, _) = lines.offset_to_line_col(decl.span.start);
            let (end, _) = lines.offset_to_line_col(decl.span.end);
            if start <= line && line <= end {
                if let Some(recv) = &f.recv {
                    for n in &recv.names {
                        push(&mut names, n.clone());
                    }
                }
                for param in f.params.iter().chain(f.results.iter()) {
                    for n in &param.names {
                        push(&mut names, n.clone());
                    }
                }
                collect_stmts(&f.body, lines, line, &mut names);
            }
        }
    }

    names
}

fn collect_stmts(stmts: &[Stmt], lines: &LineMap, line: u32, out: &mut Vec<String>) {
    for stmt in stmts {
        let (start, _) = lines.offset_to_line_col(stmt.span.start);
        if start > line {
            break;
        }
        collect_stmt(stmt, lines, line, out);
    }
}

fn collect_stmt(stmt: &Stmt, lines: &LineMap, line: u32, out: &mut Vec<String>) {
    match &stmt.kind {
        StmtKind::Assign { lhs, op, .. } => {
            if *op == AssignOp::Define {
                for target in lhs {
                    if let ExprKind::Ident(name) = &target.kind {
                        push(out, name.clone());
                    }
                }
            }
        }
        StmtKind::Var { names, .. } => {
            for n in names {
                push(out, n.clone());
            }
        }
        StmtKind::Block(body) => collect_stmts(body, lines, line, out),
        StmtKind::If {
            init, then, els, ..
        } => {
            if let Some(init) = init {
                collect_stmt(init, lines, line, out);
            }
            collect_stmts(then, lines, line, out);
            if let Some(els) = els {
                collect_stmt(els, lines, line, out);
            }
        }
        StmtKind::For { init, body, .. } => {
            if let Some(init) = init {
                collect_stmt(init, lines, line, out);
            }
            collect_stmts(body, lines, line, out);
        }
        StmtKind::Range {
            key, value, body, ..
        } => {
            if let Some(key) = key {
                push(out, key.clone());
            }
            if let Some(value) = value {
                push(out, value.clone());
            }
            collect_stmts(body, lines, line, out);
        }
        StmtKind::Switch { init, cases, .. } | StmtKind::TypeSwitch { init, cases, .. } => {
            if let Some(init) = init {
                collect_stmt(init, lines, line, out);
            }
            for cc in cases {
                collect_stmts(&cc.body, lines, line, out);
            }
        }
        StmtKind::Select { cases } => {
            for cc in cases {
                if let Some(comm) = &cc.comm {
                    collect_stmt(comm, lines, line, out);
                }
                collect_stmts(&cc.body, lines, line, out);
            }
        }
        _ => {}
    }
}

fn push(out: &mut Vec<String>, name: String) {
    if name != "_" && !out.contains(&name) {
        out.push(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> (File, LineMap) {
        let lexed = pry_lexer::Lexer::new(src).tokenize();
        assert!(lexed.is_ok(), "{:?}", lexed.errors);
        let parsed = pry_parser::Parser::new(lexed.tokens).parse();
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        (parsed.file.unwrap(), LineMap::new(src))
    }

    #[test]
    fn names_before_the_line_are_visible() {
        let src = "package main\n\nfunc main() {\n\ta := 1\n\tb := a\n\t_ = b\n}\n";
        let (file, lines) = parse(src);
        let names = file_names_at_line(&file, &lines, 5);
        assert!(names.contains(&"a".to_string()));
        assert!(names.contains(&"main".to_string()));
    }

    #[test]
    fn names_after_the_line_are_not_visible() {
        let src = "package main\n\nfunc main() {\n\ta := 1\n\t_ = a\n\tlate := 2\n\t_ = late\n}\n";
        let (file, lines) = parse(src);
        let names = file_names_at_line(&file, &lines, 5);
        assert!(names.contains(&"a".to_string()));
        assert!(!names.contains(&"late".to_string()));
    }

    #[test]
    fn params_and_enclosing_blocks_are_visible() {
        let src = "package main\n\nfunc f(x int) int {\n\tif x > 0 {\n\t\ty := x\n\t\treturn y\n\t}\n\treturn 0\n}\n";
        let (file, lines) = parse(src);
        let names = file_names_at_line(&file, &lines, 6);
        assert!(names.contains(&"x".to_string()));
        assert!(names.contains(&"y".to_string()));
    }
}
