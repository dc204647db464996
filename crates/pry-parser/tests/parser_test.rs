// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Parser tests: file structure, statement forms, and the exact marker
//! spans the injector depends on.

use pry_ast::decl::DeclKind;
use pry_ast::expr::ExprKind;
use pry_ast::stmt::{AssignOp, StmtKind};
use pry_parser::Parser;

fn parse_file(src: &str) -> pry_ast::decl::File {
    let lexed = pry_lexer::Lexer::new(src).tokenize();
    assert!(lexed.is_ok(), "lex errors: {:?}", lexed.errors);
    let result = Parser::new(lexed.tokens).parse();
    assert!(result.errors.is_empty(), "parse errors: {:?}", result.errors);
    result.file.unwrap()
}

fn parse_stmts(src: &str) -> Vec<pry_ast::stmt::Stmt> {
    let lexed = pry_lexer::Lexer::new(src).tokenize();
    assert!(lexed.is_ok(), "lex errors: {:?}", lexed.errors);
    let result = Parser::new(lexed.tokens).parse_stmts();
    assert!(result.errors.is_empty(), "parse errors: {:?}", result.errors);
    result.stmts
}

#[test]
fn file_header_and_imports() {
    let file = parse_file(
        "package main\n\nimport (\n\t\"fmt\"\n\tm \"math\"\n)\n\nfunc main() {}\n",
    );
    assert_eq!(file.package, "main");
    assert_eq!(file.imports.len(), 2);
    assert_eq!(file.imports[0].local_name(), "fmt");
    assert_eq!(file.imports[1].local_name(), "m");
    assert_eq!(file.imports[1].path, "math");
}

#[test]
fn import_path_local_name_is_last_segment() {
    let file = parse_file("package main\n\nimport \"example.com/tools/pry\"\n");
    assert_eq!(file.imports[0].local_name(), "pry");
}

#[test]
fn function_declarations_with_receiver_and_results() {
    let file = parse_file(
        "package main\n\nfunc (t Thing) Sum(a, b int) (total int) {\n\treturn a + b\n}\n",
    );
    let DeclKind::Func(f) = &file.decls[0].kind else {
        panic!("expected func decl");
    };
    assert_eq!(f.name, "Sum");
    assert_eq!(f.recv.as_ref().unwrap().names, vec!["t".to_string()]);
    assert_eq!(f.params[0].names, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(f.results[0].names, vec!["total".to_string()]);
}

#[test]
fn marker_call_span_is_exact() {
    let src = "package main\n\nimport \"pry\"\n\nfunc main() {\n\tpry.Pry()\n}\n";
    let file = parse_file(src);
    let DeclKind::Func(f) = &file.decls[0].kind else {
        panic!("expected func decl");
    };
    let StmtKind::Expr(call) = &f.body[0].kind else {
        panic!("expected expression statement");
    };
    assert_eq!(&src[call.span.start..call.span.end], "pry.Pry()");
}

#[test]
fn short_declaration_and_compound_assign() {
    let stmts = parse_stmts("a := 1\na += 2\na <<= 3\n");
    assert!(matches!(
        stmts[0].kind,
        StmtKind::Assign {
            op: AssignOp::Define,
            ..
        }
    ));
    assert!(matches!(
        stmts[1].kind,
        StmtKind::Assign {
            op: AssignOp::Add,
            ..
        }
    ));
    assert!(matches!(
        stmts[2].kind,
        StmtKind::Assign {
            op: AssignOp::Shl,
            ..
        }
    ));
}

#[test]
fn send_and_receive_statements() {
    let stmts = parse_stmts("ch <- 1\nv := <-ch\n");
    assert!(matches!(stmts[0].kind, StmtKind::Send { .. }));
    let StmtKind::Assign { rhs, .. } = &stmts[1].kind else {
        panic!("expected assignment");
    };
    assert!(matches!(
        rhs[0].kind,
        ExprKind::Unary {
            op: pry_ast::expr::UnaryOp::Recv,
            ..
        }
    ));
}

#[test]
fn three_clause_for_and_range_forms() {
    let stmts = parse_stmts("for i := 0; i < 5; i++ { }\nfor k, v := range m { _ = k; _ = v }\nfor { break }\n");
    assert!(matches!(
        stmts[0].kind,
        StmtKind::For {
            init: Some(_),
            cond: Some(_),
            post: Some(_),
            ..
        }
    ));
    let StmtKind::Range { key, value, .. } = &stmts[1].kind else {
        panic!("expected range");
    };
    assert_eq!(key.as_deref(), Some("k"));
    assert_eq!(value.as_deref(), Some("v"));
    assert!(matches!(
        stmts[2].kind,
        StmtKind::For {
            init: None,
            cond: None,
            post: None,
            ..
        }
    ));
}

#[test]
fn switch_forms() {
    let stmts = parse_stmts(
        "switch x { case 1: f() }\nswitch { case a > 1: f() }\nswitch v := x.(type) { case int: f() }\n",
    );
    assert!(matches!(
        stmts[0].kind,
        StmtKind::Switch { tag: Some(_), .. }
    ));
    assert!(matches!(stmts[1].kind, StmtKind::Switch { tag: None, .. }));
    let StmtKind::TypeSwitch { binding, .. } = &stmts[2].kind else {
        panic!("expected type switch");
    };
    assert_eq!(binding.as_deref(), Some("v"));
}

#[test]
fn select_with_default() {
    let stmts = parse_stmts("select { case v := <-ch: f(v); default: g() }\n");
    let StmtKind::Select { cases } = &stmts[0].kind else {
        panic!("expected select");
    };
    assert_eq!(cases.len(), 2);
    assert!(cases[0].comm.is_some());
    assert!(cases[1].comm.is_none());
}

#[test]
fn composite_literal_heads() {
    let stmts = parse_stmts(
        "a := []int{1, 2}\nb := [3]int{1}\nc := map[string]int{\"x\": 1}\nd := T{X: 1}\n",
    );
    for stmt in &stmts {
        let StmtKind::Assign { rhs, .. } = &stmt.kind else {
            panic!("expected assignment");
        };
        assert!(matches!(rhs[0].kind, ExprKind::CompositeLit { .. }));
    }
}

#[test]
fn braces_in_control_clauses_open_blocks_not_literals() {
    let stmts = parse_stmts("if x { f() }\nfor x { g() }\n");
    assert!(matches!(stmts[0].kind, StmtKind::If { .. }));
    assert!(matches!(stmts[1].kind, StmtKind::For { cond: Some(_), .. }));
}

#[test]
fn nested_snapshot_literal_parses() {
    let src = "pry.Apply(&pry.Scope{Vals:map[string]interface{}{ \"a\": a, \"fmt\": pry.Package{Name: \"fmt\", Functions: map[string]interface{}{\"Println\": fmt.Println,}}, }})\n";
    let stmts = parse_stmts(src);
    assert_eq!(stmts.len(), 1);
    let StmtKind::Expr(call) = &stmts[0].kind else {
        panic!("expected expression");
    };
    assert!(matches!(call.kind, ExprKind::Call { .. }));
}

#[test]
fn func_literal_with_defer() {
    let stmts = parse_stmts("f := func() { defer g(); h() }\n");
    let StmtKind::Assign { rhs, .. } = &stmts[0].kind else {
        panic!("expected assignment");
    };
    let ExprKind::FuncLit(lit) = &rhs[0].kind else {
        panic!("expected func literal");
    };
    assert!(matches!(lit.body[0].kind, StmtKind::Defer(_)));
}

#[test]
fn type_assertion_forms() {
    let stmts = parse_stmts("a := x.(int)\nb := x.(type)\n");
    let StmtKind::Assign { rhs, .. } = &stmts[0].kind else {
        panic!("expected assignment");
    };
    assert!(matches!(
        rhs[0].kind,
        ExprKind::TypeAssert { ty: Some(_), .. }
    ));
    let StmtKind::Assign { rhs, .. } = &stmts[1].kind else {
        panic!("expected assignment");
    };
    assert!(matches!(rhs[0].kind, ExprKind::TypeAssert { ty: None, .. }));
}

#[test]
fn var_declarations() {
    let file = parse_file(
        "package main\n\nvar (\n\ta = 1\n\tb, c int\n)\n\nconst Answer = 42\n",
    );
    assert_eq!(file.decls.len(), 3);
    assert!(matches!(file.decls[0].kind, DeclKind::Var(_)));
    assert!(matches!(file.decls[2].kind, DeclKind::Const(_)));
}

#[test]
fn struct_type_declaration_fields() {
    let file = parse_file(
        "package main\n\ntype Point struct {\n\tX, Y int\n\tLabel string\n}\n",
    );
    let DeclKind::Type(td) = &file.decls[0].kind else {
        panic!("expected type decl");
    };
    let ExprKind::StructType { fields } = &td.ty.kind else {
        panic!("expected struct type");
    };
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].names, vec!["X".to_string(), "Y".to_string()]);
}

#[test]
fn errors_are_collected_not_fatal() {
    let lexed = pry_lexer::Lexer::new("package main\n\nfunc broken( {\n}\n\nfunc ok() {}\n")
        .tokenize();
    let result = Parser::new(lexed.tokens).parse();
    assert!(!result.errors.is_empty());
}
