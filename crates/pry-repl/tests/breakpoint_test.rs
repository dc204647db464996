// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! End-to-end: inject a source file, interpret it, and evaluate REPL lines
//! over the scope captured at the breakpoint.

use std::sync::{Arc, Mutex};

use pry_inject::Injector;
use pry_interp::{Program, Scope, Value};
use pry_repl::eval_line;

const SAMPLE: &str = r#"package main

import "pry"

func main() {
	a := []int{1, 2, 3}
	testMap := map[string]int{"duck": 5}
	b := 2
	pry.Pry()
	_ = b
	_ = testMap
	_ = a
}
"#;

fn run_with_lines(source: &str, lines: &[&str]) -> Vec<Result<String, String>> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("main.go");
    std::fs::write(&path, source).unwrap();

    let mut injector = Injector::new(false);
    let injected = injector
        .inject_file(&path)
        .expect("inject")
        .expect("marker present");

    let outputs: Arc<Mutex<Vec<Result<String, String>>>> = Arc::new(Mutex::new(Vec::new()));
    let outputs_hook = outputs.clone();
    let lines: Vec<String> = lines.iter().map(|l| l.to_string()).collect();

    let program = Program::new();
    program.set_breakpoint_hook(Arc::new(move |scope: &Scope| {
        for line in &lines {
            let out = eval_line(scope, line).map(|v| format!("{}", v));
            outputs_hook.lock().unwrap().push(out);
        }
    }));

    let injected_source = std::fs::read_to_string(&injected).unwrap();
    program.load_file(&injected, injected_source).expect("load");
    program.run().expect("run");

    let collected = outputs.lock().unwrap().clone();
    collected
}

#[test]
fn breakpoint_captures_locals() {
    let out = run_with_lines(SAMPLE, &["b", "a[1]", "testMap[\"duck\"]"]);
    assert_eq!(out[0], Ok("2".to_string()));
    assert_eq!(out[1], Ok("2".to_string()));
    assert_eq!(out[2], Ok("5".to_string()));
}

#[test]
fn breakpoint_scope_is_written_through_across_lines() {
    let out = run_with_lines(SAMPLE, &["c := b * 10", "c", "c = 2", "c"]);
    assert_eq!(out[1], Ok("20".to_string()));
    assert_eq!(out[3], Ok("2".to_string()));
}

#[test]
fn breakpoint_rejects_unknown_names() {
    let out = run_with_lines(SAMPLE, &["nonexistent"]);
    assert!(out[0].is_err());
}

#[test]
fn imported_packages_resolve_at_the_breakpoint() {
    let src = r#"package main

import (
	"pry"
	"math"
)

func main() {
	x := 2.0
	pry.Pry()
	_ = x
}
"#;
    let out = run_with_lines(src, &["math.Sqrt(x * 2.0)", "math.MaxUint64"]);
    assert_eq!(out[0], Ok("2.0".to_string()));
    assert_eq!(out[1], Ok(format!("{}", u64::MAX)));
}

#[test]
fn expressions_with_full_scope_interplay() {
    let out = run_with_lines(
        SAMPLE,
        &[
            "sum := 0",
            "for _, v := range a { sum += v }",
            "sum",
            "append(a, sum)",
        ],
    );
    assert_eq!(out[2], Ok("6".to_string()));
    assert_eq!(out[3], Ok("[]int{1, 2, 3, 6}".to_string()));
}
