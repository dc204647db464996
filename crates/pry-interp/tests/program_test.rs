// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Whole-program tests: declaration registration, imports, and execution of
//! instrumented files.

use std::path::Path;
use std::sync::{Arc, Mutex};

use pry_interp::{Program, Scope, Value};

fn run_program(src: &str) -> Program {
    let program = Program::new();
    program
        .load_file(Path::new("/tmp/program_test.go"), src.to_string())
        .expect("load");
    program.run().expect("run");
    program
}

#[test]
fn main_runs_and_mutates_globals() {
    let src = "package main\n\nvar counter = 0\n\nfunc main() {\n\tcounter = counter + 41\n\tcounter++\n}\n";
    let program = run_program(src);
    assert!(matches!(
        program.root().get("counter"),
        Some(Value::Int(42))
    ));
}

#[test]
fn functions_call_each_other() {
    let src = "package main\n\nvar out = 0\n\nfunc double(x int) int {\n\treturn x * 2\n}\n\nfunc main() {\n\tout = double(21)\n}\n";
    let program = run_program(src);
    assert!(matches!(program.root().get("out"), Some(Value::Int(42))));
}

#[test]
fn declared_struct_types_build_literals() {
    let src = "package main\n\ntype Point struct {\n\tX int\n\tY int\n}\n\nvar got = 0\n\nfunc main() {\n\tp := Point{X: 3, Y: 4}\n\tgot = p.X*p.X + p.Y*p.Y\n}\n";
    let program = run_program(src);
    assert!(matches!(program.root().get("got"), Some(Value::Int(25))));
}

#[test]
fn methods_dispatch_before_fields() {
    let src = "package main\n\ntype Point struct {\n\tX int\n\tY int\n}\n\nfunc (p Point) Sum() int {\n\treturn p.X + p.Y\n}\n\nvar got = 0\n\nfunc main() {\n\tp := Point{X: 3, Y: 4}\n\tgot = p.Sum()\n}\n";
    let program = run_program(src);
    assert!(matches!(program.root().get("got"), Some(Value::Int(7))));
}

#[test]
fn methods_resolve_through_one_pointer_level() {
    let src = "package main\n\ntype Counter struct {\n\tN int\n}\n\nfunc (c Counter) Get() int {\n\treturn c.N\n}\n\nvar got = 0\n\nfunc main() {\n\tc := Counter{N: 9}\n\tp := &c\n\tgot = p.Get()\n}\n";
    let program = run_program(src);
    assert!(matches!(program.root().get("got"), Some(Value::Int(9))));
}

#[test]
fn const_declarations_register() {
    let src = "package main\n\nconst Answer = 42\n\nvar out = 0\n\nfunc main() {\n\tout = Answer\n}\n";
    let program = run_program(src);
    assert!(matches!(program.root().get("out"), Some(Value::Int(42))));
}

#[test]
fn builtin_imports_resolve() {
    let src = "package main\n\nimport \"strings\"\n\nvar out = \"\"\n\nfunc main() {\n\tout = strings.ToUpper(\"abc\")\n}\n";
    let program = run_program(src);
    assert!(matches!(program.root().get("out"), Some(Value::String(s)) if s == "ABC"));
}

#[test]
fn pry_marker_is_a_noop_without_injection() {
    let src = "package main\n\nimport \"pry\"\n\nvar out = 0\n\nfunc main() {\n\tout = 1\n\tpry.Pry()\n\tout = 2\n}\n";
    let program = run_program(src);
    assert!(matches!(program.root().get("out"), Some(Value::Int(2))));
}

#[test]
fn goroutines_and_channels_cooperate() {
    let src = "package main\n\nvar got = 0\n\nfunc main() {\n\tch := make(chan int, 1)\n\tgo func() {\n\t\tch <- 7\n\t}()\n\tgot = <-ch\n}\n";
    let program = run_program(src);
    assert!(matches!(program.root().get("got"), Some(Value::Int(7))));
}

#[test]
fn select_polls_until_a_goroutine_sends() {
    // No clause is ready at first; the select must keep polling until the
    // spawned task delivers, never taking a missing default.
    let src = "package main\n\nimport \"time\"\n\nvar got = 0\n\nfunc main() {\n\tch := make(chan int, 1)\n\tgo func() {\n\t\ttime.Sleep(50 * time.Millisecond)\n\t\tch <- 9\n\t}()\n\tselect {\n\tcase v := <-ch:\n\t\tgot = v\n\t}\n}\n";
    let program = run_program(src);
    assert!(matches!(program.root().get("got"), Some(Value::Int(9))));
}

#[test]
fn missing_main_is_an_error() {
    let program = Program::new();
    program
        .load_file(
            Path::new("/tmp/no_main.go"),
            "package main\n\nfunc helper() {}\n".to_string(),
        )
        .expect("load");
    assert!(program.run().is_err());
}

#[test]
fn apply_call_reaches_the_breakpoint_hook() {
    let src = "package main\n\nimport \"pry\"\n\nfunc main() {\n\ta := 5\n\tpry.Apply(&pry.Scope{Vals: map[string]interface{}{\"a\": a}})\n}\n";
    let captured: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let captured_hook = captured.clone();

    let program = Program::new();
    program.set_breakpoint_hook(Arc::new(move |scope: &Scope| {
        *captured_hook.lock().unwrap() = scope.get("a");
    }));
    program
        .load_file(Path::new("/tmp/apply_test.go"), src.to_string())
        .expect("load");
    program.run().expect("run");

    let got = captured.lock().unwrap().take();
    assert!(matches!(got, Some(Value::Int(5))));
}
