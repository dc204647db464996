// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! End-to-end evaluator tests: literals, scope, control flow, channels,
//! defer, and the reflective builtins.

use pry_interp::{RuntimeError, Scope, Value};

fn eval(scope: &Scope, src: &str) -> Value {
    scope
        .interpret_string(src)
        .unwrap_or_else(|e| panic!("interpreting {:?}: {}", src, e))
}

fn eval_err(scope: &Scope, src: &str) -> RuntimeError {
    match scope.interpret_string(src) {
        Ok(v) => panic!("expected error interpreting {:?}, got {}", src, v),
        Err(e) => e,
    }
}

// === Literals ===

#[test]
fn string_literal() {
    let scope = Scope::new();
    let out = eval(&scope, "\"Hello!\"");
    assert!(matches!(out, Value::String(s) if s == "Hello!"));
}

#[test]
fn int_literal() {
    let scope = Scope::new();
    assert!(matches!(eval(&scope, "-1234"), Value::Int(-1234)));
}

#[test]
fn int_literal_bases() {
    let scope = Scope::new();
    assert!(matches!(eval(&scope, "0xC123"), Value::Int(0xC123)));
    assert!(matches!(eval(&scope, "03272"), Value::Int(0o3272)));
}

#[test]
fn char_literal() {
    let scope = Scope::new();
    assert!(matches!(eval(&scope, "'a'"), Value::Int32(97)));
}

#[test]
fn float_literal() {
    let scope = Scope::new();
    assert!(matches!(eval(&scope, "2.5"), Value::Float64(v) if v == 2.5));
}

#[test]
fn array_literal() {
    let scope = Scope::new();
    let out = eval(&scope, "[]int{1,2,3,4}");
    match out {
        Value::Slice(s) => {
            let elems = s.to_vec();
            assert_eq!(elems.len(), 4);
            assert!(matches!(elems[3], Value::Int(4)));
        }
        other => panic!("expected slice, got {}", other),
    }
}

#[test]
fn fixed_array_literal_with_missing_elements() {
    let scope = Scope::new();
    let out = eval(&scope, "[4]int{1,2}");
    match out {
        Value::Array(a) => {
            let elems = a.data.lock().unwrap().clone();
            assert!(matches!(elems[1], Value::Int(2)));
            // Missing elements are the element zero.
            assert!(matches!(elems[3], Value::Int(0)));
        }
        other => panic!("expected array, got {}", other),
    }
}

#[test]
fn fixed_array_literal_overflow_fails() {
    let scope = Scope::new();
    eval_err(&scope, "[2]int{1,2,3}");
}

#[test]
fn map_literal() {
    let scope = Scope::new();
    let out = eval(&scope, "map[string]int{\"duck\": 5,\n \"banana\": -123,\n}");
    match out {
        Value::Map(m) => {
            assert_eq!(m.entries.lock().unwrap().len(), 2);
        }
        other => panic!("expected map, got {}", other),
    }
}

// === Identifiers and scope ===

#[test]
fn basic_ident() {
    let scope = Scope::new();
    scope.set("a", Value::Int(5));
    assert!(matches!(eval(&scope, "a"), Value::Int(5)));
}

#[test]
fn missing_ident_fails() {
    let scope = Scope::new();
    let err = eval_err(&scope, "a");
    assert!(matches!(err, RuntimeError::UnknownIdent(_)));
}

#[test]
fn declare_then_read_then_reassign() {
    let scope = Scope::new();
    assert!(matches!(eval(&scope, "a := 10"), Value::Int(10)));
    assert!(matches!(eval(&scope, "a"), Value::Int(10)));
    assert!(matches!(eval(&scope, "a = 2"), Value::Int(2)));
    assert!(matches!(eval(&scope, "a"), Value::Int(2)));
}

#[test]
fn assign_to_undefined_fails() {
    let scope = Scope::new();
    let err = eval_err(&scope, "zzz = 1");
    assert!(matches!(err, RuntimeError::Undefined(_)));
}

// === Indexing and slicing ===

#[test]
fn slice_index() {
    let scope = Scope::new();
    eval(&scope, "a := []int{1, 2, 3}");
    assert!(matches!(eval(&scope, "a[1]"), Value::Int(2)));
}

#[test]
fn slice_index_out_of_range() {
    let scope = Scope::new();
    eval(&scope, "a := []int{1, 2, 3}");
    let err = eval_err(&scope, "a[3]");
    assert!(matches!(err, RuntimeError::IndexOutOfRange));
}

#[test]
fn map_read_of_absent_key_is_zero() {
    let scope = Scope::new();
    eval(&scope, "a := map[string]int{}");
    assert!(matches!(eval(&scope, "a[\"b\"]"), Value::Int(0)));
}

#[test]
fn map_read_of_present_key() {
    let scope = Scope::new();
    eval(&scope, "a := map[string]int{\"B\": 10}");
    assert!(matches!(eval(&scope, "a[\"B\"]"), Value::Int(10)));
}

#[test]
fn slice_expression() {
    let scope = Scope::new();
    eval(&scope, "a := []int{1, 2, 3, 4}");
    let out = eval(&scope, "a[1:3]");
    match out {
        Value::Slice(s) => {
            let elems = s.to_vec();
            assert_eq!(elems.len(), 2);
            assert!(matches!(elems[0], Value::Int(2)));
            assert!(matches!(elems[1], Value::Int(3)));
        }
        other => panic!("expected slice, got {}", other),
    }
}

#[test]
fn slice_high_equal_len_succeeds_one_past_fails() {
    let scope = Scope::new();
    eval(&scope, "a := []int{1, 2, 3}");
    let out = eval(&scope, "a[1:3]");
    assert!(matches!(out, Value::Slice(s) if s.len == 2));
    let err = eval_err(&scope, "a[1:4]");
    assert!(matches!(err, RuntimeError::SliceOutOfBounds));
}

#[test]
fn slice_views_share_backing_storage() {
    let scope = Scope::new();
    eval(&scope, "a := []int{1, 2, 3, 4}");
    eval(&scope, "b := a[1:3]");
    eval(&scope, "b[0] = 99");
    assert!(matches!(eval(&scope, "a[1]"), Value::Int(99)));
}

// === Math and operators ===

#[test]
fn basic_math() {
    let scope = Scope::new();
    assert!(matches!(eval(&scope, "2*3"), Value::Int(6)));
    assert!(matches!(eval(&scope, "10 / 2"), Value::Int(5)));
    assert!(matches!(eval(&scope, "1 + 2"), Value::Int(3)));
    assert!(matches!(eval(&scope, "2.0 * 3.0"), Value::Float64(v) if v == 6.0));
    assert!(matches!(eval(&scope, "10.0 / 2.0"), Value::Float64(v) if v == 5.0));
}

#[test]
fn parens() {
    let scope = Scope::new();
    scope.set("a", Value::Int(5));
    assert!(matches!(eval(&scope, "((10) * (a))"), Value::Int(50)));
}

#[test]
fn comparison_chain() {
    let scope = Scope::new();
    assert!(matches!(eval(&scope, "1 < 2"), Value::Bool(true)));
    assert!(matches!(eval(&scope, "2 == 3"), Value::Bool(false)));
    assert!(matches!(eval(&scope, "true && false"), Value::Bool(false)));
    assert!(matches!(eval(&scope, "true || false"), Value::Bool(true)));
}

#[test]
fn compound_assignment() {
    let scope = Scope::new();
    eval(&scope, "a := 10");
    eval(&scope, "a += 5");
    assert!(matches!(eval(&scope, "a"), Value::Int(15)));
    eval(&scope, "a <<= 1");
    assert!(matches!(eval(&scope, "a"), Value::Int(30)));
}

#[test]
fn increment_decrement() {
    let scope = Scope::new();
    eval(&scope, "a := 10");
    eval(&scope, "a++");
    assert!(matches!(eval(&scope, "a"), Value::Int(11)));
    eval(&scope, "a--");
    assert!(matches!(eval(&scope, "a"), Value::Int(10)));
}

// === make / append / len / close ===

#[test]
fn make_slice() {
    let scope = Scope::new();
    let out = eval(&scope, "make([]int, 1, 10)");
    assert!(matches!(out, Value::Slice(s) if s.len == 1));
}

#[test]
fn make_chan() {
    let scope = Scope::new();
    assert!(matches!(eval(&scope, "make(chan int, 10)"), Value::Chan(_)));
}

#[test]
fn make_unknown_kind_fails() {
    let scope = Scope::new();
    eval_err(&scope, "make(int)");
}

#[test]
fn append_elems() {
    let scope = Scope::new();
    eval(&scope, "a := []int{1}");
    let out = eval(&scope, "append(a, 2, 3)");
    match out {
        Value::Slice(s) => {
            let elems = s.to_vec();
            assert_eq!(elems.len(), 3);
            assert!(matches!(elems[2], Value::Int(3)));
        }
        other => panic!("expected slice, got {}", other),
    }
}

#[test]
fn append_type_mismatch_fails() {
    let scope = Scope::new();
    eval(&scope, "a := []int{1}");
    eval_err(&scope, "append(a, \"nope\")");
}

#[test]
fn len_of_things() {
    let scope = Scope::new();
    assert!(matches!(eval(&scope, "len(\"abcd\")"), Value::Int(4)));
    eval(&scope, "a := []int{1, 2, 3}");
    assert!(matches!(eval(&scope, "len(a)"), Value::Int(3)));
}

// === Conversions ===

#[test]
fn conversion_casts() {
    let scope = Scope::new();
    assert!(matches!(eval(&scope, "int8(7)"), Value::Int8(7)));
    assert!(matches!(eval(&scope, "uint64(7)"), Value::Uint64(7)));
    assert!(matches!(eval(&scope, "float64(7)"), Value::Float64(v) if v == 7.0));
    assert!(matches!(eval(&scope, "string(72)"), Value::String(s) if s == "H"));
}

#[test]
fn shift_across_kinds() {
    let scope = Scope::new();
    for kind in [
        "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16", "uint32",
        "uint64",
    ] {
        let shl = eval(&scope, &format!("{k}(2) << {k}(2)", k = kind));
        let shr = eval(&scope, &format!("{k}(8) >> {k}(2)", k = kind));
        assert_eq!(format!("{}", shl), "8", "shl for {}", kind);
        assert_eq!(format!("{}", shr), "2", "shr for {}", kind);
    }
    // uintptr renders in hex; compare by value.
    assert!(matches!(
        eval(&scope, "uintptr(2) << uintptr(2)"),
        Value::Uintptr(8)
    ));
    assert!(matches!(
        eval(&scope, "uintptr(8) >> uintptr(2)"),
        Value::Uintptr(2)
    ));
}

// === Functions, closures, defer ===

#[test]
fn func_literal_call() {
    let scope = Scope::new();
    eval(&scope, "f := func(x int) int { return x * 2 }");
    assert!(matches!(eval(&scope, "f(21)"), Value::Int(42)));
}

#[test]
fn closures_capture_defining_frame() {
    let scope = Scope::new();
    eval(&scope, "c := 0");
    eval(&scope, "inc := func() { c = c + 1 }");
    eval(&scope, "inc()");
    eval(&scope, "inc()");
    assert!(matches!(eval(&scope, "c"), Value::Int(2)));
}

#[test]
fn return_unwinds_the_body() {
    let scope = Scope::new();
    eval(&scope, "f := func() int { return 1; 2 }");
    assert!(matches!(eval(&scope, "f()"), Value::Int(1)));
}

#[test]
fn defer_ladder_runs_lifo() {
    let scope = Scope::new();
    scope.set("a", Value::Int(0));
    eval(
        &scope,
        "f := func(){defer func(){a=2}(); defer func(){a=3}(); a=1}",
    );
    eval(&scope, "f()");
    // Last-registered runs first; the earliest-registered defer writes last.
    assert!(matches!(eval(&scope, "a"), Value::Int(2)));
}

#[test]
fn defer_outside_function_fails() {
    let scope = Scope::new();
    let err = eval_err(&scope, "defer func(){}()");
    assert!(matches!(err, RuntimeError::DeferOutsideFunction));
}

#[test]
fn defer_arguments_evaluate_eagerly() {
    let scope = Scope::new();
    scope.set("got", Value::Int(0));
    eval(
        &scope,
        "f := func(){ x := 1; defer func(v int){got=v}(x); x = 99 }",
    );
    eval(&scope, "f()");
    assert!(matches!(eval(&scope, "got"), Value::Int(1)));
}

// === Control flow ===

#[test]
fn if_else_with_init() {
    let scope = Scope::new();
    assert!(matches!(
        eval(&scope, "if x := 5; x > 3 { 1 } else { 2 }"),
        Value::Int(1)
    ));
    assert!(matches!(
        eval(&scope, "if x := 2; x > 3 { 1 } else { 2 }"),
        Value::Int(2)
    ));
}

#[test]
fn if_requires_bool() {
    let scope = Scope::new();
    eval_err(&scope, "if 1 { 2 }");
}

#[test]
fn for_loop_with_break_continue() {
    let scope = Scope::new();
    eval(&scope, "sum := 0");
    eval(
        &scope,
        "for i := 0; i < 10; i++ { if i == 3 { continue }; if i == 6 { break }; sum += i }",
    );
    // 0+1+2+4+5 = 12
    assert!(matches!(eval(&scope, "sum"), Value::Int(12)));
}

#[test]
fn range_over_slice() {
    let scope = Scope::new();
    eval(&scope, "sum := 0");
    eval(&scope, "for _, v := range []int{1, 2, 3} { sum += v }");
    assert!(matches!(eval(&scope, "sum"), Value::Int(6)));
}

#[test]
fn range_keys_are_indices() {
    let scope = Scope::new();
    eval(&scope, "last := 0");
    eval(&scope, "for i := range []int{9, 9, 9} { last = i }");
    assert!(matches!(eval(&scope, "last"), Value::Int(2)));
}

#[test]
fn switch_with_tag() {
    let scope = Scope::new();
    eval(&scope, "x := 2");
    let out = eval(
        &scope,
        "switch x { case 1: \"one\"; case 2: \"two\"; default: \"many\" }",
    );
    assert!(matches!(out, Value::String(s) if s == "two"));
}

#[test]
fn bare_switch_is_a_condition_ladder() {
    let scope = Scope::new();
    eval(&scope, "x := 7");
    let out = eval(
        &scope,
        "switch { case x < 5: \"small\"; case x < 10: \"medium\"; default: \"large\" }",
    );
    assert!(matches!(out, Value::String(s) if s == "medium"));
}

#[test]
fn switch_default_when_nothing_matches() {
    let scope = Scope::new();
    eval(&scope, "x := 42");
    let out = eval(&scope, "switch x { case 1: \"one\"; default: \"many\" }");
    assert!(matches!(out, Value::String(s) if s == "many"));
}

#[test]
fn type_switch_selects_dynamic_type() {
    let scope = Scope::new();
    scope.set("x", Value::Int(3));
    let out = eval(
        &scope,
        "switch x.(type) { case string: \"str\"; case int: \"int\"; default: \"other\" }",
    );
    assert!(matches!(out, Value::String(s) if s == "int"));
}

#[test]
fn type_assertion() {
    let scope = Scope::new();
    scope.set("x", Value::Int(3));
    assert!(matches!(eval(&scope, "x.(int)"), Value::Int(3)));
    eval_err(&scope, "x.(string)");
}

// === Channels and select ===

#[test]
fn buffered_channel_send_recv() {
    let scope = Scope::new();
    eval(&scope, "a := make(chan int, 10)");
    eval(&scope, "a <- 1");
    eval(&scope, "a <- 2");
    let out = eval(&scope, "[]int{<-a, <-a}");
    match out {
        Value::Slice(s) => {
            let elems = s.to_vec();
            assert!(matches!(elems[0], Value::Int(1)));
            assert!(matches!(elems[1], Value::Int(2)));
        }
        other => panic!("expected slice, got {}", other),
    }
}

#[test]
fn unbuffered_send_without_receiver_fails() {
    let scope = Scope::new();
    eval(&scope, "a := make(chan int)");
    let err = eval_err(&scope, "a <- 1");
    assert!(matches!(err, RuntimeError::ChanSendFailed));
}

#[test]
fn select_prefers_ready_clause_over_default() {
    let scope = Scope::new();
    eval(&scope, "a := make(chan int, 1)");
    eval(&scope, "a <- 7");
    eval(&scope, "b := 0");
    eval(&scope, "select { case v := <-a: b = v; default: b = -1 }");
    assert!(matches!(eval(&scope, "b"), Value::Int(7)));
}

#[test]
fn select_takes_default_when_nothing_ready() {
    let scope = Scope::new();
    eval(&scope, "a := make(chan int, 1)");
    eval(&scope, "b := 0");
    eval(&scope, "select { case v := <-a: b = v; default: b = -1 }");
    assert!(matches!(eval(&scope, "b"), Value::Int(-1)));
}

#[test]
fn goroutine_sends_are_observed() {
    let scope = Scope::new();
    eval(&scope, "ch := make(chan int, 1)");
    eval(&scope, "go func() { ch <- 5 }()");
    // Blocking receive waits for the spawned task.
    assert!(matches!(eval(&scope, "<-ch"), Value::Int(5)));
}

#[test]
fn close_ends_blocking_receive() {
    let scope = Scope::new();
    eval(&scope, "ch := make(chan int, 1)");
    eval(&scope, "close(ch)");
    let err = eval_err(&scope, "<-ch");
    assert!(matches!(err, RuntimeError::ChanRecvFailed));
}

// === Pointers ===

#[test]
fn address_of_and_deref() {
    let scope = Scope::new();
    eval(&scope, "a := 5");
    eval(&scope, "p := &a");
    assert!(matches!(eval(&scope, "*p"), Value::Int(5)));
    eval(&scope, "a = 9");
    // The cell is stable: the pointer observes the write.
    assert!(matches!(eval(&scope, "*p"), Value::Int(9)));
    eval(&scope, "*p = 12");
    assert!(matches!(eval(&scope, "a"), Value::Int(12)));
}

#[test]
fn address_of_unbound_name_fails() {
    let scope = Scope::new();
    eval_err(&scope, "&nothing");
}

// === Multi-assignment ===

#[test]
fn multi_assign_destructures_slice() {
    let scope = Scope::new();
    eval(&scope, "f := func() []int { return []int{1, 2} }");
    eval(&scope, "a, b := f()");
    assert!(matches!(eval(&scope, "a"), Value::Int(1)));
    assert!(matches!(eval(&scope, "b"), Value::Int(2)));
}

#[test]
fn assignment_count_mismatch() {
    let scope = Scope::new();
    let err = eval_err(&scope, "a, b := 1, 2, 3");
    assert!(matches!(err, RuntimeError::AssignCountMismatch { .. }));
}

// === Var declarations ===

#[test]
fn var_declaration_with_type_zeros() {
    let scope = Scope::new();
    eval(&scope, "var a int");
    assert!(matches!(eval(&scope, "a"), Value::Int(0)));
    eval(&scope, "var b, c string");
    assert!(matches!(eval(&scope, "b"), Value::String(s) if s.is_empty()));
    assert!(matches!(eval(&scope, "c"), Value::String(s) if s.is_empty()));
}

#[test]
fn var_declaration_with_values() {
    let scope = Scope::new();
    eval(&scope, "var a = 3");
    assert!(matches!(eval(&scope, "a"), Value::Int(3)));
}
