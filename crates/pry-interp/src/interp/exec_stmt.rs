// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Statement execution and control flow.

use pry_ast::expr::{Expr, ExprKind};
use pry_ast::stmt::{CaseClause, Stmt, StmtKind};

use crate::kernel::deep_equal;
use crate::scope::{DeferredCall, Scope};
use crate::value::{SliceRef, Value, ValueKey};

use super::RuntimeError;

/// Poll interval for the select loop; selects busy-poll rather than block.
const SELECT_POLL: std::time::Duration = std::time::Duration::from_millis(10);

impl Scope {
    pub fn exec_stmt(&self, stmt: &Stmt) -> Result<Value, RuntimeError> {
        match &stmt.kind {
            StmtKind::Expr(e) => self.eval_expr(e),

            StmtKind::Assign { lhs, rhs, op } => self.exec_assign(lhs, rhs, *op),

            // x++ desugars to x = x + 1 against the literal 1.
            StmtKind::IncDec { x, inc } => self.exec_incdec(x, *inc),

            StmtKind::Var { names, ty, values } => {
                let zero = match ty {
                    Some(ty_expr) => Some(self.eval_type(ty_expr)?.zero()),
                    None => None,
                };
                for (i, name) in names.iter().enumerate() {
                    if let Some(value_expr) = values.get(i) {
                        let v = self.eval_expr(value_expr)?;
                        self.set(name, v);
                    } else {
                        let v = zero.clone().ok_or_else(|| {
                            RuntimeError::TypeError(format!(
                                "missing initializer for {}",
                                name
                            ))
                        })?;
                        self.set(name, v);
                    }
                }
                Ok(Value::Nil)
            }

            StmtKind::Return(exprs) => {
                let mut results = Vec::with_capacity(exprs.len());
                for e in exprs {
                    results.push(self.eval_expr(e)?);
                }
                let value = match results.len() {
                    0 => Value::Nil,
                    1 => results.remove(0),
                    _ => Value::Slice(SliceRef::from_vec(
                        results,
                        crate::gotype::GoType::Interface,
                    )),
                };
                Err(RuntimeError::Return(value))
            }

            StmtKind::Break => Err(RuntimeError::Break),
            StmtKind::Continue => Err(RuntimeError::Continue),

            StmtKind::Block(stmts) => self.interpret_block(stmts),

            StmtKind::If {
                init,
                cond,
                then,
                els,
            } => {
                let scope = self.child();
                if let Some(init) = init {
                    scope.exec_stmt(init)?;
                }
                let cond = scope.eval_expr(cond)?;
                match cond {
                    Value::Bool(true) => scope.interpret_block(then),
                    Value::Bool(false) => match els {
                        Some(els) => scope.exec_stmt(els),
                        None => Ok(Value::Nil),
                    },
                    other => Err(RuntimeError::TypeError(format!(
                        "if requires a boolean condition not {}",
                        other.type_name()
                    ))),
                }
            }

            StmtKind::For {
                init,
                cond,
                post,
                body,
            } => {
                let scope = self.child();
                if let Some(init) = init {
                    scope.exec_stmt(init)?;
                }
                let mut last = Value::Nil;
                loop {
                    if let Some(cond) = cond {
                        match scope.eval_expr(cond)? {
                            Value::Bool(true) => {}
                            Value::Bool(false) => return Ok(last),
                            other => {
                                return Err(RuntimeError::TypeError(format!(
                                    "for loop requires a boolean condition not {}",
                                    other.type_name()
                                )))
                            }
                        }
                    }
                    match scope.interpret_block(body) {
                        Ok(v) => last = v,
                        Err(RuntimeError::Break) => break,
                        Err(RuntimeError::Continue) => {}
                        Err(e) => return Err(e),
                    }
                    if let Some(post) = post {
                        scope.exec_stmt(post)?;
                    }
                }
                Ok(last)
            }

            StmtKind::Range {
                key,
                value,
                x,
                body,
            } => self.exec_range(key.as_deref(), value.as_deref(), x, body),

            StmtKind::Switch { init, tag, cases } => self.exec_switch(init, tag, cases),

            StmtKind::TypeSwitch {
                init,
                binding,
                x,
                cases,
            } => self.exec_type_switch(init, binding.as_deref(), x, cases),

            StmtKind::Select { cases } => self.exec_select(cases),

            StmtKind::Go(call) => {
                let scope = self.child();
                let call = call.clone();
                std::thread::spawn(move || {
                    // Goroutine failures go to the process error sink; the
                    // parent is not notified.
                    if let Err(err) = scope.eval_expr(&call) {
                        if !err.is_sentinel() {
                            eprintln!("goroutine failed: {}", err);
                        }
                    }
                });
                Ok(Value::Nil)
            }

            StmtKind::Defer(call) => {
                let (fun, args) = match &call.kind {
                    ExprKind::Call { fun, args } => (fun, args),
                    _ => {
                        return Err(RuntimeError::TypeError(
                            "defer requires a function call".to_string(),
                        ))
                    }
                };
                // Arguments are captured eagerly; the callee expression and
                // its scope are captured for invocation at function exit.
                let mut evaluated = Vec::with_capacity(args.len());
                for arg in args {
                    evaluated.push(self.eval_expr(arg)?);
                }
                self.push_defer(DeferredCall {
                    fun: (**fun).clone(),
                    scope: self.clone(),
                    args: evaluated,
                })?;
                Ok(Value::Nil)
            }

            StmtKind::Send { chan, value } => {
                let v = self.eval_expr(value)?;
                let ch = self.eval_expr(chan)?;
                match ch {
                    Value::Chan(c) => {
                        if c.try_send(v) {
                            Ok(Value::Nil)
                        } else {
                            Err(RuntimeError::ChanSendFailed)
                        }
                    }
                    other => Err(RuntimeError::TypeError(format!(
                        "expected chan; got {}",
                        other.type_name()
                    ))),
                }
            }
        }
    }

    fn exec_range(
        &self,
        key: Option<&str>,
        value: Option<&str>,
        x: &Expr,
        body: &[Stmt],
    ) -> Result<Value, RuntimeError> {
        let scope = self.child();
        let ranger = scope.eval_expr(x)?;

        macro_rules! run_body {
            () => {
                match scope.interpret_block(body) {
                    Ok(_) => {}
                    Err(RuntimeError::Break) => break,
                    Err(RuntimeError::Continue) => continue,
                    Err(e) => return Err(e),
                }
            };
        }

        match ranger {
            Value::Slice(_) | Value::Array(_) => {
                let elems = match &ranger {
                    Value::Slice(s) => s.to_vec(),
                    Value::Array(a) => a.data.lock().unwrap().clone(),
                    _ => unreachable!(),
                };
                for (i, elem) in elems.into_iter().enumerate() {
                    if let Some(key) = key {
                        scope.set(key, Value::Int(i as i64));
                    }
                    if let Some(value) = value {
                        scope.set(value, elem);
                    }
                    run_body!();
                }
                Ok(Value::Nil)
            }
            Value::Map(m) => {
                // Snapshot entries so the body can mutate the map freely;
                // iteration order is unspecified.
                let entries: Vec<(ValueKey, Value)> = m
                    .entries
                    .lock()
                    .unwrap()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                for (k, v) in entries {
                    if let Some(key) = key {
                        scope.set(key, k.to_value(&m.key));
                    }
                    if let Some(value) = value {
                        scope.set(value, v);
                    }
                    run_body!();
                }
                Ok(Value::Nil)
            }
            other => Err(RuntimeError::TypeError(format!(
                "ranging on {} is unsupported",
                other.type_name()
            ))),
        }
    }

    fn exec_switch(
        &self,
        init: &Option<Box<Stmt>>,
        tag: &Option<Expr>,
        cases: &[CaseClause],
    ) -> Result<Value, RuntimeError> {
        let scope = self.child();
        if let Some(init) = init {
            scope.exec_stmt(init)?;
        }

        // A missing tag defaults to true so a bare switch is a
        // condition ladder.
        let want = match tag {
            Some(tag) => scope.eval_expr(tag)?,
            None => Value::Bool(true),
        };

        let mut default_case: Option<&CaseClause> = None;
        for cc in cases {
            if cc.list.is_empty() {
                default_case = Some(cc);
                continue;
            }
            for c in &cc.list {
                let child = scope.child();
                let out = child.eval_expr(c)?;
                if deep_equal(&out, &want) {
                    return child.interpret_block(&cc.body);
                }
            }
        }
        if let Some(cc) = default_case {
            let child = scope.child();
            return child.interpret_block(&cc.body);
        }
        Ok(Value::Nil)
    }

    fn exec_type_switch(
        &self,
        init: &Option<Box<Stmt>>,
        binding: Option<&str>,
        x: &Expr,
        cases: &[CaseClause],
    ) -> Result<Value, RuntimeError> {
        let scope = self.child();
        if let Some(init) = init {
            scope.exec_stmt(init)?;
        }

        // Evaluate the bare assertion: remembers the dynamic type and
        // yields the value for the optional binding.
        let subject = scope.eval_expr(x)?;
        let want = subject.go_type();
        scope.set_type_assert(want.clone());
        if let Some(binding) = binding {
            scope.set(binding, subject);
        }

        let mut default_case: Option<&CaseClause> = None;
        for cc in cases {
            if cc.list.is_empty() {
                default_case = Some(cc);
                continue;
            }
            for c in &cc.list {
                let child = scope.child();
                let case_ty = child.eval_type(c)?;
                if want.as_ref() == Some(&case_ty) {
                    return child.interpret_block(&cc.body);
                }
            }
        }
        if let Some(cc) = default_case {
            let child = scope.child();
            return child.interpret_block(&cc.body);
        }
        Ok(Value::Nil)
    }

    fn exec_select(
        &self,
        cases: &[pry_ast::stmt::CommClause],
    ) -> Result<Value, RuntimeError> {
        let mut default_case = None;
        let mut clauses = Vec::new();
        for cc in cases {
            match &cc.comm {
                None => default_case = Some(cc),
                Some(_) => clauses.push(cc),
            }
        }

        // Polling, not a true multiplexed wait: each clause is attempted in
        // a select-marked frame; channel retries surface as sentinels.
        loop {
            for cc in &clauses {
                let child = self.child_select();
                let comm = cc.comm.as_ref().unwrap();
                let result = child.exec_stmt(comm);
                child.set_select(false);
                match result {
                    Err(RuntimeError::ChanSendFailed)
                    | Err(RuntimeError::ChanRecvInSelect)
                    | Err(RuntimeError::Continue) => continue,
                    Err(e) => return Err(e),
                    Ok(_) => return child.interpret_block(&cc.body),
                }
            }
            if let Some(cc) = default_case {
                let child = self.child();
                return child.interpret_block(&cc.body);
            }
            std::thread::sleep(SELECT_POLL);
        }
    }
}
