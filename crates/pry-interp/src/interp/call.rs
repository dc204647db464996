// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Call dispatch: conversions, interpreted functions, host functions, and
//! the reflective primitives.

use std::sync::Arc;

use pry_ast::expr::Expr;
use pry_ast::Span;

use crate::gotype::{convert, GoType};
use crate::pkg::Package;
use crate::scope::Scope;
use crate::value::{Builtin, FuncVal, SliceRef, Value};

use super::RuntimeError;

impl Scope {
    /// Evaluate the callee and dispatch the call.
    pub fn execute_func(
        &self,
        fun_expr: &Expr,
        args: Vec<Value>,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        let fun = self.eval_expr(fun_expr)?;
        self.call_value(fun, args, span)
    }

    pub(crate) fn call_value(
        &self,
        fun: Value,
        args: Vec<Value>,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        match fun {
            // A type descriptor with one argument is a conversion cast.
            Value::Type(ty) => {
                if args.len() != 1 {
                    return Err(RuntimeError::ArityMismatch {
                        expected: 1,
                        got: args.len(),
                    });
                }
                convert(&ty, args.into_iter().next().unwrap())
            }

            Value::Func(fv) => self.call_function(&fv, args),

            Value::Native(nf) => {
                let ok = if nf.variadic {
                    args.len() >= nf.arity
                } else {
                    args.len() == nf.arity
                };
                if !ok {
                    return Err(RuntimeError::ArityMismatch {
                        expected: nf.arity,
                        got: args.len(),
                    });
                }
                (nf.f)(args)
            }

            Value::Builtin(b) => self.call_builtin(b, args, span),

            other => Err(RuntimeError::NotAFunction(other.type_name())),
        }
    }

    /// Call an interpreted function: bind arguments positionally in a fresh
    /// function frame, run the body, then drain deferred calls LIFO.
    pub(crate) fn call_function(
        &self,
        fv: &FuncVal,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        let frame = fv.scope.child_function();
        let mut i = 0;
        for param in &fv.lit.params {
            for name in &param.names {
                match args.get(i) {
                    Some(v) => frame.define(name, v.clone()),
                    None => {
                        return Err(RuntimeError::ArityMismatch {
                            expected: i + 1,
                            got: args.len(),
                        })
                    }
                }
                i += 1;
            }
        }

        let ret = match frame.interpret_block(&fv.lit.body) {
            Ok(v) => Ok(v),
            Err(RuntimeError::Return(v)) => Ok(v),
            Err(e) => Err(e),
        };

        // Deferred calls run on every exit path; their errors take
        // precedence over the normal return value.
        let mut out = ret;
        for d in frame.take_defers() {
            if let Err(e) = d.scope.execute_func(&d.fun, d.args, Span::default()) {
                out = Err(e);
            }
        }
        out
    }

    fn call_builtin(
        &self,
        b: Builtin,
        args: Vec<Value>,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        match b {
            Builtin::Append => builtin_append(args),
            Builtin::Make => builtin_make(args),
            Builtin::Len => {
                if args.len() != 1 {
                    return Err(RuntimeError::ArityMismatch {
                        expected: 1,
                        got: args.len(),
                    });
                }
                Ok(Value::Int(args[0].len()? as i64))
            }
            Builtin::Close => match args.first() {
                Some(Value::Chan(c)) => {
                    c.close();
                    Ok(Value::Nil)
                }
                _ => Err(RuntimeError::TypeError(
                    "close requires a channel".to_string(),
                )),
            },
            Builtin::PryType => {
                if args.len() != 1 {
                    return Err(RuntimeError::ArityMismatch {
                        expected: 1,
                        got: args.len(),
                    });
                }
                match args[0].go_type() {
                    Some(t) => Ok(Value::Type(t)),
                    None => Ok(Value::Nil),
                }
            }
            Builtin::PryMarker => Ok(Value::Nil),
            Builtin::PryApply => self.apply_breakpoint(args, span),
        }
    }

    /// Entry point of an injected breakpoint: build the REPL scope from the
    /// snapshot, record the source position, and hand off to the session's
    /// breakpoint hook.
    fn apply_breakpoint(&self, args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
        let session = self.session().clone();

        let snapshot = match args.into_iter().next() {
            Some(v) => v,
            None => {
                return Err(RuntimeError::ArityMismatch {
                    expected: 1,
                    got: 0,
                })
            }
        };

        // Accept &Scope{Vals: ...}, Scope{Vals: ...}, or a bare map.
        let vals = extract_snapshot_map(snapshot)?;

        let repl_scope = Scope::with_session(session.clone());
        if let Value::Map(m) = &vals {
            let entries = m.entries.lock().unwrap().clone();
            for (k, v) in entries {
                let name = match k {
                    crate::value::ValueKey::Str(s) => s,
                    other => {
                        return Err(RuntimeError::TypeError(format!(
                            "snapshot keys must be strings, got {:?}",
                            other
                        )))
                    }
                };
                repl_scope.set(&name, promote_package(v));
            }
        }

        // Record the breakpoint location for the checker and completion.
        if let Some(current) = session.current_file.lock().unwrap().clone() {
            let files = session.files.lock().unwrap();
            if let Some(sf) = files.get(&current) {
                let (line, _) = sf.lines.offset_to_line_col(span.start);
                *session.line.lock().unwrap() = line;
            }
            let shadow = crate::scope::shadow_path(&current);
            *session.path.lock().unwrap() = Some(shadow);
        }

        let hook = session.breakpoint.lock().unwrap().clone();
        if let Some(hook) = hook {
            hook(&repl_scope);
        }
        Ok(Value::Nil)
    }
}

/// Pull the Vals map out of whatever shape the snapshot arrived in.
fn extract_snapshot_map(snapshot: Value) -> Result<Value, RuntimeError> {
    match snapshot {
        Value::Pointer(cell) => {
            let inner = cell.lock().unwrap().clone();
            extract_snapshot_map(inner)
        }
        Value::Struct(s) => s
            .field_by_name("Vals")
            .ok_or_else(|| RuntimeError::UnknownField("Vals".to_string())),
        m @ Value::Map(_) => Ok(m),
        other => Err(RuntimeError::TypeError(format!(
            "Apply expects a scope snapshot, got {}",
            other.type_name()
        ))),
    }
}

/// Snapshot tables carry package descriptors as `Package{Name, Functions}`
/// struct literals; promote them to real package values so selectors work.
fn promote_package(v: Value) -> Value {
    if let Value::Struct(s) = &v {
        if s.def.name == "Package" || s.def.name == "pry.Package" {
            let name = match s.field_by_name("Name") {
                Some(Value::String(n)) => n,
                _ => return v,
            };
            let functions = match s.field_by_name("Functions") {
                Some(Value::Map(m)) => {
                    let mut table = std::collections::HashMap::new();
                    for (k, f) in m.entries.lock().unwrap().iter() {
                        if let crate::value::ValueKey::Str(key) = k {
                            table.insert(key.clone(), f.clone());
                        }
                    }
                    table
                }
                _ => return v,
            };
            return Value::Package(Arc::new(Package {
                name,
                functions,
            }));
        }
    }
    v
}

fn builtin_append(args: Vec<Value>) -> Result<Value, RuntimeError> {
    let mut iter = args.into_iter();
    let arr = iter.next().ok_or(RuntimeError::ArityMismatch {
        expected: 1,
        got: 0,
    })?;
    let s = match &arr {
        Value::Slice(s) => s.clone(),
        other => {
            return Err(RuntimeError::TypeError(format!(
                "cannot append to {}",
                other.type_name()
            )))
        }
    };
    let mut out = s.to_vec();
    for elem in iter {
        let matches = match elem.go_type() {
            Some(t) => t == s.elem || s.elem == GoType::Interface,
            None => true, // nil appends into reference-kind slices
        };
        if !matches {
            return Err(RuntimeError::TypeError(format!(
                "{} cannot append to []{}",
                elem.type_name(),
                s.elem
            )));
        }
        out.push(elem);
    }
    Ok(Value::Slice(SliceRef::from_vec(out, s.elem)))
}

fn builtin_make(args: Vec<Value>) -> Result<Value, RuntimeError> {
    let mut iter = args.into_iter();
    let ty = match iter.next() {
        Some(Value::Type(t)) => t,
        Some(other) => {
            return Err(RuntimeError::TypeError(format!(
                "invalid type {}",
                other.type_name()
            )))
        }
        None => {
            return Err(RuntimeError::ArityMismatch {
                expected: 1,
                got: 0,
            })
        }
    };
    let rest: Vec<Value> = iter.collect();

    match &ty {
        GoType::Slice(_) => {
            if rest.is_empty() || rest.len() > 2 {
                return Err(RuntimeError::TypeError(
                    "invalid number of arguments. Missing len or extra?".to_string(),
                ));
            }
            let len = rest[0]
                .as_int()
                .ok_or_else(|| RuntimeError::TypeError("len is not int".to_string()))?;
            if let Some(cap) = rest.get(1) {
                cap.as_int()
                    .ok_or_else(|| RuntimeError::TypeError("cap is not int".to_string()))?;
            }
            ty.make_slice(len as usize)
        }
        GoType::Chan(elem) => {
            if rest.len() > 1 {
                return Err(RuntimeError::TypeError("too many arguments".to_string()));
            }
            let size = match rest.first() {
                Some(v) => v
                    .as_int()
                    .ok_or_else(|| RuntimeError::TypeError("size is not int".to_string()))?
                    as usize,
                None => 0,
            };
            Ok(Value::Chan(Arc::new(crate::chan::Channel::new(
                (**elem).clone(),
                size,
            ))))
        }
        other => Err(RuntimeError::TypeError(format!(
            "unknown kind type {}",
            other
        ))),
    }
}
