// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Assignment statements and l-value resolution.

use pry_ast::expr::{BinOp, Expr, ExprKind, UnaryOp};
use pry_ast::stmt::AssignOp;

use crate::kernel::compute_binary_op;
use crate::scope::Scope;
use crate::value::{SliceRef, Value, ValueKey};

use super::RuntimeError;

impl Scope {
    pub(super) fn exec_assign(
        &self,
        lhs: &[Expr],
        rhs: &[Expr],
        op: AssignOp,
    ) -> Result<Value, RuntimeError> {
        // All right-hand sides evaluate first, left to right.
        let mut rhs_vals = Vec::with_capacity(rhs.len());
        for e in rhs {
            rhs_vals.push(self.eval_expr(e)?);
        }

        // A single slice result destructures across multiple targets
        // (multi-value returns arrive as a slice).
        if rhs_vals.len() == 1 && lhs.len() > 1 {
            if let Value::Slice(s) = &rhs_vals[0] {
                let expanded = s.to_vec();
                if expanded.len() != lhs.len() {
                    return Err(RuntimeError::AssignCountMismatch {
                        lhs: lhs.len(),
                        rhs: expanded.len(),
                    });
                }
                rhs_vals = expanded;
            }
        }

        if rhs_vals.len() != lhs.len() {
            return Err(RuntimeError::AssignCountMismatch {
                lhs: lhs.len(),
                rhs: rhs_vals.len(),
            });
        }

        for (target, r) in lhs.iter().zip(rhs_vals.iter()) {
            self.assign_one(target, r.clone(), op)?;
        }

        if rhs_vals.len() > 1 {
            return Ok(Value::Slice(SliceRef::from_vec(
                rhs_vals,
                crate::gotype::GoType::Interface,
            )));
        }
        Ok(rhs_vals.pop().unwrap_or(Value::Nil))
    }

    fn assign_one(&self, target: &Expr, r: Value, op: AssignOp) -> Result<Value, RuntimeError> {
        match &target.kind {
            ExprKind::Ident(name) => {
                if name == "_" {
                    return Ok(Value::Nil);
                }
                let existing = self.get(name);
                if existing.is_none() && op != AssignOp::Define {
                    return Err(RuntimeError::Undefined(name.clone()));
                }
                let value = match op.base() {
                    Some(base) => {
                        compute_binary_op(&existing.unwrap_or(Value::Nil), &r, base)?
                    }
                    None => r,
                };
                self.set(name, value);
                Ok(Value::Nil)
            }

            ExprKind::Index { x, index } => {
                let container = self.eval_expr(x)?.auto_deref();
                let index = self.eval_expr(index)?;
                match container {
                    Value::Map(m) => {
                        let key = ValueKey::from_value(&index)?;
                        let value = match op.base() {
                            Some(base) => {
                                // Compound assigns read the current element
                                // or the element zero.
                                let old = m
                                    .entries
                                    .lock()
                                    .unwrap()
                                    .get(&key)
                                    .cloned()
                                    .unwrap_or_else(|| m.elem.zero());
                                compute_binary_op(&old, &r, base)?
                            }
                            None => r,
                        };
                        m.entries.lock().unwrap().insert(key, value);
                        Ok(Value::Nil)
                    }
                    Value::Slice(s) => {
                        let i = int_index(&index)?;
                        if i >= s.len {
                            return Err(RuntimeError::IndexOutOfRange);
                        }
                        let value = match op.base() {
                            Some(base) => compute_binary_op(&s.get(i), &r, base)?,
                            None => r,
                        };
                        s.set(i, value);
                        Ok(Value::Nil)
                    }
                    Value::Array(a) => {
                        let i = int_index(&index)?;
                        let mut data = a.data.lock().unwrap();
                        if i >= data.len() {
                            return Err(RuntimeError::IndexOutOfRange);
                        }
                        let value = match op.base() {
                            Some(base) => compute_binary_op(&data[i], &r, base)?,
                            None => r,
                        };
                        data[i] = value;
                        Ok(Value::Nil)
                    }
                    other => Err(RuntimeError::TypeError(format!(
                        "cannot assign through index of {}",
                        other.type_name()
                    ))),
                }
            }

            ExprKind::Selector { x, sel } => {
                match self.eval_expr(x)?.auto_deref() {
                    Value::Struct(s) => {
                        let idx = s
                            .def
                            .fields
                            .iter()
                            .position(|f| f.name == *sel)
                            .ok_or_else(|| RuntimeError::UnknownField(sel.clone()))?;
                        let mut fields = s.fields.lock().unwrap();
                        let value = match op.base() {
                            Some(base) => compute_binary_op(&fields[idx], &r, base)?,
                            None => r,
                        };
                        fields[idx] = value;
                        Ok(Value::Nil)
                    }
                    other => Err(RuntimeError::TypeError(format!(
                        "cannot assign to field of {}",
                        other.type_name()
                    ))),
                }
            }

            // *p = v writes through the pointed-to cell.
            ExprKind::Unary {
                op: UnaryOp::Deref,
                x,
            } => match self.eval_expr(x)? {
                Value::Pointer(cell) => {
                    let value = match op.base() {
                        Some(base) => {
                            let old = cell.lock().unwrap().clone();
                            compute_binary_op(&old, &r, base)?
                        }
                        None => r,
                    };
                    *cell.lock().unwrap() = value;
                    Ok(Value::Nil)
                }
                other => Err(RuntimeError::TypeError(format!(
                    "cannot assign through {}",
                    other.type_name()
                ))),
            },

            ExprKind::Paren(inner) => self.assign_one(inner, r, op),

            _ => Err(RuntimeError::TypeError(format!(
                "unknown assignment target {:?}",
                target.kind
            ))),
        }
    }

    /// x++ / x-- desugar to an assignment against the literal 1.
    pub(super) fn exec_incdec(&self, x: &Expr, inc: bool) -> Result<Value, RuntimeError> {
        let one = Expr {
            kind: ExprKind::Int(1),
            span: x.span,
        };
        let bin = Expr {
            kind: ExprKind::Binary {
                op: if inc { BinOp::Add } else { BinOp::Sub },
                x: Box::new(x.clone()),
                y: Box::new(one),
            },
            span: x.span,
        };
        self.exec_assign(
            std::slice::from_ref(x),
            std::slice::from_ref(&bin),
            AssignOp::Assign,
        )
    }
}

fn int_index(v: &Value) -> Result<usize, RuntimeError> {
    let i = v.as_int().ok_or_else(|| {
        RuntimeError::TypeError(format!("index has to be an int not {}", v.type_name()))
    })?;
    if i < 0 {
        return Err(RuntimeError::IndexOutOfRange);
    }
    Ok(i as usize)
}
