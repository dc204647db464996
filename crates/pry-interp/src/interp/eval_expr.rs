// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Expression evaluation.

use std::sync::{Arc, Mutex};

use pry_ast::expr::{Expr, ExprKind, UnaryOp};

use crate::gotype::{GoType, StructDef};
use crate::kernel;
use crate::scope::Scope;
use crate::value::{ArrayRef, FuncVal, MapRef, SliceRef, StructVal, Value, ValueKey};

use super::RuntimeError;

impl Scope {
    pub fn eval_expr(&self, e: &Expr) -> Result<Value, RuntimeError> {
        match &e.kind {
            ExprKind::Int(n) => Ok(Value::Int(*n)),
            ExprKind::UintBig(n) => Ok(Value::Uint(*n)),
            ExprKind::Float(n) => Ok(Value::Float64(*n)),
            ExprKind::Imag(n) => Ok(Value::Float64(*n)),
            ExprKind::Char(c) => Ok(Value::Int32(*c as i32)),
            ExprKind::String(s) => Ok(Value::String(s.clone())),

            ExprKind::Ident(name) => self.eval_ident(name),

            ExprKind::Selector { x, sel } => {
                let x = self.eval_expr(x)?;
                self.eval_selector(x, sel)
            }

            ExprKind::Call { fun, args } => {
                let mut arg_vals = Vec::with_capacity(args.len());
                for arg in args {
                    arg_vals.push(self.eval_expr(arg)?);
                }
                self.execute_func(fun, arg_vals, e.span)
            }

            ExprKind::Binary { op, x, y } => {
                let x = self.eval_expr(x)?;
                let y = self.eval_expr(y)?;
                kernel::compute_binary_op(&x, &y, *op)
            }

            ExprKind::Unary { op, x } => self.eval_unary(*op, x),

            ExprKind::Index { x, index } => {
                let x = self.eval_expr(x)?;
                let index = self.eval_expr(index)?;
                self.eval_index(x, index)
            }

            ExprKind::Slice { x, low, high } => self.eval_slice_expr(x, low, high),

            ExprKind::Paren(inner) => self.eval_expr(inner),

            ExprKind::FuncLit(lit) => Ok(Value::Func(FuncVal {
                lit: Arc::new(lit.clone()),
                scope: self.clone(),
            })),

            ExprKind::CompositeLit { ty, elts } => self.eval_composite(ty, elts),

            ExprKind::KeyValue { .. } => Err(RuntimeError::TypeError(
                "key-value pair is only valid inside a composite literal".to_string(),
            )),

            ExprKind::TypeAssert { x, ty } => {
                let out = self.eval_expr(x)?;
                let dynamic = out.go_type();
                match ty {
                    // Bare x.(type) publishes the dynamic type for the
                    // enclosing type switch and passes the value through.
                    None => {
                        self.set_type_assert(dynamic);
                        Ok(out)
                    }
                    Some(ty_expr) => {
                        let want = self.eval_type(ty_expr)?;
                        if dynamic.as_ref() == Some(&want) {
                            Ok(out)
                        } else {
                            Err(RuntimeError::TypeError(format!(
                                "{} is not of type {}, is {}",
                                out,
                                want,
                                out.type_name()
                            )))
                        }
                    }
                }
            }

            ExprKind::ArrayType { .. }
            | ExprKind::MapType { .. }
            | ExprKind::ChanType { .. }
            | ExprKind::StructType { .. }
            | ExprKind::InterfaceType { .. } => self.eval_type(e).map(Value::Type),

            ExprKind::FuncType { .. } => Err(RuntimeError::TypeError(
                "function types are not first-class values".to_string(),
            )),
        }
    }

    fn eval_ident(&self, name: &str) -> Result<Value, RuntimeError> {
        // Scalar type keywords resolve to descriptors before anything else.
        if let Some(ty) = GoType::by_name(name) {
            return Ok(Value::Type(ty));
        }
        if let Some(v) = self.get(name) {
            return Ok(v);
        }
        // The built-in environment: predeclared names and the reflective
        // primitives.
        match name {
            "nil" => Ok(Value::Nil),
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            "append" => Ok(Value::Builtin(crate::value::Builtin::Append)),
            "make" => Ok(Value::Builtin(crate::value::Builtin::Make)),
            "len" => Ok(Value::Builtin(crate::value::Builtin::Len)),
            "close" => Ok(Value::Builtin(crate::value::Builtin::Close)),
            _ => Err(RuntimeError::UnknownIdent(name.to_string())),
        }
    }

    pub(crate) fn eval_selector(&self, x: Value, sel: &str) -> Result<Value, RuntimeError> {
        match x {
            Value::Package(pkg) => pkg
                .functions
                .get(sel)
                .cloned()
                .ok_or_else(|| RuntimeError::UnknownField(sel.to_string())),
            // One pointer level is dereferenced automatically.
            Value::Pointer(cell) => {
                let inner = cell.lock().unwrap().clone();
                self.eval_selector(inner, sel)
            }
            Value::Struct(s) => {
                // Methods resolve before fields.
                if let Some(bound) = self.bound_method(&s, sel) {
                    return Ok(bound);
                }
                s.field_by_name(sel)
                    .ok_or_else(|| RuntimeError::UnknownField(sel.to_string()))
            }
            other => Err(RuntimeError::TypeError(format!(
                "{} is not a struct and thus has no field {:?}",
                other, sel
            ))),
        }
    }

    /// Look up a registered method on the value's named type and bind the
    /// receiver into a fresh frame under its declared name.
    fn bound_method(&self, s: &StructVal, sel: &str) -> Option<Value> {
        let methods = self.session().methods.lock().unwrap();
        let def = methods.get(&s.def.name)?.get(sel)?;
        let frame = def.func.scope.child();
        frame.define(&def.recv_name, Value::Struct(s.clone()));
        Some(Value::Func(FuncVal {
            lit: def.func.lit.clone(),
            scope: frame,
        }))
    }

    fn eval_unary(&self, op: UnaryOp, x: &Expr) -> Result<Value, RuntimeError> {
        match op {
            UnaryOp::Addr => match &x.kind {
                ExprKind::Ident(name) => self
                    .get_cell(name)
                    .map(Value::Pointer)
                    .ok_or_else(|| RuntimeError::UnknownIdent(name.clone())),
                // Injected snapshots take the address of a fresh composite.
                ExprKind::CompositeLit { .. } => {
                    let v = self.eval_expr(x)?;
                    Ok(Value::Pointer(Arc::new(Mutex::new(v))))
                }
                _ => Err(RuntimeError::TypeError(format!(
                    "expected identifier after &, got {:?}",
                    x.kind
                ))),
            },
            UnaryOp::Recv => {
                let ch = self.eval_expr(x)?;
                let ch = match ch {
                    Value::Chan(c) => c,
                    other => {
                        return Err(RuntimeError::TypeError(format!(
                            "expected chan; got {}",
                            other.type_name()
                        )))
                    }
                };
                if self.is_select() {
                    ch.try_recv().ok_or(RuntimeError::ChanRecvInSelect)
                } else {
                    ch.recv().map_err(|()| RuntimeError::ChanRecvFailed)
                }
            }
            UnaryOp::Deref => {
                let v = self.eval_expr(x)?;
                match v {
                    Value::Pointer(cell) => Ok(cell.lock().unwrap().clone()),
                    other => Err(RuntimeError::TypeError(format!(
                        "cannot dereference {}",
                        other.type_name()
                    ))),
                }
            }
            _ => {
                let v = self.eval_expr(x)?;
                kernel::compute_unary_op(&v, op)
            }
        }
    }

    pub(crate) fn eval_index(&self, x: Value, index: Value) -> Result<Value, RuntimeError> {
        // Auto-deref pointer levels.
        match x.auto_deref() {
            Value::Map(m) => {
                let key = ValueKey::from_value(&index)?;
                let entries = m.entries.lock().unwrap();
                // A missing key reads as the element zero, matching the
                // host's map semantics.
                Ok(entries
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| m.elem.zero()))
            }
            Value::Slice(s) => {
                let i = index.as_int().ok_or_else(|| {
                    RuntimeError::TypeError(format!(
                        "index has to be an int not {}",
                        index.type_name()
                    ))
                })?;
                if i < 0 || i as usize >= s.len {
                    return Err(RuntimeError::IndexOutOfRange);
                }
                Ok(s.get(i as usize))
            }
            Value::Array(a) => {
                let i = index.as_int().ok_or_else(|| {
                    RuntimeError::TypeError(format!(
                        "index has to be an int not {}",
                        index.type_name()
                    ))
                })?;
                let data = a.data.lock().unwrap();
                if i < 0 || i as usize >= data.len() {
                    return Err(RuntimeError::IndexOutOfRange);
                }
                Ok(data[i as usize].clone())
            }
            other => Err(RuntimeError::TypeError(format!(
                "invalid X for IndexExpr: {}",
                other.type_name()
            ))),
        }
    }

    fn eval_slice_expr(
        &self,
        x: &Expr,
        low: &Option<Box<Expr>>,
        high: &Option<Box<Expr>>,
    ) -> Result<Value, RuntimeError> {
        let low = match low {
            Some(e) => Some(self.eval_expr(e)?),
            None => None,
        };
        let high = match high {
            Some(e) => Some(self.eval_expr(e)?),
            None => None,
        };
        let x = self.eval_expr(x)?;

        let (data, off, len, elem) = match &x {
            Value::Slice(s) => (s.data.clone(), s.off, s.len, s.elem.clone()),
            Value::Array(a) => {
                let len = a.len();
                (a.data.clone(), 0, len, a.elem.clone())
            }
            other => {
                return Err(RuntimeError::TypeError(format!(
                    "invalid X for SliceExpr: {}",
                    other.type_name()
                )))
            }
        };

        let lo = match low {
            None => 0,
            Some(v) => v.as_int().ok_or_else(|| {
                RuntimeError::TypeError(format!(
                    "slice: indexes have to be ints not {}",
                    v.type_name()
                ))
            })?,
        };
        let hi = match high {
            None => len as i64,
            Some(v) => v.as_int().ok_or_else(|| {
                RuntimeError::TypeError(format!(
                    "slice: indexes have to be ints not {}",
                    v.type_name()
                ))
            })?,
        };

        // hi == len is permitted; hi > len is not.
        if lo < 0 || hi < lo || hi as usize > len {
            return Err(RuntimeError::SliceOutOfBounds);
        }

        // A view over the original backing storage.
        Ok(Value::Slice(SliceRef {
            data,
            off: off + lo as usize,
            len: (hi - lo) as usize,
            elem,
        }))
    }

    fn eval_composite(&self, ty: &Expr, elts: &[Expr]) -> Result<Value, RuntimeError> {
        let head = self.eval_expr(ty)?;
        let head = match head {
            Value::Type(t) => t,
            other => {
                return Err(RuntimeError::TypeError(format!(
                    "unknown composite literal head {}",
                    other.type_name()
                )))
            }
        };

        match head {
            GoType::Slice(elem) => {
                let mut out = Vec::with_capacity(elts.len());
                for elt in elts {
                    out.push(self.eval_expr(elt)?);
                }
                Ok(Value::Slice(SliceRef::from_vec(out, *elem)))
            }
            GoType::Array(n, elem) => {
                if elts.len() > n {
                    return Err(RuntimeError::ArrayOutOfBounds { index: n, len: n });
                }
                let mut out: Vec<Value> = (0..n).map(|_| elem.zero()).collect();
                for (i, elt) in elts.iter().enumerate() {
                    out[i] = self.eval_expr(elt)?;
                }
                Ok(Value::Array(ArrayRef {
                    data: Arc::new(Mutex::new(out)),
                    elem: *elem,
                }))
            }
            GoType::Map(key_ty, elem_ty) => {
                let map = MapRef::new(*key_ty, *elem_ty);
                for elt in elts {
                    match &elt.kind {
                        ExprKind::KeyValue { key, value } => {
                            let k = self.eval_expr(key)?;
                            let v = self.eval_expr(value)?;
                            map.entries
                                .lock()
                                .unwrap()
                                .insert(ValueKey::from_value(&k)?, v);
                        }
                        _ => {
                            return Err(RuntimeError::TypeError(
                                "invalid element in map literal; expecting key value pair"
                                    .to_string(),
                            ))
                        }
                    }
                }
                Ok(Value::Map(map))
            }
            GoType::Struct(def) => {
                let mut fields: Vec<Value> = def.fields.iter().map(|f| f.ty.zero()).collect();
                for (i, elt) in elts.iter().enumerate() {
                    match &elt.kind {
                        ExprKind::KeyValue { key, value } => {
                            let name = match &key.kind {
                                ExprKind::Ident(n) => n.clone(),
                                _ => {
                                    return Err(RuntimeError::TypeError(
                                        "struct literal keys must be field names".to_string(),
                                    ))
                                }
                            };
                            let idx = def
                                .fields
                                .iter()
                                .position(|f| f.name == name)
                                .ok_or_else(|| RuntimeError::UnknownField(name))?;
                            fields[idx] = self.eval_expr(value)?;
                        }
                        _ => {
                            if i >= fields.len() {
                                return Err(RuntimeError::TypeError(format!(
                                    "too many values in {} literal",
                                    def.name
                                )));
                            }
                            fields[i] = self.eval_expr(elt)?;
                        }
                    }
                }
                Ok(Value::Struct(StructVal {
                    def,
                    fields: Arc::new(Mutex::new(fields)),
                }))
            }
            other => Err(RuntimeError::TypeError(format!(
                "unknown composite literal {}",
                other
            ))),
        }
    }

    /// Evaluate a type expression to its descriptor.
    pub fn eval_type(&self, e: &Expr) -> Result<GoType, RuntimeError> {
        match &e.kind {
            ExprKind::ArrayType { len, elem } => {
                let elem_ty = self.eval_type(elem)?;
                match len {
                    None => Ok(GoType::Slice(Box::new(elem_ty))),
                    Some(len_expr) => {
                        let len = self.eval_expr(len_expr)?;
                        let n = len.as_int().ok_or_else(|| {
                            RuntimeError::TypeError(format!(
                                "expected int; got {}",
                                len.type_name()
                            ))
                        })?;
                        if n < 0 {
                            return Err(RuntimeError::TypeError(
                                "negative array size".to_string(),
                            ));
                        }
                        Ok(GoType::Array(n as usize, Box::new(elem_ty)))
                    }
                }
            }
            ExprKind::MapType { key, value } => Ok(GoType::Map(
                Box::new(self.eval_type(key)?),
                Box::new(self.eval_type(value)?),
            )),
            ExprKind::ChanType { elem } => Ok(GoType::Chan(Box::new(self.eval_type(elem)?))),
            ExprKind::StructType { fields } => {
                if !fields.is_empty() {
                    return Err(RuntimeError::TypeError(
                        "don't support non-empty structs yet".to_string(),
                    ));
                }
                Ok(GoType::Struct(Arc::new(StructDef {
                    name: String::new(),
                    fields: vec![],
                })))
            }
            ExprKind::InterfaceType { methods } => {
                if !methods.is_empty() {
                    return Err(RuntimeError::TypeError(
                        "don't support non-anonymous interfaces yet".to_string(),
                    ));
                }
                Ok(GoType::Interface)
            }
            // Named and qualified types go through normal evaluation and
            // must produce a descriptor.
            _ => match self.eval_expr(e)? {
                Value::Type(t) => Ok(t),
                other => Err(RuntimeError::TypeError(format!(
                    "invalid type {}",
                    other.type_name()
                ))),
            },
        }
    }
}
