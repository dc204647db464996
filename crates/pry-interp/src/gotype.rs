// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! First-class type descriptors.
//!
//! Obtainable by name (builtins), by slice/array/map/chan construction, or
//! from a value. Used as composite-literal heads, conversion operators, and
//! `make` arguments.

use std::sync::Arc;

use crate::interp::RuntimeError;
use crate::value::{ArrayRef, MapRef, SliceRef, StructVal, Value};
use std::collections::HashMap;
use std::sync::Mutex;

/// A runtime type descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum GoType {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    Slice(Box<GoType>),
    Array(usize, Box<GoType>),
    Map(Box<GoType>, Box<GoType>),
    Chan(Box<GoType>),
    Struct(Arc<StructDef>),
    /// The empty interface
    Interface,
    Error,
    /// Opaque function type (only named, never constructed)
    Func,
}

/// A named (or anonymous, when `name` is empty) struct type.
#[derive(Debug, PartialEq)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<StructField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub name: String,
    pub ty: GoType,
}

impl GoType {
    /// The descriptor for a builtin scalar type name, if it is one.
    pub fn by_name(name: &str) -> Option<GoType> {
        Some(match name {
            "bool" => GoType::Bool,
            "byte" => GoType::Uint8,
            "rune" => GoType::Int32,
            "string" => GoType::String,
            "int" => GoType::Int,
            "int8" => GoType::Int8,
            "int16" => GoType::Int16,
            "int32" => GoType::Int32,
            "int64" => GoType::Int64,
            "uint" => GoType::Uint,
            "uint8" => GoType::Uint8,
            "uint16" => GoType::Uint16,
            "uint32" => GoType::Uint32,
            "uint64" => GoType::Uint64,
            "uintptr" => GoType::Uintptr,
            "float32" => GoType::Float32,
            "float64" => GoType::Float64,
            "complex64" => GoType::Complex64,
            "complex128" => GoType::Complex128,
            "error" => GoType::Error,
            _ => return None,
        })
    }

    /// The zero value of this type.
    pub fn zero(&self) -> Value {
        match self {
            GoType::Bool => Value::Bool(false),
            GoType::Int => Value::Int(0),
            GoType::Int8 => Value::Int8(0),
            GoType::Int16 => Value::Int16(0),
            GoType::Int32 => Value::Int32(0),
            GoType::Int64 => Value::Int64(0),
            GoType::Uint => Value::Uint(0),
            GoType::Uint8 => Value::Uint8(0),
            GoType::Uint16 => Value::Uint16(0),
            GoType::Uint32 => Value::Uint32(0),
            GoType::Uint64 => Value::Uint64(0),
            GoType::Uintptr => Value::Uintptr(0),
            GoType::Float32 => Value::Float32(0.0),
            GoType::Float64 => Value::Float64(0.0),
            GoType::Complex64 => Value::Complex64(0.0, 0.0),
            GoType::Complex128 => Value::Complex128(0.0, 0.0),
            GoType::String => Value::String(String::new()),
            GoType::Array(n, elem) => {
                let elems = (0..*n).map(|_| elem.zero()).collect();
                Value::Array(ArrayRef {
                    data: Arc::new(Mutex::new(elems)),
                    elem: (**elem).clone(),
                })
            }
            GoType::Struct(def) => {
                let fields = def.fields.iter().map(|f| f.ty.zero()).collect();
                Value::Struct(StructVal {
                    def: def.clone(),
                    fields: Arc::new(Mutex::new(fields)),
                })
            }
            // Reference kinds zero to nil
            GoType::Slice(_)
            | GoType::Map(_, _)
            | GoType::Chan(_)
            | GoType::Interface
            | GoType::Error
            | GoType::Func => Value::Nil,
        }
    }

    /// Construct a fresh value of this type for `make`-style allocation.
    pub fn make_slice(&self, len: usize) -> Result<Value, RuntimeError> {
        match self {
            GoType::Slice(elem) => {
                let elems = (0..len).map(|_| elem.zero()).collect();
                Ok(Value::Slice(SliceRef::from_vec(elems, (**elem).clone())))
            }
            other => Err(RuntimeError::TypeError(format!(
                "cannot make a slice of {}",
                other
            ))),
        }
    }

    pub fn make_map(&self) -> Result<Value, RuntimeError> {
        match self {
            GoType::Map(key, elem) => Ok(Value::Map(MapRef::new((**key).clone(), (**elem).clone()))),
            other => Err(RuntimeError::TypeError(format!(
                "cannot make a map of {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for GoType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GoType::Bool => write!(f, "bool"),
            GoType::Int => write!(f, "int"),
            GoType::Int8 => write!(f, "int8"),
            GoType::Int16 => write!(f, "int16"),
            GoType::Int32 => write!(f, "int32"),
            GoType::Int64 => write!(f, "int64"),
            GoType::Uint => write!(f, "uint"),
            GoType::Uint8 => write!(f, "uint8"),
            GoType::Uint16 => write!(f, "uint16"),
            GoType::Uint32 => write!(f, "uint32"),
            GoType::Uint64 => write!(f, "uint64"),
            GoType::Uintptr => write!(f, "uintptr"),
            GoType::Float32 => write!(f, "float32"),
            GoType::Float64 => write!(f, "float64"),
            GoType::Complex64 => write!(f, "complex64"),
            GoType::Complex128 => write!(f, "complex128"),
            GoType::String => write!(f, "string"),
            GoType::Slice(elem) => write!(f, "[]{}", elem),
            GoType::Array(n, elem) => write!(f, "[{}]{}", n, elem),
            GoType::Map(k, v) => write!(f, "map[{}]{}", k, v),
            GoType::Chan(elem) => write!(f, "chan {}", elem),
            GoType::Struct(def) => {
                if def.name.is_empty() {
                    write!(f, "struct {{}}")
                } else {
                    write!(f, "{}", def.name)
                }
            }
            GoType::Interface => write!(f, "interface {{}}"),
            GoType::Error => write!(f, "error"),
            GoType::Func => write!(f, "func"),
        }
    }
}

/// Conversion cast: `T(x)` for a type descriptor head.
pub fn convert(ty: &GoType, v: Value) -> Result<Value, RuntimeError> {
    // Identity and interface conversions are free.
    if let Some(dynamic) = v.go_type() {
        if dynamic == *ty {
            return Ok(v);
        }
    }
    if matches!(ty, GoType::Interface) {
        return Ok(v);
    }

    // Numeric source extraction
    let (int_val, float_val): (Option<i64>, Option<f64>) = match &v {
        Value::Int(n) | Value::Int64(n) => (Some(*n), Some(*n as f64)),
        Value::Int8(n) => (Some(*n as i64), Some(*n as f64)),
        Value::Int16(n) => (Some(*n as i64), Some(*n as f64)),
        Value::Int32(n) => (Some(*n as i64), Some(*n as f64)),
        Value::Uint(n) | Value::Uint64(n) | Value::Uintptr(n) => {
            (Some(*n as i64), Some(*n as f64))
        }
        Value::Uint8(n) => (Some(*n as i64), Some(*n as f64)),
        Value::Uint16(n) => (Some(*n as i64), Some(*n as f64)),
        Value::Uint32(n) => (Some(*n as i64), Some(*n as f64)),
        Value::Float32(n) => (Some(*n as i64), Some(*n as f64)),
        Value::Float64(n) => (Some(*n as i64), Some(*n)),
        _ => (None, None),
    };

    match ty {
        GoType::Int => int_val.map(Value::Int),
        GoType::Int8 => int_val.map(|n| Value::Int8(n as i8)),
        GoType::Int16 => int_val.map(|n| Value::Int16(n as i16)),
        GoType::Int32 => int_val.map(|n| Value::Int32(n as i32)),
        GoType::Int64 => int_val.map(Value::Int64),
        GoType::Uint => int_val.map(|n| Value::Uint(n as u64)),
        GoType::Uint8 => int_val.map(|n| Value::Uint8(n as u8)),
        GoType::Uint16 => int_val.map(|n| Value::Uint16(n as u16)),
        GoType::Uint32 => int_val.map(|n| Value::Uint32(n as u32)),
        GoType::Uint64 => match &v {
            // A large constant routed through the unsigned fallback keeps
            // its bits.
            Value::Uint(n) | Value::Uint64(n) | Value::Uintptr(n) => Some(Value::Uint64(*n)),
            _ => int_val.map(|n| Value::Uint64(n as u64)),
        },
        GoType::Uintptr => int_val.map(|n| Value::Uintptr(n as u64)),
        GoType::Float32 => float_val.map(|n| Value::Float32(n as f32)),
        GoType::Float64 => float_val.map(Value::Float64),
        GoType::Complex64 => float_val.map(|n| Value::Complex64(n as f32, 0.0)),
        GoType::Complex128 => float_val.map(|n| Value::Complex128(n, 0.0)),
        // string(rune) produces the character
        GoType::String => int_val
            .and_then(|n| char::from_u32(n as u32).map(|c| Value::String(c.to_string()))),
        _ => None,
    }
    .ok_or_else(|| {
        RuntimeError::TypeError(format!("cannot convert {} to {}", v.type_name(), ty))
    })
}

/// Intern table for named struct definitions seen during a session, so the
/// same exported type resolves to one descriptor.
#[derive(Default)]
pub struct StructRegistry {
    defs: Mutex<HashMap<String, Arc<StructDef>>>,
}

impl StructRegistry {
    pub fn intern(&self, def: StructDef) -> Arc<StructDef> {
        let mut defs = self.defs.lock().unwrap();
        if let Some(existing) = defs.get(&def.name) {
            if !def.name.is_empty() {
                return existing.clone();
            }
        }
        let arc = Arc::new(def);
        if !arc.name.is_empty() {
            defs.insert(arc.name.clone(), arc.clone());
        }
        arc
    }

    pub fn get(&self, name: &str) -> Option<Arc<StructDef>> {
        self.defs.lock().unwrap().get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_names_resolve() {
        assert_eq!(GoType::by_name("int"), Some(GoType::Int));
        assert_eq!(GoType::by_name("byte"), Some(GoType::Uint8));
        assert_eq!(GoType::by_name("rune"), Some(GoType::Int32));
        assert_eq!(GoType::by_name("notatype"), None);
    }

    #[test]
    fn zero_values() {
        assert!(matches!(GoType::Int.zero(), Value::Int(0)));
        assert!(matches!(GoType::String.zero(), Value::String(s) if s.is_empty()));
        assert!(matches!(
            GoType::Slice(Box::new(GoType::Int)).zero(),
            Value::Nil
        ));
        match GoType::Array(3, Box::new(GoType::Bool)).zero() {
            Value::Array(a) => assert_eq!(a.len(), 3),
            other => panic!("expected array, got {}", other),
        }
    }

    #[test]
    fn numeric_conversions() {
        let out = convert(&GoType::Int8, Value::Int(300)).unwrap();
        assert!(matches!(out, Value::Int8(44))); // truncates like the host
        let out = convert(&GoType::Float64, Value::Int(2)).unwrap();
        assert!(matches!(out, Value::Float64(v) if v == 2.0));
        assert!(convert(&GoType::Int, Value::Bool(true)).is_err());
    }

    #[test]
    fn identity_and_interface_conversions_pass_through() {
        let out = convert(&GoType::String, Value::String("x".into())).unwrap();
        assert!(matches!(out, Value::String(s) if s == "x"));
        let out = convert(&GoType::Interface, Value::Int(1)).unwrap();
        assert!(matches!(out, Value::Int(1)));
    }

    #[test]
    fn oversized_uint_keeps_its_bits() {
        let out = convert(&GoType::Uint64, Value::Uint(u64::MAX)).unwrap();
        assert!(matches!(out, Value::Uint64(u64::MAX)));
    }

    #[test]
    fn named_struct_defs_intern_once() {
        let reg = StructRegistry::default();
        let a = reg.intern(StructDef {
            name: "P".to_string(),
            fields: vec![],
        });
        let b = reg.intern(StructDef {
            name: "P".to_string(),
            fields: vec![],
        });
        assert!(Arc::ptr_eq(&a, &b));
    }
}
