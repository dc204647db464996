//! Runtime values.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use pry_ast::expr::FuncLit;

use crate::chan::Channel;
use crate::gotype::{GoType, StructDef};
use crate::interp::RuntimeError;
use crate::pkg::Package;
use crate::scope::{Cell, Scope};

/// A runtime value in the interpreter.
///
/// Numeric kinds are kept distinct so the operator kernel can reject mixed
/// operands the way the host's type system would.
#[derive(Clone)]
pub enum Value {
    /// The untyped nil
    Nil,
    Bool(bool),
    Int(i64),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Uint(u64),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Uintptr(u64),
    Float32(f32),
    Float64(f64),
    Complex64(f32, f32),
    Complex128(f64, f64),
    String(String),
    /// A view over shared backing storage
    Slice(SliceRef),
    /// Fixed-length array
    Array(ArrayRef),
    Map(MapRef),
    Chan(Arc<Channel>),
    Struct(StructVal),
    /// Address of a binding cell (&x)
    Pointer(Cell),
    /// Interpreted function literal with its defining scope
    Func(FuncVal),
    /// Host function provided by a package table
    Native(NativeFn),
    /// Reflective primitive (append, make, len, close, ...)
    Builtin(Builtin),
    /// First-class type descriptor
    Type(GoType),
    /// Package descriptor
    Package(Arc<Package>),
}

/// A slice view: shared backing plus offset and length.
#[derive(Clone)]
pub struct SliceRef {
    pub data: Arc<Mutex<Vec<Value>>>,
    pub off: usize,
    pub len: usize,
    pub elem: GoType,
}

impl SliceRef {
    pub fn from_vec(elems: Vec<Value>, elem: GoType) -> Self {
        let len = elems.len();
        Self {
            data: Arc::new(Mutex::new(elems)),
            off: 0,
            len,
            elem,
        }
    }

    pub fn get(&self, i: usize) -> Value {
        self.data.lock().unwrap()[self.off + i].clone()
    }

    pub fn set(&self, i: usize, v: Value) {
        self.data.lock().unwrap()[self.off + i] = v;
    }

    /// Copy out the visible elements.
    pub fn to_vec(&self) -> Vec<Value> {
        let data = self.data.lock().unwrap();
        data[self.off..self.off + self.len].to_vec()
    }
}

/// A fixed array; assignment shares the backing storage.
#[derive(Clone)]
pub struct ArrayRef {
    pub data: Arc<Mutex<Vec<Value>>>,
    pub elem: GoType,
}

impl ArrayRef {
    pub fn len(&self) -> usize {
        self.data.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A map with hashable key projection.
#[derive(Clone)]
pub struct MapRef {
    pub entries: Arc<Mutex<HashMap<ValueKey, Value>>>,
    pub key: GoType,
    pub elem: GoType,
}

impl MapRef {
    pub fn new(key: GoType, elem: GoType) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            key,
            elem,
        }
    }
}

/// A struct instance; fields are ordered as declared.
#[derive(Clone)]
pub struct StructVal {
    pub def: Arc<StructDef>,
    pub fields: Arc<Mutex<Vec<Value>>>,
}

impl StructVal {
    pub fn field_by_name(&self, name: &str) -> Option<Value> {
        let idx = self.def.fields.iter().position(|f| f.name == name)?;
        Some(self.fields.lock().unwrap()[idx].clone())
    }
}

/// An interpreted function value.
#[derive(Clone)]
pub struct FuncVal {
    pub lit: Arc<FuncLit>,
    pub scope: Scope,
}

/// A host function bound into a package table.
#[derive(Clone)]
pub struct NativeFn {
    pub name: &'static str,
    /// Minimum argument count; exact unless `variadic`.
    pub arity: usize,
    pub variadic: bool,
    pub f: Arc<dyn Fn(Vec<Value>) -> Result<Value, RuntimeError> + Send + Sync>,
}

impl NativeFn {
    pub fn new(
        name: &'static str,
        arity: usize,
        variadic: bool,
        f: impl Fn(Vec<Value>) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            arity,
            variadic,
            f: Arc::new(f),
        }
    }
}

/// The reflective primitives bound in the root environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Append,
    Make,
    Len,
    Close,
    /// Breakpoint entry point; dispatched specially so the call site can
    /// attach its source location.
    PryApply,
    /// Breakpoint marker; a no-op when reached directly.
    PryMarker,
    /// Type-descriptor extractor (pry.Type)
    PryType,
}

/// The hashable projection of comparable values used as map keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueKey {
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    /// Float keys hash by bit pattern
    Float(u64),
    Str(String),
}

impl ValueKey {
    /// Project a value to its key form; fails for uncomparable kinds.
    pub fn from_value(v: &Value) -> Result<ValueKey, RuntimeError> {
        Ok(match v {
            Value::Nil => ValueKey::Nil,
            Value::Bool(b) => ValueKey::Bool(*b),
            Value::Int(n) | Value::Int64(n) => ValueKey::Int(*n),
            Value::Int8(n) => ValueKey::Int(*n as i64),
            Value::Int16(n) => ValueKey::Int(*n as i64),
            Value::Int32(n) => ValueKey::Int(*n as i64),
            Value::Uint(n) | Value::Uint64(n) | Value::Uintptr(n) => ValueKey::Uint(*n),
            Value::Uint8(n) => ValueKey::Uint(*n as u64),
            Value::Uint16(n) => ValueKey::Uint(*n as u64),
            Value::Uint32(n) => ValueKey::Uint(*n as u64),
            Value::Float32(n) => ValueKey::Float((*n as f64).to_bits()),
            Value::Float64(n) => ValueKey::Float(n.to_bits()),
            Value::String(s) => ValueKey::Str(s.clone()),
            other => {
                return Err(RuntimeError::TypeError(format!(
                    "invalid map key of kind {}",
                    other.type_name()
                )))
            }
        })
    }

    /// Reconstruct a value of the given key type.
    pub fn to_value(&self, ty: &GoType) -> Value {
        match self {
            ValueKey::Nil => Value::Nil,
            ValueKey::Bool(b) => Value::Bool(*b),
            ValueKey::Int(n) => match ty {
                GoType::Int8 => Value::Int8(*n as i8),
                GoType::Int16 => Value::Int16(*n as i16),
                GoType::Int32 => Value::Int32(*n as i32),
                GoType::Int64 => Value::Int64(*n),
                _ => Value::Int(*n),
            },
            ValueKey::Uint(n) => match ty {
                GoType::Uint8 => Value::Uint8(*n as u8),
                GoType::Uint16 => Value::Uint16(*n as u16),
                GoType::Uint32 => Value::Uint32(*n as u32),
                GoType::Uint64 => Value::Uint64(*n),
                GoType::Uintptr => Value::Uintptr(*n),
                _ => Value::Uint(*n),
            },
            ValueKey::Float(bits) => match ty {
                GoType::Float32 => Value::Float32(f64::from_bits(*bits) as f32),
                _ => Value::Float64(f64::from_bits(*bits)),
            },
            ValueKey::Str(s) => Value::String(s.clone()),
        }
    }
}

impl Value {
    /// Human-readable kind name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Int8(_) => "int8",
            Value::Int16(_) => "int16",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Uint(_) => "uint",
            Value::Uint8(_) => "uint8",
            Value::Uint16(_) => "uint16",
            Value::Uint32(_) => "uint32",
            Value::Uint64(_) => "uint64",
            Value::Uintptr(_) => "uintptr",
            Value::Float32(_) => "float32",
            Value::Float64(_) => "float64",
            Value::Complex64(..) => "complex64",
            Value::Complex128(..) => "complex128",
            Value::String(_) => "string",
            Value::Slice(_) => "slice",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Chan(_) => "chan",
            Value::Struct(_) => "struct",
            Value::Pointer(_) => "pointer",
            Value::Func(_) => "func",
            Value::Native(_) => "func",
            Value::Builtin(_) => "builtin",
            Value::Type(_) => "type",
            Value::Package(_) => "package",
        }
    }

    /// The dynamic type of this value, if it has one.
    pub fn go_type(&self) -> Option<GoType> {
        Some(match self {
            Value::Nil => return None,
            Value::Bool(_) => GoType::Bool,
            Value::Int(_) => GoType::Int,
            Value::Int8(_) => GoType::Int8,
            Value::Int16(_) => GoType::Int16,
            Value::Int32(_) => GoType::Int32,
            Value::Int64(_) => GoType::Int64,
            Value::Uint(_) => GoType::Uint,
            Value::Uint8(_) => GoType::Uint8,
            Value::Uint16(_) => GoType::Uint16,
            Value::Uint32(_) => GoType::Uint32,
            Value::Uint64(_) => GoType::Uint64,
            Value::Uintptr(_) => GoType::Uintptr,
            Value::Float32(_) => GoType::Float32,
            Value::Float64(_) => GoType::Float64,
            Value::Complex64(..) => GoType::Complex64,
            Value::Complex128(..) => GoType::Complex128,
            Value::String(_) => GoType::String,
            Value::Slice(s) => GoType::Slice(Box::new(s.elem.clone())),
            Value::Array(a) => GoType::Array(a.len(), Box::new(a.elem.clone())),
            Value::Map(m) => GoType::Map(Box::new(m.key.clone()), Box::new(m.elem.clone())),
            Value::Chan(c) => GoType::Chan(Box::new(c.elem.clone())),
            Value::Struct(s) => GoType::Struct(s.def.clone()),
            Value::Pointer(_)
            | Value::Func(_)
            | Value::Native(_)
            | Value::Builtin(_)
            | Value::Type(_)
            | Value::Package(_) => return None,
        })
    }

    /// Length for len()-able kinds.
    pub fn len(&self) -> Result<usize, RuntimeError> {
        Ok(match self {
            Value::String(s) => s.len(),
            Value::Slice(s) => s.len,
            Value::Array(a) => a.len(),
            Value::Map(m) => m.entries.lock().unwrap().len(),
            Value::Chan(c) => c.len(),
            other => {
                return Err(RuntimeError::TypeError(format!(
                    "len of {} is not defined",
                    other.type_name()
                )))
            }
        })
    }

    /// Extract a plain int, the index/size type of the interpreter.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Chase pointer levels down to the pointed-to value.
    pub fn auto_deref(self) -> Value {
        let mut v = self;
        loop {
            match v {
                Value::Pointer(cell) => {
                    let inner = cell.lock().unwrap().clone();
                    v = inner;
                }
                other => return other,
            }
        }
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Reuse the user-facing rendering; the REPL shows the same shape.
        write!(f, "{}", self)
    }
}
