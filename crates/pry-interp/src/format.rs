//! User-facing value rendering in the host language's literal syntax.

use crate::value::Value;

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Int8(n) => write!(f, "{}", n),
            Value::Int16(n) => write!(f, "{}", n),
            Value::Int32(n) => write!(f, "{}", n),
            Value::Int64(n) => write!(f, "{}", n),
            Value::Uint(n) => write!(f, "{}", n),
            Value::Uint8(n) => write!(f, "{}", n),
            Value::Uint16(n) => write!(f, "{}", n),
            Value::Uint32(n) => write!(f, "{}", n),
            Value::Uint64(n) => write!(f, "{}", n),
            Value::Uintptr(n) => write!(f, "{:#x}", n),
            Value::Float32(n) => write_float(f, *n as f64),
            Value::Float64(n) => write_float(f, *n),
            Value::Complex64(r, i) => write!(f, "({}{:+}i)", r, i),
            Value::Complex128(r, i) => write!(f, "({}{:+}i)", r, i),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Slice(s) => {
                write!(f, "[]{}{{", s.elem)?;
                for (i, v) in s.to_vec().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "}}")
            }
            Value::Array(a) => {
                let elems = a.data.lock().unwrap().clone();
                write!(f, "[{}]{}{{", elems.len(), a.elem)?;
                for (i, v) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "}}")
            }
            Value::Map(m) => {
                write!(f, "map[{}]{}{{", m.key, m.elem)?;
                let entries = m.entries.lock().unwrap().clone();
                // Sorted rendering keeps REPL output stable.
                let mut pairs: Vec<(String, String)> = entries
                    .iter()
                    .map(|(k, v)| (format!("{}", k.to_value(&m.key)), format!("{}", v)))
                    .collect();
                pairs.sort();
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}:{}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Chan(c) => write!(f, "(chan {})({} buffered)", c.elem, c.len()),
            Value::Struct(s) => {
                if s.def.name.is_empty() {
                    write!(f, "struct {{}}{{")?;
                } else {
                    write!(f, "{}{{", s.def.name)?;
                }
                let fields = s.fields.lock().unwrap().clone();
                for (i, (field, v)) in s.def.fields.iter().zip(fields.iter()).enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}:{}", field.name, v)?;
                }
                write!(f, "}}")
            }
            Value::Pointer(cell) => write!(f, "&{}", cell.lock().unwrap()),
            Value::Func(_) => write!(f, "func literal"),
            Value::Native(n) => write!(f, "func {}", n.name),
            Value::Builtin(b) => write!(f, "builtin {:?}", b),
            Value::Type(t) => write!(f, "{}", t),
            Value::Package(p) => write!(f, "package {}", p.name),
        }
    }
}

/// Floats always render with a decimal point or exponent so they read as
/// float literals.
fn write_float(f: &mut std::fmt::Formatter<'_>, v: f64) -> std::fmt::Result {
    if v == v.trunc() && v.abs() < 1e15 {
        write!(f, "{:.1}", v)
    } else {
        write!(f, "{}", v)
    }
}

#[cfg(test)]
mod tests {
    use crate::gotype::GoType;
    use crate::value::{SliceRef, Value};

    #[test]
    fn scalars_render_as_literals() {
        assert_eq!(format!("{}", Value::Int(5)), "5");
        assert_eq!(format!("{}", Value::Bool(true)), "true");
        assert_eq!(format!("{}", Value::Nil), "nil");
        assert_eq!(format!("{}", Value::String("hi".into())), "\"hi\"");
        assert_eq!(format!("{}", Value::Float64(2.0)), "2.0");
        assert_eq!(format!("{}", Value::Float64(2.5)), "2.5");
    }

    #[test]
    fn slices_render_with_their_element_type() {
        let s = Value::Slice(SliceRef::from_vec(
            vec![Value::Int(1), Value::Int(2)],
            GoType::Int,
        ));
        assert_eq!(format!("{}", s), "[]int{1, 2}");
    }

    #[test]
    fn complex_renders_with_sign() {
        assert_eq!(format!("{}", Value::Complex128(1.0, -2.0)), "(1-2i)");
    }
}
