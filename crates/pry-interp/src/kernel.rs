// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The operator kernel: binary and unary operations for every numeric kind
//! plus string and bool.
//!
//! Arms are generated per (kind, op) from macros. Mixed kinds fail with
//! "unknown operation"; there is no implicit promotion. Shifts coerce the
//! right operand to uint64 across every numeric kind.

use pry_ast::expr::{BinOp, UnaryOp};

use crate::interp::RuntimeError;
use crate::value::Value;

/// Execute the corresponding binary operation on two values.
pub fn compute_binary_op(x: &Value, y: &Value, op: BinOp) -> Result<Value, RuntimeError> {
    macro_rules! int_binop {
        ($a:expr, $b:expr, $V:ident) => {
            match op {
                BinOp::Add => Some(Value::$V($a.wrapping_add($b))),
                BinOp::Sub => Some(Value::$V($a.wrapping_sub($b))),
                BinOp::Mul => Some(Value::$V($a.wrapping_mul($b))),
                BinOp::Quo => {
                    if $b == 0 {
                        return Err(RuntimeError::DivisionByZero);
                    }
                    Some(Value::$V($a.wrapping_div($b)))
                }
                BinOp::Rem => {
                    if $b == 0 {
                        return Err(RuntimeError::DivisionByZero);
                    }
                    Some(Value::$V($a.wrapping_rem($b)))
                }
                BinOp::And => Some(Value::$V($a & $b)),
                BinOp::Or => Some(Value::$V($a | $b)),
                BinOp::Xor => Some(Value::$V($a ^ $b)),
                BinOp::AndNot => Some(Value::$V($a & !$b)),
                BinOp::Lss => Some(Value::Bool($a < $b)),
                BinOp::Gtr => Some(Value::Bool($a > $b)),
                BinOp::Leq => Some(Value::Bool($a <= $b)),
                BinOp::Geq => Some(Value::Bool($a >= $b)),
                _ => None,
            }
        };
    }

    macro_rules! float_binop {
        ($a:expr, $b:expr, $V:ident) => {
            match op {
                BinOp::Add => Some(Value::$V($a + $b)),
                BinOp::Sub => Some(Value::$V($a - $b)),
                BinOp::Mul => Some(Value::$V($a * $b)),
                BinOp::Quo => Some(Value::$V($a / $b)),
                BinOp::Lss => Some(Value::Bool($a < $b)),
                BinOp::Gtr => Some(Value::Bool($a > $b)),
                BinOp::Leq => Some(Value::Bool($a <= $b)),
                BinOp::Geq => Some(Value::Bool($a >= $b)),
                _ => None,
            }
        };
    }

    // (ar+ai·i)(br+bi·i) with the usual quotient formula for division.
    macro_rules! complex_binop {
        ($ar:expr, $ai:expr, $br:expr, $bi:expr, $V:ident) => {
            match op {
                BinOp::Add => Some(Value::$V($ar + $br, $ai + $bi)),
                BinOp::Sub => Some(Value::$V($ar - $br, $ai - $bi)),
                BinOp::Mul => Some(Value::$V(
                    $ar * $br - $ai * $bi,
                    $ar * $bi + $ai * $br,
                )),
                BinOp::Quo => {
                    let denom = $br * $br + $bi * $bi;
                    Some(Value::$V(
                        ($ar * $br + $ai * $bi) / denom,
                        ($ai * $br - $ar * $bi) / denom,
                    ))
                }
                _ => None,
            }
        };
    }

    let same_kind = match (x, y) {
        (Value::Int(a), Value::Int(b)) => int_binop!(*a, *b, Int),
        (Value::Int8(a), Value::Int8(b)) => int_binop!(*a, *b, Int8),
        (Value::Int16(a), Value::Int16(b)) => int_binop!(*a, *b, Int16),
        (Value::Int32(a), Value::Int32(b)) => int_binop!(*a, *b, Int32),
        (Value::Int64(a), Value::Int64(b)) => int_binop!(*a, *b, Int64),
        (Value::Uint(a), Value::Uint(b)) => int_binop!(*a, *b, Uint),
        (Value::Uint8(a), Value::Uint8(b)) => int_binop!(*a, *b, Uint8),
        (Value::Uint16(a), Value::Uint16(b)) => int_binop!(*a, *b, Uint16),
        (Value::Uint32(a), Value::Uint32(b)) => int_binop!(*a, *b, Uint32),
        (Value::Uint64(a), Value::Uint64(b)) => int_binop!(*a, *b, Uint64),
        (Value::Uintptr(a), Value::Uintptr(b)) => int_binop!(*a, *b, Uintptr),
        (Value::Float32(a), Value::Float32(b)) => float_binop!(*a, *b, Float32),
        (Value::Float64(a), Value::Float64(b)) => float_binop!(*a, *b, Float64),
        (Value::Complex64(ar, ai), Value::Complex64(br, bi)) => {
            complex_binop!(*ar, *ai, *br, *bi, Complex64)
        }
        (Value::Complex128(ar, ai), Value::Complex128(br, bi)) => {
            complex_binop!(*ar, *ai, *br, *bi, Complex128)
        }
        (Value::String(a), Value::String(b)) => match op {
            BinOp::Add => Some(Value::String(format!("{}{}", a, b))),
            _ => None,
        },
        (Value::Bool(a), Value::Bool(b)) => match op {
            BinOp::LAnd => Some(Value::Bool(*a && *b)),
            BinOp::LOr => Some(Value::Bool(*a || *b)),
            _ => None,
        },
        _ => None,
    };
    if let Some(v) = same_kind {
        return Ok(v);
    }

    // Shifts: the right operand is coerced to uint64 from any numeric kind.
    if matches!(op, BinOp::Shl | BinOp::Shr) {
        if let Some(s) = to_uint64(y) {
            macro_rules! shift_signed {
                ($a:expr, $V:ident, $t:ty) => {{
                    let bits = <$t>::BITS as u64;
                    Some(match op {
                        BinOp::Shl => {
                            if s >= bits {
                                Value::$V(0)
                            } else {
                                Value::$V($a << s)
                            }
                        }
                        _ => {
                            if s >= bits {
                                Value::$V(if $a < 0 { -1 } else { 0 })
                            } else {
                                Value::$V($a >> s)
                            }
                        }
                    })
                }};
            }
            macro_rules! shift_unsigned {
                ($a:expr, $V:ident, $t:ty) => {{
                    let bits = <$t>::BITS as u64;
                    Some(match op {
                        BinOp::Shl => {
                            if s >= bits {
                                Value::$V(0)
                            } else {
                                Value::$V($a << s)
                            }
                        }
                        _ => {
                            if s >= bits {
                                Value::$V(0)
                            } else {
                                Value::$V($a >> s)
                            }
                        }
                    })
                }};
            }
            let shifted = match x {
                Value::Int(a) => shift_signed!(*a, Int, i64),
                Value::Int8(a) => shift_signed!(*a, Int8, i8),
                Value::Int16(a) => shift_signed!(*a, Int16, i16),
                Value::Int32(a) => shift_signed!(*a, Int32, i32),
                Value::Int64(a) => shift_signed!(*a, Int64, i64),
                Value::Uint(a) => shift_unsigned!(*a, Uint, u64),
                Value::Uint8(a) => shift_unsigned!(*a, Uint8, u8),
                Value::Uint16(a) => shift_unsigned!(*a, Uint16, u16),
                Value::Uint32(a) => shift_unsigned!(*a, Uint32, u32),
                Value::Uint64(a) => shift_unsigned!(*a, Uint64, u64),
                Value::Uintptr(a) => shift_unsigned!(*a, Uintptr, u64),
                _ => None,
            };
            if let Some(v) = shifted {
                return Ok(v);
            }
        }
    }

    // Equality is defined on everything comparable.
    match op {
        BinOp::Eql => Ok(Value::Bool(value_eq(x, y)?)),
        BinOp::Neq => Ok(Value::Bool(!value_eq(x, y)?)),
        _ => Err(RuntimeError::UnknownOperation {
            op: op.symbol(),
            x: x.type_name(),
            y: y.type_name(),
        }),
    }
}

/// Execute the corresponding unary operation (+x, -x, !x).
pub fn compute_unary_op(x: &Value, op: UnaryOp) -> Result<Value, RuntimeError> {
    macro_rules! num_unop {
        ($a:expr, $V:ident) => {
            match op {
                UnaryOp::Pos => Some(Value::$V($a)),
                UnaryOp::Neg => Some(Value::$V($a.wrapping_neg())),
                _ => None,
            }
        };
    }
    macro_rules! float_unop {
        ($a:expr, $V:ident) => {
            match op {
                UnaryOp::Pos => Some(Value::$V($a)),
                UnaryOp::Neg => Some(Value::$V(-$a)),
                _ => None,
            }
        };
    }

    let out = match x {
        Value::Bool(b) => match op {
            UnaryOp::Not => Some(Value::Bool(!b)),
            _ => None,
        },
        Value::Int(a) => num_unop!(*a, Int),
        Value::Int8(a) => num_unop!(*a, Int8),
        Value::Int16(a) => num_unop!(*a, Int16),
        Value::Int32(a) => num_unop!(*a, Int32),
        Value::Int64(a) => num_unop!(*a, Int64),
        Value::Uint(a) => num_unop!(*a, Uint),
        Value::Uint8(a) => num_unop!(*a, Uint8),
        Value::Uint16(a) => num_unop!(*a, Uint16),
        Value::Uint32(a) => num_unop!(*a, Uint32),
        Value::Uint64(a) => num_unop!(*a, Uint64),
        Value::Uintptr(a) => num_unop!(*a, Uintptr),
        Value::Float32(a) => float_unop!(*a, Float32),
        Value::Float64(a) => float_unop!(*a, Float64),
        Value::Complex64(r, i) => match op {
            UnaryOp::Pos => Some(Value::Complex64(*r, *i)),
            UnaryOp::Neg => Some(Value::Complex64(-r, -i)),
            _ => None,
        },
        Value::Complex128(r, i) => match op {
            UnaryOp::Pos => Some(Value::Complex128(*r, *i)),
            UnaryOp::Neg => Some(Value::Complex128(-r, -i)),
            _ => None,
        },
        _ => None,
    };
    out.ok_or_else(|| RuntimeError::UnknownUnaryOperation {
        op: match op {
            UnaryOp::Pos => "+",
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::Addr => "&",
            UnaryOp::Deref => "*",
            UnaryOp::Recv => "<-",
        },
        x: x.type_name(),
    })
}

/// Coerce any numeric value to uint64 for shift counts.
fn to_uint64(v: &Value) -> Option<u64> {
    Some(match v {
        Value::Int(n) | Value::Int64(n) => *n as u64,
        Value::Int8(n) => *n as u64,
        Value::Int16(n) => *n as u64,
        Value::Int32(n) => *n as u64,
        Value::Uint(n) | Value::Uint64(n) | Value::Uintptr(n) => *n,
        Value::Uint8(n) => *n as u64,
        Value::Uint16(n) => *n as u64,
        Value::Uint32(n) => *n as u64,
        Value::Float32(n) => *n as u64,
        Value::Float64(n) => *n as u64,
        _ => return None,
    })
}

/// Shallow comparability: the host's interface equality. Uncomparable kinds
/// (slice, map, func) error unless compared against nil.
pub fn value_eq(x: &Value, y: &Value) -> Result<bool, RuntimeError> {
    Ok(match (x, y) {
        (Value::Nil, Value::Nil) => true,
        (Value::Nil, _) | (_, Value::Nil) => false,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Int8(a), Value::Int8(b)) => a == b,
        (Value::Int16(a), Value::Int16(b)) => a == b,
        (Value::Int32(a), Value::Int32(b)) => a == b,
        (Value::Int64(a), Value::Int64(b)) => a == b,
        (Value::Uint(a), Value::Uint(b)) => a == b,
        (Value::Uint8(a), Value::Uint8(b)) => a == b,
        (Value::Uint16(a), Value::Uint16(b)) => a == b,
        (Value::Uint32(a), Value::Uint32(b)) => a == b,
        (Value::Uint64(a), Value::Uint64(b)) => a == b,
        (Value::Uintptr(a), Value::Uintptr(b)) => a == b,
        (Value::Float32(a), Value::Float32(b)) => a == b,
        (Value::Float64(a), Value::Float64(b)) => a == b,
        (Value::Complex64(ar, ai), Value::Complex64(br, bi)) => ar == br && ai == bi,
        (Value::Complex128(ar, ai), Value::Complex128(br, bi)) => ar == br && ai == bi,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Chan(a), Value::Chan(b)) => std::sync::Arc::ptr_eq(a, b),
        (Value::Pointer(a), Value::Pointer(b)) => std::sync::Arc::ptr_eq(a, b),
        (Value::Type(a), Value::Type(b)) => a == b,
        (Value::Package(a), Value::Package(b)) => a.name == b.name,
        (Value::Struct(a), Value::Struct(b)) => {
            if a.def != b.def {
                false
            } else {
                let fa = a.fields.lock().unwrap().clone();
                let fb = b.fields.lock().unwrap().clone();
                fa.len() == fb.len() && {
                    let mut eq = true;
                    for (va, vb) in fa.iter().zip(fb.iter()) {
                        if !value_eq(va, vb)? {
                            eq = false;
                            break;
                        }
                    }
                    eq
                }
            }
        }
        (Value::Slice(_), Value::Slice(_))
        | (Value::Map(_), Value::Map(_))
        | (Value::Func(_), Value::Func(_)) => {
            return Err(RuntimeError::TypeError(format!(
                "{} values are not comparable",
                x.type_name()
            )))
        }
        _ => false,
    })
}

/// Structural equality, used by switch-case matching. Never errors; kinds
/// that interface equality rejects are compared elementwise.
pub fn deep_equal(x: &Value, y: &Value) -> bool {
    match (x, y) {
        (Value::Slice(a), Value::Slice(b)) => {
            let av = a.to_vec();
            let bv = b.to_vec();
            av.len() == bv.len() && av.iter().zip(bv.iter()).all(|(p, q)| deep_equal(p, q))
        }
        (Value::Array(a), Value::Array(b)) => {
            let av = a.data.lock().unwrap().clone();
            let bv = b.data.lock().unwrap().clone();
            av.len() == bv.len() && av.iter().zip(bv.iter()).all(|(p, q)| deep_equal(p, q))
        }
        (Value::Map(a), Value::Map(b)) => {
            let ae = a.entries.lock().unwrap().clone();
            let be = b.entries.lock().unwrap().clone();
            ae.len() == be.len()
                && ae
                    .iter()
                    .all(|(k, v)| be.get(k).map(|w| deep_equal(v, w)).unwrap_or(false))
        }
        _ => value_eq(x, y).unwrap_or(false),
    }
}
