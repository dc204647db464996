//! The math package table.

use std::sync::{Arc, OnceLock};

use crate::interp::RuntimeError;
use crate::value::Value;

use super::{native, Package};

pub fn package() -> Arc<Package> {
    static PKG: OnceLock<Arc<Package>> = OnceLock::new();
    PKG.get_or_init(build).clone()
}

fn as_f64(v: &Value) -> Result<f64, RuntimeError> {
    match v {
        Value::Float64(n) => Ok(*n),
        Value::Float32(n) => Ok(*n as f64),
        Value::Int(n) | Value::Int64(n) => Ok(*n as f64),
        other => Err(RuntimeError::TypeError(format!(
            "expected float64, got {}",
            other.type_name()
        ))),
    }
}

fn unary_float(
    name: &'static str,
    f: impl Fn(f64) -> f64 + Send + Sync + 'static,
) -> Value {
    native(name, 1, false, move |args| {
        Ok(Value::Float64(f(as_f64(&args[0])?)))
    })
}

fn binary_float(
    name: &'static str,
    f: impl Fn(f64, f64) -> f64 + Send + Sync + 'static,
) -> Value {
    native(name, 2, false, move |args| {
        Ok(Value::Float64(f(as_f64(&args[0])?, as_f64(&args[1])?)))
    })
}

fn build() -> Arc<Package> {
    let mut pkg = Package::new("math");

    // Exported constants. MaxUint64 exceeds the signed int range and is
    // carried unsigned.
    pkg.functions
        .insert("Pi".to_string(), Value::Float64(std::f64::consts::PI));
    pkg.functions
        .insert("E".to_string(), Value::Float64(std::f64::consts::E));
    pkg.functions
        .insert("MaxInt64".to_string(), Value::Int64(i64::MAX));
    pkg.functions
        .insert("MinInt64".to_string(), Value::Int64(i64::MIN));
    pkg.functions
        .insert("MaxUint64".to_string(), Value::Uint64(u64::MAX));
    pkg.functions
        .insert("MaxFloat64".to_string(), Value::Float64(f64::MAX));

    pkg.functions.insert("Sqrt".to_string(), unary_float("Sqrt", f64::sqrt));
    pkg.functions.insert("Abs".to_string(), unary_float("Abs", f64::abs));
    pkg.functions.insert("Floor".to_string(), unary_float("Floor", f64::floor));
    pkg.functions.insert("Ceil".to_string(), unary_float("Ceil", f64::ceil));
    pkg.functions.insert("Log".to_string(), unary_float("Log", f64::ln));
    pkg.functions.insert("Sin".to_string(), unary_float("Sin", f64::sin));
    pkg.functions.insert("Cos".to_string(), unary_float("Cos", f64::cos));
    pkg.functions.insert("Max".to_string(), binary_float("Max", f64::max));
    pkg.functions.insert("Min".to_string(), binary_float("Min", f64::min));
    pkg.functions.insert("Pow".to_string(), binary_float("Pow", f64::powf));
    pkg.functions.insert("Mod".to_string(), binary_float("Mod", |a, b| a % b));

    Arc::new(pkg)
}
