//! The strconv package table.

use std::sync::{Arc, OnceLock};

use crate::interp::RuntimeError;
use crate::value::Value;

use super::{native, Package};

pub fn package() -> Arc<Package> {
    static PKG: OnceLock<Arc<Package>> = OnceLock::new();
    PKG.get_or_init(build).clone()
}

fn build() -> Arc<Package> {
    let mut pkg = Package::new("strconv");

    pkg.functions.insert(
        "Itoa".to_string(),
        native("Itoa", 1, false, |args| match &args[0] {
            Value::Int(n) => Ok(Value::String(n.to_string())),
            other => Err(RuntimeError::TypeError(format!(
                "expected int, got {}",
                other.type_name()
            ))),
        }),
    );
    pkg.functions.insert(
        "Atoi".to_string(),
        native("Atoi", 1, false, |args| match &args[0] {
            Value::String(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
                RuntimeError::TypeError(format!("parsing {:?}: invalid syntax", s))
            }),
            other => Err(RuntimeError::TypeError(format!(
                "expected string, got {}",
                other.type_name()
            ))),
        }),
    );
    pkg.functions.insert(
        "FormatInt".to_string(),
        native("FormatInt", 2, false, |args| {
            let n = match &args[0] {
                Value::Int(n) | Value::Int64(n) => *n,
                other => {
                    return Err(RuntimeError::TypeError(format!(
                        "expected int64, got {}",
                        other.type_name()
                    )))
                }
            };
            let base = args[1]
                .as_int()
                .ok_or_else(|| RuntimeError::TypeError("base is not int".to_string()))?;
            let out = match base {
                2 => format!("{:b}", n),
                8 => format!("{:o}", n),
                16 => format!("{:x}", n),
                10 => format!("{}", n),
                _ => {
                    return Err(RuntimeError::TypeError(format!(
                        "unsupported base {}",
                        base
                    )))
                }
            };
            Ok(Value::String(out))
        }),
    );
    pkg.functions.insert(
        "ParseFloat".to_string(),
        native("ParseFloat", 2, false, |args| match &args[0] {
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float64)
                .map_err(|_| {
                    RuntimeError::TypeError(format!("parsing {:?}: invalid syntax", s))
                }),
            other => Err(RuntimeError::TypeError(format!(
                "expected string, got {}",
                other.type_name()
            ))),
        }),
    );
    pkg.functions.insert(
        "Quote".to_string(),
        native("Quote", 1, false, |args| match &args[0] {
            Value::String(s) => Ok(Value::String(format!("{:?}", s))),
            other => Err(RuntimeError::TypeError(format!(
                "expected string, got {}",
                other.type_name()
            ))),
        }),
    );

    Arc::new(pkg)
}
