//! The strings package table.

use std::sync::{Arc, OnceLock};

use crate::gotype::GoType;
use crate::interp::RuntimeError;
use crate::value::{SliceRef, Value};

use super::{native, Package};

pub fn package() -> Arc<Package> {
    static PKG: OnceLock<Arc<Package>> = OnceLock::new();
    PKG.get_or_init(build).clone()
}

fn as_str(v: &Value) -> Result<String, RuntimeError> {
    match v {
        Value::String(s) => Ok(s.clone()),
        other => Err(RuntimeError::TypeError(format!(
            "expected string, got {}",
            other.type_name()
        ))),
    }
}

fn build() -> Arc<Package> {
    let mut pkg = Package::new("strings");

    pkg.functions.insert(
        "ToUpper".to_string(),
        native("ToUpper", 1, false, |args| {
            Ok(Value::String(as_str(&args[0])?.to_uppercase()))
        }),
    );
    pkg.functions.insert(
        "ToLower".to_string(),
        native("ToLower", 1, false, |args| {
            Ok(Value::String(as_str(&args[0])?.to_lowercase()))
        }),
    );
    pkg.functions.insert(
        "Contains".to_string(),
        native("Contains", 2, false, |args| {
            Ok(Value::Bool(as_str(&args[0])?.contains(&as_str(&args[1])?)))
        }),
    );
    pkg.functions.insert(
        "HasPrefix".to_string(),
        native("HasPrefix", 2, false, |args| {
            Ok(Value::Bool(
                as_str(&args[0])?.starts_with(&as_str(&args[1])?),
            ))
        }),
    );
    pkg.functions.insert(
        "HasSuffix".to_string(),
        native("HasSuffix", 2, false, |args| {
            Ok(Value::Bool(as_str(&args[0])?.ends_with(&as_str(&args[1])?)))
        }),
    );
    pkg.functions.insert(
        "Index".to_string(),
        native("Index", 2, false, |args| {
            let haystack = as_str(&args[0])?;
            let needle = as_str(&args[1])?;
            Ok(Value::Int(
                haystack.find(&needle).map(|i| i as i64).unwrap_or(-1),
            ))
        }),
    );
    pkg.functions.insert(
        "Repeat".to_string(),
        native("Repeat", 2, false, |args| {
            let s = as_str(&args[0])?;
            let n = args[1]
                .as_int()
                .ok_or_else(|| RuntimeError::TypeError("count is not int".to_string()))?;
            if n < 0 {
                return Err(RuntimeError::TypeError("negative repeat count".to_string()));
            }
            Ok(Value::String(s.repeat(n as usize)))
        }),
    );
    pkg.functions.insert(
        "Split".to_string(),
        native("Split", 2, false, |args| {
            let s = as_str(&args[0])?;
            let sep = as_str(&args[1])?;
            let parts: Vec<Value> = if sep.is_empty() {
                s.chars().map(|c| Value::String(c.to_string())).collect()
            } else {
                s.split(&sep).map(|p| Value::String(p.to_string())).collect()
            };
            Ok(Value::Slice(SliceRef::from_vec(parts, GoType::String)))
        }),
    );
    pkg.functions.insert(
        "Join".to_string(),
        native("Join", 2, false, |args| {
            let parts = match &args[0] {
                Value::Slice(s) => s.to_vec(),
                other => {
                    return Err(RuntimeError::TypeError(format!(
                        "expected []string, got {}",
                        other.type_name()
                    )))
                }
            };
            let sep = as_str(&args[1])?;
            let strs: Result<Vec<String>, RuntimeError> = parts.iter().map(as_str).collect();
            Ok(Value::String(strs?.join(&sep)))
        }),
    );
    pkg.functions.insert(
        "TrimSpace".to_string(),
        native("TrimSpace", 1, false, |args| {
            Ok(Value::String(as_str(&args[0])?.trim().to_string()))
        }),
    );
    pkg.functions.insert(
        "Replace".to_string(),
        native("Replace", 4, false, |args| {
            let s = as_str(&args[0])?;
            let old = as_str(&args[1])?;
            let new = as_str(&args[2])?;
            let n = args[3]
                .as_int()
                .ok_or_else(|| RuntimeError::TypeError("count is not int".to_string()))?;
            Ok(Value::String(if n < 0 {
                s.replace(&old, &new)
            } else {
                s.replacen(&old, &new, n as usize)
            }))
        }),
    );

    Arc::new(pkg)
}
