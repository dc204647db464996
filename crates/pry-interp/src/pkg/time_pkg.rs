//! The time package table. Durations are nanosecond counts carried as the
//! interpreter's default int so literal multiples like `50 * Millisecond`
//! stay within one kind.

use std::sync::{Arc, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::interp::RuntimeError;
use crate::value::Value;

use super::{native, Package};

pub fn package() -> Arc<Package> {
    static PKG: OnceLock<Arc<Package>> = OnceLock::new();
    PKG.get_or_init(build).clone()
}

fn as_nanos(v: &Value) -> Result<i64, RuntimeError> {
    match v {
        Value::Int(n) | Value::Int64(n) => Ok(*n),
        other => Err(RuntimeError::TypeError(format!(
            "expected a duration, got {}",
            other.type_name()
        ))),
    }
}

fn build() -> Arc<Package> {
    let mut pkg = Package::new("time");

    pkg.functions
        .insert("Nanosecond".to_string(), Value::Int(1));
    pkg.functions
        .insert("Microsecond".to_string(), Value::Int(1_000));
    pkg.functions
        .insert("Millisecond".to_string(), Value::Int(1_000_000));
    pkg.functions
        .insert("Second".to_string(), Value::Int(1_000_000_000));
    pkg.functions
        .insert("Minute".to_string(), Value::Int(60 * 1_000_000_000));
    pkg.functions
        .insert("Hour".to_string(), Value::Int(3600 * 1_000_000_000));

    pkg.functions.insert(
        "Sleep".to_string(),
        native("Sleep", 1, false, |args| {
            let nanos = as_nanos(&args[0])?;
            if nanos > 0 {
                std::thread::sleep(std::time::Duration::from_nanos(nanos as u64));
            }
            Ok(Value::Nil)
        }),
    );
    pkg.functions.insert(
        "Now".to_string(),
        native("Now", 0, false, |_args| {
            let nanos = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as i64)
                .unwrap_or(0);
            Ok(Value::Int64(nanos))
        }),
    );

    Arc::new(pkg)
}
