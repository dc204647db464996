//! The fmt package table: printing and string formatting.

use std::sync::{Arc, OnceLock};

use crate::interp::RuntimeError;
use crate::value::Value;

use super::{native, Package};

pub fn package() -> Arc<Package> {
    static PKG: OnceLock<Arc<Package>> = OnceLock::new();
    PKG.get_or_init(build).clone()
}

fn build() -> Arc<Package> {
    let mut pkg = Package::new("fmt");
    pkg.functions.insert(
        "Println".to_string(),
        native("Println", 0, true, |args| {
            println!("{}", join_values(&args, " "));
            Ok(Value::Nil)
        }),
    );
    pkg.functions.insert(
        "Print".to_string(),
        native("Print", 0, true, |args| {
            print!("{}", join_values(&args, ""));
            Ok(Value::Nil)
        }),
    );
    pkg.functions.insert(
        "Printf".to_string(),
        native("Printf", 1, true, |args| {
            let (format, rest) = split_format(args)?;
            print!("{}", sprintf(&format, &rest)?);
            Ok(Value::Nil)
        }),
    );
    pkg.functions.insert(
        "Sprintf".to_string(),
        native("Sprintf", 1, true, |args| {
            let (format, rest) = split_format(args)?;
            Ok(Value::String(sprintf(&format, &rest)?))
        }),
    );
    pkg.functions.insert(
        "Sprint".to_string(),
        native("Sprint", 0, true, |args| {
            Ok(Value::String(join_values(&args, "")))
        }),
    );
    Arc::new(pkg)
}

fn split_format(args: Vec<Value>) -> Result<(String, Vec<Value>), RuntimeError> {
    let mut iter = args.into_iter();
    match iter.next() {
        Some(Value::String(s)) => Ok((s, iter.collect())),
        Some(other) => Err(RuntimeError::TypeError(format!(
            "format must be a string, got {}",
            other.type_name()
        ))),
        None => Err(RuntimeError::ArityMismatch {
            expected: 1,
            got: 0,
        }),
    }
}

fn join_values(args: &[Value], sep: &str) -> String {
    args.iter()
        .map(render_plain)
        .collect::<Vec<_>>()
        .join(sep)
}

/// %v-style rendering: strings unquoted, everything else as its literal.
fn render_plain(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => format!("{}", other),
    }
}

/// A subset of the host's formatting verbs: %v %d %s %t %f %q %T %%.
fn sprintf(format: &str, args: &[Value]) -> Result<String, RuntimeError> {
    let mut out = String::new();
    let mut chars = format.chars().peekable();
    let mut next = 0usize;

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let verb = match chars.next() {
            Some(v) => v,
            None => {
                out.push('%');
                break;
            }
        };
        if verb == '%' {
            out.push('%');
            continue;
        }
        let arg = args.get(next).cloned().unwrap_or(Value::Nil);
        next += 1;
        match verb {
            'v' | 'd' | 'f' | 't' => out.push_str(&render_plain(&arg)),
            's' => out.push_str(&render_plain(&arg)),
            'q' => out.push_str(&format!("{:?}", render_plain(&arg))),
            'T' => {
                let ty = match arg.go_type() {
                    Some(t) => t.to_string(),
                    None => "<nil>".to_string(),
                };
                out.push_str(&ty);
            }
            other => {
                return Err(RuntimeError::TypeError(format!(
                    "unsupported format verb %{}",
                    other
                )))
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sprintf_verbs() {
        let out = sprintf(
            "%d items in %s: %v",
            &[
                Value::Int(3),
                Value::String("box".into()),
                Value::Bool(true),
            ],
        )
        .unwrap();
        assert_eq!(out, "3 items in box: true");
    }

    #[test]
    fn sprintf_percent_escape() {
        assert_eq!(sprintf("100%%", &[]).unwrap(), "100%");
    }
}
