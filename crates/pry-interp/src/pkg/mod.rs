// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Package descriptors and the built-in package tables.
//!
//! A package is a name plus a table of exported values: constants,
//! functions, and type descriptors. The REPL resolves `pkg.Name` through
//! these tables; the injector materialises them into snapshot literals.

mod fmt_pkg;
mod math_pkg;
mod strconv_pkg;
mod strings_pkg;
mod time_pkg;

use std::collections::HashMap;
use std::sync::Arc;

use crate::gotype::{GoType, StructDef, StructField};
use crate::value::{Builtin, NativeFn, Value};

/// A package descriptor: exported names mapped to their values.
pub struct Package {
    pub name: String,
    pub functions: HashMap<String, Value>,
}

impl Package {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            functions: HashMap::new(),
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.functions.keys().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.functions.get(name).cloned()
    }
}

/// Names of the packages the interpreter provides natively.
pub fn builtin_package_names() -> &'static [&'static str] {
    &["fmt", "math", "strconv", "strings", "time"]
}

/// Look up a natively-provided package by import path.
pub fn builtin_package(path: &str) -> Option<Arc<Package>> {
    match path {
        "fmt" => Some(fmt_pkg::package()),
        "math" => Some(math_pkg::package()),
        "strconv" => Some(strconv_pkg::package()),
        "strings" => Some(strings_pkg::package()),
        "time" => Some(time_pkg::package()),
        _ => None,
    }
}

/// The debugger's own package: breakpoint markers plus the snapshot types
/// the injector references.
pub fn pry_package() -> Arc<Package> {
    let mut pkg = Package::new("pry");
    pkg.functions
        .insert("Pry".to_string(), Value::Builtin(Builtin::PryMarker));
    pkg.functions
        .insert("Apply".to_string(), Value::Builtin(Builtin::PryApply));
    pkg.functions
        .insert("Type".to_string(), Value::Builtin(Builtin::PryType));
    pkg.functions.insert(
        "Scope".to_string(),
        Value::Type(GoType::Struct(Arc::new(StructDef {
            name: "Scope".to_string(),
            fields: vec![StructField {
                name: "Vals".to_string(),
                ty: GoType::Map(Box::new(GoType::String), Box::new(GoType::Interface)),
            }],
        }))),
    );
    pkg.functions.insert(
        "Package".to_string(),
        Value::Type(GoType::Struct(Arc::new(StructDef {
            name: "Package".to_string(),
            fields: vec![
                StructField {
                    name: "Name".to_string(),
                    ty: GoType::String,
                },
                StructField {
                    name: "Functions".to_string(),
                    ty: GoType::Map(Box::new(GoType::String), Box::new(GoType::Interface)),
                },
            ],
        }))),
    );
    Arc::new(pkg)
}

/// Shorthand for registering a native function export.
pub(crate) fn native(
    name: &'static str,
    arity: usize,
    variadic: bool,
    f: impl Fn(Vec<Value>) -> Result<Value, crate::interp::RuntimeError> + Send + Sync + 'static,
) -> Value {
    Value::Native(NativeFn::new(name, arity, variadic, f))
}
