// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Tree-walk interpreter for the host-language subset.
//!
//! Evaluates REPL input and instrumented source over live lexical scopes.
//! Values are a tagged representation; the operator kernel dispatches on
//! (kind, op) pairs instead of reflection.

mod chan;
mod format;
mod gotype;
mod kernel;
mod scope;
mod value;

mod interp;
mod pkg;
mod program;

pub use chan::Channel;
pub use gotype::{convert, GoType, StructDef, StructField};
pub use interp::RuntimeError;
pub use kernel::{compute_binary_op, compute_unary_op, deep_equal, value_eq};
pub use pkg::{builtin_package, builtin_package_names, pry_package, Package};
pub use program::Program;
pub use scope::{
    shadow_path, BreakpointHook, Cell, DeferredCall, MethodDef, Scope, Session, SourceFile,
};
pub use value::{
    ArrayRef, Builtin, FuncVal, MapRef, NativeFn, SliceRef, StructVal, Value, ValueKey,
};
