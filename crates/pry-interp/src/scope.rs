// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Nested lexical environments with write-through semantics.
//!
//! Every binding lives in an addressable cell so `&x` and in-place
//! field/index updates observe later writes. Frames are reference-counted;
//! closures and deferred calls keep their defining frame alive past the
//! block that created it.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use pry_ast::decl::File;
use pry_ast::expr::Expr;
use pry_ast::LineMap;

use crate::gotype::{GoType, StructRegistry};
use crate::value::Value;

/// The addressable storage slot holding one value.
pub type Cell = Arc<Mutex<Value>>;

/// Hook invoked when execution reaches an injected breakpoint.
pub type BreakpointHook = Arc<dyn Fn(&Scope) + Send + Sync>;

/// A deferred call: callee expression and receiving scope are captured
/// unevaluated, arguments eagerly.
pub struct DeferredCall {
    pub fun: Expr,
    pub scope: Scope,
    pub args: Vec<Value>,
}

/// A parsed source file kept for checking and completion.
pub struct SourceFile {
    pub source: String,
    pub file: File,
    pub lines: LineMap,
}

/// A method bound to a named type: the receiver name plus the function and
/// its defining scope.
pub struct MethodDef {
    pub recv_name: String,
    pub func: crate::value::FuncVal,
}

/// Session-wide state shared by every frame: parsed files, the breakpoint
/// location, registered method sets, and the REPL's breakpoint hook.
#[derive(Default)]
pub struct Session {
    pub files: Mutex<HashMap<PathBuf, SourceFile>>,
    /// Shadow path of the file whose breakpoint is active.
    pub path: Mutex<Option<PathBuf>>,
    pub line: Mutex<u32>,
    /// Source file currently being interpreted.
    pub current_file: Mutex<Option<PathBuf>>,
    pub breakpoint: Mutex<Option<BreakpointHook>>,
    pub structs: StructRegistry,
    /// type name → method name → definition.
    pub methods: Mutex<HashMap<String, HashMap<String, MethodDef>>>,
}

/// The shadow-file name for an original source path:
/// `dirname(original)/.basename(original)pry`.
pub fn shadow_path(original: &std::path::Path) -> PathBuf {
    let dir = original.parent().unwrap_or_else(|| std::path::Path::new(""));
    let base = original
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dir.join(format!(".{}pry", base))
}

impl Session {
    pub fn breakpoint_path(&self) -> Option<PathBuf> {
        self.path.lock().unwrap().clone()
    }

    pub fn breakpoint_line(&self) -> u32 {
        *self.line.lock().unwrap()
    }
}

struct Frame {
    vals: Mutex<HashMap<String, Cell>>,
    parent: Option<Scope>,
    session: Arc<Session>,
    is_function: bool,
    /// Toggled off once a select clause commits, so its body blocks normally.
    is_select: std::sync::atomic::AtomicBool,
    defers: Mutex<Vec<DeferredCall>>,
    type_assert: Mutex<Option<GoType>>,
}

/// A lexical scope frame. Cheap to clone; clones share the frame.
#[derive(Clone)]
pub struct Scope {
    inner: Arc<Frame>,
}

impl Scope {
    /// Create a root scope with a fresh session.
    pub fn new() -> Self {
        Self::with_session(Arc::new(Session::default()))
    }

    /// Create a root scope over an existing session.
    pub fn with_session(session: Arc<Session>) -> Self {
        Scope {
            inner: Arc::new(Frame {
                vals: Mutex::new(HashMap::new()),
                parent: None,
                session,
                is_function: false,
                is_select: std::sync::atomic::AtomicBool::new(false),
                defers: Mutex::new(Vec::new()),
                type_assert: Mutex::new(None),
            }),
        }
    }

    fn child_with(&self, is_function: bool, is_select: bool) -> Scope {
        Scope {
            inner: Arc::new(Frame {
                vals: Mutex::new(HashMap::new()),
                parent: Some(self.clone()),
                session: self.inner.session.clone(),
                is_function,
                is_select: std::sync::atomic::AtomicBool::new(is_select),
                defers: Mutex::new(Vec::new()),
                type_assert: Mutex::new(None),
            }),
        }
    }

    /// Create a scope under the existing scope.
    pub fn child(&self) -> Scope {
        self.child_with(false, false)
    }

    /// A function frame: defer registration lands here.
    pub fn child_function(&self) -> Scope {
        self.child_with(true, false)
    }

    /// A select comm frame: channel receives poll instead of blocking.
    pub fn child_select(&self) -> Scope {
        self.child_with(false, true)
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.inner.session
    }

    pub fn is_select(&self) -> bool {
        self.inner
            .is_select
            .load(std::sync::atomic::Ordering::Relaxed)
    }

    pub fn set_select(&self, on: bool) {
        self.inner
            .is_select
            .store(on, std::sync::atomic::Ordering::Relaxed);
    }

    /// Walk the chain and find the cell bound to `name`.
    ///
    /// Each frame's mutex is held only for its own lookup step; chains are
    /// trees, so deepest-first acquisition cannot deadlock.
    pub fn get_cell(&self, name: &str) -> Option<Cell> {
        let mut current = Some(self.clone());
        while let Some(scope) = current {
            let found = scope.inner.vals.lock().unwrap().get(name).cloned();
            if found.is_some() {
                return found;
            }
            current = scope.inner.parent.clone();
        }
        None
    }

    /// Walk the chain and read the value bound to `name`. The cell is
    /// dereferenced exactly once.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.get_cell(name).map(|cell| cell.lock().unwrap().clone())
    }

    /// Write-through assignment: rebind in the nearest enclosing frame that
    /// already defines the name, else create in this frame. The existing
    /// cell is written in place so previously-taken addresses stay current.
    pub fn set(&self, name: &str, value: Value) {
        let mut current = Some(self.clone());
        while let Some(scope) = current {
            let cell = scope.inner.vals.lock().unwrap().get(name).cloned();
            if let Some(cell) = cell {
                *cell.lock().unwrap() = value;
                return;
            }
            current = scope.inner.parent.clone();
        }
        self.inner
            .vals
            .lock()
            .unwrap()
            .insert(name.to_string(), Arc::new(Mutex::new(value)));
    }

    /// Bind in this frame only (parameters, range variables).
    pub fn define(&self, name: &str, value: Value) {
        self.inner
            .vals
            .lock()
            .unwrap()
            .insert(name.to_string(), Arc::new(Mutex::new(value)));
    }

    /// All keys visible from this frame, innermost first.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        let mut current = Some(self.clone());
        while let Some(scope) = current {
            for k in scope.inner.vals.lock().unwrap().keys() {
                if !keys.contains(k) {
                    keys.push(k.clone());
                }
            }
            current = scope.inner.parent.clone();
        }
        keys
    }

    /// Register a deferred call on the nearest enclosing function frame.
    pub fn push_defer(&self, d: DeferredCall) -> Result<(), crate::interp::RuntimeError> {
        let mut current = Some(self.clone());
        while let Some(scope) = current {
            if scope.inner.is_function {
                scope.inner.defers.lock().unwrap().push(d);
                return Ok(());
            }
            current = scope.inner.parent.clone();
        }
        Err(crate::interp::RuntimeError::DeferOutsideFunction)
    }

    /// Drain this frame's deferred calls, last registered first.
    pub fn take_defers(&self) -> Vec<DeferredCall> {
        let mut defers = std::mem::take(&mut *self.inner.defers.lock().unwrap());
        defers.reverse();
        defers
    }

    /// Record the dynamic type revealed by a bare type assertion.
    pub fn set_type_assert(&self, ty: Option<GoType>) {
        *self.inner.type_assert.lock().unwrap() = ty;
    }

    pub fn type_assert(&self) -> Option<GoType> {
        self.inner.type_assert.lock().unwrap().clone()
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_set_roundtrip() {
        let scope = Scope::new();
        scope.set("a", Value::Int(5));
        assert!(matches!(scope.get("a"), Some(Value::Int(5))));
        assert!(scope.get("missing").is_none());
    }

    #[test]
    fn write_through_rebinds_in_defining_frame() {
        let root = Scope::new();
        root.set("a", Value::Int(1));
        let child = root.child();
        child.set("a", Value::Int(2));
        assert!(matches!(root.get("a"), Some(Value::Int(2))));
        // No shadow copy was created in the child frame itself.
        assert!(child.inner.vals.lock().unwrap().get("a").is_none());
    }

    #[test]
    fn set_creates_in_current_frame_when_unbound() {
        let root = Scope::new();
        let child = root.child();
        child.set("fresh", Value::Int(3));
        assert!(root.get("fresh").is_none());
        assert!(matches!(child.get("fresh"), Some(Value::Int(3))));
    }

    #[test]
    fn cells_are_stable_across_writes() {
        let scope = Scope::new();
        scope.set("x", Value::Int(1));
        let cell = scope.get_cell("x").unwrap();
        scope.set("x", Value::Int(9));
        assert!(matches!(&*cell.lock().unwrap(), Value::Int(9)));
    }

    #[test]
    fn keys_walk_the_chain() {
        let root = Scope::new();
        root.set("a", Value::Int(1));
        let child = root.child();
        child.set("b", Value::Int(2));
        let keys = child.keys();
        assert!(keys.contains(&"a".to_string()));
        assert!(keys.contains(&"b".to_string()));
    }

    #[test]
    fn defer_requires_function_frame() {
        let scope = Scope::new();
        let d = DeferredCall {
            fun: pry_ast::expr::Expr {
                kind: pry_ast::expr::ExprKind::Ident("f".into()),
                span: pry_ast::Span::default(),
            },
            scope: scope.clone(),
            args: vec![],
        };
        assert!(scope.push_defer(d).is_err());
    }
}
