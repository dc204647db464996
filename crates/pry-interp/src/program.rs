// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Whole-program execution of instrumented source files.
//!
//! Registers imports and top-level declarations into a root scope, then
//! runs `main`. Injected `pry.Apply(...)` calls reach the session's
//! breakpoint hook during interpretation.

use std::path::Path;
use std::sync::Arc;

use pry_ast::decl::{Decl, DeclKind};
use pry_ast::expr::{ExprKind, FuncLit};
use pry_ast::LineMap;

use crate::gotype::{GoType, StructDef, StructField};
use crate::interp::RuntimeError;
use crate::pkg;
use crate::scope::{BreakpointHook, MethodDef, Scope, Session, SourceFile};
use crate::value::{FuncVal, Value};

pub struct Program {
    session: Arc<Session>,
    root: Scope,
}

impl Program {
    pub fn new() -> Self {
        let session = Arc::new(Session::default());
        let root = Scope::with_session(session.clone());
        Self { session, root }
    }

    pub fn session(&self) -> Arc<Session> {
        self.session.clone()
    }

    pub fn root(&self) -> &Scope {
        &self.root
    }

    pub fn set_breakpoint_hook(&self, hook: BreakpointHook) {
        *self.session.breakpoint.lock().unwrap() = Some(hook);
    }

    /// Parse a source file and register its imports and declarations.
    pub fn load_file(&self, path: &Path, source: String) -> Result<(), RuntimeError> {
        let lexed = pry_lexer::Lexer::new(&source).tokenize();
        if let Some(err) = lexed.errors.first() {
            return Err(RuntimeError::ParseFailed(format!(
                "{}: {}",
                path.display(),
                err
            )));
        }
        let parsed = pry_parser::Parser::new(lexed.tokens).parse();
        if let Some(err) = parsed.errors.first() {
            return Err(RuntimeError::ParseFailed(format!(
                "{}: {}",
                path.display(),
                err
            )));
        }
        let file = match parsed.file {
            Some(f) => f,
            None => {
                return Err(RuntimeError::ParseFailed(format!(
                    "{}: no package clause",
                    path.display()
                )))
            }
        };

        for imp in &file.imports {
            let local = imp.local_name().to_string();
            if is_pry_import(&imp.path) {
                self.root.set(&local, Value::Package(pkg::pry_package()));
            } else if let Some(p) = pkg::builtin_package(&imp.path) {
                self.root.set(&local, Value::Package(p));
            } else {
                // Unknown imports resolve to an empty table; selecting into
                // them reports an unknown field at use.
                self.root.set(
                    &local,
                    Value::Package(Arc::new(pkg::Package::new(&local))),
                );
            }
        }

        for decl in &file.decls {
            self.register_decl(decl)?;
        }

        let lines = LineMap::new(&source);
        self.session.files.lock().unwrap().insert(
            path.to_path_buf(),
            SourceFile {
                source,
                file,
                lines,
            },
        );
        *self.session.current_file.lock().unwrap() = Some(path.to_path_buf());
        Ok(())
    }

    fn register_decl(&self, decl: &Decl) -> Result<(), RuntimeError> {
        match &decl.kind {
            DeclKind::Func(f) => {
                let lit = FuncLit {
                    params: f.params.clone(),
                    results: f.results.clone(),
                    body: f.body.clone(),
                };
                let func = FuncVal {
                    lit: Arc::new(lit),
                    scope: self.root.clone(),
                };
                match &f.recv {
                    // Methods register into the type's method set.
                    Some(recv) => {
                        let recv_name = recv
                            .names
                            .first()
                            .cloned()
                            .unwrap_or_else(|| "_".to_string());
                        if let Some(type_name) = recv_type_name(&recv.ty) {
                            self.session
                                .methods
                                .lock()
                                .unwrap()
                                .entry(type_name)
                                .or_default()
                                .insert(f.name.clone(), MethodDef { recv_name, func });
                        }
                    }
                    None => self.root.set(&f.name, Value::Func(func)),
                }
            }
            DeclKind::Var(spec) | DeclKind::Const(spec) => {
                let zero = match &spec.ty {
                    Some(ty) => Some(self.root.eval_type(ty)?.zero()),
                    None => None,
                };
                for (i, name) in spec.names.iter().enumerate() {
                    if let Some(value) = spec.values.get(i) {
                        let v = self.root.eval_expr(value)?;
                        self.root.set(name, v);
                    } else if let Some(zero) = &zero {
                        self.root.set(name, zero.clone());
                    }
                }
            }
            DeclKind::Type(td) => {
                let ty = match &td.ty.kind {
                    ExprKind::StructType { fields } => {
                        let mut out = Vec::new();
                        for field in fields {
                            let field_ty = self
                                .root
                                .eval_type(&field.ty)
                                .unwrap_or(GoType::Interface);
                            for name in &field.names {
                                out.push(StructField {
                                    name: name.clone(),
                                    ty: field_ty.clone(),
                                });
                            }
                        }
                        GoType::Struct(self.session.structs.intern(StructDef {
                            name: td.name.clone(),
                            fields: out,
                        }))
                    }
                    _ => match self.root.eval_type(&td.ty) {
                        Ok(t) => t,
                        // Unresolvable named types degrade to the empty
                        // interface rather than failing the whole load.
                        Err(_) => GoType::Interface,
                    },
                };
                self.root.set(&td.name, Value::Type(ty));
            }
        }
        Ok(())
    }

    /// Run the program's main function.
    pub fn run(&self) -> Result<Value, RuntimeError> {
        match self.root.get("main") {
            Some(Value::Func(f)) => self.root.call_function(&f, vec![]),
            Some(other) => Err(RuntimeError::NotAFunction(other.type_name())),
            None => Err(RuntimeError::UnknownIdent("main".to_string())),
        }
    }

    /// Convenience: load from disk and run, installing the given hook.
    pub fn run_path(path: &Path, hook: Option<BreakpointHook>) -> Result<Value, RuntimeError> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| RuntimeError::ParseFailed(format!("{}: {}", path.display(), e)))?;
        let program = Program::new();
        if let Some(hook) = hook {
            program.set_breakpoint_hook(hook);
        }
        program.load_file(path, source)?;
        program.run()
    }
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

/// The debugger's own package import, under any of its historical paths.
fn is_pry_import(path: &str) -> bool {
    path == "pry" || path == "../pry" || path.ends_with("/pry")
}

/// The named type a method receiver is declared on.
fn recv_type_name(ty: &pry_ast::expr::Expr) -> Option<String> {
    match &ty.kind {
        ExprKind::Ident(name) => Some(name.clone()),
        ExprKind::Unary { x, .. } => recv_type_name(x),
        ExprKind::Paren(inner) => recv_type_name(inner),
        _ => None,
    }
}
