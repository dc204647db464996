// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The source injector.
//!
//! Rewrites breakpoint markers (`pry.Pry()` / `pry.Apply(...)`) into scope
//! snapshots: a literal bindings table of every name lexically visible at
//! the marker plus a package descriptor per import. The original file is
//! renamed to a hidden shadow copy so the rewrite can be reverted.

mod exports;
mod liveness;

use std::path::{Path, PathBuf};
use std::process::ExitStatus;

pub use liveness::PryContext;

/// An injector instance. Breakpoint contexts are per-instance state so
/// concurrent injections do not interfere.
pub struct Injector {
    contexts: Vec<PryContext>,
    debug: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum InjectError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("no such file or directory: {}", .0.display())]
    MissingShadow(PathBuf),

    #[error("go command failed: {0}")]
    GoCommand(String),
}

impl Injector {
    pub fn new(debug: bool) -> Self {
        Self {
            contexts: Vec::new(),
            debug,
        }
    }

    fn debug(&self, msg: &str) {
        if self.debug {
            eprintln!("{}", msg);
        }
    }

    /// Inject breakpoint snapshots into a single file.
    ///
    /// Returns the injected path when the file contained markers, None when
    /// it did not. Any parse or IO failure aborts before the filesystem is
    /// touched, leaving it unchanged.
    pub fn inject_file(&mut self, path: &Path) -> Result<Option<PathBuf>, InjectError> {
        self.debug(&format!("Prying into {}", path.display()));
        let path = path
            .canonicalize()
            .unwrap_or_else(|_| path.to_path_buf());

        let source = std::fs::read_to_string(&path)?;
        let file = parse_file(&path, &source)?;

        self.contexts = liveness::find_contexts(&file, self.debug);
        if self.contexts.is_empty() {
            return Ok(None);
        }
        self.debug(&format!(
            " :: Found {} pry statements.",
            self.contexts.len()
        ));

        let package_pairs = exports::package_pairs(&file, &path, self.debug)?;

        // Rewrite left to right, maintaining a running byte offset.
        let mut text = source.clone();
        let mut offset: isize = 0;
        for context in &self.contexts {
            let mut obj = String::from("&pry.Scope{Vals:map[string]interface{}{ ");
            for v in filter_vars(&context.vars) {
                obj.push_str(&format!("{:?}: {}, ", v, v));
            }
            obj.push_str(&package_pairs);
            obj.push_str("}}");
            let replacement = format!("pry.Apply({})", obj);

            let start = (context.start as isize + offset) as usize;
            let end = (context.end as isize + offset) as usize;
            text = format!("{}{}{}", &text[..start], replacement, &text[end..]);
            offset += replacement.len() as isize - (context.end - context.start) as isize;
        }

        let shadow = pry_interp::shadow_path(&path);
        std::fs::rename(&path, &shadow)?;
        if let Err(e) = std::fs::write(&path, &text) {
            // Undo the rename so the tree is left as we found it.
            let _ = std::fs::rename(&shadow, &path);
            return Err(e.into());
        }
        Ok(Some(path))
    }

    /// Restore every recorded path from its shadow copy. A missing shadow
    /// halts the revert and surfaces to the caller.
    pub fn revert(&self, modified: &[PathBuf]) -> Result<(), InjectError> {
        for file in modified {
            let shadow = pry_interp::shadow_path(file);
            if !shadow.exists() {
                return Err(InjectError::MissingShadow(shadow));
            }
            std::fs::remove_file(file)?;
            std::fs::rename(&shadow, file)?;
        }
        Ok(())
    }

    /// Write a generated entry file (imports + extra statements + a
    /// breakpoint) and inject it.
    pub fn generate_file(
        &mut self,
        imports: &[String],
        extra_statements: &str,
        path: &Path,
    ) -> Result<(), InjectError> {
        let mut file = String::from("package main\nimport (\n\t\"pry\"\n\n");
        for imp in imports {
            if imp.is_empty() {
                continue;
            }
            file.push_str(&format!("\t{:?}\n", imp));
        }
        file.push_str(")\nfunc main() {\n\t");
        file.push_str(extra_statements);
        file.push_str("\n\tpry.Pry()\n}\n");

        std::fs::write(path, file)?;
        self.inject_file(path)?;
        Ok(())
    }

    /// Run the external `go` toolchain with inherited stdio. Used for the
    /// CLI pass-through mode; cross-compilation env vars ride along.
    pub fn execute_go_cmd(
        &self,
        args: &[String],
        env: &[(String, String)],
    ) -> Result<ExitStatus, InjectError> {
        let mut cmd = std::process::Command::new("go");
        cmd.args(args);
        for (k, v) in env {
            cmd.env(k, v);
        }
        cmd.status()
            .map_err(|e| InjectError::GoCommand(e.to_string()))
    }
}

/// Find every shadow file under a directory tree.
pub fn find_shadow_files(dir: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    walk(dir, &mut found);
    found
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk(&path, out);
        } else if path
            .file_name()
            .map(|n| {
                let n = n.to_string_lossy();
                n.starts_with('.') && n.ends_with("gopry")
            })
            .unwrap_or(false)
        {
            out.push(path);
        }
    }
}

/// The original path a shadow file was copied from.
pub fn original_of_shadow(shadow: &Path) -> Option<PathBuf> {
    let name = shadow.file_name()?.to_string_lossy();
    let original = name.strip_prefix('.')?.strip_suffix("pry")?;
    Some(
        shadow
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(original),
    )
}

fn filter_vars(vars: &[String]) -> Vec<&String> {
    vars.iter().filter(|v| v.as_str() != "_").collect()
}

pub(crate) fn parse_file(
    path: &Path,
    source: &str,
) -> Result<pry_ast::decl::File, InjectError> {
    let lexed = pry_lexer::Lexer::new(source).tokenize();
    if let Some(err) = lexed.errors.first() {
        return Err(InjectError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        });
    }
    let parsed = pry_parser::Parser::new(lexed.tokens).parse();
    if let Some(err) = parsed.errors.first() {
        return Err(InjectError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        });
    }
    parsed.file.ok_or_else(|| InjectError::Parse {
        path: path.to_path_buf(),
        message: "missing package clause".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SAMPLE: &str = "package main\n\nimport \"pry\"\n\nfunc main() {\n\ta := 1\n\tb := a + 1\n\tpry.Pry()\n\tc := b\n\t_ = c\n}\n";

    #[test]
    fn inject_rewrites_marker_and_creates_shadow() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.go");
        fs::write(&path, SAMPLE).unwrap();

        let mut injector = Injector::new(false);
        let injected = injector.inject_file(&path).unwrap();
        assert!(injected.is_some());

        let rewritten = fs::read_to_string(injected.as_deref().unwrap()).unwrap();
        assert!(rewritten.contains("pry.Apply(&pry.Scope{Vals:map[string]interface{}{"));
        assert!(rewritten.contains("\"a\": a"));
        assert!(rewritten.contains("\"b\": b"));
        // Names introduced after the breakpoint are not captured.
        assert!(!rewritten.contains("\"c\": c"));

        let shadow = pry_interp::shadow_path(injected.as_deref().unwrap());
        assert_eq!(fs::read_to_string(shadow).unwrap(), SAMPLE);
    }

    #[test]
    fn inject_then_revert_restores_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.go");
        fs::write(&path, SAMPLE).unwrap();

        let mut injector = Injector::new(false);
        let injected = injector.inject_file(&path).unwrap().unwrap();
        injector.revert(&[injected.clone()]).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), SAMPLE);
        assert!(!pry_interp::shadow_path(&injected).exists());
    }

    #[test]
    fn file_without_markers_is_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.go");
        let src = "package main\n\nfunc main() {\n\t_ = 1\n}\n";
        fs::write(&path, src).unwrap();

        let mut injector = Injector::new(false);
        assert!(injector.inject_file(&path).unwrap().is_none());
        assert_eq!(fs::read_to_string(&path).unwrap(), src);
        assert!(!pry_interp::shadow_path(&path).exists());
    }

    #[test]
    fn parse_failure_leaves_filesystem_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.go");
        let src = "package main\n\nfunc main( {\n";
        fs::write(&path, src).unwrap();

        let mut injector = Injector::new(false);
        assert!(injector.inject_file(&path).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), src);
    }

    #[test]
    fn revert_with_missing_shadow_halts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.go");
        fs::write(&path, SAMPLE).unwrap();
        let injector = Injector::new(false);
        let err = injector.revert(&[path]).unwrap_err();
        assert!(matches!(err, InjectError::MissingShadow(_)));
    }

    #[test]
    fn shadow_discovery_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.go");
        fs::write(&path, SAMPLE).unwrap();

        let mut injector = Injector::new(false);
        injector.inject_file(&path).unwrap();

        let shadows = find_shadow_files(dir.path());
        assert_eq!(shadows.len(), 1);
        let original = original_of_shadow(&shadows[0]).unwrap();
        assert_eq!(
            original.file_name().unwrap().to_string_lossy(),
            "main.go"
        );
    }

    #[test]
    fn generate_file_produces_injected_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.go");

        let mut injector = Injector::new(false);
        injector
            .generate_file(&["fmt".to_string()], "a := 10", &path)
            .unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("pry.Apply("));
        assert!(text.contains("\"a\": a"));
        assert!(text.contains("\"fmt\": pry.Package{Name: \"fmt\""));
    }
}
