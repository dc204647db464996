// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Autocomplete engines.
//!
//! Static completion prefix-matches on scope keys, following dotted
//! segments through packages and structs with the same keys/get protocol
//! the scope itself exposes. The delegated engine splices the current line
//! into the breakpoint file and asks an external daemon, falling back to
//! static completion when it is unreachable.

use std::sync::OnceLock;

use pry_interp::{Scope, Value};
use regex::Regex;

fn trailing_expr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("[.0-9a-zA-Z]+$").unwrap())
}

/// A completion target: the scope itself, or a value reached through dotted
/// navigation (keeping the scope at hand for method-set lookups).
enum Node {
    Scope(Scope),
    Value(Scope, Value),
}

impl Node {
    fn get(&self, key: &str) -> Option<Node> {
        match self {
            Node::Scope(scope) => scope.get(key).map(|v| Node::Value(scope.clone(), v)),
            Node::Value(scope, Value::Package(pkg)) => {
                pkg.get(key).map(|v| Node::Value(scope.clone(), v))
            }
            Node::Value(scope, Value::Struct(s)) => s
                .field_by_name(key)
                .map(|v| Node::Value(scope.clone(), v)),
            Node::Value(scope, Value::Pointer(cell)) => {
                let inner = cell.lock().unwrap().clone();
                Node::Value(scope.clone(), inner).get(key)
            }
            _ => None,
        }
    }

    fn keys(&self) -> Vec<String> {
        match self {
            Node::Scope(scope) => scope.keys(),
            Node::Value(_, Value::Package(pkg)) => pkg.keys(),
            Node::Value(scope, Value::Struct(s)) => {
                let mut keys: Vec<String> =
                    s.def.fields.iter().map(|f| f.name.clone()).collect();
                // Method sets participate in dotted navigation.
                let methods = scope.session().methods.lock().unwrap();
                if let Some(set) = methods.get(&s.def.name) {
                    for name in set.keys() {
                        keys.push(format!("{}(", name));
                    }
                }
                keys
            }
            Node::Value(scope, Value::Pointer(cell)) => {
                let inner = cell.lock().unwrap().clone();
                Node::Value(scope.clone(), inner).keys()
            }
            _ => Vec::new(),
        }
    }
}

/// Static completion over the scope for the text left of the cursor.
pub fn suggestions(scope: &Scope, line: &str, index: usize) -> Vec<String> {
    let text = &line[..index.min(line.len())];
    let Some(m) = trailing_expr_re().find(text) else {
        return Vec::new();
    };
    let wip = m.as_str();
    if wip.is_empty() {
        return Vec::new();
    }

    let parts: Vec<&str> = wip.split('.').collect();
    let mut node = Node::Scope(scope.clone());
    for part in &parts[..parts.len() - 1] {
        match node.get(part) {
            Some(next) => node = next,
            None => return Vec::new(),
        }
    }

    let partial = parts[parts.len() - 1];
    let mut matching: Vec<String> = node
        .keys()
        .into_iter()
        .filter(|k| k.starts_with(partial))
        .collect();
    matching.sort();
    matching
}

/// Delegated completion through an external daemon (Unix only): splice the
/// line into the breakpoint file and parse the daemon's output. Any failure
/// falls back to static completion.
#[cfg(unix)]
pub fn suggestions_external(scope: &Scope, line: &str, index: usize) -> Vec<String> {
    match gocode_suggestions(scope, line, index) {
        Some(suggestions) if !suggestions.is_empty() => suggestions,
        _ => suggestions(scope, line, index),
    }
}

#[cfg(not(unix))]
pub fn suggestions_external(scope: &Scope, line: &str, index: usize) -> Vec<String> {
    suggestions(scope, line, index)
}

#[cfg(unix)]
fn gocode_suggestions(scope: &Scope, line: &str, index: usize) -> Option<Vec<String>> {
    use std::io::Write;
    use std::process::{Command, Stdio};

    let session = scope.session();
    let shadow = session.breakpoint_path()?;
    let bp_line = session.breakpoint_line();

    let files = session.files.lock().unwrap();
    let (path, sf) = files
        .iter()
        .find(|(p, _)| pry_interp::shadow_path(p) == shadow)?;

    // Insert the WIP line at the start of the breakpoint line.
    let offset = line_start_offset(&sf.source, bp_line)?;
    let mut code = sf.source.clone();
    code.insert_str(offset, line);
    let cursor = offset + index.min(line.len());

    let dir = path.parent()?;
    let mut child = Command::new("gocode")
        .arg("autocomplete")
        .arg(dir)
        .arg(cursor.to_string())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .ok()?;

    child.stdin.take()?.write_all(code.as_bytes()).ok()?;
    let output = child.wait_with_output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout);
    Some(
        text.lines()
            .skip(1)
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect(),
    )
}

#[cfg(unix)]
fn line_start_offset(source: &str, line: u32) -> Option<usize> {
    let mut current = 1u32;
    if line == 1 {
        return Some(0);
    }
    for (i, b) in source.bytes().enumerate() {
        if b == b'\n' {
            current += 1;
            if current == line {
                return Some(i + 1);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pry_interp::Value;

    #[test]
    fn empty_input_suggests_nothing() {
        let scope = Scope::new();
        scope.set("alpha", Value::Int(1));
        assert!(suggestions(&scope, "", 0).is_empty());
    }

    #[test]
    fn prefix_matches_scope_keys() {
        let scope = Scope::new();
        scope.set("alpha", Value::Int(1));
        scope.set("alphabet", Value::Int(2));
        scope.set("beta", Value::Int(3));
        let out = suggestions(&scope, "alp", 3);
        assert_eq!(out, vec!["alpha".to_string(), "alphabet".to_string()]);
    }

    #[test]
    fn dotted_navigation_through_packages() {
        let scope = Scope::new();
        scope.set(
            "fmt",
            Value::Package(pry_interp::builtin_package("fmt").unwrap()),
        );
        let out = suggestions(&scope, "fmt.Pri", 7);
        assert!(out.contains(&"Print".to_string()));
        assert!(out.contains(&"Println".to_string()));
        assert!(out.contains(&"Printf".to_string()));
        assert!(!out.contains(&"Sprintf".to_string()));
    }

    #[test]
    fn completion_respects_the_cursor() {
        let scope = Scope::new();
        scope.set("alpha", Value::Int(1));
        // Cursor inside the word: only the prefix left of it counts.
        let out = suggestions(&scope, "alphaXYZ", 3);
        assert_eq!(out, vec!["alpha".to_string()]);
    }

    #[test]
    fn unknown_base_suggests_nothing() {
        let scope = Scope::new();
        assert!(suggestions(&scope, "missing.fie", 11).is_empty());
    }
}
