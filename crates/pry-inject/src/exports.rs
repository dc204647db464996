// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Export materialisation: each imported package becomes a name→value table
//! in the snapshot literal.
//!
//! Known packages come from the interpreter's built-in tables; local import
//! paths are parsed from source. Value and function exports are emitted as
//! plain path references, type exports are wrapped in `pry.Type(...)` over a
//! zero value, and constants that exceed the signed int range are wrapped in
//! an explicit `uint64(...)` cast.

use std::collections::BTreeMap;
use std::path::Path;

use pry_ast::decl::{DeclKind, File};
use pry_ast::expr::ExprKind;
use pry_interp::{GoType, Value};

use crate::InjectError;

/// Build the package-descriptor entries appended to every snapshot literal.
pub fn package_pairs(file: &File, file_path: &Path, debug: bool) -> Result<String, InjectError> {
    let mut pairs = String::new();
    for imp in &file.imports {
        if is_pry_import(&imp.path) {
            continue;
        }
        let local = imp.local_name();
        let (pkg_name, exports) = match pry_interp::builtin_package(&imp.path) {
            Some(pkg) => (pkg.name.clone(), builtin_exports(local, &pkg)),
            None => match local_package_exports(local, &imp.path, file_path, debug)? {
                Some((name, exports)) => (name, exports),
                None => {
                    if debug {
                        eprintln!("no sources found for import {:?}", imp.path);
                    }
                    (local.to_string(), String::new())
                }
            },
        };
        pairs.push_str(&format!(
            "{:?}: pry.Package{{Name: {:?}, Functions: map[string]interface{{}}{{{}}}}}, ",
            local, pkg_name, exports
        ));
    }
    Ok(pairs)
}

/// Exports of a natively-provided package, emitted from its table.
fn builtin_exports(local: &str, pkg: &pry_interp::Package) -> String {
    // Sorted for deterministic output.
    let table: BTreeMap<String, Value> = pkg
        .functions
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let mut out = String::new();
    for (name, value) in table {
        let path = format!("{}.{}", local, name);
        match value {
            // Constants past the signed range keep their bits through an
            // explicit unsigned cast.
            Value::Uint64(v) if v > i64::MAX as u64 => {
                out.push_str(&format!("{:?}: uint64({}),", name, path));
            }
            Value::Type(ty) => {
                out.push_str(&format!(
                    "{:?}: pry.Type({}({})),",
                    name,
                    path,
                    zero_literal(&ty)
                ));
            }
            _ => {
                out.push_str(&format!("{:?}: {},", name, path));
            }
        }
    }
    out
}

/// Exports of a package imported by path, parsed from its sources. Returns
/// None when the path does not resolve to a directory of sources.
fn local_package_exports(
    local: &str,
    import_path: &str,
    file_path: &Path,
    debug: bool,
) -> Result<Option<(String, String)>, InjectError> {
    let base = file_path.parent().unwrap_or_else(|| Path::new(""));
    let dir = base.join(import_path);
    if !dir.is_dir() {
        return Ok(None);
    }

    let mut out = String::new();
    let mut added: Vec<String> = Vec::new();
    let mut pkg_name = local.to_string();

    let mut entries: Vec<_> = std::fs::read_dir(&dir)?
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().map(|e| e == "go").unwrap_or(false))
        .collect();
    entries.sort();

    for source_path in entries {
        let source = std::fs::read_to_string(&source_path)?;
        let parsed = match crate::parse_file(&source_path, &source) {
            Ok(f) => f,
            Err(e) => {
                if debug {
                    eprintln!("skipping {}: {}", source_path.display(), e);
                }
                continue;
            }
        };
        pkg_name = parsed.package.clone();
        collect_file_exports(local, &parsed, &mut out, &mut added, debug);
    }
    Ok(Some((pkg_name, out)))
}

fn collect_file_exports(
    local: &str,
    file: &File,
    out: &mut String,
    added: &mut Vec<String>,
    debug: bool,
) {
    for decl in &file.decls {
        match &decl.kind {
            DeclKind::Func(f) => {
                if f.recv.is_none() && is_exported(&f.name) && !added.contains(&f.name) {
                    added.push(f.name.clone());
                    out.push_str(&format!("{:?}: {}.{},", f.name, local, f.name));
                }
            }
            DeclKind::Var(spec) | DeclKind::Const(spec) => {
                for (i, name) in spec.names.iter().enumerate() {
                    if !is_exported(name) || added.contains(name) {
                        continue;
                    }
                    added.push(name.clone());
                    let path = format!("{}.{}", local, name);
                    // Very large numeric constants are wrapped so their
                    // value survives the signed literal parse.
                    let oversized = matches!(
                        spec.values.get(i).map(|v| &v.kind),
                        Some(ExprKind::UintBig(_))
                    );
                    if oversized {
                        out.push_str(&format!("{:?}: uint64({}),", name, path));
                    } else {
                        out.push_str(&format!("{:?}: {},", name, path));
                    }
                }
            }
            DeclKind::Type(td) => {
                if !is_exported(&td.name) || added.contains(&td.name) {
                    continue;
                }
                added.push(td.name.clone());
                let path = format!("{}.{}", local, td.name);
                match &td.ty.kind {
                    ExprKind::StructType { .. } => {
                        out.push_str(&format!("{:?}: pry.Type({}{{}}),", td.name, path));
                    }
                    _ => match resolve_type(&td.ty.kind) {
                        Some(ty) => {
                            out.push_str(&format!(
                                "{:?}: pry.Type({}({})),",
                                td.name,
                                path,
                                zero_literal(&ty)
                            ));
                        }
                        None => {
                            if debug {
                                eprintln!("TypeSpec skipped for {}", td.name);
                            }
                        }
                    },
                }
            }
        }
    }
}

/// Resolve a named scalar/slice/map type expression without a live scope.
fn resolve_type(kind: &ExprKind) -> Option<GoType> {
    match kind {
        ExprKind::Ident(name) => GoType::by_name(name),
        ExprKind::ArrayType { len: None, elem } => {
            Some(GoType::Slice(Box::new(resolve_type(&elem.kind)?)))
        }
        ExprKind::MapType { key, value } => Some(GoType::Map(
            Box::new(resolve_type(&key.kind)?),
            Box::new(resolve_type(&value.kind)?),
        )),
        _ => None,
    }
}

/// The zero value of a type as source text.
fn zero_literal(ty: &GoType) -> String {
    match ty {
        GoType::Bool => "false".to_string(),
        GoType::String => "\"\"".to_string(),
        GoType::Float32 | GoType::Float64 => "0.0".to_string(),
        GoType::Slice(_) | GoType::Map(_, _) | GoType::Chan(_) | GoType::Interface => {
            "nil".to_string()
        }
        _ => "0".to_string(),
    }
}

fn is_exported(name: &str) -> bool {
    name.chars()
        .next()
        .map(|c| c.is_ascii_uppercase())
        .unwrap_or(false)
}

fn is_pry_import(path: &str) -> bool {
    path == "pry" || path == "../pry" || path.ends_with("/pry")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> File {
        crate::parse_file(Path::new("test.go"), src).unwrap()
    }

    #[test]
    fn builtin_fmt_exports_reference_paths() {
        let file = parse("package main\nimport \"fmt\"\nfunc main() {}\n");
        let pairs = package_pairs(&file, Path::new("/tmp/test.go"), false).unwrap();
        assert!(pairs.contains("\"fmt\": pry.Package{Name: \"fmt\""));
        assert!(pairs.contains("\"Println\": fmt.Println,"));
    }

    #[test]
    fn oversized_constants_get_the_unsigned_wrap() {
        let file = parse("package main\nimport \"math\"\nfunc main() {}\n");
        let pairs = package_pairs(&file, Path::new("/tmp/test.go"), false).unwrap();
        assert!(pairs.contains("\"MaxUint64\": uint64(math.MaxUint64),"));
        assert!(pairs.contains("\"MaxInt64\": math.MaxInt64,"));
    }

    #[test]
    fn renamed_imports_use_the_local_name() {
        let file = parse("package main\nimport m \"math\"\nfunc main() {}\n");
        let pairs = package_pairs(&file, Path::new("/tmp/test.go"), false).unwrap();
        assert!(pairs.contains("\"m\": pry.Package{Name: \"math\""));
        assert!(pairs.contains("\"Pi\": m.Pi,"));
    }

    #[test]
    fn pry_import_is_never_materialised() {
        let file = parse("package main\nimport \"pry\"\nfunc main() {}\n");
        let pairs = package_pairs(&file, Path::new("/tmp/test.go"), false).unwrap();
        assert!(pairs.is_empty());
    }

    #[test]
    fn local_package_exports_are_parsed_from_source() {
        let dir = tempfile::tempdir().unwrap();
        let pkg_dir = dir.path().join("mylib");
        std::fs::create_dir(&pkg_dir).unwrap();
        std::fs::write(
            pkg_dir.join("lib.go"),
            "package mylib\n\nconst Answer = 42\nconst hidden = 1\n\nfunc Double(x int) int { return x * 2 }\n\ntype Point struct {\n\tX int\n\tY int\n}\n\ntype Name string\n",
        )
        .unwrap();
        let main_path = dir.path().join("main.go");
        let file = parse("package main\nimport \"mylib\"\nfunc main() {}\n");

        let pairs = package_pairs(&file, &main_path, false).unwrap();
        assert!(pairs.contains("\"Answer\": mylib.Answer,"));
        assert!(pairs.contains("\"Double\": mylib.Double,"));
        assert!(pairs.contains("\"Point\": pry.Type(mylib.Point{}),"));
        assert!(pairs.contains("\"Name\": pry.Type(mylib.Name(\"\")),"));
        assert!(!pairs.contains("hidden"));
    }
}
