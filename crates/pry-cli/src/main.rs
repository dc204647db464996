//! gopry - breakpoint REPL and wrapper around the go command.
//!
//! With no arguments it drops into an interactive session preloaded with
//! the configured imports. Given go arguments it injects breakpoints into
//! the target files, passes the command through, and reverts on exit.

mod output;

use std::env;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use pry_inject::{find_shadow_files, original_of_shadow, Injector};
use pry_interp::{Program, Scope};
use pry_repl::Repl;

struct Flags {
    imports: String,
    execute: String,
    revert: bool,
    debug: bool,
    generate: Option<PathBuf>,
    rest: Vec<String>,
}

fn main() {
    output::init();
    if let Err(err) = run() {
        eprintln!("{} {}", output::error_label(), err);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let flags = parse_flags()?;
    let mut injector = Injector::new(flags.debug);

    if flags.rest.is_empty() {
        let imports: Vec<String> = flags
            .imports
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if let Some(path) = &flags.generate {
            injector.generate_file(&imports, &flags.execute, path)?;
            return Ok(());
        }

        // Interactive session: generate a temp entry file, inject it, and
        // interpret it so the breakpoint opens the REPL.
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("main.go");
        injector.generate_file(&imports, &flags.execute, &path)?;
        run_interpreted(&path)?;
        return Ok(());
    }

    match flags.rest[0].as_str() {
        "revert" => {
            println!("Reverting files");
            let mut modified = Vec::new();
            for dir in go_dirs(&flags.rest[1..]) {
                for shadow in find_shadow_files(&dir) {
                    if let Some(original) = original_of_shadow(&shadow) {
                        if !modified.contains(&original) {
                            modified.push(original);
                        }
                    }
                }
            }
            injector.revert(&modified)?;
            Ok(())
        }

        "apply" => {
            inject_all(&mut injector, &flags.rest[1..], false)?;
            Ok(())
        }

        "run" => {
            // Self-hosted execution: inject, interpret with the breakpoint
            // hook installed, then revert.
            let targets: Vec<String> = flags.rest[1..].to_vec();
            let entry = targets
                .iter()
                .find(|a| a.ends_with(".go"))
                .ok_or("run requires a .go file")?;
            let modified = inject_all(&mut injector, &targets, false)?;
            let result = run_interpreted(Path::new(entry));
            if flags.revert {
                injector.revert(&modified)?;
            }
            result
        }

        _ => {
            // Pass-through: inject, run the real toolchain, revert.
            let tests_required = flags.rest[0] == "test";
            let modified = inject_all(&mut injector, &flags.rest, tests_required)?;

            let env_passthrough: Vec<(String, String)> = ["GOOS", "GOARCH", "CGO_ENABLED"]
                .iter()
                .filter_map(|k| env::var(k).ok().map(|v| (k.to_string(), v)))
                .collect();
            let status = injector.execute_go_cmd(&flags.rest, &env_passthrough)?;

            if flags.revert {
                injector.revert(&modified)?;
            }
            if !status.success() {
                process::exit(status.code().unwrap_or(1));
            }
            Ok(())
        }
    }
}

/// Inject every target file under the argument dirs, skipping tests (unless
/// requested) and vendored sources.
fn inject_all(
    injector: &mut Injector,
    args: &[String],
    tests_required: bool,
) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut modified = Vec::new();
    let mut processed = Vec::new();
    for dir in go_dirs(args) {
        let mut files = Vec::new();
        collect_go_files(&dir, &mut files);
        for path in files {
            let name = path.to_string_lossy();
            if (!tests_required && name.ends_with("_test.go")) || name.contains("vendor/") {
                continue;
            }
            if processed.contains(&path) {
                continue;
            }
            processed.push(path.clone());
            if let Some(injected) = injector.inject_file(&path)? {
                modified.push(injected);
            }
        }
    }
    Ok(modified)
}

/// Directories named by .go arguments, or the working directory.
fn go_dirs(args: &[String]) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = args
        .iter()
        .filter(|a| a.ends_with(".go"))
        .filter_map(|a| {
            let p = Path::new(a);
            p.parent().map(|d| {
                if d.as_os_str().is_empty() {
                    PathBuf::from(".")
                } else {
                    d.to_path_buf()
                }
            })
        })
        .collect();
    dirs.dedup();
    if dirs.is_empty() {
        if let Ok(cwd) = env::current_dir() {
            dirs.push(cwd);
        }
    }
    dirs
}

fn collect_go_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    let mut paths: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
    paths.sort();
    for path in paths {
        if path.is_dir() {
            collect_go_files(&path, out);
        } else if path.extension().map(|e| e == "go").unwrap_or(false) {
            out.push(path);
        }
    }
}

/// Interpret an instrumented file; breakpoints open the REPL over the
/// captured scope.
fn run_interpreted(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)?;
    let program = Program::new();
    program.set_breakpoint_hook(Arc::new(|scope: &Scope| {
        Repl::new(scope.clone()).run();
    }));
    program.load_file(path, source)?;
    program.run()?;
    Ok(())
}

fn parse_flags() -> Result<Flags, String> {
    let mut flags = Flags {
        imports: "fmt,math".to_string(),
        execute: String::new(),
        revert: true,
        debug: false,
        generate: None,
        rest: Vec::new(),
    };

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-i" => {
                flags.imports = args.next().ok_or("-i requires a value")?;
            }
            "-e" => {
                flags.execute = args.next().ok_or("-e requires a value")?;
            }
            "-r" | "-r=true" => flags.revert = true,
            "-r=false" => flags.revert = false,
            "-d" => flags.debug = true,
            "--generate" | "-generate" => {
                let path = args.next().ok_or("--generate requires a path")?;
                flags.generate = Some(PathBuf::from(path));
            }
            "-h" | "--help" | "help" => {
                print_usage();
                process::exit(0);
            }
            _ => {
                flags.rest.push(arg);
                // Everything after the first positional belongs to the
                // pass-through command line.
                flags.rest.extend(args.by_ref());
            }
        }
    }
    Ok(flags)
}

fn print_usage() {
    println!(
        "{} - an interactive REPL and wrapper around the go command.",
        output::title("gopry")
    );
    println!();
    println!("You can execute go commands as normal and gopry will take care of");
    println!("injecting the breakpoint code. Running gopry with no arguments will");
    println!("drop you into an interactive REPL.");
    println!();
    println!("{}", output::section_header("Usage:"));
    println!("  gopry [flags] [go command and args]");
    println!();
    println!("{}", output::section_header("Flags:"));
    println!(
        "  {} pkg,pkg   packages to import, comma separated (default \"fmt,math\")",
        output::arg("-i")
    );
    println!(
        "  {} stmts     statements to execute before the breakpoint",
        output::arg("-e")
    );
    println!(
        "  {}           whether to revert changes on exit (default true)",
        output::arg("-r")
    );
    println!(
        "  {}           display debug statements",
        output::arg("-d")
    );
    println!(
        "  {} path  write the injected file to path instead of running",
        output::arg("--generate")
    );
    println!();
    println!("{}", output::section_header("Commands:"));
    println!(
        "  {}    interpret a .go file, stopping at breakpoints",
        output::command("run <file>")
    );
    println!(
        "  {}         inject breakpoints without running",
        output::command("apply")
    );
    println!(
        "  {}        restore all shadow files under the working dir",
        output::command("revert")
    );
}
