// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The interactive shell over a suspended scope.

use std::io::Write;
use std::panic::AssertUnwindSafe;

use colored::Colorize;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::{cursor, execute, terminal};
use pry_interp::{Scope, Value};

use crate::complete::suggestions_external;
use crate::highlight::highlight;
use crate::history::{load_history, save_history};

/// Parse, statically check, then interpret one REPL line. Panics inside
/// delegated host calls are caught and reported with the original input.
pub fn eval_line(scope: &Scope, line: &str) -> Result<Value, String> {
    let stmts = Scope::parse_string(line).map_err(|e| e.to_string())?;

    let errors = pry_check::check_statement(scope, &stmts);
    if let Some(err) = errors.first() {
        return Err(err.to_string());
    }

    let result =
        std::panic::catch_unwind(AssertUnwindSafe(|| scope.interpret_block(&stmts)));
    match result {
        Ok(Ok(v)) => Ok(v),
        Ok(Err(e)) => Err(e.to_string()),
        Err(panic) => {
            let cause = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic".to_string());
            Err(format!("interpreting {:?}: {}", line, cause))
        }
    }
}

/// The interactive prompt. One instance per breakpoint hit.
pub struct Repl {
    scope: Scope,
    history: Vec<String>,
}

impl Repl {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            history: load_history(),
        }
    }

    /// Run the prompt until `continue`, `exit`, or Ctrl-D.
    pub fn run(&mut self) {
        self.display_file_position();

        if terminal::enable_raw_mode().is_err() {
            // No TTY (tests, pipes): fall back to plain line input.
            self.run_plain();
            return;
        }
        let result = self.run_raw();
        let _ = terminal::disable_raw_mode();
        save_history(&self.history);
        if let Err(err) = result {
            eprintln!("repl: {}", err);
        }
    }

    fn run_raw(&mut self) -> std::io::Result<()> {
        let mut out = std::io::stdout();
        let mut line = String::new();
        let mut index = 0usize;
        let mut position = self.history.len();

        loop {
            let prompt = format!("[{}] gopry> ", position);
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(terminal::ClearType::CurrentLine)
            )?;
            write!(out, "{}{}", prompt, highlight(&line))?;
            execute!(out, cursor::MoveToColumn((prompt.len() + index) as u16))?;
            out.flush()?;

            let Event::Key(KeyEvent {
                code, modifiers, ..
            }) = crossterm::event::read()?
            else {
                continue;
            };

            match code {
                KeyCode::Char('d') if modifiers.contains(KeyModifiers::CONTROL) => {
                    writeln!(out)?;
                    return Ok(());
                }
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                    line.clear();
                    index = 0;
                }
                KeyCode::Char(c) => {
                    line.insert(index, c);
                    index += 1;
                }
                KeyCode::Backspace => {
                    if index > 0 {
                        line.remove(index - 1);
                        index -= 1;
                    }
                }
                KeyCode::Delete => {
                    if index < line.len() {
                        line.remove(index);
                    }
                }
                KeyCode::Left => index = index.saturating_sub(1),
                KeyCode::Right => index = (index + 1).min(line.len()),
                KeyCode::Up => {
                    if position > 0 {
                        position -= 1;
                        line = self.history.get(position).cloned().unwrap_or_default();
                        index = line.len();
                    }
                }
                KeyCode::Down => {
                    if position < self.history.len() {
                        position += 1;
                    }
                    line = self.history.get(position).cloned().unwrap_or_default();
                    index = line.len();
                }
                KeyCode::Tab => {
                    let matches = suggestions_external(&self.scope, &line, index);
                    if !matches.is_empty() {
                        writeln!(out, "\r")?;
                        for term in matches.iter().take(10) {
                            writeln!(out, "  {}\r", term.white().on_magenta())?;
                        }
                    }
                }
                KeyCode::Enter => {
                    writeln!(out, "\r")?;
                    if line.is_empty() {
                        continue;
                    }
                    if line == "continue" || line == "exit" {
                        return Ok(());
                    }
                    // Raw mode swallows the newline translation; print
                    // results with explicit carriage returns.
                    let _ = terminal::disable_raw_mode();
                    self.submit(&line);
                    let _ = terminal::enable_raw_mode();

                    self.history.push(line.clone());
                    position = self.history.len();
                    line.clear();
                    index = 0;
                }
                _ => {}
            }
        }
    }

    /// Cooked-mode loop for non-TTY input.
    fn run_plain(&mut self) {
        let stdin = std::io::stdin();
        let mut buf = String::new();
        loop {
            print!("[{}] gopry> ", self.history.len());
            let _ = std::io::stdout().flush();
            buf.clear();
            match stdin.read_line(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let line = buf.trim_end_matches('\n').to_string();
            if line.is_empty() {
                continue;
            }
            if line == "continue" || line == "exit" {
                break;
            }
            self.submit(&line);
            self.history.push(line);
        }
        save_history(&self.history);
    }

    fn submit(&mut self, line: &str) {
        match eval_line(&self.scope, line) {
            Ok(v) => println!("=> {}", highlight(&format!("{}", v))),
            Err(err) => println!("{} {}", "Error:".red(), err),
        }
    }

    /// Print the breakpoint banner: source window around the suspended line
    /// with a caret on the breakpoint.
    fn display_file_position(&self) {
        let session = self.scope.session();
        let Some(shadow) = session.breakpoint_path() else {
            return;
        };
        let line_num = session.breakpoint_line() as usize;

        // The shadow copy holds the pre-injection source the user wrote.
        let source = match std::fs::read_to_string(&shadow) {
            Ok(s) => s,
            Err(_) => return,
        };

        println!("\nFrom {} @ line {} :\n", shadow.display(), line_num);
        let lines: Vec<&str> = source.lines().collect();
        let current = line_num.saturating_sub(1);
        let start = current.saturating_sub(5);
        let end = (current + 6).min(lines.len());
        let width = format!("{}", end).len();
        for i in start..end {
            let caret = if i == current { "=>" } else { "  " };
            let num = format!("{:>width$}", i + 1, width = width).blue().bold();
            let text = highlight(&lines[i].replace('\t', "  "));
            println!(" {} {}: {}", caret, num, text);
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_line_roundtrip() {
        let scope = Scope::new();
        assert!(matches!(eval_line(&scope, "a := 10"), Ok(Value::Int(10))));
        assert!(matches!(eval_line(&scope, "a"), Ok(Value::Int(10))));
    }

    #[test]
    fn eval_line_rejects_parse_errors() {
        let scope = Scope::new();
        assert!(eval_line(&scope, "a :=").is_err());
    }

    #[test]
    fn eval_line_rejects_unknown_names_before_evaluation() {
        let scope = Scope::new();
        let err = eval_line(&scope, "nope + 1").unwrap_err();
        assert!(err.contains("undefined"));
    }

    #[test]
    fn bindings_survive_across_lines() {
        let scope = Scope::new();
        eval_line(&scope, "x := 2").unwrap();
        eval_line(&scope, "x = x * 3").unwrap();
        assert!(matches!(eval_line(&scope, "x"), Ok(Value::Int(6))));
    }
}
