// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The interactive REPL: raw-mode line editing, history, highlighting, and
//! completion over a live scope.

mod complete;
mod highlight;
mod history;
mod repl;

pub use complete::{suggestions, suggestions_external};
pub use highlight::highlight;
pub use history::{history_path, load_history, save_history};
pub use repl::{eval_line, Repl};
