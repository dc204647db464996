//! Persistent REPL history: a JSON array of submitted lines in the user's
//! home directory.

use std::path::PathBuf;

const HISTORY_FILE: &str = ".go-pry_history";

pub fn history_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(HISTORY_FILE))
}

/// Read history; empty when the file is absent or unreadable.
pub fn load_history() -> Vec<String> {
    let Some(path) = history_path() else {
        return Vec::new();
    };
    let Ok(body) = std::fs::read_to_string(&path) else {
        return Vec::new();
    };
    match serde_json::from_str(&body) {
        Ok(history) => history,
        Err(err) => {
            eprintln!("Error reading history file! {}", err);
            Vec::new()
        }
    }
}

/// Rewrite the whole history file.
pub fn save_history(history: &[String]) {
    let Some(path) = history_path() else {
        return;
    };
    let body = match serde_json::to_string(history) {
        Ok(b) => b,
        Err(err) => {
            eprintln!("Err marshalling history: {}", err);
            return;
        }
    };
    if let Err(err) = std::fs::write(&path, body) {
        eprintln!("Error writing history: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_through_json() {
        let lines = vec!["a := 1".to_string(), "a".to_string()];
        let body = serde_json::to_string(&lines).unwrap();
        let back: Vec<String> = serde_json::from_str(&body).unwrap();
        assert_eq!(lines, back);
    }

    #[test]
    fn history_path_is_under_home() {
        if std::env::var_os("HOME").is_some() {
            let path = history_path().unwrap();
            assert!(path.ends_with(".go-pry_history"));
        }
    }
}
