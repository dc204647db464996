//! Token-based ANSI highlighting of host-language source.

use colored::Colorize;
use pry_ast::token::TokenKind;

/// Colorize a line of source. Unlexable input comes back unchanged.
pub fn highlight(line: &str) -> String {
    let lexed = pry_lexer::Lexer::new(line).tokenize();
    if !lexed.is_ok() {
        return line.to_string();
    }

    let mut out = String::new();
    let mut pos = 0;
    for tok in &lexed.tokens {
        if tok.kind == TokenKind::Eof || tok.span.start >= line.len() {
            break;
        }
        if tok.span.start > pos {
            out.push_str(&line[pos..tok.span.start]);
        }
        let text = &line[tok.span.start..tok.span.end.min(line.len())];
        out.push_str(&colorize(&tok.kind, text));
        pos = tok.span.end.min(line.len());
    }
    if pos < line.len() {
        out.push_str(&line[pos..]);
    }
    out
}

fn colorize(kind: &TokenKind, text: &str) -> String {
    match kind {
        TokenKind::Package
        | TokenKind::Import
        | TokenKind::Func
        | TokenKind::Var
        | TokenKind::Const
        | TokenKind::Type
        | TokenKind::Struct
        | TokenKind::Interface
        | TokenKind::Map
        | TokenKind::Chan
        | TokenKind::If
        | TokenKind::Else
        | TokenKind::For
        | TokenKind::Range
        | TokenKind::Switch
        | TokenKind::Case
        | TokenKind::Default
        | TokenKind::Select
        | TokenKind::Go
        | TokenKind::Defer
        | TokenKind::Return
        | TokenKind::Break
        | TokenKind::Continue
        | TokenKind::Fallthrough => text.cyan().bold().to_string(),
        TokenKind::String(_) | TokenKind::Char(_) => text.green().to_string(),
        TokenKind::Int(_)
        | TokenKind::UintBig(_)
        | TokenKind::Float(_)
        | TokenKind::Imag(_) => text.yellow().to_string(),
        TokenKind::Ident(name) => match name.as_str() {
            "true" | "false" | "nil" => text.magenta().to_string(),
            _ => text.to_string(),
        },
        _ => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_survives() {
        colored::control::set_override(false);
        assert_eq!(highlight("a := 1"), "a := 1");
    }

    #[test]
    fn unlexable_input_is_returned_verbatim() {
        colored::control::set_override(false);
        assert_eq!(highlight("a § b"), "a § b");
    }
}
