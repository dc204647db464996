// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The lexer implementation using logos.
//!
//! Two passes: logos produces raw tokens, then a conversion pass parses
//! literal payloads and applies the automatic-semicolon rule (a newline
//! after a token that can end a statement becomes an implicit `;`).

use logos::Logos;
use pry_ast::token::{Token, TokenKind};
use pry_ast::Span;

/// Raw token type for logos - we parse values in a second pass.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r]+")] // Skip horizontal whitespace (not newlines)
enum RawToken {
    // === Keywords ===
    #[token("package")]
    Package,
    #[token("import")]
    Import,
    #[token("func")]
    Func,
    #[token("var")]
    Var,
    #[token("const")]
    Const,
    #[token("type")]
    Type,
    #[token("struct")]
    Struct,
    #[token("interface")]
    Interface,
    #[token("map")]
    Map,
    #[token("chan")]
    Chan,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("range")]
    Range,
    #[token("switch")]
    Switch,
    #[token("case")]
    Case,
    #[token("default")]
    Default,
    #[token("select")]
    Select,
    #[token("go")]
    Go,
    #[token("defer")]
    Defer,
    #[token("return")]
    Return,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("fallthrough")]
    Fallthrough,

    // === Operators (order matters - longer first) ===
    #[token("&^=")]
    AndNotEq,
    #[token("<<=")]
    ShlEq,
    #[token(">>=")]
    ShrEq,
    #[token("...")]
    Ellipsis,

    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("<-")]
    Arrow,
    #[token("++")]
    Inc,
    #[token("--")]
    Dec,
    #[token(":=")]
    ColonEq,
    #[token("&^")]
    AndNot,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("%=")]
    PercentEq,
    #[token("&=")]
    AmpEq,
    #[token("|=")]
    PipeEq,
    #[token("^=")]
    CaretEq,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("!")]
    Bang,
    #[token(".")]
    Dot,

    // === Delimiters ===
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,

    // === Newline (drives semicolon insertion) ===
    #[token("\n")]
    Newline,

    // === Comments (skip them) ===
    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,

    #[token("/*", block_comment)]
    BlockComment,

    // === Literals ===
    // Imaginary literals end in 'i' and must outrank the plain forms
    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?i")]
    Imag,

    // Float literals (must come before decimal int to match properly)
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?")]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+")]
    Float,

    // Hex integers
    #[regex(r"0[xX][0-9a-fA-F_]+")]
    HexInt,

    // Binary integers
    #[regex(r"0[bB][01_]+")]
    BinInt,

    // Octal integers: legacy leading-zero form plus 0o
    #[regex(r"0[oO][0-7_]+")]
    #[regex(r"0[0-7_]+")]
    OctInt,

    // Decimal integers
    #[regex(r"0|[1-9][0-9_]*")]
    DecInt,

    // Character literal; the value rule is applied in the second pass
    #[regex(r"'([^'\\\n]|\\[^\n])+'")]
    Char,

    // Interpreted string literal; quotes are stripped, escapes are kept verbatim
    #[regex(r#""([^"\\\n]|\\[^\n])*""#)]
    String,

    // Raw string literal (backquotes)
    #[regex(r"`[^`]*`")]
    RawString,

    // === Identifier (must come after keywords) ===
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
}

/// Skip block comments. The host language does not nest them.
fn block_comment(lexer: &mut logos::Lexer<RawToken>) -> logos::Skip {
    let remainder = lexer.remainder();
    match remainder.find("*/") {
        Some(end) => lexer.bump(end + 2),
        None => lexer.bump(remainder.len()), // Unterminated - error surfaces at parse
    }
    logos::Skip
}

/// Maximum number of errors to collect before stopping.
const MAX_ERRORS: usize = 20;

/// The lexer for host-language source code.
pub struct Lexer<'a> {
    source: &'a str,
    errors: Vec<LexError>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self { source, errors: Vec::new() }
    }

    /// Tokenize the entire source, collecting multiple errors.
    ///
    /// Newlines are folded into implicit semicolons where the previous
    /// token can end a statement; otherwise they are dropped.
    pub fn tokenize(&mut self) -> LexResult {
        let mut tokens: Vec<Token> = Vec::new();
        let mut logos_lexer = RawToken::lexer(self.source);

        while let Some(result) = logos_lexer.next() {
            if self.errors.len() >= MAX_ERRORS {
                break;
            }

            let span = logos_lexer.span();
            let slice = logos_lexer.slice();

            let raw = match result {
                Ok(raw) => raw,
                Err(()) => {
                    let ch = self.source[span.start..].chars().next().unwrap_or('?');
                    self.errors.push(LexError::unexpected_char(ch, span.start));
                    continue;
                }
            };

            if raw == RawToken::Newline {
                if tokens.last().map(|t| t.kind.ends_statement()).unwrap_or(false) {
                    tokens.push(Token {
                        kind: TokenKind::Semi,
                        span: Span::new(span.start, span.end),
                    });
                }
                continue;
            }

            let kind = match self.convert_token(raw, slice, span.start, span.end) {
                Ok(kind) => kind,
                Err(e) => {
                    self.errors.push(e);
                    continue;
                }
            };

            tokens.push(Token {
                kind,
                span: Span::new(span.start, span.end),
            });
        }

        if tokens.last().map(|t| t.kind.ends_statement()).unwrap_or(false) {
            tokens.push(Token {
                kind: TokenKind::Semi,
                span: Span::new(self.source.len(), self.source.len()),
            });
        }
        tokens.push(Token {
            kind: TokenKind::Eof,
            span: Span::new(self.source.len(), self.source.len()),
        });

        LexResult {
            tokens,
            errors: std::mem::take(&mut self.errors),
        }
    }

    /// Convert a raw logos token to our TokenKind, parsing literals.
    fn convert_token(
        &self,
        raw: RawToken,
        slice: &str,
        start: usize,
        end: usize,
    ) -> Result<TokenKind, LexError> {
        Ok(match raw {
            // Keywords
            RawToken::Package => TokenKind::Package,
            RawToken::Import => TokenKind::Import,
            RawToken::Func => TokenKind::Func,
            RawToken::Var => TokenKind::Var,
            RawToken::Const => TokenKind::Const,
            RawToken::Type => TokenKind::Type,
            RawToken::Struct => TokenKind::Struct,
            RawToken::Interface => TokenKind::Interface,
            RawToken::Map => TokenKind::Map,
            RawToken::Chan => TokenKind::Chan,
            RawToken::If => TokenKind::If,
            RawToken::Else => TokenKind::Else,
            RawToken::For => TokenKind::For,
            RawToken::Range => TokenKind::Range,
            RawToken::Switch => TokenKind::Switch,
            RawToken::Case => TokenKind::Case,
            RawToken::Default => TokenKind::Default,
            RawToken::Select => TokenKind::Select,
            RawToken::Go => TokenKind::Go,
            RawToken::Defer => TokenKind::Defer,
            RawToken::Return => TokenKind::Return,
            RawToken::Break => TokenKind::Break,
            RawToken::Continue => TokenKind::Continue,
            RawToken::Fallthrough => TokenKind::Fallthrough,

            // Operators
            RawToken::AndNotEq => TokenKind::AndNotEq,
            RawToken::ShlEq => TokenKind::ShlEq,
            RawToken::ShrEq => TokenKind::ShrEq,
            RawToken::Ellipsis => TokenKind::Ellipsis,
            RawToken::EqEq => TokenKind::EqEq,
            RawToken::BangEq => TokenKind::BangEq,
            RawToken::LtEq => TokenKind::LtEq,
            RawToken::GtEq => TokenKind::GtEq,
            RawToken::AmpAmp => TokenKind::AmpAmp,
            RawToken::PipePipe => TokenKind::PipePipe,
            RawToken::Arrow => TokenKind::Arrow,
            RawToken::Inc => TokenKind::Inc,
            RawToken::Dec => TokenKind::Dec,
            RawToken::ColonEq => TokenKind::ColonEq,
            RawToken::AndNot => TokenKind::AndNot,
            RawToken::Shl => TokenKind::Shl,
            RawToken::Shr => TokenKind::Shr,
            RawToken::PlusEq => TokenKind::PlusEq,
            RawToken::MinusEq => TokenKind::MinusEq,
            RawToken::StarEq => TokenKind::StarEq,
            RawToken::SlashEq => TokenKind::SlashEq,
            RawToken::PercentEq => TokenKind::PercentEq,
            RawToken::AmpEq => TokenKind::AmpEq,
            RawToken::PipeEq => TokenKind::PipeEq,
            RawToken::CaretEq => TokenKind::CaretEq,
            RawToken::Plus => TokenKind::Plus,
            RawToken::Minus => TokenKind::Minus,
            RawToken::Star => TokenKind::Star,
            RawToken::Slash => TokenKind::Slash,
            RawToken::Percent => TokenKind::Percent,
            RawToken::Amp => TokenKind::Amp,
            RawToken::Pipe => TokenKind::Pipe,
            RawToken::Caret => TokenKind::Caret,
            RawToken::Eq => TokenKind::Eq,
            RawToken::Lt => TokenKind::Lt,
            RawToken::Gt => TokenKind::Gt,
            RawToken::Bang => TokenKind::Bang,
            RawToken::Dot => TokenKind::Dot,

            // Delimiters
            RawToken::LBrace => TokenKind::LBrace,
            RawToken::RBrace => TokenKind::RBrace,
            RawToken::LParen => TokenKind::LParen,
            RawToken::RParen => TokenKind::RParen,
            RawToken::LBracket => TokenKind::LBracket,
            RawToken::RBracket => TokenKind::RBracket,
            RawToken::Colon => TokenKind::Colon,
            RawToken::Semi => TokenKind::Semi,
            RawToken::Comma => TokenKind::Comma,

            // Literals - parse the values
            RawToken::DecInt => parse_int(slice, 10, start, end)?,
            RawToken::HexInt => parse_int(&slice[2..], 16, start, end)?,
            RawToken::BinInt => parse_int(&slice[2..], 2, start, end)?,
            RawToken::OctInt => {
                let digits = if slice[1..].starts_with(['o', 'O']) {
                    &slice[2..]
                } else {
                    &slice[1..]
                };
                parse_int(digits, 8, start, end)?
            }
            RawToken::Float => {
                let value = slice
                    .parse::<f64>()
                    .map_err(|_| LexError::invalid_number(start, end))?;
                TokenKind::Float(value)
            }
            RawToken::Imag => {
                let value = slice[..slice.len() - 1]
                    .parse::<f64>()
                    .map_err(|_| LexError::invalid_number(start, end))?;
                TokenKind::Imag(value)
            }
            RawToken::Char => {
                // The literal's value is its second byte: the first code unit
                // between the quotes, escapes included verbatim.
                TokenKind::Char(slice.as_bytes()[1] as char)
            }
            RawToken::String | RawToken::RawString => {
                // Strip the surrounding quotes only; escapes stay as written.
                TokenKind::String(slice[1..slice.len() - 1].to_string())
            }
            RawToken::Ident => TokenKind::Ident(slice.to_string()),

            RawToken::Newline => unreachable!("newlines handled in tokenize"),
            RawToken::LineComment | RawToken::BlockComment => {
                unreachable!("comments are skipped")
            }
        })
    }
}

/// Parse an integer literal body in the given radix. Values past i64 are
/// kept unsigned so very large exported constants survive the trip.
fn parse_int(digits: &str, radix: u32, start: usize, end: usize) -> Result<TokenKind, LexError> {
    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    match i64::from_str_radix(&cleaned, radix) {
        Ok(value) => Ok(TokenKind::Int(value)),
        Err(_) => u64::from_str_radix(&cleaned, radix)
            .map(TokenKind::UintBig)
            .map_err(|_| LexError::invalid_number(start, end)),
    }
}

/// Result of lexing: tokens plus any errors found.
#[derive(Debug)]
pub struct LexResult {
    pub tokens: Vec<Token>,
    pub errors: Vec<LexError>,
}

impl LexResult {
    /// Returns true if lexing completed without errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A lexer error with location and friendly message.
#[derive(Debug, Clone)]
pub struct LexError {
    pub span: Span,
    pub message: String,
    pub hint: Option<String>,
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for LexError {}

impl LexError {
    fn unexpected_char(ch: char, pos: usize) -> Self {
        Self {
            span: Span::new(pos, pos + ch.len_utf8()),
            message: format!("unexpected character '{}'", ch),
            hint: Some("remove this character or check for typos".to_string()),
        }
    }

    fn invalid_number(start: usize, end: usize) -> Self {
        Self {
            span: Span::new(start, end),
            message: "invalid number literal".to_string(),
            hint: Some("check for extra digits or invalid prefix (0x, 0b, 0o)".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let result = Lexer::new(src).tokenize();
        assert!(result.is_ok(), "lex errors: {:?}", result.errors);
        result.tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn int_bases() {
        assert_eq!(kinds("0xC123")[0], TokenKind::Int(0xC123));
        assert_eq!(kinds("03272")[0], TokenKind::Int(0o3272));
        assert_eq!(kinds("0b101")[0], TokenKind::Int(5));
        assert_eq!(kinds("1234")[0], TokenKind::Int(1234));
    }

    #[test]
    fn big_uint_survives() {
        assert_eq!(
            kinds("18446744073709551615")[0],
            TokenKind::UintBig(u64::MAX)
        );
    }

    #[test]
    fn string_keeps_escapes_verbatim() {
        assert_eq!(
            kinds(r#""a\nb""#)[0],
            TokenKind::String("a\\nb".to_string())
        );
    }

    #[test]
    fn char_is_second_byte() {
        assert_eq!(kinds("'a'")[0], TokenKind::Char('a'));
        // Escaped char keeps the backslash, matching the interpreter's
        // second-byte rule.
        assert_eq!(kinds(r"'\n'")[0], TokenKind::Char('\\'));
    }

    #[test]
    fn semicolon_insertion() {
        let toks = kinds("a := 1\nb := 2");
        let semis = toks.iter().filter(|k| **k == TokenKind::Semi).count();
        assert_eq!(semis, 2);
    }

    #[test]
    fn no_semi_after_operator() {
        let toks = kinds("a +\n1");
        assert!(!toks.contains(&TokenKind::Semi) || toks.iter().filter(|k| **k == TokenKind::Semi).count() == 1);
        // Only the final `1` inserts a semicolon.
        assert_eq!(toks[0], TokenKind::Ident("a".into()));
        assert_eq!(toks[1], TokenKind::Plus);
        assert_eq!(toks[2], TokenKind::Int(1));
    }

    #[test]
    fn channel_ops() {
        let toks = kinds("ch <- 1");
        assert_eq!(toks[1], TokenKind::Arrow);
        let toks = kinds("a &^ b");
        assert_eq!(toks[1], TokenKind::AndNot);
    }

    #[test]
    fn comments_are_skipped() {
        let toks = kinds("a // trailing\n/* block */ b");
        assert_eq!(toks[0], TokenKind::Ident("a".into()));
        assert_eq!(toks[1], TokenKind::Semi);
        assert_eq!(toks[2], TokenKind::Ident("b".into()));
    }

    #[test]
    fn imaginary_literal() {
        assert_eq!(kinds("2.5i")[0], TokenKind::Imag(2.5));
    }
}
