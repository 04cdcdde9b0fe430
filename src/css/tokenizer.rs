//! logos-based stylesheet tokenizer.
//!
//! Block comments are skipped by the lexer itself, so spans reported for later
//! tokens still point into the original fragment text. Longest match wins; for
//! equal lengths the earlier variant wins, which is why `#fff` lexes as
//! [`Token::HexColor`] and `12px` as [`Token::Dimension`].

use std::ops::Range;

use logos::Logos;

/// Stylesheet token.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\n\r\f]+")]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
pub enum Token {
    /// `@media`, `@import`, ... (not supported, recovered as a whole).
    #[regex(r"@[a-zA-Z][a-zA-Z0-9_-]*")]
    AtKeyword,

    /// `!important`
    #[token("!important")]
    Important,

    /// `#fff`, `#ff00aa`, `#ff00aa80`
    #[regex(r"#[0-9a-fA-F]{3,8}")]
    HexColor,

    /// Number with a unit suffix: `1fr`, `50%`, `12px`, `1.5em`.
    #[regex(r"-?[0-9]+(\.[0-9]+)?(fr|%|vw|vh|px|em|rem)")]
    Dimension,

    /// `:hover`, `:focus`
    #[regex(r":[a-zA-Z][a-zA-Z0-9_-]*")]
    PseudoClass,

    #[regex(r#""[^"]*""#)]
    #[regex(r"'[^']*'")]
    String,

    /// `$primary`
    #[regex(r"\$[a-zA-Z_][a-zA-Z0-9_-]*")]
    Variable,

    #[regex(r"-?[0-9]+(\.[0-9]+)?")]
    Number,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_-]*")]
    Ident,

    #[token("{")]
    BraceOpen,
    #[token("}")]
    BraceClose,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("#")]
    Hash,
    #[token("*")]
    Star,
    #[token(">")]
    GreaterThan,
}

/// A token with its byte span in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme {
    pub token: Token,
    pub span: Range<usize>,
}

/// Result of lexing: recognised tokens plus spans the lexer could not match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lexed {
    pub lexemes: Vec<Lexeme>,
    pub rejected: Vec<Range<usize>>,
}

/// Lex `input`, keeping spans for both tokens and unrecognised input.
pub fn tokenize(input: &str) -> Lexed {
    let mut lexed = Lexed::default();
    for (result, span) in Token::lexer(input).spanned() {
        match result {
            Ok(token) => lexed.lexemes.push(Lexeme { token, span }),
            Err(()) => lexed.rejected.push(span),
        }
    }
    lexed
}
