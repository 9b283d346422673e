//! Lexer for the rule language.
//!
//! Produces span-based tokens without storing text — text is sliced from the
//! source only when needed. Whitespace and `#` comments are skipped.
//!
//! ## Error handling
//!
//! The lexer coalesces consecutive error characters into single `Garbage`
//! tokens rather than producing one error per character. This keeps the
//! token stream manageable for malformed input.

use logos::Logos;

use crate::diagnostics::Span;

/// Token kinds for the rule language.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\x0c]+")]
#[logos(skip("#[^\n]*", allow_greedy = true))]
pub enum TokenKind {
    #[token(";")]
    Semi,

    #[token("|")]
    Pipe,

    #[token("(")]
    ParenOpen,

    #[token(")")]
    ParenClose,

    #[token("*")]
    Star,

    #[token("+")]
    Plus,

    #[token("?")]
    Question,

    #[token("=")]
    Equals,

    /// `.` matches any code point.
    #[token(".")]
    Dot,

    /// `$Name` variable definition target or reference.
    #[regex(r"\$[A-Za-z_][A-Za-z0-9_]*")]
    VarName,

    /// `!!forward` and friends; the scanner validates the name.
    #[regex(r"!![a-z_]+")]
    Directive,

    /// `{nnn}` rule status tag.
    #[regex(r"\{[0-9]+\}")]
    StatusTag,

    /// `[...]` set expression; contents parsed by the scanner.
    #[regex(r"\[(?:[^\]\\]|\\.)*\]")]
    SetLiteral,

    /// `'...'` quoted literal text, each char one symbol.
    #[regex(r"'(?:[^'\\]|\\.)*'")]
    StringLiteral,

    /// Escapes usable outside sets: `\uXXXX`, `\x{...}`, or `\` + char.
    #[regex(r"\\u[0-9A-Fa-f]{4}")]
    #[regex(r"\\x\{[0-9A-Fa-f]{1,6}\}")]
    #[regex(r"\\.")]
    Escape,

    /// Any other single non-reserved character, matched literally.
    #[regex(r"[^\s;|()*+?=.$!{}\[\]'\\#]")]
    Literal,

    /// Coalesced run of unrecognized input.
    Garbage,
}

/// Zero-copy token: kind + span, text retrieved via [`token_text`] when needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    #[inline]
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Tokenize source into a vector of span-based tokens.
pub fn lex(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);
    let mut error_start: Option<usize> = None;

    loop {
        match lexer.next() {
            Some(Ok(kind)) => {
                if let Some(start) = error_start.take() {
                    let end = lexer.span().start;
                    tokens.push(Token::new(TokenKind::Garbage, Span::new(start, end)));
                }

                let span = lexer.span();
                tokens.push(Token::new(kind, Span::new(span.start, span.end)));
            }
            Some(Err(())) => {
                if error_start.is_none() {
                    error_start = Some(lexer.span().start);
                }
            }
            None => {
                if let Some(start) = error_start.take() {
                    tokens.push(Token::new(TokenKind::Garbage, Span::new(start, source.len())));
                }
                break;
            }
        }
    }

    tokens
}

/// Retrieve the text slice for a token. O(1) slice into source.
#[inline]
pub fn token_text<'s>(source: &'s str, token: &Token) -> &'s str {
    &source[token.span.range()]
}
