//! C tokenizer built on logos.
//!
//! One token set serves three consumers:
//! - the header parser (whole files, with preprocessor directives kept as single
//!   [`TokenKind::Directive`] tokens),
//! - the raw type-expression parser (`const char *`, `void (*)(int)`),
//! - the constant-expression evaluator (`(1 << 4) | FOO_FLAG`).
//!
//! Comments and line continuations are skipped.

use logos::Logos;
use thiserror::Error;

/// Kinds of C tokens.
#[derive(Logos, Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum TokenKind {
    // === Trivia (skipped) ===
    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/", logos::skip)]
    BlockComment,
    #[regex(r"\\\r?\n", logos::skip)]
    LineContinuation,

    /// A whole preprocessor line, continuation lines included.
    #[regex(r"#([^\n\\]|\\[^\n]|\\\n)*")]
    Directive,

    // === Names and literals ===
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,
    #[regex(r"0[xX][0-9a-fA-F]+[uUlL]*")]
    HexInt,
    /// Decimal or octal integer.
    #[regex(r"[0-9]+[uUlL]*")]
    Int,
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?[fFlL]?")]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?[fFlL]?")]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+[fFlL]?")]
    Float,
    #[regex(r"'([^'\\\n]|\\[^\n])+'")]
    Char,
    #[regex(r#""([^"\\\n]|\\[^\n])*""#)]
    Str,

    // === Delimiters ===
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token(":")]
    Colon,
    #[token("?")]
    Question,
    #[token(".")]
    Dot,
    #[token("...")]
    Ellipsis,

    // === Operators ===
    #[token("*")]
    Star,
    #[token("&")]
    Amp,
    #[token("&&")]
    AmpAmp,
    #[token("|")]
    Pipe,
    #[token("||")]
    PipePipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
    #[token("!")]
    Bang,
    #[token("=")]
    Eq,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
}

impl TokenKind {
    /// Numeric, character or string literal.
    #[inline]
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::Int | TokenKind::HexInt | TokenKind::Float | TokenKind::Char | TokenKind::Str
        )
    }
}

/// Byte range of a token in its source.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// A token and the source text it covers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    pub span: Span,
}

impl Token<'_> {
    /// True if this is the identifier `word`.
    #[inline]
    pub fn is_ident(&self, word: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == word
    }
}

/// Input the tokenizer does not recognize.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unrecognized input {snippet:?} at byte {offset}")]
pub struct LexError {
    pub offset: usize,
    pub snippet: String,
}

/// Tokenize `src`, skipping whitespace and comments.
pub fn tokenize(src: &str) -> Result<Vec<Token<'_>>, LexError> {
    let mut lexer = TokenKind::lexer(src);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let Ok(kind) = result else {
            return Err(LexError {
                offset: range.start,
                snippet: src[range].chars().take(16).collect(),
            });
        };
        tokens.push(Token {
            kind,
            text: lexer.slice(),
            span: Span {
                start: range.start,
                end: range.end,
            },
        });
    }
    Ok(tokens)
}

/// Join token texts back into normalized source text.
///
/// Tokens are separated by single spaces except inside brackets and before
/// separators, so `void ( * ) ( int , char * )` renders as `void (*)(int, char *)`.
pub fn render_tokens<'a, I>(tokens: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = String::new();
    let mut prev: Option<&str> = None;
    for text in tokens {
        if let Some(prev) = prev {
            if needs_space(prev, text) {
                out.push(' ');
            }
        }
        out.push_str(text);
        prev = Some(text);
    }
    out
}

fn needs_space(prev: &str, next: &str) -> bool {
    !(matches!(next, ")" | "]" | "," | ";")
        || matches!(prev, "(" | "[")
        || (prev == ")" && next == "(")
        || (prev == "*" && next == ")"))
}

/// Maps byte offsets to 1-based line numbers.
#[derive(Clone, Debug)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(src: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(src.match_indices('\n').map(|(i, _)| i + 1));
        LineIndex { line_starts }
    }

    /// 1-based line containing `offset`.
    pub fn line_of(&self, offset: usize) -> u32 {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact + 1,
            Err(insert) => insert,
        };
        u32::try_from(line).unwrap_or(u32::MAX)
    }
}
