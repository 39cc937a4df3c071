//! Raw type-expression parser.
//!
//! Parses the type text recorded by the header parser (`const char *`,
//! `struct foo *[4]`, `void (*)(int code, void *user)`) into a [`CType`] tree.
//! Parameter names inside function types are accepted and dropped.

use cbind_lexer::{render_tokens, tokenize, Token, TokenKind};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TypeParseError {
    #[error("cannot tokenize type `{0}`")]
    Lex(String),

    #[error("expected {expected} in type `{text}`")]
    Expected { expected: &'static str, text: String },

    #[error("missing base type in `{0}`")]
    MissingBase(String),
}

/// Base specifier of a type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BaseSpec {
    Void,
    /// Arithmetic keywords, e.g. `["unsigned", "long"]`.
    Words(Vec<String>),
    /// `struct foo`, `union bar`, `enum baz`.
    Tagged { keyword: String, tag: String },
    /// A typedef name.
    Named(String),
}

/// A parsed C type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CType {
    Base { spec: BaseSpec, is_const: bool },
    Pointer { to: Box<CType>, is_const: bool },
    /// `len` is the unevaluated dimension expression.
    Array { elem: Box<CType>, len: Option<String> },
    Function {
        ret: Box<CType>,
        params: Vec<CType>,
        variadic: bool,
    },
}

impl CType {
    pub fn is_void(&self) -> bool {
        matches!(
            self,
            CType::Base {
                spec: BaseSpec::Void,
                ..
            }
        )
    }
}

/// Type constructors in the order they wrap the base type.
#[derive(Debug)]
enum Op {
    Pointer { is_const: bool },
    Array(Option<String>),
    Function { params: Vec<CType>, variadic: bool },
}

const SCALAR_WORDS: &[&str] = &[
    "char", "short", "int", "long", "float", "double", "signed", "unsigned", "__signed__",
];

const QUALIFIERS: &[&str] = &["const", "volatile", "restrict", "__restrict", "__restrict__"];

/// Parse a raw type expression.
pub fn parse_type(text: &str) -> Result<CType, TypeParseError> {
    let tokens = tokenize(text).map_err(|_| TypeParseError::Lex(text.to_string()))?;
    let mut parser = TypeParser {
        tokens: &tokens,
        pos: 0,
        text,
    };
    let ty = parser.type_name()?;
    if parser.pos < tokens.len() {
        return Err(parser.expected("end of type"));
    }
    Ok(ty)
}

struct TypeParser<'t, 'src> {
    tokens: &'t [Token<'src>],
    pos: usize,
    text: &'t str,
}

impl<'src> TypeParser<'_, 'src> {
    fn type_name(&mut self) -> Result<CType, TypeParseError> {
        let base = self.specifiers()?;
        let ops = self.declarator()?;
        Ok(apply(base, ops))
    }

    fn specifiers(&mut self) -> Result<CType, TypeParseError> {
        let mut is_const = false;
        let mut words: Vec<String> = Vec::new();
        let mut spec = None;
        while let Some(tok) = self.peek() {
            if tok.kind != TokenKind::Ident {
                break;
            }
            match tok.text {
                "const" => is_const = true,
                q if QUALIFIERS.contains(&q) => {}
                "void" if spec.is_none() && words.is_empty() => spec = Some(BaseSpec::Void),
                keyword @ ("struct" | "union" | "enum") if spec.is_none() && words.is_empty() => {
                    self.pos += 1;
                    let tag = self
                        .peek()
                        .filter(|t| t.kind == TokenKind::Ident)
                        .ok_or_else(|| self.expected("tag name"))?;
                    spec = Some(BaseSpec::Tagged {
                        keyword: keyword.to_string(),
                        tag: tag.text.to_string(),
                    });
                }
                w if SCALAR_WORDS.contains(&w) && spec.is_none() => words.push(w.to_string()),
                name if spec.is_none() && words.is_empty() => {
                    spec = Some(BaseSpec::Named(name.to_string()));
                }
                // a parameter name after a complete base
                _ => break,
            }
            self.pos += 1;
        }
        let spec = match spec {
            Some(spec) => spec,
            None if !words.is_empty() => BaseSpec::Words(words),
            None => return Err(TypeParseError::MissingBase(self.text.to_string())),
        };
        Ok(CType::Base { spec, is_const })
    }

    /// Parse an abstract (or named) declarator into constructor ops.
    fn declarator(&mut self) -> Result<Vec<Op>, TypeParseError> {
        let mut ops = Vec::new();
        while self.eat(TokenKind::Star) {
            ops.push(Op::Pointer {
                is_const: self.qualifiers(),
            });
        }

        let mut inner = Vec::new();
        if self.peek_kind() == Some(TokenKind::LParen) && self.nested_follows() {
            self.pos += 1;
            inner = self.declarator()?;
            self.expect(TokenKind::RParen, "`)`")?;
        } else if self.peek_kind() == Some(TokenKind::Ident) {
            // declared name, not part of the type
            self.pos += 1;
        }

        let mut suffixes = Vec::new();
        loop {
            if self.eat(TokenKind::LBracket) {
                let start = self.pos;
                while self.peek_kind().is_some_and(|k| k != TokenKind::RBracket) {
                    self.pos += 1;
                }
                let len = render_tokens(self.tokens[start..self.pos].iter().map(|t| t.text));
                self.expect(TokenKind::RBracket, "`]`")?;
                suffixes.push(Op::Array(Some(len).filter(|l| !l.is_empty())));
            } else if self.eat(TokenKind::LParen) {
                let (params, variadic) = self.params()?;
                suffixes.push(Op::Function { params, variadic });
            } else {
                break;
            }
        }
        ops.extend(suffixes.into_iter().rev());
        ops.extend(inner);
        Ok(ops)
    }

    fn params(&mut self) -> Result<(Vec<CType>, bool), TypeParseError> {
        let mut params = Vec::new();
        let mut variadic = false;
        if self.eat(TokenKind::RParen) {
            return Ok((params, variadic));
        }
        loop {
            if self.eat(TokenKind::Ellipsis) {
                variadic = true;
            } else {
                let param = self.type_name()?;
                params.push(param);
            }
            if self.eat(TokenKind::Comma) {
                continue;
            }
            self.expect(TokenKind::RParen, "`)`")?;
            break;
        }
        if let [only] = params.as_slice() {
            if only.is_void() {
                params.clear();
            }
        }
        Ok((params, variadic))
    }

    /// After `(`: does a nested declarator follow rather than a parameter list?
    fn nested_follows(&self) -> bool {
        matches!(
            self.tokens.get(self.pos + 1).map(|t| t.kind),
            Some(TokenKind::Star | TokenKind::LParen | TokenKind::LBracket)
        )
    }

    fn qualifiers(&mut self) -> bool {
        let mut is_const = false;
        while let Some(tok) = self.peek() {
            if tok.kind != TokenKind::Ident || !QUALIFIERS.contains(&tok.text) {
                break;
            }
            is_const |= tok.text == "const";
            self.pos += 1;
        }
        is_const
    }

    fn peek(&self) -> Option<Token<'src>> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek_kind() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<(), TypeParseError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.expected(expected))
        }
    }

    fn expected(&self, expected: &'static str) -> TypeParseError {
        TypeParseError::Expected {
            expected,
            text: self.text.to_string(),
        }
    }
}

fn apply(base: CType, ops: Vec<Op>) -> CType {
    ops.into_iter().fold(base, |ty, op| match op {
        Op::Pointer { is_const } => CType::Pointer {
            to: Box::new(ty),
            is_const,
        },
        Op::Array(len) => CType::Array {
            elem: Box::new(ty),
            len,
        },
        Op::Function { params, variadic } => CType::Function {
            ret: Box::new(ty),
            params,
            variadic,
        },
    })
}
