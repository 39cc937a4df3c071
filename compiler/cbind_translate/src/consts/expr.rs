//! Constant-expression syntax tree and parser.

use cbind_lexer::{tokenize, Token, TokenKind};

use crate::ConstEvalError;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Neg,
    BitNot,
    Not,
}

impl UnaryOp {
    fn from_token(kind: TokenKind) -> Option<Self> {
        Some(match kind {
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Tilde => UnaryOp::BitNot,
            TokenKind::Bang => UnaryOp::Not,
            _ => return None,
        })
    }

    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Neg => "-",
            UnaryOp::BitNot => "^",
            UnaryOp::Not => "!",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Shl,
    Shr,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eq,
    NotEq,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
}

impl BinaryOp {
    fn from_token(kind: TokenKind) -> Option<Self> {
        Some(match kind {
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Percent => BinaryOp::Rem,
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Shl => BinaryOp::Shl,
            TokenKind::Shr => BinaryOp::Shr,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::LtEq => BinaryOp::LtEq,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::GtEq => BinaryOp::GtEq,
            TokenKind::EqEq => BinaryOp::Eq,
            TokenKind::NotEq => BinaryOp::NotEq,
            TokenKind::Amp => BinaryOp::BitAnd,
            TokenKind::Caret => BinaryOp::BitXor,
            TokenKind::Pipe => BinaryOp::BitOr,
            TokenKind::AmpAmp => BinaryOp::And,
            TokenKind::PipePipe => BinaryOp::Or,
            _ => return None,
        })
    }

    /// C binding strength; higher binds tighter.
    fn precedence(self) -> u8 {
        match self {
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 10,
            BinaryOp::Add | BinaryOp::Sub => 9,
            BinaryOp::Shl | BinaryOp::Shr => 8,
            BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => 7,
            BinaryOp::Eq | BinaryOp::NotEq => 6,
            BinaryOp::BitAnd => 5,
            BinaryOp::BitXor => 4,
            BinaryOp::BitOr => 3,
            BinaryOp::And => 2,
            BinaryOp::Or => 1,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitXor => "^",
            BinaryOp::BitOr => "|",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

/// A parsed constant expression. Literals keep their source spelling with
/// C-only suffixes removed.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// `value` is `None` when the literal does not fit an `i64`; only evaluation
    /// rejects it.
    Int { value: Option<i64>, text: String },
    Float { value: f64, text: String },
    Char { value: i64, text: String },
    /// Adjacent string literals; `parts` are the quoted source literals.
    Str { value: String, parts: Vec<String> },
    Ident(String),
    Paren(Box<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
}

/// Parse a complete constant expression.
pub fn parse_expr(text: &str) -> Result<Expr, ConstEvalError> {
    let tokens = tokenize(text)
        .map_err(|err| ConstEvalError::Syntax(format!("unreadable input {:?}", err.snippet)))?;
    let mut parser = ExprParser {
        tokens: &tokens,
        pos: 0,
    };
    let expr = parser.ternary()?;
    if let Some(tok) = parser.tokens.get(parser.pos) {
        return Err(ConstEvalError::Syntax(format!("unexpected `{}`", tok.text)));
    }
    Ok(expr)
}

struct ExprParser<'t, 'src> {
    tokens: &'t [Token<'src>],
    pos: usize,
}

impl<'src> ExprParser<'_, 'src> {
    fn ternary(&mut self) -> Result<Expr, ConstEvalError> {
        let cond = self.binary(1)?;
        if !self.eat(TokenKind::Question) {
            return Ok(cond);
        }
        let then = self.ternary()?;
        if !self.eat(TokenKind::Colon) {
            return Err(ConstEvalError::Syntax("expected `:`".to_string()));
        }
        let otherwise = self.ternary()?;
        Ok(Expr::Ternary(
            Box::new(cond),
            Box::new(then),
            Box::new(otherwise),
        ))
    }

    fn binary(&mut self, min_precedence: u8) -> Result<Expr, ConstEvalError> {
        let mut lhs = self.unary()?;
        while let Some(op) = self.peek().and_then(|t| BinaryOp::from_token(t.kind)) {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.pos += 1;
            let rhs = self.binary(precedence + 1)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ConstEvalError> {
        if let Some(op) = self.peek().and_then(|t| UnaryOp::from_token(t.kind)) {
            self.pos += 1;
            let operand = self.unary()?;
            return Ok(Expr::Unary(op, Box::new(operand)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, ConstEvalError> {
        let Some(tok) = self.peek() else {
            return Err(ConstEvalError::Syntax(
                "unexpected end of expression".to_string(),
            ));
        };
        self.pos += 1;
        match tok.kind {
            TokenKind::Int | TokenKind::HexInt => {
                let (value, text) = int_literal(tok.text)?;
                Ok(Expr::Int { value, text })
            }
            TokenKind::Float => {
                let text = tok.text.trim_end_matches(['f', 'F', 'l', 'L']).to_string();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| ConstEvalError::Syntax(format!("bad float `{}`", tok.text)))?;
                Ok(Expr::Float { value, text })
            }
            TokenKind::Char => Ok(Expr::Char {
                value: char_literal(tok.text)?,
                text: tok.text.to_string(),
            }),
            TokenKind::Str => {
                let mut value = unescape(strip_quotes(tok.text, '"'))?;
                let mut parts = vec![tok.text.to_string()];
                while let Some(next) = self.peek().filter(|t| t.kind == TokenKind::Str) {
                    self.pos += 1;
                    value.push_str(&unescape(strip_quotes(next.text, '"'))?);
                    parts.push(next.text.to_string());
                }
                Ok(Expr::Str { value, parts })
            }
            TokenKind::Ident => Ok(Expr::Ident(tok.text.to_string())),
            TokenKind::LParen => {
                let inner = self.ternary()?;
                if !self.eat(TokenKind::RParen) {
                    return Err(ConstEvalError::Syntax("expected `)`".to_string()));
                }
                Ok(Expr::Paren(Box::new(inner)))
            }
            _ => Err(ConstEvalError::Unsupported(format!("token `{}`", tok.text))),
        }
    }

    fn peek(&self) -> Option<Token<'src>> {
        self.tokens.get(self.pos).copied()
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek().is_some_and(|t| t.kind == kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }
}

/// Value and suffix-free spelling of an integer literal.
fn int_literal(text: &str) -> Result<(Option<i64>, String), ConstEvalError> {
    let digits = text.trim_end_matches(['u', 'U', 'l', 'L']);
    let (radix, body) = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        (16, hex)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    };
    let value = u64::from_str_radix(body, radix).map_err(|err| match err.kind() {
        std::num::IntErrorKind::PosOverflow => ConstEvalError::Overflow,
        _ => ConstEvalError::Syntax(format!("bad integer `{text}`")),
    })?;
    Ok((i64::try_from(value).ok(), digits.to_string()))
}

fn strip_quotes(text: &str, quote: char) -> &str {
    text.strip_prefix(quote)
        .and_then(|t| t.strip_suffix(quote))
        .unwrap_or(text)
}

fn char_literal(text: &str) -> Result<i64, ConstEvalError> {
    let decoded = unescape(strip_quotes(text, '\''))?;
    let mut chars = decoded.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(i64::from(u32::from(c))),
        _ => Err(ConstEvalError::Unsupported(format!(
            "multi-character literal {text}"
        ))),
    }
}

/// Decode C escape sequences.
fn unescape(body: &str) -> Result<String, ConstEvalError> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(escape) = chars.next() else {
            return Err(ConstEvalError::Syntax("dangling `\\`".to_string()));
        };
        let decoded = match escape {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'a' => '\u{7}',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'v' => '\u{b}',
            '\\' | '\'' | '"' | '?' => escape,
            'x' => {
                let mut code = 0u32;
                let mut seen = 0;
                while let Some(digit) = chars.peek().and_then(|d| d.to_digit(16)) {
                    code = code.saturating_mul(16).saturating_add(digit);
                    seen += 1;
                    chars.next();
                }
                if seen == 0 {
                    return Err(ConstEvalError::Syntax("empty `\\x` escape".to_string()));
                }
                char::from_u32(code)
                    .ok_or_else(|| ConstEvalError::Unsupported(format!("escape \\x{code:x}")))?
            }
            '0'..='7' => {
                let mut code = escape.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(digit) => {
                            code = code * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                char::from_u32(code)
                    .ok_or_else(|| ConstEvalError::Unsupported(format!("escape \\{code:o}")))?
            }
            other => {
                return Err(ConstEvalError::Unsupported(format!("escape \\{other}")));
            }
        };
        out.push(decoded);
    }
    Ok(out)
}
