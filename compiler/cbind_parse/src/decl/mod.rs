//! Declaration parser over a directive-free token stream.
//!
//! Each call to [`DeclParser::parse_external`] consumes one external declaration
//! and returns the foreign declarations it introduces. Aggregates defined inline
//! (`typedef struct { ... } foo_t;`) are returned before the declarations that
//! use them.

use cbind_ir::{ForeignDecl, ForeignKind, SourcePos};
use cbind_lexer::{render_tokens, LineIndex, Token, TokenKind};
use rustc_hash::FxHashSet;

use crate::ParseError;

/// Arithmetic type keywords.
const SCALAR_WORDS: &[&str] = &[
    "void", "char", "short", "int", "long", "float", "double", "signed", "unsigned", "_Bool",
    "__signed__",
];

/// Storage classes and qualifiers that do not affect the translated type.
const STORAGE_WORDS: &[&str] = &[
    "extern",
    "static",
    "inline",
    "__inline",
    "__inline__",
    "register",
    "auto",
    "_Noreturn",
    "__extension__",
    "volatile",
    "__volatile__",
    "restrict",
    "__restrict",
    "__restrict__",
    "_Thread_local",
    "__thread",
];

/// Annotations followed by a parenthesized argument list.
const ANNOTATIONS: &[&str] = &[
    "__attribute__",
    "__attribute",
    "__declspec",
    "__asm__",
    "__asm",
    "asm",
    "_Alignas",
];

/// True for words that carry no type information.
pub(crate) fn is_noise_word(word: &str) -> bool {
    STORAGE_WORDS.contains(&word) || ANNOTATIONS.contains(&word)
}

/// `struct`/`union`/`enum` specifier.
#[derive(Debug)]
struct Tagged {
    kind: ForeignKind,
    tag: Option<String>,
    /// Members when the specifier has a body.
    body: Option<Vec<ForeignDecl>>,
    line: u32,
}

/// Declaration specifiers: storage, qualifiers and the base type.
#[derive(Debug, Default)]
struct Specifiers {
    typedef: bool,
    is_const: bool,
    /// Arithmetic keywords, or a single typedef name when `named` is set.
    words: Vec<String>,
    named: bool,
    tagged: Option<Tagged>,
}

impl Specifiers {
    fn has_base(&self) -> bool {
        !self.words.is_empty() || self.tagged.is_some()
    }

    /// Base type text, e.g. `const struct foo` or `unsigned int`.
    fn type_text(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if self.is_const {
            parts.push("const".to_string());
        }
        match &self.tagged {
            Some(Tagged {
                kind,
                tag: Some(tag),
                ..
            }) => parts.push(format!("{} {tag}", kind.tag_keyword().unwrap_or("struct"))),
            // anonymous enum used as a type
            Some(Tagged { tag: None, .. }) => parts.push("int".to_string()),
            None if self.words.is_empty() => parts.push("int".to_string()),
            None => parts.extend(self.words.iter().cloned()),
        }
        parts.join(" ")
    }
}

/// Parameters of a function declarator.
#[derive(Debug, Default)]
struct ParamList {
    params: Vec<ForeignDecl>,
    variadic: bool,
}

/// A declarator with its name split out.
#[derive(Debug)]
struct Declarator<'src> {
    name: Option<String>,
    line: u32,
    /// Declarator tokens with the name removed.
    tokens: Vec<&'src str>,
    /// Tokens before the name: the pointer part of a function's return type.
    prefix: Vec<&'src str>,
    /// Set for direct function declarators (`name(...)`).
    params: Option<ParamList>,
}

pub(crate) struct DeclParser<'t, 'src> {
    tokens: &'t [Token<'src>],
    pos: usize,
    file: &'t str,
    lines: &'t LineIndex,
    /// Macros defined empty or as annotations (`FOO_API`); skipped like storage words.
    ignorable: &'t FxHashSet<String>,
}

impl<'t, 'src> DeclParser<'t, 'src> {
    pub(crate) fn new(
        tokens: &'t [Token<'src>],
        pos: usize,
        file: &'t str,
        lines: &'t LineIndex,
        ignorable: &'t FxHashSet<String>,
    ) -> Self {
        DeclParser {
            tokens,
            pos,
            file,
            lines,
            ignorable,
        }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    /// Parse one external declaration.
    pub(crate) fn parse_external(&mut self) -> Result<Vec<ForeignDecl>, ParseError> {
        let mut out = Vec::new();
        match self.peek_kind() {
            None => return Ok(out),
            // stray `;`, or the `}` closing an `extern "C" {` block
            Some(TokenKind::Semi | TokenKind::RBrace) => {
                self.pos += 1;
                return Ok(out);
            }
            _ => {}
        }
        if self.at_extern_c() {
            self.pos += 3;
            return Ok(out);
        }

        let mut specs = self.parse_specifiers(&mut out, None)?;
        if self.eat(TokenKind::Semi) {
            if let Some(tagged) = specs.tagged.take() {
                out.extend(self.finish_tagged(tagged, true));
            }
            return Ok(out);
        }

        let mut declarators = Vec::new();
        loop {
            let declarator = self.parse_declarator()?;
            let mut value = None;
            let mut has_body = false;
            if self.eat(TokenKind::Eq) {
                value = Some(self.collect_value(&[TokenKind::Comma, TokenKind::Semi]));
            } else if declarator.params.is_some() && self.peek_kind() == Some(TokenKind::LBrace) {
                self.skip_group(TokenKind::LBrace, TokenKind::RBrace)?;
                has_body = true;
            }
            declarators.push((declarator, value));
            if has_body {
                break;
            }
            if self.eat(TokenKind::Comma) {
                continue;
            }
            self.expect(TokenKind::Semi, "`;`")?;
            break;
        }

        if let Some(tagged) = &mut specs.tagged {
            if tagged.tag.is_none() && tagged.body.is_some() {
                let first = declarators.first().and_then(|(d, _)| d.name.clone());
                tagged.tag = match first {
                    Some(name) if specs.typedef => Some(name),
                    _ if tagged.kind == ForeignKind::Enum => None,
                    _ => Some(format!("anon_{}", tagged.line)),
                };
            }
        }
        let base = specs.type_text();
        if let Some(tagged) = specs.tagged.take() {
            out.extend(self.finish_tagged(tagged, specs.typedef));
        }

        for (declarator, value) in declarators {
            let Some(name) = declarator.name else {
                tracing::debug!(file = self.file, line = declarator.line, "skipping unnamed declarator");
                continue;
            };
            let pos = self.source_pos(declarator.line);
            if specs.typedef {
                out.push(
                    ForeignDecl::new(ForeignKind::Typedef, name)
                        .with_ty(join_type(&base, &declarator.tokens))
                        .at(pos),
                );
            } else if let Some(params) = declarator.params {
                let mut decl = ForeignDecl::new(ForeignKind::Function, name)
                    .with_ty(join_type(&base, &declarator.prefix))
                    .at(pos);
                decl.members = params.params;
                decl.variadic = params.variadic;
                out.push(decl);
            } else if let Some(value) =
                value.filter(|_| specs.is_const || declarator.tokens.contains(&"const"))
            {
                out.push(
                    ForeignDecl::new(ForeignKind::Const, name)
                        .with_ty(join_type(&base, &declarator.tokens))
                        .with_value(value)
                        .at(pos),
                );
            } else {
                tracing::debug!(name = %name, "skipping non-constant global");
            }
        }
        Ok(out)
    }

    fn parse_specifiers(
        &mut self,
        out: &mut Vec<ForeignDecl>,
        owner: Option<&str>,
    ) -> Result<Specifiers, ParseError> {
        let mut specs = Specifiers::default();
        while let Some(tok) = self.peek() {
            if tok.kind != TokenKind::Ident {
                break;
            }
            match tok.text {
                "typedef" => specs.typedef = true,
                "const" => specs.is_const = true,
                word @ ("struct" | "union" | "enum") => {
                    if specs.has_base() {
                        break;
                    }
                    self.pos += 1;
                    specs.tagged = Some(self.parse_tagged(word, out, owner)?);
                    continue;
                }
                word if ANNOTATIONS.contains(&word) => {
                    self.pos += 1;
                    self.skip_annotation_args()?;
                    continue;
                }
                word if STORAGE_WORDS.contains(&word) || self.ignorable.contains(word) => {}
                word if SCALAR_WORDS.contains(&word) => {
                    if specs.named || specs.tagged.is_some() {
                        break;
                    }
                    specs.words.push(word.to_string());
                }
                word => {
                    if specs.has_base() {
                        break;
                    }
                    specs.words.push(word.to_string());
                    specs.named = true;
                }
            }
            self.pos += 1;
        }
        Ok(specs)
    }

    fn parse_tagged(
        &mut self,
        keyword: &str,
        out: &mut Vec<ForeignDecl>,
        owner: Option<&str>,
    ) -> Result<Tagged, ParseError> {
        let kind = match keyword {
            "struct" => ForeignKind::Struct,
            "union" => ForeignKind::Union,
            _ => ForeignKind::Enum,
        };
        let line = self.current_line();
        self.skip_annotations()?;
        let tag = match self.peek() {
            Some(tok) if tok.kind == TokenKind::Ident => {
                self.pos += 1;
                Some(tok.text.to_string())
            }
            _ => None,
        };
        self.skip_annotations()?;
        let body = if self.eat(TokenKind::LBrace) {
            Some(if kind == ForeignKind::Enum {
                self.parse_enum_body()?
            } else {
                let owner = tag
                    .clone()
                    .or_else(|| owner.map(str::to_string))
                    .unwrap_or_else(|| format!("anon{line}"));
                self.parse_fields(out, &owner)?
            })
        } else {
            None
        };
        self.skip_annotations()?;
        Ok(Tagged {
            kind,
            tag,
            body,
            line,
        })
    }

    fn parse_fields(
        &mut self,
        out: &mut Vec<ForeignDecl>,
        owner: &str,
    ) -> Result<Vec<ForeignDecl>, ParseError> {
        let mut fields = Vec::new();
        let mut anonymous = 0usize;
        loop {
            match self.peek_kind() {
                None => return Err(self.eof("`}`")),
                Some(TokenKind::RBrace) => {
                    self.pos += 1;
                    break;
                }
                Some(TokenKind::Semi) => {
                    self.pos += 1;
                    continue;
                }
                _ => {}
            }

            let mut specs = self.parse_specifiers(out, Some(owner))?;
            if self.eat(TokenKind::Semi) {
                // C11 anonymous member: `union { int a; float b; };`
                if let Some(mut tagged) = specs.tagged.take().filter(|t| t.body.is_some()) {
                    let name = format!("anon{anonymous}");
                    anonymous += 1;
                    tagged.tag.get_or_insert_with(|| format!("{owner}_{name}"));
                    let line = tagged.line;
                    let ty = Specifiers {
                        is_const: specs.is_const,
                        tagged: Some(tagged),
                        ..Specifiers::default()
                    };
                    let text = ty.type_text();
                    if let Some(tagged) = ty.tagged {
                        out.extend(self.finish_tagged(tagged, false));
                    }
                    fields.push(
                        ForeignDecl::new(ForeignKind::Field, name)
                            .with_ty(text)
                            .at(self.source_pos(line)),
                    );
                }
                continue;
            }

            let mut declarators = Vec::new();
            loop {
                declarators.push(self.parse_declarator()?);
                if self.eat(TokenKind::Comma) {
                    continue;
                }
                self.expect(TokenKind::Semi, "`;`")?;
                break;
            }

            if let Some(tagged) = &mut specs.tagged {
                if tagged.tag.is_none() && tagged.body.is_some() {
                    let field = declarators
                        .first()
                        .and_then(|d| d.name.clone())
                        .unwrap_or_else(|| "anon".to_string());
                    tagged.tag = Some(format!("{owner}_{field}"));
                }
            }
            let base = specs.type_text();
            if let Some(tagged) = specs.tagged.take() {
                out.extend(self.finish_tagged(tagged, false));
            }
            for declarator in declarators {
                // unnamed bit-field padding
                let Some(name) = declarator.name else {
                    continue;
                };
                fields.push(
                    ForeignDecl::new(ForeignKind::Field, name)
                        .with_ty(join_type(&base, &declarator.tokens))
                        .at(self.source_pos(declarator.line)),
                );
            }
        }
        Ok(fields)
    }

    fn parse_enum_body(&mut self) -> Result<Vec<ForeignDecl>, ParseError> {
        let mut members = Vec::new();
        loop {
            let Some(tok) = self.peek() else {
                return Err(self.eof("`}`"));
            };
            match tok.kind {
                TokenKind::RBrace => {
                    self.pos += 1;
                    break;
                }
                TokenKind::Comma => self.pos += 1,
                TokenKind::Ident => {
                    self.pos += 1;
                    let line = self.line_of(&tok);
                    let mut member =
                        ForeignDecl::new(ForeignKind::EnumMember, tok.text).at(self.source_pos(line));
                    self.skip_annotations()?;
                    if self.eat(TokenKind::Eq) {
                        member.value =
                            Some(self.collect_value(&[TokenKind::Comma, TokenKind::RBrace]));
                    }
                    members.push(member);
                }
                _ => return Err(self.unexpected(&tok, "enum member")),
            }
        }
        Ok(members)
    }

    fn parse_declarator(&mut self) -> Result<Declarator<'src>, ParseError> {
        let line = self.current_line();
        let mut raw: Vec<Token<'src>> = Vec::new();
        let mut depth = 0usize;
        while let Some(tok) = self.peek() {
            match tok.kind {
                TokenKind::Comma
                | TokenKind::Semi
                | TokenKind::Eq
                | TokenKind::LBrace
                | TokenKind::Colon
                    if depth == 0 =>
                {
                    break
                }
                TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::RParen | TokenKind::RBracket => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                TokenKind::Ident if ANNOTATIONS.contains(&tok.text) => {
                    self.pos += 1;
                    self.skip_annotation_args()?;
                    continue;
                }
                TokenKind::Ident
                    if STORAGE_WORDS.contains(&tok.text) || self.ignorable.contains(tok.text) =>
                {
                    self.pos += 1;
                    continue;
                }
                _ => {}
            }
            raw.push(tok);
            self.pos += 1;
        }
        if self.eat(TokenKind::Colon) {
            // bit-field width
            self.collect_value(&[TokenKind::Comma, TokenKind::Semi]);
        }
        self.split_declarator(&raw, line)
    }

    /// Separate the declared name from the type part of a declarator.
    ///
    /// The name is the first identifier reached through `*`, `(` and `const` only,
    /// so parameter names inside a function-pointer type are never taken.
    fn split_declarator(
        &self,
        raw: &[Token<'src>],
        line: u32,
    ) -> Result<Declarator<'src>, ParseError> {
        let texts: Vec<&'src str> = raw.iter().map(|t| t.text).collect();
        let mut name_at = None;
        for (i, tok) in raw.iter().enumerate() {
            match tok.kind {
                TokenKind::Ident if tok.text == "const" => {}
                TokenKind::Ident => {
                    name_at = Some(i);
                    break;
                }
                TokenKind::Star | TokenKind::LParen => {}
                _ => break,
            }
        }
        let Some(at) = name_at else {
            return Ok(Declarator {
                name: None,
                line,
                tokens: texts.clone(),
                prefix: texts,
                params: None,
            });
        };

        let name_tok = &raw[at];
        let nested = raw[..at].iter().any(|t| t.kind == TokenKind::LParen);
        let params = match raw.get(at + 1) {
            Some(next) if !nested && next.kind == TokenKind::LParen => {
                let close = matching_close(raw, at + 1)
                    .ok_or_else(|| self.unexpected(next, "`)`"))?;
                Some(self.parse_params(&raw[at + 2..close])?)
            }
            _ => None,
        };

        let prefix = texts[..at].to_vec();
        let mut tokens = prefix.clone();
        tokens.extend_from_slice(&texts[at + 1..]);
        Ok(Declarator {
            name: Some(name_tok.text.to_string()),
            line: self.line_of(name_tok),
            tokens,
            prefix,
            params,
        })
    }

    fn parse_params(&self, tokens: &[Token<'src>]) -> Result<ParamList, ParseError> {
        let chunks = split_top_level(tokens);
        let mut list = ParamList::default();
        if let [only] = chunks.as_slice() {
            if only.len() == 1 && only[0].is_ident("void") {
                return Ok(list);
            }
        }
        for chunk in chunks {
            match chunk {
                [] => continue,
                [tok] if tok.kind == TokenKind::Ellipsis => {
                    list.variadic = true;
                    continue;
                }
                _ => {}
            }
            let mut sub = DeclParser::new(chunk, 0, self.file, self.lines, self.ignorable);
            let mut nested = Vec::new();
            let specs = sub.parse_specifiers(&mut nested, None)?;
            let declarator = sub.parse_declarator()?;
            let line = self.line_of(&chunk[0]);
            list.params.push(
                ForeignDecl::new(ForeignKind::Param, declarator.name.unwrap_or_default())
                    .with_ty(join_type(&specs.type_text(), &declarator.tokens))
                    .at(self.source_pos(line)),
            );
        }
        Ok(list)
    }

    fn finish_tagged(&self, tagged: Tagged, emit_forward: bool) -> Option<ForeignDecl> {
        let pos = self.source_pos(tagged.line);
        match tagged.body {
            Some(members) => Some(
                ForeignDecl::new(tagged.kind, tagged.tag.unwrap_or_default())
                    .with_members(members)
                    .at(pos),
            ),
            None if emit_forward && tagged.kind != ForeignKind::Enum => tagged
                .tag
                .map(|tag| ForeignDecl::new(tagged.kind, tag).at(pos)),
            None => None,
        }
    }

    /// Collect an initializer or enum value up to a top-level stop token.
    fn collect_value(&mut self, stops: &[TokenKind]) -> String {
        let mut texts = Vec::new();
        let mut depth = 0usize;
        while let Some(tok) = self.peek() {
            if depth == 0 && stops.contains(&tok.kind) {
                break;
            }
            match tok.kind {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            texts.push(tok.text);
            self.pos += 1;
        }
        render_tokens(texts)
    }

    fn skip_annotations(&mut self) -> Result<(), ParseError> {
        while let Some(tok) = self.peek() {
            if tok.kind != TokenKind::Ident || !ANNOTATIONS.contains(&tok.text) {
                break;
            }
            self.pos += 1;
            self.skip_annotation_args()?;
        }
        Ok(())
    }

    fn skip_annotation_args(&mut self) -> Result<(), ParseError> {
        if self.peek_kind() == Some(TokenKind::LParen) {
            self.skip_group(TokenKind::LParen, TokenKind::RParen)?;
        }
        Ok(())
    }

    /// Skip a balanced group starting at the current `open` token.
    fn skip_group(&mut self, open: TokenKind, close: TokenKind) -> Result<(), ParseError> {
        let mut depth = 0usize;
        while let Some(tok) = self.peek() {
            self.pos += 1;
            if tok.kind == open {
                depth += 1;
            } else if tok.kind == close {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Ok(());
                }
            }
        }
        Err(self.eof("closing bracket"))
    }

    fn at_extern_c(&self) -> bool {
        matches!(
            (self.tokens.get(self.pos), self.tokens.get(self.pos + 1), self.tokens.get(self.pos + 2)),
            (Some(a), Some(b), Some(c))
                if a.is_ident("extern") && b.kind == TokenKind::Str && c.kind == TokenKind::LBrace
        )
    }

    // === Token access ===

    #[inline]
    fn peek(&self) -> Option<Token<'src>> {
        self.tokens.get(self.pos).copied()
    }

    #[inline]
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

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<(), ParseError> {
        match self.peek() {
            Some(tok) if tok.kind == kind => {
                self.pos += 1;
                Ok(())
            }
            Some(tok) => Err(self.unexpected(&tok, expected)),
            None => Err(self.eof(expected)),
        }
    }

    // === Positions and errors ===

    fn line_of(&self, tok: &Token<'_>) -> u32 {
        self.lines.line_of(tok.span.start)
    }

    fn current_line(&self) -> u32 {
        self.peek()
            .or_else(|| self.tokens.last().copied())
            .map_or(1, |tok| self.line_of(&tok))
    }

    fn source_pos(&self, line: u32) -> SourcePos {
        SourcePos::new(self.file, line)
    }

    fn unexpected(&self, tok: &Token<'_>, expected: &'static str) -> ParseError {
        ParseError::Unexpected {
            file: self.file.to_string(),
            line: self.line_of(tok),
            expected,
            found: tok.text.to_string(),
        }
    }

    fn eof(&self, expected: &'static str) -> ParseError {
        ParseError::UnexpectedEof {
            file: self.file.to_string(),
            expected,
        }
    }
}

fn join_type(base: &str, declarator: &[&str]) -> String {
    if declarator.is_empty() {
        base.to_string()
    } else {
        format!("{base} {}", render_tokens(declarator.iter().copied()))
    }
}

/// Index of the `)` matching the `(` at `open`.
fn matching_close(tokens: &[Token<'_>], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, tok) in tokens.iter().enumerate().skip(open) {
        match tok.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on commas outside any brackets.
fn split_top_level<'a, 'src>(tokens: &'a [Token<'src>]) -> Vec<&'a [Token<'src>]> {
    let mut chunks = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, tok) in tokens.iter().enumerate() {
        match tok.kind {
            TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                depth = depth.saturating_sub(1);
            }
            TokenKind::Comma if depth == 0 => {
                chunks.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    chunks.push(&tokens[start..]);
    chunks
}
