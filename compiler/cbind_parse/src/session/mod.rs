//! Parse session: one declaration tree fed by any number of files.
//!
//! Directives are lifted out of the token stream first, then interleaved back by
//! position so that `#define FOO_API` takes effect for the declarations after it.

use std::fs;
use std::path::{Path, PathBuf};

use cbind_ir::{DeclarationTree, ForeignDecl, ForeignKind, SourcePos};
use cbind_lexer::{render_tokens, tokenize, LineIndex, Token, TokenKind};
use rustc_hash::FxHashSet;

use crate::decl::{is_noise_word, DeclParser};
use crate::directive::{classify, Directive, IncludeTarget};
use crate::ParseError;

pub(crate) struct Session {
    include_paths: Vec<PathBuf>,
    tree: DeclarationTree,
    /// Canonical paths already parsed; guards include cycles and repeats.
    visited: FxHashSet<PathBuf>,
    /// Macros with no usable body, skipped wherever they appear in declarations.
    ignorable: FxHashSet<String>,
}

impl Session {
    pub(crate) fn new(include_paths: &[PathBuf]) -> Self {
        Session {
            include_paths: include_paths.to_vec(),
            tree: DeclarationTree::new(),
            visited: FxHashSet::default(),
            ignorable: FxHashSet::default(),
        }
    }

    pub(crate) fn parse_file(&mut self, path: &Path) -> Result<(), ParseError> {
        let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if !self.visited.insert(key) {
            tracing::debug!(path = %path.display(), "already parsed");
            return Ok(());
        }
        let src = fs::read_to_string(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let display = path.file_name().map_or_else(
            || path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        );
        self.parse_text(&display, &src, path.parent())
    }

    /// Parse `src` as the contents of `file`. `dir` is searched first for quoted
    /// includes.
    pub(crate) fn parse_text(
        &mut self,
        file: &str,
        src: &str,
        dir: Option<&Path>,
    ) -> Result<(), ParseError> {
        tracing::debug!(file, "parsing header");
        self.tree.add_file(file);
        let lines = LineIndex::new(src);
        let tokens = tokenize(src).map_err(|source| ParseError::Lex {
            file: file.to_string(),
            line: lines.line_of(source.offset),
            source,
        })?;

        let mut decl_tokens = Vec::with_capacity(tokens.len());
        let mut directives = Vec::new();
        for tok in tokens {
            if tok.kind == TokenKind::Directive {
                directives.push((decl_tokens.len(), tok));
            } else {
                decl_tokens.push(tok);
            }
        }

        let mut pending = directives.into_iter().peekable();
        let mut pos = 0;
        loop {
            while let Some((_, tok)) = pending.next_if(|(at, _)| *at <= pos) {
                self.handle_directive(file, &lines, tok, dir)?;
            }
            if pos >= decl_tokens.len() {
                break;
            }
            let mut parser = DeclParser::new(&decl_tokens, pos, file, &lines, &self.ignorable);
            let decls = parser.parse_external()?;
            pos = parser.pos();
            for decl in decls {
                self.tree.push(decl);
            }
        }
        Ok(())
    }

    pub(crate) fn finish(self) -> DeclarationTree {
        self.tree
    }

    fn handle_directive(
        &mut self,
        file: &str,
        lines: &LineIndex,
        tok: Token<'_>,
        dir: Option<&Path>,
    ) -> Result<(), ParseError> {
        let line = lines.line_of(tok.span.start);
        match classify(tok.text) {
            Directive::Define { name, body } => self.define(file, line, name, body),
            Directive::FunctionMacro { name } => {
                tracing::debug!(name, "skipping function-like macro");
            }
            Directive::Include(IncludeTarget::Quoted(include)) => {
                let path = self
                    .resolve_include(include, dir)
                    .ok_or_else(|| ParseError::MissingInclude {
                        file: file.to_string(),
                        line,
                        include: include.to_string(),
                    })?;
                self.parse_file(&path)?;
            }
            Directive::Include(IncludeTarget::System(include)) => {
                tracing::debug!(include, "not following system include");
            }
            Directive::Other(_) => {}
        }
        Ok(())
    }

    fn define(&mut self, file: &str, line: u32, name: &str, body: &str) {
        let body_tokens = match tokenize(body) {
            Ok(tokens) => tokens,
            Err(err) => {
                tracing::warn!(name, %err, "skipping macro with unreadable body");
                return;
            }
        };
        let noise = match body_tokens.first() {
            None => true,
            Some(first) => first.kind == TokenKind::Ident && is_noise_word(first.text),
        };
        if noise {
            self.ignorable.insert(name.to_string());
            return;
        }
        let value = render_tokens(body_tokens.iter().map(|t| t.text));
        self.tree.push(
            ForeignDecl::new(ForeignKind::Macro, name)
                .with_value(value)
                .at(SourcePos::new(file, line)),
        );
    }

    fn resolve_include(&self, include: &str, dir: Option<&Path>) -> Option<PathBuf> {
        dir.into_iter()
            .chain(self.include_paths.iter().map(PathBuf::as_path))
            .map(|base| base.join(include))
            .find(|candidate| candidate.is_file())
    }
}
