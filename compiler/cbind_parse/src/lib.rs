//! Foreign header parser.
//!
//! Reads C headers into a [`DeclarationTree`]. The translator depends only on the
//! tree, so any parser implementing [`HeaderParser`] can stand in for
//! [`CHeaderParser`].
//!
//! Supported subset:
//! - object-like `#define` (function-like macros are skipped),
//! - quoted `#include`, resolved against the including file's directory and then
//!   the include paths; system `<...>` includes are not followed,
//! - `typedef`, `struct`/`union` (definitions and forward declarations), `enum`,
//!   function prototypes, `const` globals with initializers,
//! - `extern "C"` wrappers and `__attribute__`/`__declspec` annotations.
//!
//! Conditional directives are ignored: every branch is read.

mod decl;
mod directive;
mod error;
mod session;

use std::path::PathBuf;

use cbind_ir::DeclarationTree;

pub use error::ParseError;

use session::Session;

/// Input files and search paths for a parse.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParserConfig {
    /// Headers to translate, in order.
    pub targets: Vec<PathBuf>,
    /// Directories searched for quoted includes.
    pub include_paths: Vec<PathBuf>,
}

/// Produces a declaration tree from foreign headers.
pub trait HeaderParser {
    fn parse(&self) -> Result<DeclarationTree, ParseError>;
}

/// The built-in C header parser.
#[derive(Clone, Debug)]
pub struct CHeaderParser {
    config: ParserConfig,
}

impl CHeaderParser {
    pub fn new(config: ParserConfig) -> Self {
        CHeaderParser { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }
}

impl HeaderParser for CHeaderParser {
    fn parse(&self) -> Result<DeclarationTree, ParseError> {
        let mut session = Session::new(&self.config.include_paths);
        for target in &self.config.targets {
            session.parse_file(target)?;
        }
        let tree = session.finish();
        tracing::info!(
            declarations = tree.len(),
            files = tree.files().len(),
            "parsed foreign headers"
        );
        Ok(tree)
    }
}

/// Parse one in-memory header. Quoted includes are resolved against
/// `include_paths` only.
pub fn parse_source(
    file: &str,
    src: &str,
    include_paths: &[PathBuf],
) -> Result<DeclarationTree, ParseError> {
    let mut session = Session::new(include_paths);
    session.parse_text(file, src, None)?;
    Ok(session.finish())
}
