use std::io;
use std::path::PathBuf;

use cbind_lexer::LexError;
use thiserror::Error;

/// Failure to read or parse a foreign header. Always fatal.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{file}:{line}: {source}")]
    Lex {
        file: String,
        line: u32,
        #[source]
        source: LexError,
    },

    #[error("{file}:{line}: expected {expected}, found `{found}`")]
    Unexpected {
        file: String,
        line: u32,
        expected: &'static str,
        found: String,
    },

    #[error("{file}: unexpected end of input, expected {expected}")]
    UnexpectedEof {
        file: String,
        expected: &'static str,
    },

    #[error("{file}:{line}: include \"{include}\" not found")]
    MissingInclude {
        file: String,
        line: u32,
        include: String,
    },
}
