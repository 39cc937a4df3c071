use std::io;
use std::path::PathBuf;

use cbind_gen::GenError;
use cbind_parse::ParseError;
use cbind_translate::{ConfigError, TranslateError};
use thiserror::Error;

/// Any failure that stops a run.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed project file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid project: {0}")]
    Invalid(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Translate(#[from] TranslateError),

    #[error(transparent)]
    Generate(#[from] GenError),

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
