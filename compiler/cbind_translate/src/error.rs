use std::fmt;

use thiserror::Error;

/// Configuration defect found while compiling rule-sets and tip lists.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("unknown transform `{0}`")]
    UnknownTransform(String),
}

/// Fatal translation failure.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Two raw identifiers resolved to the same host identifier.
    #[error("`{first}` and `{second}` both translate to `{name}`")]
    Collision {
        name: String,
        first: String,
        second: String,
    },

    #[error("translator has already learned a declaration tree")]
    AlreadyLearned,
}

/// Failure to evaluate or re-tokenize a constant expression.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConstEvalError {
    #[error("unknown identifier `{0}`")]
    UnknownIdent(String),

    #[error("integer overflow")]
    Overflow,

    #[error("division by zero")]
    DivisionByZero,

    #[error("unsupported {0}")]
    Unsupported(String),

    #[error("syntax error: {0}")]
    Syntax(String),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Translated, but something looks off.
    Warning,
    /// Not translated.
    Skipped,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Warning => "warning",
            Severity::Skipped => "skipped",
        })
    }
}

/// A non-fatal finding recorded during learning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Raw identifier the finding is about.
    pub raw: String,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(raw: impl Into<String>, message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            raw: raw.into(),
            message: message.into(),
        }
    }

    pub fn skipped(raw: impl Into<String>, message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Skipped,
            raw: raw.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} `{}`: {}", self.severity, self.raw, self.message)
    }
}
