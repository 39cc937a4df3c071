use std::io;

use thiserror::Error;

/// Fatal generation failure.
#[derive(Debug, Error)]
pub enum GenError {
    #[error("write failed: {0}")]
    Io(#[from] io::Error),

    /// The monitor stopped receiving while requests were still being produced.
    #[error("helper channel closed before generation finished")]
    HelperChannelClosed,

    #[error("helper monitor thread panicked")]
    MonitorPanicked,
}

/// Source formatter failure. Never fatal: callers fall back to raw bytes.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("cannot run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("formatter i/o: {0}")]
    Io(#[from] io::Error),

    #[error("`{program}` exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
}
