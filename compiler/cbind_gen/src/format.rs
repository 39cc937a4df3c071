//! Source formatting collaborators.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use crate::FormatError;

/// Formats one generated unit.
pub trait SourceFormatter {
    fn format(&self, unit: &Path, source: &[u8]) -> Result<Vec<u8>, FormatError>;
}

/// Pipes source through an external program, `gofmt` by default.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandFormatter {
    program: String,
    args: Vec<String>,
}

impl CommandFormatter {
    pub fn new(program: impl Into<String>) -> Self {
        CommandFormatter {
            program: program.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for CommandFormatter {
    fn default() -> Self {
        CommandFormatter::new("gofmt")
    }
}

impl SourceFormatter for CommandFormatter {
    fn format(&self, unit: &Path, source: &[u8]) -> Result<Vec<u8>, FormatError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| FormatError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // stdin is fed from a second thread while output is collected
        let stdin = child.stdin.take();
        let (fed, output) = thread::scope(|scope| {
            let feeder = scope.spawn(move || match stdin {
                Some(mut stdin) => stdin.write_all(source),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            let fed = feeder.join().unwrap_or(Ok(()));
            (fed, output)
        });
        let output = output?;
        if !output.status.success() {
            return Err(FormatError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        // a formatter may exit early without reading everything
        if let Err(err) = fed {
            tracing::debug!(unit = %unit.display(), %err, "formatter closed its input early");
        }
        Ok(output.stdout)
    }
}

/// Returns the input unchanged.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct NoopFormatter;

impl SourceFormatter for NoopFormatter {
    fn format(&self, _unit: &Path, source: &[u8]) -> Result<Vec<u8>, FormatError> {
        Ok(source.to_vec())
    }
}

/// Format `source`, falling back to the raw bytes on failure.
pub fn format_or_raw(formatter: &dyn SourceFormatter, unit: &Path, source: Vec<u8>) -> Vec<u8> {
    match formatter.format(unit, &source) {
        Ok(formatted) => formatted,
        Err(err) => {
            tracing::warn!(unit = %unit.display(), %err, "formatting failed, writing unformatted source");
            source
        }
    }
}
