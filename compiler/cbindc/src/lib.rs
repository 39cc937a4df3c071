//! cbind driver.
//!
//! Runs the whole pipeline for one project:
//!
//! ```text
//! project.json ──► CHeaderParser ──► Translator::learn ──► cbind_gen::generate
//!                                                                │
//!                                  <package>.go, <package>_helpers.{go,c} ◄── format
//! ```
//!
//! Nothing is written unless parsing, learning and generation all succeed.
//! Output files are staged as temporaries in the output directory and moved
//! into place together; a failed move removes the files already moved.

mod config;
mod error;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Once;

use cbind_gen::{format_or_raw, Artifacts, NoopFormatter, SourceFormatter};
use cbind_parse::{CHeaderParser, HeaderParser};
use cbind_translate::{Severity, Translator};
use tempfile::NamedTempFile;

pub use config::{ParserSection, ProjectConfig};
pub use error::DriverError;

/// Where and how a run writes its output.
pub struct RunOptions {
    pub out_dir: PathBuf,
    /// `None` writes generated sources as they are.
    pub formatter: Option<Box<dyn SourceFormatter>>,
}

impl RunOptions {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        RunOptions {
            out_dir: out_dir.into(),
            formatter: None,
        }
    }

    #[must_use]
    pub fn with_formatter(mut self, formatter: impl SourceFormatter + 'static) -> Self {
        self.formatter = Some(Box::new(formatter));
        self
    }
}

/// Parse, translate and generate; returns the written files in order.
pub fn run(project: &ProjectConfig, options: &RunOptions) -> Result<Vec<PathBuf>, DriverError> {
    let tree = CHeaderParser::new(project.parser_config()).parse()?;
    let mut translator = Translator::new(&project.translator)?;
    translator.learn(&tree)?;
    for diagnostic in translator.diagnostics() {
        match diagnostic.severity {
            Severity::Warning => tracing::warn!(raw = %diagnostic.raw, "{}", diagnostic.message),
            Severity::Skipped => tracing::info!(raw = %diagnostic.raw, "skipped: {}", diagnostic.message),
        }
    }

    let artifacts = cbind_gen::generate(translator.model(), &project.generator)?;
    let units = units(&project.generator.package, artifacts);

    let formatter: &dyn SourceFormatter = match &options.formatter {
        Some(formatter) => formatter.as_ref(),
        None => &NoopFormatter,
    };
    fs::create_dir_all(&options.out_dir).map_err(|source| DriverError::Write {
        path: options.out_dir.clone(),
        source,
    })?;
    let mut staged = Vec::with_capacity(units.len());
    for (name, source) in units {
        let path = options.out_dir.join(name);
        let source = format_or_raw(formatter, &path, source);
        let file = stage(&options.out_dir, &source).map_err(|source| DriverError::Write {
            path: path.clone(),
            source,
        })?;
        staged.push((file, path));
    }
    let written = commit(staged)?;
    tracing::info!(files = written.len(), out = %options.out_dir.display(), "wrote bindings");
    Ok(written)
}

/// Load `config` and run it.
pub fn run_file(config: &Path, options: &RunOptions) -> Result<Vec<PathBuf>, DriverError> {
    let project = ProjectConfig::load(config)?;
    run(&project, options)
}

/// Output files with their contents; empty helper files are dropped.
fn units(package: &str, artifacts: Artifacts) -> Vec<(String, Vec<u8>)> {
    let mut units = vec![(format!("{package}.go"), artifacts.primary)];
    if !artifacts.host_helpers.is_empty() {
        units.push((format!("{package}_helpers.go"), artifacts.host_helpers));
    }
    if !artifacts.shim_helpers.is_empty() {
        units.push((format!("{package}_helpers.c"), artifacts.shim_helpers));
    }
    units
}

/// Write `contents` to a temporary file in `dir`.
fn stage(dir: &Path, contents: &[u8]) -> io::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new().prefix(".cbind").tempfile_in(dir)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.as_file().set_permissions(fs::Permissions::from_mode(0o644))?;
    }
    file.write_all(contents)?;
    Ok(file)
}

/// Move staged files into place. On failure, files already moved are removed
/// and the remaining temporaries are deleted when dropped.
fn commit(staged: Vec<(NamedTempFile, PathBuf)>) -> Result<Vec<PathBuf>, DriverError> {
    let mut written: Vec<PathBuf> = Vec::with_capacity(staged.len());
    for (file, path) in staged {
        tracing::debug!(path = %path.display(), "writing");
        if let Err(err) = file.persist(&path) {
            for done in &written {
                if let Err(cleanup) = fs::remove_file(done) {
                    tracing::warn!(path = %done.display(), %cleanup, "cannot remove partial output");
                }
            }
            return Err(DriverError::Write {
                path,
                source: err.error,
            });
        }
        written.push(path);
    }
    Ok(written)
}

static TRACING_INIT: Once = Once::new();

/// Install the global subscriber.
///
/// Reads `RUST_LOG`, defaulting to `warn`. Set `CBIND_LOG_TREE=1` for
/// indented, span-structured output. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let tree = std::env::var_os("CBIND_LOG_TREE").is_some();
        let registry = tracing_subscriber::registry().with(filter);
        if tree {
            registry
                .with(tracing_tree::HierarchicalLayer::new(2).with_targets(true))
                .init();
        } else {
            registry
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    });
}
