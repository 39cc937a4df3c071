//! Producer and monitor wired together.

use std::thread;

use cbind_ir::Model;

use crate::{GenError, Generator, GeneratorConfig, MonitorStats};

/// Generated sources, unformatted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Artifacts {
    /// `<package>.go`
    pub primary: Vec<u8>,
    /// `<package>_helpers.go`, empty when no host helper was needed.
    pub host_helpers: Vec<u8>,
    /// `<package>_helpers.c`, empty when no shim was needed.
    pub shim_helpers: Vec<u8>,
    pub stats: MonitorStats,
}

/// Generate every artifact for `model`.
///
/// The helper monitor runs on a scoped thread started before the first write;
/// it is joined after the generator is closed.
pub fn generate(model: &Model, config: &GeneratorConfig) -> Result<Artifacts, GenError> {
    let (mut generator, monitor) = Generator::new(model, config);
    let mut primary = Vec::new();
    let mut host_helpers = Vec::new();
    let mut shim_helpers = Vec::new();

    let (written, drained) = thread::scope(|scope| {
        let handle = scope.spawn(|| monitor.run(&mut host_helpers, &mut shim_helpers));
        let written = generator.write_all(&mut primary);
        generator.close();
        let drained = handle.join().map_err(|_| GenError::MonitorPanicked);
        (written, drained)
    });

    let stats = match (written, drained) {
        (Ok(()), Ok(Ok(stats))) => stats,
        // the producer only sees a closed channel; the monitor knows why
        (Err(GenError::HelperChannelClosed), Ok(Err(err)) | Err(err)) => return Err(err),
        (Err(err), _) | (Ok(()), Ok(Err(err)) | Err(err)) => return Err(err),
    };

    tracing::info!(
        package = %config.package,
        primary = primary.len(),
        host_helpers = stats.host,
        shims = stats.shim,
        "generated bindings"
    );
    Ok(Artifacts {
        primary,
        host_helpers,
        shim_helpers,
        stats,
    })
}
