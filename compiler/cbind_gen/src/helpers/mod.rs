//! Helper side-channel.
//!
//! The generator pushes [`HelperRequest`]s through a [`HelperSink`] while it
//! emits primary declarations. A [`HelperMonitor`] on another thread drains the
//! channel into two destinations, one per [`HelperKind`], until every sender is
//! dropped and the queue is empty.

use std::fmt;
use std::io::Write;

use crossbeam::channel::{self, Receiver, Sender};
use rustc_hash::FxHashSet;

use crate::GenError;

/// Destination of a helper.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HelperKind {
    /// Go source, written to `<package>_helpers.go`.
    Host,
    /// C source, written to `<package>_helpers.c`.
    Shim,
}

impl fmt::Display for HelperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HelperKind::Host => "host",
            HelperKind::Shim => "shim",
        })
    }
}

/// A named block of helper source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HelperRequest {
    pub kind: HelperKind,
    pub name: String,
    pub text: String,
}

impl HelperRequest {
    pub fn host(name: impl Into<String>, text: impl Into<String>) -> Self {
        HelperRequest {
            kind: HelperKind::Host,
            name: name.into(),
            text: text.into(),
        }
    }

    pub fn shim(name: impl Into<String>, text: impl Into<String>) -> Self {
        HelperRequest {
            kind: HelperKind::Shim,
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Producer half of the side-channel. Requests each helper name once.
#[derive(Debug)]
pub struct HelperSink {
    sender: Sender<HelperRequest>,
    seen: FxHashSet<String>,
    sent: usize,
}

impl HelperSink {
    /// Create a connected sink and monitor.
    ///
    /// `capacity` bounds the channel; `None` leaves it unbounded.
    pub fn channel(
        capacity: Option<usize>,
        host_preamble: String,
        shim_preamble: String,
    ) -> (HelperSink, HelperMonitor) {
        let (sender, receiver) = match capacity {
            Some(cap) => channel::bounded(cap),
            None => channel::unbounded(),
        };
        let sink = HelperSink {
            sender,
            seen: FxHashSet::default(),
            sent: 0,
        };
        let monitor = HelperMonitor {
            receiver,
            host_preamble,
            shim_preamble,
        };
        (sink, monitor)
    }

    /// Reserve `name`. Returns false if it was already requested.
    ///
    /// Callers that build a helper recursively mark it before building so a
    /// self-referencing type terminates.
    pub fn mark(&mut self, name: &str) -> bool {
        if self.seen.contains(name) {
            return false;
        }
        self.seen.insert(name.to_string());
        true
    }

    #[inline]
    pub fn has(&self, name: &str) -> bool {
        self.seen.contains(name)
    }

    /// Push a request whose name was reserved with [`HelperSink::mark`].
    pub fn push(&mut self, request: HelperRequest) -> Result<(), GenError> {
        tracing::debug!(kind = %request.kind, name = %request.name, "helper");
        self.sender
            .send(request)
            .map_err(|_| GenError::HelperChannelClosed)?;
        self.sent += 1;
        Ok(())
    }

    /// Mark and push in one step. Already requested names are ignored.
    pub fn request(&mut self, request: HelperRequest) -> Result<(), GenError> {
        if self.mark(&request.name) {
            self.push(request)
        } else {
            Ok(())
        }
    }

    pub fn sent(&self) -> usize {
        self.sent
    }
}

/// Number of helpers written per destination.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub host: usize,
    pub shim: usize,
}

/// Consumer half of the side-channel.
#[derive(Debug)]
pub struct HelperMonitor {
    receiver: Receiver<HelperRequest>,
    host_preamble: String,
    shim_preamble: String,
}

impl HelperMonitor {
    /// Drain requests into `host` and `shim` until the channel is closed and empty.
    ///
    /// Each destination receives its preamble before its first helper and
    /// nothing at all when no helper of that kind arrives.
    pub fn run<H, S>(self, host: &mut H, shim: &mut S) -> Result<MonitorStats, GenError>
    where
        H: Write,
        S: Write,
    {
        let mut stats = MonitorStats::default();
        for request in self.receiver.iter() {
            let (out, count, preamble): (&mut dyn Write, &mut usize, &str) = match request.kind {
                HelperKind::Host => (&mut *host, &mut stats.host, &self.host_preamble),
                HelperKind::Shim => (&mut *shim, &mut stats.shim, &self.shim_preamble),
            };
            if *count == 0 {
                out.write_all(preamble.as_bytes())?;
            }
            out.write_all(b"\n")?;
            out.write_all(request.text.as_bytes())?;
            if !request.text.ends_with('\n') {
                out.write_all(b"\n")?;
            }
            *count += 1;
        }
        tracing::debug!(host = stats.host, shim = stats.shim, "helper monitor drained");
        Ok(stats)
    }
}
