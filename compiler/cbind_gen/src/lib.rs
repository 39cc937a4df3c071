//! Go/cgo code generation for a translated declaration model.
//!
//! # Architecture
//!
//! ```text
//!        Model + GeneratorConfig
//!                 ↓
//!   Generator::write_* ──────→ primary output (header, includes, consts,
//!        │                     typedefs, declares)
//!        │ HelperRequest
//!        ↓ (crossbeam channel)
//!   HelperMonitor::run ──────→ host helpers (Go)
//!                        └───→ native shims (C)
//! ```
//!
//! Helpers are discovered while primary declarations are emitted: a proxy that
//! passes a `char *` needs the C-string helpers, a managed struct passed by
//! pointer needs its conversion functions. Each helper is requested once.
//!
//! [`pipeline::generate`] runs the monitor on a scoped thread alongside the
//! producer and joins it before returning.

mod buffer;
mod config;
mod convert;
mod error;
mod format;
mod generator;
mod helpers;
pub mod pipeline;

pub use buffer::SourceBuffer;
pub use config::GeneratorConfig;
pub use convert::{go_ident, Conv, Need, Position, TypeMapper};
pub use error::{FormatError, GenError};
pub use format::{format_or_raw, CommandFormatter, NoopFormatter, SourceFormatter};
pub use generator::Generator;
pub use helpers::{HelperKind, HelperMonitor, HelperRequest, HelperSink, MonitorStats};
pub use pipeline::{generate, Artifacts};

/// First line of every generated file.
pub const GENERATED_BANNER: &str = "// Code generated by cbind. DO NOT EDIT.";
