//! Primary output writers.
//!
//! Call order: [`Generator::write_header`], [`Generator::write_includes`],
//! [`Generator::write_consts`], [`Generator::write_typedefs`],
//! [`Generator::write_declares`], then [`Generator::close`]. [`Generator::write_all`]
//! runs the five writers in that order.

mod consts;
mod declares;
mod support;
mod typedefs;

use std::io::Write;
use std::path::Path;

use cbind_ir::{Entry, EntryKind, Model, Signature, SourcePos, TypeRef};

use crate::convert::{Need, TypeMapper};
use crate::helpers::{HelperMonitor, HelperRequest, HelperSink};
use crate::{GenError, GeneratorConfig, SourceBuffer, GENERATED_BANNER};

/// Writes Go/cgo bindings for a model.
///
/// Helpers discovered while writing are pushed to the [`HelperMonitor`]
/// returned by [`Generator::new`], which must be running (or drained later on
/// an unbounded channel) for generation to complete.
#[derive(Debug)]
pub struct Generator<'m> {
    model: &'m Model,
    config: &'m GeneratorConfig,
    types: TypeMapper<'m>,
    helpers: HelperSink,
}

impl<'m> Generator<'m> {
    pub fn new(model: &'m Model, config: &'m GeneratorConfig) -> (Self, HelperMonitor) {
        let (helpers, monitor) = HelperSink::channel(
            config.helper_capacity,
            support::host_preamble(config),
            support::shim_preamble(config),
        );
        let generator = Generator {
            model,
            config,
            types: TypeMapper::new(model),
            helpers,
        };
        (generator, monitor)
    }

    /// Banner, package documentation and `package` clause.
    pub fn write_header<W: Write>(&mut self, out: &mut W) -> Result<(), GenError> {
        let mut buf = SourceBuffer::new();
        buf.writeln(GENERATED_BANNER);
        buf.newline();
        if let Some(description) = &self.config.description {
            buf.comment(description);
        }
        buf.writeln(&format!("package {}", self.config.package));
        flush(out, &buf)
    }

    /// cgo preamble with includes and callback trampoline prototypes.
    pub fn write_includes<W: Write>(&mut self, out: &mut W) -> Result<(), GenError> {
        let mut buf = SourceBuffer::new();
        buf.newline();
        buf.writeln("/*");
        for line in self.config.include_lines() {
            buf.writeln(&line);
        }
        buf.writeln("#include <stdlib.h>");
        for (entry, signature) in self.callbacks() {
            let prototype = support::trampoline_prototype(&self.types, entry, signature);
            buf.writeln(&format!("extern {prototype};"));
        }
        buf.writeln("*/");
        buf.writeln("import \"C\"");
        buf.writeln("import \"unsafe\"");
        buf.newline();
        buf.writeln("var _ unsafe.Pointer");
        flush(out, &buf)
    }

    /// Constant blocks: defines and declared constants, then one block per enum.
    pub fn write_consts<W: Write>(&mut self, out: &mut W) -> Result<(), GenError> {
        let buf = consts::emit(self.model, &self.types);
        flush(out, &buf)
    }

    /// Type declarations.
    pub fn write_typedefs<W: Write>(&mut self, out: &mut W) -> Result<(), GenError> {
        let mut buf = SourceBuffer::new();
        let model = self.model;
        for entry in model.iter() {
            let needs = typedefs::emit(&mut buf, &self.types, entry);
            self.fulfill(&needs)?;
            if let Some((requests, needs)) = typedefs::callback_helpers(&self.types, entry) {
                for request in requests {
                    self.helpers.request(request)?;
                }
                self.fulfill(&needs)?;
            }
        }
        flush(out, &buf)
    }

    /// One proxy function per foreign function.
    pub fn write_declares<W: Write>(&mut self, out: &mut W) -> Result<(), GenError> {
        let mut buf = SourceBuffer::new();
        let model = self.model;
        for entry in model.iter() {
            let needs = declares::emit(&mut buf, &self.types, entry);
            self.fulfill(&needs)?;
        }
        flush(out, &buf)
    }

    /// Run every writer in order.
    pub fn write_all<W: Write>(&mut self, out: &mut W) -> Result<(), GenError> {
        self.write_header(out)?;
        self.write_includes(out)?;
        self.write_consts(out)?;
        self.write_typedefs(out)?;
        self.write_declares(out)?;
        Ok(())
    }

    /// Close the helper channel. Returns the number of helpers requested.
    ///
    /// The monitor drains what is queued and then returns.
    pub fn close(self) -> usize {
        let sent = self.helpers.sent();
        tracing::info!(package = %self.config.package, helpers = sent, "generation closed");
        sent
    }

    /// Request the helpers behind `needs`, including their own dependencies.
    fn fulfill(&mut self, needs: &[Need]) -> Result<(), GenError> {
        for need in needs {
            let name = need.helper_name(self.model);
            if !self.helpers.mark(&name) {
                continue;
            }
            match need {
                Need::CString => {
                    self.helpers
                        .push(HelperRequest::host(name, support::CSTRING_HELPERS))?;
                }
                Need::Slice {
                    cgo_elem,
                    go_elem,
                    managed,
                } => {
                    let text = support::slice_helpers(cgo_elem, go_elem, *managed);
                    self.helpers.push(HelperRequest::host(name, text))?;
                }
                Need::Struct(id) => {
                    let (text, nested) = support::struct_helpers(&self.types, *id);
                    self.helpers.push(HelperRequest::host(name, text))?;
                    self.fulfill(&nested)?;
                }
            }
        }
        Ok(())
    }

    fn callbacks(&self) -> impl Iterator<Item = (&'m Entry, &'m Signature)> {
        let model = self.model;
        model.iter().filter_map(|entry| match &entry.kind {
            EntryKind::Typedef(t) => match &t.target {
                TypeRef::Func(signature) => Some((entry, &**signature)),
                _ => None,
            },
            _ => None,
        })
    }
}

fn flush<W: Write>(out: &mut W, buf: &SourceBuffer) -> Result<(), GenError> {
    out.write_all(buf.as_str().as_bytes())?;
    Ok(())
}

/// `// <name> as declared in <file>:<line>`, or nothing without a position.
fn declared_at(buf: &mut SourceBuffer, what: &str, pos: Option<&SourcePos>) {
    if let Some(pos) = pos {
        let file = Path::new(&pos.file)
            .file_name()
            .map_or(pos.file.as_str(), |name| name.to_str().unwrap_or(&pos.file));
        buf.writeln(&format!("// {what} as declared in {file}:{}", pos.line));
    }
}
