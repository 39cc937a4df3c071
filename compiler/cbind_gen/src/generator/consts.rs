use std::fmt::Write as _;

use cbind_ir::{ConstValue, Entry, EntryKind, Model, TypeRef};

use super::declared_at;
use crate::convert::TypeMapper;
use crate::SourceBuffer;

pub(super) fn emit(model: &Model, types: &TypeMapper<'_>) -> SourceBuffer {
    let mut buf = SourceBuffer::new();

    let plain: Vec<&Entry> = model.iter().filter(|e| e.as_const().is_some()).collect();
    if !plain.is_empty() {
        open_block(&mut buf);
        for entry in plain {
            let Some(c) = entry.as_const() else { continue };
            let Some(value) = go_literal(&c.value) else {
                tracing::debug!(raw = %entry.raw, "constant has no Go literal");
                continue;
            };
            declared_at(&mut buf, &entry.name, entry.pos.as_ref());
            match c.ty.as_ref().and_then(|ty| const_type(model, types, ty)) {
                Some(ty) => buf.writeln(&format!("{} {ty} = {value}", entry.name)),
                None => buf.writeln(&format!("{} = {value}", entry.name)),
            }
        }
        close_block(&mut buf);
    }

    for entry in model.iter() {
        let EntryKind::Enum(e) = &entry.kind else {
            continue;
        };
        if e.members.is_empty() {
            continue;
        }
        open_block(&mut buf);
        for member in &e.members {
            let Some(value) = go_literal(&member.value) else {
                continue;
            };
            declared_at(&mut buf, &member.name, member.pos.as_ref());
            if e.named {
                buf.writeln(&format!("{} {} = {value}", member.name, entry.name));
            } else {
                buf.writeln(&format!("{} = {value}", member.name));
            }
        }
        close_block(&mut buf);
    }
    buf
}

fn open_block(buf: &mut SourceBuffer) {
    buf.newline();
    buf.writeln("const (");
    buf.indent();
}

fn close_block(buf: &mut SourceBuffer) {
    buf.dedent();
    buf.writeln(")");
}

/// Go type of a typed constant, when it has a numeric one.
fn const_type(model: &Model, types: &TypeMapper<'_>, ty: &TypeRef) -> Option<String> {
    match ty {
        TypeRef::Scalar(s) => Some(s.host_name().to_string()),
        TypeRef::Decl(id) => {
            let entry = model.get(*id);
            let numeric = match &entry.kind {
                EntryKind::Enum(e) => e.named,
                EntryKind::Typedef(_) => matches!(model.underlying(ty), TypeRef::Scalar(_)),
                _ => false,
            };
            numeric.then(|| types.conv(ty, None, None, crate::Position::Param).go)
        }
        _ => None,
    }
}

/// Go spelling of a constant value. `None` for non-finite floats.
pub(super) fn go_literal(value: &ConstValue) -> Option<String> {
    match value {
        ConstValue::Int(v) => Some(v.to_string()),
        ConstValue::Float(v) if v.is_finite() => Some(format!("{v:?}")),
        ConstValue::Float(_) => None,
        ConstValue::Str(s) => Some(go_quote(s)),
        ConstValue::Expr(e) => Some(e.clone()),
    }
}

/// Interpreted Go string literal.
pub(super) fn go_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
