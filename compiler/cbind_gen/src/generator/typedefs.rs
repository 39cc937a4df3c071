use cbind_ir::{Entry, EntryKind, Scalar, TypeRef};

use super::{declared_at, support};
use crate::convert::{go_ident, Need, Position, TypeMapper};
use crate::helpers::HelperRequest;
use crate::SourceBuffer;

/// Write the Go type declaration for `entry`, if it declares a type.
pub(super) fn emit(buf: &mut SourceBuffer, types: &TypeMapper<'_>, entry: &Entry) -> Vec<Need> {
    match &entry.kind {
        EntryKind::Enum(e) if e.named => {
            let underlying = if e.underlying == Scalar::Int {
                "int32"
            } else {
                "uint32"
            };
            open_decl(buf, entry);
            buf.writeln(&format!("type {} {underlying}", entry.name));
            Vec::new()
        }
        EntryKind::Struct(s) if types.is_managed(entry.id) => {
            let mut needs = Vec::new();
            open_decl(buf, entry);
            buf.open(&format!("type {} struct", entry.name));
            for field in &s.fields {
                let conv = types.field(field);
                buf.writeln(&format!("{} {}", go_ident(&field.name), conv.go));
                needs.extend(conv.needs);
            }
            buf.writeln(&format!("cref *{}", types.cgo_decl_name(entry)));
            buf.close();
            needs.push(Need::Struct(entry.id));
            needs
        }
        EntryKind::Struct(_) => {
            open_decl(buf, entry);
            buf.writeln(&format!("type {} {}", entry.name, types.cgo_decl_name(entry)));
            Vec::new()
        }
        EntryKind::Typedef(t) => match &t.target {
            TypeRef::Func(sig) => {
                let mut needs = Vec::new();
                let mut params = Vec::with_capacity(sig.params.len());
                for (i, ty) in sig.params.iter().enumerate() {
                    let conv = types.conv(ty, None, None, Position::Return);
                    params.push(format!("arg{i} {}", conv.go));
                    needs.extend(conv.needs);
                }
                let ret = if sig.ret.is_void() {
                    String::new()
                } else {
                    format!(" {}", types.conv(&sig.ret, None, None, Position::Param).go)
                };
                open_decl(buf, entry);
                buf.writeln(&format!("type {} func({}){ret}", entry.name, params.join(", ")));
                buf.newline();
                for line in support::callback_pass_ref(types, entry).lines() {
                    buf.writeln(line);
                }
                needs
            }
            TypeRef::Decl(target) => {
                let target = types.conv(&TypeRef::Decl(*target), None, None, Position::Param);
                open_decl(buf, entry);
                buf.writeln(&format!("type {} = {}", entry.name, target.go));
                Vec::new()
            }
            TypeRef::Pointer { .. } => {
                open_decl(buf, entry);
                buf.writeln(&format!("type {} unsafe.Pointer", entry.name));
                Vec::new()
            }
            TypeRef::Scalar(s) => {
                open_decl(buf, entry);
                buf.writeln(&format!("type {} {}", entry.name, s.host_name()));
                Vec::new()
            }
            TypeRef::Void => {
                tracing::debug!(raw = %entry.raw, "void typedef has no Go type");
                Vec::new()
            }
            TypeRef::Unresolved(_) | TypeRef::Array { .. } => {
                open_decl(buf, entry);
                buf.writeln(&format!("type {} {}", entry.name, types.cgo_decl_name(entry)));
                Vec::new()
            }
        },
        EntryKind::Enum(_) | EntryKind::Const(_) | EntryKind::Function(_) => Vec::new(),
    }
}

/// Exported Go entry point and C trampoline of a callback typedef.
pub(super) fn callback_helpers(
    types: &TypeMapper<'_>,
    entry: &Entry,
) -> Option<(Vec<HelperRequest>, Vec<Need>)> {
    let TypeRef::Func(sig) = &entry.as_typedef()?.target else {
        return None;
    };
    let (host, needs) = support::callback_host(types, entry, sig);
    let shim = support::callback_shim(types, entry, sig);
    let requests = vec![
        HelperRequest::host(format!("callback {}", entry.name), host),
        HelperRequest::shim(format!("trampoline {}", entry.raw), shim),
    ];
    Some((requests, needs))
}

fn open_decl(buf: &mut SourceBuffer, entry: &Entry) {
    buf.newline();
    declared_at(buf, &entry.name, entry.pos.as_ref());
}
