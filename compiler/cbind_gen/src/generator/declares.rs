use cbind_ir::{Entry, EntryKind};

use super::declared_at;
use crate::convert::{go_ident, Need, TypeMapper};
use crate::SourceBuffer;

/// Write the proxy function for `entry`, if it is a function.
pub(super) fn emit(buf: &mut SourceBuffer, types: &TypeMapper<'_>, entry: &Entry) -> Vec<Need> {
    let EntryKind::Function(func) = &entry.kind else {
        return Vec::new();
    };
    if func.variadic {
        tracing::debug!(raw = %entry.raw, "variadic function has no cgo proxy");
        return Vec::new();
    }

    let mut needs = Vec::new();
    let mut signature = Vec::with_capacity(func.params.len());
    let mut body = Vec::new();
    let mut args = Vec::with_capacity(func.params.len());
    let mut after = Vec::new();
    for param in &func.params {
        let conv = types.param(param);
        let go = go_ident(&param.name);
        // reserved prefix, as for `__ret`
        let c = format!("__c{}", param.name);
        signature.push(format!("{go} {}", conv.go));
        body.push(format!("{c} := {}", conv.apply_to_c(&go)));
        if conv.frees {
            body.push(format!("defer C.free(unsafe.Pointer({c}))"));
        }
        if let Some(pack) = conv.apply_pack_back(&go, &c) {
            after.push(pack);
        }
        args.push(c);
        needs.extend(conv.needs);
    }

    let call = format!("C.{}({})", entry.raw, args.join(", "));
    let ret = types.ret(func);
    let head = match &ret {
        Some(conv) => format!("func {}({}) {}", entry.name, signature.join(", "), conv.go),
        None => format!("func {}({})", entry.name, signature.join(", ")),
    };

    buf.newline();
    declared_at(buf, &format!("{} function", entry.name), entry.pos.as_ref());
    buf.open(&head);
    for line in &body {
        buf.writeln(line);
    }
    match ret {
        Some(conv) => {
            buf.writeln(&format!("__ret := {call}"));
            for line in &after {
                buf.writeln(line);
            }
            let back = conv.apply_from_c("__ret").unwrap_or_else(|| "__ret".to_string());
            buf.writeln(&format!("return {back}"));
            needs.extend(conv.needs);
        }
        None => {
            buf.writeln(&call);
            for line in &after {
                buf.writeln(line);
            }
        }
    }
    buf.close();
    needs
}
