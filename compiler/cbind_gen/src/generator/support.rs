//! Helper source texts.

use std::fmt::Write as _;

use cbind_ir::{DeclId, Entry, Signature};

use crate::convert::{cgo_field, go_ident, helper_suffix, Need, Position, TypeMapper};
use crate::{GeneratorConfig, GENERATED_BANNER};

pub(super) const CSTRING_HELPERS: &str = "\
// unpackPCharString copies str into C memory allocated with C.malloc.
func unpackPCharString(str string) *C.char {
\treturn C.CString(str)
}

// packPCharString copies a NUL-terminated C string into a Go string.
func packPCharString(p *C.char) string {
\tif p == nil {
\t\treturn \"\"
\t}
\treturn C.GoString(p)
}
";

/// Head of the Go helper file.
pub(super) fn host_preamble(config: &GeneratorConfig) -> String {
    let mut text = format!("{GENERATED_BANNER}\n\npackage {}\n\n/*\n", config.package);
    for line in config.include_lines() {
        text.push_str(&line);
        text.push('\n');
    }
    text.push_str("#include <stdlib.h>\n*/\nimport \"C\"\nimport \"unsafe\"\n\nvar _ unsafe.Pointer\n");
    text
}

/// Head of the C shim file.
pub(super) fn shim_preamble(config: &GeneratorConfig) -> String {
    let mut text = format!("{GENERATED_BANNER}\n\n");
    for line in config.include_lines() {
        text.push_str(&line);
        text.push('\n');
    }
    text.push_str("#include <stdlib.h>\n#include \"_cgo_export.h\"\n");
    text
}

/// `unpackArgS<Suffix>`, plus `packS<Suffix>` for managed elements.
pub(super) fn slice_helpers(cgo_elem: &str, go_elem: &str, managed: bool) -> String {
    let suffix = helper_suffix(cgo_elem);
    let mut text = String::new();
    if !managed {
        let _ = write!(
            text,
            "// unpackArgS{suffix} returns a pointer to the first element of x, sharing its memory.
func unpackArgS{suffix}(x []{go_elem}) *{cgo_elem} {{
\tif len(x) == 0 {{
\t\treturn nil
\t}}
\treturn (*{cgo_elem})(unsafe.Pointer(&x[0]))
}}
"
        );
        return text;
    }
    let _ = write!(
        text,
        "// unpackArgS{suffix} copies x into C memory released by the caller.
func unpackArgS{suffix}(x []{go_elem}) *{cgo_elem} {{
\tif len(x) == 0 {{
\t\treturn nil
\t}}
\tvar zero {cgo_elem}
\tmem := (*{cgo_elem})(C.calloc(C.size_t(len(x)), C.size_t(unsafe.Sizeof(zero))))
\titems := unsafe.Slice(mem, len(x))
\tfor i := range x {{
\t\titems[i] = x[i].PassValue()
\t}}
\treturn mem
}}

// packS{suffix} copies C elements back into v.
func packS{suffix}(v []{go_elem}, ptr *{cgo_elem}) {{
\tif ptr == nil {{
\t\treturn
\t}}
\titems := unsafe.Slice(ptr, len(v))
\tfor i := range v {{
\t\tv[i] = New{go_elem}FromC(items[i])
\t}}
}}
"
    );
    text
}

/// Conversion methods of a managed struct and the helpers its fields need.
pub(super) fn struct_helpers(types: &TypeMapper<'_>, id: DeclId) -> (String, Vec<Need>) {
    let entry = types.model().get(id);
    let name = &entry.name;
    let cgo = types.cgo_decl_name(entry);
    let mut needs = Vec::new();
    let mut to_c = String::new();
    let mut from_c = String::new();
    for field in entry.as_struct().map(|s| s.fields.as_slice()).unwrap_or_default() {
        let conv = types.field(field);
        let go_field = format!("x.{}", go_ident(&field.name));
        let c_field = format!("ref.{}", cgo_field(&field.raw));
        let _ = writeln!(to_c, "\t{c_field} = {}", conv.apply_to_c(&go_field));
        if let Some(back) = conv.apply_from_c(&c_field) {
            let _ = writeln!(from_c, "\t{go_field} = {back}");
        }
        needs.extend(conv.needs);
    }

    let text = format!(
        "// PassValue returns a C copy of x. Strings are copied into C memory owned by the caller.
func (x {name}) PassValue() {cgo} {{
\tvar ref {cgo}
{to_c}\treturn ref
}}

// New{name}FromC copies a C value into a new {name}.
func New{name}FromC(ref {cgo}) {name} {{
\tvar x {name}
{from_c}\treturn x
}}

// Ref returns a C copy of x that stays valid until Free.
func (x *{name}) Ref() *{cgo} {{
\tif x == nil {{
\t\treturn nil
\t}}
\tif x.cref == nil {{
\t\tx.cref = (*{cgo})(C.calloc(1, C.size_t(unsafe.Sizeof(*x.cref))))
\t}}
\t*x.cref = x.PassValue()
\treturn x.cref
}}

// Deref refreshes x from the C memory behind Ref.
func (x *{name}) Deref() {{
\tif x == nil || x.cref == nil {{
\t\treturn
\t}}
\tref := x.cref
\t*x = New{name}FromC(*ref)
\tx.cref = ref
}}

// Free releases the C copy made by Ref.
func (x *{name}) Free() {{
\tif x != nil && x.cref != nil {{
\t\tC.free(unsafe.Pointer(x.cref))
\t\tx.cref = nil
\t}}
}}

// New{name}Ref copies the C value at ref into a new {name} bound to it.
func New{name}Ref(ref unsafe.Pointer) *{name} {{
\tif ref == nil {{
\t\treturn nil
\t}}
\tptr := (*{cgo})(ref)
\tx := New{name}FromC(*ptr)
\tx.cref = ptr
\treturn &x
}}
"
    );
    (text, needs)
}

/// Package variable holding the Go function behind a callback typedef.
pub(super) fn callback_var(entry: &Entry) -> String {
    let mut chars = entry.name.chars();
    let head: String = chars.next().map(|c| c.to_ascii_lowercase()).into_iter().collect();
    format!("{head}{}Func", chars.as_str())
}

/// `<ret> <raw>_trampoline(<params>)`
pub(super) fn trampoline_prototype(types: &TypeMapper<'_>, entry: &Entry, sig: &Signature) -> String {
    let params = if sig.params.is_empty() {
        "void".to_string()
    } else {
        sig.params
            .iter()
            .enumerate()
            .map(|(i, ty)| format!("{} arg{i}", types.c_spelling(ty)))
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!("{} {}_trampoline({params})", types.c_spelling(&sig.ret), entry.raw)
}

/// Exported Go entry point called by the trampoline.
pub(super) fn callback_host(types: &TypeMapper<'_>, entry: &Entry, sig: &Signature) -> (String, Vec<Need>) {
    let var = callback_var(entry);
    let mut needs = Vec::new();
    let mut params = Vec::with_capacity(sig.params.len());
    let mut args = Vec::with_capacity(sig.params.len());
    for (i, ty) in sig.params.iter().enumerate() {
        let conv = types.conv(ty, None, None, Position::Return);
        params.push(format!("carg{i} {}", conv.cgo));
        args.push(conv.apply_from_c(&format!("carg{i}")).unwrap_or_default());
        needs.extend(conv.needs);
    }
    let call = format!("{var}({})", args.join(", "));

    let mut text = format!("var {var} {}\n\n", entry.name);
    let _ = writeln!(text, "//export {}_go", entry.raw);
    if sig.ret.is_void() {
        let _ = write!(
            text,
            "func {}_go({}) {{
\tif {var} == nil {{
\t\treturn
\t}}
\t{call}
}}
",
            entry.raw,
            params.join(", ")
        );
    } else {
        let ret = types.conv(&sig.ret, None, None, Position::Param);
        let _ = write!(
            text,
            "func {}_go({}) {} {{
\tvar zero {}
\tif {var} == nil {{
\t\treturn zero
\t}}
\treturn {}
}}
",
            entry.raw,
            params.join(", "),
            ret.cgo,
            ret.cgo,
            ret.apply_to_c(&call)
        );
        needs.extend(ret.needs);
    }
    (text, needs)
}

/// C trampoline forwarding to the exported Go function.
pub(super) fn callback_shim(types: &TypeMapper<'_>, entry: &Entry, sig: &Signature) -> String {
    let args = (0..sig.params.len())
        .map(|i| format!("arg{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let call = format!("{}_go({args})", entry.raw);
    let body = if sig.ret.is_void() {
        format!("{call};")
    } else {
        format!("return {call};")
    };
    format!(
        "{} {{\n\t{body}\n}}\n",
        trampoline_prototype(types, entry, sig)
    )
}

/// `PassRef` method registering a Go function as the callback.
pub(super) fn callback_pass_ref(types: &TypeMapper<'_>, entry: &Entry) -> String {
    let cgo = types.cgo_decl_name(entry);
    format!(
        "// PassRef registers x as the {name} callback and returns its C trampoline.
func (x {name}) PassRef() {cgo} {{
\t{var} = x
\treturn {cgo}(C.{raw}_trampoline)
}}
",
        name = entry.name,
        var = callback_var(entry),
        raw = entry.raw,
    )
}
