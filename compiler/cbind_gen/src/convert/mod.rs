//! Mapping between model types and Go/cgo spellings.
//!
//! A [`Conv`] describes one value crossing the boundary: its Go type, its cgo
//! type, and expression templates converting one into the other. Templates hold
//! a single `{}` placeholder for the operand.
//!
//! Memory tips decide managed versus raw semantics, pointer tips decide how a
//! pointer is presented:
//!
//! | pointee               | tip         | Go side                    |
//! |-----------------------|-------------|----------------------------|
//! | `void`                | any         | `unsafe.Pointer`           |
//! | `char`                | not `arr`   | `string`                   |
//! | layout-compatible `T` | `arr` param | `[]T` sharing memory       |
//! | managed struct `S`    | `arr` param | `[]S` copied and packed back |
//! | layout-compatible `T` | ref/none    | `*T`                       |
//! | managed struct `S`    | ref/none    | `*S` through `Ref`/`Deref` |
//! | anything              | `inst`      | `unsafe.Pointer`           |

use cbind_ir::{
    DeclId, Entry, EntryKind, Field, FunctionEntry, MemoryTip, Model, Param, PointerTip, Scalar,
    StructEntry, TypeRef, TypedefEntry,
};

const MAX_ALIAS_DEPTH: usize = 16;

const GO_KEYWORDS: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

/// Where a converted value appears.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Position {
    /// Function parameter: converted Go to C, may be packed back after the call.
    Param,
    /// Function result: converted C to Go.
    Return,
    /// Struct field: converted both ways.
    Field,
}

/// A helper a conversion depends on.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Need {
    /// `unpackPCharString` / `packPCharString`.
    CString,
    /// `unpackArgS<Suffix>` and, for managed elements, `packS<Suffix>`.
    Slice {
        cgo_elem: String,
        go_elem: String,
        managed: bool,
    },
    /// Conversion methods of a managed struct.
    Struct(DeclId),
}

impl Need {
    /// Name the helper is requested under.
    pub fn helper_name(&self, model: &Model) -> String {
        match self {
            Need::CString => "packPCharString".to_string(),
            Need::Slice { cgo_elem, .. } => format!("unpackArgS{}", helper_suffix(cgo_elem)),
            Need::Struct(id) => format!("struct {}", model.get(*id).name),
        }
    }
}

/// Conversion of one value between Go and C.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conv {
    pub go: String,
    pub cgo: String,
    /// Go expression to C expression.
    pub to_c: String,
    /// C expression to Go expression. `None` when the value only travels to C.
    pub from_c: Option<String>,
    /// The C value owns `C.malloc` memory to release after the call.
    pub frees: bool,
    /// Statement run after the call with `{go}` and `{c}` substituted.
    pub pack_back: Option<String>,
    pub needs: Vec<Need>,
}

impl Conv {
    fn new(go: impl Into<String>, cgo: impl Into<String>, to_c: String, from_c: String) -> Self {
        Conv {
            go: go.into(),
            cgo: cgo.into(),
            to_c,
            from_c: Some(from_c),
            frees: false,
            pack_back: None,
            needs: Vec::new(),
        }
    }

    /// The Go side uses the cgo type directly.
    pub fn identity(cgo: impl Into<String>) -> Self {
        let cgo = cgo.into();
        Conv::new(cgo.clone(), cgo, "{}".to_string(), "{}".to_string())
    }

    /// A plain type conversion in both directions.
    pub fn cast(go: &str, cgo: &str) -> Self {
        Conv::new(go, cgo, conversion(cgo, "{}"), conversion(go, "{}"))
    }

    /// The Go side sees an `unsafe.Pointer`.
    pub fn opaque(cgo: impl Into<String>) -> Self {
        let cgo = cgo.into();
        if cgo == "unsafe.Pointer" {
            return Conv::identity(cgo);
        }
        let to_c = conversion(&cgo, "{}");
        Conv::new("unsafe.Pointer", cgo, to_c, "unsafe.Pointer({})".to_string())
    }

    #[inline]
    pub fn apply_to_c(&self, expr: &str) -> String {
        self.to_c.replace("{}", expr)
    }

    #[inline]
    pub fn apply_from_c(&self, expr: &str) -> Option<String> {
        self.from_c.as_ref().map(|t| t.replace("{}", expr))
    }

    pub fn apply_pack_back(&self, go: &str, c: &str) -> Option<String> {
        self.pack_back
            .as_ref()
            .map(|t| t.replace("{go}", go).replace("{c}", c))
    }
}

/// Computes [`Conv`]s and C spellings against a model.
#[derive(Copy, Clone, Debug)]
pub struct TypeMapper<'m> {
    model: &'m Model,
}

impl<'m> TypeMapper<'m> {
    pub fn new(model: &'m Model) -> Self {
        TypeMapper { model }
    }

    pub fn model(&self) -> &'m Model {
        self.model
    }

    pub fn param(&self, param: &Param) -> Conv {
        self.conv(&param.ty, param.ptr_tip, None, Position::Param)
    }

    pub fn field(&self, field: &Field) -> Conv {
        self.conv(&field.ty, field.ptr_tip, field.mem_tip, Position::Field)
    }

    /// Result conversion, `None` for `void`.
    pub fn ret(&self, func: &FunctionEntry) -> Option<Conv> {
        if func.ret.is_void() {
            return None;
        }
        Some(self.conv(&func.ret, func.ret_tip, None, Position::Return))
    }

    /// Conversion of `ty` at `pos`.
    ///
    /// Results and fields always carry a C to Go template; types that cannot
    /// be brought back fall back to `unsafe.Pointer`.
    pub fn conv(
        &self,
        ty: &TypeRef,
        ptr_tip: Option<PointerTip>,
        mem_tip: Option<MemoryTip>,
        pos: Position,
    ) -> Conv {
        let conv = if mem_tip == Some(MemoryTip::Raw) {
            Conv::identity(self.cgo_type(ty))
        } else {
            self.convert(ty, ptr_tip, pos, 0)
        };
        if pos != Position::Param && conv.from_c.is_none() {
            return Conv::opaque(conv.cgo);
        }
        conv
    }

    fn convert(&self, ty: &TypeRef, tip: Option<PointerTip>, pos: Position, depth: usize) -> Conv {
        match ty {
            TypeRef::Void | TypeRef::Func(_) => Conv::opaque(self.cgo_type(ty)),
            TypeRef::Scalar(s) => Conv::cast(s.host_name(), &scalar_cgo(*s)),
            TypeRef::Decl(id) => self.decl_conv(*id, pos, depth),
            TypeRef::Unresolved(_) => Conv::identity(self.cgo_type(ty)),
            TypeRef::Pointer { to, .. } => self.pointer_conv(to, tip, pos, depth),
            TypeRef::Array { elem, len } => self.array_conv(elem, *len, depth),
        }
    }

    fn decl_conv(&self, id: DeclId, pos: Position, depth: usize) -> Conv {
        let entry = self.model.get(id);
        let cgo = self.cgo_decl_name(entry);
        match &entry.kind {
            EntryKind::Struct(s) if is_managed(s) => Conv {
                go: entry.name.clone(),
                cgo,
                to_c: "{}.PassValue()".to_string(),
                from_c: Some(format!("New{}FromC({{}})", entry.name)),
                frees: false,
                pack_back: None,
                needs: vec![Need::Struct(id)],
            },
            EntryKind::Enum(e) if !e.named => Conv::cast(e.underlying.host_name(), &cgo),
            EntryKind::Struct(_) | EntryKind::Enum(_) => Conv::cast(&entry.name, &cgo),
            EntryKind::Typedef(t) => self.typedef_conv(entry, t, cgo, pos, depth),
            EntryKind::Const(_) | EntryKind::Function(_) => Conv::opaque(cgo),
        }
    }

    fn typedef_conv(
        &self,
        entry: &Entry,
        typedef: &TypedefEntry,
        cgo: String,
        pos: Position,
        depth: usize,
    ) -> Conv {
        match &typedef.target {
            TypeRef::Decl(target) if depth < MAX_ALIAS_DEPTH => {
                // `type A = B`: same Go type, distinct cgo spelling
                let inner = self.decl_conv(*target, pos, depth + 1);
                let back = conversion(&inner.cgo, "{}");
                Conv {
                    go: entry.name.clone(),
                    to_c: conversion(&cgo, &inner.to_c),
                    from_c: inner.from_c.map(|t| t.replace("{}", &back)),
                    cgo,
                    frees: inner.frees,
                    pack_back: inner.pack_back,
                    needs: inner.needs,
                }
            }
            TypeRef::Func(_) => Conv {
                go: entry.name.clone(),
                cgo,
                to_c: "{}.PassRef()".to_string(),
                from_c: None,
                frees: false,
                pack_back: None,
                needs: Vec::new(),
            },
            TypeRef::Pointer { .. } => {
                let to_c = conversion(&cgo, "unsafe.Pointer({})");
                let from_c = conversion(&entry.name, "unsafe.Pointer({})");
                Conv::new(entry.name.clone(), cgo, to_c, from_c)
            }
            _ => Conv::cast(&entry.name, &cgo),
        }
    }

    fn pointer_conv(
        &self,
        to: &TypeRef,
        tip: Option<PointerTip>,
        pos: Position,
        depth: usize,
    ) -> Conv {
        let tip = tip.filter(|t| !t.is_placeholder());
        let cgo = self.pointer_cgo(to);
        if to.is_void() || matches!(to, TypeRef::Func(_)) {
            return Conv::opaque(cgo);
        }
        if tip == Some(PointerTip::Inst) {
            return Conv::opaque(cgo);
        }
        if *to == TypeRef::Scalar(Scalar::Char) && tip != Some(PointerTip::Arr) {
            return Conv {
                go: "string".to_string(),
                cgo,
                to_c: "unpackPCharString({})".to_string(),
                from_c: Some("packPCharString({})".to_string()),
                frees: pos == Position::Param,
                pack_back: None,
                needs: vec![Need::CString],
            };
        }

        let slice = tip == Some(PointerTip::Arr) && pos == Position::Param;
        if let Some((go_elem, cgo_elem)) = self.elem_layout(to, depth) {
            if slice {
                let to_c = format!("unpackArgS{}({{}})", helper_suffix(&cgo_elem));
                return Conv {
                    go: format!("[]{go_elem}"),
                    cgo,
                    to_c,
                    from_c: None,
                    frees: false,
                    pack_back: None,
                    needs: vec![Need::Slice {
                        cgo_elem,
                        go_elem,
                        managed: false,
                    }],
                };
            }
            let go = format!("*{go_elem}");
            let to_c = conversion(&cgo, "unsafe.Pointer({})");
            let from_c = conversion(&go, "unsafe.Pointer({})");
            return Conv::new(go, cgo, to_c, from_c);
        }

        if let Some(id) = self.managed_struct(to) {
            let name = self.model.get(id).name.clone();
            if slice {
                let cgo_elem = self.cgo_type(to);
                let suffix = helper_suffix(&cgo_elem);
                return Conv {
                    go: format!("[]{name}"),
                    to_c: conversion(&cgo, &format!("unsafe.Pointer(unpackArgS{suffix}({{}}))")),
                    cgo,
                    from_c: None,
                    frees: true,
                    pack_back: Some(format!(
                        "packS{suffix}({{go}}, (*{cgo_elem})(unsafe.Pointer({{c}})))"
                    )),
                    needs: vec![
                        Need::Slice {
                            cgo_elem,
                            go_elem: name,
                            managed: true,
                        },
                        Need::Struct(id),
                    ],
                };
            }
            if pos == Position::Field {
                // linked structures would be followed without bound
                return Conv::opaque(cgo);
            }
            return Conv {
                go: format!("*{name}"),
                to_c: conversion(&cgo, "unsafe.Pointer({}.Ref())"),
                cgo,
                from_c: Some(format!("New{name}Ref(unsafe.Pointer({{}}))")),
                frees: false,
                pack_back: (pos == Position::Param).then(|| "{go}.Deref()".to_string()),
                needs: vec![Need::Struct(id)],
            };
        }

        Conv::opaque(cgo)
    }

    fn array_conv(&self, elem: &TypeRef, len: Option<u64>, depth: usize) -> Conv {
        let n = len.unwrap_or(0);
        let cgo = format!("[{n}]{}", self.cgo_type(elem));
        match self.elem_layout(elem, depth) {
            Some((go_elem, cgo_elem)) => Conv::new(
                format!("[{n}]{go_elem}"),
                cgo,
                format!("*(*[{n}]{cgo_elem})(unsafe.Pointer(&{{}}))"),
                format!("*(*[{n}]{go_elem})(unsafe.Pointer(&{{}}))"),
            ),
            None => Conv::identity(cgo),
        }
    }

    /// Go and cgo element types sharing one memory layout, if any.
    fn elem_layout(&self, ty: &TypeRef, depth: usize) -> Option<(String, String)> {
        if depth >= MAX_ALIAS_DEPTH {
            return None;
        }
        match ty {
            TypeRef::Scalar(s) => Some((s.host_name().to_string(), scalar_cgo(*s))),
            TypeRef::Decl(id) => {
                let entry = self.model.get(*id);
                let cgo = self.cgo_decl_name(entry);
                match &entry.kind {
                    EntryKind::Struct(s) if !is_managed(s) => Some((entry.name.clone(), cgo)),
                    EntryKind::Enum(e) if e.named => Some((entry.name.clone(), cgo)),
                    EntryKind::Typedef(t) => match &t.target {
                        TypeRef::Func(_) => None,
                        TypeRef::Decl(_) => self
                            .elem_layout(&t.target, depth + 1)
                            .map(|_| (entry.name.clone(), cgo)),
                        _ => Some((entry.name.clone(), cgo)),
                    },
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn managed_struct(&self, ty: &TypeRef) -> Option<DeclId> {
        let TypeRef::Decl(id) = self.model.underlying(ty) else {
            return None;
        };
        self.model
            .get(*id)
            .as_struct()
            .filter(|s| is_managed(s))
            .map(|_| *id)
    }

    /// Returns true if the struct behind `id` is converted field by field.
    pub fn is_managed(&self, id: DeclId) -> bool {
        self.model.get(id).as_struct().is_some_and(is_managed)
    }

    /// cgo spelling of `ty`, e.g. `C.int`, `*C.struct_foo`.
    pub fn cgo_type(&self, ty: &TypeRef) -> String {
        match ty {
            TypeRef::Void => "unsafe.Pointer".to_string(),
            TypeRef::Scalar(s) => scalar_cgo(*s),
            TypeRef::Decl(id) => self.cgo_decl_name(self.model.get(*id)),
            TypeRef::Unresolved(raw) => format!("C.{}", raw.replace(' ', "_")),
            TypeRef::Pointer { to, .. } => self.pointer_cgo(to),
            TypeRef::Array { elem, len: Some(n) } => format!("[{n}]{}", self.cgo_type(elem)),
            TypeRef::Array { elem, len: None } => format!("*{}", self.cgo_type(elem)),
            TypeRef::Func(_) => "*[0]byte".to_string(),
        }
    }

    fn pointer_cgo(&self, to: &TypeRef) -> String {
        match to {
            TypeRef::Void => "unsafe.Pointer".to_string(),
            TypeRef::Func(_) => "*[0]byte".to_string(),
            _ => format!("*{}", self.cgo_type(to)),
        }
    }

    /// cgo name of a type declaration.
    ///
    /// Aggregates named through a typedef use the typedef; others keep their
    /// tag keyword (`C.struct_foo`).
    pub fn cgo_decl_name(&self, entry: &Entry) -> String {
        match &entry.kind {
            EntryKind::Enum(e) if !e.named => scalar_cgo(e.underlying),
            EntryKind::Struct(_) | EntryKind::Enum(_) => match self.tag_keyword(entry) {
                Some(keyword) => format!("C.{keyword}_{}", entry.raw),
                None => format!("C.{}", entry.raw),
            },
            _ => format!("C.{}", entry.raw),
        }
    }

    /// `Some("struct")` when the entry is spelled with its tag keyword.
    fn tag_keyword<'e>(&self, entry: &'e Entry) -> Option<&'e str> {
        let typedef_named =
            entry.key != entry.raw && self.model.lookup(&entry.raw) == Some(entry.id);
        if typedef_named {
            None
        } else {
            entry.key.split(' ').next()
        }
    }

    /// C spelling of `ty` for prototypes written into C sources.
    pub fn c_spelling(&self, ty: &TypeRef) -> String {
        match ty {
            TypeRef::Void => "void".to_string(),
            TypeRef::Scalar(s) => s.c_spelling().to_string(),
            TypeRef::Decl(id) => {
                let entry = self.model.get(*id);
                match &entry.kind {
                    EntryKind::Enum(e) if !e.named => e.underlying.c_spelling().to_string(),
                    EntryKind::Struct(_) | EntryKind::Enum(_) => match self.tag_keyword(entry) {
                        Some(keyword) => format!("{keyword} {}", entry.raw),
                        None => entry.raw.clone(),
                    },
                    _ => entry.raw.clone(),
                }
            }
            TypeRef::Unresolved(raw) => raw.clone(),
            TypeRef::Pointer { to, .. } if matches!(**to, TypeRef::Func(_)) => "void *".to_string(),
            TypeRef::Pointer { to, is_const } => {
                let qualifier = if *is_const { "const " } else { "" };
                format!("{qualifier}{} *", self.c_spelling(to))
            }
            TypeRef::Array { elem, .. } => format!("{} *", self.c_spelling(elem)),
            TypeRef::Func(_) => "void *".to_string(),
        }
    }
}

fn is_managed(s: &StructEntry) -> bool {
    !s.is_raw() && !s.is_union && s.complete
}

fn scalar_cgo(s: Scalar) -> String {
    format!("C.{}", s.cgo_name())
}

/// `ty(expr)`, parenthesizing `ty` unless it is a plain (qualified) identifier.
pub(crate) fn conversion(ty: &str, expr: &str) -> String {
    let plain = ty
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if plain {
        format!("{ty}({expr})")
    } else {
        format!("({ty})({expr})")
    }
}

/// Suffix naming a per-type helper: `C.struct_foo_point` becomes `StructFooPoint`.
pub(crate) fn helper_suffix(cgo: &str) -> String {
    cgo.trim_start_matches("C.")
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect()
}

pub(crate) fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Escape a Go keyword used as an identifier.
pub fn go_ident(name: &str) -> String {
    if name.is_empty() {
        "_".to_string()
    } else if GO_KEYWORDS.contains(&name) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

/// Name cgo gives a C struct field: keywords get a leading underscore.
pub(crate) fn cgo_field(raw: &str) -> String {
    if GO_KEYWORDS.contains(&raw) {
        format!("_{raw}")
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests;
