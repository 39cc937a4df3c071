//! The declaration model: translated symbols ready for generation.
//!
//! Entries are created once per foreign declaration during the learning pass and
//! are read-only afterwards. Entries reference each other through [`DeclId`]
//! indices into one flat arena.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::{ConstValue, MemoryTip, PointerTip, Scalar, SourcePos, TypeRef};

/// Maximum typedef chain followed by [`Model::underlying`].
const MAX_ALIAS_DEPTH: usize = 32;

/// Index of an entry in the model arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct DeclId(u32);

impl DeclId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        DeclId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeclId({})", self.0)
    }
}

/// Where a constant came from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConstOrigin {
    /// Object-like `#define`.
    Define,
    /// `const` global with an initializer.
    Decl,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConstEntry {
    pub origin: ConstOrigin,
    /// Declared type for `const` globals; defines are untyped.
    pub ty: Option<TypeRef>,
    pub value: ConstValue,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnumMember {
    pub raw: String,
    pub name: String,
    pub value: ConstValue,
    pub pos: Option<SourcePos>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnumEntry {
    /// Anonymous enums only contribute constants, no host type.
    pub named: bool,
    pub underlying: Scalar,
    pub members: Vec<EnumMember>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub raw: String,
    pub name: String,
    pub ty: TypeRef,
    pub ptr_tip: Option<PointerTip>,
    pub mem_tip: Option<MemoryTip>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructEntry {
    pub is_union: bool,
    /// False for forward declarations that never got a body.
    pub complete: bool,
    pub fields: Vec<Field>,
    pub mem_tip: Option<MemoryTip>,
}

impl StructEntry {
    /// Raw structs are aliases of the foreign type, not host-managed copies.
    #[inline]
    pub fn is_raw(&self) -> bool {
        self.mem_tip == Some(MemoryTip::Raw)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypedefEntry {
    pub target: TypeRef,
    pub ptr_tip: Option<PointerTip>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub raw: String,
    pub name: String,
    pub ty: TypeRef,
    pub ptr_tip: Option<PointerTip>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionEntry {
    pub params: Vec<Param>,
    pub ret: TypeRef,
    pub ret_tip: Option<PointerTip>,
    pub variadic: bool,
}

/// Category-specific part of an entry.
#[derive(Clone, Debug, PartialEq)]
pub enum EntryKind {
    Const(ConstEntry),
    Enum(EnumEntry),
    Struct(StructEntry),
    Typedef(TypedefEntry),
    Function(FunctionEntry),
}

/// A translated declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub id: DeclId,
    /// Lookup key (`struct foo` for tagged declarations, the raw name otherwise).
    pub key: String,
    /// Raw identifier as written in the header.
    pub raw: String,
    /// Canonical host identifier.
    pub name: String,
    pub pos: Option<SourcePos>,
    pub kind: EntryKind,
}

impl Entry {
    pub fn as_struct(&self) -> Option<&StructEntry> {
        match &self.kind {
            EntryKind::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionEntry> {
        match &self.kind {
            EntryKind::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumEntry> {
        match &self.kind {
            EntryKind::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_const(&self) -> Option<&ConstEntry> {
        match &self.kind {
            EntryKind::Const(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_typedef(&self) -> Option<&TypedefEntry> {
        match &self.kind {
            EntryKind::Typedef(t) => Some(t),
            _ => None,
        }
    }

    /// True for entries that define a host type.
    pub fn is_type(&self) -> bool {
        match &self.kind {
            EntryKind::Struct(_) | EntryKind::Typedef(_) => true,
            EntryKind::Enum(e) => e.named,
            EntryKind::Const(_) | EntryKind::Function(_) => false,
        }
    }
}

/// Arena of translated declarations with a raw-key index.
#[derive(Clone, Debug, Default)]
pub struct Model {
    entries: Vec<Entry>,
    by_key: FxHashMap<String, DeclId>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and index it under `key`.
    pub fn push(
        &mut self,
        key: impl Into<String>,
        raw: impl Into<String>,
        name: impl Into<String>,
        pos: Option<SourcePos>,
        kind: EntryKind,
    ) -> DeclId {
        let index = u32::try_from(self.entries.len()).unwrap_or(u32::MAX);
        let id = DeclId::new(index);
        let key = key.into();
        self.by_key.insert(key.clone(), id);
        self.entries.push(Entry {
            id,
            key,
            raw: raw.into(),
            name: name.into(),
            pos,
            kind,
        });
        id
    }

    /// Index an existing entry under an additional key (typedef aliases).
    pub fn alias(&mut self, key: impl Into<String>, id: DeclId) {
        self.by_key.insert(key.into(), id);
    }

    #[inline]
    pub fn get(&self, id: DeclId) -> &Entry {
        &self.entries[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: DeclId) -> &mut Entry {
        &mut self.entries[id.index()]
    }

    /// Look up an entry by raw key.
    pub fn lookup(&self, key: &str) -> Option<DeclId> {
        self.by_key.get(key).copied()
    }

    /// Find an entry by its host name.
    pub fn find(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace placeholders whose raw names were declared later in the pass.
    ///
    /// Returns the number of references patched.
    pub fn patch_forward_refs(&mut self) -> usize {
        let by_key = &self.by_key;
        let mut resolve = |raw: &str| by_key.get(raw).copied();
        let mut patched = 0;
        for entry in &mut self.entries {
            match &mut entry.kind {
                EntryKind::Const(c) => {
                    if let Some(ty) = &mut c.ty {
                        patched += ty.patch_unresolved(&mut resolve);
                    }
                }
                EntryKind::Enum(_) => {}
                EntryKind::Struct(s) => {
                    for field in &mut s.fields {
                        patched += field.ty.patch_unresolved(&mut resolve);
                    }
                }
                EntryKind::Typedef(t) => patched += t.target.patch_unresolved(&mut resolve),
                EntryKind::Function(f) => {
                    patched += f.ret.patch_unresolved(&mut resolve);
                    for param in &mut f.params {
                        patched += param.ty.patch_unresolved(&mut resolve);
                    }
                }
            }
        }
        patched
    }

    /// Follow typedef aliases down to the type they name.
    ///
    /// Stops at structs, enums and function pointers; also stops after a bounded
    /// number of steps so a malformed cyclic chain cannot loop.
    pub fn underlying<'a>(&'a self, ty: &'a TypeRef) -> &'a TypeRef {
        let mut current = ty;
        for _ in 0..MAX_ALIAS_DEPTH {
            let TypeRef::Decl(id) = current else {
                return current;
            };
            match &self.get(*id).kind {
                EntryKind::Typedef(t) => current = &t.target,
                _ => return current,
            }
        }
        current
    }
}

/// Error returned by [`Namespace::claim`] when a name already has an owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameTaken {
    pub name: String,
    /// Declaration that owns the name.
    pub existing: String,
}

/// A set of host identifiers and the declarations that claimed them.
///
/// Owners are declaration keys (`struct foo`, `foo`), so a tag and an ordinary
/// identifier spelled alike are distinct owners.
#[derive(Clone, Debug, Default)]
pub struct Namespace {
    owners: FxHashMap<String, String>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `name` for `owner`. Claiming again for the same owner is a no-op.
    pub fn claim(&mut self, name: &str, owner: &str) -> Result<(), NameTaken> {
        match self.owners.get(name) {
            Some(existing) if existing != owner => Err(NameTaken {
                name: name.to_string(),
                existing: existing.clone(),
            }),
            Some(_) => Ok(()),
            None => {
                self.owners.insert(name.to_string(), owner.to_string());
                Ok(())
            }
        }
    }

    /// Give up a previously claimed name.
    pub fn release(&mut self, name: &str) {
        self.owners.remove(name);
    }

    pub fn owner(&self, name: &str) -> Option<&str> {
        self.owners.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

#[cfg(test)]
mod tests;
