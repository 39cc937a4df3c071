//! Foreign declaration tree.
//!
//! This is the parser's output: raw identifiers, raw type expressions and raw
//! value expressions, exactly as they appeared in the header. The translator reads
//! it and never mutates it.

use std::fmt;

/// Kind of a foreign declaration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ForeignKind {
    /// `typedef <type> <name>;`
    Typedef,
    /// `struct <tag> { ... };` or a forward declaration `struct <tag>;`
    Struct,
    /// `union <tag> { ... };`
    Union,
    /// `enum <tag> { ... };` (the tag may be empty)
    Enum,
    /// A member of an enum body.
    EnumMember,
    /// A function prototype.
    Function,
    /// A function parameter.
    Param,
    /// A struct or union field.
    Field,
    /// A `const` global with an initializer.
    Const,
    /// An object-like `#define`.
    Macro,
}

impl ForeignKind {
    /// Returns true for struct and union declarations.
    #[inline]
    pub fn is_aggregate(self) -> bool {
        matches!(self, ForeignKind::Struct | ForeignKind::Union)
    }

    /// Keyword used to key tagged declarations (`struct foo`, `enum bar`).
    pub fn tag_keyword(self) -> Option<&'static str> {
        match self {
            ForeignKind::Struct => Some("struct"),
            ForeignKind::Union => Some("union"),
            ForeignKind::Enum => Some("enum"),
            _ => None,
        }
    }
}

impl fmt::Display for ForeignKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ForeignKind::Typedef => "typedef",
            ForeignKind::Struct => "struct",
            ForeignKind::Union => "union",
            ForeignKind::Enum => "enum",
            ForeignKind::EnumMember => "enum member",
            ForeignKind::Function => "function",
            ForeignKind::Param => "parameter",
            ForeignKind::Field => "field",
            ForeignKind::Const => "constant",
            ForeignKind::Macro => "macro",
        };
        f.write_str(s)
    }
}

/// Location of a declaration in its source file.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourcePos {
    /// File name as it should appear in generated comments.
    pub file: String,
    /// 1-based line number.
    pub line: u32,
}

impl SourcePos {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        SourcePos {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A single declaration from the foreign header.
///
/// Aggregates carry their fields in `members`, functions their parameters, enums
/// their members. For functions `ty` is the return type expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForeignDecl {
    pub kind: ForeignKind,
    /// Raw identifier (tag for aggregates, may be empty for anonymous enums and
    /// unnamed parameters).
    pub name: String,
    /// Raw type expression, e.g. `const char *` or `void (*)(int, void *)`.
    pub ty: String,
    /// Raw value expression for enum members, constants and macros.
    pub value: Option<String>,
    /// Fields, parameters or enum members.
    pub members: Vec<ForeignDecl>,
    pub pos: Option<SourcePos>,
    /// Function takes `...`.
    pub variadic: bool,
    /// Aggregate has a body (false for forward declarations).
    pub has_body: bool,
}

impl ForeignDecl {
    /// Create a declaration with no type, value or members.
    pub fn new(kind: ForeignKind, name: impl Into<String>) -> Self {
        ForeignDecl {
            kind,
            name: name.into(),
            ty: String::new(),
            value: None,
            members: Vec::new(),
            pos: None,
            variadic: false,
            has_body: false,
        }
    }

    #[must_use]
    pub fn with_ty(mut self, ty: impl Into<String>) -> Self {
        self.ty = ty.into();
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Append a member. Marks aggregates and enums as having a body.
    #[must_use]
    pub fn with_member(mut self, member: ForeignDecl) -> Self {
        self.members.push(member);
        self.has_body = true;
        self
    }

    #[must_use]
    pub fn with_members(mut self, members: impl IntoIterator<Item = ForeignDecl>) -> Self {
        self.members.extend(members);
        self.has_body = true;
        self
    }

    #[must_use]
    pub fn with_body(mut self) -> Self {
        self.has_body = true;
        self
    }

    #[must_use]
    pub fn at(mut self, pos: SourcePos) -> Self {
        self.pos = Some(pos);
        self
    }

    #[must_use]
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    /// Key under which the declaration is looked up by raw name.
    ///
    /// Tagged declarations live in their own namespace: `struct foo` and a
    /// typedef `foo` are different keys.
    pub fn raw_key(&self) -> String {
        match self.kind.tag_keyword() {
            Some(keyword) => format!("{keyword} {}", self.name),
            None => self.name.clone(),
        }
    }
}

/// The parser's output: ordered top-level declarations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeclarationTree {
    decls: Vec<ForeignDecl>,
    files: Vec<String>,
}

impl DeclarationTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, decl: ForeignDecl) {
        self.decls.push(decl);
    }

    /// Record a source file that contributed declarations.
    pub fn add_file(&mut self, file: impl Into<String>) {
        let file = file.into();
        if !self.files.contains(&file) {
            self.files.push(file);
        }
    }

    pub fn decls(&self) -> &[ForeignDecl] {
        &self.decls
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ForeignDecl> {
        self.decls.iter()
    }
}

impl FromIterator<ForeignDecl> for DeclarationTree {
    fn from_iter<I: IntoIterator<Item = ForeignDecl>>(iter: I) -> Self {
        DeclarationTree {
            decls: iter.into_iter().collect(),
            files: Vec::new(),
        }
    }
}

impl<'a> IntoIterator for &'a DeclarationTree {
    type Item = &'a ForeignDecl;
    type IntoIter = std::slice::Iter<'a, ForeignDecl>;

    fn into_iter(self) -> Self::IntoIter {
        self.decls.iter()
    }
}

#[cfg(test)]
mod tests;
