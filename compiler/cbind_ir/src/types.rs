//! Resolved type references.
//!
//! Types refer to other model entries by [`DeclId`] rather than embedding them:
//! struct graphs can be cyclic through self-referencing pointers.

use crate::model::DeclId;

/// C arithmetic and fixed-width scalar types.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Scalar {
    Bool,
    Char,
    SChar,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    LongLong,
    ULongLong,
    Float,
    Double,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    SizeT,
    SSizeT,
    IntPtr,
    UIntPtr,
    PtrDiff,
}

impl Scalar {
    /// Classify a list of C type-specifier words (`unsigned`, `long`, `uint8_t` ...).
    ///
    /// Returns `None` if any word is not a scalar specifier or the combination is
    /// not a scalar type.
    pub fn from_words<'a, I>(words: I) -> Option<Scalar>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let words: Vec<&str> = words.into_iter().collect();
        if let [single] = words.as_slice() {
            if let Some(fixed) = Self::from_fixed_name(single) {
                return Some(fixed);
            }
        }

        let (mut signed, mut unsigned, mut short, mut long) = (false, false, false, 0u8);
        let (mut char, mut float, mut double) = (false, false, false);
        for word in &words {
            match *word {
                "signed" | "__signed__" => signed = true,
                "unsigned" => unsigned = true,
                "short" => short = true,
                "long" => long += 1,
                "int" => {}
                "char" => char = true,
                "float" => float = true,
                "double" => double = true,
                _ => return None,
            }
        }

        let scalar = if char {
            if unsigned {
                Scalar::UChar
            } else if signed {
                Scalar::SChar
            } else {
                Scalar::Char
            }
        } else if float {
            Scalar::Float
        } else if double {
            Scalar::Double
        } else if short {
            if unsigned {
                Scalar::UShort
            } else {
                Scalar::Short
            }
        } else if long >= 2 {
            if unsigned {
                Scalar::ULongLong
            } else {
                Scalar::LongLong
            }
        } else if long == 1 {
            if unsigned {
                Scalar::ULong
            } else {
                Scalar::Long
            }
        } else if words.is_empty() {
            return None;
        } else if unsigned {
            Scalar::UInt
        } else {
            Scalar::Int
        };
        Some(scalar)
    }

    fn from_fixed_name(name: &str) -> Option<Scalar> {
        Some(match name {
            "_Bool" | "bool" => Scalar::Bool,
            "int8_t" => Scalar::Int8,
            "int16_t" => Scalar::Int16,
            "int32_t" => Scalar::Int32,
            "int64_t" => Scalar::Int64,
            "uint8_t" => Scalar::UInt8,
            "uint16_t" => Scalar::UInt16,
            "uint32_t" => Scalar::UInt32,
            "uint64_t" => Scalar::UInt64,
            "size_t" => Scalar::SizeT,
            "ssize_t" => Scalar::SSizeT,
            "intptr_t" => Scalar::IntPtr,
            "uintptr_t" => Scalar::UIntPtr,
            "ptrdiff_t" => Scalar::PtrDiff,
            _ => return None,
        })
    }

    /// Name of the type as seen through cgo (`C.<name>`).
    pub fn cgo_name(self) -> &'static str {
        match self {
            Scalar::Bool => "_Bool",
            Scalar::Char => "char",
            Scalar::SChar => "schar",
            Scalar::UChar => "uchar",
            Scalar::Short => "short",
            Scalar::UShort => "ushort",
            Scalar::Int => "int",
            Scalar::UInt => "uint",
            Scalar::Long => "long",
            Scalar::ULong => "ulong",
            Scalar::LongLong => "longlong",
            Scalar::ULongLong => "ulonglong",
            Scalar::Float => "float",
            Scalar::Double => "double",
            Scalar::Int8 => "int8_t",
            Scalar::Int16 => "int16_t",
            Scalar::Int32 => "int32_t",
            Scalar::Int64 => "int64_t",
            Scalar::UInt8 => "uint8_t",
            Scalar::UInt16 => "uint16_t",
            Scalar::UInt32 => "uint32_t",
            Scalar::UInt64 => "uint64_t",
            Scalar::SizeT => "size_t",
            Scalar::SSizeT => "ssize_t",
            Scalar::IntPtr => "intptr_t",
            Scalar::UIntPtr => "uintptr_t",
            Scalar::PtrDiff => "ptrdiff_t",
        }
    }

    /// Spelling of the type in C source.
    pub fn c_spelling(self) -> &'static str {
        match self {
            Scalar::SChar => "signed char",
            Scalar::UChar => "unsigned char",
            Scalar::UShort => "unsigned short",
            Scalar::UInt => "unsigned int",
            Scalar::ULong => "unsigned long",
            Scalar::LongLong => "long long",
            Scalar::ULongLong => "unsigned long long",
            other => other.cgo_name(),
        }
    }

    /// Host (Go) type name.
    pub fn host_name(self) -> &'static str {
        match self {
            Scalar::Bool => "bool",
            Scalar::Char | Scalar::UChar | Scalar::UInt8 => "byte",
            Scalar::SChar | Scalar::Int8 => "int8",
            Scalar::Short | Scalar::Int16 => "int16",
            Scalar::UShort | Scalar::UInt16 => "uint16",
            Scalar::Int | Scalar::Int32 => "int32",
            Scalar::UInt | Scalar::UInt32 => "uint32",
            Scalar::Long | Scalar::SSizeT | Scalar::IntPtr | Scalar::PtrDiff => "int",
            Scalar::ULong | Scalar::SizeT => "uint",
            Scalar::LongLong | Scalar::Int64 => "int64",
            Scalar::ULongLong | Scalar::UInt64 => "uint64",
            Scalar::UIntPtr => "uintptr",
            Scalar::Float => "float32",
            Scalar::Double => "float64",
        }
    }

    #[inline]
    pub fn is_float(self) -> bool {
        matches!(self, Scalar::Float | Scalar::Double)
    }

    /// True for the plain, signed and unsigned `char` types.
    #[inline]
    pub fn is_char(self) -> bool {
        matches!(self, Scalar::Char | Scalar::SChar | Scalar::UChar)
    }
}

/// A function signature, used for function-pointer types.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Signature {
    pub ret: TypeRef,
    pub params: Vec<TypeRef>,
    pub variadic: bool,
}

/// A resolved reference to a type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Void,
    Scalar(Scalar),
    /// Another model entry (struct, union, enum, typedef).
    Decl(DeclId),
    /// A name not declared when first seen. Patched after learning; left opaque
    /// when it never gets declared.
    Unresolved(String),
    Pointer {
        to: Box<TypeRef>,
        is_const: bool,
    },
    Array {
        elem: Box<TypeRef>,
        len: Option<u64>,
    },
    /// Function pointer.
    Func(Box<Signature>),
}

impl TypeRef {
    pub fn pointer(to: TypeRef, is_const: bool) -> Self {
        TypeRef::Pointer {
            to: Box::new(to),
            is_const,
        }
    }

    pub fn array(elem: TypeRef, len: Option<u64>) -> Self {
        TypeRef::Array {
            elem: Box::new(elem),
            len,
        }
    }

    #[inline]
    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Void)
    }

    #[inline]
    pub fn is_pointer(&self) -> bool {
        matches!(self, TypeRef::Pointer { .. })
    }

    /// Target of a pointer type.
    pub fn pointee(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Pointer { to, .. } => Some(to),
            _ => None,
        }
    }

    /// Replace every resolvable [`TypeRef::Unresolved`] placeholder.
    ///
    /// Returns the number of placeholders patched.
    pub fn patch_unresolved<F>(&mut self, resolve: &mut F) -> usize
    where
        F: FnMut(&str) -> Option<DeclId>,
    {
        match self {
            TypeRef::Unresolved(raw) => match resolve(raw) {
                Some(id) => {
                    *self = TypeRef::Decl(id);
                    1
                }
                None => 0,
            },
            TypeRef::Pointer { to, .. } => to.patch_unresolved(resolve),
            TypeRef::Array { elem, .. } => elem.patch_unresolved(resolve),
            TypeRef::Func(sig) => {
                let mut patched = sig.ret.patch_unresolved(resolve);
                for param in &mut sig.params {
                    patched += param.patch_unresolved(resolve);
                }
                patched
            }
            TypeRef::Void | TypeRef::Scalar(_) | TypeRef::Decl(_) => 0,
        }
    }
}
