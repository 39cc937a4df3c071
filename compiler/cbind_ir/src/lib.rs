//! Shared data structures for the cbind binding generator.
//!
//! Two trees live here:
//!
//! - the **foreign declaration tree** ([`DeclarationTree`]), produced by a header
//!   parser and never mutated afterwards;
//! - the **declaration model** ([`Model`]), populated by the translator's learning
//!   pass and read by the generator.
//!
//! # Architecture
//!
//! ```text
//! header files
//!      ↓
//!  HeaderParser      (cbind_parse)
//!      ↓
//! DeclarationTree    (foreign, raw names and raw type expressions)
//!      ↓
//!   Translator       (cbind_translate: rules, tips, const policy)
//!      ↓
//!     Model          (host names, resolved types, tips, constant values)
//!      ↓
//!   Generator        (cbind_gen)
//! ```

mod foreign;
mod model;
mod tips;
mod types;
mod value;

pub use foreign::{DeclarationTree, ForeignDecl, ForeignKind, SourcePos};
pub use model::{
    ConstEntry, ConstOrigin, DeclId, EnumEntry, EnumMember, Entry, EntryKind, Field,
    FunctionEntry, Model, NameTaken, Namespace, Param, StructEntry, TypedefEntry,
};
pub use tips::{MemoryTip, PointerTip};
pub use types::{Scalar, Signature, TypeRef};
pub use value::ConstValue;
