//! Pointer and memory tips.
//!
//! Tips are annotations attached to fields, parameters and return values by the
//! tip resolvers. They steer how the generator shapes a foreign pointer or buffer.

use std::fmt;

/// How a foreign pointer is presented to the host.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum PointerTip {
    /// Single object reference, never treated as a sequence.
    Ref,
    /// Pointer to a sized or unsized sequence.
    Arr,
    /// Opaque instance handle.
    Inst,
    /// Placeholder in a positional tip list: leaves the position unannotated.
    Default,
}

impl PointerTip {
    /// Placeholder tips never end up on a member.
    #[inline]
    pub fn is_placeholder(self) -> bool {
        self == PointerTip::Default
    }
}

/// Who owns the memory behind a field or struct.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum MemoryTip {
    /// Foreign-owned memory, not managed by the host.
    Raw,
    /// Placeholder: host-managed memory.
    Default,
}

impl MemoryTip {
    #[inline]
    pub fn is_placeholder(self) -> bool {
        self == MemoryTip::Default
    }
}

impl fmt::Display for PointerTip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PointerTip::Ref => "ref",
            PointerTip::Arr => "arr",
            PointerTip::Inst => "inst",
            PointerTip::Default => "default",
        })
    }
}

impl fmt::Display for MemoryTip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MemoryTip::Raw => "raw",
            MemoryTip::Default => "default",
        })
    }
}
