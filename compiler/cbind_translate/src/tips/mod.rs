//! Pointer-tip and memory-tip resolvers.
//!
//! A tip list is an ordered set of [`TipSpec`]s with compiled target patterns.
//! Only the first applicable spec counts; contradictory tips are never merged.

use cbind_ir::{MemoryTip, PointerTip};

use crate::config::{PointerTips, TipSpec};
use crate::pattern::{NameMatcher, RegexMatcher};
use crate::ConfigError;

/// Common behavior of pointer and memory tips.
pub trait Tip: Copy + std::fmt::Debug {
    /// True for the `default` placeholder.
    fn is_placeholder(self) -> bool;
}

impl Tip for PointerTip {
    #[inline]
    fn is_placeholder(self) -> bool {
        PointerTip::is_placeholder(self)
    }
}

impl Tip for MemoryTip {
    #[inline]
    fn is_placeholder(self) -> bool {
        MemoryTip::is_placeholder(self)
    }
}

/// A member of an owner: parameter `index` of a function or field `index` of a
/// struct.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MemberRef<'a> {
    pub index: usize,
    pub name: &'a str,
}

impl<'a> MemberRef<'a> {
    pub fn new(index: usize, name: &'a str) -> Self {
        MemberRef { index, name }
    }
}

/// Outcome of looking a name up in one list.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Lookup<T> {
    /// A spec applied. `None` when it was an explicit `default`.
    Found(Option<T>),
    NotFound,
}

#[derive(Debug)]
struct CompiledTip<T> {
    matcher: RegexMatcher,
    self_tip: Option<T>,
    tips: Vec<T>,
}

/// An ordered, compiled tip list.
#[derive(Debug)]
pub struct TipList<T> {
    specs: Vec<CompiledTip<T>>,
}

impl<T: Tip> TipList<T> {
    pub fn compile(specs: &[TipSpec<T>]) -> Result<Self, ConfigError> {
        let specs = specs
            .iter()
            .map(|spec| {
                Ok(CompiledTip {
                    matcher: RegexMatcher::new(&spec.target)?,
                    self_tip: spec.self_tip,
                    tips: spec.tips.clone(),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(TipList { specs })
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Tip for a member: the owner's positional tip, else the member's own tip.
    fn member(&self, owner: &str, member: MemberRef<'_>) -> Lookup<T> {
        for spec in &self.specs {
            if let Some(&tip) = spec.tips.get(member.index) {
                if !tip.is_placeholder() && spec.matcher.matches(owner) {
                    return Lookup::Found(Some(tip));
                }
            }
            if let Some(tip) = spec.self_tip {
                if spec.matcher.matches(member.name) {
                    return Lookup::Found(Some(tip).filter(|t| !t.is_placeholder()));
                }
            }
        }
        Lookup::NotFound
    }

    /// Tip for a name itself.
    fn owner(&self, name: &str) -> Lookup<T> {
        self.specs
            .iter()
            .find(|spec| spec.self_tip.is_some() && spec.matcher.matches(name))
            .map_or(Lookup::NotFound, |spec| {
                Lookup::Found(spec.self_tip.filter(|t| !t.is_placeholder()))
            })
    }

    fn lookup(&self, owner: &str, member: Option<MemberRef<'_>>) -> Lookup<T> {
        match member {
            Some(member) => self.member(owner, member),
            None => self.owner(owner),
        }
    }
}

/// Pointer-tip scope consulted before the global `any` list.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TipScope {
    Function,
    Struct,
    /// Only the global list.
    Any,
}

/// Resolves pointer and memory tips.
#[derive(Debug)]
pub struct TipResolver {
    function: TipList<PointerTip>,
    structs: TipList<PointerTip>,
    any: TipList<PointerTip>,
    memory: TipList<MemoryTip>,
}

impl TipResolver {
    pub fn new(
        pointer: &PointerTips,
        memory: &[TipSpec<MemoryTip>],
    ) -> Result<Self, ConfigError> {
        Ok(TipResolver {
            function: TipList::compile(&pointer.function)?,
            structs: TipList::compile(&pointer.structs)?,
            any: TipList::compile(&pointer.any)?,
            memory: TipList::compile(memory)?,
        })
    }

    /// Pointer tip for `owner` itself (`member` is `None`) or for one of its
    /// members.
    ///
    /// The scope's own list is consulted first, then the global list.
    pub fn resolve_pointer_tip(
        &self,
        scope: TipScope,
        owner: &str,
        member: Option<MemberRef<'_>>,
    ) -> Option<PointerTip> {
        let scoped = match scope {
            TipScope::Function => Some(&self.function),
            TipScope::Struct => Some(&self.structs),
            TipScope::Any => None,
        };
        for list in scoped.into_iter().chain(Some(&self.any)) {
            if let Lookup::Found(tip) = list.lookup(owner, member) {
                return tip;
            }
        }
        None
    }

    /// Memory tip for a struct (`member` is `None`) or one of its fields.
    pub fn resolve_memory_tip(
        &self,
        owner: &str,
        member: Option<MemberRef<'_>>,
    ) -> Option<MemoryTip> {
        match self.memory.lookup(owner, member) {
            Lookup::Found(tip) => tip,
            Lookup::NotFound => None,
        }
    }
}

#[cfg(test)]
mod tests;
