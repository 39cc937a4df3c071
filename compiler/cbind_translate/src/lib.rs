//! Translation from a foreign declaration tree to the declaration model.
//!
//! The [`Translator`] owns the compiled configuration:
//!
//! - a [`RuleEngine`] that rewrites raw identifiers into host identifiers,
//!   per target (`type`, `const`, `function`, `public`, `private`) on top of the
//!   `global` and `post-global` sets;
//! - a [`TipResolver`] answering pointer and memory tips by owner and member;
//! - a [`ConstPolicy`] choosing between evaluating a constant expression and
//!   expanding it for the host toolchain.
//!
//! Learning is a single pass. Name collisions are fatal; declarations the
//! translator cannot express are skipped and reported as [`Diagnostic`]s.

mod config;
mod consts;
mod ctype;
mod error;
mod pattern;
mod rules;
mod tips;
mod transform;
mod translator;

pub use config::{
    Action, ConstMode, ConstRules, ConstScope, PointerTips, RuleSets, RuleSpec, RuleTarget,
    TipSpec, TranslatorConfig,
};
pub use consts::{eval_text, expand, ConstEnv, ConstPolicy, KnownConsts};
pub use ctype::{parse_type, BaseSpec, CType, TypeParseError};
pub use error::{ConfigError, ConstEvalError, Diagnostic, Severity, TranslateError};
pub use pattern::{LiteralMatcher, NameMatcher, RegexMatcher};
pub use rules::RuleEngine;
pub use tips::{MemberRef, Tip, TipList, TipResolver, TipScope};
pub use transform::{
    camel_case, pascal_case, snake_case, split_words, Builtin, NamingConvention, Transform,
    TransformRegistry,
};
pub use translator::Translator;
