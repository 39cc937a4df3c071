//! Translator configuration.
//!
//! Everything the translator needs is passed in through [`TranslatorConfig`] at
//! construction; there are no global rule tables.

use cbind_ir::{MemoryTip, PointerTip};
use serde::{Deserialize, Serialize};

/// Scope a rule-set applies to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleTarget {
    /// Every identifier, before its own scope.
    Global,
    /// Every identifier, after all other scopes.
    PostGlobal,
    /// Struct, union, enum and typedef names.
    Type,
    /// Constants, enum members and defines.
    Const,
    /// Function names.
    Function,
    /// Struct fields.
    Public,
    /// Function parameters.
    Private,
}

impl RuleTarget {
    pub const ALL: [RuleTarget; 7] = [
        RuleTarget::Global,
        RuleTarget::PostGlobal,
        RuleTarget::Type,
        RuleTarget::Const,
        RuleTarget::Function,
        RuleTarget::Public,
        RuleTarget::Private,
    ];

    /// Rule-sets an identifier of this scope goes through, in order.
    pub fn chain(self) -> &'static [RuleTarget] {
        match self {
            RuleTarget::Global => &[RuleTarget::Global, RuleTarget::PostGlobal],
            RuleTarget::PostGlobal => &[RuleTarget::PostGlobal],
            RuleTarget::Type => &[RuleTarget::Global, RuleTarget::Type, RuleTarget::PostGlobal],
            RuleTarget::Const => &[RuleTarget::Global, RuleTarget::Const, RuleTarget::PostGlobal],
            RuleTarget::Function => &[
                RuleTarget::Global,
                RuleTarget::Function,
                RuleTarget::PostGlobal,
            ],
            RuleTarget::Public => &[RuleTarget::Global, RuleTarget::Public, RuleTarget::PostGlobal],
            RuleTarget::Private => &[
                RuleTarget::Global,
                RuleTarget::Private,
                RuleTarget::PostGlobal,
            ],
        }
    }
}

/// What a matching rule does.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Stop this rule-set, keeping the current identifier.
    Accept,
    /// Rewrite and continue with the next rule.
    #[default]
    Replace,
}

/// One rule as written in the configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleSpec {
    /// Regex the identifier must match. Absent means always match.
    pub from: Option<String>,
    /// Replacement; `$1`-style capture references are expanded.
    pub to: Option<String>,
    /// Named transform applied to the rewritten text.
    pub transform: Option<String>,
    /// Plugin transform name; same as `transform`, used when both are absent.
    pub load: Option<String>,
    pub action: Action,
}

impl RuleSpec {
    /// Transform name, preferring `transform` over `load`.
    pub fn transform_name(&self) -> Option<&str> {
        self.transform.as_deref().or(self.load.as_deref())
    }
}

/// Rule-sets per target.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleSets {
    pub global: Vec<RuleSpec>,
    #[serde(rename = "post-global")]
    pub post_global: Vec<RuleSpec>,
    #[serde(rename = "type")]
    pub types: Vec<RuleSpec>,
    #[serde(rename = "const")]
    pub consts: Vec<RuleSpec>,
    pub function: Vec<RuleSpec>,
    pub public: Vec<RuleSpec>,
    pub private: Vec<RuleSpec>,
}

impl RuleSets {
    pub fn get(&self, target: RuleTarget) -> &[RuleSpec] {
        match target {
            RuleTarget::Global => &self.global,
            RuleTarget::PostGlobal => &self.post_global,
            RuleTarget::Type => &self.types,
            RuleTarget::Const => &self.consts,
            RuleTarget::Function => &self.function,
            RuleTarget::Public => &self.public,
            RuleTarget::Private => &self.private,
        }
    }

    pub fn get_mut(&mut self, target: RuleTarget) -> &mut Vec<RuleSpec> {
        match target {
            RuleTarget::Global => &mut self.global,
            RuleTarget::PostGlobal => &mut self.post_global,
            RuleTarget::Type => &mut self.types,
            RuleTarget::Const => &mut self.consts,
            RuleTarget::Function => &mut self.function,
            RuleTarget::Public => &mut self.public,
            RuleTarget::Private => &mut self.private,
        }
    }
}

/// A tip keyed by a name pattern.
///
/// `self_tip` applies to whatever `target` names directly; `tips` applies by
/// position to the members (parameters, fields) of a matching owner.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, bound(deserialize = "T: Deserialize<'de>"))]
pub struct TipSpec<T> {
    pub target: String,
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_tip: Option<T>,
    #[serde(default = "Vec::new", skip_serializing_if = "Vec::is_empty")]
    pub tips: Vec<T>,
}

impl<T> TipSpec<T> {
    pub fn new(target: impl Into<String>) -> Self {
        TipSpec {
            target: target.into(),
            self_tip: None,
            tips: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_self(mut self, tip: T) -> Self {
        self.self_tip = Some(tip);
        self
    }

    #[must_use]
    pub fn with_tips(mut self, tips: impl IntoIterator<Item = T>) -> Self {
        self.tips = tips.into_iter().collect();
        self
    }
}

/// Pointer-tip scopes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PointerTips {
    pub function: Vec<TipSpec<PointerTip>>,
    #[serde(rename = "struct")]
    pub structs: Vec<TipSpec<PointerTip>>,
    /// Consulted after the function or struct scope.
    pub any: Vec<TipSpec<PointerTip>>,
}

/// Constant handling mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstMode {
    /// Compute a literal at learning time.
    Eval,
    /// Keep the expression for the host toolchain.
    Expand,
}

/// Declaration kinds that carry constant values.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConstScope {
    Enum,
    Decl,
    Define,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConstRules {
    #[serde(rename = "enum")]
    pub enums: ConstMode,
    pub decl: ConstMode,
    pub define: ConstMode,
}

impl Default for ConstRules {
    fn default() -> Self {
        ConstRules {
            enums: ConstMode::Eval,
            decl: ConstMode::Expand,
            define: ConstMode::Expand,
        }
    }
}

impl ConstRules {
    pub fn mode(&self, scope: ConstScope) -> ConstMode {
        match scope {
            ConstScope::Enum => self.enums,
            ConstScope::Decl => self.decl,
            ConstScope::Define => self.define,
        }
    }
}

/// Complete translator configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranslatorConfig {
    pub const_rules: ConstRules,
    pub ptr_tips: PointerTips,
    pub mem_tips: Vec<TipSpec<MemoryTip>>,
    pub rules: RuleSets,
    /// Raw identifiers matching any of these patterns are not translated.
    pub ignored: Vec<String>,
}
