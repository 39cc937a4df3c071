//! The learning pass: declaration tree in, declaration model out.
//!
//! One pass over the tree in declaration order. Type references to names not
//! seen yet become placeholders, patched once the pass is complete. Every host
//! identifier is claimed in a namespace: package-level for top-level entries,
//! per owner for fields and parameters. A clash aborts learning.

mod types;

use cbind_ir::{
    ConstEntry, ConstOrigin, ConstValue, DeclarationTree, EntryKind, EnumEntry, EnumMember, Field,
    ForeignDecl, ForeignKind, FunctionEntry, MemoryTip, Model, NameTaken, Namespace, Param,
    PointerTip, Scalar, StructEntry, TypeRef, TypedefEntry,
};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::{ConstMode, ConstScope, RuleTarget, TranslatorConfig};
use crate::consts::{eval_text, ConstEnv, ConstPolicy, KnownConsts};
use crate::ctype::{parse_type, BaseSpec, CType};
use crate::pattern::{NameMatcher, RegexMatcher};
use crate::rules::RuleEngine;
use crate::tips::{MemberRef, TipResolver, TipScope};
use crate::transform::TransformRegistry;
use crate::{ConfigError, Diagnostic, TranslateError};

/// Translates a declaration tree into a [`Model`].
#[derive(Debug)]
pub struct Translator {
    rules: RuleEngine,
    tips: TipResolver,
    consts: ConstPolicy,
    ignored: Vec<RegexMatcher>,
    model: Model,
    namespace: Namespace,
    known: KnownConsts,
    /// Aggregate key (`struct foo`) to the typedef that names it.
    aliases: FxHashMap<String, String>,
    /// Typedef names consumed as aggregate aliases.
    alias_names: FxHashSet<String>,
    diagnostics: Vec<Diagnostic>,
    learned: bool,
}

impl Translator {
    /// Compile `config` with the bundled transform plugins.
    pub fn new(config: &TranslatorConfig) -> Result<Self, ConfigError> {
        Self::with_registry(config, TransformRegistry::default())
    }

    /// Compile `config`, resolving transform names against `registry`.
    pub fn with_registry(
        config: &TranslatorConfig,
        registry: TransformRegistry,
    ) -> Result<Self, ConfigError> {
        let ignored = config
            .ignored
            .iter()
            .map(|pattern| RegexMatcher::new(pattern))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Translator {
            rules: RuleEngine::new(&config.rules, registry)?,
            tips: TipResolver::new(&config.ptr_tips, &config.mem_tips)?,
            consts: ConstPolicy::new(config.const_rules),
            ignored,
            model: Model::new(),
            namespace: Namespace::new(),
            known: KnownConsts::new(),
            aliases: FxHashMap::default(),
            alias_names: FxHashSet::default(),
            diagnostics: Vec::new(),
            learned: false,
        })
    }

    /// Translate every declaration of `tree` into the model.
    ///
    /// May be called once per translator.
    pub fn learn(&mut self, tree: &DeclarationTree) -> Result<(), TranslateError> {
        if self.learned {
            return Err(TranslateError::AlreadyLearned);
        }
        self.learned = true;
        self.collect_aliases(tree);

        for decl in tree {
            if self.is_ignored(&decl.name) {
                tracing::debug!(raw = %decl.name, "ignored by configuration");
                continue;
            }
            match decl.kind {
                ForeignKind::Macro => self.learn_const(decl, ConstOrigin::Define)?,
                ForeignKind::Const => self.learn_const(decl, ConstOrigin::Decl)?,
                ForeignKind::Enum => self.learn_enum(decl)?,
                ForeignKind::Struct | ForeignKind::Union => self.learn_struct(decl)?,
                ForeignKind::Typedef => self.learn_typedef(decl)?,
                ForeignKind::Function => self.learn_function(decl)?,
                ForeignKind::EnumMember | ForeignKind::Field | ForeignKind::Param => {
                    tracing::debug!(raw = %decl.name, kind = %decl.kind, "stray member declaration");
                }
            }
        }

        let patched = self.model.patch_forward_refs();
        tracing::info!(
            entries = self.model.len(),
            patched,
            diagnostics = self.diagnostics.len(),
            "learned declaration tree"
        );
        Ok(())
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn into_model(self) -> Model {
        self.model
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn rules(&self) -> &RuleEngine {
        &self.rules
    }

    pub fn tips(&self) -> &TipResolver {
        &self.tips
    }

    fn is_ignored(&self, raw: &str) -> bool {
        !raw.is_empty() && self.ignored.iter().any(|m| m.matches(raw))
    }

    /// Find typedefs of exactly a tagged aggregate declared in the tree.
    fn collect_aliases(&mut self, tree: &DeclarationTree) {
        let declared: FxHashSet<String> = tree
            .iter()
            .filter(|d| d.kind.tag_keyword().is_some() && !d.name.is_empty())
            .map(ForeignDecl::raw_key)
            .collect();
        for decl in tree.iter().filter(|d| d.kind == ForeignKind::Typedef) {
            if self.is_ignored(&decl.name) {
                continue;
            }
            let Ok(CType::Base {
                spec: BaseSpec::Tagged { keyword, tag },
                is_const: false,
            }) = parse_type(&decl.ty)
            else {
                continue;
            };
            let key = format!("{keyword} {tag}");
            if declared.contains(&key) && !self.aliases.contains_key(&key) {
                self.alias_names.insert(decl.name.clone());
                self.aliases.insert(key, decl.name.clone());
            }
        }
    }

    /// Claim a package-level name for the declaration keyed `key`.
    fn claim(&mut self, name: &str, key: &str) -> Result<(), TranslateError> {
        self.namespace.claim(name, key).map_err(|taken| collision(taken, key))
    }

    fn skip(&mut self, raw: &str, message: impl Into<String>) {
        let diagnostic = Diagnostic::skipped(raw, message);
        tracing::debug!(%diagnostic);
        self.diagnostics.push(diagnostic);
    }

    fn warn(&mut self, raw: &str, message: impl Into<String>) {
        let diagnostic = Diagnostic::warning(raw, message);
        tracing::warn!(%diagnostic);
        self.diagnostics.push(diagnostic);
    }

    // === Constants ===

    fn learn_const(&mut self, decl: &ForeignDecl, origin: ConstOrigin) -> Result<(), TranslateError> {
        let raw = decl.name.as_str();
        let scope = match origin {
            ConstOrigin::Define => ConstScope::Define,
            ConstOrigin::Decl => ConstScope::Decl,
        };
        let text = decl.value.as_deref().unwrap_or_default();
        let value = match self.consts.evaluate(scope, text, &self.known) {
            Ok(value) => value,
            Err(err) => {
                self.skip(raw, format!("cannot translate value `{text}`: {err}"));
                return Ok(());
            }
        };
        let ty = match origin {
            ConstOrigin::Define => None,
            ConstOrigin::Decl => self.resolve_type_text(&decl.ty).ok(),
        };

        let name = self.rules.resolve(RuleTarget::Const, raw);
        self.claim(&name, raw)?;
        let evaluated = self.evaluated(&value, text);
        self.known.insert(raw, name.as_str(), evaluated);
        tracing::debug!(raw, name = %name, "constant");
        self.model.push(
            raw,
            raw,
            name,
            decl.pos.clone(),
            EntryKind::Const(ConstEntry { origin, ty, value }),
        );
        Ok(())
    }

    /// Numeric value for later references, even when the constant is expanded.
    fn evaluated(&self, value: &ConstValue, text: &str) -> Option<ConstValue> {
        if value.is_expr() {
            eval_text(text, &self.known).ok()
        } else {
            Some(value.clone())
        }
    }

    fn learn_enum(&mut self, decl: &ForeignDecl) -> Result<(), TranslateError> {
        let named = !decl.name.is_empty();
        let key = if named {
            decl.raw_key()
        } else {
            format!("enum <anonymous {}>", self.model.len())
        };
        if named && self.model.lookup(&key).is_some() {
            tracing::debug!(key = %key, "duplicate enum");
            return Ok(());
        }
        let alias = self.aliases.get(&key).cloned();
        let raw = alias.clone().unwrap_or_else(|| decl.name.clone());
        let name = if named {
            let name = self.rules.resolve(RuleTarget::Type, &raw);
            self.claim(&name, &key)?;
            name
        } else {
            String::new()
        };

        let mode = self.consts.mode(ConstScope::Enum);
        let mut members = Vec::with_capacity(decl.members.len());
        // (evaluated value, host name) of the previous member; no name when it
        // was skipped
        let mut prev: Option<(Option<i64>, Option<String>)> = None;
        for member in &decl.members {
            if self.is_ignored(&member.name) {
                continue;
            }
            let value = match (&member.value, &prev) {
                (Some(text), _) => match self.consts.evaluate(ConstScope::Enum, text, &self.known) {
                    Ok(value) => value,
                    Err(err) => {
                        self.skip(&member.name, format!("cannot translate value `{text}`: {err}"));
                        prev = Some((None, None));
                        continue;
                    }
                },
                (None, None) if mode == ConstMode::Eval => ConstValue::Int(0),
                (None, None) => ConstValue::Expr("0".to_string()),
                (None, Some((_, Some(prev_name)))) if mode == ConstMode::Expand => {
                    ConstValue::Expr(format!("{prev_name} + 1"))
                }
                (None, Some((Some(prev_value), _))) => match prev_value.checked_add(1) {
                    Some(next) => ConstValue::Int(next),
                    None => {
                        self.skip(&member.name, "implicit value overflows");
                        prev = Some((None, None));
                        continue;
                    }
                },
                (None, Some((None, _))) => {
                    self.skip(&member.name, "previous member has no evaluated value");
                    prev = Some((None, None));
                    continue;
                }
            };
            let evaluated = match (&member.value, &prev) {
                (Some(text), _) => self.evaluated(&value, text),
                (None, None) => Some(ConstValue::Int(0)),
                (None, Some((prev_value, _))) => {
                    prev_value.and_then(|v| v.checked_add(1)).map(ConstValue::Int)
                }
            };

            let member_name = self.rules.resolve(RuleTarget::Const, &member.name);
            self.claim(&member_name, &member.name)?;
            self.known
                .insert(member.name.as_str(), member_name.as_str(), evaluated.clone());
            prev = Some((
                evaluated.as_ref().and_then(ConstValue::as_int),
                Some(member_name.clone()),
            ));
            members.push(EnumMember {
                raw: member.name.clone(),
                name: member_name,
                value,
                pos: member.pos.clone(),
            });
        }

        let negative = members.iter().any(|m| {
            self.known
                .value(&m.raw)
                .and_then(ConstValue::as_int)
                .is_some_and(|v| v < 0)
        });
        let underlying = if negative { Scalar::Int } else { Scalar::UInt };
        tracing::debug!(raw = %raw, name = %name, members = members.len(), "enum");
        let id = self.model.push(
            key,
            raw,
            name,
            decl.pos.clone(),
            EntryKind::Enum(EnumEntry {
                named,
                underlying,
                members,
            }),
        );
        if let Some(alias) = alias {
            self.model.alias(alias, id);
        }
        Ok(())
    }

    // === Types ===

    fn learn_struct(&mut self, decl: &ForeignDecl) -> Result<(), TranslateError> {
        let key = decl.raw_key();
        let raw = self
            .aliases
            .get(&key)
            .cloned()
            .unwrap_or_else(|| decl.name.clone());

        if let Some(id) = self.model.lookup(&key) {
            let complete = self.model.get(id).as_struct().is_some_and(|s| s.complete);
            if complete || !decl.has_body {
                tracing::debug!(key = %key, "repeated declaration");
                return Ok(());
            }
            let fields = self.learn_fields(decl, &raw)?;
            let entry = self.model.get_mut(id);
            entry.pos.clone_from(&decl.pos);
            if let EntryKind::Struct(s) = &mut entry.kind {
                s.fields = fields;
                s.complete = true;
            }
            return Ok(());
        }

        let name = self.rules.resolve(RuleTarget::Type, &raw);
        self.claim(&name, &key)?;
        let mem_tip = self.tips.resolve_memory_tip(&raw, None);
        let is_union = decl.kind == ForeignKind::Union;
        let aliased = self.aliases.contains_key(&key);
        tracing::debug!(key = %key, name = %name, "aggregate");
        // Pushed before its fields so self-referencing pointers resolve.
        let id = self.model.push(
            key,
            raw.as_str(),
            name,
            decl.pos.clone(),
            EntryKind::Struct(StructEntry {
                is_union,
                complete: decl.has_body,
                fields: Vec::new(),
                mem_tip,
            }),
        );
        if aliased {
            self.model.alias(raw.as_str(), id);
        }
        let fields = self.learn_fields(decl, &raw)?;
        if let EntryKind::Struct(s) = &mut self.model.get_mut(id).kind {
            s.fields = fields;
        }
        Ok(())
    }

    fn learn_fields(&mut self, decl: &ForeignDecl, owner: &str) -> Result<Vec<Field>, TranslateError> {
        let mut names = Namespace::new();
        let mut fields = Vec::with_capacity(decl.members.len());
        for (index, field) in decl.members.iter().enumerate() {
            let ty = match self.resolve_type_text(&field.ty) {
                Ok(ty) => ty,
                Err(message) => {
                    self.skip(&format!("{owner}.{}", field.name), message);
                    continue;
                }
            };
            let name = self.rules.resolve(RuleTarget::Public, &field.name);
            names
                .claim(&name, &field.name)
                .map_err(|taken| collision(taken, &field.name))?;
            let member = MemberRef::new(index, &field.name);
            let ptr_tip = self
                .tips
                .resolve_pointer_tip(TipScope::Struct, owner, Some(member));
            let mem_tip = self.tips.resolve_memory_tip(owner, Some(member));
            if mem_tip == Some(MemoryTip::Raw) && ptr_tip == Some(PointerTip::Arr) {
                self.warn(
                    &format!("{owner}.{}", field.name),
                    "raw memory tip and arr pointer tip both apply",
                );
            }
            fields.push(Field {
                raw: field.name.clone(),
                name,
                ty,
                ptr_tip,
                mem_tip,
            });
        }
        Ok(fields)
    }

    fn learn_typedef(&mut self, decl: &ForeignDecl) -> Result<(), TranslateError> {
        let raw = decl.name.as_str();
        if self.alias_names.contains(raw) || self.model.lookup(raw).is_some() {
            tracing::debug!(raw, "typedef already bound");
            return Ok(());
        }
        let target = match self.resolve_type_text(&decl.ty) {
            Ok(target) => target,
            Err(message) => {
                self.skip(raw, message);
                return Ok(());
            }
        };
        let name = self.rules.resolve(RuleTarget::Type, raw);
        self.claim(&name, raw)?;
        let ptr_tip = self.tips.resolve_pointer_tip(TipScope::Any, raw, None);
        tracing::debug!(raw, name = %name, "typedef");
        self.model.push(
            raw,
            raw,
            name,
            decl.pos.clone(),
            EntryKind::Typedef(TypedefEntry { target, ptr_tip }),
        );
        Ok(())
    }

    // === Functions ===

    fn learn_function(&mut self, decl: &ForeignDecl) -> Result<(), TranslateError> {
        let raw = decl.name.as_str();
        if self.model.lookup(raw).is_some() {
            tracing::debug!(raw, "repeated prototype");
            return Ok(());
        }
        let ret = match self.resolve_type_text(&decl.ty) {
            Ok(ret) => ret,
            Err(message) => {
                self.skip(raw, message);
                return Ok(());
            }
        };

        let mut names = Namespace::new();
        let mut params = Vec::with_capacity(decl.members.len());
        for (index, param) in decl.members.iter().enumerate() {
            let param_raw = if param.name.is_empty() {
                format!("arg{index}")
            } else {
                param.name.clone()
            };
            let ty = match self.resolve_type_text(&param.ty) {
                // array parameters decay to pointers
                Ok(TypeRef::Array { elem, .. }) => TypeRef::Pointer {
                    to: elem,
                    is_const: false,
                },
                Ok(ty) => ty,
                Err(message) => {
                    self.skip(raw, format!("parameter `{param_raw}`: {message}"));
                    return Ok(());
                }
            };
            let name = self.rules.resolve(RuleTarget::Private, &param_raw);
            names
                .claim(&name, &param_raw)
                .map_err(|taken| collision(taken, &param_raw))?;
            let ptr_tip = self.tips.resolve_pointer_tip(
                TipScope::Function,
                raw,
                Some(MemberRef::new(index, &param_raw)),
            );
            params.push(Param {
                raw: param_raw,
                name,
                ty,
                ptr_tip,
            });
        }

        let name = self.rules.resolve(RuleTarget::Function, raw);
        self.claim(&name, raw)?;
        let ret_tip = self.tips.resolve_pointer_tip(TipScope::Function, raw, None);
        tracing::debug!(raw, name = %name, params = params.len(), "function");
        self.model.push(
            raw,
            raw,
            name,
            decl.pos.clone(),
            EntryKind::Function(FunctionEntry {
                params,
                ret,
                ret_tip,
                variadic: decl.variadic,
            }),
        );
        Ok(())
    }
}

fn collision(taken: NameTaken, raw: &str) -> TranslateError {
    TranslateError::Collision {
        name: taken.name,
        first: taken.existing,
        second: raw.to_string(),
    }
}
