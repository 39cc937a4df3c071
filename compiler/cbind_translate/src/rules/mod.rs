//! Rule engine: raw foreign identifiers to host identifiers.
//!
//! Each [`RuleTarget`] owns an ordered rule-set. An identifier is resolved by
//! running it through the rule-sets of its target's chain
//! (`global`, then the target's own set, then `post-global`). Within a set, rules
//! run top to bottom:
//!
//! - a rule whose pattern does not match is skipped,
//! - a matching `accept` rule ends the set, keeping the current identifier,
//! - a matching `replace` rule rewrites the identifier and processing continues.
//!
//! A `replace` rule with `from` but neither `to` nor a transform deletes every
//! match (`_t$` strips a `_t` suffix). With a transform and no `to`, each match is
//! replaced by its own transformed text.
//!
//! Rule-sets are compiled once; resolution is a pure function of the compiled
//! sets and the input.

use rustc_hash::FxHashMap;

use crate::config::{Action, RuleSets, RuleSpec, RuleTarget};
use crate::pattern::{NameMatcher, RegexMatcher};
use crate::transform::{Transform, TransformRegistry};
use crate::ConfigError;

#[derive(Debug)]
struct CompiledRule {
    matcher: Option<Box<dyn NameMatcher>>,
    to: Option<String>,
    transform: Option<Transform>,
    action: Action,
}

impl CompiledRule {
    fn compile(spec: &RuleSpec, registry: &TransformRegistry) -> Result<Self, ConfigError> {
        let matcher = match &spec.from {
            Some(pattern) => Some(Box::new(RegexMatcher::new(pattern)?) as Box<dyn NameMatcher>),
            None => None,
        };
        let transform = spec
            .transform_name()
            .map(|name| registry.lookup(name))
            .transpose()?;
        // a bare `from` deletes what it matches
        let to = match &spec.to {
            None if spec.from.is_some() && transform.is_none() => Some(String::new()),
            to => to.clone(),
        };
        Ok(CompiledRule {
            matcher,
            to,
            transform,
            action: spec.action,
        })
    }
}

/// Compiled rule-sets for every target.
#[derive(Debug)]
pub struct RuleEngine {
    sets: FxHashMap<RuleTarget, Vec<CompiledRule>>,
    registry: TransformRegistry,
}

impl RuleEngine {
    /// Compile `rules` against `registry`.
    ///
    /// Fails on the first malformed pattern or unknown transform.
    pub fn new(rules: &RuleSets, registry: TransformRegistry) -> Result<Self, ConfigError> {
        let mut sets = FxHashMap::default();
        for target in RuleTarget::ALL {
            let compiled = rules
                .get(target)
                .iter()
                .map(|spec| CompiledRule::compile(spec, &registry))
                .collect::<Result<Vec<_>, _>>()?;
            sets.insert(target, compiled);
        }
        Ok(RuleEngine { sets, registry })
    }

    /// Resolve `raw` through the chain of `target`.
    pub fn resolve(&self, target: RuleTarget, raw: &str) -> String {
        let mut ident = raw.to_string();
        for &step in target.chain() {
            ident = self.apply_set(step, ident);
        }
        ident
    }

    /// Run a single rule-set.
    pub fn apply_set(&self, target: RuleTarget, ident: String) -> String {
        let Some(rules) = self.sets.get(&target) else {
            return ident;
        };
        let mut current = ident;
        for rule in rules {
            let matched = rule
                .matcher
                .as_ref()
                .map_or(true, |m| m.matches(&current));
            if !matched {
                continue;
            }
            if rule.action == Action::Accept {
                break;
            }
            let transform = |piece: String| match rule.transform {
                Some(t) => self.registry.apply(t, &piece),
                None => piece,
            };
            current = match &rule.matcher {
                Some(matcher) => matcher.rewrite(&current, rule.to.as_deref(), &transform),
                None => transform(rule.to.clone().unwrap_or(current)),
            };
        }
        current
    }

    pub fn is_empty(&self) -> bool {
        self.sets.values().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests;
