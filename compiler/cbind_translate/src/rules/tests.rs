#![allow(clippy::unwrap_used, reason = "Tests can panic")]

use super::*;
use pretty_assertions::assert_eq;

fn rule(from: Option<&str>, to: Option<&str>, transform: Option<&str>, action: Action) -> RuleSpec {
    RuleSpec {
        from: from.map(str::to_string),
        to: to.map(str::to_string),
        transform: transform.map(str::to_string),
        load: None,
        action,
    }
}

fn engine(target: RuleTarget, rules: Vec<RuleSpec>) -> RuleEngine {
    let mut sets = RuleSets::default();
    *sets.get_mut(target) = rules;
    RuleEngine::new(&sets, TransformRegistry::default()).unwrap()
}

/// `{accept on ^foo_, lower, replace foo_ -> _, export}`
fn prefix_stripping() -> Vec<RuleSpec> {
    vec![
        rule(Some("^foo_"), None, None, Action::Accept),
        rule(None, None, Some("lower"), Action::Replace),
        rule(Some("foo_"), Some("_"), None, Action::Replace),
        rule(None, None, Some("export"), Action::Replace),
    ]
}

#[test]
fn prefix_stripping_rules() {
    let engine = engine(RuleTarget::Global, prefix_stripping());
    assert_eq!(engine.resolve(RuleTarget::Const, "FOO_X"), "X");
    assert_eq!(engine.resolve(RuleTarget::Const, "FOO_LONG_NAME"), "Long_name");
}

#[test]
fn accept_halts_its_rule_set() {
    let engine = engine(RuleTarget::Global, prefix_stripping());
    // Already lower-case with the prefix: accepted untouched.
    assert_eq!(engine.resolve(RuleTarget::Type, "foo_bar"), "foo_bar");
}

#[test]
fn accept_does_not_halt_later_sets() {
    let mut sets = RuleSets::default();
    sets.global = vec![
        rule(Some("^foo_"), None, None, Action::Accept),
        rule(None, None, Some("upper"), Action::Replace),
    ];
    sets.post_global = vec![rule(None, None, Some("pascalcase"), Action::Replace)];
    let engine = RuleEngine::new(&sets, TransformRegistry::default()).unwrap();
    assert_eq!(engine.resolve(RuleTarget::Function, "foo_open"), "FooOpen");
}

#[test]
fn chain_runs_global_then_target_then_post_global() {
    let mut sets = RuleSets::default();
    sets.global = vec![rule(Some("^foo_"), Some(""), None, Action::Replace)];
    sets.types = vec![rule(None, None, Some("title"), Action::Replace)];
    sets.post_global = vec![rule(Some("_"), Some(""), None, Action::Replace)];
    let engine = RuleEngine::new(&sets, TransformRegistry::default()).unwrap();
    assert_eq!(engine.resolve(RuleTarget::Type, "foo_point_t"), "PointT");
    // Functions skip the type set.
    assert_eq!(engine.resolve(RuleTarget::Function, "foo_point_t"), "pointt");
}

#[test]
fn transform_applies_to_replaced_pieces_only() {
    let engine = engine(
        RuleTarget::Global,
        vec![rule(Some("_([a-z])"), Some("$1"), Some("upper"), Action::Replace)],
    );
    assert_eq!(engine.resolve(RuleTarget::Global, "get_user_id"), "getUserId");
}

#[test]
fn to_without_from_replaces_whole_identifier() {
    let engine = engine(
        RuleTarget::Global,
        vec![rule(None, Some("Handle"), Some("lower"), Action::Replace)],
    );
    assert_eq!(engine.resolve(RuleTarget::Global, "anything"), "handle");
}

#[test]
fn unmatched_identifier_passes_through() {
    let engine = engine(
        RuleTarget::Global,
        vec![rule(Some("^bar_"), Some(""), None, Action::Replace)],
    );
    assert_eq!(engine.resolve(RuleTarget::Private, "foo_x"), "foo_x");
}

#[test]
fn load_names_a_plugin() {
    let mut spec = rule(None, None, None, Action::Replace);
    spec.load = Some("snakecase".to_string());
    let engine = engine(RuleTarget::Public, vec![spec]);
    assert_eq!(engine.resolve(RuleTarget::Public, "userName"), "user_name");
}

#[test]
fn configuration_errors() {
    let mut sets = RuleSets::default();
    sets.consts = vec![rule(None, None, Some("shout"), Action::Replace)];
    let err = RuleEngine::new(&sets, TransformRegistry::default()).unwrap_err();
    assert!(matches!(err, ConfigError::UnknownTransform(_)));

    let mut sets = RuleSets::default();
    sets.global = vec![rule(Some("[a-"), None, None, Action::Replace)];
    let err = RuleEngine::new(&sets, TransformRegistry::default()).unwrap_err();
    assert!(matches!(err, ConfigError::Pattern { .. }));
}

#[allow(clippy::disallowed_types, reason = "proptest macros internally use Arc")]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn resolve_is_deterministic(raw in "[A-Za-z_][A-Za-z0-9_]{0,24}") {
            let engine = engine(RuleTarget::Global, prefix_stripping());
            let first = engine.resolve(RuleTarget::Type, &raw);
            let second = engine.resolve(RuleTarget::Type, &raw);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn accept_ignores_later_rules(suffix in "[a-z0-9_]{0,16}") {
            let mut rules = prefix_stripping();
            rules.push(rule(None, Some("CLOBBERED"), None, Action::Replace));
            let engine = engine(RuleTarget::Global, rules);
            let raw = format!("foo_{suffix}");
            prop_assert_eq!(engine.resolve(RuleTarget::Const, &raw), raw);
        }
    }
}

#[test]
fn bare_from_deletes_the_match() {
    let engine = engine(
        RuleTarget::Type,
        vec![rule(Some("_t$"), None, None, Action::Replace)],
    );
    assert_eq!(engine.resolve(RuleTarget::Type, "foo_t"), "foo");
    assert_eq!(engine.resolve(RuleTarget::Type, "foo_type"), "foo_type");
}

#[test]
fn replace_without_from_or_to_keeps_the_identifier() {
    let engine = engine(RuleTarget::Type, vec![rule(None, None, None, Action::Replace)]);
    assert_eq!(engine.resolve(RuleTarget::Type, "foo_t"), "foo_t");
}

#[test]
fn full_rule_set_with_suffix_stripping_and_upper_pieces() {
    let mut sets = RuleSets::default();
    sets.global = vec![
        rule(Some("(?i)foo_"), None, None, Action::Accept),
        rule(None, None, Some("lower"), Action::Replace),
        rule(Some("foo_"), Some("_"), None, Action::Replace),
        rule(None, None, Some("export"), Action::Replace),
    ];
    sets.types = vec![rule(Some("_t$"), None, None, Action::Replace)];
    sets.private = vec![rule(None, None, Some("unexport"), Action::Replace)];
    sets.post_global = vec![rule(Some("_id?|$"), None, Some("upper"), Action::Replace)];
    let engine = RuleEngine::new(&sets, TransformRegistry::default()).unwrap();

    assert_eq!(engine.resolve(RuleTarget::Type, "BAR_SIZE_T"), "Bar_size");
    assert_eq!(engine.resolve(RuleTarget::Type, "foo_point_t"), "foo_point");
    assert_eq!(engine.resolve(RuleTarget::Private, "Item_Id"), "item_ID");
}
