#![allow(clippy::unwrap_used, reason = "Tests can panic")]

use super::*;
use pretty_assertions::assert_eq;

fn env() -> KnownConsts {
    let mut known = KnownConsts::new();
    known.insert("FOO_BASE", "Base", Some(ConstValue::Int(16)));
    known.insert("FOO_SCALE", "Scale", Some(ConstValue::Float(0.5)));
    known.insert("FOO_NAME", "Name", Some(ConstValue::Str("foo".to_string())));
    known.insert("FOO_LATER", "Later", None);
    known
}

fn eval_int(text: &str) -> i64 {
    eval_text(text, &env()).unwrap().as_int().unwrap()
}

#[test]
fn integer_literals() {
    assert_eq!(eval_int("42"), 42);
    assert_eq!(eval_int("0x1F"), 31);
    assert_eq!(eval_int("010"), 8);
    assert_eq!(eval_int("0"), 0);
    assert_eq!(eval_int("10UL"), 10);
    assert_eq!(eval_int("'A'"), 65);
    assert_eq!(eval_int("'\\n'"), 10);
    assert_eq!(eval_int("'\\x7f'"), 127);
}

#[test]
fn operators_and_precedence() {
    assert_eq!(eval_int("1 + 2 * 3"), 7);
    assert_eq!(eval_int("(1 + 2) * 3"), 9);
    assert_eq!(eval_int("1 << 4 | 1"), 17);
    assert_eq!(eval_int("-FOO_BASE / 3"), -5);
    assert_eq!(eval_int("~0 & 0xff"), 255);
    assert_eq!(eval_int("FOO_BASE % 5 == 1"), 1);
    assert_eq!(eval_int("!FOO_BASE || 2 > 1"), 1);
    assert_eq!(eval_int("FOO_BASE > 8 ? 100 : 200"), 100);
    assert_eq!(eval_int("0 && 1 / 0"), 0);
    assert_eq!(eval_int("10 - 4 - 3"), 3);
}

#[test]
fn floats_and_strings() {
    assert_eq!(eval_text("1.5f * 2", &env()).unwrap(), ConstValue::Float(3.0));
    assert_eq!(eval_text("FOO_SCALE + 1", &env()).unwrap(), ConstValue::Float(1.5));
    assert_eq!(
        eval_text("\"foo\" \"bar\\t\"", &env()).unwrap(),
        ConstValue::Str("foobar\t".to_string())
    );
    assert_eq!(
        eval_text("FOO_NAME", &env()).unwrap(),
        ConstValue::Str("foo".to_string())
    );
}

#[test]
fn evaluation_errors() {
    let env = env();
    assert_eq!(eval_text("1 / 0", &env), Err(ConstEvalError::DivisionByZero));
    assert_eq!(
        eval_text("9223372036854775807 + 1", &env),
        Err(ConstEvalError::Overflow)
    );
    assert_eq!(eval_text("1 << 63", &env), Err(ConstEvalError::Overflow));
    assert_eq!(
        eval_text("FOO_MISSING + 1", &env),
        Err(ConstEvalError::UnknownIdent("FOO_MISSING".to_string()))
    );
    // Known, but without an evaluated value.
    assert_eq!(
        eval_text("FOO_LATER", &env),
        Err(ConstEvalError::UnknownIdent("FOO_LATER".to_string()))
    );
    assert!(matches!(
        eval_text("FOO_NAME + 1", &env),
        Err(ConstEvalError::Unsupported(_))
    ));
    assert!(matches!(
        eval_text("sizeof(int)", &env),
        Err(ConstEvalError::UnknownIdent(_) | ConstEvalError::Syntax(_))
    ));
    assert!(matches!(eval_text("1 +", &env), Err(ConstEvalError::Syntax(_))));
    assert!(matches!(eval_text("{1}", &env), Err(ConstEvalError::Unsupported(_))));
}

#[test]
fn expansion_renames_and_drops_suffixes() {
    let env = env();
    assert_eq!(expand("(FOO_BASE << 2u) | 0x10UL", &env).unwrap(), "(Base << 2) | 0x10");
    assert_eq!(expand("FOO_LATER+1", &env).unwrap(), "Later + 1");
    assert_eq!(expand("~FOO_BASE", &env).unwrap(), "^Base");
    assert_eq!(expand("1.0f", &env).unwrap(), "1.0");
    assert_eq!(expand("\"a\" \"b\"", &env).unwrap(), "\"a\" + \"b\"");
}

#[test]
fn expansion_errors() {
    let env = env();
    assert_eq!(
        expand("FOO_MISSING", &env),
        Err(ConstEvalError::UnknownIdent("FOO_MISSING".to_string()))
    );
    assert!(matches!(expand("1 ? 2 : 3", &env), Err(ConstEvalError::Unsupported(_))));
    assert!(matches!(expand("(1", &env), Err(ConstEvalError::Syntax(_))));
}

#[test]
fn wide_literals_expand_but_do_not_evaluate() {
    let env = env();
    assert_eq!(
        expand("0xFFFFFFFFFFFFFFFFULL", &env).unwrap(),
        "0xFFFFFFFFFFFFFFFF"
    );
    assert_eq!(
        expand("18446744073709551615u & FOO_BASE", &env).unwrap(),
        "18446744073709551615 & Base"
    );
    assert_eq!(
        eval_text("0xFFFFFFFFFFFFFFFFULL", &env),
        Err(ConstEvalError::Overflow)
    );
    // wider than any C integer type
    assert_eq!(
        expand("0x1FFFFFFFFFFFFFFFF", &env),
        Err(ConstEvalError::Overflow)
    );
}

#[test]
fn policy_selects_mode_per_scope() {
    let policy = ConstPolicy::default();
    let env = env();
    assert_eq!(
        policy.evaluate(ConstScope::Enum, "FOO_BASE + 1", &env).unwrap(),
        ConstValue::Int(17)
    );
    assert_eq!(
        policy.evaluate(ConstScope::Define, "FOO_BASE + 1", &env).unwrap(),
        ConstValue::Expr("Base + 1".to_string())
    );
    let eval_all = ConstPolicy::new(ConstRules {
        enums: ConstMode::Eval,
        decl: ConstMode::Eval,
        define: ConstMode::Eval,
    });
    assert_eq!(
        eval_all.evaluate(ConstScope::Decl, "FOO_BASE * 2", &env).unwrap(),
        ConstValue::Int(32)
    );
}

#[allow(clippy::disallowed_types, reason = "proptest macros internally use Arc")]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn sums_match_checked_arithmetic(a in -1_000_000i64..1_000_000, b in -1_000_000i64..1_000_000) {
            let text = format!("({a}) + ({b})");
            prop_assert_eq!(eval_text(&text, &KnownConsts::new()), Ok(ConstValue::Int(a + b)));
        }

        #[test]
        fn expansion_reparses(a in 0i64..1000, b in 0i64..1000) {
            let known = env();
            let first = expand(&format!("FOO_BASE * {a} + {b}u"), &known).unwrap();
            let mut renamed = KnownConsts::new();
            renamed.insert("Base", "Base", Some(ConstValue::Int(16)));
            let second = expand(&first, &renamed).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
