#![allow(clippy::unwrap_used, reason = "Tests can panic")]

use super::*;

fn resolver(pointer: PointerTips, memory: Vec<TipSpec<MemoryTip>>) -> TipResolver {
    TipResolver::new(&pointer, &memory).unwrap()
}

#[test]
fn suffix_anchored_self_tip() {
    let tips = resolver(
        PointerTips {
            any: vec![TipSpec::new("_bytes$").with_self(PointerTip::Arr)],
            ..PointerTips::default()
        },
        Vec::new(),
    );
    let arr = tips.resolve_pointer_tip(
        TipScope::Function,
        "foo_write",
        Some(MemberRef::new(1, "out_bytes")),
    );
    assert_eq!(arr, Some(PointerTip::Arr));
    let none = tips.resolve_pointer_tip(
        TipScope::Function,
        "foo_write",
        Some(MemberRef::new(1, "bytes_out")),
    );
    assert_eq!(none, None);
}

#[test]
fn positional_tips_apply_to_matching_owner() {
    let tips = resolver(
        PointerTips {
            function: vec![TipSpec::new("^foo_send$")
                .with_tips([PointerTip::Inst, PointerTip::Default, PointerTip::Arr])],
            ..PointerTips::default()
        },
        Vec::new(),
    );
    let at = |index, name| {
        tips.resolve_pointer_tip(TipScope::Function, "foo_send", Some(MemberRef::new(index, name)))
    };
    assert_eq!(at(0, "conn"), Some(PointerTip::Inst));
    assert_eq!(at(1, "flags"), None);
    assert_eq!(at(2, "buf"), Some(PointerTip::Arr));
    assert_eq!(at(3, "len"), None);
    // Other functions are untouched.
    assert_eq!(
        tips.resolve_pointer_tip(TipScope::Function, "foo_send_all", Some(MemberRef::new(0, "c"))),
        None
    );
}

#[test]
fn scoped_list_wins_over_any() {
    let tips = resolver(
        PointerTips {
            structs: vec![TipSpec::new("^data$").with_self(PointerTip::Ref)],
            any: vec![TipSpec::new("^data$").with_self(PointerTip::Arr)],
            ..PointerTips::default()
        },
        Vec::new(),
    );
    let field = Some(MemberRef::new(0, "data"));
    assert_eq!(
        tips.resolve_pointer_tip(TipScope::Struct, "foo_buf", field),
        Some(PointerTip::Ref)
    );
    assert_eq!(
        tips.resolve_pointer_tip(TipScope::Function, "foo_buf", field),
        Some(PointerTip::Arr)
    );
}

#[test]
fn first_match_wins_without_merging() {
    let tips = resolver(
        PointerTips {
            any: vec![
                TipSpec::new("_ptr$").with_self(PointerTip::Ref),
                TipSpec::new("^buf").with_self(PointerTip::Arr),
            ],
            ..PointerTips::default()
        },
        Vec::new(),
    );
    assert_eq!(
        tips.resolve_pointer_tip(TipScope::Any, "buf_ptr", None),
        Some(PointerTip::Ref)
    );
}

#[test]
fn explicit_default_stops_the_search() {
    let tips = resolver(
        PointerTips {
            function: vec![TipSpec::new("^handle$").with_self(PointerTip::Default)],
            any: vec![TipSpec::new("^handle$").with_self(PointerTip::Inst)],
            ..PointerTips::default()
        },
        Vec::new(),
    );
    assert_eq!(
        tips.resolve_pointer_tip(TipScope::Function, "foo_open", Some(MemberRef::new(0, "handle"))),
        None
    );
}

#[test]
fn memory_tips() {
    let tips = resolver(
        PointerTips::default(),
        vec![
            TipSpec::new("_raw$").with_self(MemoryTip::Raw),
            TipSpec::new("^foo_frame$").with_tips([MemoryTip::Default, MemoryTip::Raw]),
        ],
    );
    assert_eq!(
        tips.resolve_memory_tip("foo_msg", Some(MemberRef::new(0, "data_raw"))),
        Some(MemoryTip::Raw)
    );
    assert_eq!(
        tips.resolve_memory_tip("foo_msg", Some(MemberRef::new(1, "data"))),
        None
    );
    assert_eq!(
        tips.resolve_memory_tip("foo_frame", Some(MemberRef::new(1, "pixels"))),
        Some(MemoryTip::Raw)
    );
    assert_eq!(tips.resolve_memory_tip("foo_msg_raw", None), Some(MemoryTip::Raw));
    assert_eq!(tips.resolve_memory_tip("foo_frame", None), None);
}

#[test]
fn bad_target_pattern() {
    let err = TipResolver::new(
        &PointerTips {
            any: vec![TipSpec::new("(")],
            ..PointerTips::default()
        },
        &[],
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Pattern { .. }));
}
