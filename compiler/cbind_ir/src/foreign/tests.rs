use super::*;

#[test]
fn raw_key_separates_tag_namespace() {
    let s = ForeignDecl::new(ForeignKind::Struct, "foo");
    let t = ForeignDecl::new(ForeignKind::Typedef, "foo").with_ty("struct foo");
    assert_eq!(s.raw_key(), "struct foo");
    assert_eq!(t.raw_key(), "foo");
    assert_eq!(ForeignDecl::new(ForeignKind::Enum, "color").raw_key(), "enum color");
}

#[test]
fn with_member_marks_body() {
    let forward = ForeignDecl::new(ForeignKind::Struct, "foo");
    assert!(!forward.has_body);

    let defined = ForeignDecl::new(ForeignKind::Struct, "foo")
        .with_member(ForeignDecl::new(ForeignKind::Field, "x").with_ty("int"));
    assert!(defined.has_body);
    assert_eq!(defined.members.len(), 1);
}

#[test]
fn tree_records_files_once() {
    let mut tree = DeclarationTree::new();
    tree.add_file("foo.h");
    tree.add_file("bar.h");
    tree.add_file("foo.h");
    assert_eq!(tree.files(), &["foo.h".to_string(), "bar.h".to_string()]);
}

#[test]
fn tree_preserves_declaration_order() {
    let tree: DeclarationTree = ["a", "b", "c"]
        .into_iter()
        .map(|n| ForeignDecl::new(ForeignKind::Macro, n).with_value("1"))
        .collect();
    let names: Vec<_> = tree.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, ["a", "b", "c"]);
    assert_eq!(tree.len(), 3);
}

#[test]
fn source_pos_display() {
    assert_eq!(SourcePos::new("foo.h", 12).to_string(), "foo.h:12");
}
