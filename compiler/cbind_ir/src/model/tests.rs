use super::*;
use pretty_assertions::assert_eq;

fn struct_kind(fields: Vec<Field>) -> EntryKind {
    EntryKind::Struct(StructEntry {
        is_union: false,
        complete: true,
        fields,
        mem_tip: None,
    })
}

fn field(name: &str, ty: TypeRef) -> Field {
    Field {
        raw: name.to_string(),
        name: name.to_string(),
        ty,
        ptr_tip: None,
        mem_tip: None,
    }
}

#[test]
fn push_and_lookup() {
    let mut model = Model::new();
    let id = model.push("struct node", "node", "Node", None, struct_kind(vec![]));
    assert_eq!(model.lookup("struct node"), Some(id));
    assert_eq!(model.get(id).name, "Node");
    assert_eq!(model.find("Node").map(|e| e.id), Some(id));
    assert_eq!(model.lookup("node"), None);
}

#[test]
fn alias_shares_entry() {
    let mut model = Model::new();
    let id = model.push("struct node", "node", "Node", None, struct_kind(vec![]));
    model.alias("node_t", id);
    assert_eq!(model.lookup("node_t"), Some(id));
    assert_eq!(model.len(), 1);
}

#[test]
fn patch_forward_refs_resolves_late_declarations() {
    let mut model = Model::new();
    // `struct a { struct b *next; }` seen before `struct b`
    let a = model.push(
        "struct a",
        "a",
        "A",
        None,
        struct_kind(vec![field(
            "next",
            TypeRef::pointer(TypeRef::Unresolved("struct b".into()), false),
        )]),
    );
    let b = model.push("struct b", "b", "B", None, struct_kind(vec![]));

    assert_eq!(model.patch_forward_refs(), 1);
    let fields = &model.get(a).as_struct().map(|s| s.fields.clone()).unwrap_or_default();
    assert_eq!(fields[0].ty, TypeRef::pointer(TypeRef::Decl(b), false));
}

#[test]
fn patch_keeps_undeclared_placeholders() {
    let mut model = Model::new();
    model.push(
        "struct a",
        "a",
        "A",
        None,
        struct_kind(vec![field("h", TypeRef::Unresolved("struct hidden".into()))]),
    );
    assert_eq!(model.patch_forward_refs(), 0);
}

#[test]
fn self_referencing_struct_is_representable() {
    let mut model = Model::new();
    let id = model.push("struct list", "list", "List", None, struct_kind(vec![]));
    if let EntryKind::Struct(s) = &mut model.get_mut(id).kind {
        s.fields.push(field("next", TypeRef::pointer(TypeRef::Decl(id), false)));
    }
    let s = model.get(id).as_struct().map(|s| s.fields.len());
    assert_eq!(s, Some(1));
}

#[test]
fn underlying_follows_typedef_chain() {
    let mut model = Model::new();
    let base = model.push(
        "base_t",
        "base_t",
        "Base",
        None,
        EntryKind::Typedef(TypedefEntry {
            target: TypeRef::Scalar(Scalar::UInt32),
            ptr_tip: None,
        }),
    );
    let alias = model.push(
        "alias_t",
        "alias_t",
        "Alias",
        None,
        EntryKind::Typedef(TypedefEntry {
            target: TypeRef::Decl(base),
            ptr_tip: None,
        }),
    );
    let ty = TypeRef::Decl(alias);
    assert_eq!(model.underlying(&ty), &TypeRef::Scalar(Scalar::UInt32));
}

#[test]
fn namespace_reports_existing_owner() {
    let mut ns = Namespace::new();
    assert!(ns.claim("Bar", "Foo_Bar").is_ok());
    assert!(ns.claim("Bar", "Foo_Bar").is_ok());
    let err = ns.claim("Bar", "foo_bar");
    assert_eq!(
        err,
        Err(NameTaken {
            name: "Bar".into(),
            existing: "Foo_Bar".into(),
        })
    );
    ns.release("Bar");
    assert!(ns.claim("Bar", "foo_bar").is_ok());
    assert_eq!(ns.owner("Bar"), Some("foo_bar"));
}

#[test]
fn scalar_from_words() {
    assert_eq!(Scalar::from_words(["unsigned", "long", "long"]), Some(Scalar::ULongLong));
    assert_eq!(Scalar::from_words(["unsigned"]), Some(Scalar::UInt));
    assert_eq!(Scalar::from_words(["signed", "char"]), Some(Scalar::SChar));
    assert_eq!(Scalar::from_words(["short", "int"]), Some(Scalar::Short));
    assert_eq!(Scalar::from_words(["uint8_t"]), Some(Scalar::UInt8));
    assert_eq!(Scalar::from_words(["long", "double"]), Some(Scalar::Double));
    assert_eq!(Scalar::from_words(["foo_t"]), None);
    assert_eq!(Scalar::from_words(Vec::<&str>::new()), None);
}
