#![allow(clippy::unwrap_used, reason = "Tests can panic")]

use cbind_ir::{EnumEntry, Signature, TypedefEntry};
use pretty_assertions::assert_eq;

use super::*;

struct Fixture {
    model: Model,
    point: DeclId,
    raw: DeclId,
    color: DeclId,
    size: DeclId,
    callback: DeclId,
    handle: DeclId,
    vec: DeclId,
    point_t: DeclId,
}

fn field(raw: &str, name: &str, ty: TypeRef) -> Field {
    Field {
        raw: raw.to_string(),
        name: name.to_string(),
        ty,
        ptr_tip: None,
        mem_tip: None,
    }
}

fn managed(fields: Vec<Field>) -> EntryKind {
    EntryKind::Struct(StructEntry {
        is_union: false,
        complete: true,
        fields,
        mem_tip: None,
    })
}

fn typedef(target: TypeRef) -> EntryKind {
    EntryKind::Typedef(TypedefEntry {
        target,
        ptr_tip: None,
    })
}

fn fixture() -> Fixture {
    let mut model = Model::new();
    let point = model.push(
        "struct foo_point",
        "foo_point",
        "FooPoint",
        None,
        managed(vec![
            field("x", "X", TypeRef::Scalar(Scalar::Int)),
            field("name", "Name", TypeRef::pointer(TypeRef::Scalar(Scalar::Char), true)),
        ]),
    );
    let raw = model.push(
        "struct foo_raw",
        "foo_raw",
        "FooRaw",
        None,
        EntryKind::Struct(StructEntry {
            is_union: false,
            complete: true,
            fields: Vec::new(),
            mem_tip: Some(MemoryTip::Raw),
        }),
    );
    let color = model.push(
        "enum foo_color",
        "foo_color",
        "FooColor",
        None,
        EntryKind::Enum(EnumEntry {
            named: true,
            underlying: Scalar::UInt,
            members: Vec::new(),
        }),
    );
    let size = model.push(
        "foo_size_t",
        "foo_size_t",
        "FooSize",
        None,
        typedef(TypeRef::Scalar(Scalar::SizeT)),
    );
    let callback = model.push(
        "foo_cb",
        "foo_cb",
        "FooCb",
        None,
        typedef(TypeRef::Func(Box::new(Signature {
            ret: TypeRef::Void,
            params: vec![TypeRef::Scalar(Scalar::Int)],
            variadic: false,
        }))),
    );
    let handle = model.push(
        "foo_handle",
        "foo_handle",
        "FooHandle",
        None,
        typedef(TypeRef::pointer(TypeRef::Decl(raw), false)),
    );
    let vec = model.push("struct foo_vec", "foo_vec_t", "FooVec", None, managed(Vec::new()));
    model.alias("foo_vec_t", vec);
    let point_t = model.push(
        "foo_point_t",
        "foo_point_t",
        "FooPointT",
        None,
        typedef(TypeRef::Decl(point)),
    );
    Fixture {
        model,
        point,
        raw,
        color,
        size,
        callback,
        handle,
        vec,
        point_t,
    }
}

fn ptr(to: TypeRef) -> TypeRef {
    TypeRef::pointer(to, false)
}

#[test]
fn scalars_cast_both_ways() {
    let f = fixture();
    let types = TypeMapper::new(&f.model);
    let conv = types.conv(&TypeRef::Scalar(Scalar::Int), None, None, Position::Param);
    assert_eq!(conv.go, "int32");
    assert_eq!(conv.cgo, "C.int");
    assert_eq!(conv.apply_to_c("n"), "C.int(n)");
    assert_eq!(conv.apply_from_c("__ret").unwrap(), "int32(__ret)");
    assert!(conv.needs.is_empty());
}

#[test]
fn char_pointers_become_strings() {
    let f = fixture();
    let types = TypeMapper::new(&f.model);
    let ty = TypeRef::pointer(TypeRef::Scalar(Scalar::Char), true);

    let param = types.conv(&ty, None, None, Position::Param);
    assert_eq!(param.go, "string");
    assert_eq!(param.cgo, "*C.char");
    assert_eq!(param.apply_to_c("name"), "unpackPCharString(name)");
    assert!(param.frees);
    assert_eq!(param.needs, vec![Need::CString]);

    let ret = types.conv(&ty, None, None, Position::Return);
    assert_eq!(ret.apply_from_c("__ret").unwrap(), "packPCharString(__ret)");
    assert!(!ret.frees);
}

#[test]
fn array_tips_shape_params_only() {
    let f = fixture();
    let types = TypeMapper::new(&f.model);
    let ty = ptr(TypeRef::Scalar(Scalar::Int));

    let param = types.conv(&ty, Some(PointerTip::Arr), None, Position::Param);
    assert_eq!(param.go, "[]int32");
    assert_eq!(param.apply_to_c("values"), "unpackArgSInt(values)");
    assert_eq!(
        param.needs,
        vec![Need::Slice {
            cgo_elem: "C.int".to_string(),
            go_elem: "int32".to_string(),
            managed: false,
        }]
    );
    assert_eq!(param.needs[0].helper_name(&f.model), "unpackArgSInt");

    // unknown length on the way back: presented as a pointer
    let ret = types.conv(&ty, Some(PointerTip::Arr), None, Position::Return);
    assert_eq!(ret.go, "*int32");
    assert_eq!(ret.apply_to_c("p"), "(*C.int)(unsafe.Pointer(p))");
    assert_eq!(ret.apply_from_c("__ret").unwrap(), "(*int32)(unsafe.Pointer(__ret))");
}

#[test]
fn managed_structs_convert_through_helpers() {
    let f = fixture();
    let types = TypeMapper::new(&f.model);

    let value = types.conv(&TypeRef::Decl(f.point), None, None, Position::Param);
    assert_eq!(value.go, "FooPoint");
    assert_eq!(value.cgo, "C.struct_foo_point");
    assert_eq!(value.apply_to_c("p"), "p.PassValue()");
    assert_eq!(value.apply_from_c("__ret").unwrap(), "NewFooPointFromC(__ret)");
    assert_eq!(value.needs, vec![Need::Struct(f.point)]);
    assert_eq!(value.needs[0].helper_name(&f.model), "struct FooPoint");

    let by_ref = types.conv(&ptr(TypeRef::Decl(f.point)), None, None, Position::Param);
    assert_eq!(by_ref.go, "*FooPoint");
    assert_eq!(
        by_ref.apply_to_c("p"),
        "(*C.struct_foo_point)(unsafe.Pointer(p.Ref()))"
    );
    assert_eq!(by_ref.apply_pack_back("p", "cp").unwrap(), "p.Deref()");

    let ret = types.conv(&ptr(TypeRef::Decl(f.point)), None, None, Position::Return);
    assert_eq!(
        ret.apply_from_c("__ret").unwrap(),
        "NewFooPointRef(unsafe.Pointer(__ret))"
    );
    assert_eq!(ret.pack_back, None);
}

#[test]
fn managed_struct_pointer_fields_stay_opaque() {
    let f = fixture();
    let types = TypeMapper::new(&f.model);
    let conv = types.conv(&ptr(TypeRef::Decl(f.point)), None, None, Position::Field);
    assert_eq!(conv.go, "unsafe.Pointer");
    assert_eq!(conv.apply_to_c("x.Next"), "(*C.struct_foo_point)(x.Next)");
    assert_eq!(conv.apply_from_c("ref.next").unwrap(), "unsafe.Pointer(ref.next)");
}

#[test]
fn managed_struct_slices_are_packed_back() {
    let f = fixture();
    let types = TypeMapper::new(&f.model);
    let conv = types.conv(
        &ptr(TypeRef::Decl(f.point)),
        Some(PointerTip::Arr),
        None,
        Position::Param,
    );
    assert_eq!(conv.go, "[]FooPoint");
    assert!(conv.frees);
    assert_eq!(
        conv.apply_to_c("pts"),
        "(*C.struct_foo_point)(unsafe.Pointer(unpackArgSStructFooPoint(pts)))"
    );
    assert_eq!(
        conv.apply_pack_back("pts", "cpts").unwrap(),
        "packSStructFooPoint(pts, (*C.struct_foo_point)(unsafe.Pointer(cpts)))"
    );
    assert_eq!(conv.needs.len(), 2);
    assert_eq!(conv.needs[1], Need::Struct(f.point));
}

#[test]
fn raw_memory_tip_keeps_the_cgo_type() {
    let f = fixture();
    let types = TypeMapper::new(&f.model);
    let mut data_raw = field("data_raw", "DataRaw", ptr(TypeRef::Scalar(Scalar::Char)));
    data_raw.mem_tip = Some(MemoryTip::Raw);
    let conv = types.field(&data_raw);
    assert_eq!(conv.go, "*C.char");
    assert_eq!(conv.apply_to_c("x.DataRaw"), "x.DataRaw");

    let data = field("data", "Data", ptr(TypeRef::Scalar(Scalar::Char)));
    assert_eq!(types.field(&data).go, "string");
}

#[test]
fn void_and_instance_pointers_are_opaque() {
    let f = fixture();
    let types = TypeMapper::new(&f.model);
    let void = types.conv(&ptr(TypeRef::Void), None, None, Position::Param);
    assert_eq!(void, Conv::identity("unsafe.Pointer"));

    let inst = types.conv(
        &ptr(TypeRef::Scalar(Scalar::Int)),
        Some(PointerTip::Inst),
        None,
        Position::Return,
    );
    assert_eq!(inst.go, "unsafe.Pointer");
    assert_eq!(inst.apply_to_c("p"), "(*C.int)(p)");
    assert_eq!(inst.apply_from_c("__ret").unwrap(), "unsafe.Pointer(__ret)");
}

#[test]
fn raw_structs_enums_and_handles() {
    let f = fixture();
    let types = TypeMapper::new(&f.model);

    let raw = types.conv(&TypeRef::Decl(f.raw), None, None, Position::Param);
    assert_eq!(raw.apply_to_c("r"), "C.struct_foo_raw(r)");
    assert_eq!(raw.apply_from_c("__ret").unwrap(), "FooRaw(__ret)");

    let color = types.conv(&TypeRef::Decl(f.color), None, None, Position::Param);
    assert_eq!(color.go, "FooColor");
    assert_eq!(color.apply_to_c("c"), "C.enum_foo_color(c)");

    let handle = types.conv(&TypeRef::Decl(f.handle), None, None, Position::Return);
    assert_eq!(handle.go, "FooHandle");
    assert_eq!(handle.apply_to_c("h"), "C.foo_handle(unsafe.Pointer(h))");
    assert_eq!(handle.apply_from_c("__ret").unwrap(), "FooHandle(unsafe.Pointer(__ret))");

    // raw structs share their layout, so pointers to them reinterpret
    let raw_ptr = types.conv(&ptr(TypeRef::Decl(f.raw)), None, None, Position::Param);
    assert_eq!(raw_ptr.go, "*FooRaw");
}

#[test]
fn typedefs_follow_their_target() {
    let f = fixture();
    let types = TypeMapper::new(&f.model);

    let size = types.conv(&TypeRef::Decl(f.size), None, None, Position::Param);
    assert_eq!(size.apply_to_c("n"), "C.foo_size_t(n)");
    assert_eq!(size.apply_from_c("__ret").unwrap(), "FooSize(__ret)");

    let alias = types.conv(&TypeRef::Decl(f.point_t), None, None, Position::Field);
    assert_eq!(alias.go, "FooPointT");
    assert_eq!(alias.cgo, "C.foo_point_t");
    assert_eq!(alias.apply_to_c("x.P"), "C.foo_point_t(x.P.PassValue())");
    assert_eq!(
        alias.apply_from_c("ref.p").unwrap(),
        "NewFooPointFromC(C.struct_foo_point(ref.p))"
    );
    assert_eq!(alias.needs, vec![Need::Struct(f.point)]);
}

#[test]
fn callbacks_pass_by_reference() {
    let f = fixture();
    let types = TypeMapper::new(&f.model);

    let param = types.conv(&TypeRef::Decl(f.callback), None, None, Position::Param);
    assert_eq!(param.go, "FooCb");
    assert_eq!(param.apply_to_c("cb"), "cb.PassRef()");
    assert_eq!(param.from_c, None);

    // no way back from a C function pointer
    let ret = types.conv(&TypeRef::Decl(f.callback), None, None, Position::Return);
    assert_eq!(ret.go, "unsafe.Pointer");
    assert_eq!(ret.apply_to_c("p"), "C.foo_cb(p)");
}

#[test]
fn fixed_arrays_reinterpret_in_place() {
    let f = fixture();
    let types = TypeMapper::new(&f.model);
    let conv = types.conv(
        &TypeRef::array(TypeRef::Scalar(Scalar::Int), Some(4)),
        None,
        None,
        Position::Field,
    );
    assert_eq!(conv.go, "[4]int32");
    assert_eq!(conv.cgo, "[4]C.int");
    assert_eq!(conv.apply_to_c("x.V"), "*(*[4]C.int)(unsafe.Pointer(&x.V))");
    assert_eq!(
        conv.apply_from_c("ref.v").unwrap(),
        "*(*[4]int32)(unsafe.Pointer(&ref.v))"
    );
}

#[test]
fn cgo_names_and_c_spellings() {
    let f = fixture();
    let types = TypeMapper::new(&f.model);
    assert_eq!(types.cgo_type(&TypeRef::Decl(f.vec)), "C.foo_vec_t");
    assert_eq!(types.cgo_type(&TypeRef::Decl(f.point)), "C.struct_foo_point");
    assert_eq!(
        types.cgo_type(&TypeRef::Unresolved("struct FILE".to_string())),
        "C.struct_FILE"
    );
    assert_eq!(
        types.c_spelling(&TypeRef::pointer(TypeRef::Decl(f.point), true)),
        "const struct foo_point *"
    );
    assert_eq!(types.c_spelling(&TypeRef::Decl(f.vec)), "foo_vec_t");
    assert_eq!(
        types.c_spelling(&TypeRef::Scalar(Scalar::ULongLong)),
        "unsigned long long"
    );
}

#[test]
fn identifiers() {
    assert_eq!(go_ident("type"), "type_");
    assert_eq!(go_ident("count"), "count");
    assert_eq!(go_ident(""), "_");
    assert_eq!(cgo_field("range"), "_range");
    assert_eq!(helper_suffix("C.struct_foo_point"), "StructFooPoint");
    assert_eq!(helper_suffix("C.uint8_t"), "Uint8T");
}
