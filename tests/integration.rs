//! End-to-end tests against the public `Database` API, exercising source
//! text through to effective-value resolution the way a caller outside the
//! crate would (spec.md §8's scenario list plus a few cross-cutting cases
//! the module-local unit tests don't reach: dotted namespaces, the `[+X]`
//! inheritance-add clause, and multi-file loads).

use nyan_core::{Database, LangErrorKind, Value};

#[test]
fn dotted_fqons_resolve_through_the_namespace_tree() {
    let mut db = Database::new();
    db.load(
        "game.nyan",
        "game.unit.Soldier():\n    hp : int = 10\ngame.unit.Veteran<game.unit.Soldier>():\n    hp += 5\n",
    )
    .unwrap();
    let soldier = db.get("game.unit.Soldier").unwrap();
    assert_eq!(soldier.effective_value("hp").unwrap(), Value::Int(15));
    assert!(db.get("game.unit").is_none());
}

#[test]
fn inheritance_add_clause_extends_every_patch_target_parent_list() {
    let mut db = Database::new();
    db.load(
        "m.nyan",
        "Base():\n    pass\nMixin():\n    tag : text = \"mixin\"\nPatch<Base>[+Mixin]():\n    pass\n",
    )
    .unwrap();
    let base = db.get("Base").unwrap();
    let names: Vec<&str> = base.linearization().unwrap().iter().map(|h| h.fqon()).collect();
    assert_eq!(names, vec!["Base", "Mixin"]);
    assert_eq!(base.effective_value("tag").unwrap(), Value::Text("mixin".to_string()));
}

#[test]
fn a_second_load_call_sees_objects_from_the_first() {
    let mut db = Database::new();
    db.load("a.nyan", "A():\n    x : int = 1\n").unwrap();
    db.load("b.nyan", "B(A):\n    pass\n").unwrap();
    let b = db.get("B").unwrap();
    assert_eq!(b.effective_value("x").unwrap(), Value::Int(1));
}

#[test]
fn set_member_union_and_intersect_patches() {
    let mut db = Database::new();
    db.load(
        "sets.nyan",
        "Base():\n    tags : set(text) = <\"a\", \"b\">\nAdd<Base>():\n    tags |= <\"b\", \"c\">\n",
    )
    .unwrap();
    let base = db.get("Base").unwrap();
    let Value::Set(items) = base.effective_value("tags").unwrap() else {
        panic!("expected a set");
    };
    let mut text: Vec<String> = items
        .into_iter()
        .map(|v| match v {
            Value::Text(s) => s,
            other => panic!("unexpected element {:?}", other),
        })
        .collect();
    text.sort();
    assert_eq!(text, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
}

#[test]
fn filename_member_accepts_a_string_literal() {
    let mut db = Database::new();
    db.load("f.nyan", "Sprite():\n    path : file = \"textures/unit.png\"\n").unwrap();
    let sprite = db.get("Sprite").unwrap();
    assert_eq!(sprite.effective_value("path").unwrap(), Value::Filename("textures/unit.png".to_string()));
}

#[test]
fn object_typed_member_requires_a_descendant_value() {
    let mut db = Database::new();
    let err = db
        .load(
            "obj.nyan",
            "Base():\n    pass\nOther():\n    pass\nHolder():\n    ref : Base = Other\n",
        )
        .unwrap_err();
    assert_eq!(err.kind, LangErrorKind::Type);
    assert!(db.get("Holder").is_none());
}

#[test]
fn object_typed_member_accepts_a_descendant_value() {
    let mut db = Database::new();
    db.load(
        "obj2.nyan",
        "Base():\n    pass\nChild(Base):\n    pass\nHolder():\n    ref : Base = Child\n",
    )
    .unwrap();
    let holder = db.get("Holder").unwrap();
    match holder.effective_value("ref").unwrap() {
        Value::ObjectRef(r) => assert_eq!(db.namespace().fqon(r), "Child"),
        other => panic!("unexpected value {:?}", other),
    }
}

#[test]
fn patch_target_type_disagreement_is_rejected() {
    let mut db = Database::new();
    let err = db
        .load(
            "disagree.nyan",
            "A():\n    k : int = 1\nB():\n    k : float = 1.0\nP<A, B>():\n    k += 1\n",
        )
        .unwrap_err();
    assert_eq!(err.kind, LangErrorKind::Type);
}

#[test]
fn repeated_patch_assign_is_idempotent() {
    let mut db = Database::new();
    db.load("idem.nyan", "A():\n    k : int = 1\nP<A>():\n    k = 9\n").unwrap();
    let a = db.get("A").unwrap();
    let first = a.effective_value("k").unwrap();
    let second = a.effective_value("k").unwrap();
    assert_eq!(first, Value::Int(9));
    assert_eq!(first, second);
}
