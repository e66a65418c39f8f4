//! End-to-end properties of the toolchain: round-tripping, linker
//! stability and determinism, reference integrity, merge idempotence,
//! filter/remove laws and extras preservation.

use fsl::{
    canonical, link_functions, merge_roles, parse, parse_sources, CodeEq, DeclarationKind,
};

const RICH_SCHEMA: &str = r#"// accounts schema
access provider oauth {
  issuer "https://idp.example.com"
  jwks_uri "https://idp.example.com/jwks"
  role reader
  ttl 3600
}

collection Account as Document {
  history_days 30
  owner: Ref<User>
  balance: Number
  note

  compute display: String {
    "acct " + .owner
  }
  check positive {
    .balance >= 0
  }
  unique [.owner]
  index byOwner {
    terms [.owner]
  }
}

function deposit(acct: Ref<Account>, amount: Number): Number {
  acct.balance + amount
}

function audit(acct) {
  deposit(acct, 0)
}

role reader {
  membership Account {
    .balance >= 0
  }
  privileges Account {
    read
    history_read
  }
}
"#;

/// Round-trip: parse(canonical(T)) is code-equal to T.
#[test]
fn p1_round_trip_code_equality() {
    let tree = parse(RICH_SCHEMA, "rich.fsl").expect("parse failed");
    let printed = canonical(&tree);
    let reparsed = parse(&printed, "rich.fsl").expect("reparse failed");
    assert!(tree.code_eq(&reparsed), "round trip lost information");
}

/// Round-trip after operations: link + merge output still round-trips.
#[test]
fn p1_round_trip_after_operations() {
    let mut tree = merge_roles(parse(RICH_SCHEMA, "rich.fsl").expect("parse failed"))
        .expect("merge failed");
    link_functions(&mut tree).expect("link failed");
    let printed = canonical(&tree);
    let reparsed = parse(&printed, "rich.fsl").expect("reparse failed");
    assert!(tree.code_eq(&reparsed));
}

/// Canonical printing is a fixed point after one application.
#[test]
fn canonical_is_stable() {
    let once = canonical(&parse(RICH_SCHEMA, "rich.fsl").expect("parse failed"));
    let twice = canonical(&parse(&once, "rich.fsl").expect("reparse failed"));
    assert_eq!(once, twice);
}

/// Linker stability: trees that are code-equal up to formatting agree on
/// every mangled name.
#[test]
fn p2_linker_stability_across_formatting() {
    let mut compact = parse(
        "function a() { inc(1) }\nfunction inc(x) { x + 1 }",
        "a.fsl",
    )
    .expect("parse failed");
    let mut spread = parse(
        "function a() {\n    inc(1)\n}\nfunction inc(x) {\n    x + 1\n}",
        "b.fsl",
    )
    .expect("parse failed");
    let map_a = link_functions(&mut compact).expect("link failed");
    let map_b = link_functions(&mut spread).expect("link failed");
    assert_eq!(map_a, map_b);
}

/// Linker determinism: independent runs agree.
#[test]
fn p3_linker_determinism() {
    let maps: Vec<_> = (0..2)
        .map(|_| {
            let mut tree = parse(RICH_SCHEMA, "rich.fsl").expect("parse failed");
            link_functions(&mut tree).expect("link failed")
        })
        .collect();
    assert_eq!(maps[0], maps[1]);
}

/// Reference integrity: every UDF reference now reads the mangled name;
/// non-UDF identifiers survive untouched.
#[test]
fn p4_reference_integrity() {
    let mut tree = parse(RICH_SCHEMA, "rich.fsl").expect("parse failed");
    let map = link_functions(&mut tree).expect("link failed");
    let printed = canonical(&tree);

    for (original, mangled) in &map {
        assert!(printed.contains(mangled), "missing {mangled}");
        // The original bare name must not survive as a call:
        assert!(
            !printed.contains(&format!("{original}(")),
            "unrewritten reference to {original}"
        );
    }
    // Unrelated identifiers and collection names are untouched.
    assert!(printed.contains("collection Account"));
    assert!(printed.contains("amount"));
}

/// merge_roles(merge_roles(T)) equals merge_roles(T).
#[test]
fn p5_merge_roles_idempotent() {
    let source = "role R {\n  privileges Users {\n    read\n  }\n}\nrole R {\n  privileges Users {\n    write\n  }\n  membership Admins\n}";
    let once = merge_roles(parse(source, "r.fsl").expect("parse failed")).expect("merge failed");
    let twice = merge_roles(once.clone()).expect("merge failed");
    assert!(once.code_eq(&twice));
    assert_eq!(canonical(&once), canonical(&twice));
}

/// filter(k) keeps exactly kind k; remove(k, n) shrinks by one iff a
/// match exists.
#[test]
fn p6_filter_remove_law() {
    let tree = parse(RICH_SCHEMA, "rich.fsl").expect("parse failed");

    let functions = tree.filter(DeclarationKind::Function);
    assert_eq!(functions.len(), 2);
    assert!(functions
        .declarations
        .iter()
        .all(|d| d.kind() == DeclarationKind::Function));

    let mut tree = tree;
    let before = tree.len();
    assert!(tree.remove(DeclarationKind::Function, "audit"));
    assert_eq!(tree.len(), before - 1);
    assert!(!tree.remove(DeclarationKind::Function, "audit"));
    assert_eq!(tree.len(), before - 1);
}

/// Extras preservation: comments and blank lines reappear at the same
/// relative anchors.
#[test]
fn p7_extras_preserved() {
    let source = "// header\ncollection C {\n  a: String\n\n  b: String\n}\n";
    let printed = canonical(&parse(source, "c.fsl").expect("parse failed"));
    assert_eq!(printed, source);
}

/// Multi-file merge keeps declarations, extras and spans coherent.
#[test]
fn merged_files_round_trip() {
    let tree = parse_sources([
        ("a.fsl", "// from a\ncollection A {\n  x: String\n}\n"),
        ("b.fsl", "// from b\nrole R {\n  privileges A {\n    read\n  }\n}\n"),
    ])
    .expect("parse failed");
    assert_eq!(tree.len(), 2);

    let printed = canonical(&tree);
    assert!(printed.contains("// from a"));
    assert!(printed.contains("// from b"));

    let reparsed = parse(&printed, "merged.fsl").expect("reparse failed");
    assert!(tree.code_eq(&reparsed));
}

/// Scenario: linking a schema whose role privileges name a UDF.
#[test]
fn linked_schema_lists_mangled_role_resources() {
    let mut tree = parse(
        "function f() { 1 }\nrole r {\n  privileges f {\n    call\n  }\n}",
        "t.fsl",
    )
    .expect("parse failed");
    let map = link_functions(&mut tree).expect("link failed");

    let infos = tree.list_declarations();
    let role_info = infos.iter().find(|i| i.kind == "role").expect("role entry");
    assert_eq!(
        role_info.resources.as_deref(),
        Some(&[map["f"].clone()][..])
    );
    // Function entry carries the mangled name too (names were rewritten
    // in place).
    assert!(infos.iter().any(|i| i.kind == "function" && i.name == map["f"]));
}

/// Sorting is stable and keys on (kind, name).
#[test]
fn sort_orders_by_kind_then_name() {
    let mut tree = parse(
        "role z { }\nfunction b() { 1 }\ncollection A { }\nrole a { }",
        "s.fsl",
    )
    .expect("parse failed");
    tree.sort();
    let kinds_and_names: Vec<(DeclarationKind, &str)> = tree
        .declarations
        .iter()
        .map(|d| (d.kind(), d.name()))
        .collect();
    assert_eq!(
        kinds_and_names,
        vec![
            (DeclarationKind::Collection, "A"),
            (DeclarationKind::Function, "b"),
            (DeclarationKind::Role, "a"),
            (DeclarationKind::Role, "z"),
        ]
    );
}

/// The declarations JSON only gives roles a `resources` array.
#[test]
fn declarations_json_shape() {
    let tree = parse(RICH_SCHEMA, "rich.fsl").expect("parse failed");
    let json = tree.list_declarations_json().expect("serialize failed");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
    let entries = value.as_array().expect("array");
    assert_eq!(entries.len(), tree.len());
    for entry in entries {
        match entry["type"].as_str().expect("type") {
            "role" => assert!(entry["resources"].is_array()),
            _ => assert!(entry.get("resources").is_none()),
        }
    }
}
