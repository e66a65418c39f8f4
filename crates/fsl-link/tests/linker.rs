//! Linker scenarios: independent functions, dependency chains, cycles,
//! determinism and role reference rewriting.
//!
//! Expected hashes are computed through the same SHA-1-over-canonical
//! path the linker uses, never hard-coded.

use fsl_ast::Declaration;
use fsl_link::link_functions;
use fsl_parser::parse;
use fsl_printer::canonical_declaration;
use sha1::{Digest, Sha1};

fn sha1_hex(input: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Expected hash of a standalone function source (no unresolved deps).
fn expected_hash(fn_source: &str) -> String {
    let tree = parse(fn_source, "h.fsl").expect("parse failed");
    sha1_hex(&canonical_declaration(&tree.declarations[0]))
}

fn body_of(tree: &fsl_ast::SchemaTree, index: usize) -> &str {
    match &tree.declarations[index] {
        Declaration::Function(f) => &f.body.text,
        _ => panic!("expected function"),
    }
}

fn name_of(tree: &fsl_ast::SchemaTree, index: usize) -> &str {
    tree.declarations[index].name()
}

#[test]
fn independent_functions_get_distinct_suffixes() {
    let mut tree = parse("function a() { 1 }\nfunction b() { 2 }", "t.fsl").expect("parse failed");
    let map = link_functions(&mut tree).expect("link failed");

    assert_eq!(map.len(), 2);
    assert_eq!(map["a"], format!("a_{}", expected_hash("function a() { 1 }")));
    assert_eq!(map["b"], format!("b_{}", expected_hash("function b() { 2 }")));
    assert_ne!(
        map["a"].trim_start_matches("a_"),
        map["b"].trim_start_matches("b_")
    );

    // Names rewritten in place; bodies untouched.
    assert_eq!(name_of(&tree, 0), map["a"]);
    assert_eq!(name_of(&tree, 1), map["b"]);
    assert_eq!(body_of(&tree, 0).trim(), "1");
    assert_eq!(body_of(&tree, 1).trim(), "2");
}

#[test]
fn dependency_hash_propagates() {
    let mut tree =
        parse("function a() { 1 }\nfunction b() { a() }", "t.fsl").expect("parse failed");
    let map = link_functions(&mut tree).expect("link failed");

    let a_mangled = format!("a_{}", expected_hash("function a() { 1 }"));
    assert_eq!(map["a"], a_mangled);

    // b hashes with the call already rewritten to a's mangled name.
    let b_hash = expected_hash(&format!("function b() {{ {a_mangled}() }}"));
    assert_eq!(map["b"], format!("b_{b_hash}"));
    assert_eq!(body_of(&tree, 1).trim(), format!("{a_mangled}()"));
}

#[test]
fn mutual_recursion_shares_one_hash() {
    let mut tree =
        parse("function f() { g() }\nfunction g() { f() }", "t.fsl").expect("parse failed");
    let map = link_functions(&mut tree).expect("link failed");

    let f_suffix = map["f"].trim_start_matches("f_").to_string();
    let g_suffix = map["g"].trim_start_matches("g_").to_string();
    assert_eq!(f_suffix, g_suffix, "one SCC, one hash");
    assert_eq!(f_suffix.len(), 40);
    assert!(f_suffix.chars().all(|c| c.is_ascii_hexdigit()));

    // Internal calls rewritten to the mangled forms.
    assert_eq!(body_of(&tree, 0).trim(), format!("{}()", map["g"]));
    assert_eq!(body_of(&tree, 1).trim(), format!("{}()", map["f"]));
}

#[test]
fn self_recursion_is_a_one_element_cycle() {
    let mut tree = parse("function r() { r(n) }", "t.fsl").expect("parse failed");
    let map = link_functions(&mut tree).expect("link failed");
    assert_eq!(body_of(&tree, 0).trim(), format!("{}(n)", map["r"]));
    assert_eq!(name_of(&tree, 0), map["r"]);
}

#[test]
fn chain_behind_a_cycle_still_links() {
    let source = "function f() { g() }\nfunction g() { f() }\nfunction h() { f() + 1 }";
    let mut tree = parse(source, "t.fsl").expect("parse failed");
    let map = link_functions(&mut tree).expect("link failed");
    assert_eq!(map.len(), 3);
    // h's reference picked up f's mangled name.
    assert!(body_of(&tree, 2).contains(&map["f"]));
    assert!(map["h"].starts_with("h_"));
}

#[test]
fn only_udf_identifiers_are_rewritten() {
    let source = "function a() { 1 }\nfunction b() { a() + aa() + x.a + \"a\" }";
    let mut tree = parse(source, "t.fsl").expect("parse failed");
    let map = link_functions(&mut tree).expect("link failed");
    let body = body_of(&tree, 1);
    // `aa` is not a UDF; the string literal stays; the property access
    // rewrites because the walker matches identifiers, not call sites.
    assert!(body.contains(&format!("{}()", map["a"])));
    assert!(body.contains("aa()"));
    assert!(body.contains("\"a\""));
}

#[test]
fn linking_is_deterministic() {
    let source = "function f() { g() }\nfunction g() { f() }\nfunction h() { g() }";
    let mut first = parse(source, "t.fsl").expect("parse failed");
    let mut second = parse(source, "t.fsl").expect("parse failed");
    let map_a = link_functions(&mut first).expect("link failed");
    let map_b = link_functions(&mut second).expect("link failed");
    assert_eq!(map_a, map_b);
}

#[test]
fn formatting_does_not_change_hashes() {
    // Code-equal up to whitespace: canonical forms agree, so the mangled
    // names agree.
    let mut compact = parse("function a() { 1 }", "a.fsl").expect("parse failed");
    let mut spread = parse("function a() {\n  1\n}", "b.fsl").expect("parse failed");
    let map_a = link_functions(&mut compact).expect("link failed");
    let map_b = link_functions(&mut spread).expect("link failed");
    assert_eq!(map_a["a"], map_b["a"]);
}

#[test]
fn role_resources_and_predicates_are_rewritten() {
    let source = "function f() { 1 }\nrole r {\n  membership Users { f(doc) }\n  privileges f {\n    call\n    read { f(doc.id) }\n  }\n}";
    let mut tree = parse(source, "t.fsl").expect("parse failed");
    let map = link_functions(&mut tree).expect("link failed");

    let Declaration::Role(role) = &tree.declarations[1] else {
        panic!("expected role");
    };
    let mut saw_privileges = false;
    let mut saw_membership = false;
    for member in &role.members {
        match member {
            fsl_ast::RoleMember::Privileges(p) => {
                saw_privileges = true;
                assert_eq!(p.resource.text, map["f"]);
                let read = p
                    .actions
                    .iter()
                    .find(|a| a.kind == fsl_ast::ActionKind::Read)
                    .expect("read action");
                assert!(read
                    .predicate
                    .as_ref()
                    .expect("read predicate")
                    .text
                    .contains(&map["f"]));
            }
            fsl_ast::RoleMember::Membership(m) => {
                saw_membership = true;
                // collection name is not a UDF; predicate references are.
                assert_eq!(m.collection.text, "Users");
                assert!(m
                    .predicate
                    .as_ref()
                    .expect("membership predicate")
                    .text
                    .contains(&map["f"]));
            }
        }
    }
    assert!(saw_privileges && saw_membership);
}

#[test]
fn non_function_declarations_are_untouched() {
    let source = "collection C { x: String }\nfunction a() { 1 }";
    let mut tree = parse(source, "t.fsl").expect("parse failed");
    link_functions(&mut tree).expect("link failed");
    assert_eq!(tree.declarations[0].name(), "C");
}

#[test]
fn empty_tree_links_to_empty_map() {
    let mut tree = parse("collection C { }", "t.fsl").expect("parse failed");
    let map = link_functions(&mut tree).expect("link failed");
    assert!(map.is_empty());
}
