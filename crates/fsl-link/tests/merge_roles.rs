//! Role merger scenarios: action union, conflicts, membership
//! deduplication, ordering and idempotence.

use fsl_ast::{ActionKind, CodeEq, Declaration, RoleMember};
use fsl_link::{merge_roles, MergeError};
use fsl_parser::parse;

fn tree(source: &str) -> fsl_ast::SchemaTree {
    parse(source, "roles.fsl").expect("parse failed")
}

fn role<'t>(tree: &'t fsl_ast::SchemaTree, name: &str) -> &'t fsl_ast::RoleDecl {
    tree.declarations
        .iter()
        .find_map(|d| match d {
            Declaration::Role(r) if r.name.text == name => Some(r),
            _ => None,
        })
        .unwrap_or_else(|| panic!("role {name} not found"))
}

#[test]
fn same_resource_actions_union() {
    let merged = merge_roles(tree(
        "role R {\n  privileges Users {\n    read\n  }\n}\nrole R {\n  privileges Users {\n    write\n  }\n}",
    ))
    .expect("merge failed");

    assert_eq!(merged.len(), 1);
    let r = role(&merged, "R");
    assert_eq!(r.members.len(), 1);
    let RoleMember::Privileges(p) = &r.members[0] else {
        panic!("expected privileges");
    };
    assert_eq!(p.resource.text, "Users");
    let kinds: Vec<ActionKind> = p.actions.iter().map(|a| a.kind).collect();
    assert_eq!(kinds, vec![ActionKind::Read, ActionKind::Write]);
}

#[test]
fn conflicting_predicates_fail() {
    let err = merge_roles(tree(
        "role R {\n  privileges Users {\n    read { .a }\n  }\n}\nrole R {\n  privileges Users {\n    read { .b }\n  }\n}",
    ))
    .expect_err("conflict expected");
    assert_eq!(
        err,
        MergeError::DuplicateAction {
            resource: "Users".to_string(),
            action: ActionKind::Read,
        }
    );
}

#[test]
fn predicate_and_no_predicate_conflict() {
    let err = merge_roles(tree(
        "role R {\n  privileges Users {\n    read { .a }\n  }\n}\nrole R {\n  privileges Users {\n    read\n  }\n}",
    ))
    .expect_err("conflict expected");
    assert!(matches!(err, MergeError::DuplicateAction { .. }));
}

#[test]
fn code_equal_predicates_dedupe() {
    // Same predicate, different positions and indentation.
    let merged = merge_roles(tree(
        "role R {\n  privileges Users {\n    read {\n      .a\n    }\n  }\n}\nrole R {\n  privileges Users { read { .a } }\n}",
    ))
    .expect("merge failed");
    let r = role(&merged, "R");
    let RoleMember::Privileges(p) = &r.members[0] else {
        panic!("expected privileges");
    };
    assert_eq!(p.actions.len(), 1);
}

#[test]
fn identical_memberships_dedupe() {
    let merged = merge_roles(tree(
        "role R {\n  membership Users { .ok }\n}\nrole R {\n  membership Users { .ok }\n}",
    ))
    .expect("merge failed");
    let r = role(&merged, "R");
    assert_eq!(r.members.len(), 1);
}

#[test]
fn conflicting_memberships_fail() {
    let err = merge_roles(tree(
        "role R {\n  membership Users { .a }\n}\nrole R {\n  membership Users { .b }\n}",
    ))
    .expect_err("conflict expected");
    assert_eq!(err, MergeError::DuplicateMembership("Users".to_string()));
}

#[test]
fn memberships_for_different_collections_coexist() {
    let merged = merge_roles(tree(
        "role R {\n  membership Users\n}\nrole R {\n  membership Admins\n}",
    ))
    .expect("merge failed");
    assert_eq!(role(&merged, "R").members.len(), 2);
}

#[test]
fn non_roles_first_then_roles_in_first_seen_order() {
    let merged = merge_roles(tree(
        "role Z { }\ncollection C { }\nrole A { }\nfunction f() { 1 }\nrole Z { }",
    ))
    .expect("merge failed");
    let names: Vec<&str> = merged.declarations.iter().map(|d| d.name()).collect();
    assert_eq!(names, vec!["C", "f", "Z", "A"]);
}

#[test]
fn single_roles_pass_through() {
    let merged = merge_roles(tree(
        "role R {\n  privileges Users {\n    read\n  }\n  membership Users\n}",
    ))
    .expect("merge failed");
    assert_eq!(role(&merged, "R").members.len(), 2);
}

#[test]
fn merge_is_idempotent() {
    let source = "role R {\n  privileges Users {\n    read\n  }\n}\nrole R {\n  privileges Users {\n    write { .w }\n  }\n  membership Admins\n}\ncollection C { }";
    let once = merge_roles(tree(source)).expect("merge failed");
    let twice = merge_roles(once.clone()).expect("merge failed");
    assert!(once.code_eq(&twice));
}

#[test]
fn privileges_on_distinct_resources_stay_separate() {
    let merged = merge_roles(tree(
        "role R {\n  privileges Users {\n    read\n  }\n}\nrole R {\n  privileges Orders {\n    read\n  }\n}",
    ))
    .expect("merge failed");
    let r = role(&merged, "R");
    assert_eq!(r.members.len(), 2);
}
