//! Role merging.
//!
//! Multiple declarations of the same role fuse into one. Privileges on
//! the same resource union their actions; memberships for the same
//! collection deduplicate. Conflicts — the same action tag with
//! different predicates, or differing memberships — fail the merge.

use fsl_ast::{
    ActionKind, CodeEq, Declaration, PrivilegeAction, Privileges, RoleDecl, RoleMember,
    SchemaTree,
};
use indexmap::IndexMap;
use thiserror::Error;

/// Role merge failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    /// Two predicates disagree for the same action on the same resource.
    #[error("conflicting {action} action on resource {resource:?}")]
    DuplicateAction {
        resource: String,
        action: ActionKind,
    },
    /// Two memberships disagree for the same collection.
    #[error("conflicting membership for collection {0:?}")]
    DuplicateMembership(String),
    /// Privilege groups with different resources reached the merger.
    #[error("privilege resources do not match")]
    NonMatchingResource,
}

/// Consolidate every role name into a single declaration.
///
/// Non-role declarations keep their original order and come first;
/// merged roles follow in first-seen order. Consumes the tree.
pub fn merge_roles(tree: SchemaTree) -> Result<SchemaTree, MergeError> {
    let SchemaTree {
        sources,
        declarations,
        extras,
    } = tree;

    let mut others: Vec<Declaration> = Vec::new();
    let mut groups: IndexMap<String, Vec<RoleDecl>> = IndexMap::new();
    for decl in declarations {
        match decl {
            Declaration::Role(role) => {
                groups.entry(role.name.text.clone()).or_default().push(role)
            }
            other => others.push(other),
        }
    }

    let mut merged_declarations = others;
    for (_, group) in groups {
        merged_declarations.push(Declaration::Role(merge_group(group)?));
    }

    Ok(SchemaTree {
        sources,
        declarations: merged_declarations,
        extras,
    })
}

/// Merge every declaration of one role name, deduplicating members.
fn merge_group(group: Vec<RoleDecl>) -> Result<RoleDecl, MergeError> {
    let mut iter = group.into_iter();
    let mut first = iter.next().expect("role groups are non-empty");

    let mut all_members: Vec<RoleMember> = std::mem::take(&mut first.members);
    for role in iter {
        all_members.extend(role.members);
    }

    let mut members: Vec<RoleMember> = Vec::new();
    for member in all_members {
        match member {
            RoleMember::Privileges(privileges) => {
                let existing = members.iter_mut().find_map(|m| match m {
                    RoleMember::Privileges(e) if e.resource.text == privileges.resource.text => {
                        Some(e)
                    }
                    _ => None,
                });
                match existing {
                    Some(existing) => merge_privileges(existing, privileges)?,
                    None => members.push(RoleMember::Privileges(privileges)),
                }
            }
            RoleMember::Membership(membership) => {
                let existing = members.iter().find_map(|m| match m {
                    RoleMember::Membership(e)
                        if e.collection.text == membership.collection.text =>
                    {
                        Some(e)
                    }
                    _ => None,
                });
                match existing {
                    Some(existing) => {
                        if !existing.code_eq(&membership) {
                            return Err(MergeError::DuplicateMembership(
                                membership.collection.text.clone(),
                            ));
                        }
                        // identical duplicate, drop it
                    }
                    None => members.push(RoleMember::Membership(membership)),
                }
            }
        }
    }

    Ok(RoleDecl {
        name: first.name,
        members,
        span: first.span,
    })
}

/// Union the actions of two privilege groups on the same resource.
fn merge_privileges(existing: &mut Privileges, incoming: Privileges) -> Result<(), MergeError> {
    if existing.resource.text != incoming.resource.text {
        return Err(MergeError::NonMatchingResource);
    }
    for action in incoming.actions {
        match existing.actions.iter().find(|a| a.kind == action.kind) {
            Some(found) => {
                if !predicates_equal(found, &action) {
                    return Err(MergeError::DuplicateAction {
                        resource: existing.resource.text.clone(),
                        action: action.kind,
                    });
                }
                // identical duplicate, drop it
            }
            None => existing.actions.push(action),
        }
    }
    Ok(())
}

fn predicates_equal(a: &PrivilegeAction, b: &PrivilegeAction) -> bool {
    match (&a.predicate, &b.predicate) {
        (None, None) => true,
        (Some(pa), Some(pb)) => pa.code_eq(pb),
        _ => false,
    }
}
