//! Content-addressed renaming of user-defined functions.
//!
//! Every UDF becomes `<name>_<hash>` where `<hash>` is the lowercase hex
//! SHA-1 of the canonical printed forms of the functions in its strongly
//! connected component, dependency references already rewritten when
//! hashed — so hashes propagate through the dependency graph and a
//! function's mangled name is stable under anything that leaves its
//! canonical form (and its dependencies') unchanged.

use crate::cycles::detect_cycles;
use fsl_ast::{Declaration, RoleMember, SchemaTree};
use fsl_parser::{identifiers, rewrite_identifiers};
use fsl_printer::canonical_declaration;
use indexmap::IndexMap;
use sha1::{Digest, Sha1};
use std::collections::HashSet;
use thiserror::Error;

/// Linker failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// The canonical printer failed while producing a hash input.
    #[error("canonical printing failed during hash computation")]
    HashComputationFailed,
}

/// One UDF in the dependency index.
struct FunctionInfo {
    /// Index of the declaration in the tree.
    decl_index: usize,
    /// Dependency names in first-appearance order, deduplicated. Any
    /// body identifier matching a UDF name counts, self-references
    /// included.
    deps: Vec<String>,
}

/// Mangle every UDF name in place and rewrite all references to it:
/// call sites in other bodies, role privilege resources, and role
/// predicate blobs.
///
/// Returns the `{original: mangled}` map in declaration order.
pub fn link_functions(tree: &mut SchemaTree) -> Result<IndexMap<String, String>, LinkError> {
    let functions = index_functions(tree);
    let mut unlinked: Vec<String> = functions.keys().cloned().collect();
    let mut mangled: IndexMap<String, String> = IndexMap::new();

    while !unlinked.is_empty() {
        // Leaves: every dependency already mangled. Their hashes are
        // independent of each other, so declaration order is fine.
        let ready: Vec<String> = unlinked
            .iter()
            .filter(|name| {
                functions[name.as_str()]
                    .deps
                    .iter()
                    .all(|dep| mangled.contains_key(dep))
            })
            .cloned()
            .collect();

        if !ready.is_empty() {
            for name in &ready {
                let info = &functions[name.as_str()];
                rewrite_body(tree, info.decl_index, &mangled);
                let hash = sha1_hex(&canonical_declaration(&tree.declarations[info.decl_index]));
                let new_name = format!("{name}_{hash}");
                rename_function(tree, info.decl_index, &new_name);
                mangled.insert(name.clone(), new_name);
            }
            unlinked.retain(|name| !ready.contains(name));
            continue;
        }

        // No leaves left: the remaining graph is held up by cycles.
        // Process every SCC whose external dependencies are all mangled;
        // the rest unlock on a later iteration.
        let remaining: HashSet<&str> = unlinked.iter().map(String::as_str).collect();
        let graph: IndexMap<String, Vec<String>> = unlinked
            .iter()
            .map(|name| {
                let deps = functions[name.as_str()]
                    .deps
                    .iter()
                    .filter(|dep| remaining.contains(dep.as_str()))
                    .cloned()
                    .collect();
                (name.clone(), deps)
            })
            .collect();

        let mut progressed = false;
        for cycle in detect_cycles(&graph) {
            let external_ready = cycle.iter().all(|name| {
                functions[name.as_str()]
                    .deps
                    .iter()
                    .all(|dep| cycle.contains(dep) || mangled.contains_key(dep))
            });
            if !external_ready {
                continue;
            }

            // External references first, so the hash sees them mangled.
            for name in &cycle {
                rewrite_body(tree, functions[name.as_str()].decl_index, &mangled);
            }

            let mut hash_input = String::new();
            for name in &cycle {
                hash_input.push_str(&canonical_declaration(
                    &tree.declarations[functions[name.as_str()].decl_index],
                ));
            }
            let hash = sha1_hex(&hash_input);

            // Pre-populate before rewriting so self- and intra-cycle
            // references pick up their mangled forms.
            for name in &cycle {
                mangled.insert(name.clone(), format!("{name}_{hash}"));
            }
            for name in &cycle {
                let index = functions[name.as_str()].decl_index;
                rewrite_body(tree, index, &mangled);
                let new_name = mangled[name.as_str()].clone();
                rename_function(tree, index, &new_name);
            }
            unlinked.retain(|name| !cycle.contains(name));
            progressed = true;
        }

        if !progressed {
            // The SCC condensation is a DAG, so some cycle is always
            // externally ready here.
            unreachable!("function dependency graph made no progress");
        }
    }

    rewrite_roles(tree, &mangled);
    Ok(mangled)
}

/// Build the name → (declaration, dependencies) index.
fn index_functions(tree: &SchemaTree) -> IndexMap<String, FunctionInfo> {
    let names: HashSet<String> = tree
        .declarations
        .iter()
        .filter_map(|decl| match decl {
            Declaration::Function(f) => Some(f.name.text.clone()),
            _ => None,
        })
        .collect();

    let mut functions = IndexMap::new();
    for (index, decl) in tree.declarations.iter().enumerate() {
        let Declaration::Function(f) = decl else {
            continue;
        };
        let mut deps: Vec<String> = Vec::new();
        for ident in identifiers(&f.body.text) {
            if names.contains(ident.text) && !deps.iter().any(|d| d == ident.text) {
                deps.push(ident.text.to_string());
            }
        }
        functions.insert(
            f.name.text.clone(),
            FunctionInfo {
                decl_index: index,
                deps,
            },
        );
    }
    functions
}

/// Rewrite every identifier of a function body that has an entry in the
/// mangled map.
fn rewrite_body(tree: &mut SchemaTree, index: usize, mangled: &IndexMap<String, String>) {
    if mangled.is_empty() {
        return;
    }
    if let Declaration::Function(f) = &mut tree.declarations[index] {
        f.body.text = rewrite_identifiers(&f.body.text, |id| mangled.get(id).cloned());
    }
}

fn rename_function(tree: &mut SchemaTree, index: usize, new_name: &str) {
    if let Declaration::Function(f) = &mut tree.declarations[index] {
        f.name.text = new_name.to_string();
    }
}

/// Rewrite UDF references held by roles: privilege resources match by
/// exact text; membership and action predicates are scanned like bodies.
fn rewrite_roles(tree: &mut SchemaTree, mangled: &IndexMap<String, String>) {
    if mangled.is_empty() {
        return;
    }
    for decl in &mut tree.declarations {
        let Declaration::Role(role) = decl else {
            continue;
        };
        for member in &mut role.members {
            match member {
                RoleMember::Privileges(p) => {
                    if let Some(new_name) = mangled.get(&p.resource.text) {
                        p.resource.text = new_name.clone();
                    }
                    for action in &mut p.actions {
                        if let Some(predicate) = &mut action.predicate {
                            predicate.text =
                                rewrite_identifiers(&predicate.text, |id| mangled.get(id).cloned());
                        }
                    }
                }
                RoleMember::Membership(m) => {
                    if let Some(predicate) = &mut m.predicate {
                        predicate.text =
                            rewrite_identifiers(&predicate.text, |id| mangled.get(id).cloned());
                    }
                }
            }
        }
    }
}

/// Lowercase hex SHA-1.
fn sha1_hex(input: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}
