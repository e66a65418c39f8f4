//! The schema tree and its operations.

use crate::ast::declaration::{Declaration, DeclarationKind, RoleMember};
use crate::ast::node::Extra;
use crate::ast::walk::visit_spans_mut;
use crate::foundation::SourceMap;
use serde::Serialize;
use std::rc::Rc;

/// Root of a parsed (or derived) schema.
///
/// The tree owns every node and string reachable from its declarations;
/// extras are shared between trees through `Rc`. Dropping the tree
/// releases everything it owns and decrements the extras' refcounts.
#[derive(Debug, Clone, Default)]
pub struct SchemaTree {
    /// File table for every span in the tree.
    pub sources: SourceMap,
    /// Declarations in source (or operation-defined) order.
    pub declarations: Vec<Declaration>,
    /// Comments and blank lines, anchored by position, in source order.
    pub extras: Vec<Rc<Extra>>,
}

/// One entry of the declarations listing (§ declarations JSON).
#[derive(Debug, Clone, Serialize)]
pub struct DeclarationInfo {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: String,
    /// Privilege resources; only present for roles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<String>>,
}

impl SchemaTree {
    /// An empty tree over the given file table.
    pub fn new(sources: SourceMap) -> Self {
        Self {
            sources,
            declarations: Vec::new(),
            extras: Vec::new(),
        }
    }

    /// Number of declarations.
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// True if the tree holds no declarations.
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Stable sort by `(kind tag, name)`.
    pub fn sort(&mut self) {
        self.declarations
            .sort_by(|a, b| (a.kind(), a.name()).cmp(&(b.kind(), b.name())));
    }

    /// A new tree holding deep duplicates of the declarations of `kind`.
    ///
    /// Extras are refcount-cloned, and the file table is carried over so
    /// the duplicated spans stay valid.
    pub fn filter(&self, kind: DeclarationKind) -> SchemaTree {
        SchemaTree {
            sources: self.sources.clone(),
            declarations: self
                .declarations
                .iter()
                .filter(|d| d.kind() == kind)
                .cloned()
                .collect(),
            extras: self.extras.clone(),
        }
    }

    /// Remove the first declaration matching `(kind, name)` in place.
    ///
    /// Returns true iff a declaration was removed.
    pub fn remove(&mut self, kind: DeclarationKind, name: &str) -> bool {
        match self
            .declarations
            .iter()
            .position(|d| d.kind() == kind && d.name() == name)
        {
            Some(idx) => {
                self.declarations.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Delete privilege members whose resource text equals `name` from
    /// every role.
    pub fn strip_roles_resource(&mut self, name: &str) {
        for decl in &mut self.declarations {
            if let Declaration::Role(role) = decl {
                role.members.retain(|member| match member {
                    RoleMember::Privileges(p) => p.resource.text != name,
                    RoleMember::Membership(_) => true,
                });
            }
        }
    }

    /// Merge two trees into one, consuming both.
    ///
    /// Declarations and extras concatenate in order; the absorbed tree's
    /// spans are re-based onto the merged file table.
    pub fn merge(mut self, mut other: SchemaTree) -> SchemaTree {
        let base = self.sources.absorb(std::mem::take(&mut other.sources));
        if base > 0 {
            for decl in &mut other.declarations {
                visit_spans_mut(decl, &mut |span| span.file_id += base);
            }
            for extra in &mut other.extras {
                // Extras may still be shared with a filtered tree; clone
                // on write keeps those trees untouched.
                let extra = Rc::make_mut(extra);
                extra.span.file_id += base;
            }
        }
        self.declarations.append(&mut other.declarations);
        self.extras.append(&mut other.extras);
        self
    }

    /// The declarations listing: `[{type, name, resources?}]`.
    pub fn list_declarations(&self) -> Vec<DeclarationInfo> {
        self.declarations
            .iter()
            .map(|decl| {
                let resources = match decl {
                    Declaration::Role(role) => {
                        let mut seen: Vec<String> = Vec::new();
                        for member in &role.members {
                            if let RoleMember::Privileges(p) = member {
                                if !seen.iter().any(|r| r == &p.resource.text) {
                                    seen.push(p.resource.text.clone());
                                }
                            }
                        }
                        Some(seen)
                    }
                    _ => None,
                };
                DeclarationInfo {
                    kind: decl.kind().as_str(),
                    name: decl.name().to_string(),
                    resources,
                }
            })
            .collect()
    }

    /// The declarations listing serialized to JSON.
    pub fn list_declarations_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.list_declarations())
    }
}
