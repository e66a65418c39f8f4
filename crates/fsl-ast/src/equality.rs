//! Code equality: structural comparison that ignores source positions.
//!
//! Used by the role merger to compare predicates and by the round-trip
//! property (`parse(canonical(T)) ≡ T`). Because the canonical printer
//! reorders declaration members, member lists compare in canonical order,
//! not source order. Optional fields compare symmetrically: both absent is
//! equal, one absent is unequal, both present recurses.

use crate::ast::declaration::{
    AccessProviderDecl, CheckDef, CollectionDecl, CollectionMember, ComputedFieldDef, Declaration,
    FieldDef, FunctionDecl, IndexDef, Membership, Param, PrivilegeAction, Privileges, RoleDecl,
    RoleMember, UniqueDef,
};
use crate::ast::node::{ExprBlob, TextNode};
use crate::ast::types::{FnParams, FqlType, ObjectField};
use crate::tree::SchemaTree;

/// Position-insensitive structural equality.
pub trait CodeEq {
    fn code_eq(&self, other: &Self) -> bool;
}

fn opt_eq<T: CodeEq>(a: &Option<T>, b: &Option<T>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.code_eq(b),
        _ => false,
    }
}

fn slice_eq<T: CodeEq>(a: &[T], b: &[T]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.code_eq(y))
}

fn ref_slice_eq<T: CodeEq>(a: &[&T], b: &[&T]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.code_eq(y))
}

impl CodeEq for TextNode {
    fn code_eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl CodeEq for ExprBlob {
    fn code_eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl CodeEq for FqlType {
    fn code_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FqlType::Named(a), FqlType::Named(b)) => a.code_eq(b),
            (FqlType::StringLiteral(a), FqlType::StringLiteral(b)) => a.code_eq(b),
            (FqlType::NumberLiteral(a), FqlType::NumberLiteral(b)) => a.code_eq(b),
            (
                FqlType::Object {
                    fields: fa,
                    wildcard: wa,
                },
                FqlType::Object {
                    fields: fb,
                    wildcard: wb,
                },
            ) => {
                slice_eq(fa, fb)
                    && match (wa, wb) {
                        (None, None) => true,
                        (Some(a), Some(b)) => a.code_eq(b),
                        _ => false,
                    }
            }
            (FqlType::Union(la, ra), FqlType::Union(lb, rb)) => la.code_eq(lb) && ra.code_eq(rb),
            (FqlType::Optional(a), FqlType::Optional(b)) => a.code_eq(b),
            (FqlType::Isolated(a), FqlType::Isolated(b)) => a.code_eq(b),
            (
                FqlType::Template {
                    name: na,
                    params: pa,
                },
                FqlType::Template {
                    name: nb,
                    params: pb,
                },
            ) => na.code_eq(nb) && slice_eq(pa, pb),
            (FqlType::Tuple(a), FqlType::Tuple(b)) => slice_eq(a, b),
            (
                FqlType::Function {
                    params: pa,
                    ret: ra,
                },
                FqlType::Function {
                    params: pb,
                    ret: rb,
                },
            ) => pa.code_eq(pb) && ra.code_eq(rb),
            _ => false,
        }
    }
}

impl CodeEq for ObjectField {
    fn code_eq(&self, other: &Self) -> bool {
        self.optional == other.optional && self.key.code_eq(&other.key) && self.ty.code_eq(&other.ty)
    }
}

impl CodeEq for FnParams {
    fn code_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FnParams::Short(a), FnParams::Short(b)) => a.code_eq(b),
            (
                FnParams::Long {
                    types: ta,
                    variadic: va,
                },
                FnParams::Long {
                    types: tb,
                    variadic: vb,
                },
            ) => {
                slice_eq(ta, tb)
                    && match (va, vb) {
                        (None, None) => true,
                        (Some(a), Some(b)) => a.code_eq(b),
                        _ => false,
                    }
            }
            _ => false,
        }
    }
}

impl CodeEq for AccessProviderDecl {
    fn code_eq(&self, other: &Self) -> bool {
        self.name.code_eq(&other.name)
            && opt_eq(&self.issuer, &other.issuer)
            && opt_eq(&self.jwks_uri, &other.jwks_uri)
            && slice_eq(&self.roles, &other.roles)
            && opt_eq(&self.ttl, &other.ttl)
    }
}

impl CodeEq for FieldDef {
    fn code_eq(&self, other: &Self) -> bool {
        self.name.code_eq(&other.name) && opt_eq(&self.ty, &other.ty)
    }
}

impl CodeEq for ComputedFieldDef {
    fn code_eq(&self, other: &Self) -> bool {
        self.name.code_eq(&other.name)
            && opt_eq(&self.ty, &other.ty)
            && self.body.code_eq(&other.body)
    }
}

impl CodeEq for CheckDef {
    fn code_eq(&self, other: &Self) -> bool {
        self.name.code_eq(&other.name) && self.predicate.code_eq(&other.predicate)
    }
}

impl CodeEq for UniqueDef {
    fn code_eq(&self, other: &Self) -> bool {
        slice_eq(&self.terms, &other.terms)
    }
}

impl CodeEq for IndexDef {
    fn code_eq(&self, other: &Self) -> bool {
        self.name.code_eq(&other.name) && self.body.code_eq(&other.body)
    }
}

impl CodeEq for CollectionMember {
    fn code_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CollectionMember::Field(a), CollectionMember::Field(b)) => a.code_eq(b),
            (CollectionMember::Computed(a), CollectionMember::Computed(b)) => a.code_eq(b),
            (CollectionMember::Check(a), CollectionMember::Check(b)) => a.code_eq(b),
            (CollectionMember::Unique(a), CollectionMember::Unique(b)) => a.code_eq(b),
            (CollectionMember::Index(a), CollectionMember::Index(b)) => a.code_eq(b),
            (CollectionMember::HistoryDays(a), CollectionMember::HistoryDays(b)) => a.code_eq(b),
            (CollectionMember::TtlDays(a), CollectionMember::TtlDays(b)) => a.code_eq(b),
            (CollectionMember::DocumentTtls(a, _), CollectionMember::DocumentTtls(b, _)) => a == b,
            (CollectionMember::Migrations(a), CollectionMember::Migrations(b)) => a.code_eq(b),
            _ => false,
        }
    }
}

impl CodeEq for CollectionDecl {
    fn code_eq(&self, other: &Self) -> bool {
        self.name.code_eq(&other.name)
            && opt_eq(&self.alias, &other.alias)
            && ref_slice_eq(&self.members_canonical(), &other.members_canonical())
    }
}

impl CodeEq for Param {
    fn code_eq(&self, other: &Self) -> bool {
        self.name.code_eq(&other.name) && opt_eq(&self.ty, &other.ty)
    }
}

impl CodeEq for FunctionDecl {
    fn code_eq(&self, other: &Self) -> bool {
        self.name.code_eq(&other.name)
            && slice_eq(&self.params, &other.params)
            && opt_eq(&self.return_type, &other.return_type)
            && self.body.code_eq(&other.body)
            && opt_eq(&self.role, &other.role)
    }
}

impl CodeEq for Membership {
    fn code_eq(&self, other: &Self) -> bool {
        self.collection.code_eq(&other.collection) && opt_eq(&self.predicate, &other.predicate)
    }
}

impl CodeEq for PrivilegeAction {
    fn code_eq(&self, other: &Self) -> bool {
        self.kind == other.kind && opt_eq(&self.predicate, &other.predicate)
    }
}

impl CodeEq for Privileges {
    fn code_eq(&self, other: &Self) -> bool {
        self.resource.code_eq(&other.resource)
            && ref_slice_eq(&self.actions_canonical(), &other.actions_canonical())
    }
}

impl CodeEq for RoleMember {
    fn code_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RoleMember::Membership(a), RoleMember::Membership(b)) => a.code_eq(b),
            (RoleMember::Privileges(a), RoleMember::Privileges(b)) => a.code_eq(b),
            _ => false,
        }
    }
}

impl CodeEq for RoleDecl {
    fn code_eq(&self, other: &Self) -> bool {
        self.name.code_eq(&other.name)
            && ref_slice_eq(&self.members_canonical(), &other.members_canonical())
    }
}

impl CodeEq for Declaration {
    fn code_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Declaration::AccessProvider(a), Declaration::AccessProvider(b)) => a.code_eq(b),
            (Declaration::Collection(a), Declaration::Collection(b)) => a.code_eq(b),
            (Declaration::Function(a), Declaration::Function(b)) => a.code_eq(b),
            (Declaration::Role(a), Declaration::Role(b)) => a.code_eq(b),
            _ => false,
        }
    }
}

impl CodeEq for SchemaTree {
    /// Trees compare by their declarations only; extras are presentation,
    /// not code.
    fn code_eq(&self, other: &Self) -> bool {
        slice_eq(&self.declarations, &other.declarations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::Span;

    fn blob_at(text: &str, start: u32) -> ExprBlob {
        ExprBlob::new(text, Span::new(0, start, start + text.len() as u32))
    }

    #[test]
    fn text_nodes_ignore_spans() {
        let a = TextNode::new("x", Span::new(0, 0, 1));
        let b = TextNode::new("x", Span::new(3, 90, 91));
        assert!(a.code_eq(&b));
        assert!(!a.code_eq(&TextNode::synthetic("y")));
    }

    #[test]
    fn blobs_compare_normalized() {
        let a = blob_at("\n    x + 1\n", 10);
        let b = blob_at(" x + 1 ", 400);
        assert!(a.code_eq(&b));
        assert!(!a.code_eq(&blob_at("x + 2", 0)));
    }

    #[test]
    fn optional_fields_compare_symmetrically() {
        let some = Some(TextNode::synthetic("a"));
        let none: Option<TextNode> = None;
        assert!(opt_eq(&none, &None));
        assert!(!opt_eq(&some, &None));
        assert!(opt_eq(&some, &Some(TextNode::new("a", Span::zero(0)))));
    }

    #[test]
    fn collections_compare_in_canonical_member_order() {
        let span = Span::zero(0);
        let field = |name: &str| {
            CollectionMember::Field(FieldDef {
                name: TextNode::synthetic(name),
                ty: None,
                span,
            })
        };
        let history = CollectionMember::HistoryDays(TextNode::synthetic("30"));
        let a = CollectionDecl {
            name: TextNode::synthetic("C"),
            alias: None,
            members: vec![field("x"), history.clone()],
            span,
        };
        let b = CollectionDecl {
            name: TextNode::synthetic("C"),
            alias: None,
            members: vec![history, field("x")],
            span,
        };
        assert!(a.code_eq(&b));
    }

    #[test]
    fn union_types_are_order_sensitive() {
        let a = FqlType::Union(
            Box::new(FqlType::named("A")),
            Box::new(FqlType::named("B")),
        );
        let b = FqlType::Union(
            Box::new(FqlType::named("B")),
            Box::new(FqlType::named("A")),
        );
        assert!(!a.code_eq(&b));
        assert!(a.code_eq(&a.clone()));
    }
}
