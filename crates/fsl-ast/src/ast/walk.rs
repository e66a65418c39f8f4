//! Span traversal over declarations.
//!
//! Single closure-based walker rather than a visitor trait: the only
//! consumer is `SchemaTree::merge`, which re-bases every span of an
//! absorbed tree onto the merged file table. The matches are exhaustive,
//! so a new AST variant is flagged here by the compiler.

use crate::ast::declaration::{
    CollectionMember, Declaration, Privileges, RoleMember,
};
use crate::ast::node::{ExprBlob, TextNode};
use crate::ast::types::{FnParams, FqlType};
use crate::foundation::Span;

/// Visit every span of a declaration, mutably.
pub fn visit_spans_mut<F>(decl: &mut Declaration, f: &mut F)
where
    F: FnMut(&mut Span),
{
    match decl {
        Declaration::AccessProvider(d) => {
            f(&mut d.span);
            text(&mut d.name, f);
            if let Some(n) = &mut d.issuer {
                text(n, f);
            }
            if let Some(n) = &mut d.jwks_uri {
                text(n, f);
            }
            for n in &mut d.roles {
                text(n, f);
            }
            if let Some(n) = &mut d.ttl {
                text(n, f);
            }
        }
        Declaration::Collection(d) => {
            f(&mut d.span);
            text(&mut d.name, f);
            if let Some(t) = &mut d.alias {
                ty(t, f);
            }
            for member in &mut d.members {
                match member {
                    CollectionMember::Field(fd) => {
                        f(&mut fd.span);
                        text(&mut fd.name, f);
                        if let Some(t) = &mut fd.ty {
                            ty(t, f);
                        }
                    }
                    CollectionMember::Computed(c) => {
                        f(&mut c.span);
                        text(&mut c.name, f);
                        if let Some(t) = &mut c.ty {
                            ty(t, f);
                        }
                        blob(&mut c.body, f);
                    }
                    CollectionMember::Check(c) => {
                        f(&mut c.span);
                        text(&mut c.name, f);
                        blob(&mut c.predicate, f);
                    }
                    CollectionMember::Unique(u) => {
                        f(&mut u.span);
                        for t in &mut u.terms {
                            text(t, f);
                        }
                    }
                    CollectionMember::Index(i) => {
                        f(&mut i.span);
                        text(&mut i.name, f);
                        blob(&mut i.body, f);
                    }
                    CollectionMember::HistoryDays(n) | CollectionMember::TtlDays(n) => {
                        text(n, f);
                    }
                    CollectionMember::DocumentTtls(_, span) => f(span),
                    CollectionMember::Migrations(b) => blob(b, f),
                }
            }
        }
        Declaration::Function(d) => {
            f(&mut d.span);
            text(&mut d.name, f);
            for p in &mut d.params {
                text(&mut p.name, f);
                if let Some(t) = &mut p.ty {
                    ty(t, f);
                }
            }
            if let Some(t) = &mut d.return_type {
                ty(t, f);
            }
            blob(&mut d.body, f);
            if let Some(n) = &mut d.role {
                text(n, f);
            }
        }
        Declaration::Role(d) => {
            f(&mut d.span);
            text(&mut d.name, f);
            for member in &mut d.members {
                match member {
                    RoleMember::Membership(m) => {
                        f(&mut m.span);
                        text(&mut m.collection, f);
                        if let Some(p) = &mut m.predicate {
                            blob(p, f);
                        }
                    }
                    RoleMember::Privileges(p) => privileges(p, f),
                }
            }
        }
    }
}

fn privileges<F: FnMut(&mut Span)>(p: &mut Privileges, f: &mut F) {
    f(&mut p.span);
    text(&mut p.resource, f);
    for action in &mut p.actions {
        f(&mut action.span);
        if let Some(pred) = &mut action.predicate {
            blob(pred, f);
        }
    }
}

fn text<F: FnMut(&mut Span)>(node: &mut TextNode, f: &mut F) {
    if let Some(span) = &mut node.span {
        f(span);
    }
}

fn blob<F: FnMut(&mut Span)>(b: &mut ExprBlob, f: &mut F) {
    f(&mut b.span);
}

fn ty<F: FnMut(&mut Span)>(t: &mut FqlType, f: &mut F) {
    match t {
        FqlType::Named(n) | FqlType::StringLiteral(n) | FqlType::NumberLiteral(n) => text(n, f),
        FqlType::Object { fields, wildcard } => {
            for field in fields {
                text(&mut field.key, f);
                ty(&mut field.ty, f);
            }
            if let Some(w) = wildcard {
                ty(w, f);
            }
        }
        FqlType::Union(a, b) => {
            ty(a, f);
            ty(b, f);
        }
        FqlType::Optional(inner) | FqlType::Isolated(inner) => ty(inner, f),
        FqlType::Template { name, params } => {
            text(name, f);
            for p in params {
                ty(p, f);
            }
        }
        FqlType::Tuple(items) => {
            for item in items {
                ty(item, f);
            }
        }
        FqlType::Function { params, ret } => {
            match params {
                FnParams::Short(p) => ty(p, f),
                FnParams::Long { types, variadic } => {
                    for p in types {
                        ty(p, f);
                    }
                    if let Some(v) = variadic {
                        ty(v, f);
                    }
                }
            }
            ty(ret, f);
        }
    }
}
