//! Top-level FSL declaration types.
//!
//! Four declaration kinds exist: access providers, collections, functions
//! and roles. All variants carry their source span and keep identifiers as
//! [`TextNode`]s so that transformations (the linker in particular) can
//! rewrite references in place.

use crate::ast::node::{ExprBlob, TextNode};
use crate::ast::types::FqlType;
use crate::error::TreeError;
use crate::foundation::Span;
use std::fmt;
use std::str::FromStr;

/// Top-level declaration variants returned by the parser.
#[derive(Debug, Clone)]
pub enum Declaration {
    AccessProvider(AccessProviderDecl),
    Collection(CollectionDecl),
    Function(FunctionDecl),
    Role(RoleDecl),
}

impl Declaration {
    /// The declaration's kind tag.
    pub fn kind(&self) -> DeclarationKind {
        match self {
            Declaration::AccessProvider(_) => DeclarationKind::AccessProvider,
            Declaration::Collection(_) => DeclarationKind::Collection,
            Declaration::Function(_) => DeclarationKind::Function,
            Declaration::Role(_) => DeclarationKind::Role,
        }
    }

    /// The declared name.
    pub fn name(&self) -> &str {
        match self {
            Declaration::AccessProvider(d) => &d.name.text,
            Declaration::Collection(d) => &d.name.text,
            Declaration::Function(d) => &d.name.text,
            Declaration::Role(d) => &d.name.text,
        }
    }

    /// The span of the whole declaration.
    pub fn span(&self) -> Span {
        match self {
            Declaration::AccessProvider(d) => d.span,
            Declaration::Collection(d) => d.span,
            Declaration::Function(d) => d.span,
            Declaration::Role(d) => d.span,
        }
    }
}

/// Kind tag for a declaration; doubles as the sort key for `sort()` and
/// the kind-string vocabulary of the host-facing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeclarationKind {
    AccessProvider,
    Collection,
    Function,
    Role,
}

impl DeclarationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationKind::AccessProvider => "access_provider",
            DeclarationKind::Collection => "collection",
            DeclarationKind::Function => "function",
            DeclarationKind::Role => "role",
        }
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeclarationKind {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "access_provider" => Ok(DeclarationKind::AccessProvider),
            "collection" => Ok(DeclarationKind::Collection),
            "function" => Ok(DeclarationKind::Function),
            "role" => Ok(DeclarationKind::Role),
            other => Err(TreeError::InvalidDeclarationKind(other.to_string())),
        }
    }
}

/// `access provider NAME { … }`
#[derive(Debug, Clone)]
pub struct AccessProviderDecl {
    pub name: TextNode,
    /// `issuer "…"`
    pub issuer: Option<TextNode>,
    /// `jwks_uri "…"`
    pub jwks_uri: Option<TextNode>,
    /// `role NAME`, repeatable, in source order
    pub roles: Vec<TextNode>,
    /// `ttl NUMBER`, raw number text
    pub ttl: Option<TextNode>,
    pub span: Span,
}

/// `collection NAME (as TYPE)? { … }`
#[derive(Debug, Clone)]
pub struct CollectionDecl {
    pub name: TextNode,
    /// Optional `as` type alias expression.
    pub alias: Option<FqlType>,
    /// Members in source order.
    pub members: Vec<CollectionMember>,
    pub span: Span,
}

/// One member of a collection body.
#[derive(Debug, Clone)]
pub enum CollectionMember {
    /// `name: Type` or bare `name` (absent type means `unknown`)
    Field(FieldDef),
    /// `compute name(: Type)? { expr }`
    Computed(ComputedFieldDef),
    /// `check name { predicate }`
    Check(CheckDef),
    /// `unique [.a, .b]`
    Unique(UniqueDef),
    /// `index name { … }`, body preserved verbatim
    Index(IndexDef),
    /// `history_days N`
    HistoryDays(TextNode),
    /// `ttl_days N`
    TtlDays(TextNode),
    /// `document_ttls true|false`
    DocumentTtls(bool, Span),
    /// `migrations { … }`, body preserved verbatim
    Migrations(ExprBlob),
}

impl CollectionMember {
    /// Start offset of the member, used to interleave extras.
    pub fn start(&self) -> u32 {
        match self {
            CollectionMember::Field(f) => f.span.start,
            CollectionMember::Computed(c) => c.span.start,
            CollectionMember::Check(c) => c.span.start,
            CollectionMember::Unique(u) => u.span.start,
            CollectionMember::Index(i) => i.span.start,
            CollectionMember::HistoryDays(n) | CollectionMember::TtlDays(n) => {
                n.span.map(|s| s.start).unwrap_or(0)
            }
            CollectionMember::DocumentTtls(_, span) => span.start,
            CollectionMember::Migrations(b) => b.span.start,
        }
    }

    /// Rank in the canonical member order: `history_days`, `ttl_days`,
    /// `document_ttls`, fields, computed fields, checks, uniques,
    /// indexes, migrations. Within one rank, source order is kept.
    pub fn canonical_rank(&self) -> u8 {
        match self {
            CollectionMember::HistoryDays(_) => 0,
            CollectionMember::TtlDays(_) => 1,
            CollectionMember::DocumentTtls(..) => 2,
            CollectionMember::Field(_) => 3,
            CollectionMember::Computed(_) => 4,
            CollectionMember::Check(_) => 5,
            CollectionMember::Unique(_) => 6,
            CollectionMember::Index(_) => 7,
            CollectionMember::Migrations(_) => 8,
        }
    }
}

impl CollectionDecl {
    /// Members in canonical print order (stable within each rank).
    pub fn members_canonical(&self) -> Vec<&CollectionMember> {
        let mut ordered: Vec<&CollectionMember> = self.members.iter().collect();
        ordered.sort_by_key(|m| m.canonical_rank());
        ordered
    }
}

/// A stored field.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: TextNode,
    /// Absent means `unknown`.
    pub ty: Option<FqlType>,
    pub span: Span,
}

/// A computed field.
#[derive(Debug, Clone)]
pub struct ComputedFieldDef {
    pub name: TextNode,
    pub ty: Option<FqlType>,
    pub body: ExprBlob,
    pub span: Span,
}

/// A named check constraint.
#[derive(Debug, Clone)]
pub struct CheckDef {
    pub name: TextNode,
    pub predicate: ExprBlob,
    pub span: Span,
}

/// A uniqueness constraint over one or more field paths.
#[derive(Debug, Clone)]
pub struct UniqueDef {
    /// Raw term texts, e.g. `.email`.
    pub terms: Vec<TextNode>,
    pub span: Span,
}

/// An index definition; the body is not interpreted.
#[derive(Debug, Clone)]
pub struct IndexDef {
    pub name: TextNode,
    pub body: ExprBlob,
    pub span: Span,
}

/// `(@role(NAME))? function NAME(params)(: Type)? { body }`
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: TextNode,
    pub params: Vec<Param>,
    pub return_type: Option<FqlType>,
    pub body: ExprBlob,
    /// Optional `@role(NAME)` annotation.
    pub role: Option<TextNode>,
    pub span: Span,
}

/// One function parameter.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: TextNode,
    pub ty: Option<FqlType>,
}

/// `role NAME { … }`
#[derive(Debug, Clone)]
pub struct RoleDecl {
    pub name: TextNode,
    /// Members in source order.
    pub members: Vec<RoleMember>,
    pub span: Span,
}

impl RoleDecl {
    /// Members in canonical print order: memberships first, then
    /// privileges, source order within each group.
    pub fn members_canonical(&self) -> Vec<&RoleMember> {
        let mut ordered: Vec<&RoleMember> = self.members.iter().collect();
        ordered.sort_by_key(|m| match m {
            RoleMember::Membership(_) => 0u8,
            RoleMember::Privileges(_) => 1,
        });
        ordered
    }
}

/// One member of a role body.
#[derive(Debug, Clone)]
pub enum RoleMember {
    Membership(Membership),
    Privileges(Privileges),
}

impl RoleMember {
    /// Start offset of the member, used to interleave extras.
    pub fn start(&self) -> u32 {
        match self {
            RoleMember::Membership(m) => m.span.start,
            RoleMember::Privileges(p) => p.span.start,
        }
    }
}

/// `membership COLLECTION ({ predicate })?`
#[derive(Debug, Clone)]
pub struct Membership {
    pub collection: TextNode,
    pub predicate: Option<ExprBlob>,
    pub span: Span,
}

/// `privileges RESOURCE { actions… }`
#[derive(Debug, Clone)]
pub struct Privileges {
    pub resource: TextNode,
    /// Actions in source order.
    pub actions: Vec<PrivilegeAction>,
    pub span: Span,
}

impl Privileges {
    /// Actions in canonical print order (fixed tag order, stable within
    /// a tag).
    pub fn actions_canonical(&self) -> Vec<&PrivilegeAction> {
        let mut ordered: Vec<&PrivilegeAction> = self.actions.iter().collect();
        ordered.sort_by_key(|a| a.kind as u8);
        ordered
    }
}

/// One privilege action, optionally predicated.
#[derive(Debug, Clone)]
pub struct PrivilegeAction {
    pub kind: ActionKind,
    pub predicate: Option<ExprBlob>,
    pub span: Span,
}

/// The closed set of privilege action tags, in canonical print order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ActionKind {
    Read = 0,
    Write = 1,
    Create = 2,
    Delete = 3,
    HistoryRead = 4,
    Call = 5,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Read => "read",
            ActionKind::Write => "write",
            ActionKind::Create => "create",
            ActionKind::Delete => "delete",
            ActionKind::HistoryRead => "history_read",
            ActionKind::Call => "call",
        }
    }

    /// Parse an action tag from its surface keyword.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "read" => Some(ActionKind::Read),
            "write" => Some(ActionKind::Write),
            "create" => Some(ActionKind::Create),
            "delete" => Some(ActionKind::Delete),
            "history_read" => Some(ActionKind::HistoryRead),
            "call" => Some(ActionKind::Call),
            _ => None,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_string_round_trip() {
        for kind in [
            DeclarationKind::AccessProvider,
            DeclarationKind::Collection,
            DeclarationKind::Function,
            DeclarationKind::Role,
        ] {
            assert_eq!(kind.as_str().parse::<DeclarationKind>().unwrap(), kind);
        }
        assert!("table".parse::<DeclarationKind>().is_err());
    }

    #[test]
    fn collection_member_canonical_order() {
        let span = Span::zero(0);
        let decl = CollectionDecl {
            name: TextNode::synthetic("C"),
            alias: None,
            members: vec![
                CollectionMember::Field(FieldDef {
                    name: TextNode::synthetic("a"),
                    ty: None,
                    span,
                }),
                CollectionMember::HistoryDays(TextNode::synthetic("30")),
                CollectionMember::Migrations(ExprBlob::new("x", span)),
                CollectionMember::Field(FieldDef {
                    name: TextNode::synthetic("b"),
                    ty: None,
                    span,
                }),
            ],
            span,
        };
        let ranks: Vec<u8> = decl
            .members_canonical()
            .iter()
            .map(|m| m.canonical_rank())
            .collect();
        assert_eq!(ranks, vec![0, 3, 3, 8]);
        // source order kept inside a rank
        let names: Vec<&str> = decl
            .members_canonical()
            .iter()
            .filter_map(|m| match m {
                CollectionMember::Field(f) => Some(f.name.text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn action_tag_order() {
        assert!(ActionKind::Read < ActionKind::Call);
        assert_eq!(ActionKind::parse("history_read"), Some(ActionKind::HistoryRead));
        assert_eq!(ActionKind::parse("grant"), None);
    }
}
