//! Declaration parsers (keyword-dispatched).
//!
//! Top level is a sequence of declarations; the leading keyword picks the
//! parser. Access providers, collections, functions and roles are the
//! four declaration kinds.

use super::body::parse_expr_block;
use super::error::SyntaxError;
use super::{types, Parser};
use fsl_ast::{
    AccessProviderDecl, ActionKind, CheckDef, CollectionDecl, CollectionMember, ComputedFieldDef,
    Declaration, FieldDef, FunctionDecl, IndexDef, Membership, Param, PrivilegeAction, Privileges,
    RoleDecl, RoleMember, TextNode, UniqueDef,
};
use fsl_lexer::Token;

/// Parse every declaration in the stream.
pub(crate) fn parse_declarations(p: &mut Parser<'_>) -> Result<Vec<Declaration>, SyntaxError> {
    let mut declarations = Vec::new();
    while !p.stream.at_end() {
        declarations.push(parse_declaration(p)?);
    }
    Ok(declarations)
}

/// Parse a single declaration.
fn parse_declaration(p: &mut Parser<'_>) -> Result<Declaration, SyntaxError> {
    match p.stream.peek() {
        Some(Token::Access) => parse_access_provider(p),
        Some(Token::Collection) => parse_collection(p),
        Some(Token::Function) => {
            let start = p.stream.current_pos();
            parse_function(p, None, start)
        }
        Some(Token::At) => {
            let start = p.stream.current_pos();
            let role = parse_role_annotation(p)?;
            parse_function(p, Some(role), start)
        }
        Some(Token::Role) => parse_role(p),
        other => Err(SyntaxError::expected(
            "declaration",
            other.cloned(),
            p.stream.current_span(),
        )),
    }
}

/// `access provider NAME { issuer "…" jwks_uri "…" role NAME… ttl N }`
fn parse_access_provider(p: &mut Parser<'_>) -> Result<Declaration, SyntaxError> {
    let start = p.stream.current_pos();
    p.stream.expect(Token::Access)?;
    p.stream.expect(Token::Provider)?;
    let name = p.expect_ident("access provider name")?;
    p.stream.expect(Token::LBrace)?;

    let mut issuer = None;
    let mut jwks_uri = None;
    let mut roles = Vec::new();
    let mut ttl = None;

    while !p.stream.check(&Token::RBrace) {
        if p.peek_is_ident("issuer") {
            p.stream.advance();
            issuer = Some(p.expect_string("issuer URL")?);
        } else if p.peek_is_ident("jwks_uri") {
            p.stream.advance();
            jwks_uri = Some(p.expect_string("JWKS URI")?);
        } else if p.stream.check(&Token::Role) {
            p.stream.advance();
            roles.push(p.expect_ident("role name")?);
        } else if p.peek_is_ident("ttl") {
            p.stream.advance();
            ttl = Some(p.expect_number("ttl value")?);
        } else {
            return Err(SyntaxError::expected(
                "access provider member",
                p.stream.peek().cloned(),
                p.stream.current_span(),
            ));
        }
    }
    p.stream.expect(Token::RBrace)?;

    Ok(Declaration::AccessProvider(AccessProviderDecl {
        name,
        issuer,
        jwks_uri,
        roles,
        ttl,
        span: p.stream.span_from(start),
    }))
}

/// `collection NAME (as TYPE)? { members… }`
fn parse_collection(p: &mut Parser<'_>) -> Result<Declaration, SyntaxError> {
    let start = p.stream.current_pos();
    p.stream.expect(Token::Collection)?;
    let name = p.expect_ident("collection name")?;

    let alias = if p.peek_is_ident("as") {
        p.stream.advance();
        Some(types::parse_type(p)?)
    } else {
        None
    };

    p.stream.expect(Token::LBrace)?;
    let mut members = Vec::new();
    while !p.stream.check(&Token::RBrace) {
        members.push(parse_collection_member(p)?);
    }
    p.stream.expect(Token::RBrace)?;

    Ok(Declaration::Collection(CollectionDecl {
        name,
        alias,
        members,
        span: p.stream.span_from(start),
    }))
}

fn parse_collection_member(p: &mut Parser<'_>) -> Result<CollectionMember, SyntaxError> {
    let start = p.stream.current_pos();
    match p.stream.peek() {
        Some(Token::HistoryDays) => {
            p.stream.advance();
            Ok(CollectionMember::HistoryDays(
                p.expect_number("history_days value")?,
            ))
        }
        Some(Token::TtlDays) => {
            p.stream.advance();
            Ok(CollectionMember::TtlDays(p.expect_number("ttl_days value")?))
        }
        Some(Token::Ident(s)) if s == "document_ttls" => {
            p.stream.advance();
            let enabled = match p.stream.peek() {
                Some(Token::True) => true,
                Some(Token::False) => false,
                other => {
                    return Err(SyntaxError::expected(
                        "`true` or `false`",
                        other.cloned(),
                        p.stream.current_span(),
                    ));
                }
            };
            p.stream.advance();
            Ok(CollectionMember::DocumentTtls(
                enabled,
                p.stream.span_from(start),
            ))
        }
        Some(Token::Compute) => {
            p.stream.advance();
            let name = p.expect_ident("computed field name")?;
            let ty = if p.stream.check(&Token::Colon) {
                p.stream.advance();
                Some(types::parse_type(p)?)
            } else {
                None
            };
            let body = parse_expr_block(p)?;
            Ok(CollectionMember::Computed(ComputedFieldDef {
                name,
                ty,
                body,
                span: p.stream.span_from(start),
            }))
        }
        Some(Token::Check) => {
            p.stream.advance();
            let name = p.expect_ident("check name")?;
            let predicate = parse_expr_block(p)?;
            Ok(CollectionMember::Check(CheckDef {
                name,
                predicate,
                span: p.stream.span_from(start),
            }))
        }
        Some(Token::Unique) => {
            p.stream.advance();
            p.stream.expect(Token::LBracket)?;
            let mut terms = vec![parse_field_path(p)?];
            while p.stream.check(&Token::Comma) {
                p.stream.advance();
                terms.push(parse_field_path(p)?);
            }
            p.stream.expect(Token::RBracket)?;
            Ok(CollectionMember::Unique(UniqueDef {
                terms,
                span: p.stream.span_from(start),
            }))
        }
        Some(Token::Index) => {
            p.stream.advance();
            let name = p.expect_ident("index name")?;
            let body = parse_expr_block(p)?;
            Ok(CollectionMember::Index(IndexDef {
                name,
                body,
                span: p.stream.span_from(start),
            }))
        }
        Some(Token::Migrations) => {
            p.stream.advance();
            Ok(CollectionMember::Migrations(parse_expr_block(p)?))
        }
        Some(Token::Ident(_)) => {
            let name = p.expect_ident("field name")?;
            let ty = if p.stream.check(&Token::Colon) {
                p.stream.advance();
                Some(types::parse_type(p)?)
            } else {
                None
            };
            Ok(CollectionMember::Field(FieldDef {
                name,
                ty,
                span: p.stream.span_from(start),
            }))
        }
        other => Err(SyntaxError::expected(
            "collection member",
            other.cloned(),
            p.stream.current_span(),
        )),
    }
}

/// A field path term inside `unique [...]`: `.email`, `address.zip`.
///
/// The raw text (leading dot included) is kept as one node.
fn parse_field_path(p: &mut Parser<'_>) -> Result<TextNode, SyntaxError> {
    let start = p.stream.current_pos();
    let mut text = String::new();
    if p.stream.check(&Token::Dot) {
        p.stream.advance();
        text.push('.');
    }
    let first = p.expect_ident("field path")?;
    text.push_str(&first.text);
    while p.stream.check(&Token::Dot) {
        p.stream.advance();
        text.push('.');
        let seg = p.expect_ident("field path segment")?;
        text.push_str(&seg.text);
    }
    Ok(TextNode::new(text, p.stream.span_from(start)))
}

/// `@role(NAME)` annotation preceding a function.
fn parse_role_annotation(p: &mut Parser<'_>) -> Result<TextNode, SyntaxError> {
    p.stream.expect(Token::At)?;
    p.stream.expect(Token::Role)?;
    p.stream.expect(Token::LParen)?;
    let role = p.expect_ident("role name")?;
    p.stream.expect(Token::RParen)?;
    Ok(role)
}

/// `function NAME(params)(: TYPE)? { body }`
fn parse_function(
    p: &mut Parser<'_>,
    role: Option<TextNode>,
    start: usize,
) -> Result<Declaration, SyntaxError> {
    p.stream.expect(Token::Function)?;
    let name = p.expect_ident("function name")?;

    p.stream.expect(Token::LParen)?;
    let mut params = Vec::new();
    while !p.stream.check(&Token::RParen) {
        let pname = p.expect_ident("parameter name")?;
        let ty = if p.stream.check(&Token::Colon) {
            p.stream.advance();
            Some(types::parse_type(p)?)
        } else {
            None
        };
        params.push(Param { name: pname, ty });
        if !p.stream.check(&Token::RParen) {
            p.stream.expect(Token::Comma)?;
        }
    }
    p.stream.expect(Token::RParen)?;

    let return_type = if p.stream.check(&Token::Colon) {
        p.stream.advance();
        Some(types::parse_type(p)?)
    } else {
        None
    };

    let body = parse_expr_block(p)?;

    Ok(Declaration::Function(FunctionDecl {
        name,
        params,
        return_type,
        body,
        role,
        span: p.stream.span_from(start),
    }))
}

/// `role NAME { membership… privileges… }`
fn parse_role(p: &mut Parser<'_>) -> Result<Declaration, SyntaxError> {
    let start = p.stream.current_pos();
    p.stream.expect(Token::Role)?;
    let name = p.expect_ident("role name")?;
    p.stream.expect(Token::LBrace)?;

    let mut members = Vec::new();
    while !p.stream.check(&Token::RBrace) {
        match p.stream.peek() {
            Some(Token::Membership) => {
                let mstart = p.stream.current_pos();
                p.stream.advance();
                let collection = p.expect_ident("collection name")?;
                let predicate = if p.stream.check(&Token::LBrace) {
                    Some(parse_expr_block(p)?)
                } else {
                    None
                };
                members.push(RoleMember::Membership(Membership {
                    collection,
                    predicate,
                    span: p.stream.span_from(mstart),
                }));
            }
            Some(Token::Privileges) => {
                let mstart = p.stream.current_pos();
                p.stream.advance();
                let resource = p.expect_ident("privilege resource")?;
                p.stream.expect(Token::LBrace)?;

                let mut actions = Vec::new();
                while !p.stream.check(&Token::RBrace) {
                    let astart = p.stream.current_pos();
                    let kind = match p.stream.peek() {
                        Some(Token::Ident(s)) => ActionKind::parse(s),
                        _ => None,
                    };
                    let Some(kind) = kind else {
                        return Err(SyntaxError::expected(
                            "privilege action",
                            p.stream.peek().cloned(),
                            p.stream.current_span(),
                        ));
                    };
                    p.stream.advance();
                    let predicate = if p.stream.check(&Token::LBrace) {
                        Some(parse_expr_block(p)?)
                    } else {
                        None
                    };
                    actions.push(PrivilegeAction {
                        kind,
                        predicate,
                        span: p.stream.span_from(astart),
                    });
                }
                p.stream.expect(Token::RBrace)?;

                members.push(RoleMember::Privileges(Privileges {
                    resource,
                    actions,
                    span: p.stream.span_from(mstart),
                }));
            }
            other => {
                return Err(SyntaxError::expected(
                    "role member",
                    other.cloned(),
                    p.stream.current_span(),
                ));
            }
        }
    }
    p.stream.expect(Token::RBrace)?;

    Ok(Declaration::Role(RoleDecl {
        name,
        members,
        span: p.stream.span_from(start),
    }))
}
