//! The FQL type grammar.
//!
//! Unlike expression bodies, types are fully parsed. Precedence, loosest
//! first:
//!
//! ```text
//! union    :=  arrow ("|" arrow)*              left associative
//! arrow    :=  postfix ("=>" arrow)?           short-form function type
//! postfix  :=  primary ("?" | "<" args ">")*   optional, template
//! primary  :=  IDENT | STRING | NUMBER | "null"
//!           |  "{" fields "}" | "[" types "]"
//!           |  "(" params ")" ("=>" arrow)?    function (long) or isolated
//! ```

use super::error::SyntaxError;
use super::Parser;
use fsl_ast::{FnParams, FqlType, ObjectField, TextNode};
use fsl_lexer::Token;

/// Parse a complete FQL type expression.
pub(crate) fn parse_type(p: &mut Parser<'_>) -> Result<FqlType, SyntaxError> {
    parse_union(p)
}

fn parse_union(p: &mut Parser<'_>) -> Result<FqlType, SyntaxError> {
    let mut left = parse_arrow(p)?;
    while p.stream.check(&Token::Pipe) {
        p.stream.advance();
        let right = parse_arrow(p)?;
        left = FqlType::Union(Box::new(left), Box::new(right));
    }
    Ok(left)
}

fn parse_arrow(p: &mut Parser<'_>) -> Result<FqlType, SyntaxError> {
    let t = parse_postfix(p)?;
    if p.stream.check(&Token::FatArrow) {
        p.stream.advance();
        let ret = parse_arrow(p)?;
        Ok(FqlType::Function {
            params: FnParams::Short(Box::new(t)),
            ret: Box::new(ret),
        })
    } else {
        Ok(t)
    }
}

fn parse_postfix(p: &mut Parser<'_>) -> Result<FqlType, SyntaxError> {
    let mut t = parse_primary(p)?;
    loop {
        if p.stream.check(&Token::Question) {
            p.stream.advance();
            t = FqlType::Optional(Box::new(t));
        } else if matches!(t, FqlType::Named(_)) && p.stream.check(&Token::Lt) {
            p.stream.advance();
            let name = match t {
                FqlType::Named(n) => n,
                _ => unreachable!("just matched Named"),
            };
            let mut params = vec![parse_union(p)?];
            while p.stream.check(&Token::Comma) {
                p.stream.advance();
                params.push(parse_union(p)?);
            }
            p.stream.expect(Token::Gt)?;
            t = FqlType::Template { name, params };
        } else {
            return Ok(t);
        }
    }
}

fn parse_primary(p: &mut Parser<'_>) -> Result<FqlType, SyntaxError> {
    match p.stream.peek() {
        Some(Token::Ident(_)) => Ok(FqlType::Named(p.expect_ident("type name")?)),
        Some(Token::Null) => {
            let span = p.stream.current_span();
            p.stream.advance();
            Ok(FqlType::Named(TextNode::new("null", span)))
        }
        Some(Token::String(_)) => Ok(FqlType::StringLiteral(
            p.expect_string("string literal type")?,
        )),
        Some(Token::Number(_)) => Ok(FqlType::NumberLiteral(
            p.expect_number("number literal type")?,
        )),
        Some(Token::LBrace) => parse_object(p),
        Some(Token::LBracket) => {
            p.stream.advance();
            let mut items = vec![parse_union(p)?];
            while p.stream.check(&Token::Comma) {
                p.stream.advance();
                items.push(parse_union(p)?);
            }
            p.stream.expect(Token::RBracket)?;
            Ok(FqlType::Tuple(items))
        }
        Some(Token::LParen) => parse_paren(p),
        other => Err(SyntaxError::expected(
            "type expression",
            other.cloned(),
            p.stream.current_span(),
        )),
    }
}

/// `{ key: T, key?: T, *: T }`
fn parse_object(p: &mut Parser<'_>) -> Result<FqlType, SyntaxError> {
    p.stream.expect(Token::LBrace)?;
    let mut fields = Vec::new();
    let mut wildcard = None;

    if !p.stream.check(&Token::RBrace) {
        loop {
            if p.stream.check(&Token::Star) {
                p.stream.advance();
                p.stream.expect(Token::Colon)?;
                wildcard = Some(Box::new(parse_union(p)?));
            } else {
                let key = p.expect_ident("object key")?;
                let optional = if p.stream.check(&Token::Question) {
                    p.stream.advance();
                    true
                } else {
                    false
                };
                p.stream.expect(Token::Colon)?;
                let ty = parse_union(p)?;
                fields.push(ObjectField { key, ty, optional });
            }
            if p.stream.check(&Token::Comma) {
                p.stream.advance();
            } else {
                break;
            }
        }
    }
    p.stream.expect(Token::RBrace)?;

    Ok(FqlType::Object { fields, wildcard })
}

/// `(T)` isolated, or `(A, B) => R` / `(...A) => R` function.
fn parse_paren(p: &mut Parser<'_>) -> Result<FqlType, SyntaxError> {
    p.stream.expect(Token::LParen)?;

    // Empty parameter list can only be a function type.
    if p.stream.check(&Token::RParen) {
        p.stream.advance();
        p.stream.expect(Token::FatArrow)?;
        let ret = parse_arrow(p)?;
        return Ok(FqlType::Function {
            params: FnParams::Long {
                types: Vec::new(),
                variadic: None,
            },
            ret: Box::new(ret),
        });
    }

    let mut types = Vec::new();
    let mut variadic = None;
    loop {
        if p.stream.check(&Token::Ellipsis) {
            p.stream.advance();
            variadic = Some(Box::new(parse_union(p)?));
            break;
        }
        types.push(parse_union(p)?);
        if p.stream.check(&Token::Comma) {
            p.stream.advance();
        } else {
            break;
        }
    }
    p.stream.expect(Token::RParen)?;

    if p.stream.check(&Token::FatArrow) {
        p.stream.advance();
        let ret = parse_arrow(p)?;
        Ok(FqlType::Function {
            params: FnParams::Long { types, variadic },
            ret: Box::new(ret),
        })
    } else if types.len() == 1 && variadic.is_none() {
        let only = types.pop().expect("just checked len == 1");
        Ok(FqlType::Isolated(Box::new(only)))
    } else {
        Err(SyntaxError::expected(
            "`=>`",
            p.stream.peek().cloned(),
            p.stream.current_span(),
        ))
    }
}
