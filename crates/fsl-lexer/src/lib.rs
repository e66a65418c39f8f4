// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Lexical analysis for FSL source files.
//!
//! Tokenization uses logos. Two things set this lexer apart from a plain
//! token stream:
//!
//! - `//` comments are *captured*, not skipped, and together with blank
//!   lines they are returned as raw extras so the canonical printer can
//!   round-trip them. Each extra is anchored to the byte offset of the
//!   token that follows it.
//! - Unrecognized bytes become [`Token::Unknown`] instead of failing the
//!   whole lex. FQL expression bodies may contain operators this grammar
//!   does not know; the parser skips body tokens by byte range and only
//!   treats `Unknown` as an error where it actually reads it.

use logos::Logos;
use std::fmt;
use std::ops::Range;

/// FSL token.
///
/// Keywords are the set from the surface grammar; `issuer`, `jwks_uri`,
/// `ttl`, `document_ttls`, `as` and the privilege action names are
/// contextual identifiers, not keywords.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    // === Keywords ===
    #[token("access")]
    Access,
    #[token("provider")]
    Provider,
    #[token("collection")]
    Collection,
    #[token("function")]
    Function,
    #[token("role")]
    Role,
    #[token("index")]
    Index,
    #[token("unique")]
    Unique,
    #[token("check")]
    Check,
    #[token("compute")]
    Compute,
    #[token("history_days")]
    HistoryDays,
    #[token("ttl_days")]
    TtlDays,
    #[token("migrations")]
    Migrations,
    #[token("membership")]
    Membership,
    #[token("privileges")]
    Privileges,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    // === Delimiters ===
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,

    // === Punctuation ===
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token("=")]
    Eq,
    #[token("|")]
    Pipe,
    #[token("?")]
    Question,
    #[token("*")]
    Star,
    #[token("=>")]
    FatArrow,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token(".")]
    Dot,
    #[token("@")]
    At,
    #[token("...")]
    Ellipsis,

    // FQL operators; never produced by the schema grammar itself, but
    // expression bodies must lex cleanly so the parser can skip them.
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("!")]
    Bang,
    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,

    // === Literals ===
    /// String literal; the token stores the unescaped value.
    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| unescape_string(lex.slice()))]
    String(std::string::String),

    /// Number literal, raw text (integer or decimal).
    #[regex(r"[0-9]+(\.[0-9]+)?", |lex| lex.slice().to_string())]
    Number(std::string::String),

    /// Identifier.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(std::string::String),

    /// `//` line comment, verbatim including the `//` prefix.
    #[regex(r"//[^\n]*", |lex| lex.slice().to_string())]
    Comment(std::string::String),

    /// Any byte sequence the grammar does not know.
    Unknown,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: &str = match self {
            Token::Access => "access",
            Token::Provider => "provider",
            Token::Collection => "collection",
            Token::Function => "function",
            Token::Role => "role",
            Token::Index => "index",
            Token::Unique => "unique",
            Token::Check => "check",
            Token::Compute => "compute",
            Token::HistoryDays => "history_days",
            Token::TtlDays => "ttl_days",
            Token::Migrations => "migrations",
            Token::Membership => "membership",
            Token::Privileges => "privileges",
            Token::True => "true",
            Token::False => "false",
            Token::Null => "null",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::Comma => ",",
            Token::Semicolon => ";",
            Token::Colon => ":",
            Token::Eq => "=",
            Token::Pipe => "|",
            Token::Question => "?",
            Token::Star => "*",
            Token::FatArrow => "=>",
            Token::Lt => "<",
            Token::Gt => ">",
            Token::Dot => ".",
            Token::At => "@",
            Token::Ellipsis => "...",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Bang => "!",
            Token::EqEq => "==",
            Token::BangEq => "!=",
            Token::LtEq => "<=",
            Token::GtEq => ">=",
            Token::AmpAmp => "&&",
            Token::PipePipe => "||",
            Token::String(s) => return write!(f, "\"{}\"", s),
            Token::Number(n) => return f.write_str(n),
            Token::Ident(id) => return f.write_str(id),
            Token::Comment(c) => return f.write_str(c),
            Token::Unknown => "<unknown>",
        };
        f.write_str(s)
    }
}

/// Unescape a quoted string slice; `None` on an invalid escape.
fn unescape_string(slice: &str) -> Option<String> {
    let inner = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            '"' => out.push('"'),
            '\\' => out.push('\\'),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            _ => return None,
        }
    }
    Some(out)
}

/// Raw extra kind produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawExtraKind {
    Comment,
    BlankLine,
}

/// A comment or blank line with its location and forward anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct RawExtra {
    pub kind: RawExtraKind,
    /// Verbatim comment text (`//` included); empty for blank lines.
    pub text: String,
    /// Byte range of the fragment.
    pub range: Range<usize>,
    /// Byte offset of the next real token (source length at EOF).
    pub anchor: usize,
}

/// Lexed source: tokens with byte ranges, plus extras in source order.
#[derive(Debug, Default)]
pub struct Lexed {
    pub tokens: Vec<(Token, Range<usize>)>,
    pub extras: Vec<RawExtra>,
}

/// Tokenize a source file, capturing comments and blank lines.
pub fn lex(source: &str) -> Lexed {
    let mut tokens: Vec<(Token, Range<usize>)> = Vec::new();
    let mut extras: Vec<RawExtra> = Vec::new();
    // Extras waiting for the next real token to anchor to.
    let mut pending: Vec<RawExtra> = Vec::new();
    let mut prev_end = 0usize;

    for (result, range) in Token::lexer(source).spanned() {
        blank_lines(source, prev_end, range.start, &mut pending);
        prev_end = range.end;

        match result {
            Ok(Token::Comment(text)) => {
                pending.push(RawExtra {
                    kind: RawExtraKind::Comment,
                    text,
                    range,
                    anchor: 0,
                });
            }
            Ok(token) => {
                for mut extra in pending.drain(..) {
                    extra.anchor = range.start;
                    extras.push(extra);
                }
                tokens.push((token, range));
            }
            Err(()) => {
                for mut extra in pending.drain(..) {
                    extra.anchor = range.start;
                    extras.push(extra);
                }
                tokens.push((Token::Unknown, range));
            }
        }
    }

    blank_lines(source, prev_end, source.len(), &mut pending);
    for mut extra in pending.drain(..) {
        extra.anchor = source.len();
        extras.push(extra);
    }

    Lexed { tokens, extras }
}

/// Detect blank lines inside the whitespace gap `[from, to)` and push one
/// extra per blank line.
///
/// A gap starting at the very beginning of the file turns every newline
/// into a blank line (the line before each of them is empty); an interior
/// gap's first newline only terminates the previous token's line.
fn blank_lines(source: &str, from: usize, to: usize, pending: &mut Vec<RawExtra>) {
    if from >= to {
        return;
    }
    let gap = &source[from..to];
    let newlines: Vec<usize> = gap
        .char_indices()
        .filter(|(_, c)| *c == '\n')
        .map(|(i, _)| from + i)
        .collect();
    if newlines.is_empty() {
        return;
    }

    let mut starts: Vec<usize> = Vec::new();
    if from == 0 {
        starts.push(0);
        starts.extend(newlines[..newlines.len() - 1].iter().map(|nl| nl + 1));
    } else {
        starts.extend(newlines[..newlines.len() - 1].iter().map(|nl| nl + 1));
    }

    for start in starts {
        pending.push(RawExtra {
            kind: RawExtraKind::BlankLine,
            text: String::new(),
            range: start..start,
            anchor: 0,
        });
    }
}
