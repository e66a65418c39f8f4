//! Hand-written recursive descent parser for FSL.
//!
//! ## Architecture
//!
//! - `stream`: token stream wrapper with lookahead and byte spans
//! - `error`: span-based syntax errors, resolved to file/line/column at
//!   the public boundary
//! - `decl`: declaration parsers (keyword-dispatched)
//! - `types`: the FQL type grammar (fully parsed)
//! - `body`: brace-balanced capture of FQL expression bodies
//!
//! The first syntax error aborts the parse.

pub mod error;

mod body;
mod decl;
mod stream;
mod types;

pub use error::ParseError;

use error::SyntaxError;
use fsl_ast::{Extra, ExtraKind, SchemaTree, SourceMap, Span, TextNode};
use fsl_lexer::{RawExtraKind, Token};
use std::ops::Range;
use std::path::PathBuf;
use std::rc::Rc;
use stream::TokenStream;

/// Parser state shared by the declaration parsers.
pub(crate) struct Parser<'src> {
    pub(crate) stream: TokenStream<'src>,
    /// Raw source, needed for expression-body capture.
    pub(crate) source: &'src str,
    pub(crate) file_id: u16,
    /// Byte ranges of captured expression bodies; extras inside them are
    /// dropped because the body text preserves them verbatim.
    pub(crate) blob_ranges: Vec<Range<usize>>,
}

impl<'src> Parser<'src> {
    /// True if the current token is the identifier `text`.
    fn peek_is_ident(&self, text: &str) -> bool {
        matches!(self.stream.peek(), Some(Token::Ident(s)) if s == text)
    }

    /// Consume an identifier, returning it as a text node.
    fn expect_ident(&mut self, what: &str) -> Result<TextNode, SyntaxError> {
        let span = self.stream.current_span();
        if matches!(self.stream.peek(), Some(Token::Ident(_))) {
            let text = match self.stream.advance() {
                Some(Token::Ident(s)) => s.clone(),
                _ => unreachable!("peek/advance disagree"),
            };
            Ok(TextNode::new(text, span))
        } else {
            Err(SyntaxError::expected(
                what,
                self.stream.peek().cloned(),
                span,
            ))
        }
    }

    /// Consume a string literal, returning its unescaped value.
    fn expect_string(&mut self, what: &str) -> Result<TextNode, SyntaxError> {
        let span = self.stream.current_span();
        if matches!(self.stream.peek(), Some(Token::String(_))) {
            let text = match self.stream.advance() {
                Some(Token::String(s)) => s.clone(),
                _ => unreachable!("peek/advance disagree"),
            };
            Ok(TextNode::new(text, span))
        } else {
            Err(SyntaxError::expected(
                what,
                self.stream.peek().cloned(),
                span,
            ))
        }
    }

    /// Consume a number literal, returning its raw text.
    fn expect_number(&mut self, what: &str) -> Result<TextNode, SyntaxError> {
        let span = self.stream.current_span();
        if matches!(self.stream.peek(), Some(Token::Number(_))) {
            let text = match self.stream.advance() {
                Some(Token::Number(s)) => s.clone(),
                _ => unreachable!("peek/advance disagree"),
            };
            Ok(TextNode::new(text, span))
        } else {
            Err(SyntaxError::expected(
                what,
                self.stream.peek().cloned(),
                span,
            ))
        }
    }
}

/// Parse one FSL source file into a schema tree.
///
/// `path` is the display name recorded in the tree's file table. The
/// first syntax error aborts; the error carries the resolved
/// file/line/column plus what was expected and found.
pub fn parse(source: &str, path: impl Into<PathBuf>) -> Result<SchemaTree, ParseError> {
    let lexed = fsl_lexer::lex(source);
    let mut sources = SourceMap::new();
    let file_id = sources.add_file(path.into(), source.to_string());

    let mut parser = Parser {
        stream: TokenStream::new(&lexed.tokens, file_id, source.len()),
        source,
        file_id,
        blob_ranges: Vec::new(),
    };

    let declarations = match decl::parse_declarations(&mut parser) {
        Ok(decls) => decls,
        Err(err) => return Err(err.into_parse_error(&sources)),
    };
    let blob_ranges = parser.blob_ranges;

    let extras = lexed
        .extras
        .into_iter()
        .filter(|e| {
            !blob_ranges
                .iter()
                .any(|r| e.range.start > r.start && e.range.start < r.end)
        })
        .map(|e| {
            Rc::new(Extra {
                kind: match e.kind {
                    RawExtraKind::Comment => ExtraKind::Comment,
                    RawExtraKind::BlankLine => ExtraKind::BlankLine,
                },
                text: e.text,
                span: Span::new(file_id, e.range.start as u32, e.range.end as u32),
                anchor: e.anchor as u32,
            })
        })
        .collect();

    Ok(SchemaTree {
        sources,
        declarations,
        extras,
    })
}
