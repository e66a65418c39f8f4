//! Parse errors.
//!
//! Internally the parser works with span-based [`SyntaxError`]s; the
//! public [`ParseError`] resolves the span to `(file, line, column)` at
//! the `parse()` boundary. The first error aborts the parse — there is no
//! recovery.

use fsl_ast::{SourceMap, Span};
use fsl_lexer::Token;
use std::path::PathBuf;
use thiserror::Error;

/// Span-based error used inside the parser.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SyntaxError {
    /// What the parser was looking for, e.g. "`}`" or "declaration".
    pub expected: String,
    /// The token actually found, if any.
    pub found: Option<Token>,
    pub span: Span,
}

impl SyntaxError {
    pub fn expected(expected: impl Into<String>, found: Option<Token>, span: Span) -> Self {
        Self {
            expected: expected.into(),
            found,
            span,
        }
    }

    /// Resolve to the public error using the tree's file table.
    pub fn into_parse_error(self, sources: &SourceMap) -> ParseError {
        let (line, column) = sources.line_col(self.span.file_id, self.span.start);
        let file = sources
            .path(&self.span)
            .map(|p| p.to_path_buf())
            .unwrap_or_default();
        ParseError {
            file,
            line,
            column,
            expected: self.expected,
            found: match self.found {
                Some(token) => format!("`{}`", token),
                None => "end of input".to_string(),
            },
        }
    }
}

/// A syntax error with its resolved source position.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}:{line}:{column}: expected {expected}, found {found}", file.display())]
pub struct ParseError {
    pub file: PathBuf,
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub column: u32,
    pub expected: String,
    pub found: String,
}
