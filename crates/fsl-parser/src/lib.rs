// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Parser for the FSL schema language.
//!
//! `parse()` turns one source file into a [`fsl_ast::SchemaTree`]:
//! declarations fully parsed, FQL types fully parsed, FQL expression
//! bodies captured verbatim with their spans, comments and blank lines
//! preserved as extras.
//!
//! The [`walker`] module provides the lazy identifier walker the linker
//! uses to find UDF references inside expression bodies.

pub mod parser;
pub mod walker;

pub use parser::{parse, ParseError};
pub use walker::{identifiers, rewrite_identifiers, IdentRef};
