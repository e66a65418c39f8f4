// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! AST types for the FSL schema language.
//!
//! This crate contains the declaration model, FQL type expressions,
//! source tracking (spans and file tables), code equality, and the schema
//! tree with its operations (filter, remove, sort, merge, listing).
//!
//! Parsing lives in `fsl-parser`; printing in `fsl-printer`; the function
//! linker and role merger in `fsl-link`.

pub mod ast;
pub mod equality;
pub mod error;
pub mod foundation;
pub mod tree;

pub use ast::*;
pub use equality::CodeEq;
pub use error::TreeError;
pub use foundation::{SourceFile, SourceMap, Span};
pub use tree::{DeclarationInfo, SchemaTree};
