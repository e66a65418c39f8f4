// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! # FSL schema toolchain
//!
//! This crate is a facade that re-exports the toolchain's phases:
//!
//! - `fsl-ast` — AST, spans, tree operations, code equality
//! - `fsl-lexer` — tokenization with extras capture
//! - `fsl-parser` — recursive descent parser + FQL identifier walker
//! - `fsl-printer` — canonical printer, source maps, TypeScript
//! - `fsl-link` — function linker and role merger
//!
//! The [`pipeline`] module adds the high-level conveniences the CLI and
//! the C-ABI surface share: multi-file parsing and canonical printing
//! driven by optional JSON-encoded auxiliary inputs.

// Re-export AST and foundation types
pub use fsl_ast::{self as ast, *};

// Re-export lexer
pub use fsl_lexer as lexer;
pub use fsl_lexer::Token;

// Re-export parser
pub use fsl_parser as parser;
pub use fsl_parser::{identifiers, parse, rewrite_identifiers, ParseError};

// Re-export printer
pub use fsl_printer as printer;
pub use fsl_printer::{
    canonical, canonical_declaration, canonical_with_source_map, typescript_definitions,
    SourceMapRequest,
};

// Re-export link-time passes
pub use fsl_link as link;
pub use fsl_link::{link_functions, merge_roles, LinkError, MergeError};

pub mod pipeline;

pub use pipeline::{canonical_request, parse_source, parse_sources, CanonicalRequest};

/// Toolchain version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
