// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Output backends for FSL schema trees.
//!
//! - [`canonical`]: the stable text rendering used both as the public
//!   output format and as the linker's hash input
//! - [`canonical_with_source_map`]: same text plus an inline base64
//!   source map comment
//! - [`typescript_definitions`]: `.d.ts` text derived from collections

pub mod canonical;
pub mod sourcemap;
pub mod typescript;

pub use canonical::{
    canonical, canonical_declaration, canonical_with_source_map, SourceMapRequest,
};
pub use typescript::typescript_definitions;
