//! Foundation types shared by every phase: spans and source files.

pub mod span;

pub use span::{SourceFile, SourceMap, Span};
