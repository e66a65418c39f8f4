//! Tree-level errors.

use thiserror::Error;

/// Errors raised by tree operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// A kind string outside the
    /// `access_provider | collection | function | role` vocabulary.
    #[error("invalid declaration kind: {0:?}")]
    InvalidDeclarationKind(String),
}
