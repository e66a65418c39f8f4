//! AST node definitions for FSL.

pub mod declaration;
pub mod node;
pub mod types;
pub mod walk;

pub use declaration::*;
pub use node::{ExprBlob, Extra, ExtraKind, TextNode};
pub use types::{FnParams, FqlType, ObjectField};
