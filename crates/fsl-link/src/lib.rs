// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Link-time transformations over FSL schema trees.
//!
//! - [`link_functions`]: content-addressed UDF renaming with reference
//!   rewriting, cycle-aware
//! - [`merge_roles`]: deterministic fusion of same-named roles with
//!   privilege/membership deduplication and conflict detection

mod cycles;
pub mod linker;
pub mod roles;

pub use linker::{link_functions, LinkError};
pub use roles::{merge_roles, MergeError};
