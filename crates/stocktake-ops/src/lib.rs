//! Rename and permission mutations for stocktake.
//!
//! A [`MutationService`] validates a request, performs it on disk, re-reads
//! the entry's metadata and replaces the entry in the [`Inventory`] in
//! place. Failures are returned to the caller and journaled to the
//! [`AccessLog`].
//!
//! [`Inventory`]: stocktake_core::Inventory
//! [`AccessLog`]: stocktake_core::AccessLog

mod chmod;
mod error;
mod rename;
mod service;

pub use chmod::{TYPE_GLYPHS, parse_permission_string};
pub use error::MutationError;
pub use rename::{sibling_path, validate_filename};
pub use service::{Mutation, MutationKind, MutationService};
