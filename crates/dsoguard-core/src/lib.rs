//! dsoguard core: the permission-aware request rewriting engine.
//!
//! Given an authenticated principal and entity metadata, this crate decides
//! which entities, fields and relationship joins a load or save may touch and
//! which server conditions must be injected. It performs no I/O of its own:
//! entity metadata arrives through the [`cache::EntityLoader`] seam and the
//! regulated request is handed back to the caller for execution.
//!
//! # Panics
//! Panics, `unwrap`, and `expect` are compile-denied here. All fallible paths
//! surface as `GuardError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod cache;
pub mod condition;
pub mod enforce;
pub mod error;
pub mod fieldpath;
pub mod model;
pub mod permission;
pub mod principal;
pub mod protocol;

/// Shared result type.
pub use error::{GuardError, Result};

pub use cache::{EntityCache, EntityLoader};
pub use enforce::{Operation, OperationEnforcer};
pub use fieldpath::{FieldPathResolver, ResolvedFieldSet};
pub use permission::{PermissionResolver, PermissionSet, PermissionSets};
pub use principal::{Principal, UserInfo};
