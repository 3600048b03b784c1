//! `congregate-core` — shared building blocks.
//!
//! This crate holds identifiers, the domain error model, the reactive
//! snapshot cell used by the session and tenant providers and the bounded
//! cache those providers keep their cells in. No HTTP, no storage.

pub mod cache;
pub mod error;
pub mod id;
pub mod snapshot;

pub use cache::{CacheLimits, Lookup, SnapshotCache};
pub use error::{DomainError, DomainResult};
pub use id::{OrganizationId, UserId};
pub use snapshot::{ResolutionError, ResolutionTicket, Snapshot, SnapshotSource};
