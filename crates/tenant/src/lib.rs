//! `congregate-tenant` — which organization a request belongs to.
//!
//! - `organization`: the tenant record and its validated branding values
//! - `locate`: derive a tenant key from the host, an explicit header or the session
//! - `directory`: lookup collaborator (hosted database in production)
//! - `provider`: per-tenant snapshots and the scoped accessor

pub mod directory;
pub mod locate;
pub mod organization;
pub mod provider;

pub use directory::{InMemoryOrganizationDirectory, OrganizationDirectory};
pub use locate::{TenantKey, TenantLocator};
pub use organization::{BrandColor, Organization, OrganizationSlug};
pub use provider::{TenantProvider, TenantScope, TenantState, WiringError, use_organization};
