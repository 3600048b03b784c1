//! `congregate-auth` — sessions, roles and the role-gated route guard.
//!
//! The guard decision itself is pure and synchronous; the session provider
//! resolves profiles asynchronously and publishes snapshots it can read.

pub mod claims;
pub mod directory;
pub mod fallback;
pub mod guard;
pub mod provider;
pub mod roles;
pub mod session;

pub use claims::{Hs256JwtValidator, JwtClaims, JwtValidator, TokenValidationError, validate_claims};
pub use directory::{InMemoryProfileDirectory, ProfileDirectory};
pub use fallback::{Fallback, FallbackTable};
pub use guard::{GuardOutcome, GuardRequest, LOGIN_PATH, Redirect, RoleGuard, evaluate};
pub use provider::SessionProvider;
pub use roles::Role;
pub use session::{Profile, Session};
