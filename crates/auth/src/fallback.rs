//! Where to send a signed-in user who lacks the roles a route requires.

use std::collections::HashMap;

use crate::Role;

/// Fallback for a single role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fallback {
    /// Redirect to this path.
    Path(String),
    /// No known safe destination; refuse instead of guessing.
    Deny,
}

/// Explicit `Role → fallback path` mapping.
///
/// Roles the table does not list get `otherwise`. The default table keeps the
/// long-standing behavior (participants to `/`, everyone else to
/// `/dashboard`); [`FallbackTable::strict`] denies unlisted roles so a newly
/// introduced role never inherits a destination it may not be allowed to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackTable {
    routes: HashMap<Role, String>,
    otherwise: Fallback,
}

impl FallbackTable {
    /// Tenant root, where participants land.
    pub const ROOT_PATH: &'static str = "/";
    /// Generic staff dashboard.
    pub const DASHBOARD_PATH: &'static str = "/dashboard";

    /// Table with an explicit path for unlisted roles.
    pub fn with_default(otherwise: impl Into<String>) -> Self {
        Self {
            routes: HashMap::new(),
            otherwise: Fallback::Path(otherwise.into()),
        }
    }

    /// Table that denies every role it does not list.
    pub fn strict<I, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Role, P)>,
        P: Into<String>,
    {
        let mut table = Self {
            routes: HashMap::new(),
            otherwise: Fallback::Deny,
        };
        for (role, path) in entries {
            table = table.route(role, path);
        }
        table
    }

    /// Map `role` to `path`, replacing any previous entry.
    pub fn route(mut self, role: Role, path: impl Into<String>) -> Self {
        self.routes.insert(role, path.into());
        self
    }

    /// Fallback for `role`.
    pub fn fallback_for(&self, role: &Role) -> Fallback {
        match self.routes.get(role) {
            Some(path) => Fallback::Path(path.clone()),
            None => self.otherwise.clone(),
        }
    }

    pub fn is_strict(&self) -> bool {
        self.otherwise == Fallback::Deny
    }
}

impl Default for FallbackTable {
    fn default() -> Self {
        Self::with_default(Self::DASHBOARD_PATH).route(Role::PARTICIPANT, Self::ROOT_PATH)
    }
}
