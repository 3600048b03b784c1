use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role tag carried by a profile.
///
/// Roles are opaque strings: the application defines the full set, this crate
/// only names the ones the guard and default fallback table know about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    /// Program participant. Has no dashboard; lands on the tenant root.
    pub const PARTICIPANT: Role = Role(Cow::Borrowed("participant"));
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    pub const OWNER: Role = Role(Cow::Borrowed("owner"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Role {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}
