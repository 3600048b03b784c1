//! Development seed data for the in-memory directories.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use congregate_auth::{InMemoryProfileDirectory, Profile};
use congregate_core::UserId;
use congregate_tenant::{InMemoryOrganizationDirectory, Organization};

/// `{ "organizations": [...], "profiles": [{ "user_id", "role", "organization_ref" }] }`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub organizations: Vec<Organization>,
    #[serde(default)]
    pub profiles: Vec<SeedProfile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedProfile {
    pub user_id: UserId,
    #[serde(flatten)]
    pub profile: Profile,
}

impl Seed {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading seed file {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing seed file {}", path.display()))
    }

    pub fn apply(&self, profiles: &InMemoryProfileDirectory, organizations: &InMemoryOrganizationDirectory) {
        for org in &self.organizations {
            organizations.upsert(org.clone());
        }
        for seed in &self.profiles {
            profiles.upsert(seed.user_id, seed.profile.clone());
        }
        tracing::info!(
            organizations = self.organizations.len(),
            profiles = self.profiles.len(),
            "seed data loaded"
        );
    }
}
