use serde::{Deserialize, Serialize};

use congregate_core::{DomainError, DomainResult, OrganizationId};

/// URL-safe organization handle (`grace-chapel`), used as subdomain label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrganizationSlug(String);

impl OrganizationSlug {
    pub const MAX_LEN: usize = 63;

    /// Validate a slug: 1-63 chars of `[a-z0-9-]`, no leading/trailing `-`.
    pub fn parse(raw: impl Into<String>) -> DomainResult<Self> {
        let raw = raw.into();

        if raw.is_empty() || raw.len() > Self::MAX_LEN {
            return Err(DomainError::validation(format!(
                "slug must be 1-{} characters",
                Self::MAX_LEN
            )));
        }
        if !raw
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        {
            return Err(DomainError::validation(format!(
                "slug '{raw}' may only contain lowercase letters, digits and '-'"
            )));
        }
        if raw.starts_with('-') || raw.ends_with('-') {
            return Err(DomainError::validation(format!(
                "slug '{raw}' may not start or end with '-'"
            )));
        }

        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for OrganizationSlug {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for OrganizationSlug {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<OrganizationSlug> for String {
    fn from(value: OrganizationSlug) -> Self {
        value.0
    }
}

/// `#rrggbb` branding color, normalized to lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BrandColor(String);

impl BrandColor {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let hex = raw
            .strip_prefix('#')
            .ok_or_else(|| DomainError::validation(format!("color '{raw}' must start with '#'")))?;

        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(DomainError::validation(format!(
                "color '{raw}' must be of the form #rrggbb"
            )));
        }

        Ok(Self(format!("#{}", hex.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BrandColor {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BrandColor> for String {
    fn from(value: BrandColor) -> Self {
        value.0
    }
}

/// A tenant: isolated customer account scope with its own branding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    pub primary_color: BrandColor,
    pub secondary_color: BrandColor,
    pub slug: OrganizationSlug,
}
