//! Resource domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A typed reference to retrievable data, always a child of exactly one
/// package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    /// Parent package id. Set at creation, never reassigned.
    pub package_id: String,
    pub name: String,
    /// Locator: external URL, object-store path, stream topic.
    pub url: String,
    pub description: String,
    /// Free-form format tag: `CSV`, `URL`, `S3`, `Kafka`, ...
    pub format: String,
    pub created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

/// Fields required to create a new resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateResource {
    /// Must resolve to an existing package.
    pub package_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub format: String,
}

/// Merge-semantics update for the patchable resource fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatchResource {
    pub name: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub format: Option<String>,
}

impl PatchResource {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.url.is_none()
            && self.description.is_none()
            && self.format.is_none()
    }
}
