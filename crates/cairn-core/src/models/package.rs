//! Package (dataset) domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::organization::OrganizationRef;
use super::resource::Resource;
use crate::error::{CatalogError, CatalogResult};

/// Extras keys managed by the platform. User-supplied extras using any
/// of these are rejected on write so they cannot shadow system fields.
pub const RESERVED_EXTRA_KEYS: &[&str] = &[
    "name",
    "title",
    "owner_org",
    "notes",
    "id",
    "resources",
    "collection",
    "url",
    "mapping",
    "processing",
    "file_type",
    "version",
];

/// One user-defined metadata entry. Order is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extra {
    pub key: String,
    pub value: String,
}

impl Extra {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Lifecycle state. "Deleted" never appears in practice: deletion is a
/// true purge in both adapters, not a soft-delete flag, because a
/// soft-deleted package blocks deletion of its parent organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityState {
    Active,
    Deleted,
}

impl Default for EntityState {
    fn default() -> Self {
        Self::Active
    }
}

/// A named, organization-owned metadata record with child resources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    /// Opaque unique identifier, generated at creation, immutable.
    pub id: String,
    /// Unique human-chosen slug; uniqueness is enforced backend-side.
    pub name: String,
    pub title: String,
    /// Free-text description.
    pub notes: String,
    /// Owning organization's id.
    pub owner_org: String,
    /// Expanded owner detail, present on show/search responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<OrganizationRef>,
    pub extras: Vec<Extra>,
    pub tags: Vec<String>,
    pub resources: Vec<Resource>,
    pub state: EntityState,
    pub metadata_created: DateTime<Utc>,
    pub metadata_modified: DateTime<Utc>,
}

/// Fields required to create a new package.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePackage {
    pub name: String,
    #[serde(default)]
    pub title: String,
    /// Organization id or name; must resolve at write time.
    pub owner_org: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub extras: Vec<Extra>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Full replacement of a package's mutable fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePackage {
    pub title: String,
    pub notes: String,
    pub extras: Vec<Extra>,
    pub tags: Vec<String>,
}

/// Merge-semantics update: `None` fields keep their prior value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatchPackage {
    pub title: Option<String>,
    pub notes: Option<String>,
    pub extras: Option<Vec<Extra>>,
    pub tags: Option<Vec<String>>,
}

impl PatchPackage {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.notes.is_none()
            && self.extras.is_none()
            && self.tags.is_none()
    }
}

/// Reject extras that collide with platform-managed keys.
///
/// Runs before any write so a rejected create or update leaves nothing
/// partially applied.
pub fn validate_extras(extras: &[Extra]) -> CatalogResult<()> {
    let offending: Vec<&str> = extras
        .iter()
        .map(|e| e.key.as_str())
        .filter(|k| RESERVED_EXTRA_KEYS.contains(k))
        .collect();

    if offending.is_empty() {
        Ok(())
    } else {
        Err(CatalogError::validation(format!(
            "extras contain reserved keys: {}",
            offending.join(", ")
        )))
    }
}
