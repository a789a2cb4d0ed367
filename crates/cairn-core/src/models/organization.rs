//! Organization domain model.
//!
//! Organizations own packages. An organization cannot be purged while it
//! still owns live packages, which is why both adapters cascade-purge
//! owned packages on organization deletion.

use serde::{Deserialize, Serialize};

use super::package::EntityState;

/// A named grouping that owns zero or more packages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    /// Opaque unique identifier, generated at creation.
    pub id: String,
    /// Unique human-chosen slug.
    pub name: String,
    pub title: String,
    pub description: String,
    pub created: chrono::DateTime<chrono::Utc>,
    pub state: EntityState,
}

/// The embedded organization object carried by packages returned from
/// show and search operations. The CKAN backend embeds this natively;
/// the MongoDB backend synthesizes it with a secondary lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationRef {
    pub id: String,
    pub name: String,
    pub title: String,
    pub description: String,
}

impl From<&Organization> for OrganizationRef {
    fn from(org: &Organization) -> Self {
        Self {
            id: org.id.clone(),
            name: org.name.clone(),
            title: org.title.clone(),
            description: org.description.clone(),
        }
    }
}

/// Fields required to create a new organization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateOrganization {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}
