//! Stored document shapes and their conversions to canonical entities.
//!
//! Timestamps are stored as native BSON datetimes so index-backed sort
//! works on them directly.

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use cairn_core::models::organization::{CreateOrganization, Organization, OrganizationRef};
use cairn_core::models::package::{CreatePackage, EntityState, Extra, Package};
use cairn_core::models::resource::{CreateResource, Resource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct PackageDoc {
    pub id: String,
    pub name: String,
    pub title: String,
    pub notes: String,
    /// Always the organization id; name→id resolution happens on write.
    pub owner_org: String,
    pub extras: Vec<Extra>,
    pub tags: Vec<String>,
    pub state: EntityState,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub metadata_created: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub metadata_modified: DateTime<Utc>,
}

impl PackageDoc {
    pub(crate) fn new(input: CreatePackage, owner_org_id: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            title: input.title,
            notes: input.notes,
            owner_org: owner_org_id,
            extras: input.extras,
            tags: input.tags,
            state: EntityState::Active,
            metadata_created: now,
            metadata_modified: now,
        }
    }

    /// Build the canonical view: stored fields plus the synthesized
    /// organization object and assembled resource list.
    pub(crate) fn into_package(
        self,
        organization: Option<OrganizationRef>,
        resources: Vec<Resource>,
    ) -> Package {
        Package {
            id: self.id,
            name: self.name,
            title: self.title,
            notes: self.notes,
            owner_org: self.owner_org,
            organization,
            extras: self.extras,
            tags: self.tags,
            resources,
            state: self.state,
            metadata_created: self.metadata_created,
            metadata_modified: self.metadata_modified,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ResourceDoc {
    pub id: String,
    pub package_id: String,
    pub name: String,
    pub url: String,
    pub description: String,
    pub format: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub last_modified: DateTime<Utc>,
}

impl ResourceDoc {
    pub(crate) fn new(input: CreateResource, package_id: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            package_id,
            name: input.name,
            url: input.url,
            description: input.description,
            format: input.format,
            created: now,
            last_modified: now,
        }
    }

    pub(crate) fn into_resource(self) -> Resource {
        Resource {
            id: self.id,
            package_id: self.package_id,
            name: self.name,
            url: self.url,
            description: self.description,
            format: self.format,
            created: self.created,
            last_modified: self.last_modified,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct OrganizationDoc {
    pub id: String,
    pub name: String,
    pub title: String,
    pub description: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created: DateTime<Utc>,
    pub state: EntityState,
}

impl OrganizationDoc {
    pub(crate) fn new(input: CreateOrganization, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            title: input.title,
            description: input.description,
            created: now,
            state: EntityState::Active,
        }
    }

    pub(crate) fn to_ref(&self) -> OrganizationRef {
        OrganizationRef {
            id: self.id.clone(),
            name: self.name.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
        }
    }

    pub(crate) fn into_organization(self) -> Organization {
        Organization {
            id: self.id,
            name: self.name,
            title: self.title,
            description: self.description,
            created: self.created,
            state: self.state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_doc_resolves_owner_to_org_id() {
        let input = CreatePackage {
            name: "climate_2024".into(),
            title: "Climate".into(),
            owner_org: "research_team".into(),
            ..Default::default()
        };
        let doc = PackageDoc::new(input, "org-id-1".into(), Utc::now());
        // The stored document carries the id even when the caller
        // supplied the organization name.
        assert_eq!(doc.owner_org, "org-id-1");
        assert_eq!(doc.state, EntityState::Active);
        assert_eq!(doc.metadata_created, doc.metadata_modified);
    }

    #[test]
    fn expansion_keeps_stored_org_id_visible() {
        let org = OrganizationDoc::new(
            CreateOrganization {
                name: "research_team".into(),
                title: "Research Team".into(),
                description: String::new(),
            },
            Utc::now(),
        );
        let doc = PackageDoc::new(
            CreatePackage {
                name: "p".into(),
                owner_org: org.name.clone(),
                ..Default::default()
            },
            org.id.clone(),
            Utc::now(),
        );
        let package = doc.into_package(Some(org.to_ref()), Vec::new());
        let embedded = package.organization.unwrap();
        assert_eq!(embedded.id, package.owner_org);
        assert_eq!(embedded.name, "research_team");
    }

    #[test]
    fn timestamps_survive_bson_round_trip() {
        let doc = ResourceDoc::new(
            CreateResource {
                package_id: "p".into(),
                name: "observations.csv".into(),
                ..Default::default()
            },
            "pkg-1".into(),
            Utc::now(),
        );
        let raw = bson::to_document(&doc).unwrap();
        // Stored as a native BSON datetime, not a string.
        assert!(matches!(raw.get("created"), Some(bson::Bson::DateTime(_))));
        let back: ResourceDoc = bson::from_document(raw).unwrap();
        assert_eq!(back.created.timestamp_millis(), doc.created.timestamp_millis());
    }
}
