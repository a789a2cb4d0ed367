//! Wire-format codec: CKAN action-API JSON ⇄ canonical entities.
//!
//! CKAN's idiosyncrasies live here: tags as `{name}` objects, extras as
//! `{key, value}` objects, timestamps without a timezone suffix, and the
//! embedded `organization` object on packages.

use cairn_core::models::organization::{Organization, OrganizationRef};
use cairn_core::models::package::{CreatePackage, EntityState, Extra, Package};
use cairn_core::models::resource::Resource;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CkanError;

/// CKAN emits naive ISO timestamps (`2024-05-01T12:00:00.123456`);
/// they are UTC by convention. RFC 3339 is accepted as well.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn required_timestamp(raw: Option<&str>, field: &str) -> Result<DateTime<Utc>, CkanError> {
    raw.and_then(parse_timestamp)
        .ok_or_else(|| CkanError::Protocol(format!("missing or malformed {field}")))
}

fn parse_state(raw: Option<&str>) -> EntityState {
    match raw {
        Some("deleted") => EntityState::Deleted,
        _ => EntityState::Active,
    }
}

// -----------------------------------------------------------------------
// Response wire shapes
// -----------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct WireExtra {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireTag {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireOrganization {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub created: Option<String>,
    pub state: Option<String>,
}

impl WireOrganization {
    pub(crate) fn into_organization(self) -> Result<Organization, CkanError> {
        let created = required_timestamp(self.created.as_deref(), "organization created")?;
        Ok(Organization {
            id: self.id,
            name: self.name,
            title: self.title,
            description: self.description,
            created,
            state: parse_state(self.state.as_deref()),
        })
    }

    pub(crate) fn into_ref(self) -> OrganizationRef {
        OrganizationRef {
            id: self.id,
            name: self.name,
            title: self.title,
            description: self.description,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireResource {
    pub id: String,
    pub package_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub format: String,
    pub created: Option<String>,
    pub last_modified: Option<String>,
}

impl WireResource {
    /// Resource timestamps are frequently null in CKAN; fall back from
    /// `last_modified` to `created` to the epoch rather than failing.
    pub(crate) fn into_resource(self) -> Resource {
        let created = self
            .created
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(DateTime::UNIX_EPOCH);
        let last_modified = self
            .last_modified
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(created);
        Resource {
            id: self.id,
            package_id: self.package_id,
            name: self.name,
            url: self.url,
            description: self.description,
            format: self.format,
            created,
            last_modified,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WirePackage {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub title: String,
    pub notes: Option<String>,
    pub owner_org: Option<String>,
    pub organization: Option<WireOrganization>,
    #[serde(default)]
    pub extras: Vec<WireExtra>,
    #[serde(default)]
    pub tags: Vec<WireTag>,
    #[serde(default)]
    pub resources: Vec<WireResource>,
    pub state: Option<String>,
    pub metadata_created: Option<String>,
    pub metadata_modified: Option<String>,
}

impl WirePackage {
    pub(crate) fn into_package(self) -> Result<Package, CkanError> {
        let metadata_created =
            required_timestamp(self.metadata_created.as_deref(), "metadata_created")?;
        let metadata_modified =
            required_timestamp(self.metadata_modified.as_deref(), "metadata_modified")?;

        let organization = self.organization.map(WireOrganization::into_ref);
        let owner_org = self
            .owner_org
            .or_else(|| organization.as_ref().map(|o| o.id.clone()))
            .unwrap_or_default();

        Ok(Package {
            id: self.id,
            name: self.name,
            title: self.title,
            notes: self.notes.unwrap_or_default(),
            owner_org,
            organization,
            extras: self
                .extras
                .into_iter()
                .map(|e| Extra::new(e.key, e.value))
                .collect(),
            tags: self.tags.into_iter().map(|t| t.name).collect(),
            resources: self
                .resources
                .into_iter()
                .map(WireResource::into_resource)
                .collect(),
            state: parse_state(self.state.as_deref()),
            metadata_created,
            metadata_modified,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireSearchResults {
    pub count: u64,
    #[serde(default)]
    pub results: Vec<WirePackage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireResourceResults {
    pub count: u64,
    #[serde(default)]
    pub results: Vec<WireResource>,
}

// -----------------------------------------------------------------------
// Request payloads
// -----------------------------------------------------------------------

#[derive(Serialize)]
struct TagPayload<'a> {
    name: &'a str,
}

pub(crate) fn package_create_payload(input: &CreatePackage) -> serde_json::Value {
    serde_json::json!({
        "name": input.name,
        "title": input.title,
        "owner_org": input.owner_org,
        "notes": input.notes,
        "extras": input.extras,
        "tags": input.tags.iter().map(|t| TagPayload { name: t }).collect::<Vec<_>>(),
    })
}

pub(crate) fn tags_payload(tags: &[String]) -> serde_json::Value {
    serde_json::to_value(tags.iter().map(|t| TagPayload { name: t }).collect::<Vec<_>>())
        .unwrap_or_default()
}
