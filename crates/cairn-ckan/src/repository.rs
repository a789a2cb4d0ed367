//! CKAN implementation of [`CatalogRepository`].
//!
//! Each operation maps near-1:1 onto a remote action call. The two
//! deliberate departures from raw CKAN behavior: deletes purge instead
//! of soft-deleting, and organization deletion cascade-purges owned
//! packages first so the purge can never be blocked by a live child.

use std::collections::HashMap;

use async_trait::async_trait;
use cairn_core::error::{CatalogError, CatalogResult};
use cairn_core::models::organization::{CreateOrganization, Organization, OrganizationRef};
use cairn_core::models::package::{
    CreatePackage, Package, PatchPackage, UpdatePackage, validate_extras,
};
use cairn_core::models::resource::{CreateResource, PatchResource, Resource};
use cairn_core::repository::CatalogRepository;
use cairn_core::search::{
    FieldFilter, ResourceHit, ResourceQuery, ResourceResults, SearchRequest, SearchResults,
};
use serde_json::json;
use tracing::{debug, info};

use crate::client::{CkanClient, CkanConfig};
use crate::codec::{
    WireOrganization, WirePackage, WireResource, WireResourceResults, WireSearchResults,
    package_create_payload, tags_payload,
};
use crate::error::CkanError;
use crate::query::search_payload;

/// Catalog adapter backed by a remote CKAN action API.
#[derive(Debug, Clone)]
pub struct CkanRepository {
    client: CkanClient,
}

impl CkanRepository {
    pub fn new(config: &CkanConfig) -> CatalogResult<Self> {
        Ok(Self {
            client: CkanClient::new(config)?,
        })
    }

    async fn show_wire_package(&self, id_or_name: &str) -> Result<WirePackage, CkanError> {
        self.client
            .call("package_show", json!({ "id": id_or_name }))
            .await
    }

    async fn show_wire_organization(
        &self,
        id_or_name: &str,
    ) -> Result<WireOrganization, CkanError> {
        self.client
            .call("organization_show", json!({ "id": id_or_name }))
            .await
    }

    /// Rewrite `owner_org` filters naming an organization into its id.
    /// An unknown name is kept verbatim so the filter still executes
    /// (matching nothing) instead of erroring.
    async fn resolve_owner_filters(
        &self,
        filters: &[FieldFilter],
    ) -> CatalogResult<Vec<FieldFilter>> {
        let mut resolved = Vec::with_capacity(filters.len());
        for filter in filters {
            if filter.field == "owner_org" {
                match self.show_wire_organization(&filter.value).await {
                    Ok(org) => resolved.push(FieldFilter::new("owner_org", org.id)),
                    Err(CkanError::NotFound(_)) => resolved.push(filter.clone()),
                    Err(err) => return Err(err.catalog("organization", &filter.value)),
                }
            } else {
                resolved.push(filter.clone());
            }
        }
        Ok(resolved)
    }

    /// CKAN normally embeds the organization object itself; fill it in
    /// for any package where it is missing, one lookup per distinct org.
    async fn expand_missing_organizations(
        &self,
        packages: &mut [Package],
    ) -> CatalogResult<()> {
        let mut cache: HashMap<String, Option<OrganizationRef>> = HashMap::new();
        for package in packages.iter_mut() {
            if package.organization.is_some() || package.owner_org.is_empty() {
                continue;
            }
            let org = match cache.get(&package.owner_org) {
                Some(cached) => cached.clone(),
                None => {
                    let fetched = match self.show_wire_organization(&package.owner_org).await {
                        Ok(org) => Some(org.into_ref()),
                        Err(CkanError::NotFound(_)) => None,
                        Err(err) => return Err(err.catalog("organization", &package.owner_org)),
                    };
                    cache.insert(package.owner_org.clone(), fetched.clone());
                    fetched
                }
            };
            package.organization = org;
        }
        Ok(())
    }

    /// Context lookup for resource search hits, one fetch per parent.
    async fn dataset_context(
        &self,
        cache: &mut HashMap<String, Option<(String, String, String)>>,
        package_id: &str,
    ) -> CatalogResult<(String, String, String)> {
        if let Some(cached) = cache.get(package_id) {
            return Ok(cached
                .clone()
                .unwrap_or_else(|| (package_id.to_string(), String::new(), String::new())));
        }
        let context = match self.show_wire_package(package_id).await {
            Ok(wire) => Some((wire.id, wire.name, wire.title)),
            Err(CkanError::NotFound(_)) => None,
            Err(err) => return Err(err.catalog("package", package_id)),
        };
        cache.insert(package_id.to_string(), context.clone());
        Ok(context.unwrap_or_else(|| (package_id.to_string(), String::new(), String::new())))
    }
}

#[async_trait]
impl CatalogRepository for CkanRepository {
    async fn package_create(&self, input: CreatePackage) -> CatalogResult<Package> {
        validate_extras(&input.extras)?;
        let wire: WirePackage = self
            .client
            .call("package_create", package_create_payload(&input))
            .await
            .map_err(|e| e.catalog("package", &input.name))?;
        info!(name = %input.name, "created package");
        wire.into_package()
            .map_err(|e| e.catalog("package", &input.name))
    }

    async fn package_show(&self, id_or_name: &str) -> CatalogResult<Package> {
        let wire = self
            .show_wire_package(id_or_name)
            .await
            .map_err(|e| e.catalog("package", id_or_name))?;
        let mut package = wire
            .into_package()
            .map_err(|e| e.catalog("package", id_or_name))?;
        self.expand_missing_organizations(std::slice::from_mut(&mut package))
            .await?;
        Ok(package)
    }

    async fn package_update(
        &self,
        id_or_name: &str,
        input: UpdatePackage,
    ) -> CatalogResult<Package> {
        validate_extras(&input.extras)?;
        // package_patch with the full mutable field set replaces those
        // fields while leaving name/owner_org untouched, which is
        // exactly the update contract.
        let wire: WirePackage = self
            .client
            .call(
                "package_patch",
                json!({
                    "id": id_or_name,
                    "title": input.title,
                    "notes": input.notes,
                    "extras": input.extras,
                    "tags": tags_payload(&input.tags),
                }),
            )
            .await
            .map_err(|e| e.catalog("package", id_or_name))?;
        wire.into_package()
            .map_err(|e| e.catalog("package", id_or_name))
    }

    async fn package_patch(
        &self,
        id_or_name: &str,
        input: PatchPackage,
    ) -> CatalogResult<Package> {
        if input.is_empty() {
            return Err(CatalogError::validation("package patch contains no fields"));
        }
        if let Some(extras) = &input.extras {
            validate_extras(extras)?;
        }
        let mut payload = serde_json::Map::new();
        payload.insert("id".into(), json!(id_or_name));
        if let Some(title) = input.title {
            payload.insert("title".into(), json!(title));
        }
        if let Some(notes) = input.notes {
            payload.insert("notes".into(), json!(notes));
        }
        if let Some(extras) = input.extras {
            payload.insert("extras".into(), json!(extras));
        }
        if let Some(tags) = input.tags {
            payload.insert("tags".into(), tags_payload(&tags));
        }
        let wire: WirePackage = self
            .client
            .call("package_patch", serde_json::Value::Object(payload))
            .await
            .map_err(|e| e.catalog("package", id_or_name))?;
        wire.into_package()
            .map_err(|e| e.catalog("package", id_or_name))
    }

    async fn package_delete(&self, id_or_name: &str) -> CatalogResult<()> {
        // Resolve to the canonical id first; purge wants it, and this
        // surfaces NotFound before any destructive call.
        let wire = self
            .show_wire_package(id_or_name)
            .await
            .map_err(|e| e.catalog("package", id_or_name))?;
        self.client
            .call::<serde_json::Value>("package_delete", json!({ "id": wire.id }))
            .await
            .map_err(|e| e.catalog("package", id_or_name))?;
        // CKAN's delete is a soft delete; purge makes it permanent so
        // the owning organization stays deletable.
        self.client
            .call::<serde_json::Value>("dataset_purge", json!({ "id": wire.id }))
            .await
            .map_err(|e| e.catalog("package", id_or_name))?;
        info!(id = %wire.id, "purged package");
        Ok(())
    }

    async fn package_search(&self, request: &SearchRequest) -> CatalogResult<SearchResults> {
        let filters = self.resolve_owner_filters(&request.filters).await?;
        let wire: WireSearchResults = self
            .client
            .call("package_search", search_payload(request, &filters))
            .await
            .map_err(|e| e.catalog("package", "search"))?;

        debug!(count = wire.count, "package search");

        let mut results = Vec::with_capacity(wire.results.len());
        for item in wire.results {
            results.push(
                item.into_package()
                    .map_err(|e| e.catalog("package", "search"))?,
            );
        }
        self.expand_missing_organizations(&mut results).await?;

        Ok(SearchResults {
            count: wire.count,
            results,
        })
    }

    async fn resource_create(&self, input: CreateResource) -> CatalogResult<Resource> {
        // The contract wants Validation (not NotFound) for a dangling
        // parent reference.
        match self.show_wire_package(&input.package_id).await {
            Ok(_) => {}
            Err(CkanError::NotFound(_)) => {
                return Err(CatalogError::validation(format!(
                    "package '{}' does not exist",
                    input.package_id
                )));
            }
            Err(err) => return Err(err.catalog("package", &input.package_id)),
        }
        let wire: WireResource = self
            .client
            .call(
                "resource_create",
                json!({
                    "package_id": input.package_id,
                    "name": input.name,
                    "url": input.url,
                    "description": input.description,
                    "format": input.format,
                }),
            )
            .await
            .map_err(|e| e.catalog("resource", &input.name))?;
        info!(package_id = %input.package_id, name = %input.name, "created resource");
        Ok(wire.into_resource())
    }

    async fn resource_show(&self, id: &str) -> CatalogResult<Resource> {
        let wire: WireResource = self
            .client
            .call("resource_show", json!({ "id": id }))
            .await
            .map_err(|e| e.catalog("resource", id))?;
        Ok(wire.into_resource())
    }

    async fn resource_patch(&self, id: &str, input: PatchResource) -> CatalogResult<Resource> {
        if input.is_empty() {
            return Err(CatalogError::validation("resource patch contains no fields"));
        }
        let mut payload = serde_json::Map::new();
        payload.insert("id".into(), json!(id));
        if let Some(name) = input.name {
            payload.insert("name".into(), json!(name));
        }
        if let Some(url) = input.url {
            payload.insert("url".into(), json!(url));
        }
        if let Some(description) = input.description {
            payload.insert("description".into(), json!(description));
        }
        if let Some(format) = input.format {
            payload.insert("format".into(), json!(format));
        }
        let wire: WireResource = self
            .client
            .call("resource_patch", serde_json::Value::Object(payload))
            .await
            .map_err(|e| e.catalog("resource", id))?;
        Ok(wire.into_resource())
    }

    async fn resource_delete(&self, id: &str) -> CatalogResult<()> {
        self.client
            .call::<serde_json::Value>("resource_delete", json!({ "id": id }))
            .await
            .map_err(|e| e.catalog("resource", id))?;
        Ok(())
    }

    async fn resource_search(&self, query: &ResourceQuery) -> CatalogResult<ResourceResults> {
        // CKAN's resource_search has no multi-field term match; the
        // free-text term maps to a name match, its closest native form.
        let mut clauses = Vec::new();
        if let Some(name) = query.name.as_deref().or(query.term.as_deref()) {
            clauses.push(format!("name:{name}"));
        }
        if let Some(url) = &query.url {
            clauses.push(format!("url:{url}"));
        }
        if let Some(format) = &query.format {
            clauses.push(format!("format:{format}"));
        }
        if let Some(description) = &query.description {
            clauses.push(format!("description:{description}"));
        }
        if clauses.is_empty() {
            // Empty prefix matches every resource.
            clauses.push("name:".to_string());
        }

        let wire: WireResourceResults = self
            .client
            .call(
                "resource_search",
                json!({
                    "query": clauses,
                    "limit": query.limit,
                    "offset": query.offset,
                }),
            )
            .await
            .map_err(|e| e.catalog("resource", "search"))?;

        let mut cache = HashMap::new();
        let mut results = Vec::with_capacity(wire.results.len());
        for item in wire.results {
            let resource = item.into_resource();
            let (dataset_id, dataset_name, dataset_title) =
                self.dataset_context(&mut cache, &resource.package_id).await?;
            results.push(ResourceHit {
                resource,
                dataset_id,
                dataset_name,
                dataset_title,
            });
        }

        Ok(ResourceResults {
            count: wire.count,
            results,
        })
    }

    async fn organization_create(
        &self,
        input: CreateOrganization,
    ) -> CatalogResult<Organization> {
        let wire: WireOrganization = self
            .client
            .call(
                "organization_create",
                json!({
                    "name": input.name,
                    "title": input.title,
                    "description": input.description,
                }),
            )
            .await
            .map_err(|e| e.catalog("organization", &input.name))?;
        info!(name = %input.name, "created organization");
        wire.into_organization()
            .map_err(|e| e.catalog("organization", &input.name))
    }

    async fn organization_show(&self, id_or_name: &str) -> CatalogResult<Organization> {
        let wire = self
            .show_wire_organization(id_or_name)
            .await
            .map_err(|e| e.catalog("organization", id_or_name))?;
        wire.into_organization()
            .map_err(|e| e.catalog("organization", id_or_name))
    }

    async fn organization_list(&self) -> CatalogResult<Vec<Organization>> {
        let wire: Vec<WireOrganization> = self
            .client
            .call("organization_list", json!({ "all_fields": true }))
            .await
            .map_err(|e| e.catalog("organization", "list"))?;
        wire.into_iter()
            .map(|w| {
                w.into_organization()
                    .map_err(|e| e.catalog("organization", "list"))
            })
            .collect()
    }

    async fn organization_delete(&self, id_or_name: &str) -> CatalogResult<()> {
        let org = self
            .show_wire_organization(id_or_name)
            .await
            .map_err(|e| e.catalog("organization", id_or_name))?;

        // Cascade: purge every owned package first, otherwise the
        // organization purge is blocked by its live children.
        loop {
            let owned = self
                .package_search(
                    &SearchRequest::default()
                        .filter("owner_org", org.id.clone()),
                )
                .await?;
            if owned.results.is_empty() {
                break;
            }
            for package in owned.results {
                self.package_delete(&package.id).await?;
            }
        }

        self.client
            .call::<serde_json::Value>("organization_delete", json!({ "id": org.id }))
            .await
            .map_err(|e| e.catalog("organization", id_or_name))?;
        self.client
            .call::<serde_json::Value>("organization_purge", json!({ "id": org.id }))
            .await
            .map_err(|e| e.catalog("organization", id_or_name))?;
        info!(id = %org.id, "purged organization");
        Ok(())
    }

    async fn check_health(&self) -> bool {
        self.client
            .call::<serde_json::Value>("status_show", json!({}))
            .await
            .is_ok()
    }
}
