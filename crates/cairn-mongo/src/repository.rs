//! MongoDB implementation of [`CatalogRepository`].

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use bson::{Bson, doc};
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
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};
use tracing::{debug, info};

use crate::doc::{OrganizationDoc, PackageDoc, ResourceDoc};
use crate::error::{classify, is_duplicate_key};
use crate::query::{clamp_limit, package_filter, resource_filter, translate_sort};

/// Connection settings for the document store.
#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub connection_string: String,
    pub database: String,
    /// Server-selection deadline; expiry surfaces as
    /// `BackendUnavailable`.
    pub timeout: Duration,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            connection_string: "mongodb://localhost:27017".into(),
            database: "catalog".into(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Catalog adapter backed by three reference-linked collections.
#[derive(Debug, Clone)]
pub struct MongoRepository {
    db: Database,
    packages: Collection<PackageDoc>,
    resources: Collection<ResourceDoc>,
    organizations: Collection<OrganizationDoc>,
}

fn id_or_name(value: &str) -> bson::Document {
    doc! { "$or": [ { "id": value }, { "name": value } ] }
}

impl MongoRepository {
    /// Connect and make sure the supporting indexes exist.
    pub async fn connect(config: &MongoConfig) -> CatalogResult<Self> {
        info!(database = %config.database, "connecting to MongoDB");

        let mut options = ClientOptions::parse(&config.connection_string)
            .await
            .map_err(|e| {
                CatalogError::configuration(format!("MongoDB connection string: {e}"))
            })?;
        if options.server_selection_timeout.is_none() {
            options.server_selection_timeout = Some(config.timeout);
        }
        let client = Client::with_options(options)
            .map_err(|e| CatalogError::configuration(format!("MongoDB client: {e}")))?;

        let db = client.database(&config.database);
        let repo = Self {
            packages: db.collection("packages"),
            resources: db.collection("resources"),
            organizations: db.collection("organizations"),
            db,
        };
        repo.ensure_indexes().await?;
        Ok(repo)
    }

    async fn ensure_indexes(&self) -> CatalogResult<()> {
        let unique = || IndexOptions::builder().unique(true).build();

        self.packages
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "name": 1 })
                    .options(unique())
                    .build(),
            )
            .await
            .map_err(classify)?;
        self.packages
            .create_index(IndexModel::builder().keys(doc! { "owner_org": 1 }).build())
            .await
            .map_err(classify)?;
        self.resources
            .create_index(IndexModel::builder().keys(doc! { "package_id": 1 }).build())
            .await
            .map_err(classify)?;
        self.organizations
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "name": 1 })
                    .options(unique())
                    .build(),
            )
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn find_package_doc(&self, value: &str) -> CatalogResult<PackageDoc> {
        self.packages
            .find_one(id_or_name(value))
            .await
            .map_err(classify)?
            .ok_or_else(|| CatalogError::not_found("package", value))
    }

    async fn find_organization_doc(&self, value: &str) -> CatalogResult<OrganizationDoc> {
        self.organizations
            .find_one(id_or_name(value))
            .await
            .map_err(classify)?
            .ok_or_else(|| CatalogError::not_found("organization", value))
    }

    async fn package_resources(&self, package_id: &str) -> CatalogResult<Vec<Resource>> {
        let docs: Vec<ResourceDoc> = self
            .resources
            .find(doc! { "package_id": package_id })
            .sort(doc! { "created": 1 })
            .await
            .map_err(classify)?
            .try_collect()
            .await
            .map_err(classify)?;
        Ok(docs.into_iter().map(ResourceDoc::into_resource).collect())
    }

    /// One lookup per distinct organization id for a page of packages.
    async fn organization_refs(
        &self,
        ids: &HashSet<String>,
    ) -> CatalogResult<HashMap<String, OrganizationRef>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let id_list: Vec<&str> = ids.iter().map(String::as_str).collect();
        let docs: Vec<OrganizationDoc> = self
            .organizations
            .find(doc! { "id": { "$in": id_list } })
            .await
            .map_err(classify)?
            .try_collect()
            .await
            .map_err(classify)?;
        Ok(docs
            .into_iter()
            .map(|org| (org.id.clone(), org.to_ref()))
            .collect())
    }

    /// View assembly: expanded organization plus resource list. Never
    /// writes anything back to the store.
    async fn assemble(&self, doc: PackageDoc) -> CatalogResult<Package> {
        let organization = self
            .organizations
            .find_one(doc! { "id": doc.owner_org.as_str() })
            .await
            .map_err(classify)?
            .map(|org| org.to_ref());
        let resources = self.package_resources(&doc.id).await?;
        Ok(doc.into_package(organization, resources))
    }

    /// Rewrite `owner_org` filters naming an organization into its id.
    /// Unknown names are kept verbatim so the filter matches nothing
    /// instead of erroring.
    async fn resolve_owner_filters(
        &self,
        filters: &[FieldFilter],
    ) -> CatalogResult<Vec<FieldFilter>> {
        let mut resolved = Vec::with_capacity(filters.len());
        for filter in filters {
            if filter.field == "owner_org" {
                match self
                    .organizations
                    .find_one(id_or_name(&filter.value))
                    .await
                    .map_err(classify)?
                {
                    Some(org) => resolved.push(FieldFilter::new("owner_org", org.id)),
                    None => resolved.push(filter.clone()),
                }
            } else {
                resolved.push(filter.clone());
            }
        }
        Ok(resolved)
    }

    async fn touch_package(&self, package_id: &str) -> CatalogResult<()> {
        self.packages
            .update_one(
                doc! { "id": package_id },
                doc! { "$set": { "metadata_modified": bson::DateTime::now() } },
            )
            .await
            .map_err(classify)?;
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for MongoRepository {
    async fn package_create(&self, input: CreatePackage) -> CatalogResult<Package> {
        validate_extras(&input.extras)?;

        let org = self
            .organizations
            .find_one(id_or_name(&input.owner_org))
            .await
            .map_err(classify)?
            .ok_or_else(|| {
                CatalogError::validation(format!(
                    "owner_org '{}': organization does not exist",
                    input.owner_org
                ))
            })?;

        let name = input.name.clone();
        let doc = PackageDoc::new(input, org.id.clone(), Utc::now());
        self.packages.insert_one(&doc).await.map_err(|e| {
            if is_duplicate_key(&e) {
                CatalogError::validation(format!("package with name '{name}' already exists"))
            } else {
                classify(e)
            }
        })?;
        info!(name = %doc.name, id = %doc.id, "created package");
        Ok(doc.into_package(Some(org.to_ref()), Vec::new()))
    }

    async fn package_show(&self, id_or_name: &str) -> CatalogResult<Package> {
        let doc = self.find_package_doc(id_or_name).await?;
        self.assemble(doc).await
    }

    async fn package_update(
        &self,
        id_or_name: &str,
        input: UpdatePackage,
    ) -> CatalogResult<Package> {
        validate_extras(&input.extras)?;
        let existing = self.find_package_doc(id_or_name).await?;

        let extras = bson::to_bson(&input.extras)
            .map_err(|e| CatalogError::validation(format!("extras: {e}")))?;
        let tags = bson::to_bson(&input.tags)
            .map_err(|e| CatalogError::validation(format!("tags: {e}")))?;
        self.packages
            .update_one(
                doc! { "id": existing.id.as_str() },
                doc! { "$set": {
                    "title": input.title,
                    "notes": input.notes,
                    "extras": extras,
                    "tags": tags,
                    "metadata_modified": bson::DateTime::now(),
                } },
            )
            .await
            .map_err(classify)?;

        self.package_show(&existing.id).await
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
        let existing = self.find_package_doc(id_or_name).await?;

        let mut set = doc! { "metadata_modified": bson::DateTime::now() };
        if let Some(title) = input.title {
            set.insert("title", title);
        }
        if let Some(notes) = input.notes {
            set.insert("notes", notes);
        }
        if let Some(extras) = input.extras {
            set.insert(
                "extras",
                bson::to_bson(&extras)
                    .map_err(|e| CatalogError::validation(format!("extras: {e}")))?,
            );
        }
        if let Some(tags) = input.tags {
            set.insert(
                "tags",
                bson::to_bson(&tags)
                    .map_err(|e| CatalogError::validation(format!("tags: {e}")))?,
            );
        }
        self.packages
            .update_one(doc! { "id": existing.id.as_str() }, doc! { "$set": set })
            .await
            .map_err(classify)?;

        self.package_show(&existing.id).await
    }

    async fn package_delete(&self, id_or_name: &str) -> CatalogResult<()> {
        let existing = self.find_package_doc(id_or_name).await?;

        // Children first: a retry after a partial failure re-deletes
        // nothing and still removes the package document.
        self.resources
            .delete_many(doc! { "package_id": existing.id.as_str() })
            .await
            .map_err(classify)?;
        self.packages
            .delete_one(doc! { "id": existing.id.as_str() })
            .await
            .map_err(classify)?;
        info!(id = %existing.id, "deleted package");
        Ok(())
    }

    async fn package_search(&self, request: &SearchRequest) -> CatalogResult<SearchResults> {
        let filters = self.resolve_owner_filters(&request.filters).await?;
        let filter = package_filter(request.term.as_deref(), &filters);
        let sort = translate_sort(&request.sort);

        let count = self
            .packages
            .count_documents(filter.clone())
            .await
            .map_err(classify)?;
        let docs: Vec<PackageDoc> = self
            .packages
            .find(filter)
            .sort(sort)
            .skip(request.offset)
            .limit(clamp_limit(request.limit))
            .await
            .map_err(classify)?
            .try_collect()
            .await
            .map_err(classify)?;

        debug!(count, page = docs.len(), "package search");

        let org_ids: HashSet<String> = docs.iter().map(|d| d.owner_org.clone()).collect();
        let orgs = self.organization_refs(&org_ids).await?;

        let mut results = Vec::with_capacity(docs.len());
        for doc in docs {
            let organization = orgs.get(&doc.owner_org).cloned();
            let resources = self.package_resources(&doc.id).await?;
            results.push(doc.into_package(organization, resources));
        }

        Ok(SearchResults { count, results })
    }

    async fn resource_create(&self, input: CreateResource) -> CatalogResult<Resource> {
        let package = match self.find_package_doc(&input.package_id).await {
            Ok(package) => package,
            Err(CatalogError::NotFound { .. }) => {
                return Err(CatalogError::validation(format!(
                    "package '{}' does not exist",
                    input.package_id
                )));
            }
            Err(err) => return Err(err),
        };

        let doc = ResourceDoc::new(input, package.id.clone(), Utc::now());
        self.resources.insert_one(&doc).await.map_err(classify)?;
        self.touch_package(&package.id).await?;
        info!(id = %doc.id, package_id = %package.id, "created resource");
        Ok(doc.into_resource())
    }

    async fn resource_show(&self, id: &str) -> CatalogResult<Resource> {
        self.resources
            .find_one(doc! { "id": id })
            .await
            .map_err(classify)?
            .map(ResourceDoc::into_resource)
            .ok_or_else(|| CatalogError::not_found("resource", id))
    }

    async fn resource_patch(&self, id: &str, input: PatchResource) -> CatalogResult<Resource> {
        if input.is_empty() {
            return Err(CatalogError::validation("resource patch contains no fields"));
        }
        let existing = self
            .resources
            .find_one(doc! { "id": id })
            .await
            .map_err(classify)?
            .ok_or_else(|| CatalogError::not_found("resource", id))?;

        let mut set = doc! { "last_modified": bson::DateTime::now() };
        if let Some(name) = input.name {
            set.insert("name", name);
        }
        if let Some(url) = input.url {
            set.insert("url", url);
        }
        if let Some(description) = input.description {
            set.insert("description", description);
        }
        if let Some(format) = input.format {
            set.insert("format", format);
        }
        self.resources
            .update_one(doc! { "id": existing.id.as_str() }, doc! { "$set": set })
            .await
            .map_err(classify)?;

        self.resource_show(&existing.id).await
    }

    async fn resource_delete(&self, id: &str) -> CatalogResult<()> {
        let existing = self
            .resources
            .find_one(doc! { "id": id })
            .await
            .map_err(classify)?
            .ok_or_else(|| CatalogError::not_found("resource", id))?;

        self.resources
            .delete_one(doc! { "id": existing.id.as_str() })
            .await
            .map_err(classify)?;
        self.touch_package(&existing.package_id).await?;
        Ok(())
    }

    async fn resource_search(&self, query: &ResourceQuery) -> CatalogResult<ResourceResults> {
        let filter = resource_filter(query);

        let count = self
            .resources
            .count_documents(filter.clone())
            .await
            .map_err(classify)?;
        let docs: Vec<ResourceDoc> = self
            .resources
            .find(filter)
            .sort(doc! { "created": 1 })
            .skip(query.offset)
            .limit(clamp_limit(query.limit))
            .await
            .map_err(classify)?
            .try_collect()
            .await
            .map_err(classify)?;

        // Denormalize parent context in one batched lookup.
        let package_ids: HashSet<String> = docs.iter().map(|d| d.package_id.clone()).collect();
        let id_list: Vec<&str> = package_ids.iter().map(String::as_str).collect();
        let parents: Vec<PackageDoc> = if id_list.is_empty() {
            Vec::new()
        } else {
            self.packages
                .find(doc! { "id": { "$in": id_list } })
                .await
                .map_err(classify)?
                .try_collect()
                .await
                .map_err(classify)?
        };
        let context: HashMap<String, (String, String)> = parents
            .into_iter()
            .map(|p| (p.id, (p.name, p.title)))
            .collect();

        let results = docs
            .into_iter()
            .map(|doc| {
                let resource = doc.into_resource();
                let (dataset_name, dataset_title) = context
                    .get(&resource.package_id)
                    .cloned()
                    .unwrap_or_default();
                ResourceHit {
                    dataset_id: resource.package_id.clone(),
                    dataset_name,
                    dataset_title,
                    resource,
                }
            })
            .collect();

        Ok(ResourceResults { count, results })
    }

    async fn organization_create(
        &self,
        input: CreateOrganization,
    ) -> CatalogResult<Organization> {
        let name = input.name.clone();
        let doc = OrganizationDoc::new(input, Utc::now());
        self.organizations.insert_one(&doc).await.map_err(|e| {
            if is_duplicate_key(&e) {
                CatalogError::validation(format!(
                    "organization with name '{name}' already exists"
                ))
            } else {
                classify(e)
            }
        })?;
        info!(name = %doc.name, id = %doc.id, "created organization");
        Ok(doc.into_organization())
    }

    async fn organization_show(&self, id_or_name: &str) -> CatalogResult<Organization> {
        Ok(self
            .find_organization_doc(id_or_name)
            .await?
            .into_organization())
    }

    async fn organization_list(&self) -> CatalogResult<Vec<Organization>> {
        let docs: Vec<OrganizationDoc> = self
            .organizations
            .find(doc! {})
            .sort(doc! { "name": 1 })
            .await
            .map_err(classify)?
            .try_collect()
            .await
            .map_err(classify)?;
        Ok(docs
            .into_iter()
            .map(OrganizationDoc::into_organization)
            .collect())
    }

    async fn organization_delete(&self, id_or_name: &str) -> CatalogResult<()> {
        let org = self.find_organization_doc(id_or_name).await?;

        // Cascade children-first so a retry after partial completion
        // only re-deletes what is already gone.
        let owned: Vec<Bson> = self
            .packages
            .distinct("id", doc! { "owner_org": org.id.as_str() })
            .await
            .map_err(classify)?;
        if !owned.is_empty() {
            self.resources
                .delete_many(doc! { "package_id": { "$in": owned.clone() } })
                .await
                .map_err(classify)?;
            self.packages
                .delete_many(doc! { "owner_org": org.id.as_str() })
                .await
                .map_err(classify)?;
        }
        self.organizations
            .delete_one(doc! { "id": org.id.as_str() })
            .await
            .map_err(classify)?;
        info!(id = %org.id, packages = owned.len(), "deleted organization");
        Ok(())
    }

    async fn check_health(&self) -> bool {
        self.db.run_command(doc! { "ping": 1 }).await.is_ok()
    }
}
