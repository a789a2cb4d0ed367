//! The catalog repository contract.
//!
//! All operations are independent, stateless request/response calls.
//! Concurrent callers may share one adapter instance. Ordering between
//! concurrent writes to the same package id is delegated to the backend
//! (last-write-wins where the backend offers nothing stronger).

use async_trait::async_trait;

use crate::error::CatalogResult;
use crate::models::organization::{CreateOrganization, Organization};
use crate::models::package::{CreatePackage, Package, PatchPackage, UpdatePackage};
use crate::models::resource::{CreateResource, PatchResource, Resource};
use crate::search::{ResourceQuery, ResourceResults, SearchRequest, SearchResults};

/// The capability set every catalog backend must provide.
///
/// Identical contracts across adapters: a caller holding a
/// `dyn CatalogRepository` cannot tell which backend serves it.
#[async_trait]
pub trait CatalogRepository: Send + Sync + std::fmt::Debug {
    /// Create a package. Fails with `Validation` if the name collides,
    /// `owner_org` does not resolve, or extras use a reserved key.
    async fn package_create(&self, input: CreatePackage) -> CatalogResult<Package>;

    /// Fetch a package by id or name, with the owner organization
    /// expanded. Fails with `NotFound` if absent.
    async fn package_show(&self, id_or_name: &str) -> CatalogResult<Package>;

    /// Replace all mutable fields. Bumps `metadata_modified`.
    async fn package_update(
        &self,
        id_or_name: &str,
        input: UpdatePackage,
    ) -> CatalogResult<Package>;

    /// Merge-update: untouched fields keep their prior value. Bumps
    /// `metadata_modified`. An all-`None` patch fails with
    /// `Validation`.
    async fn package_patch(&self, id_or_name: &str, input: PatchPackage)
    -> CatalogResult<Package>;

    /// Permanently remove a package (purge, not soft-delete), cascading
    /// to its resources. Fails with `NotFound` if absent.
    async fn package_delete(&self, id_or_name: &str) -> CatalogResult<()>;

    /// Search packages. Zero matches yields `count: 0, results: []`,
    /// never an error.
    async fn package_search(&self, request: &SearchRequest) -> CatalogResult<SearchResults>;

    /// Create a resource. Fails with `Validation` if `package_id` does
    /// not resolve.
    async fn resource_create(&self, input: CreateResource) -> CatalogResult<Resource>;

    async fn resource_show(&self, id: &str) -> CatalogResult<Resource>;

    /// Merge-update. An all-`None` patch fails with `Validation`.
    async fn resource_patch(&self, id: &str, input: PatchResource) -> CatalogResult<Resource>;

    /// Delete a single resource; siblings and the parent package are
    /// untouched.
    async fn resource_delete(&self, id: &str) -> CatalogResult<()>;

    /// Search resources; each hit carries denormalized parent context.
    async fn resource_search(&self, query: &ResourceQuery) -> CatalogResult<ResourceResults>;

    async fn organization_create(&self, input: CreateOrganization)
    -> CatalogResult<Organization>;

    async fn organization_show(&self, id_or_name: &str) -> CatalogResult<Organization>;

    async fn organization_list(&self) -> CatalogResult<Vec<Organization>>;

    /// Permanently remove an organization, cascade-purging every
    /// package it still owns (and their resources).
    async fn organization_delete(&self, id_or_name: &str) -> CatalogResult<()>;

    /// Never errors: `false` on any connectivity failure.
    async fn check_health(&self) -> bool;
}
