//! Hands out interface-typed repository handles for the three
//! addressable catalogs.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use cairn_ckan::CkanRepository;
use cairn_core::error::{CatalogError, CatalogResult};
use cairn_core::repository::CatalogRepository;
use cairn_mongo::MongoRepository;
use tracing::debug;

use crate::settings::{Backend, CatalogConfig};

/// The three catalogs a caller can address by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogName {
    Local,
    Global,
    Staging,
}

impl FromStr for CatalogName {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "global" => Ok(Self::Global),
            "staging" => Ok(Self::Staging),
            other => Err(CatalogError::configuration(format!(
                "unknown catalog '{other}', expected 'local', 'global' or 'staging'"
            ))),
        }
    }
}

impl fmt::Display for CatalogName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Global => f.write_str("global"),
            Self::Staging => f.write_str("staging"),
        }
    }
}

/// Repository factory. Construction is cheap and repeatable; callers
/// hold the returned `Arc<dyn CatalogRepository>` and never see which
/// backend serves it.
#[derive(Debug, Clone)]
pub struct CatalogSettings {
    config: CatalogConfig,
}

impl CatalogSettings {
    pub fn new(config: CatalogConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// The local catalog, served by whichever backend the
    /// configuration selects.
    pub async fn local(&self) -> CatalogResult<Arc<dyn CatalogRepository>> {
        debug!(backend = %self.config.local_backend, "building local catalog handle");
        match self.config.local_backend {
            Backend::Ckan => {
                let repo = CkanRepository::new(&self.config.local_ckan)?;
                Ok(Arc::new(repo))
            }
            Backend::Mongodb => {
                let repo = MongoRepository::connect(&self.config.mongo).await?;
                Ok(Arc::new(repo))
            }
        }
    }

    /// The global upstream catalog. Always CKAN, always anonymous.
    pub async fn global(&self) -> CatalogResult<Arc<dyn CatalogRepository>> {
        let repo = CkanRepository::new(&self.config.global_ckan)?;
        Ok(Arc::new(repo))
    }

    /// The pre-publication staging catalog. Always CKAN.
    pub async fn staging(&self) -> CatalogResult<Arc<dyn CatalogRepository>> {
        let repo = CkanRepository::new(&self.config.staging_ckan)?;
        Ok(Arc::new(repo))
    }

    /// Resolve a catalog by name.
    pub async fn repository(&self, name: &str) -> CatalogResult<Arc<dyn CatalogRepository>> {
        match name.parse::<CatalogName>()? {
            CatalogName::Local => self.local().await,
            CatalogName::Global => self.global().await,
            CatalogName::Staging => self.staging().await,
        }
    }
}
