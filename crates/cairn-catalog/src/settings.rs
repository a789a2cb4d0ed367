//! Deployment configuration for the catalog endpoints.
//!
//! Three catalogs are addressable: `local` (CKAN or MongoDB, per
//! [`Backend`]), `global` (a read-only upstream CKAN), and `staging`
//! (a pre-publication CKAN, often behind a self-signed certificate).

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use cairn_ckan::CkanConfig;
use cairn_core::error::{CatalogError, CatalogResult};
use cairn_mongo::MongoConfig;

/// Storage backend serving the local catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Ckan,
    Mongodb,
}

impl FromStr for Backend {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ckan" => Ok(Self::Ckan),
            "mongodb" | "mongo" => Ok(Self::Mongodb),
            other => Err(CatalogError::configuration(format!(
                "unknown backend '{other}', expected 'ckan' or 'mongodb'"
            ))),
        }
    }
}

impl Default for Backend {
    fn default() -> Self {
        Self::Ckan
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ckan => f.write_str("ckan"),
            Self::Mongodb => f.write_str("mongodb"),
        }
    }
}

/// Full environment surface:
///
/// | Variable                          | Default                     |
/// |-----------------------------------|-----------------------------|
/// | `CATALOG_LOCAL_BACKEND`           | `ckan`                      |
/// | `CATALOG_CKAN_URL`                | `http://localhost:5000`     |
/// | `CATALOG_CKAN_API_KEY`            | unset                       |
/// | `CATALOG_CKAN_TIMEOUT_SECS`       | `30`                        |
/// | `CATALOG_GLOBAL_CKAN_URL`         | `http://localhost:5000`     |
/// | `CATALOG_STAGING_CKAN_URL`        | `http://localhost:5000`     |
/// | `CATALOG_STAGING_CKAN_API_KEY`    | unset                       |
/// | `CATALOG_STAGING_CKAN_VERIFY_SSL` | `true`                      |
/// | `CATALOG_MONGO_URL`               | `mongodb://localhost:27017` |
/// | `CATALOG_MONGO_DATABASE`          | `catalog`                   |
///
/// The global catalog is always anonymous; it never takes an API key.
#[derive(Debug, Clone, Default)]
pub struct CatalogConfig {
    pub local_backend: Backend,
    pub local_ckan: CkanConfig,
    pub global_ckan: CkanConfig,
    pub staging_ckan: CkanConfig,
    pub mongo: MongoConfig,
}

fn env_string(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_bool(name: &str) -> CatalogResult<Option<bool>> {
    match env_string(name) {
        None => Ok(None),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(Some(true)),
            "0" | "false" | "no" => Ok(Some(false)),
            other => Err(CatalogError::configuration(format!(
                "{name}: expected a boolean, got '{other}'"
            ))),
        },
    }
}

fn env_secs(name: &str) -> CatalogResult<Option<Duration>> {
    match env_string(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|_| {
                CatalogError::configuration(format!("{name}: expected seconds, got '{raw}'"))
            }),
    }
}

impl CatalogConfig {
    /// Load from the environment, falling back to defaults for any
    /// unset variable. Malformed values fail loudly rather than being
    /// silently replaced.
    pub fn from_env() -> CatalogResult<Self> {
        let mut config = Self::default();

        if let Some(backend) = env_string("CATALOG_LOCAL_BACKEND") {
            config.local_backend = backend.parse()?;
        }

        if let Some(url) = env_string("CATALOG_CKAN_URL") {
            config.local_ckan.url = url;
        }
        config.local_ckan.api_key = env_string("CATALOG_CKAN_API_KEY");
        if let Some(timeout) = env_secs("CATALOG_CKAN_TIMEOUT_SECS")? {
            config.local_ckan.timeout = timeout;
            config.global_ckan.timeout = timeout;
            config.staging_ckan.timeout = timeout;
        }

        if let Some(url) = env_string("CATALOG_GLOBAL_CKAN_URL") {
            config.global_ckan.url = url;
        }

        if let Some(url) = env_string("CATALOG_STAGING_CKAN_URL") {
            config.staging_ckan.url = url;
        }
        config.staging_ckan.api_key = env_string("CATALOG_STAGING_CKAN_API_KEY");
        if let Some(verify) = env_bool("CATALOG_STAGING_CKAN_VERIFY_SSL")? {
            config.staging_ckan.verify_ssl = verify;
        }

        if let Some(url) = env_string("CATALOG_MONGO_URL") {
            config.mongo.connection_string = url;
        }
        if let Some(database) = env_string("CATALOG_MONGO_DATABASE") {
            config.mongo.database = database;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_parses_case_insensitively() {
        assert_eq!("ckan".parse::<Backend>().unwrap(), Backend::Ckan);
        assert_eq!("CKAN".parse::<Backend>().unwrap(), Backend::Ckan);
        assert_eq!("MongoDB".parse::<Backend>().unwrap(), Backend::Mongodb);
        assert_eq!("mongo".parse::<Backend>().unwrap(), Backend::Mongodb);
    }

    #[test]
    fn unknown_backend_is_a_configuration_error() {
        let err = "postgres".parse::<Backend>().unwrap_err();
        assert!(matches!(err, CatalogError::Configuration { .. }));
        assert!(err.to_string().contains("postgres"));
    }

    #[test]
    fn defaults_point_at_localhost() {
        let config = CatalogConfig::default();
        assert_eq!(config.local_backend, Backend::Ckan);
        assert_eq!(config.local_ckan.url, "http://localhost:5000");
        assert!(config.local_ckan.api_key.is_none());
        assert!(config.staging_ckan.verify_ssl);
        assert_eq!(config.mongo.database, "catalog");
    }
}
