//! Cairn — catalog service entry point.
//!
//! Loads configuration, builds the repository factory and probes every
//! configured catalog. The exit code reflects local-catalog health so
//! orchestrators can gate startup on it.

use std::process::ExitCode;

use cairn_catalog::{CatalogConfig, CatalogName, CatalogSettings};
use cairn_core::repository::CatalogRepository;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cairn=info")),
        )
        .json()
        .init();

    tracing::info!("starting cairn catalog service");

    let config = match CatalogConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    let settings = CatalogSettings::new(config);

    let mut local_healthy = false;
    for name in [CatalogName::Local, CatalogName::Global, CatalogName::Staging] {
        match settings.repository(&name.to_string()).await {
            Ok(catalog) => {
                let healthy = catalog.check_health().await;
                tracing::info!(catalog = %name, healthy, "catalog probed");
                if name == CatalogName::Local {
                    local_healthy = healthy;
                }
            }
            Err(err) => {
                tracing::warn!(
                    catalog = %name,
                    error = %err,
                    retryable = err.is_transient(),
                    "catalog handle unavailable"
                );
            }
        }
    }

    if local_healthy {
        tracing::info!("cairn catalog service ready");
        ExitCode::SUCCESS
    } else {
        tracing::error!("local catalog failed its health probe");
        ExitCode::FAILURE
    }
}
