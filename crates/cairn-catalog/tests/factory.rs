//! Factory behavior that holds without any backend running: handle
//! construction for CKAN catalogs is offline (no connection is made
//! until the first call), and name resolution is pure.

use cairn_catalog::{Backend, CatalogConfig, CatalogName, CatalogSettings};
use cairn_core::error::CatalogError;

fn settings() -> CatalogSettings {
    CatalogSettings::new(CatalogConfig::default())
}

#[tokio::test]
async fn local_ckan_handle_builds_offline() {
    let handle = settings().local().await;
    assert!(handle.is_ok());
}

#[tokio::test]
async fn global_and_staging_are_always_ckan() {
    let settings = CatalogSettings::new(CatalogConfig {
        local_backend: Backend::Mongodb,
        ..Default::default()
    });
    // Independent of the local backend flag.
    assert!(settings.global().await.is_ok());
    assert!(settings.staging().await.is_ok());
}

#[tokio::test]
async fn known_names_resolve() {
    let settings = settings();
    for name in ["local", "global", "staging", "LOCAL", " staging "] {
        assert!(settings.repository(name).await.is_ok(), "name: {name:?}");
    }
}

#[tokio::test]
async fn unknown_name_is_a_configuration_error() {
    let err = settings().repository("production").await.unwrap_err();
    assert!(matches!(err, CatalogError::Configuration { .. }));
    assert!(err.to_string().contains("production"));
}

#[test]
fn catalog_names_round_trip_through_display() {
    for name in [CatalogName::Local, CatalogName::Global, CatalogName::Staging] {
        let parsed: CatalogName = name.to_string().parse().unwrap();
        assert_eq!(parsed, name);
    }
}
