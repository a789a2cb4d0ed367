//! Cascade deletes against a live MongoDB.
//!
//! These need a reachable server (`CAIRN_TEST_MONGO_URL`, default
//! `mongodb://localhost:27017`) and are ignored by default; run them
//! with `cargo test -- --ignored`. Entity names are randomized so runs
//! never collide on the unique name indexes.

use cairn_core::error::CatalogError;
use cairn_core::models::organization::CreateOrganization;
use cairn_core::models::package::CreatePackage;
use cairn_core::models::resource::CreateResource;
use cairn_core::repository::CatalogRepository;
use cairn_mongo::{MongoConfig, MongoRepository};
use uuid::Uuid;

async fn repo() -> MongoRepository {
    let config = MongoConfig {
        connection_string: std::env::var("CAIRN_TEST_MONGO_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017".into()),
        database: "cairn_cascade_test".into(),
        ..Default::default()
    };
    MongoRepository::connect(&config).await.unwrap()
}

fn slug(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}

async fn create_org(repo: &MongoRepository) -> String {
    repo.organization_create(CreateOrganization {
        name: slug("org"),
        title: "Cascade Org".into(),
        description: String::new(),
    })
    .await
    .unwrap()
    .id
}

#[tokio::test]
#[ignore = "needs a running MongoDB"]
async fn package_delete_removes_resources_but_not_the_organization() {
    let repo = repo().await;
    let org_id = create_org(&repo).await;
    let package = repo
        .package_create(CreatePackage {
            name: slug("pkg"),
            owner_org: org_id.clone(),
            ..Default::default()
        })
        .await
        .unwrap();
    let resource = repo
        .resource_create(CreateResource {
            package_id: package.id.clone(),
            name: "observations.csv".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    repo.package_delete(&package.id).await.unwrap();

    assert!(matches!(
        repo.package_show(&package.id).await,
        Err(CatalogError::NotFound { .. })
    ));
    assert!(matches!(
        repo.resource_show(&resource.id).await,
        Err(CatalogError::NotFound { .. })
    ));
    // The owning organization is untouched by a package delete.
    assert!(repo.organization_show(&org_id).await.is_ok());

    repo.organization_delete(&org_id).await.unwrap();
}

#[tokio::test]
#[ignore = "needs a running MongoDB"]
async fn organization_delete_cascades_through_packages_and_resources() {
    let repo = repo().await;
    let org_id = create_org(&repo).await;
    let mut package_ids = Vec::new();
    for _ in 0..2 {
        let package = repo
            .package_create(CreatePackage {
                name: slug("pkg"),
                owner_org: org_id.clone(),
                ..Default::default()
            })
            .await
            .unwrap();
        package_ids.push(package.id);
    }
    let resource = repo
        .resource_create(CreateResource {
            package_id: package_ids[0].clone(),
            name: "observations.csv".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    repo.organization_delete(&org_id).await.unwrap();

    assert!(matches!(
        repo.organization_show(&org_id).await,
        Err(CatalogError::NotFound { .. })
    ));
    for id in &package_ids {
        assert!(matches!(
            repo.package_show(id).await,
            Err(CatalogError::NotFound { .. })
        ));
    }
    assert!(matches!(
        repo.resource_show(&resource.id).await,
        Err(CatalogError::NotFound { .. })
    ));
}
