//! Purge and cascade sequencing against a scripted action endpoint.
//!
//! The responder speaks just enough HTTP to serve canned action
//! envelopes and records every action name it sees, so these tests can
//! assert the order of destructive calls without a live CKAN.

use std::sync::Arc;

use cairn_ckan::{CkanConfig, CkanRepository};
use cairn_core::error::CatalogError;
use cairn_core::models::package::PatchPackage;
use cairn_core::models::resource::PatchResource;
use cairn_core::repository::CatalogRepository;
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

type ActionLog = Arc<Mutex<Vec<String>>>;

fn package_json() -> Value {
    json!({
        "id": "pkg-1",
        "name": "climate_2024",
        "title": "Climate Observations 2024",
        "notes": "",
        "owner_org": "org-1",
        "organization": {
            "id": "org-1",
            "name": "research_team",
            "title": "Research Team",
            "description": "",
            "created": "2023-11-02T08:30:00.000000",
            "state": "active"
        },
        "extras": [],
        "tags": [],
        "resources": [],
        "state": "active",
        "metadata_created": "2024-01-05T09:59:00.000000",
        "metadata_modified": "2024-02-01T12:00:00.000000"
    })
}

fn envelope(action: &str, prior_searches: usize) -> Value {
    let result = match action {
        "package_show" => package_json(),
        "organization_show" => json!({
            "id": "org-1",
            "name": "research_team",
            "title": "Research Team",
            "description": "",
            "created": "2023-11-02T08:30:00.000000",
            "state": "active"
        }),
        // The organization owns one package until it has been purged.
        "package_search" if prior_searches == 0 => {
            json!({"count": 1, "results": [package_json()]})
        }
        "package_search" => json!({"count": 0, "results": []}),
        _ => Value::Null,
    };
    json!({"success": true, "result": result})
}

async fn handle(mut socket: TcpStream, log: ActionLog) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let Ok(n) = socket.read(&mut chunk).await else { return };
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let content_length: usize = head
        .lines()
        .find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse().ok())
                .flatten()
        })
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let Ok(n) = socket.read(&mut chunk).await else { return };
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let action = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|path| path.rsplit('/').next())
        .unwrap_or_default()
        .to_string();

    let prior_searches;
    {
        let mut log = log.lock().await;
        prior_searches = log.iter().filter(|a| *a == "package_search").count();
        log.push(action.clone());
    }

    let body = envelope(&action, prior_searches).to_string();
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = socket.write_all(response.as_bytes()).await;
}

async fn spawn_responder() -> (CkanRepository, ActionLog) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let log: ActionLog = Arc::default();

    let accept_log = log.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(handle(socket, accept_log.clone()));
        }
    });

    let repo = CkanRepository::new(&CkanConfig {
        url: format!("http://{addr}"),
        ..Default::default()
    })
    .unwrap();
    (repo, log)
}

fn position(log: &[String], action: &str) -> usize {
    log.iter()
        .position(|a| a == action)
        .unwrap_or_else(|| panic!("{action} never called; log: {log:?}"))
}

#[tokio::test]
async fn package_delete_purges_after_soft_delete() {
    let (repo, log) = spawn_responder().await;
    repo.package_delete("climate_2024").await.unwrap();

    let log = log.lock().await.clone();
    assert_eq!(log, ["package_show", "package_delete", "dataset_purge"]);
}

#[tokio::test]
async fn organization_delete_purges_owned_packages_first() {
    let (repo, log) = spawn_responder().await;
    repo.organization_delete("research_team").await.unwrap();

    let log = log.lock().await.clone();
    // Every owned package is purged before the organization is touched.
    assert!(position(&log, "package_delete") < position(&log, "dataset_purge"));
    assert!(position(&log, "dataset_purge") < position(&log, "organization_delete"));
    assert!(position(&log, "organization_delete") < position(&log, "organization_purge"));
    // The cascade re-queries until no owned packages remain.
    assert_eq!(log.iter().filter(|a| *a == "package_search").count(), 2);
}

#[tokio::test]
async fn empty_patches_are_rejected_before_any_call() {
    let (repo, log) = spawn_responder().await;

    let err = repo
        .package_patch("pkg-1", PatchPackage::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Validation { .. }));

    let err = repo
        .resource_patch("res-1", PatchResource::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Validation { .. }));

    assert!(log.lock().await.is_empty());
}
