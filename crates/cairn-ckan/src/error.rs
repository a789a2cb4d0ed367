//! Adapter-internal error type and classification into the shared
//! catalog taxonomy.

use cairn_core::error::CatalogError;
use thiserror::Error;

/// Raw outcome of a CKAN action call, before it is given entity
/// context by the repository layer.
#[derive(Debug, Error)]
pub enum CkanError {
    #[error("cannot reach CKAN: {0}")]
    Unreachable(String),

    #[error("CKAN request timed out: {0}")]
    Timeout(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("not authorized: {0}")]
    Authorization(String),

    #[error("unexpected CKAN response: {0}")]
    Protocol(String),
}

impl CkanError {
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Unreachable(err.to_string())
        }
    }

    /// Attach entity context and lift into the shared taxonomy.
    pub(crate) fn catalog(self, entity: &str, id: &str) -> CatalogError {
        match self {
            Self::NotFound(_) => CatalogError::not_found(entity, id),
            Self::Validation(message) => CatalogError::Validation { message },
            Self::Authorization(message) => CatalogError::conflict(message),
            Self::Unreachable(message) | Self::Timeout(message) | Self::Protocol(message) => {
                CatalogError::BackendUnavailable { message }
            }
        }
    }
}

/// Classify a non-success action response. CKAN reports the error kind
/// in the `error.__type` field; the HTTP status is the fallback.
pub(crate) fn classify_failure(status: u16, body: &serde_json::Value) -> CkanError {
    let error = body.get("error");
    let kind = error
        .and_then(|e| e.get("__type"))
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let message = error
        .map(ToString::to_string)
        .unwrap_or_else(|| body.to_string());

    if kind.contains("Not Found") || status == 404 {
        CkanError::NotFound(message)
    } else if kind.contains("Validation") {
        CkanError::Validation(message)
    } else if kind.contains("Authorization") || status == 403 {
        CkanError::Authorization(message)
    } else {
        CkanError::Protocol(format!("HTTP {status}: {message}"))
    }
}
