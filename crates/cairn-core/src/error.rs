//! Error types shared across all catalog backends.
//!
//! Adapters never surface raw backend errors: they re-classify them into
//! this taxonomy, preserving the original error text for diagnostics.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// Malformed or conflicting input: duplicate name, unresolvable
    /// owner organization, reserved extras key.
    #[error("validation failed: {message}")]
    Validation { message: String },

    /// The given id or name does not resolve to an entity.
    #[error("{entity} '{id}' not found")]
    NotFound { entity: String, id: String },

    /// The operation is blocked by the current state of the catalog.
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// The underlying store cannot be reached, or the call timed out.
    #[error("backend unavailable: {message}")]
    BackendUnavailable { message: String },

    /// Unknown backend or catalog name, or a missing required setting.
    #[error("configuration error: {message}")]
    Configuration { message: String },
}

impl CatalogError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn backend_unavailable(message: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// True for errors worth retrying at the caller's discretion.
    /// The core itself never retries.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::BackendUnavailable { .. })
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_backend_unavailable_is_transient() {
        assert!(CatalogError::backend_unavailable("connection refused").is_transient());
        assert!(!CatalogError::validation("bad extras").is_transient());
        assert!(!CatalogError::not_found("package", "p").is_transient());
        assert!(!CatalogError::configuration("unknown backend").is_transient());
    }
}
