//! Driver error classification.

use cairn_core::error::CatalogError;
use mongodb::error::{ErrorKind, WriteFailure};

/// Unique-index violation (duplicate package or organization name).
pub(crate) fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) => write.code == 11000,
        _ => false,
    }
}

/// Any driver error that is not a duplicate key means the store could
/// not serve the call (unreachable, timed out, or refused); the
/// original text is kept for diagnostics.
pub(crate) fn classify(err: mongodb::error::Error) -> CatalogError {
    CatalogError::backend_unavailable(err.to_string())
}
