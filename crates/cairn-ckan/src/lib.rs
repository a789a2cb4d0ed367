//! CKAN catalog adapter.
//!
//! Thin forwarding layer over a remote CKAN action API, with two
//! behavioral corrections on top of the raw backend:
//!
//! - deletion calls the purge actions, not CKAN's default soft delete,
//!   so removed entities never block organization deletion;
//! - search filters naming an organization by its human-readable name
//!   are resolved to the organization id before the query is built.

mod client;
mod codec;
mod error;
mod query;
mod repository;

pub use client::{CkanClient, CkanConfig};
pub use error::CkanError;
pub use repository::CkanRepository;
