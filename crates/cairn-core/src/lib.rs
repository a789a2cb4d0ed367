//! CAIRN Core — canonical catalog entities, the repository contract,
//! and the shared error taxonomy.
//!
//! Every catalog backend (CKAN, MongoDB) implements the
//! [`repository::CatalogRepository`] trait against the canonical types
//! defined here, so callers are backend-agnostic by construction.

pub mod error;
pub mod models;
pub mod repository;
pub mod search;
