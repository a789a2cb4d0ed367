//! MongoDB catalog adapter.
//!
//! Three collections (`packages`, `resources`, `organizations`) linked
//! by id reference, not embedding. Every read response synthesizes the
//! embedded organization object and the package's resource list, so
//! callers see the same shapes the CKAN backend returns natively; the
//! stored documents are never mutated by that view step.

mod doc;
mod error;
mod query;
mod repository;

pub use repository::{MongoConfig, MongoRepository};
