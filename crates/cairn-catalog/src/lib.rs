//! Catalog configuration and backend selection.
//!
//! Deployments address catalogs by name (`local`, `global`, `staging`)
//! and receive `Arc<dyn CatalogRepository>` handles; which adapter
//! serves the local catalog is decided by configuration alone.

mod factory;
mod settings;

pub use factory::{CatalogName, CatalogSettings};
pub use settings::{Backend, CatalogConfig};
