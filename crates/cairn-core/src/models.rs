//! Canonical domain models.
//!
//! These are value objects with no behavior beyond validation helpers:
//! the backend-neutral shape every adapter must produce and accept.

pub mod organization;
pub mod package;
pub mod resource;
