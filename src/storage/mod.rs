//! Storage layer
//!
//! Deployment files on disk plus an in-memory id-keyed store.

mod file;
mod store;

pub use file::{DeploymentFile, FileFormat};
pub use store::{DeploymentStore, StoreError};
