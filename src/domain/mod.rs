//! Domain models for Pipelane
//!
//! Contains the deployment and stage model without any I/O concerns.

mod deployment;
mod graph;
mod id;
mod stage;

pub use deployment::{Deployment, DeploymentError, DeploymentStatus, ROLLBACK_STAGE_NAME};
pub use graph::{GraphError, StageGraph};
pub use id::{DeploymentId, IdError, StageId};
pub use stage::{Stage, StageMeta, StageStatus};
