//! Pipelane - pipeline stage layout for continuous-delivery deployments
//!
//! Pipelane models deployments as flat lists of stages with requirement
//! references and computes the layered column layout used to draw a
//! pipeline left to right. Column 0 holds the stages with no requirements;
//! every other stage lands strictly after all of its requirements.

pub mod cli;
pub mod domain;
pub mod layout;
pub mod storage;

pub use domain::{Deployment, DeploymentId, DeploymentStatus, Stage, StageId, StageStatus};
pub use layout::{compute_layout, Layout, LayoutError};
