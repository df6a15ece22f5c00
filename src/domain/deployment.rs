//! Deployment domain model
//!
//! A deployment holds the stage list in authoring order. Authoring order is
//! not dependency order: the layout engine derives the dependency columns
//! from each stage's `requires` list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use super::id::{DeploymentId, StageId};
use super::stage::{Stage, StageStatus};

/// Stage name conventionally used for the rollback stage
pub const ROLLBACK_STAGE_NAME: &str = "ROLLBACK";

#[derive(Debug, Error, PartialEq)]
pub enum DeploymentError {
    #[error("Stage not found in deployment: {0}")]
    StageNotFound(StageId),

    #[error("Stage {id} cannot transition from {from:?} to {to:?}")]
    InvalidStageTransition {
        id: StageId,
        from: StageStatus,
        to: StageStatus,
    },

    #[error("Deployment status {0:?} is not a completion status")]
    NotACompletionStatus(DeploymentStatus),
}

/// Overall status of a deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    #[default]
    Pending,
    Planned,
    Running,
    RollingBack,
    Success,
    Failure,
    Cancelled,
}

impl DeploymentStatus {
    /// Returns true if this status is a terminal state
    pub fn is_completed(&self) -> bool {
        matches!(
            self,
            DeploymentStatus::Success | DeploymentStatus::Failure | DeploymentStatus::Cancelled
        )
    }

    /// Returns true if the deployment can transition to the given status
    ///
    /// Statuses progress pending -> planned -> running -> rolling back, and
    /// any non-terminal status may jump to a terminal one.
    pub fn can_transition_to(&self, next: DeploymentStatus) -> bool {
        let rank = |s: DeploymentStatus| match s {
            DeploymentStatus::Pending => 0,
            DeploymentStatus::Planned => 1,
            DeploymentStatus::Running => 2,
            DeploymentStatus::RollingBack => 3,
            DeploymentStatus::Success | DeploymentStatus::Failure | DeploymentStatus::Cancelled => {
                4
            }
        };

        match next {
            DeploymentStatus::Pending
            | DeploymentStatus::Planned
            | DeploymentStatus::Running
            | DeploymentStatus::RollingBack => rank(*self) <= rank(next),
            DeploymentStatus::Success
            | DeploymentStatus::Failure
            | DeploymentStatus::Cancelled => !self.is_completed(),
        }
    }

    /// Returns a display label for the status
    pub fn label(&self) -> &'static str {
        match self {
            DeploymentStatus::Pending => "pending",
            DeploymentStatus::Planned => "planned",
            DeploymentStatus::Running => "running",
            DeploymentStatus::RollingBack => "rolling back",
            DeploymentStatus::Success => "success",
            DeploymentStatus::Failure => "failure",
            DeploymentStatus::Cancelled => "cancelled",
        }
    }
}

/// A deployment: an application rollout driven by a pipeline of stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    /// Unique identifier
    pub id: DeploymentId,

    /// Name of the application being deployed
    pub application: String,

    /// Current status
    #[serde(default)]
    pub status: DeploymentStatus,

    /// Human-readable reason for the current status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<String>,

    /// Version being rolled out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Pipeline stages in authoring order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stages: Vec<Stage>,

    /// When the deployment was triggered
    pub created_at: DateTime<Utc>,

    /// When the deployment was last updated
    pub updated_at: DateTime<Utc>,

    /// When the deployment reached a terminal status (if completed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Deployment {
    /// Creates a new pending deployment for the given application
    pub fn new(application: impl Into<String>) -> Self {
        let now = Utc::now();
        let application = application.into();
        Self {
            id: DeploymentId::new(&application, now),
            application,
            status: DeploymentStatus::Pending,
            status_reason: None,
            version: None,
            stages: Vec::new(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Adds a stage, assigning its authoring index
    pub fn add_stage(&mut self, mut stage: Stage) {
        stage.index = self.stages.len() as u32;
        self.stages.push(stage);
        self.updated_at = Utc::now();
    }

    /// Finds a stage by ID
    pub fn stage(&self, id: &StageId) -> Option<&Stage> {
        self.stages.iter().find(|s| &s.id == id)
    }

    /// Returns the map from stage ID to status for all stages
    pub fn stage_status_map(&self) -> HashMap<StageId, StageStatus> {
        self.stages
            .iter()
            .map(|s| (s.id.clone(), s.status))
            .collect()
    }

    /// Finds the rollback stage, searching from the end of the stage list
    pub fn find_rollback_stage(&self) -> Option<&Stage> {
        self.stages
            .iter()
            .rev()
            .find(|s| s.name == ROLLBACK_STAGE_NAME)
    }

    /// Updates the status of a single stage
    ///
    /// Rejects unknown stage IDs and transitions the stage's status machine
    /// does not allow.
    pub fn update_stage_status(
        &mut self,
        id: &StageId,
        status: StageStatus,
        reason: Option<String>,
    ) -> Result<(), DeploymentError> {
        let stage = self
            .stages
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| DeploymentError::StageNotFound(id.clone()))?;

        let from = stage.status;
        if !stage.transition_to(status) {
            return Err(DeploymentError::InvalidStageTransition {
                id: id.clone(),
                from,
                to: status,
            });
        }

        stage.status_reason = reason;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Marks the deployment completed with the given terminal status,
    /// applying final stage statuses where provided
    pub fn complete(
        &mut self,
        status: DeploymentStatus,
        stage_statuses: &HashMap<StageId, StageStatus>,
    ) -> Result<(), DeploymentError> {
        if !status.is_completed() {
            return Err(DeploymentError::NotACompletionStatus(status));
        }

        self.status = status;
        let now = Utc::now();
        self.completed_at = Some(now);
        self.updated_at = now;

        for stage in &mut self.stages {
            if let Some(&final_status) = stage_statuses.get(&stage.id) {
                stage.status = final_status;
                if final_status.is_completed() && stage.completed_at.is_none() {
                    stage.completed_at = Some(now);
                }
            }
        }
        Ok(())
    }
}
