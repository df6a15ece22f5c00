//! Pipeline stage domain model
//!
//! Stages are the executable units of a deployment pipeline. Each stage
//! names the stages it requires through `requires`, which is what the
//! layout engine turns into dependency columns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::id::StageId;

/// Execution status of a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    #[default]
    NotStartedYet,
    Running,
    Success,
    Failure,
    Cancelled,
}

impl StageStatus {
    /// Returns true if this status is a terminal state
    pub fn is_completed(&self) -> bool {
        matches!(
            self,
            StageStatus::Success | StageStatus::Failure | StageStatus::Cancelled
        )
    }

    /// Returns true if the stage can transition to the given status
    ///
    /// Transitions are monotonic: a stage never moves backwards, and a
    /// terminal status can only be reached from not-started or running.
    pub fn can_transition_to(&self, next: StageStatus) -> bool {
        match next {
            StageStatus::NotStartedYet => *self == StageStatus::NotStartedYet,
            StageStatus::Running => {
                matches!(self, StageStatus::NotStartedYet | StageStatus::Running)
            }
            StageStatus::Success | StageStatus::Failure | StageStatus::Cancelled => {
                matches!(self, StageStatus::NotStartedYet | StageStatus::Running)
            }
        }
    }

    /// Returns a short glyph for terminal display
    pub fn glyph(&self) -> &'static str {
        match self {
            StageStatus::NotStartedYet => " ",
            StageStatus::Running => "~",
            StageStatus::Success => "+",
            StageStatus::Failure => "x",
            StageStatus::Cancelled => "-",
        }
    }

    /// Returns a display label for the status
    pub fn label(&self) -> &'static str {
        match self {
            StageStatus::NotStartedYet => "not started",
            StageStatus::Running => "running",
            StageStatus::Success => "success",
            StageStatus::Failure => "failure",
            StageStatus::Cancelled => "cancelled",
        }
    }
}

/// Extensible per-stage metadata - string key-value pairs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageMeta(HashMap<String, String>);

impl StageMeta {
    /// Creates empty metadata
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Gets a value by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Sets a value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Merges entries from another map, overwriting on key collision
    pub fn merge(&mut self, other: HashMap<String, String>) {
        self.0.extend(other);
    }

    /// Returns true if empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over all key-value pairs
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}

/// A single stage of a deployment pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    /// Unique identifier within the deployment
    pub id: StageId,

    /// Stage name (e.g. `K8S_CANARY_ROLLOUT`, `WAIT_APPROVAL`, `ROLLBACK`)
    pub name: String,

    /// Optional human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,

    /// Authoring position within the pipeline definition
    #[serde(default)]
    pub index: u32,

    /// True for stages injected by the planner rather than authored
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub predefined: bool,

    /// IDs of stages that must complete before this one starts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<StageId>,

    /// Whether the stage is shown in rendered layouts
    #[serde(default = "default_visible")]
    pub visible: bool,

    /// Current execution status
    #[serde(default)]
    pub status: StageStatus,

    /// Human-readable reason for the current status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<String>,

    /// Extensible metadata
    #[serde(default, skip_serializing_if = "StageMeta::is_empty")]
    pub metadata: StageMeta,

    /// Number of retries performed on this stage
    #[serde(default, skip_serializing_if = "is_zero")]
    pub retried_count: u32,

    /// When the stage reached a terminal status (if completed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// When the stage was created
    pub created_at: DateTime<Utc>,

    /// When the stage was last updated
    pub updated_at: DateTime<Utc>,
}

fn default_visible() -> bool {
    true
}

fn is_zero(val: &u32) -> bool {
    *val == 0
}

impl Stage {
    /// Creates a new stage with the given ID and name, no requirements
    pub fn new(id: StageId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            desc: None,
            index: 0,
            predefined: false,
            requires: Vec::new(),
            visible: true,
            status: StageStatus::NotStartedYet,
            status_reason: None,
            metadata: StageMeta::new(),
            retried_count: 0,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Adds a requirement on another stage
    pub fn require(&mut self, id: StageId) {
        if !self.requires.contains(&id) {
            self.requires.push(id);
            self.updated_at = Utc::now();
        }
    }

    /// Returns true if this stage has no requirements (a pipeline root)
    pub fn is_root(&self) -> bool {
        self.requires.is_empty()
    }

    /// Returns true if this stage requires the given stage
    pub fn requires_stage(&self, id: &StageId) -> bool {
        self.requires.contains(id)
    }

    /// Applies a status transition, enforcing the monotonic transition rules
    ///
    /// Returns false and leaves the stage untouched when the transition is
    /// not allowed from the current status.
    pub fn transition_to(&mut self, next: StageStatus) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }

        self.status = next;
        let now = Utc::now();
        self.updated_at = now;
        if next.is_completed() {
            self.completed_at = Some(now);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_stage(id: &str) -> Stage {
        Stage::new(id.parse().unwrap(), format!("STAGE_{}", id.to_uppercase()))
    }

    #[test]
    fn new_stage_is_root_and_not_started() {
        let stage = make_stage("analysis");
        assert!(stage.is_root());
        assert_eq!(stage.status, StageStatus::NotStartedYet);
        assert!(stage.visible);
        assert!(stage.completed_at.is_none());
    }

    #[test]
    fn require_is_idempotent() {
        let mut stage = make_stage("deploy");
        let dep: StageId = "analysis".parse().unwrap();

        stage.require(dep.clone());
        stage.require(dep.clone());

        assert_eq!(stage.requires.len(), 1);
        assert!(stage.requires_stage(&dep));
        assert!(!stage.is_root());
    }

    #[test]
    fn status_completed_states() {
        assert!(!StageStatus::NotStartedYet.is_completed());
        assert!(!StageStatus::Running.is_completed());
        assert!(StageStatus::Success.is_completed());
        assert!(StageStatus::Failure.is_completed());
        assert!(StageStatus::Cancelled.is_completed());
    }

    #[test]
    fn status_transitions_are_monotonic() {
        // Forward transitions allowed
        assert!(StageStatus::NotStartedYet.can_transition_to(StageStatus::Running));
        assert!(StageStatus::Running.can_transition_to(StageStatus::Success));
        assert!(StageStatus::Running.can_transition_to(StageStatus::Failure));
        assert!(StageStatus::NotStartedYet.can_transition_to(StageStatus::Cancelled));

        // Backward transitions rejected
        assert!(!StageStatus::Success.can_transition_to(StageStatus::Running));
        assert!(!StageStatus::Failure.can_transition_to(StageStatus::NotStartedYet));
        assert!(!StageStatus::Cancelled.can_transition_to(StageStatus::Success));
    }

    #[test]
    fn transition_to_sets_completed_at() {
        let mut stage = make_stage("deploy");

        assert!(stage.transition_to(StageStatus::Running));
        assert!(stage.completed_at.is_none());

        assert!(stage.transition_to(StageStatus::Success));
        assert!(stage.completed_at.is_some());

        // Terminal, no further transitions
        assert!(!stage.transition_to(StageStatus::Running));
        assert_eq!(stage.status, StageStatus::Success);
    }

    #[test]
    fn metadata_operations() {
        let mut stage = make_stage("deploy");

        stage.metadata.set("image-tag", "v1.2.3");
        assert_eq!(stage.metadata.get("image-tag"), Some("v1.2.3"));

        let mut extra = HashMap::new();
        extra.insert("image-tag".to_string(), "v1.2.4".to_string());
        extra.insert("replicas".to_string(), "3".to_string());
        stage.metadata.merge(extra);

        assert_eq!(stage.metadata.get("image-tag"), Some("v1.2.4"));
        assert_eq!(stage.metadata.get("replicas"), Some("3"));
    }

    #[test]
    fn serde_roundtrip() {
        let mut stage = make_stage("deploy");
        stage.require("analysis".parse().unwrap());
        stage.desc = Some("Roll out the canary".to_string());
        stage.metadata.set("key", "value");

        let json = serde_json::to_string(&stage).unwrap();
        let parsed: Stage = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, stage);
    }

    #[test]
    fn serde_defaults_for_minimal_input() {
        let json = r#"{
            "id": "stage-1",
            "name": "BUILD",
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        }"#;

        let stage: Stage = serde_json::from_str(json).unwrap();
        assert!(stage.requires.is_empty());
        assert!(stage.visible);
        assert_eq!(stage.status, StageStatus::NotStartedYet);
        assert_eq!(stage.retried_count, 0);
    }
}
