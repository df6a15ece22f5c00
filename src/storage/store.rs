//! In-memory deployment store
//!
//! An explicit, id-keyed state container: callers read through typed
//! accessors and mutate through `update`, which applies a fallible closure
//! to a copy and commits only on success. The canned updaters cover the
//! transitions the pipeline controller performs.

use std::collections::HashMap;
use thiserror::Error;

use crate::domain::{
    Deployment, DeploymentError, DeploymentId, DeploymentStatus, Stage, StageId, StageStatus,
};

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("Deployment not found: {0}")]
    NotFound(DeploymentId),

    #[error("Deployment already exists: {0}")]
    AlreadyExists(DeploymentId),

    #[error(transparent)]
    Deployment(#[from] DeploymentError),
}

/// Id-keyed collection of deployments
#[derive(Debug, Default)]
pub struct DeploymentStore {
    deployments: HashMap<DeploymentId, Deployment>,
}

impl DeploymentStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self {
            deployments: HashMap::new(),
        }
    }

    /// Adds a deployment; rejects duplicate IDs
    pub fn add(&mut self, deployment: Deployment) -> Result<(), StoreError> {
        if self.deployments.contains_key(&deployment.id) {
            return Err(StoreError::AlreadyExists(deployment.id.clone()));
        }
        self.deployments.insert(deployment.id.clone(), deployment);
        Ok(())
    }

    /// Looks up a deployment by ID
    pub fn get(&self, id: &DeploymentId) -> Option<&Deployment> {
        self.deployments.get(id)
    }

    /// Returns all deployments, most recently created first
    pub fn list(&self) -> Vec<&Deployment> {
        let mut all: Vec<&Deployment> = self.deployments.values().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }

    /// Returns the number of stored deployments
    pub fn len(&self) -> usize {
        self.deployments.len()
    }

    /// Returns true if the store is empty
    pub fn is_empty(&self) -> bool {
        self.deployments.is_empty()
    }

    /// Applies a fallible updater to the deployment with the given ID
    ///
    /// The updater runs on a copy; a failed update leaves the stored
    /// deployment untouched.
    pub fn update<F>(&mut self, id: &DeploymentId, updater: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Deployment) -> Result<(), StoreError>,
    {
        let current = self
            .deployments
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let mut updated = current.clone();
        updater(&mut updated)?;
        self.deployments.insert(id.clone(), updated);
        Ok(())
    }

    /// Marks a deployment planned, attaching its stage list and version
    pub fn to_planned(
        &mut self,
        id: &DeploymentId,
        reason: impl Into<String>,
        version: impl Into<String>,
        stages: Vec<Stage>,
    ) -> Result<(), StoreError> {
        let reason = reason.into();
        let version = version.into();
        self.update(id, move |d| {
            d.status = DeploymentStatus::Planned;
            d.status_reason = Some(reason);
            d.version = Some(version);
            d.stages = stages;
            Ok(())
        })
    }

    /// Records a single stage's status change
    pub fn stage_status_changed(
        &mut self,
        id: &DeploymentId,
        stage_id: &StageId,
        status: StageStatus,
        reason: Option<String>,
    ) -> Result<(), StoreError> {
        self.update(id, move |d| {
            d.update_stage_status(stage_id, status, reason)?;
            Ok(())
        })
    }

    /// Marks a deployment completed with final stage statuses
    pub fn to_completed(
        &mut self,
        id: &DeploymentId,
        status: DeploymentStatus,
        stage_statuses: &HashMap<StageId, StageStatus>,
    ) -> Result<(), StoreError> {
        self.update(id, move |d| {
            d.complete(status, stage_statuses)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_store() -> (DeploymentStore, DeploymentId) {
        let mut deployment = Deployment::new("frontend");
        let build = Stage::new("build".parse().unwrap(), "BUILD");
        let mut deploy = Stage::new("deploy".parse().unwrap(), "K8S_SYNC");
        deploy.require("build".parse().unwrap());
        deployment.add_stage(build);
        deployment.add_stage(deploy);

        let id = deployment.id.clone();
        let mut store = DeploymentStore::new();
        store.add(deployment).unwrap();
        (store, id)
    }

    #[test]
    fn add_and_get() {
        let (store, id) = seeded_store();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&id).unwrap().application, "frontend");
    }

    #[test]
    fn add_rejects_duplicate_id() {
        let (mut store, id) = seeded_store();
        let duplicate = store.get(&id).unwrap().clone();

        let result = store.add(duplicate);
        assert!(matches!(result, Err(StoreError::AlreadyExists(_))));
    }

    #[test]
    fn update_unknown_id_fails() {
        let mut store = DeploymentStore::new();
        let ghost = DeploymentId::new("ghost", chrono::Utc::now());

        let result = store.update(&ghost, |_| Ok(()));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn failed_update_leaves_deployment_untouched() {
        let (mut store, id) = seeded_store();

        let result = store.stage_status_changed(
            &id,
            &"ghost".parse().unwrap(),
            StageStatus::Running,
            None,
        );
        assert!(result.is_err());

        // Stage statuses unchanged
        let d = store.get(&id).unwrap();
        assert!(d
            .stages
            .iter()
            .all(|s| s.status == StageStatus::NotStartedYet));
    }

    #[test]
    fn to_planned_attaches_stages() {
        let mut store = DeploymentStore::new();
        let deployment = Deployment::new("api");
        let id = deployment.id.clone();
        store.add(deployment).unwrap();

        let stages = vec![Stage::new("build".parse().unwrap(), "BUILD")];
        store
            .to_planned(&id, "planned by controller", "v42", stages)
            .unwrap();

        let d = store.get(&id).unwrap();
        assert_eq!(d.status, DeploymentStatus::Planned);
        assert_eq!(d.version.as_deref(), Some("v42"));
        assert_eq!(d.stages.len(), 1);
    }

    #[test]
    fn stage_status_changed_updates_one_stage() {
        let (mut store, id) = seeded_store();

        store
            .stage_status_changed(
                &id,
                &"build".parse().unwrap(),
                StageStatus::Running,
                Some("started".to_string()),
            )
            .unwrap();

        let d = store.get(&id).unwrap();
        assert_eq!(
            d.stage(&"build".parse().unwrap()).unwrap().status,
            StageStatus::Running
        );
        assert_eq!(
            d.stage(&"deploy".parse().unwrap()).unwrap().status,
            StageStatus::NotStartedYet
        );
    }

    #[test]
    fn to_completed_requires_terminal_status() {
        let (mut store, id) = seeded_store();

        let result = store.to_completed(&id, DeploymentStatus::Running, &HashMap::new());
        assert!(matches!(
            result,
            Err(StoreError::Deployment(
                DeploymentError::NotACompletionStatus(_)
            ))
        ));
    }

    #[test]
    fn to_completed_applies_stage_statuses() {
        let (mut store, id) = seeded_store();

        let mut finals = HashMap::new();
        finals.insert("build".parse().unwrap(), StageStatus::Success);
        finals.insert("deploy".parse().unwrap(), StageStatus::Success);

        store
            .to_completed(&id, DeploymentStatus::Success, &finals)
            .unwrap();

        let d = store.get(&id).unwrap();
        assert_eq!(d.status, DeploymentStatus::Success);
        assert!(d.completed_at.is_some());
        assert!(d.stages.iter().all(|s| s.status == StageStatus::Success));
    }

    #[test]
    fn list_orders_by_creation_desc() {
        let mut store = DeploymentStore::new();

        let mut first = Deployment::new("one");
        first.created_at = chrono::Utc::now() - chrono::Duration::hours(1);
        let second = Deployment::new("two");

        store.add(first).unwrap();
        store.add(second).unwrap();

        let listed = store.list();
        assert_eq!(listed[0].application, "two");
        assert_eq!(listed[1].application, "one");
    }
}
