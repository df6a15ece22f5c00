//! Dependency graph for pipeline stages
//!
//! Manages stage requirement edges with cycle detection and topological
//! ordering. Uses petgraph for graph operations. Structural validation here
//! (unknown references, cycles) is what lets the layout engine assume a
//! well-formed graph in its strict mode.

use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use thiserror::Error;

use super::id::StageId;
use super::stage::Stage;

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Adding requirement would create a cycle: {0} -> {1}")]
    CycleDetected(StageId, StageId),

    #[error("Stage not found: {0}")]
    StageNotFound(StageId),

    #[error("Stage cannot require itself: {0}")]
    SelfRequirement(StageId),

    #[error("Duplicate stage ID: {0}")]
    DuplicateStage(StageId),
}

/// A requirement graph over the stages of one deployment
///
/// Edges point from the required stage to the stage requiring it, so edge
/// direction matches execution order.
#[derive(Debug, Default)]
pub struct StageGraph {
    graph: DiGraph<StageId, ()>,

    /// Map from StageId to node index
    node_map: HashMap<StageId, NodeIndex>,
}

impl StageGraph {
    /// Creates an empty stage graph
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Builds a graph from a deployment's stage list
    ///
    /// Two passes: all stages become nodes first, then requirement edges are
    /// added, so forward references within the list are fine. Unknown
    /// references, duplicate IDs and cycles are rejected.
    pub fn from_stages<'a>(stages: impl IntoIterator<Item = &'a Stage>) -> Result<Self, GraphError> {
        let mut graph = Self::new();

        let stages: Vec<_> = stages.into_iter().collect();
        for stage in &stages {
            if !graph.add_stage(stage.id.clone()) {
                return Err(GraphError::DuplicateStage(stage.id.clone()));
            }
        }

        for stage in &stages {
            for required in &stage.requires {
                graph.add_requirement(&stage.id, required)?;
            }
        }

        Ok(graph)
    }

    /// Adds a stage node; returns false if the ID is already present
    pub fn add_stage(&mut self, id: StageId) -> bool {
        if self.node_map.contains_key(&id) {
            return false;
        }
        let idx = self.graph.add_node(id.clone());
        self.node_map.insert(id, idx);
        true
    }

    /// Adds a requirement edge: `stage` requires `required`
    ///
    /// The edge direction is `required -> stage`, meaning "required must
    /// complete before stage".
    pub fn add_requirement(&mut self, stage: &StageId, required: &StageId) -> Result<(), GraphError> {
        if stage == required {
            return Err(GraphError::SelfRequirement(stage.clone()));
        }

        let stage_idx = self
            .node_map
            .get(stage)
            .ok_or_else(|| GraphError::StageNotFound(stage.clone()))?;

        let required_idx = self
            .node_map
            .get(required)
            .ok_or_else(|| GraphError::StageNotFound(required.clone()))?;

        self.graph.add_edge(*required_idx, *stage_idx, ());

        // Reject the edge if it closed a cycle
        if is_cyclic_directed(&self.graph) {
            if let Some(edge) = self.graph.find_edge(*required_idx, *stage_idx) {
                self.graph.remove_edge(edge);
            }
            return Err(GraphError::CycleDetected(stage.clone(), required.clone()));
        }

        Ok(())
    }

    /// Returns the direct requirements of a stage
    pub fn requirements(&self, id: &StageId) -> Vec<StageId> {
        let idx = match self.node_map.get(id) {
            Some(idx) => *idx,
            None => return vec![],
        };

        self.graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .filter_map(|n| self.graph.node_weight(n).cloned())
            .collect()
    }

    /// Returns the stages that directly require the given stage
    pub fn dependents(&self, id: &StageId) -> Vec<StageId> {
        let idx = match self.node_map.get(id) {
            Some(idx) => *idx,
            None => return vec![],
        };

        self.graph
            .neighbors_directed(idx, petgraph::Direction::Outgoing)
            .filter_map(|n| self.graph.node_weight(n).cloned())
            .collect()
    }

    /// Returns all stages in topological order (requirements before dependents)
    pub fn topological_order(&self) -> Result<Vec<StageId>, GraphError> {
        match toposort(&self.graph, None) {
            Ok(order) => Ok(order
                .into_iter()
                .filter_map(|idx| self.graph.node_weight(idx).cloned())
                .collect()),
            Err(cycle) => {
                // add_requirement maintains acyclicity, so toposort can only
                // fail on a graph built through some future bypass
                match self.graph.node_weight(cycle.node_id()).cloned() {
                    Some(id) => Err(GraphError::CycleDetected(id.clone(), id)),
                    None => Ok(Vec::new()),
                }
            }
        }
    }

    /// Returns true if the graph contains the stage
    pub fn contains(&self, id: &StageId) -> bool {
        self.node_map.contains_key(id)
    }

    /// Returns the number of stages in the graph
    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    /// Returns true if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }

    /// Returns all stage IDs in the graph
    pub fn stage_ids(&self) -> impl Iterator<Item = &StageId> {
        self.node_map.keys()
    }
}
