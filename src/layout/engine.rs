//! Stage layout engine
//!
//! Converts a deployment's flat stage list into an ordered sequence of
//! columns for left-to-right rendering: column 0 holds the stages with no
//! requirements, and every other stage lands one column after the deepest
//! of its requirements. The result is fully derived from the stage list and
//! recomputed from scratch on every call.

use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::domain::{Stage, StageId};

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("Duplicate stage ID: {0}")]
    DuplicateStage(StageId),

    #[error("Stage {stage} requires unknown stage {missing}")]
    DanglingReference { stage: StageId, missing: StageId },

    #[error("Dependency cycle involving stages: {}", format_ids(.0))]
    CycleDetected(Vec<StageId>),
}

fn format_ids(ids: &[StageId]) -> String {
    ids.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// How to treat stages whose `requires` reference unknown IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DanglingPolicy {
    /// Fail with [`LayoutError::DanglingReference`] (default)
    #[default]
    Error,
    /// Drop unplaceable stages from the layout without reporting them.
    /// A stage whose requirements are all unknown never appears in any
    /// column, and neither does anything reachable only through it.
    Omit,
    /// Collect unplaceable stages into one final column, in authoring order
    Unresolved,
}

/// Options controlling layout computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutOptions {
    /// Policy for dangling requirement references
    pub dangling: DanglingPolicy,

    /// Reproduce the historical column scan, which re-collects a stage into
    /// every column following one of its requirements. A stage whose
    /// requirements span non-adjacent columns then appears more than once.
    /// Off by default; the default placement puts every stage in exactly
    /// one column, after the deepest of its requirements.
    pub legacy_duplicates: bool,
}

/// One rendering column: stages sharing the same dependency depth,
/// in their original relative order
pub type Column = Vec<Stage>;

/// Derived column layout of a stage dependency graph
///
/// An empty stage list produces a layout with zero columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Layout {
    columns: Vec<Column>,
}

impl Layout {
    /// Returns the columns, leftmost (no requirements) first
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Consumes the layout, returning the columns
    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    /// Returns the number of columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the layout has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the total number of placed stages, counting duplicates
    pub fn stage_count(&self) -> usize {
        self.columns.iter().map(|c| c.len()).sum()
    }

    /// Returns the index of the first column containing the given stage
    pub fn column_of(&self, id: &StageId) -> Option<usize> {
        self.columns
            .iter()
            .position(|col| col.iter().any(|s| &s.id == id))
    }

    /// Iterates over (column index, stage) pairs
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Stage)> {
        self.columns
            .iter()
            .enumerate()
            .flat_map(|(i, col)| col.iter().map(move |s| (i, s)))
    }
}

/// Computes the column layout for a stage list with default options:
/// dangling references are an error, every stage lands in exactly one column
pub fn compute_layout(stages: &[Stage]) -> Result<Layout, LayoutError> {
    compute_layout_with(stages, LayoutOptions::default())
}

/// Computes the column layout with explicit options
///
/// Pure function of its inputs: no hidden state, identical output for
/// identical input. Cycles are always an error regardless of options.
pub fn compute_layout_with(
    stages: &[Stage],
    options: LayoutOptions,
) -> Result<Layout, LayoutError> {
    if stages.is_empty() {
        return Ok(Layout::default());
    }

    let ids = check_duplicates(stages)?;
    let dangling = find_dangling(stages, &ids);

    if options.dangling == DanglingPolicy::Error {
        if let Some((stage, missing)) = dangling.first() {
            return Err(LayoutError::DanglingReference {
                stage: stage.clone(),
                missing: missing.clone(),
            });
        }
    }

    check_cycles(stages, &ids)?;

    let columns = if options.legacy_duplicates {
        legacy_scan(stages)?
    } else {
        layered_placement(stages, &ids, options.dangling)
    };

    Ok(Layout { columns })
}

/// Returns the full ID set, rejecting duplicates
fn check_duplicates(stages: &[Stage]) -> Result<HashSet<StageId>, LayoutError> {
    let mut ids = HashSet::with_capacity(stages.len());
    for stage in stages {
        if !ids.insert(stage.id.clone()) {
            return Err(LayoutError::DuplicateStage(stage.id.clone()));
        }
    }
    Ok(ids)
}

/// Collects (stage, missing requirement) pairs in authoring order
fn find_dangling(stages: &[Stage], ids: &HashSet<StageId>) -> Vec<(StageId, StageId)> {
    let mut dangling = Vec::new();
    for stage in stages {
        for required in &stage.requires {
            if !ids.contains(required) {
                dangling.push((stage.id.clone(), required.clone()));
            }
        }
    }
    dangling
}

/// Detects requirement cycles with Kahn's algorithm over resolvable edges
///
/// Unknown references are ignored here so that dangling-only inputs are
/// not misreported as cyclic. Stages left unconsumed are on a cycle or
/// depend on one.
fn check_cycles(stages: &[Stage], ids: &HashSet<StageId>) -> Result<(), LayoutError> {
    let mut in_degree: HashMap<&StageId, usize> = HashMap::with_capacity(stages.len());
    let mut dependents: HashMap<&StageId, Vec<&StageId>> = HashMap::new();

    for stage in stages {
        let resolvable = stage.requires.iter().filter(|r| ids.contains(*r));
        let mut count = 0;
        for required in resolvable {
            dependents.entry(required).or_default().push(&stage.id);
            count += 1;
        }
        in_degree.insert(&stage.id, count);
    }

    let mut queue: Vec<&StageId> = stages
        .iter()
        .filter(|s| in_degree[&s.id] == 0)
        .map(|s| &s.id)
        .collect();
    let mut consumed = 0;

    while let Some(id) = queue.pop() {
        consumed += 1;
        if let Some(deps) = dependents.get(id) {
            for dep in deps {
                if let Some(count) = in_degree.get_mut(dep) {
                    *count -= 1;
                    if *count == 0 {
                        queue.push(dep);
                    }
                }
            }
        }
    }

    if consumed < stages.len() {
        let stuck: Vec<StageId> = stages
            .iter()
            .filter(|s| in_degree[&s.id] > 0)
            .map(|s| s.id.clone())
            .collect();
        return Err(LayoutError::CycleDetected(stuck));
    }
    Ok(())
}

/// Default placement: breadth expansion where a stage joins the column
/// after the deepest of its resolvable requirements
///
/// Column 0 is exactly the stages with an empty `requires` list. A stage
/// with requirements but no resolvable ones is never seeded, so it and its
/// descendants stay unplaced; the dangling policy decides their fate.
fn layered_placement(
    stages: &[Stage],
    ids: &HashSet<StageId>,
    dangling: DanglingPolicy,
) -> Vec<Column> {
    let position: HashMap<&StageId, usize> =
        stages.iter().enumerate().map(|(i, s)| (&s.id, i)).collect();

    let mut pending: HashMap<&StageId, usize> = HashMap::with_capacity(stages.len());
    let mut dependents: HashMap<&StageId, Vec<&StageId>> = HashMap::new();

    for stage in stages {
        let mut count = 0;
        for required in stage.requires.iter().filter(|r| ids.contains(*r)) {
            dependents.entry(required).or_default().push(&stage.id);
            count += 1;
        }
        pending.insert(&stage.id, count);
    }

    let mut columns: Vec<Column> = Vec::new();
    let mut placed: HashSet<&StageId> = HashSet::with_capacity(stages.len());

    // Column 0: empty requires only. Stages whose requirements are all
    // dangling also have a zero pending count but must not be roots.
    let mut current: Vec<&StageId> = stages
        .iter()
        .filter(|s| s.requires.is_empty())
        .map(|s| &s.id)
        .collect();

    while !current.is_empty() {
        for id in &current {
            placed.insert(*id);
        }

        let mut next: Vec<&StageId> = Vec::new();
        for id in &current {
            if let Some(deps) = dependents.get(*id) {
                for dep in deps {
                    if let Some(count) = pending.get_mut(dep) {
                        *count -= 1;
                        if *count == 0 {
                            next.push(dep);
                        }
                    }
                }
            }
        }
        next.sort_by_key(|id| position[*id]);

        columns.push(materialize(stages, &current));
        current = next;
    }

    // Anything unplaced is blocked by a dangling reference, directly or
    // transitively. Cycles were rejected before placement.
    if dangling == DanglingPolicy::Unresolved {
        let leftover: Vec<&StageId> = stages
            .iter()
            .filter(|s| !placed.contains(&s.id))
            .map(|s| &s.id)
            .collect();
        if !leftover.is_empty() {
            columns.push(materialize(stages, &leftover));
        }
    }

    columns
}

/// Clones the named stages in authoring order
fn materialize(stages: &[Stage], ids: &[&StageId]) -> Column {
    let ids: HashSet<&StageId> = ids.iter().copied().collect();
    stages
        .iter()
        .filter(|s| ids.contains(&s.id))
        .cloned()
        .collect()
}

/// Historical column scan, kept for renderers that depend on duplicate
/// placement: every pass collects all stages requiring anything in the
/// previous column, placed or not
fn legacy_scan(stages: &[Stage]) -> Result<Vec<Column>, LayoutError> {
    let mut columns: Vec<Column> = Vec::new();

    let roots: Column = stages.iter().filter(|s| s.requires.is_empty()).cloned().collect();
    if roots.is_empty() {
        return Ok(columns);
    }

    // Upper bound on column count; unreachable for the acyclic inputs the
    // cycle check admits, but the scan itself must never run unbounded.
    let max_columns = stages.len() + 1;

    let mut previous_ids: HashSet<StageId> = roots.iter().map(|s| s.id.clone()).collect();
    columns.push(roots);

    loop {
        let next: Column = stages
            .iter()
            .filter(|s| s.requires.iter().any(|r| previous_ids.contains(r)))
            .cloned()
            .collect();

        if next.is_empty() {
            break;
        }
        if columns.len() >= max_columns {
            return Err(LayoutError::CycleDetected(
                next.into_iter().map(|s| s.id).collect(),
            ));
        }
        previous_ids = next.iter().map(|s| s.id.clone()).collect();
        columns.push(next);
    }

    Ok(columns)
}
