//! Property tests for the stage layout engine
//!
//! Generates random well-formed pipelines (each stage may only require
//! stages authored before it, so the graph is acyclic with no unknown
//! references) and checks the layout invariants hold for all of them.

use proptest::prelude::*;
use proptest::sample::Index;

use pipelane_cli::domain::{Stage, StageId};
use pipelane_cli::layout::compute_layout;

fn stage_id(i: usize) -> StageId {
    format!("stage-{i}").parse().unwrap()
}

/// Builds a stage list where stage i requires a subset of stages 0..i
fn build_stages(dep_picks: &[Vec<Index>]) -> Vec<Stage> {
    dep_picks
        .iter()
        .enumerate()
        .map(|(i, picks)| {
            let mut stage = Stage::new(stage_id(i), format!("STAGE_{i}"));
            if i > 0 {
                for pick in picks {
                    stage.require(stage_id(pick.index(i)));
                }
            }
            stage
        })
        .collect()
}

/// Strategy: up to 24 stages, each with up to 3 requirements on earlier stages
fn pipelines() -> impl Strategy<Value = Vec<Stage>> {
    prop::collection::vec(prop::collection::vec(any::<Index>(), 0..4), 0..25)
        .prop_map(|picks| build_stages(&picks))
}

proptest! {
    #[test]
    fn every_stage_placed_exactly_once(stages in pipelines()) {
        let layout = compute_layout(&stages).unwrap();

        prop_assert_eq!(layout.stage_count(), stages.len());

        let mut seen = std::collections::HashSet::new();
        for (_, stage) in layout.iter() {
            prop_assert!(seen.insert(stage.id.clone()), "duplicate placement of {}", stage.id);
        }
    }

    #[test]
    fn column_zero_is_exactly_the_roots(stages in pipelines()) {
        let layout = compute_layout(&stages).unwrap();

        let roots: Vec<&StageId> = stages
            .iter()
            .filter(|s| s.requires.is_empty())
            .map(|s| &s.id)
            .collect();

        if roots.is_empty() {
            prop_assert!(layout.is_empty());
        } else {
            let column0: Vec<&StageId> =
                layout.columns()[0].iter().map(|s| &s.id).collect();
            prop_assert_eq!(column0, roots);
        }
    }

    #[test]
    fn prerequisites_are_in_strictly_earlier_columns(stages in pipelines()) {
        let layout = compute_layout(&stages).unwrap();

        for stage in &stages {
            let col = layout.column_of(&stage.id).unwrap();
            for required in &stage.requires {
                let req_col = layout.column_of(required).unwrap();
                prop_assert!(req_col < col);
            }
        }
    }

    #[test]
    fn recomputation_is_deterministic(stages in pipelines()) {
        let first = compute_layout(&stages).unwrap();
        let second = compute_layout(&stages).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn columns_preserve_authoring_order(stages in pipelines()) {
        let layout = compute_layout(&stages).unwrap();

        let position = |id: &StageId| stages.iter().position(|s| &s.id == id).unwrap();
        for column in layout.columns() {
            let positions: Vec<usize> = column.iter().map(|s| position(&s.id)).collect();
            let mut sorted = positions.clone();
            sorted.sort_unstable();
            prop_assert_eq!(positions, sorted);
        }
    }
}
