//! The `validate` command: structural checks on a deployment's stage graph

use anyhow::{bail, Result};

use super::output::Output;
use crate::domain::StageGraph;
use crate::layout::{compute_layout, LayoutError};
use crate::storage::DeploymentFile;

/// Validates the deployment in the given file
///
/// Checks stage ID uniqueness, requirement references and acyclicity, then
/// confirms a layout can be computed. Fails with a non-zero exit on the
/// first structural problem.
pub fn run(output: &Output, file: &str) -> Result<()> {
    let file = DeploymentFile::new(file)?;
    let deployment = file.load()?;
    output.verbose_ctx(
        "validate",
        &format!(
            "Loaded deployment {} with {} stages",
            deployment.id,
            deployment.stages.len()
        ),
    );

    // The graph rejects duplicates, unknown references and cycles
    if let Err(e) = StageGraph::from_stages(&deployment.stages) {
        bail!("Deployment {} is invalid: {}", deployment.id, e);
    }

    // The layout must also be computable; a failure here after a valid
    // graph would be a bug, but surface it rather than swallow it
    let layout = match compute_layout(&deployment.stages) {
        Ok(layout) => layout,
        Err(e @ LayoutError::CycleDetected(_)) => {
            bail!("Deployment {} is invalid: {}", deployment.id, e)
        }
        Err(e) => bail!("Deployment {} failed layout: {}", deployment.id, e),
    };

    if output.is_json() {
        output.data(&serde_json::json!({
            "valid": true,
            "deployment": deployment.id,
            "stages": deployment.stages.len(),
            "columns": layout.width(),
        }));
    } else {
        output.success(&format!(
            "Deployment {} is valid: {} stages across {} columns",
            deployment.id,
            deployment.stages.len(),
            layout.width()
        ));
    }

    Ok(())
}
