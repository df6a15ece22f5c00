//! The `stages` command: tabular stage listing

use anyhow::Result;

use super::output::Output;
use crate::storage::DeploymentFile;

/// Lists the stages of the deployment in the given file
pub fn run(output: &Output, file: &str) -> Result<()> {
    let file = DeploymentFile::new(file)?;
    let deployment = file.load()?;
    output.verbose_ctx(
        "stages",
        &format!("Loaded deployment {}", deployment.id),
    );

    if output.is_json() {
        let items: Vec<_> = deployment
            .stages
            .iter()
            .map(|s| {
                serde_json::json!({
                    "id": s.id,
                    "name": s.name,
                    "status": s.status,
                    "requires": s.requires,
                    "retried_count": s.retried_count,
                })
            })
            .collect();
        output.data(&items);
    } else if deployment.stages.is_empty() {
        println!("Deployment {} has no stages.", deployment.id);
    } else {
        println!("Stages of {} ({}):", deployment.application, deployment.id);
        println!("{:<20} {:<24} {:<12} REQUIRES", "ID", "NAME", "STATUS");
        println!("{}", "-".repeat(80));

        for stage in &deployment.stages {
            let requires = stage
                .requires
                .iter()
                .map(|r| r.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            println!(
                "{:<20} {:<24} {:<12} {}",
                stage.id,
                stage.name,
                stage.status.label(),
                requires
            );
        }

        println!();
        println!("{} stage(s)", deployment.stages.len());
    }

    Ok(())
}
