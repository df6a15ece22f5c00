//! The `show` command: render a deployment's stage layout

use anyhow::{Context, Result};

use super::output::Output;
use crate::layout::{compute_layout_with, render_text, DanglingPolicy, Layout, LayoutOptions};
use crate::storage::DeploymentFile;

/// Dangling-reference policy as a CLI flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DanglingFlag {
    /// Fail on unknown requirement references
    #[default]
    Error,
    /// Silently drop unplaceable stages
    Omit,
    /// Collect unplaceable stages into a final column
    Unresolved,
}

impl From<DanglingFlag> for DanglingPolicy {
    fn from(flag: DanglingFlag) -> Self {
        match flag {
            DanglingFlag::Error => DanglingPolicy::Error,
            DanglingFlag::Omit => DanglingPolicy::Omit,
            DanglingFlag::Unresolved => DanglingPolicy::Unresolved,
        }
    }
}

/// Renders the layout for the deployment in the given file
pub fn run(
    output: &Output,
    file: &str,
    dangling: DanglingFlag,
    legacy_duplicates: bool,
) -> Result<()> {
    let file = DeploymentFile::new(file)?;
    output.verbose_ctx("show", &format!("Loading {}", file.path().display()));

    let deployment = file.load()?;
    output.verbose_ctx(
        "show",
        &format!(
            "Loaded deployment {} with {} stages",
            deployment.id,
            deployment.stages.len()
        ),
    );

    let options = LayoutOptions {
        dangling: dangling.into(),
        legacy_duplicates,
    };
    let layout = compute_layout_with(&deployment.stages, options)
        .with_context(|| format!("Failed to lay out deployment {}", deployment.id))?;

    if output.is_json() {
        output.data(&layout_json(&layout));
    } else {
        println!(
            "{} ({}) - {}",
            deployment.application,
            deployment.id,
            deployment.status.label()
        );
        println!();
        print!("{}", render_text(&layout));
    }

    Ok(())
}

fn layout_json(layout: &Layout) -> serde_json::Value {
    let columns: Vec<_> = layout
        .columns()
        .iter()
        .map(|col| {
            col.iter()
                .map(|s| {
                    serde_json::json!({
                        "id": s.id,
                        "name": s.name,
                        "status": s.status,
                        "requires": s.requires,
                        "visible": s.visible,
                    })
                })
                .collect::<Vec<_>>()
        })
        .collect();

    serde_json::json!({ "columns": columns })
}
