use anyhow::Result;
use declarative::{Deployment, Kind};

use crate::Context;
use crate::config;
use crate::ui;

/// Per-kind counts in `Kind::ALL` order, kinds with no declarations left out
pub fn kind_counts(deployment: &Deployment) -> Vec<(Kind, usize)> {
    Kind::ALL
        .into_iter()
        .map(|kind| (kind, deployment.graph.count_kind(kind)))
        .filter(|(_, count)| *count > 0)
        .collect()
}

pub fn run(ctx: &Context) -> Result<()> {
    let loaded = super::load(ctx)?;
    let deployment = &loaded.deployment;

    deployment.validate()?;
    // the renderer needs a type token for every declaration
    manifest::render_program(deployment)?;

    let waves = deployment.graph.waves()?.len();
    ui::success(&format!(
        "{} declarations, {} outputs, {} waves",
        deployment.graph.len(),
        deployment.outputs.len(),
        waves
    ));

    if ctx.verbose > 0 {
        for (kind, count) in kind_counts(deployment) {
            ui::kv(kind.as_str(), &count.to_string());
        }
    }

    let warnings = config::lint(&loaded.resolved.config);
    for warning in &warnings {
        ui::warn(warning);
    }
    if warnings.is_empty() && !ctx.quiet {
        ui::dim("Configuration looks sane");
    }
    Ok(())
}
