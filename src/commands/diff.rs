use anyhow::{Context as AnyhowContext, Result};
use declarative::{ResourceDiff, ResourceGraph, compute_diffs};
use std::collections::HashSet;
use std::path::Path;

use crate::Context;
use crate::engine::differ;
use crate::ui;

/// Diffs between two graphs, limited to declarations matching `target` in either
pub fn diff_graphs(
    previous: &ResourceGraph,
    current: &ResourceGraph,
    target: Option<&str>,
) -> Vec<ResourceDiff> {
    let diffs = compute_diffs(previous.declarations(), current.declarations());
    if target.is_none() {
        return diffs;
    }

    let selected: HashSet<_> = previous
        .filter_by_target(target)
        .into_iter()
        .chain(current.filter_by_target(target))
        .map(|d| d.id.clone())
        .collect();
    diffs
        .into_iter()
        .filter(|diff| selected.contains(&diff.id))
        .collect()
}

pub fn run(ctx: &Context, against: &Path, target: Option<&str>) -> Result<()> {
    let snapshot = manifest::read_snapshot(against)
        .with_context(|| format!("Could not load snapshot {}", against.display()))?;
    let previous = snapshot.to_graph()?;

    let loaded = super::load(ctx)?;
    let deployment = &loaded.deployment;
    deployment.validate()?;

    if snapshot.fingerprint == deployment.fingerprint()? {
        ui::success("Identical to snapshot");
        return Ok(());
    }

    if snapshot.project != deployment.project {
        ui::warn(&format!(
            "Snapshot is for project '{}', not '{}'",
            snapshot.project, deployment.project
        ));
    }

    ui::header(&format!("Diff against {}", against.display()));

    let diffs = diff_graphs(&previous, &deployment.graph, target);
    differ::display_diff(&diffs, ctx.verbose > 0);

    if target.is_none() && snapshot.stack_settings != deployment.stack_settings {
        ui::warn("Stack settings changed");
        for (key, value) in &deployment.stack_settings {
            if snapshot.stack_settings.get(key) != Some(value) {
                ui::kv(key, &value.to_string());
            }
        }
    }
    if target.is_none() && snapshot.outputs != deployment.outputs {
        ui::info("Exported outputs changed");
    }
    Ok(())
}
