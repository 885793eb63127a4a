//! `eksplat plan` - declarations in preview order
//!
//! The order is a preview only. Pulumi decides the real order and runs
//! independent branches concurrently.

use anyhow::Result;
use colored::Colorize;
use declarative::{Kind, ResourceGraph};
use serde::Serialize;
use std::collections::HashSet;

use crate::Context;
use crate::ui;

/// One row of the plan
#[derive(Debug, Serialize)]
pub struct PlannedDeclaration {
    pub wave: usize,
    pub id: String,
    pub kind: Kind,
    pub name: String,
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub predecessors: Vec<String>,
}

#[derive(Serialize)]
struct PlanDocument<'a> {
    project: &'a str,
    stack: &'a str,
    fingerprint: String,
    waves: usize,
    declarations: Vec<PlannedDeclaration>,
}

/// Rows in wave order, restricted to `target` if given
///
/// Wave numbers are those of the full graph.
pub fn plan_rows(graph: &ResourceGraph, target: Option<&str>) -> Result<Vec<PlannedDeclaration>> {
    let selected: HashSet<_> = graph
        .filter_by_target(target)
        .into_iter()
        .map(|d| &d.id)
        .collect();

    let mut rows = Vec::new();
    for (index, wave) in graph.waves()?.into_iter().enumerate() {
        for declaration in wave.into_iter().filter(|d| selected.contains(&d.id)) {
            rows.push(PlannedDeclaration {
                wave: index + 1,
                id: declaration.id.to_string(),
                kind: declaration.kind(),
                name: declaration.name().to_string(),
                symbol: declaration.id.symbol(),
                summary: declaration.summary(),
                predecessors: graph
                    .predecessors(&declaration.id)
                    .into_iter()
                    .map(ToString::to_string)
                    .collect(),
            });
        }
    }
    Ok(rows)
}

pub fn run(ctx: &Context, target: Option<&str>, json: bool) -> Result<()> {
    let loaded = super::load(ctx)?;
    let deployment = &loaded.deployment;
    deployment.validate()?;

    let rows = plan_rows(&deployment.graph, target)?;
    let waves = deployment.graph.waves()?.len();
    let fingerprint = deployment.fingerprint()?;

    if json {
        let document = PlanDocument {
            project: &deployment.project,
            stack: &ctx.stack,
            fingerprint,
            waves,
            declarations: rows,
        };
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    if rows.is_empty() {
        ui::warn(&format!(
            "No declarations match '{}'",
            target.unwrap_or_default()
        ));
        return Ok(());
    }

    ui::header(&format!("Plan: {} (stack {})", deployment.project, ctx.stack));

    let mut current_wave = 0;
    for row in &rows {
        if row.wave != current_wave {
            current_wave = row.wave;
            ui::section(&format!("Wave {current_wave}"));
        }
        let summary = row
            .summary
            .as_deref()
            .map(|s| ui::truncate(s, 40))
            .unwrap_or_default();
        println!("  {} {:<48} {}", "•".cyan(), row.id, summary.dimmed());
        if ctx.verbose > 0 && !row.predecessors.is_empty() {
            ui::dim(&format!("    after {}", row.predecessors.join(", ")));
        }
    }

    println!();
    ui::kv(
        "Declarations",
        &format!("{} of {}", rows.len(), deployment.graph.len()),
    );
    ui::kv("Waves", &waves.to_string());
    ui::kv("Outputs", &deployment.outputs.len().to_string());
    ui::kv("Fingerprint", &fingerprint[..16]);
    if !ctx.quiet {
        println!();
        ui::dim("Preview order only; Pulumi decides the real order at apply time.");
    }
    Ok(())
}
