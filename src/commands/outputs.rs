use anyhow::Result;
use colored::Colorize;
use declarative::{Engine, OutputSet, Resolution, SubmitOptions};
use serde_json::{Map, Value};

use crate::Context;
use crate::cli::OutputsArgs;
use crate::engine::PulumiEngine;
use crate::progress;
use crate::ui;

/// Outputs as JSON, pending ones as `null`
pub fn to_json(outputs: &OutputSet, reported: &Map<String, Value>) -> Value {
    outputs
        .resolve(reported)
        .into_iter()
        .map(|(name, resolution)| {
            let value = match resolution {
                Resolution::Known(v) => v,
                Resolution::Pending => Value::Null,
            };
            (name.to_string(), value)
        })
        .collect::<Map<_, _>>()
        .into()
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn run(ctx: &Context, args: OutputsArgs) -> Result<()> {
    let loaded = super::load(ctx)?;
    let outputs = &loaded.deployment.outputs;

    let work_dir = super::work_dir(ctx, args.work_dir.as_deref())?;
    let engine = PulumiEngine::new(&work_dir);
    let opts = SubmitOptions {
        stack: ctx.stack.clone(),
        preview: false,
    };
    let pb = progress::spinner("Asking pulumi for stack outputs...");
    let reported = engine.outputs(&opts);
    progress::finish_clear(&pb);
    let reported = reported?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&to_json(outputs, &reported))?);
        return Ok(());
    }

    ui::header(&format!("Outputs (stack {})", ctx.stack));
    let mut pending = 0;
    for (name, resolution) in outputs.resolve(&reported) {
        match resolution {
            Resolution::Known(value) => ui::kv(name, &ui::truncate(&display(&value), 80)),
            Resolution::Pending => {
                pending += 1;
                println!("  {:<20} {}", format!("{name}:").dimmed(), "pending".dimmed());
            }
        }
    }
    if pending > 0 && !ctx.quiet {
        println!();
        ui::dim(&format!("{pending} outputs are known only after 'eksplat up'"));
    }
    Ok(())
}
