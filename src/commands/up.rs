use anyhow::Result;
use declarative::{AutoConfirm, SubmitOptions, SubmitOutcome};
use std::io::IsTerminal;

use crate::Context;
use crate::cli::UpArgs;
use crate::config;
use crate::engine::{PromptConfirm, PulumiEngine};
use crate::ui;

/// How an apply gets confirmed
#[derive(Debug, PartialEq, Eq)]
enum Confirmation {
    Skip,
    Prompt,
}

fn confirmation(args: &UpArgs, interactive: bool) -> Result<Confirmation> {
    if args.yes || args.preview {
        return Ok(Confirmation::Skip);
    }
    if !interactive {
        anyhow::bail!("Refusing to apply without a terminal to confirm on; pass --yes");
    }
    Ok(Confirmation::Prompt)
}

pub fn run(ctx: &Context, args: UpArgs) -> Result<()> {
    let confirm = confirmation(&args, std::io::stdin().is_terminal())?;

    let loaded = super::load(ctx)?;
    let deployment = &loaded.deployment;

    for warning in config::lint(&loaded.resolved.config) {
        ui::warn(&warning);
    }

    let work_dir = super::work_dir(ctx, args.work_dir.as_deref())?;
    let engine = PulumiEngine::new(&work_dir);
    let opts = SubmitOptions {
        stack: ctx.stack.clone(),
        preview: args.preview,
    };

    if !ctx.quiet {
        ui::header(&format!(
            "{} {} declarations on stack {}",
            if args.preview { "Previewing" } else { "Applying" },
            deployment.graph.len(),
            ctx.stack
        ));
        ui::kv("Work dir", &work_dir.display().to_string());
        println!();
    }

    let report = match confirm {
        Confirmation::Skip => declarative::submit(deployment, &engine, &opts, &mut AutoConfirm)?,
        Confirmation::Prompt => {
            declarative::submit(deployment, &engine, &opts, &mut PromptConfirm)?
        }
    };

    match report.outcome {
        SubmitOutcome::Declined => ui::warn("Cancelled"),
        SubmitOutcome::Previewed => ui::success("Preview complete"),
        SubmitOutcome::Applied => {
            ui::success(&format!("Applied with {}", report.engine));
            if !ctx.quiet {
                ui::dim("Run 'eksplat outputs' to see exported values");
            }
        }
    }
    if let Some(summary) = report.summary {
        log::info!("{summary}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(preview: bool, yes: bool) -> UpArgs {
        UpArgs {
            preview,
            yes,
            work_dir: None,
        }
    }

    #[test]
    fn test_confirmation_mode() {
        assert_eq!(
            confirmation(&args(false, false), true).unwrap(),
            Confirmation::Prompt
        );
        assert_eq!(
            confirmation(&args(false, true), false).unwrap(),
            Confirmation::Skip
        );
        assert_eq!(
            confirmation(&args(true, false), false).unwrap(),
            Confirmation::Skip
        );
    }

    #[test]
    fn test_apply_without_terminal_needs_yes() {
        let err = confirmation(&args(false, false), false).unwrap_err();
        assert!(err.to_string().contains("--yes"));
    }
}
