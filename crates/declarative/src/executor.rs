//! Submission - validate locally, confirm, hand off to the engine once

use crate::context::{ConfirmCallback, Engine};
use crate::deployment::Deployment;
use crate::types::{SubmitOptions, SubmitReport};
use anyhow::Result;

/// Submit a deployment to an engine
///
/// # Arguments
/// * `deployment` - The deployment to hand over
/// * `engine` - Engine that previews or applies it
/// * `opts` - Stack and preview flag
/// * `confirm` - Asked before an apply; previews skip it
///
/// # Returns
/// The engine's report, or `SubmitReport::declined()` if the user said no.
/// Graph errors are reported before the engine is involved; engine errors
/// are returned exactly as the engine produced them.
pub fn submit<E, C>(
    deployment: &Deployment,
    engine: &E,
    opts: &SubmitOptions,
    confirm: &mut C,
) -> Result<SubmitReport>
where
    E: Engine + ?Sized,
    C: ConfirmCallback,
{
    deployment.validate()?;

    if !opts.preview {
        let prompt = format!(
            "Apply {} declarations to stack '{}' with {}?",
            deployment.graph.len(),
            opts.stack,
            engine.name()
        );
        if !confirm.confirm(&prompt)? {
            log::info!("submission declined");
            return Ok(SubmitReport::declined());
        }
    }

    log::info!(
        "submitting {} declarations to {} (stack {}, preview: {})",
        deployment.graph.len(),
        engine.name(),
        opts.stack,
        opts.preview
    );
    engine.submit(deployment, opts)
}

/// Submit without asking
pub fn submit_simple<E: Engine + ?Sized>(
    deployment: &Deployment,
    engine: &E,
    opts: &SubmitOptions,
) -> Result<SubmitReport> {
    use crate::context::AutoConfirm;

    submit(deployment, engine, opts, &mut AutoConfirm)
}
