pub mod config;
pub mod diff;
pub mod outputs;
pub mod plan;
pub mod render;
pub mod up;
pub mod validate;

use anyhow::Result;
use declarative::Deployment;
use std::path::{Path, PathBuf};

use crate::Context;
use crate::config::ResolvedConfig;
use crate::{paths, platform};

/// Resolved configuration and the deployment built from it
pub struct Loaded {
    pub resolved: ResolvedConfig,
    pub deployment: Deployment,
}

/// Resolve the stack's configuration and declare the platform
pub fn load(ctx: &Context) -> Result<Loaded> {
    let resolved = crate::config::load(ctx.config.as_deref(), &ctx.stack, &ctx.overrides)?;
    let deployment = platform::build(&resolved.config)?;
    log::debug!(
        "built {} declarations for stack '{}'",
        deployment.graph.len(),
        ctx.stack
    );
    Ok(Loaded {
        resolved,
        deployment,
    })
}

/// `--work-dir` if given, else the stack's default work directory
pub fn work_dir(ctx: &Context, explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(dir) => Ok(paths::expand(&dir.to_string_lossy())),
        None => paths::work_dir(&ctx.stack),
    }
}

#[cfg(test)]
pub(crate) fn test_context(config: Option<PathBuf>) -> Context {
    Context {
        verbose: 0,
        quiet: true,
        stack: "test".to_string(),
        config,
        overrides: Vec::new(),
    }
}
