//! Pulumi as the reconciliation engine
//!
//! The deployment is rendered into a YAML program in the work directory and
//! the `pulumi` CLI is run there. Pulumi owns ordering, diffing against live
//! state and applying; whatever it reports as an error is returned unchanged.

use anyhow::{Context as AnyhowContext, Result};
use declarative::{Deployment, Engine, SubmitOptions, SubmitOutcome, SubmitReport};
use manifest::{PROGRAM_FILE, WrittenFiles};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::PathBuf;

use crate::runner;

/// Default name of the Pulumi CLI
pub const PULUMI: &str = "pulumi";

/// One entry of `pulumi stack ls --json`
#[derive(Deserialize)]
struct StackSummary {
    name: String,
}

pub struct PulumiEngine {
    work_dir: PathBuf,
    program: String,
    /// Arguments placed before every CLI invocation
    leading_args: Vec<String>,
}

impl PulumiEngine {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            program: PULUMI.to_string(),
            leading_args: Vec::new(),
        }
    }

    /// Run the CLI as `program leading_args...` instead of `pulumi` from PATH
    pub fn with_command(mut self, program: impl Into<String>, leading_args: &[&str]) -> Self {
        self.program = program.into();
        self.leading_args = leading_args.iter().map(ToString::to_string).collect();
        self
    }

    fn ensure_available(&self) -> Result<()> {
        if !runner::command_exists(&self.program) {
            anyhow::bail!(
                "'{}' not found on PATH. Install the Pulumi CLI: https://www.pulumi.com/docs/install/",
                self.program
            );
        }
        Ok(())
    }

    fn args<'a>(&'a self, args: &[&'a str]) -> Vec<&'a str> {
        self.leading_args
            .iter()
            .map(String::as_str)
            .chain(args.iter().copied())
            .collect()
    }

    /// Render the deployment into the work directory
    pub fn prepare(&self, deployment: &Deployment, stack: &str) -> Result<WrittenFiles> {
        let program = manifest::render_program(deployment)?;
        let settings = manifest::stack_settings(deployment);
        let written = manifest::write_program(&self.work_dir, &program, &settings, stack)?;
        Ok(written)
    }

    /// Whether the project already has `stack`
    ///
    /// `stack ls` may list fully qualified names (`org/project/stack`).
    fn stack_exists(&self, stack: &str) -> Result<bool> {
        let stdout = runner::run_capture_in(
            &self.work_dir,
            &self.program,
            &self.args(&["stack", "ls", "--json"]),
        )?;
        if stdout.is_empty() {
            return Ok(false);
        }
        let stacks: Vec<StackSummary> =
            serde_json::from_str(&stdout).context("Unexpected output from 'pulumi stack ls'")?;
        Ok(stacks
            .iter()
            .any(|s| s.name.rsplit('/').next() == Some(stack)))
    }

    /// Select the stack, creating it on first use
    fn select_stack(&self, stack: &str) -> Result<()> {
        runner::run_capture_in(
            &self.work_dir,
            &self.program,
            &self.args(&["stack", "select", "--create", stack, "--non-interactive"]),
        )?;
        Ok(())
    }
}

impl Engine for PulumiEngine {
    fn name(&self) -> &str {
        PULUMI
    }

    fn submit(&self, deployment: &Deployment, opts: &SubmitOptions) -> Result<SubmitReport> {
        self.ensure_available()?;
        let written = self.prepare(deployment, &opts.stack)?;
        log::info!("program written to {}", written.program.display());

        self.select_stack(&opts.stack)?;

        let verb = if opts.preview { "preview" } else { "up" };
        let mut args = vec![verb];
        if !opts.preview {
            args.extend(["--yes", "--skip-preview"]);
        }
        args.extend(["--non-interactive", "--stack", opts.stack.as_str()]);

        runner::run_streaming_in(&self.work_dir, &self.program, &self.args(&args))?;

        Ok(SubmitReport {
            engine: PULUMI.to_string(),
            outcome: if opts.preview {
                SubmitOutcome::Previewed
            } else {
                SubmitOutcome::Applied
            },
            summary: Some(format!("{verb} {}", opts.stack)),
        })
    }

    /// Empty until the stack has been created by an apply
    fn outputs(&self, opts: &SubmitOptions) -> Result<Map<String, Value>> {
        if !self.work_dir.join(PROGRAM_FILE).exists() {
            log::info!("no program in {}", self.work_dir.display());
            return Ok(Map::new());
        }
        self.ensure_available()?;

        if !self.stack_exists(&opts.stack)? {
            log::info!("stack '{}' does not exist yet", opts.stack);
            return Ok(Map::new());
        }

        let stdout = runner::run_capture_in(
            &self.work_dir,
            &self.program,
            &self.args(&["stack", "output", "--json", "--stack", opts.stack.as_str()]),
        )?;
        if stdout.is_empty() {
            return Ok(Map::new());
        }
        serde_json::from_str(&stdout).context("Unexpected output from 'pulumi stack output'")
    }
}
