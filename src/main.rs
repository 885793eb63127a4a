mod cli;
mod commands;
mod config;
mod engine;
mod paths;
mod platform;
mod progress;
mod runner;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub stack: String,
    /// Explicit stack file from `--config`
    pub config: Option<PathBuf>,
    /// `--set` overrides, in the order given
    pub overrides: Vec<(String, String)>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        stack: cli.stack,
        config: cli.config,
        overrides: cli.overrides,
    };

    match cli.command {
        Command::Plan(args) => commands::plan::run(&ctx, args.target.as_deref(), args.json),
        Command::Validate => commands::validate::run(&ctx),
        Command::Render(args) => commands::render::run(&ctx, args),
        Command::Diff(args) => commands::diff::run(&ctx, &args.against, args.target.as_deref()),
        Command::Up(args) => commands::up::run(&ctx, args),
        Command::Outputs(args) => commands::outputs::run(&ctx, args),
        Command::Config(cmd) => commands::config::run(&ctx, cmd),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "eksplat", &mut io::stdout());
            Ok(())
        }
    }
}
