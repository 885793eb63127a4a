use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::config::parse_override;

#[derive(Parser)]
#[command(name = "eksplat")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declare an EKS microservices platform and hand it to Pulumi", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Stack to operate on
    #[arg(short, long, global = true, env = "EKSPLAT_STACK", default_value = "dev")]
    pub stack: String,

    /// Stack file to read instead of <config dir>/<stack>.toml
    #[arg(short, long, global = true, env = "EKSPLAT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override a configuration value (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE", global = true, value_parser = parse_override)]
    pub overrides: Vec<(String, String)>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show declarations in preview order
    Plan(PlanArgs),

    /// Check graph properties and lint the configuration
    Validate,

    /// Render the Pulumi program (yaml) or a snapshot (json)
    Render(RenderArgs),

    /// Compare the current build with a saved snapshot
    Diff(DiffArgs),

    /// Render the program and hand it to Pulumi
    Up(UpArgs),

    /// Show exported outputs, resolved once applied
    Outputs(OutputsArgs),

    /// Manage stack configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Declaration Commands
// ============================================================================

#[derive(Parser)]
pub struct PlanArgs {
    /// Only show matching declarations: kind or kind.name (e.g. helm-release.istiod)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Print waves as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum RenderFormat {
    /// Pulumi YAML program plus stack settings
    Yaml,
    /// Snapshot for later `diff --against`
    Json,
}

#[derive(Parser)]
pub struct RenderArgs {
    /// Output directory (defaults to the stack's work directory)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// What to render
    #[arg(short, long, value_enum, default_value = "yaml")]
    pub format: RenderFormat,

    /// Print to stdout instead of writing files
    #[arg(long, conflicts_with = "out")]
    pub stdout: bool,
}

#[derive(Parser)]
pub struct DiffArgs {
    /// Snapshot written by `render --format json`
    #[arg(long, value_name = "SNAPSHOT")]
    pub against: PathBuf,

    /// Only show matching declarations: kind or kind.name
    #[arg(short, long)]
    pub target: Option<String>,
}

// ============================================================================
// Engine Commands
// ============================================================================

#[derive(Parser)]
pub struct UpArgs {
    /// Ask Pulumi for a preview only
    #[arg(short, long)]
    pub preview: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Directory the program is written to (defaults to the stack's work directory)
    #[arg(long, env = "EKSPLAT_WORK_DIR")]
    pub work_dir: Option<PathBuf>,
}

#[derive(Parser)]
pub struct OutputsArgs {
    /// Print outputs as JSON
    #[arg(long)]
    pub json: bool,

    /// Directory the program was written to
    #[arg(long, env = "EKSPLAT_WORK_DIR")]
    pub work_dir: Option<PathBuf>,
}

// ============================================================================
// Config Commands
// ============================================================================

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show resolved values and where each came from
    Show,

    /// Print the stack file path
    Path,

    /// Write a stack file with every value spelled out
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "eksplat",
            "plan",
            "--stack",
            "prod",
            "--set",
            "cluster_name=prod-cluster",
            "--set",
            "max_size=9",
            "-t",
            "helm-release",
        ])
        .unwrap();

        assert_eq!(cli.stack, "prod");
        assert_eq!(
            cli.overrides,
            vec![
                ("cluster_name".to_string(), "prod-cluster".to_string()),
                ("max_size".to_string(), "9".to_string()),
            ]
        );
        match cli.command {
            Command::Plan(args) => assert_eq!(args.target.as_deref(), Some("helm-release")),
            _ => panic!("expected plan"),
        }
    }

    #[test]
    fn test_bad_override_is_rejected() {
        assert!(Cli::try_parse_from(["eksplat", "validate", "--set", "nodes=3"]).is_err());
        assert!(Cli::try_parse_from(["eksplat", "validate", "--set", "cluster_name"]).is_err());
    }

    #[test]
    fn test_diff_requires_snapshot() {
        assert!(Cli::try_parse_from(["eksplat", "diff"]).is_err());
        assert!(Cli::try_parse_from(["eksplat", "diff", "--against", "snap.json"]).is_ok());
    }
}
