use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::Context;
use crate::cli::ConfigCommand;
use crate::config::{self, ConfigSource, StackConfig};
use crate::paths;
use crate::ui;

pub fn run(ctx: &Context, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => show(ctx),
        ConfigCommand::Path => {
            println!("{}", stack_path(ctx)?.display());
            Ok(())
        }
        ConfigCommand::Init { force } => init(ctx, force),
    }
}

/// `--config` if given, else `<config dir>/<stack>.toml`
fn stack_path(ctx: &Context) -> Result<PathBuf> {
    Ok(paths::config_file(ctx.config.as_deref(), &ctx.stack)?.0)
}

fn show(ctx: &Context) -> Result<()> {
    let resolved = config::load(ctx.config.as_deref(), &ctx.stack, &ctx.overrides)?;

    ui::header(&format!("Configuration (stack {})", ctx.stack));
    match &resolved.file {
        Some(path) => ui::kv("Stack file", &path.display().to_string()),
        None => ui::kv("Stack file", &format!("{} (none)", stack_path(ctx)?.display())),
    }
    println!();

    for (key, value, source) in resolved.entries() {
        let source = match source {
            ConfigSource::Default => source.to_string().dimmed(),
            ConfigSource::File => source.to_string().cyan(),
            ConfigSource::Override => source.to_string().yellow(),
        };
        println!("  {:<22} {:<32} {}", format!("{key}:").bold(), value, source);
    }

    let warnings = config::lint(&resolved.config);
    if !warnings.is_empty() {
        println!();
        for warning in &warnings {
            ui::warn(warning);
        }
    }
    Ok(())
}

/// Write a starter stack file, refusing to overwrite unless `force`
pub fn write_stack_file(path: &Path, config: &StackConfig, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Could not create {}", parent.display()))?;
    }
    fs::write(path, config::init_template(config)?)
        .with_context(|| format!("Could not write {}", path.display()))?;
    Ok(())
}

fn init(ctx: &Context, force: bool) -> Result<()> {
    let path = stack_path(ctx)?;
    // only overrides; an existing file must not leak into its own template
    let resolved = config::resolve(None, &ctx.overrides)?;

    write_stack_file(&path, &resolved.config, force)?;
    ui::success(&format!("Wrote {}", path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StackFile;

    #[test]
    fn test_init_writes_loadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stacks").join("qa.toml");
        let config = StackConfig {
            cluster_name: "qa-cluster".to_string(),
            ..StackConfig::default()
        };

        write_stack_file(&path, &config, false).unwrap();

        let file = StackFile::parse(&fs::read_to_string(&path).unwrap()).unwrap();
        let resolved = config::resolve(Some(&file), &[]).unwrap();
        assert_eq!(resolved.config, config);
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qa.toml");
        fs::write(&path, "[aws]\nregion = \"eu-west-1\"\n").unwrap();

        let err = write_stack_file(&path, &StackConfig::default(), false).unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert!(write_stack_file(&path, &StackConfig::default(), true).is_ok());
    }

    #[test]
    fn test_stack_path_prefers_explicit() {
        let ctx = crate::commands::test_context(Some(PathBuf::from("/tmp/qa.toml")));
        assert_eq!(stack_path(&ctx).unwrap(), PathBuf::from("/tmp/qa.toml"));
    }
}
