use anyhow::{Context as AnyhowContext, Result};
use declarative::Deployment;
use manifest::WrittenFiles;
use std::fs;
use std::path::{Path, PathBuf};

use crate::Context;
use crate::cli::{RenderArgs, RenderFormat};
use crate::ui;

/// File name used for `--format json`
pub const SNAPSHOT_FILE: &str = "snapshot.json";

/// Write `Pulumi.yaml` and the stack settings file into `dir`
pub fn write_yaml(deployment: &Deployment, dir: &Path, stack: &str) -> Result<WrittenFiles> {
    let program = manifest::render_program(deployment)?;
    let settings = manifest::stack_settings(deployment);
    Ok(manifest::write_program(dir, &program, &settings, stack)?)
}

/// Write the deployment snapshot into `dir`
pub fn write_snapshot(deployment: &Deployment, dir: &Path) -> Result<PathBuf> {
    deployment.validate()?;
    fs::create_dir_all(dir).with_context(|| format!("Could not create {}", dir.display()))?;

    let path = dir.join(SNAPSHOT_FILE);
    fs::write(&path, manifest::snapshot_json(deployment)?)
        .with_context(|| format!("Could not write {}", path.display()))?;
    Ok(path)
}

pub fn run(ctx: &Context, args: RenderArgs) -> Result<()> {
    let loaded = super::load(ctx)?;
    let deployment = &loaded.deployment;

    if args.stdout {
        let text = match args.format {
            RenderFormat::Yaml => manifest::to_yaml(&manifest::render_program(deployment)?)?,
            RenderFormat::Json => {
                deployment.validate()?;
                manifest::snapshot_json(deployment)?
            }
        };
        print!("{text}");
        return Ok(());
    }

    let dir = super::work_dir(ctx, args.out.as_deref())?;
    match args.format {
        RenderFormat::Yaml => {
            let written = write_yaml(deployment, &dir, &ctx.stack)?;
            ui::success(&format!(
                "Rendered {} declarations",
                deployment.graph.len()
            ));
            ui::kv("Program", &written.program.display().to_string());
            ui::kv("Settings", &written.settings.display().to_string());
        }
        RenderFormat::Json => {
            let path = write_snapshot(deployment, &dir)?;
            ui::success(&format!("Snapshot written to {}", path.display()));
            if !ctx.quiet {
                ui::dim(&format!(
                    "Compare later with: eksplat diff --against {}",
                    path.display()
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StackConfig;
    use crate::platform;

    #[test]
    fn test_write_yaml_files() {
        let dir = tempfile::tempdir().unwrap();
        let deployment = platform::build(&StackConfig::default()).unwrap();

        let written = write_yaml(&deployment, dir.path(), "qa").unwrap();

        assert_eq!(written.program, dir.path().join("Pulumi.yaml"));
        assert_eq!(written.settings, dir.path().join("Pulumi.qa.yaml"));

        let program = fs::read_to_string(&written.program).unwrap();
        assert!(program.contains("name: microservices-platform"));
        assert!(program.contains("runtime: yaml"));
        assert!(program.contains("helm_release_kong:"));

        let settings = fs::read_to_string(&written.settings).unwrap();
        assert!(settings.contains("aws:region"));
        assert!(settings.contains("us-west-2"));
    }

    #[test]
    fn test_snapshot_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let deployment = platform::build(&StackConfig::default()).unwrap();

        let path = write_snapshot(&deployment, &dir.path().join("nested")).unwrap();
        let snapshot = manifest::read_snapshot(&path).unwrap();

        assert_eq!(snapshot.fingerprint, deployment.fingerprint().unwrap());
        assert_eq!(snapshot.declarations.len(), deployment.graph.len());
    }

    #[test]
    fn test_run_into_out_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("test.toml");
        fs::write(&config, "").unwrap();

        let ctx = crate::commands::test_context(Some(config));
        let args = RenderArgs {
            out: Some(dir.path().join("out")),
            format: RenderFormat::Json,
            stdout: false,
        };
        run(&ctx, args).unwrap();

        assert!(dir.path().join("out").join(SNAPSHOT_FILE).exists());
    }

    #[test]
    fn test_program_carries_every_edge() {
        let deployment = platform::build(&StackConfig::default()).unwrap();
        let program = manifest::render_program(&deployment).unwrap();

        assert_eq!(program.resources.len(), deployment.graph.len());
        for declaration in deployment.graph.iter() {
            let resource = &program.resources[&declaration.id.symbol()];
            let depends_on: Vec<String> = declaration
                .depends_on
                .iter()
                .map(|d| d.interpolation())
                .collect();

            assert_eq!(resource.options.depends_on, depends_on, "{}", declaration.id);
            assert_eq!(
                resource.options.provider,
                declaration.provider.as_ref().map(|p| p.interpolation()),
                "{}",
                declaration.id
            );
            if declaration.kind().is_in_cluster() {
                assert_eq!(
                    resource.options.provider.as_deref(),
                    Some("${provider_k8s_provider}")
                );
            }
        }

        let text = manifest::to_yaml(&program).unwrap();
        assert!(text.contains("dependsOn:"));
        assert!(text.contains("${helm_release_istio_base}"));
    }
}
