//! # Manifest
//!
//! Renders a declarative deployment into a Pulumi YAML program.
//!
//! This crate provides functionality to:
//! - Map each declaration kind to a Pulumi type token
//! - Carry explicit edges into `options.provider` / `options.dependsOn`
//! - Emit deferred outputs as `${symbol.path}` interpolations
//! - Write `Pulumi.yaml` plus the per-stack settings file
//! - Read and write JSON snapshots for diffs between runs
//!
//! ## Example
//!
//! ```no_run
//! use declarative::{Declaration, Deployment, Kind};
//! use std::path::Path;
//!
//! let mut deployment = Deployment::new("platform", "example");
//! deployment.graph.add(Declaration::new(Kind::Namespace, "kong"))?;
//!
//! let program = manifest::render_program(&deployment)?;
//! let settings = manifest::stack_settings(&deployment);
//! let written = manifest::write_program(Path::new("/tmp/platform"), &program, &settings, "dev")?;
//! println!("wrote {}", written.program.display());
//! # Ok::<(), manifest::Error>(())
//! ```

mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
    Program, ProgramResource, ResourceOptions, StackSettings, WrittenFiles,
    PROGRAM_FILE, YAML_RUNTIME,
};

use declarative::{Declaration, Deployment, Kind, OutputValue, Snapshot};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Pulumi type token for a declaration
///
/// Custom resources take their token from their own `apiVersion` and `kind`
/// parameters, e.g. `kubernetes:cert-manager.io/v1:ClusterIssuer`.
pub fn type_token(declaration: &Declaration) -> Result<String> {
    let token = match declaration.kind() {
        Kind::Network => "awsx:ec2:Vpc".to_string(),
        Kind::Cluster => "eks:Cluster".to_string(),
        Kind::Provider => "pulumi:providers:kubernetes".to_string(),
        Kind::Namespace => "kubernetes:core/v1:Namespace".to_string(),
        Kind::HelmRelease => "kubernetes:helm.sh/v3:Release".to_string(),
        Kind::NetworkPolicy => "kubernetes:networking.k8s.io/v1:NetworkPolicy".to_string(),
        Kind::CustomResource => {
            let field = |name: &'static str| {
                declaration
                    .params
                    .get(name)
                    .and_then(Value::as_str)
                    .ok_or_else(|| Error::MissingTypeField {
                        id: declaration.id.clone(),
                        field: name,
                    })
            };
            let api_version = field("apiVersion")?;
            let kind = field("kind")?;
            if api_version.contains('/') {
                format!("kubernetes:{api_version}:{kind}")
            } else {
                format!("kubernetes:core/{api_version}:{kind}")
            }
        }
    };
    Ok(token)
}

/// Render one declaration as a program resource
pub fn render_resource(declaration: &Declaration) -> Result<ProgramResource> {
    let mut properties = declaration.params.clone();
    if declaration.kind() == Kind::CustomResource {
        // carried by the type token instead
        properties.remove("apiVersion");
        properties.remove("kind");
    }

    Ok(ProgramResource {
        type_token: type_token(declaration)?,
        name: declaration.name().to_string(),
        properties,
        options: ResourceOptions {
            provider: declaration.provider.as_ref().map(|p| p.interpolation()),
            depends_on: declaration
                .depends_on
                .iter()
                .map(|d| d.interpolation())
                .collect(),
        },
    })
}

/// Render a whole deployment, validating it first
pub fn render_program(deployment: &Deployment) -> Result<Program> {
    deployment.validate()?;

    let mut resources = BTreeMap::new();
    for declaration in deployment.graph.iter() {
        resources.insert(declaration.id.symbol(), render_resource(declaration)?);
    }

    let outputs = deployment
        .outputs
        .iter()
        .map(|(name, value)| {
            let rendered = match value {
                OutputValue::Literal(v) => v.clone(),
                OutputValue::Deferred(reference) => reference.value(),
            };
            (name.clone(), rendered)
        })
        .collect();

    log::debug!(
        "rendered program '{}' with {} resources",
        deployment.project,
        resources.len()
    );

    Ok(Program {
        name: deployment.project.clone(),
        runtime: YAML_RUNTIME.to_string(),
        description: deployment.description.clone(),
        resources,
        outputs,
    })
}

/// Stack settings for the deployment (`config:` block of `Pulumi.<stack>.yaml`)
pub fn stack_settings(deployment: &Deployment) -> StackSettings {
    StackSettings {
        config: deployment.stack_settings.clone(),
    }
}

/// Serialize any document as YAML
pub fn to_yaml<T: Serialize>(document: &T) -> Result<String> {
    Ok(serde_yaml::to_string(document)?)
}

/// Serialize any document as pretty JSON with a trailing newline
pub fn to_json<T: Serialize>(document: &T) -> Result<String> {
    let mut text = serde_json::to_string_pretty(document)?;
    text.push('\n');
    Ok(text)
}

/// Write `Pulumi.yaml` and `Pulumi.<stack>.yaml` into `dir`
///
/// Creates the directory if needed and overwrites both files.
pub fn write_program(
    dir: &Path,
    program: &Program,
    settings: &StackSettings,
    stack: &str,
) -> Result<WrittenFiles> {
    fs::create_dir_all(dir).map_err(|source| Error::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let program_path = dir.join(PROGRAM_FILE);
    write_file(&program_path, &to_yaml(program)?)?;

    let settings_path = dir.join(StackSettings::file_name(stack));
    write_file(&settings_path, &to_yaml(settings)?)?;

    log::info!("wrote {} and {}", program_path.display(), settings_path.display());
    Ok(WrittenFiles {
        program: program_path,
        settings: settings_path,
    })
}

/// Render a deployment's snapshot as JSON
pub fn snapshot_json(deployment: &Deployment) -> Result<String> {
    to_json(&deployment.snapshot()?)
}

/// Read a snapshot previously written with `snapshot_json`
pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let content = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::ResourceId;
    use serde_json::json;

    fn deployment() -> Deployment {
        let mut deployment = Deployment::new("platform", "test platform");
        let cluster = deployment
            .graph
            .add(Declaration::new(Kind::Cluster, "c").param("version", "1.31"))
            .unwrap();
        let provider = deployment
            .graph
            .add(
                Declaration::new(Kind::Provider, "k8s-provider")
                    .param("kubeconfig", cluster.property("kubeconfigJson")),
            )
            .unwrap();
        let ns = deployment
            .graph
            .add(
                Declaration::new(Kind::Namespace, "cert-manager")
                    .with_params(json!({ "metadata": { "name": "cert-manager" } }))
                    .unwrap()
                    .provider(&provider),
            )
            .unwrap();
        let release = deployment
            .graph
            .add(
                Declaration::new(Kind::HelmRelease, "cert-manager")
                    .param("chart", "cert-manager")
                    .param("namespace", ns.property("metadata.name"))
                    .provider(&provider)
                    .depends_on(&ns),
            )
            .unwrap();
        deployment
            .graph
            .add(
                Declaration::new(Kind::CustomResource, "letsencrypt-prod")
                    .with_params(json!({
                        "apiVersion": "cert-manager.io/v1",
                        "kind": "ClusterIssuer",
                        "metadata": { "name": "letsencrypt-prod" },
                    }))
                    .unwrap()
                    .provider(&provider)
                    .depends_on(&release),
            )
            .unwrap();
        deployment
            .outputs
            .deferred("cluster_endpoint", cluster.property("eksCluster.endpoint"));
        deployment.outputs.literal("aws_region", "us-west-2");
        deployment
            .stack_settings
            .insert("aws:region".into(), json!("us-west-2"));
        deployment
    }

    #[test]
    fn test_type_tokens() {
        let cases = [
            (Kind::Network, "awsx:ec2:Vpc"),
            (Kind::Cluster, "eks:Cluster"),
            (Kind::Provider, "pulumi:providers:kubernetes"),
            (Kind::Namespace, "kubernetes:core/v1:Namespace"),
            (Kind::HelmRelease, "kubernetes:helm.sh/v3:Release"),
            (
                Kind::NetworkPolicy,
                "kubernetes:networking.k8s.io/v1:NetworkPolicy",
            ),
        ];
        for (kind, token) in cases {
            assert_eq!(type_token(&Declaration::new(kind, "x")).unwrap(), token);
        }
    }

    #[test]
    fn test_custom_resource_token() {
        let jaeger = Declaration::new(Kind::CustomResource, "jaeger-instance")
            .param("apiVersion", "jaegertracing.io/v1")
            .param("kind", "Jaeger");
        assert_eq!(
            type_token(&jaeger).unwrap(),
            "kubernetes:jaegertracing.io/v1:Jaeger"
        );

        let core = Declaration::new(Kind::CustomResource, "cm")
            .param("apiVersion", "v1")
            .param("kind", "ConfigMap");
        assert_eq!(type_token(&core).unwrap(), "kubernetes:core/v1:ConfigMap");

        let missing = Declaration::new(Kind::CustomResource, "bad").param("apiVersion", "x/v1");
        assert!(matches!(
            type_token(&missing),
            Err(Error::MissingTypeField { field: "kind", .. })
        ));
    }

    #[test]
    fn test_render_program_carries_edges() {
        let program = render_program(&deployment()).unwrap();

        assert_eq!(program.runtime, "yaml");
        assert_eq!(program.resources.len(), 5);

        let release = &program.resources["helm_release_cert_manager"];
        assert_eq!(release.name, "cert-manager");
        assert_eq!(
            release.options.provider.as_deref(),
            Some("${provider_k8s_provider}")
        );
        assert_eq!(release.options.depends_on, vec!["${namespace_cert_manager}"]);
        assert_eq!(
            release.properties["namespace"],
            json!("${namespace_cert_manager.metadata.name}")
        );

        let issuer = &program.resources["custom_resource_letsencrypt_prod"];
        assert_eq!(issuer.type_token, "kubernetes:cert-manager.io/v1:ClusterIssuer");
        assert!(!issuer.properties.contains_key("apiVersion"));
        assert!(!issuer.properties.contains_key("kind"));

        assert_eq!(
            program.outputs["cluster_endpoint"],
            json!("${cluster_c.eksCluster.endpoint}")
        );
        assert_eq!(program.outputs["aws_region"], json!("us-west-2"));
    }

    #[test]
    fn test_render_rejects_invalid_deployment() {
        let mut bad = deployment();
        let ghost = ResourceId::new(Kind::Namespace, "ghost");
        bad.graph
            .add(Declaration::new(Kind::HelmRelease, "orphan").depends_on(&ghost))
            .unwrap();
        assert!(matches!(render_program(&bad), Err(Error::Graph(_))));
    }

    #[test]
    fn test_yaml_output_shape() {
        let program = render_program(&deployment()).unwrap();
        let yaml = to_yaml(&program).unwrap();

        assert!(yaml.contains("runtime: yaml"));
        assert!(yaml.contains("dependsOn:"));
        // resources without options do not carry an empty block
        let back: Program = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.resources["cluster_c"].type_token, "eks:Cluster");
        assert!(back.resources["cluster_c"].options.is_empty());
        assert_eq!(back, program);
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let a = to_yaml(&render_program(&deployment()).unwrap()).unwrap();
        let b = to_yaml(&render_program(&deployment()).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_write_program_and_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let deployment = deployment();
        let program = render_program(&deployment).unwrap();
        let settings = stack_settings(&deployment);

        let written = write_program(dir.path(), &program, &settings, "prod").unwrap();
        assert!(written.program.ends_with("Pulumi.yaml"));
        assert!(written.settings.ends_with("Pulumi.prod.yaml"));

        let settings_text = fs::read_to_string(&written.settings).unwrap();
        let back: StackSettings = serde_yaml::from_str(&settings_text).unwrap();
        assert_eq!(back.config["aws:region"], json!("us-west-2"));

        let snapshot_path = dir.path().join("snapshot.json");
        fs::write(&snapshot_path, snapshot_json(&deployment).unwrap()).unwrap();
        let snapshot = read_snapshot(&snapshot_path).unwrap();
        assert_eq!(snapshot.declarations.len(), 5);
        assert_eq!(snapshot.fingerprint, deployment.fingerprint().unwrap());
    }

    #[test]
    fn test_read_snapshot_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_snapshot(&dir.path().join("nope.json"));
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
