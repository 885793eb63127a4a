//! The platform topology
//!
//! `build` walks a fixed, hand-ordered sequence of declarations: the network,
//! the cluster and its API client, then every cluster add-on. It is a pure
//! function of the stack configuration; nothing here talks to AWS or the
//! cluster.

mod certs;
mod cluster;
mod gateway;
mod gitops;
mod logging;
mod mesh;
mod monitoring;
mod network;
mod observability;
mod outputs;
mod policies;

use declarative::{Declaration, Deployment, Kind, ResourceGraph, ResourceId, Result};
use serde_json::{Map, Value, json};

use crate::config::StackConfig;

/// Project name the engine files stacks under
pub const PROJECT: &str = "microservices-platform";

pub const DESCRIPTION: &str =
    "Complete Kubernetes platform on AWS EKS with service mesh, observability and GitOps";

/// Declare the whole platform for one stack configuration
pub fn build(config: &StackConfig) -> Result<Deployment> {
    let mut deployment = Deployment::new(PROJECT, DESCRIPTION);
    deployment
        .stack_settings
        .insert("aws:region".to_string(), json!(config.region));

    let graph = &mut deployment.graph;
    let vpc = network::declare(graph, config)?;
    let eks = cluster::declare(graph, config, &vpc)?;
    let k8s = &eks.provider;

    mesh::declare(graph, k8s)?;
    let logs = logging::declare(graph, k8s)?;
    let tracing = observability::declare(graph, k8s, &logs.elasticsearch)?;
    gateway::declare(graph, k8s)?;
    certs::declare(graph, k8s, &config.letsencrypt_email)?;
    policies::declare(graph, k8s, &logs.namespace, &tracing)?;
    monitoring::declare(graph, k8s)?;
    gitops::declare(graph, k8s)?;

    outputs::declare(&mut deployment.outputs, config, &vpc, &eks.cluster);

    log::debug!(
        "declared {} resources and {} outputs",
        deployment.graph.len(),
        deployment.outputs.len()
    );
    Ok(deployment)
}

/// Standard tags carried by the AWS-side resources
fn tags(name: &str) -> Value {
    json!({
        "Name": name,
        "Project": PROJECT,
        "ManagedBy": "Pulumi",
    })
}

/// Declare a namespace labelled with its own name plus `labels`
fn namespace(
    graph: &mut ResourceGraph,
    provider: &ResourceId,
    name: &str,
    labels: &[(&str, &str)],
) -> Result<ResourceId> {
    let mut all_labels = Map::new();
    all_labels.insert("name".to_string(), json!(name));
    for (key, value) in labels {
        all_labels.insert((*key).to_string(), json!(value));
    }

    graph.add(
        Declaration::new(Kind::Namespace, name)
            .with_params(json!({
                "metadata": { "name": name, "labels": all_labels },
            }))?
            .provider(provider),
    )
}

/// A Helm chart installed as a release
struct Chart<'a> {
    release: &'a str,
    chart: &'a str,
    version: &'a str,
    repo: &'a str,
    values: Value,
}

/// Declare a release into `namespace`, waiting on `after`
///
/// The namespace name is passed by reference so the engine sees the edge
/// even when `after` names something else.
fn release(
    graph: &mut ResourceGraph,
    provider: &ResourceId,
    namespace: &ResourceId,
    chart: Chart<'_>,
    after: &[&ResourceId],
) -> Result<ResourceId> {
    let mut declaration = Declaration::new(Kind::HelmRelease, chart.release)
        .param("chart", chart.chart)
        .param("version", chart.version)
        .param("namespace", namespace.property("metadata.name"))
        .param("repositoryOpts", json!({ "repo": chart.repo }))
        .param("skipAwait", false)
        .provider(provider);
    if !chart.values.is_null() {
        declaration = declaration.param("values", chart.values);
    }
    for predecessor in after {
        declaration = declaration.depends_on(predecessor);
    }
    graph.add(declaration)
}

/// Requests/limits block used throughout the chart values
fn resources(request_cpu: &str, request_mem: &str, limit_cpu: &str, limit_mem: &str) -> Value {
    json!({
        "requests": { "cpu": request_cpu, "memory": request_mem },
        "limits": { "cpu": limit_cpu, "memory": limit_mem },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn platform() -> Deployment {
        build(&StackConfig::default()).unwrap()
    }

    fn id(kind: Kind, name: &str) -> ResourceId {
        ResourceId::new(kind, name)
    }

    #[test]
    fn test_platform_is_valid() {
        let deployment = platform();
        deployment.validate().unwrap();
        assert!(!deployment.graph.waves().unwrap().is_empty());
    }

    #[test]
    fn test_declaration_counts() {
        let graph = platform().graph;
        assert_eq!(graph.count_kind(Kind::Network), 1);
        assert_eq!(graph.count_kind(Kind::Cluster), 1);
        assert_eq!(graph.count_kind(Kind::Provider), 1);
        assert_eq!(graph.count_kind(Kind::Namespace), 7);
        assert_eq!(graph.count_kind(Kind::HelmRelease), 11);
        assert_eq!(graph.count_kind(Kind::CustomResource), 3);
        assert_eq!(graph.count_kind(Kind::NetworkPolicy), 5);
        assert_eq!(graph.len(), 29);
    }

    #[test]
    fn test_every_predecessor_exists() {
        let graph = platform().graph;
        for declaration in graph.iter() {
            for predecessor in graph.predecessors(&declaration.id) {
                assert!(graph.contains(predecessor), "{predecessor} is missing");
            }
            for symbol in declaration.references() {
                assert!(graph.get_by_symbol(&symbol).is_some(), "{symbol} is missing");
            }
        }
    }

    #[test]
    fn test_waves_respect_every_edge() {
        let deployment = platform();
        let graph = &deployment.graph;
        let waves = graph.waves().unwrap();

        let mut seen: HashSet<&ResourceId> = HashSet::new();
        for wave in &waves {
            for declaration in wave {
                for predecessor in graph.predecessors(&declaration.id) {
                    assert!(
                        seen.contains(predecessor),
                        "{} placed before {predecessor}",
                        declaration.id
                    );
                }
            }
            seen.extend(wave.iter().map(|d| &d.id));
        }
        assert_eq!(seen.len(), graph.len());
    }

    #[test]
    fn test_construction_is_deterministic() {
        let a = platform();
        let b = platform();
        assert_eq!(a.snapshot().unwrap(), b.snapshot().unwrap());
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }

    #[test]
    fn test_configuration_changes_fingerprint() {
        let other = StackConfig {
            desired_capacity: 4,
            ..Default::default()
        };
        assert_ne!(
            platform().fingerprint().unwrap(),
            build(&other).unwrap().fingerprint().unwrap()
        );
    }

    #[test]
    fn test_kubernetes_side_uses_provider() {
        let graph = platform().graph;
        let provider = id(Kind::Provider, "k8s-provider");
        for declaration in graph.iter().filter(|d| d.kind().is_in_cluster()) {
            assert_eq!(declaration.provider.as_ref(), Some(&provider), "{}", declaration.id);
        }
        assert_eq!(
            graph.get(&provider).unwrap().params["kubeconfig"],
            json!("${cluster_microservices_cluster.kubeconfigJson}")
        );
    }

    #[test]
    fn test_releases_reference_their_namespace() {
        let graph = platform().graph;
        let istiod = graph.get(&id(Kind::HelmRelease, "istiod")).unwrap();
        assert_eq!(
            istiod.params["namespace"],
            json!("${namespace_istio_system.metadata.name}")
        );
        assert_eq!(istiod.params["skipAwait"], json!(false));
        assert_eq!(istiod.depends_on, vec![id(Kind::HelmRelease, "istio-base")]);
    }

    #[test]
    fn test_stack_settings_carry_region() {
        let config = StackConfig {
            region: "eu-west-1".to_string(),
            ..Default::default()
        };
        let deployment = build(&config).unwrap();
        assert_eq!(deployment.stack_settings["aws:region"], json!("eu-west-1"));
    }

    #[test]
    fn test_cluster_name_follows_config() {
        let config = StackConfig {
            cluster_name: "staging".to_string(),
            ..Default::default()
        };
        let graph = build(&config).unwrap().graph;
        let cluster = graph.get(&id(Kind::Cluster, "staging")).unwrap();
        assert_eq!(cluster.params["tags"]["Name"], json!("staging"));
    }
}
