//! Argo CD for GitOps delivery

use declarative::{ResourceGraph, ResourceId, Result};
use serde_json::json;

use super::{Chart, namespace, release, resources};

pub fn declare(graph: &mut ResourceGraph, k8s: &ResourceId) -> Result<ResourceId> {
    let ns = namespace(graph, k8s, "argocd", &[])?;

    release(
        graph,
        k8s,
        &ns,
        Chart {
            release: "argocd",
            chart: "argo-cd",
            version: "7.7.12",
            repo: "https://argoproj.github.io/argo-helm",
            values: json!({
                "global": { "domain": "argocd.example.com" },
                // TLS terminates at the load balancer
                "server": {
                    "service": { "type": "LoadBalancer" },
                    "extraArgs": ["--insecure"],
                    "resources": resources("250m", "512Mi", "500m", "1Gi"),
                },
                "controller": { "resources": resources("500m", "1Gi", "1000m", "2Gi") },
                "repoServer": { "resources": resources("250m", "512Mi", "500m", "1Gi") },
                "dex": { "enabled": false },
                "configs": { "params": { "server.insecure": true } },
            }),
        },
        &[&ns],
    )
}
