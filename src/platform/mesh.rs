//! Istio service mesh: base CRDs, control plane, ingress gateway

use declarative::{ResourceGraph, ResourceId, Result};
use serde_json::{Value, json};

use super::{Chart, namespace, release};

const VERSION: &str = "1.24.2";
const REPO: &str = "https://istio-release.storage.googleapis.com/charts";

pub fn declare(graph: &mut ResourceGraph, k8s: &ResourceId) -> Result<ResourceId> {
    let ns = namespace(graph, k8s, "istio-system", &[])?;

    let base = release(
        graph,
        k8s,
        &ns,
        Chart {
            release: "istio-base",
            chart: "base",
            version: VERSION,
            repo: REPO,
            values: Value::Null,
        },
        &[&ns],
    )?;

    let istiod = release(
        graph,
        k8s,
        &ns,
        Chart {
            release: "istiod",
            chart: "istiod",
            version: VERSION,
            repo: REPO,
            values: json!({
                "global": { "hub": "docker.io/istio", "tag": VERSION },
                "pilot": {
                    "resources": { "requests": { "cpu": "500m", "memory": "2048Mi" } },
                },
                // traces go to Jaeger
                "meshConfig": {
                    "enableTracing": true,
                    "defaultConfig": { "tracing": { "sampling": 100.0 } },
                },
            }),
        },
        &[&base],
    )?;

    release(
        graph,
        k8s,
        &ns,
        Chart {
            release: "istio-ingress",
            chart: "gateway",
            version: VERSION,
            repo: REPO,
            values: json!({
                "service": {
                    "type": "LoadBalancer",
                    "annotations": {
                        "service.beta.kubernetes.io/aws-load-balancer-type": "nlb",
                    },
                },
            }),
        },
        &[&istiod],
    )?;

    Ok(ns)
}
