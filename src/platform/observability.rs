//! Distributed tracing: Jaeger operator and a production Jaeger instance

use declarative::{Declaration, Kind, ResourceGraph, ResourceId, Result};
use serde_json::json;

use super::{Chart, namespace, release};

pub fn declare(
    graph: &mut ResourceGraph,
    k8s: &ResourceId,
    elasticsearch: &ResourceId,
) -> Result<ResourceId> {
    let ns = namespace(graph, k8s, "observability", &[("istio-injection", "enabled")])?;

    let operator = release(
        graph,
        k8s,
        &ns,
        Chart {
            release: "jaeger-operator",
            chart: "jaeger-operator",
            version: "2.57.0",
            repo: "https://jaegertracing.github.io/helm-charts",
            values: json!({ "rbac": { "create": true } }),
        },
        &[&ns],
    )?;

    // spans are stored in the logging stack's Elasticsearch
    graph.add(
        Declaration::new(Kind::CustomResource, "jaeger-instance")
            .with_params(json!({
                "apiVersion": "jaegertracing.io/v1",
                "kind": "Jaeger",
                "metadata": {
                    "name": "jaeger",
                    "namespace": ns.property("metadata.name").value(),
                },
                "spec": {
                    "strategy": "production",
                    "storage": {
                        "type": "elasticsearch",
                        "options": {
                            "es": {
                                "server-urls": "http://elasticsearch-master.logging:9200",
                                "index-prefix": "jaeger",
                            },
                        },
                    },
                    "ingress": { "enabled": true },
                    "query": { "serviceType": "LoadBalancer" },
                },
            }))?
            .provider(k8s)
            .depends_on(&operator)
            .depends_on(elasticsearch),
    )?;

    Ok(ns)
}
