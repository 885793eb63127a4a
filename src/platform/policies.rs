//! Pod-to-pod network policies for the logging and tracing namespaces

use declarative::{Declaration, Kind, ResourceGraph, ResourceId, Result};
use serde_json::{Value, json};

const ELASTICSEARCH_PORT: u16 = 9200;

pub fn declare(
    graph: &mut ResourceGraph,
    k8s: &ResourceId,
    logging: &ResourceId,
    observability: &ResourceId,
) -> Result<()> {
    let elasticsearch = json!({ "matchLabels": { "app": "elasticsearch-master" } });
    let es_port = json!([{ "protocol": "TCP", "port": ELASTICSEARCH_PORT }]);

    let policies = [
        (
            "logging-deny-ingress",
            "deny-all-ingress",
            logging,
            deny_all(),
        ),
        (
            "logging-allow-fluent-to-es",
            "allow-fluent-to-elasticsearch",
            logging,
            allow(
                &elasticsearch,
                json!({ "podSelector": { "matchLabels": { "app.kubernetes.io/name": "fluent-bit" } } }),
                Some(&es_port),
            ),
        ),
        (
            "logging-allow-kibana-to-es",
            "allow-kibana-to-elasticsearch",
            logging,
            allow(
                &elasticsearch,
                json!({ "podSelector": { "matchLabels": { "app": "kibana" } } }),
                Some(&es_port),
            ),
        ),
        (
            "observability-deny-ingress",
            "deny-all-ingress",
            observability,
            deny_all(),
        ),
        (
            "observability-allow-istio-to-jaeger",
            "allow-istio-to-jaeger",
            observability,
            // any pod in a mesh-injected namespace may send spans
            allow(
                &json!({ "matchLabels": { "app": "jaeger" } }),
                json!({ "namespaceSelector": { "matchLabels": { "istio-injection": "enabled" } } }),
                None,
            ),
        ),
    ];

    for (name, policy_name, ns, spec) in policies {
        graph.add(
            Declaration::new(Kind::NetworkPolicy, name)
                .with_params(json!({
                    "metadata": {
                        "name": policy_name,
                        "namespace": ns.property("metadata.name").value(),
                    },
                    "spec": spec,
                }))?
                .provider(k8s)
                .depends_on(ns),
        )?;
    }
    Ok(())
}

/// Deny all ingress to every pod in the namespace
fn deny_all() -> Value {
    json!({
        "podSelector": {},
        "policyTypes": ["Ingress"],
    })
}

/// Allow ingress to `selector` from one peer, optionally on given ports only
fn allow(selector: &Value, peer: Value, ports: Option<&Value>) -> Value {
    let mut rule = json!({ "from": [peer] });
    if let Some(ports) = ports {
        rule["ports"] = ports.clone();
    }
    json!({
        "podSelector": selector,
        "policyTypes": ["Ingress"],
        "ingress": [rule],
    })
}
