//! Prometheus operator, Grafana and Alertmanager via kube-prometheus-stack

use declarative::{ResourceGraph, ResourceId, Result};
use serde_json::{Value, json};

use super::{Chart, namespace, release, resources};

/// Grafana.com dashboards provisioned on startup: (key, gnetId, revision)
const DASHBOARDS: [(&str, u32, u32); 4] = [
    ("istio-mesh", 7639, 183),
    ("istio-service", 7636, 183),
    ("istio-workload", 7630, 183),
    ("kubernetes-cluster", 7249, 1),
];

pub fn declare(graph: &mut ResourceGraph, k8s: &ResourceId) -> Result<ResourceId> {
    let ns = namespace(graph, k8s, "monitoring", &[])?;

    release(
        graph,
        k8s,
        &ns,
        Chart {
            release: "kube-prometheus-stack",
            chart: "kube-prometheus-stack",
            version: "67.7.0",
            repo: "https://prometheus-community.github.io/helm-charts",
            values: json!({
                "prometheus": {
                    "prometheusSpec": {
                        "retention": "30d",
                        "resources": resources("500m", "2Gi", "1000m", "4Gi"),
                        "storageSpec": {
                            "volumeClaimTemplate": {
                                "spec": {
                                    "accessModes": ["ReadWriteOnce"],
                                    "resources": { "requests": { "storage": "50Gi" } },
                                },
                            },
                        },
                        // pick up Istio's service and pod monitors
                        "serviceMonitorSelectorNilUsesHelmValues": false,
                        "podMonitorSelectorNilUsesHelmValues": false,
                    },
                },
                "grafana": grafana(),
                "alertmanager": { "enabled": true },
            }),
        },
        &[&ns],
    )
}

fn grafana() -> Value {
    let dashboards: serde_json::Map<String, Value> = DASHBOARDS
        .iter()
        .map(|(key, gnet_id, revision)| {
            (
                (*key).to_string(),
                json!({ "gnetId": gnet_id, "revision": revision, "datasource": "Prometheus" }),
            )
        })
        .collect();

    json!({
        "enabled": true,
        "adminPassword": "admin",
        "service": { "type": "LoadBalancer" },
        "resources": resources("250m", "512Mi", "500m", "1Gi"),
        "dashboardProviders": {
            "dashboardproviders.yaml": {
                "apiVersion": 1,
                "providers": [{
                    "name": "default",
                    "orgId": 1,
                    "folder": "",
                    "type": "file",
                    "disableDeletion": false,
                    "editable": true,
                    "options": { "path": "/var/lib/grafana/dashboards/default" },
                }],
            },
        },
        "dashboards": { "default": dashboards },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{Declaration, Kind};

    #[test]
    fn test_stack_values() {
        let mut graph = ResourceGraph::new();
        let k8s = graph
            .add(Declaration::new(Kind::Provider, "k8s-provider"))
            .unwrap();
        let stack = declare(&mut graph, &k8s).unwrap();

        let values = &graph.get(&stack).unwrap().params["values"];
        assert_eq!(values["prometheus"]["prometheusSpec"]["retention"], json!("30d"));
        assert_eq!(
            values["grafana"]["dashboards"]["default"]["istio-mesh"]["gnetId"],
            json!(7639)
        );
        assert_eq!(
            values["grafana"]["dashboards"]["default"]
                .as_object()
                .unwrap()
                .len(),
            4
        );
        assert_eq!(values["alertmanager"]["enabled"], json!(true));
    }
}
