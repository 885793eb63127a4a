//! Kong API gateway, DB-less, behind an NLB

use declarative::{ResourceGraph, ResourceId, Result};
use serde_json::json;

use super::{Chart, namespace, release, resources};

pub fn declare(graph: &mut ResourceGraph, k8s: &ResourceId) -> Result<ResourceId> {
    let ns = namespace(graph, k8s, "kong", &[("istio-injection", "enabled")])?;

    release(
        graph,
        k8s,
        &ns,
        Chart {
            release: "kong",
            chart: "kong",
            version: "2.45.0",
            repo: "https://charts.konghq.com",
            values: json!({
                "ingressController": { "enabled": true, "installCRDs": false },
                "proxy": {
                    "type": "LoadBalancer",
                    "annotations": {
                        "service.beta.kubernetes.io/aws-load-balancer-type": "nlb",
                    },
                },
                "env": {
                    "database": "off",
                    "nginx_worker_processes": "2",
                    "proxy_access_log": "/dev/stdout",
                    "admin_access_log": "/dev/stdout",
                    "admin_gui_access_log": "/dev/stdout",
                    "portal_api_access_log": "/dev/stdout",
                    "proxy_error_log": "/dev/stderr",
                    "admin_error_log": "/dev/stderr",
                    "admin_gui_error_log": "/dev/stderr",
                    "portal_api_error_log": "/dev/stderr",
                },
                "resources": resources("500m", "512Mi", "1000m", "1Gi"),
            }),
        },
        &[&ns],
    )
}
