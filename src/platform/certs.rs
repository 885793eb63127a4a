//! cert-manager with Let's Encrypt staging and production issuers

use declarative::{Declaration, Kind, ResourceGraph, ResourceId, Result};
use serde_json::json;

use super::{Chart, namespace, release, resources};

/// ACME directories, keyed by issuer name
const ISSUERS: [(&str, &str); 2] = [
    (
        "letsencrypt-staging",
        "https://acme-staging-v02.api.letsencrypt.org/directory",
    ),
    (
        "letsencrypt-prod",
        "https://acme-v02.api.letsencrypt.org/directory",
    ),
];

pub fn declare(graph: &mut ResourceGraph, k8s: &ResourceId, email: &str) -> Result<ResourceId> {
    let ns = namespace(graph, k8s, "cert-manager", &[])?;

    let cert_manager = release(
        graph,
        k8s,
        &ns,
        Chart {
            release: "cert-manager",
            chart: "cert-manager",
            version: "v1.16.2",
            repo: "https://charts.jetstack.io",
            values: json!({
                "crds": { "enabled": true },
                "global": { "leaderElection": { "namespace": "cert-manager" } },
                "resources": resources("100m", "128Mi", "200m", "256Mi"),
            }),
        },
        &[&ns],
    )?;

    for (name, server) in ISSUERS {
        graph.add(cluster_issuer(name, server, email)?.provider(k8s).depends_on(&cert_manager))?;
    }

    Ok(cert_manager)
}

/// HTTP-01 solved through the Kong ingress class
fn cluster_issuer(name: &str, server: &str, email: &str) -> Result<Declaration> {
    Declaration::new(Kind::CustomResource, name).with_params(json!({
        "apiVersion": "cert-manager.io/v1",
        "kind": "ClusterIssuer",
        "metadata": { "name": name },
        "spec": {
            "acme": {
                "server": server,
                "email": email,
                "privateKeySecretRef": { "name": name },
                "solvers": [
                    { "http01": { "ingress": { "class": "kong" } } },
                ],
            },
        },
    }))
}
