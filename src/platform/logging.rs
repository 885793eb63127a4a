//! Log pipeline: Elasticsearch storage, Kibana UI, Fluent Bit collectors

use declarative::{ResourceGraph, ResourceId, Result};
use serde_json::json;

use super::{Chart, namespace, release, resources};

const ELASTIC_VERSION: &str = "8.5.1";
const ELASTIC_REPO: &str = "https://helm.elastic.co";

/// Fluent Bit ships everything to Elasticsearch in Logstash format
const FLUENT_OUTPUTS: &str = "[OUTPUT]
    Name es
    Match *
    Host elasticsearch-master
    Port 9200
    Logstash_Format On
    Logstash_Prefix kubernetes
    Retry_Limit False
";

pub struct Logging {
    pub namespace: ResourceId,
    pub elasticsearch: ResourceId,
}

pub fn declare(graph: &mut ResourceGraph, k8s: &ResourceId) -> Result<Logging> {
    let ns = namespace(graph, k8s, "logging", &[("istio-injection", "enabled")])?;

    let elasticsearch = release(
        graph,
        k8s,
        &ns,
        Chart {
            release: "elasticsearch",
            chart: "elasticsearch",
            version: ELASTIC_VERSION,
            repo: ELASTIC_REPO,
            values: json!({
                "replicas": 3,
                "minimumMasterNodes": 2,
                "resources": resources("1000m", "2Gi", "2000m", "4Gi"),
                "volumeClaimTemplate": {
                    "accessModes": ["ReadWriteOnce"],
                    "resources": { "requests": { "storage": "30Gi" } },
                },
            }),
        },
        &[&ns],
    )?;

    release(
        graph,
        k8s,
        &ns,
        Chart {
            release: "kibana",
            chart: "kibana",
            version: ELASTIC_VERSION,
            repo: ELASTIC_REPO,
            values: json!({
                "elasticsearchHosts": "http://elasticsearch-master:9200",
                "resources": resources("500m", "1Gi", "1000m", "2Gi"),
                "service": { "type": "LoadBalancer" },
            }),
        },
        &[&elasticsearch],
    )?;

    release(
        graph,
        k8s,
        &ns,
        Chart {
            release: "fluent-bit",
            chart: "fluent-bit",
            version: "0.47.10",
            repo: "https://fluent.github.io/helm-charts",
            values: json!({
                "config": { "outputs": FLUENT_OUTPUTS },
                "resources": resources("100m", "128Mi", "200m", "256Mi"),
            }),
        },
        &[&elasticsearch],
    )?;

    Ok(Logging {
        namespace: ns,
        elasticsearch,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{Declaration, Kind};

    #[test]
    fn test_consumers_wait_for_elasticsearch() {
        let mut graph = ResourceGraph::new();
        let k8s = graph
            .add(Declaration::new(Kind::Provider, "k8s-provider"))
            .unwrap();
        let logging = declare(&mut graph, &k8s).unwrap();

        for name in ["kibana", "fluent-bit"] {
            let declaration = graph.get(&ResourceId::new(Kind::HelmRelease, name)).unwrap();
            assert_eq!(declaration.depends_on, vec![logging.elasticsearch.clone()]);
            // the namespace edge still comes through the interpolation
            assert!(graph.predecessors(&declaration.id).contains(&&logging.namespace));
        }

        let ns = graph.get(&logging.namespace).unwrap();
        assert_eq!(
            ns.params["metadata"]["labels"]["istio-injection"],
            json!("enabled")
        );
        assert!(
            graph.get(&logging.elasticsearch).unwrap().params["values"]["volumeClaimTemplate"]
                .is_object()
        );
    }
}
