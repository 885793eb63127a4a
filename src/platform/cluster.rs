//! Managed EKS cluster and the Kubernetes provider bound to it

use declarative::{Declaration, Kind, ResourceGraph, ResourceId, Result};
use serde_json::json;

use super::tags;
use crate::config::StackConfig;

pub const PROVIDER_NAME: &str = "k8s-provider";

/// Control plane log types shipped to CloudWatch
const LOG_TYPES: [&str; 5] = [
    "api",
    "audit",
    "authenticator",
    "controllerManager",
    "scheduler",
];

pub struct Eks {
    pub cluster: ResourceId,
    /// Every in-cluster declaration goes through this provider
    pub provider: ResourceId,
}

pub fn declare(graph: &mut ResourceGraph, config: &StackConfig, vpc: &ResourceId) -> Result<Eks> {
    let cluster = graph.add(
        Declaration::new(Kind::Cluster, config.cluster_name.as_str()).with_params(json!({
            "vpcId": vpc.property("vpcId").value(),
            "publicSubnetIds": vpc.property("publicSubnetIds").value(),
            "privateSubnetIds": vpc.property("privateSubnetIds").value(),
            "version": config.k8s_version,
            "instanceType": config.node_instance_type,
            "desiredCapacity": config.desired_capacity,
            "minSize": config.min_size,
            "maxSize": config.max_size,
            "enabledClusterLogTypes": LOG_TYPES,
            // IAM roles for service accounts
            "createOidcProvider": true,
            "endpointPrivateAccess": true,
            "endpointPublicAccess": true,
            "tags": tags(&config.cluster_name),
        }))?,
    )?;

    let provider = graph.add(
        Declaration::new(Kind::Provider, PROVIDER_NAME)
            .param("kubeconfig", cluster.property("kubeconfigJson")),
    )?;

    Ok(Eks { cluster, provider })
}
