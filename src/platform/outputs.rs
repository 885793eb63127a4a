//! Values exported once the engine has applied the platform

use declarative::{OutputSet, ResourceId};

use crate::config::StackConfig;

/// Deferred outputs: (name, property path)
const NETWORK_OUTPUTS: [(&str, &str); 3] = [
    ("vpc_id", "vpcId"),
    ("public_subnet_ids", "publicSubnetIds"),
    ("private_subnet_ids", "privateSubnetIds"),
];

const CLUSTER_OUTPUTS: [(&str, &str); 6] = [
    ("cluster_name", "eksCluster.name"),
    ("cluster_endpoint", "eksCluster.endpoint"),
    ("cluster_security_group_id", "clusterSecurityGroup.id"),
    ("kubeconfig", "kubeconfig"),
    ("oidc_provider_arn", "core.oidcProvider.arn"),
    ("oidc_provider_url", "core.oidcProvider.url"),
];

pub fn declare(outputs: &mut OutputSet, config: &StackConfig, vpc: &ResourceId, cluster: &ResourceId) {
    outputs.literal("vpc_cidr", config.vpc_cidr.as_str());
    outputs.literal("aws_region", config.region.as_str());

    for (name, path) in NETWORK_OUTPUTS {
        outputs.deferred(name, vpc.property(path));
    }
    for (name, path) in CLUSTER_OUTPUTS {
        outputs.deferred(name, cluster.property(path));
    }
}
