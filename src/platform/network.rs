//! VPC with public and private subnets across three availability zones

use declarative::{Declaration, Kind, ResourceGraph, ResourceId, Result};
use serde_json::json;

use super::tags;
use crate::config::StackConfig;

pub const VPC_NAME: &str = "microservices-vpc";

/// Private subnets hold nodes and pods; public ones hold load balancers and the NAT gateway
pub fn declare(graph: &mut ResourceGraph, config: &StackConfig) -> Result<ResourceId> {
    graph.add(Declaration::new(Kind::Network, VPC_NAME).with_params(json!({
        "cidrBlock": config.vpc_cidr,
        "numberOfAvailabilityZones": 3,
        "natGateways": { "strategy": "Single" },
        "subnetStrategy": "Auto",
        "subnetSpecs": [
            {
                "type": "Private",
                "cidrMask": 19,
                "tags": { "kubernetes.io/role/internal-elb": "1" },
            },
            {
                "type": "Public",
                "cidrMask": 22,
                "tags": { "kubernetes.io/role/elb": "1" },
            },
        ],
        "tags": tags(VPC_NAME),
    }))?)
}
