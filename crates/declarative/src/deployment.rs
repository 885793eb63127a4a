//! Deployment - a graph, its outputs and the stack-level settings it needs

use crate::error::Result;
use crate::graph::ResourceGraph;
use crate::output::OutputSet;
use crate::resource::Declaration;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Everything submitted to the engine in one go
#[derive(Debug, Clone)]
pub struct Deployment {
    /// Project name the engine files the stack under
    pub project: String,
    pub description: String,
    /// Engine-level settings such as `aws:region`
    pub stack_settings: BTreeMap<String, Value>,
    pub graph: ResourceGraph,
    pub outputs: OutputSet,
}

impl Deployment {
    pub fn new(project: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            description: description.into(),
            stack_settings: BTreeMap::new(),
            graph: ResourceGraph::new(),
            outputs: OutputSet::new(),
        }
    }

    /// Validate the graph and every output target
    pub fn validate(&self) -> Result<()> {
        self.graph.validate()?;
        self.outputs.validate(&self.graph)
    }

    /// BLAKE3 digest of the canonical snapshot, hex encoded
    ///
    /// Identical declarations, outputs and settings give identical digests.
    pub fn fingerprint(&self) -> Result<String> {
        let mut hasher = blake3::Hasher::new();
        serde_json::to_writer(&mut hasher, &self.canonical())?;
        Ok(hasher.finalize().to_hex().to_string())
    }

    /// Serializable form of this deployment, used for diffs between runs
    pub fn snapshot(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            project: self.project.clone(),
            fingerprint: self.fingerprint()?,
            stack_settings: self.stack_settings.clone(),
            declarations: self.graph.declarations().to_vec(),
            outputs: self.outputs.clone(),
        })
    }

    fn canonical(&self) -> Canonical<'_> {
        Canonical {
            project: &self.project,
            stack_settings: &self.stack_settings,
            declarations: self.graph.declarations(),
            outputs: &self.outputs,
        }
    }
}

#[derive(Serialize)]
struct Canonical<'a> {
    project: &'a str,
    stack_settings: &'a BTreeMap<String, Value>,
    declarations: &'a [Declaration],
    outputs: &'a OutputSet,
}

/// A deployment written out as data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub project: String,
    pub fingerprint: String,
    #[serde(default)]
    pub stack_settings: BTreeMap<String, Value>,
    pub declarations: Vec<Declaration>,
    #[serde(default)]
    pub outputs: OutputSet,
}

impl Snapshot {
    /// Rebuild a graph from the snapshot's declarations
    pub fn to_graph(&self) -> Result<ResourceGraph> {
        ResourceGraph::from_declarations(self.declarations.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Kind;
    use serde_json::json;

    fn sample(cidr: &str) -> Deployment {
        let mut deployment = Deployment::new("platform", "test");
        let vpc = deployment
            .graph
            .add(Declaration::new(Kind::Network, "vpc").param("cidrBlock", cidr))
            .unwrap();
        deployment
            .graph
            .add(
                Declaration::new(Kind::Cluster, "c")
                    .param("vpcId", vpc.property("vpcId"))
                    .depends_on(&vpc),
            )
            .unwrap();
        deployment.outputs.literal("vpc_cidr", cidr);
        deployment.outputs.deferred("vpc_id", vpc.property("vpcId"));
        deployment
            .stack_settings
            .insert("aws:region".into(), json!("us-west-2"));
        deployment
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = sample("10.0.0.0/16").fingerprint().unwrap();
        let b = sample("10.0.0.0/16").fingerprint().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_fingerprint_changes_with_params() {
        let a = sample("10.0.0.0/16").fingerprint().unwrap();
        let b = sample("10.1.0.0/16").fingerprint().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_snapshot_survives_json() {
        let deployment = sample("10.0.0.0/16");
        let snapshot = deployment.snapshot().unwrap();

        let text = serde_json::to_string_pretty(&snapshot).unwrap();
        let back: Snapshot = serde_json::from_str(&text).unwrap();
        assert_eq!(back, snapshot);

        let graph = back.to_graph().unwrap();
        assert_eq!(graph.len(), 2);
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_validate_covers_outputs() {
        let mut deployment = sample("10.0.0.0/16");
        let ghost = crate::types::ResourceId::new(Kind::Cluster, "ghost");
        deployment
            .outputs
            .deferred("kubeconfig", ghost.property("kubeconfig"));
        assert!(deployment.validate().is_err());
    }
}
