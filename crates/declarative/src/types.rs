//! Core types for declarative resource graphs

use crate::error::GraphError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Category of a declared resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Kind {
    /// Virtual network with its subnets and gateways
    Network,
    /// Managed Kubernetes cluster
    Cluster,
    /// Client bound to a cluster's API
    Provider,
    /// Kubernetes namespace
    Namespace,
    /// Chart installed as a unit
    HelmRelease,
    /// Instance of a custom resource definition
    CustomResource,
    /// Pod-level traffic policy
    NetworkPolicy,
}

impl Kind {
    /// Every kind, in the order they usually appear in a deployment
    pub const ALL: [Kind; 7] = [
        Kind::Network,
        Kind::Cluster,
        Kind::Provider,
        Kind::Namespace,
        Kind::HelmRelease,
        Kind::CustomResource,
        Kind::NetworkPolicy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Network => "network",
            Kind::Cluster => "cluster",
            Kind::Provider => "provider",
            Kind::Namespace => "namespace",
            Kind::HelmRelease => "helm-release",
            Kind::CustomResource => "custom-resource",
            Kind::NetworkPolicy => "network-policy",
        }
    }

    /// Whether declarations of this kind live inside the cluster
    pub fn is_in_cluster(&self) -> bool {
        matches!(
            self,
            Kind::Namespace | Kind::HelmRelease | Kind::CustomResource | Kind::NetworkPolicy
        )
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Kind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| GraphError::UnknownKind(s.to_string()))
    }
}

/// Identity of a declaration: unique per (kind, name) within a deployment
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceId {
    pub kind: Kind,
    pub name: String,
}

impl ResourceId {
    pub fn new(kind: Kind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    /// Program-level key, safe to use inside `${...}` interpolations
    ///
    /// `helm-release/cert-manager` becomes `helm_release_cert_manager`.
    pub fn symbol(&self) -> String {
        format!("{}_{}", self.kind.as_str(), self.name)
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect()
    }

    /// Interpolation of the resource itself (`${symbol}`)
    pub fn interpolation(&self) -> String {
        format!("${{{}}}", self.symbol())
    }

    /// Deferred reference to one of this resource's properties
    pub fn property(&self, path: &str) -> PropertyRef {
        PropertyRef {
            target: self.clone(),
            path: path.to_string(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// A property of another declaration, only known once the engine applies it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRef {
    pub target: ResourceId,
    pub path: String,
}

impl PropertyRef {
    /// `${symbol.path}`, or `${symbol}` when the path is empty
    pub fn interpolation(&self) -> String {
        if self.path.is_empty() {
            self.target.interpolation()
        } else {
            format!("${{{}.{}}}", self.target.symbol(), self.path)
        }
    }

    /// The reference as a parameter value
    pub fn value(&self) -> Value {
        Value::String(self.interpolation())
    }
}

impl From<PropertyRef> for Value {
    fn from(reference: PropertyRef) -> Self {
        reference.value()
    }
}

/// Options for handing a deployment to an engine
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    /// Stack the engine applies to
    pub stack: String,
    /// Ask the engine for a preview instead of an apply
    pub preview: bool,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            stack: "dev".to_string(),
            preview: false,
        }
    }
}

/// What happened to a submitted deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitOutcome {
    /// The engine applied the graph
    Applied,
    /// The engine computed a preview only
    Previewed,
    /// The user declined; the engine was never called
    Declined,
}

/// Report returned by an engine after a submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReport {
    /// Engine that handled the submission
    pub engine: String,
    pub outcome: SubmitOutcome,
    /// Engine's own summary text, passed through as-is
    pub summary: Option<String>,
}

impl SubmitReport {
    pub fn declined() -> Self {
        Self {
            engine: String::new(),
            outcome: SubmitOutcome::Declined,
            summary: None,
        }
    }

    pub fn is_applied(&self) -> bool {
        self.outcome == SubmitOutcome::Applied
    }
}
