//! Declarations - the records a graph is made of
//!
//! A declaration describes one piece of desired infrastructure: what it is,
//! the parameters it is created with, and which other declarations must
//! exist before it. Parameters are plain JSON and may embed deferred
//! references (`${symbol.path}`) to properties the engine resolves later.

use crate::error::{GraphError, Result};
use crate::types::{Kind, ResourceId};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// `${symbol}` or `${symbol.path}`; a leading `$$` escapes the interpolation
static INTERPOLATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\$?)\$\{([A-Za-z0-9_]+)(?:[.\[][^}]*)?\}").expect("valid regex")
});

/// One provisioning intent record
///
/// # Example
///
/// ```
/// use declarative::{Declaration, Kind};
/// use serde_json::json;
///
/// let ns = Declaration::new(Kind::Namespace, "logging")
///     .with_params(json!({ "metadata": { "name": "logging" } }))
///     .unwrap();
///
/// let release = Declaration::new(Kind::HelmRelease, "elasticsearch")
///     .param("chart", "elasticsearch")
///     .param("namespace", ns.id.property("metadata.name"))
///     .depends_on(&ns.id);
///
/// assert_eq!(release.references(), vec!["namespace_logging".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    pub id: ResourceId,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<ResourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ResourceId>,
}

impl Declaration {
    pub fn new(kind: Kind, name: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(kind, name),
            params: Map::new(),
            depends_on: Vec::new(),
            provider: None,
        }
    }

    /// Merge an object of parameters into this declaration
    pub fn with_params(mut self, params: Value) -> Result<Self> {
        match params {
            Value::Object(map) => {
                self.params.extend(map);
                Ok(self)
            }
            _ => Err(GraphError::ParamsNotObject(self.id)),
        }
    }

    /// Set a single parameter
    pub fn param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// Declare an explicit edge from `predecessor` to this declaration
    pub fn depends_on(mut self, predecessor: &ResourceId) -> Self {
        if !self.depends_on.contains(predecessor) {
            self.depends_on.push(predecessor.clone());
        }
        self
    }

    /// Bind this declaration to a provider; the provider is a predecessor too
    pub fn provider(mut self, provider: &ResourceId) -> Self {
        self.provider = Some(provider.clone());
        self
    }

    pub fn kind(&self) -> Kind {
        self.id.kind
    }

    pub fn name(&self) -> &str {
        &self.id.name
    }

    /// Explicit predecessors: the provider first, then `depends_on` in order
    pub fn explicit_predecessors(&self) -> impl Iterator<Item = &ResourceId> {
        self.provider.iter().chain(self.depends_on.iter())
    }

    /// Symbols referenced by interpolations in the parameters, sorted and deduplicated
    pub fn references(&self) -> Vec<String> {
        let mut symbols = BTreeSet::new();
        for value in self.params.values() {
            collect_references(value, &mut symbols);
        }
        symbols.into_iter().collect()
    }

    /// Short human-readable detail for listings
    pub fn summary(&self) -> Option<String> {
        let text = |key: &str| self.params.get(key).and_then(Value::as_str);
        match self.kind() {
            Kind::HelmRelease => {
                let chart = text("chart")?;
                Some(match text("version") {
                    Some(version) => format!("{chart} {version}"),
                    None => chart.to_string(),
                })
            }
            Kind::CustomResource => {
                Some(format!("{} {}", text("apiVersion")?, text("kind")?))
            }
            Kind::Network => text("cidrBlock").map(ToString::to_string),
            Kind::Cluster => text("version").map(|v| format!("Kubernetes {v}")),
            _ => None,
        }
    }
}

fn collect_references(value: &Value, symbols: &mut BTreeSet<String>) {
    match value {
        Value::String(s) => {
            for caps in INTERPOLATION.captures_iter(s) {
                if caps[1].is_empty() {
                    symbols.insert(caps[2].to_string());
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_references(item, symbols);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect_references(item, symbols);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_references_found_in_nested_values() {
        let decl = Declaration::new(Kind::Cluster, "c")
            .with_params(json!({
                "vpcId": "${network_vpc.vpcId}",
                "subnets": ["${network_vpc.privateSubnetIds}", "plain"],
                "nested": { "deep": "prefix-${provider_k8s}-suffix" },
            }))
            .unwrap();

        assert_eq!(decl.references(), vec!["network_vpc", "provider_k8s"]);
    }

    #[test]
    fn test_escaped_interpolation_is_not_a_reference() {
        let decl = Declaration::new(Kind::HelmRelease, "r").param("template", "$${literal}");
        assert!(decl.references().is_empty());
    }

    #[test]
    fn test_adjacent_interpolations_are_all_found() {
        let decl = Declaration::new(Kind::HelmRelease, "r").param("url", "${a_x}${b_y}");
        assert_eq!(decl.references(), vec!["a_x", "b_y"]);
    }

    #[test]
    fn test_index_paths_are_references() {
        let decl = Declaration::new(Kind::HelmRelease, "r").param("first", "${network_vpc[0]}");
        assert_eq!(decl.references(), vec!["network_vpc"]);
    }

    #[test]
    fn test_with_params_rejects_non_object() {
        let result = Declaration::new(Kind::Namespace, "ns").with_params(json!(["a"]));
        assert!(matches!(result, Err(GraphError::ParamsNotObject(_))));
    }

    #[test]
    fn test_depends_on_deduplicates() {
        let ns = ResourceId::new(Kind::Namespace, "ns");
        let decl = Declaration::new(Kind::HelmRelease, "r")
            .depends_on(&ns)
            .depends_on(&ns);
        assert_eq!(decl.depends_on.len(), 1);
    }

    #[test]
    fn test_explicit_predecessors_put_provider_first() {
        let provider = ResourceId::new(Kind::Provider, "k8s");
        let ns = ResourceId::new(Kind::Namespace, "ns");
        let decl = Declaration::new(Kind::HelmRelease, "r")
            .depends_on(&ns)
            .provider(&provider);

        let preds: Vec<_> = decl.explicit_predecessors().cloned().collect();
        assert_eq!(preds, vec![provider, ns]);
    }

    #[test]
    fn test_summary_for_helm_release() {
        let decl = Declaration::new(Kind::HelmRelease, "kong")
            .param("chart", "kong")
            .param("version", "2.45.0");
        assert_eq!(decl.summary().as_deref(), Some("kong 2.45.0"));

        let ns = Declaration::new(Kind::Namespace, "kong");
        assert_eq!(ns.summary(), None);
    }
}
