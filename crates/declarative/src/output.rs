//! Deployment outputs - named values exported once the engine has applied the graph

use crate::error::{GraphError, Result};
use crate::graph::ResourceGraph;
use crate::types::PropertyRef;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Value of an exported output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputValue {
    /// Known when the graph is built (e.g. a configured address range)
    Literal(Value),
    /// Opaque until the engine applies the graph
    Deferred(PropertyRef),
}

impl OutputValue {
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }
}

/// An output as seen after asking the engine for its values
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Known(Value),
    /// Not applied yet, or the engine did not report it
    Pending,
}

/// Named outputs, ordered by name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputSet {
    entries: BTreeMap<String, OutputValue>,
}

impl OutputSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn literal(&mut self, name: &str, value: impl Into<Value>) {
        self.entries
            .insert(name.to_string(), OutputValue::Literal(value.into()));
    }

    pub fn deferred(&mut self, name: &str, reference: PropertyRef) {
        self.entries
            .insert(name.to_string(), OutputValue::Deferred(reference));
    }

    pub fn get(&self, name: &str) -> Option<&OutputValue> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &OutputValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every deferred output must point at a declaration in the graph
    pub fn validate(&self, graph: &ResourceGraph) -> Result<()> {
        for (name, value) in &self.entries {
            if let OutputValue::Deferred(reference) = value
                && !graph.contains(&reference.target)
            {
                return Err(GraphError::UnknownOutputTarget {
                    output: name.clone(),
                    target: reference.target.clone(),
                });
            }
        }
        Ok(())
    }

    /// Pair each output with what the engine reported for it
    ///
    /// A reported value always wins, literals included. Otherwise literals
    /// are known from the current configuration and deferred outputs stay
    /// pending.
    pub fn resolve(&self, reported: &Map<String, Value>) -> Vec<(&str, Resolution)> {
        self.entries
            .iter()
            .map(|(name, value)| {
                let resolution = match (reported.get(name), value) {
                    (Some(v), _) => Resolution::Known(v.clone()),
                    (None, OutputValue::Literal(v)) => Resolution::Known(v.clone()),
                    (None, OutputValue::Deferred(_)) => Resolution::Pending,
                };
                (name.as_str(), resolution)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Declaration;
    use crate::types::{Kind, ResourceId};
    use serde_json::json;

    fn cluster() -> ResourceId {
        ResourceId::new(Kind::Cluster, "microservices-cluster")
    }

    #[test]
    fn test_validate_rejects_unknown_target() {
        let mut outputs = OutputSet::new();
        outputs.deferred("cluster_endpoint", cluster().property("eksCluster.endpoint"));

        let graph = ResourceGraph::new();
        assert!(matches!(
            outputs.validate(&graph),
            Err(GraphError::UnknownOutputTarget { output, .. }) if output == "cluster_endpoint"
        ));

        let mut graph = ResourceGraph::new();
        graph
            .add(Declaration::new(Kind::Cluster, "microservices-cluster"))
            .unwrap();
        assert!(outputs.validate(&graph).is_ok());
    }

    #[test]
    fn test_resolve_before_and_after_apply() {
        let mut outputs = OutputSet::new();
        outputs.literal("vpc_cidr", "10.0.0.0/16");
        outputs.deferred("cluster_endpoint", cluster().property("eksCluster.endpoint"));

        let before = outputs.resolve(&Map::new());
        assert_eq!(
            before,
            vec![
                ("cluster_endpoint", Resolution::Pending),
                ("vpc_cidr", Resolution::Known(json!("10.0.0.0/16"))),
            ]
        );

        let mut reported = Map::new();
        reported.insert("cluster_endpoint".into(), json!("https://abc.eks.amazonaws.com"));
        let after = outputs.resolve(&reported);
        assert_eq!(
            after[0],
            (
                "cluster_endpoint",
                Resolution::Known(json!("https://abc.eks.amazonaws.com"))
            )
        );
    }

    #[test]
    fn test_reported_literal_wins_over_config() {
        let mut outputs = OutputSet::new();
        // configuration changed since the last apply
        outputs.literal("vpc_cidr", "10.1.0.0/16");

        let mut reported = Map::new();
        reported.insert("vpc_cidr".into(), json!("10.0.0.0/16"));

        assert_eq!(
            outputs.resolve(&reported),
            vec![("vpc_cidr", Resolution::Known(json!("10.0.0.0/16")))]
        );
        assert_eq!(
            outputs.resolve(&Map::new()),
            vec![("vpc_cidr", Resolution::Known(json!("10.1.0.0/16")))]
        );
    }
}
