//! Error types for the declarative crate

use crate::types::ResourceId;
use thiserror::Error;

/// Errors found while building or checking a resource graph
#[derive(Error, Debug)]
pub enum GraphError {
    /// Two declarations share (kind, name)
    #[error("duplicate declaration: {0}")]
    Duplicate(ResourceId),

    /// Two declarations map to the same program symbol
    #[error("{first} and {second} share the program symbol '{symbol}'")]
    SymbolCollision {
        symbol: String,
        first: ResourceId,
        second: ResourceId,
    },

    /// An explicit edge names a declaration that does not exist
    #[error("{from} depends on {missing}, which is not declared")]
    UnknownPredecessor { from: ResourceId, missing: ResourceId },

    /// An interpolation names a symbol that does not exist
    #[error("{from} references '${{{symbol}}}', which is not declared")]
    UnknownReference { from: ResourceId, symbol: String },

    /// An output points at a declaration that does not exist
    #[error("output '{output}' references {target}, which is not declared")]
    UnknownOutputTarget { output: String, target: ResourceId },

    /// The graph contains a cycle; the path starts and ends on the same node
    #[error("dependency cycle: {}", format_cycle(.0))]
    Cycle(Vec<ResourceId>),

    /// A kind name that is not one of the supported kinds
    #[error("unknown resource kind '{0}'")]
    UnknownKind(String),

    /// Parameters must be a JSON object
    #[error("parameters of {0} must be an object")]
    ParamsNotObject(ResourceId),

    /// Snapshot or fingerprint serialization failed
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn format_cycle(path: &[ResourceId]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;
