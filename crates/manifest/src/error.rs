//! Error types for the manifest crate

use declarative::{GraphError, ResourceId};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while rendering or writing a program
#[derive(Error, Debug)]
pub enum Error {
    /// The deployment failed validation
    #[error("invalid deployment: {0}")]
    Graph(#[from] GraphError),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A custom resource lacks a field its type token is built from
    #[error("{id} is missing '{field}', needed for its type token")]
    MissingTypeField { id: ResourceId, field: &'static str },

    /// Failed to read or write a file
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for manifest operations
pub type Result<T> = std::result::Result<T, Error>;
