//! Pulumi YAML program types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Runtime name for YAML programs
pub const YAML_RUNTIME: &str = "yaml";

/// File name of the program the engine reads
pub const PROGRAM_FILE: &str = "Pulumi.yaml";

/// A complete Pulumi YAML program (`Pulumi.yaml`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub name: String,
    pub runtime: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub resources: BTreeMap<String, ProgramResource>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, Value>,
}

/// One entry under `resources:`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramResource {
    #[serde(rename = "type")]
    pub type_token: String,
    /// Logical name; the map key is the symbol
    pub name: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
    #[serde(default, skip_serializing_if = "ResourceOptions::is_empty")]
    pub options: ResourceOptions,
}

/// Resource options the program sets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

impl ResourceOptions {
    pub fn is_empty(&self) -> bool {
        self.provider.is_none() && self.depends_on.is_empty()
    }
}

/// Per-stack settings file (`Pulumi.<stack>.yaml`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StackSettings {
    #[serde(default)]
    pub config: BTreeMap<String, Value>,
}

impl StackSettings {
    /// File name for a given stack
    pub fn file_name(stack: &str) -> String {
        format!("Pulumi.{stack}.yaml")
    }
}

/// Paths written by `write_program`
#[derive(Debug, Clone)]
pub struct WrittenFiles {
    pub program: PathBuf,
    pub settings: PathBuf,
}
