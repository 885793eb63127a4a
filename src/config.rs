//! Stack configuration
//!
//! A flat key-value surface, resolved in three layers:
//! built-in defaults < stack file (`<config_dir>/<stack>.toml`) < `--set` overrides.
//!
//! ```toml
//! cluster_name = "microservices-cluster"
//! desired_capacity = 3
//!
//! [aws]
//! region = "us-west-2"
//! ```

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::paths;

/// Every key the surface accepts, in display order
pub const KEYS: [&str; 9] = [
    "aws:region",
    "cluster_name",
    "k8s_version",
    "node_instance_type",
    "desired_capacity",
    "min_size",
    "max_size",
    "vpc_cidr",
    "letsencrypt_email",
];

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error("'{key}' must be a non-negative integer, got '{value}'")]
    NotInteger { key: &'static str, value: String },

    #[error("override '{0}' is not in key=value form")]
    MalformedOverride(String),

    #[error("'{key}' must not contain '${{': '{value}'")]
    Interpolation { key: &'static str, value: String },
}

// ============================================================================
// Resolved values
// ============================================================================

/// Fully resolved stack configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackConfig {
    pub region: String,
    pub cluster_name: String,
    pub k8s_version: String,
    pub node_instance_type: String,
    pub desired_capacity: u32,
    pub min_size: u32,
    pub max_size: u32,
    pub vpc_cidr: String,
    pub letsencrypt_email: String,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            region: "us-west-2".to_string(),
            cluster_name: "microservices-cluster".to_string(),
            k8s_version: "1.31".to_string(),
            node_instance_type: "t3.large".to_string(),
            desired_capacity: 3,
            min_size: 2,
            max_size: 6,
            vpc_cidr: "10.0.0.0/16".to_string(),
            letsencrypt_email: "admin@example.com".to_string(),
        }
    }
}

impl StackConfig {
    /// Set one key from its string form
    ///
    /// Returns `false` (and changes nothing) for an empty value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<bool, ConfigError> {
        let key = canonical_key(key)?;
        let value = value.trim();
        if value.is_empty() {
            return Ok(false);
        }
        // the program would read it as a reference to another resource
        if value.contains("${") {
            return Err(ConfigError::Interpolation {
                key,
                value: value.to_string(),
            });
        }

        let integer = || {
            value.parse::<u32>().map_err(|_| ConfigError::NotInteger {
                key,
                value: value.to_string(),
            })
        };

        match key {
            "aws:region" => self.region = value.to_string(),
            "cluster_name" => self.cluster_name = value.to_string(),
            "k8s_version" => self.k8s_version = value.to_string(),
            "node_instance_type" => self.node_instance_type = value.to_string(),
            "desired_capacity" => self.desired_capacity = integer()?,
            "min_size" => self.min_size = integer()?,
            "max_size" => self.max_size = integer()?,
            "vpc_cidr" => self.vpc_cidr = value.to_string(),
            "letsencrypt_email" => self.letsencrypt_email = value.to_string(),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(true)
    }

    /// Current value of a key, as a string
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "aws:region" => self.region.clone(),
            "cluster_name" => self.cluster_name.clone(),
            "k8s_version" => self.k8s_version.clone(),
            "node_instance_type" => self.node_instance_type.clone(),
            "desired_capacity" => self.desired_capacity.to_string(),
            "min_size" => self.min_size.to_string(),
            "max_size" => self.max_size.to_string(),
            "vpc_cidr" => self.vpc_cidr.clone(),
            "letsencrypt_email" => self.letsencrypt_email.clone(),
            _ => return None,
        };
        Some(value)
    }
}

fn canonical_key(key: &str) -> Result<&'static str, ConfigError> {
    KEYS.iter()
        .find(|k| **k == key)
        .copied()
        .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))
}

/// Where a resolved value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Default,
    File,
    Override,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Override => write!(f, "override"),
        }
    }
}

/// Configuration together with the origin of each value
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: StackConfig,
    pub sources: BTreeMap<&'static str, ConfigSource>,
    /// Stack file that was read, if one existed
    pub file: Option<PathBuf>,
}

impl ResolvedConfig {
    /// `(key, value, source)` rows in display order
    pub fn entries(&self) -> Vec<(&'static str, String, ConfigSource)> {
        KEYS.iter()
            .map(|key| {
                (
                    *key,
                    self.config.get(key).unwrap_or_default(),
                    self.sources
                        .get(key)
                        .copied()
                        .unwrap_or(ConfigSource::Default),
                )
            })
            .collect()
    }
}

// ============================================================================
// Stack file
// ============================================================================

/// On-disk shape of `<stack>.toml`
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StackFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k8s_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_instance_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_capacity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc_cidr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letsencrypt_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws: Option<AwsSection>,
}

/// `[aws]` table
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AwsSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl StackFile {
    /// Parse a stack file's contents
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Flatten to `(key, value)` pairs for the keys that are present
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = Vec::new();
        let mut push = |key: &'static str, value: Option<String>| {
            if let Some(value) = value {
                entries.push((key, value));
            }
        };

        push(
            "aws:region",
            self.aws.as_ref().and_then(|aws| aws.region.clone()),
        );
        push("cluster_name", self.cluster_name.clone());
        push("k8s_version", self.k8s_version.clone());
        push("node_instance_type", self.node_instance_type.clone());
        push("desired_capacity", self.desired_capacity.map(|v| v.to_string()));
        push("min_size", self.min_size.map(|v| v.to_string()));
        push("max_size", self.max_size.map(|v| v.to_string()));
        push("vpc_cidr", self.vpc_cidr.clone());
        push("letsencrypt_email", self.letsencrypt_email.clone());
        entries
    }

    /// A file spelling out every value of `config`
    pub fn from_config(config: &StackConfig) -> Self {
        Self {
            cluster_name: Some(config.cluster_name.clone()),
            k8s_version: Some(config.k8s_version.clone()),
            node_instance_type: Some(config.node_instance_type.clone()),
            desired_capacity: Some(config.desired_capacity),
            min_size: Some(config.min_size),
            max_size: Some(config.max_size),
            vpc_cidr: Some(config.vpc_cidr.clone()),
            letsencrypt_email: Some(config.letsencrypt_email.clone()),
            aws: Some(AwsSection {
                region: Some(config.region.clone()),
            }),
        }
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Parse a `--set key=value` argument
pub fn parse_override(arg: &str) -> Result<(String, String), ConfigError> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| ConfigError::MalformedOverride(arg.to_string()))?;
    let key = canonical_key(key.trim())?;
    Ok((key.to_string(), value.to_string()))
}

/// Layer defaults, an optional stack file and overrides
pub fn resolve(
    file: Option<&StackFile>,
    overrides: &[(String, String)],
) -> Result<ResolvedConfig, ConfigError> {
    let mut config = StackConfig::default();
    let mut sources: BTreeMap<&'static str, ConfigSource> =
        KEYS.iter().map(|k| (*k, ConfigSource::Default)).collect();

    if let Some(file) = file {
        for (key, value) in file.entries() {
            if config.set(key, &value)? {
                sources.insert(key, ConfigSource::File);
            }
        }
    }

    for (key, value) in overrides {
        let key = canonical_key(key)?;
        if config.set(key, value)? {
            sources.insert(key, ConfigSource::Override);
        }
    }

    Ok(ResolvedConfig {
        config,
        sources,
        file: None,
    })
}

/// Load configuration for a stack
///
/// An explicit `--config` path must exist; the default stack file is optional.
pub fn load(
    explicit: Option<&Path>,
    stack: &str,
    overrides: &[(String, String)],
) -> Result<ResolvedConfig> {
    let (path, required) = paths::config_file(explicit, stack)?;

    let file = if path.exists() {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let parsed = StackFile::parse(&content)
            .with_context(|| format!("Invalid stack file {}", path.display()))?;
        log::debug!("Loaded stack file {}", path.display());
        Some(parsed)
    } else if required {
        anyhow::bail!("Config file not found: {}", path.display());
    } else {
        log::debug!("No stack file at {}, using defaults", path.display());
        None
    };

    let mut resolved = resolve(file.as_ref(), overrides)?;
    if file.is_some() {
        resolved.file = Some(path);
    }
    Ok(resolved)
}

/// Render a starter stack file with every value spelled out
pub fn init_template(config: &StackConfig) -> Result<String> {
    let body = toml::to_string(&StackFile::from_config(config))
        .context("Failed to serialize stack file")?;
    Ok(format!(
        "# eksplat stack configuration\n# Empty values fall back to the built-in defaults.\n\n{body}"
    ))
}

// ============================================================================
// Lint
// ============================================================================

static CIDR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})/(\d{1,2})$")
        .unwrap_or_else(|e| panic!("invalid CIDR pattern: {e}"))
});

static VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+\.\d+$").unwrap_or_else(|e| panic!("invalid version pattern: {e}"))
});

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
        .unwrap_or_else(|e| panic!("invalid email pattern: {e}"))
});

static CLUSTER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9-]{0,99}$")
        .unwrap_or_else(|e| panic!("invalid cluster name pattern: {e}"))
});

/// Advisory warnings about values the engine is likely to reject
///
/// Nothing here blocks a submission.
pub fn lint(config: &StackConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    match CIDR.captures(&config.vpc_cidr) {
        Some(caps) => {
            let octets_ok = (1..=4).all(|i| caps[i].parse::<u16>().is_ok_and(|o| o <= 255));
            let prefix = caps[5].parse::<u8>().unwrap_or(u8::MAX);
            if !octets_ok || prefix > 32 {
                warnings.push(format!("vpc_cidr '{}' is not a valid CIDR", config.vpc_cidr));
            } else if prefix > 17 {
                warnings.push(format!(
                    "vpc_cidr '{}' is too small for three /19 private and three /22 public subnets",
                    config.vpc_cidr
                ));
            }
        }
        None => warnings.push(format!(
            "vpc_cidr '{}' is not a valid CIDR",
            config.vpc_cidr
        )),
    }

    if !VERSION.is_match(&config.k8s_version) {
        warnings.push(format!(
            "k8s_version '{}' should look like MAJOR.MINOR",
            config.k8s_version
        ));
    }

    if !EMAIL.is_match(&config.letsencrypt_email) {
        warnings.push(format!(
            "letsencrypt_email '{}' does not look like an email address",
            config.letsencrypt_email
        ));
    }

    if !CLUSTER_NAME.is_match(&config.cluster_name) {
        warnings.push(format!(
            "cluster_name '{}' should start with a letter and contain only letters, digits and '-'",
            config.cluster_name
        ));
    }

    if config.min_size > config.desired_capacity || config.desired_capacity > config.max_size {
        warnings.push(format!(
            "node group sizes should satisfy min <= desired <= max (got {} <= {} <= {})",
            config.min_size, config.desired_capacity, config.max_size
        ));
    }

    if config.max_size == 0 {
        warnings.push("max_size is 0, the node group cannot run any nodes".to_string());
    }

    warnings
}

// ============================================================================
// Tests
// ============================================================================
