//! # Declarative
//!
//! A framework for declaring infrastructure as a graph of resources.
//!
//! This crate provides the core abstractions for describing desired state as
//! declarations with explicit dependency edges, checking that the graph is
//! well formed, and handing it to an external reconciliation engine that
//! diffs it against live state and applies it.
//!
//! ## Core Concepts
//!
//! - **Declaration**: kind, name, parameter bag and explicit predecessors
//! - **ResourceGraph**: declarations in declaration order, with validation
//!   (unique ids, resolvable edges, no cycles) and an ordering preview
//! - **OutputSet**: named values that stay deferred until the engine applies
//! - **Deployment**: graph, outputs and stack settings submitted together
//! - **Engine**: the external reconciliation engine behind a trait
//!
//! ## Example
//!
//! ```
//! use declarative::{Declaration, Deployment, Kind};
//! use serde_json::json;
//!
//! let mut deployment = Deployment::new("platform", "example");
//!
//! let ns = deployment.graph.add(
//!     Declaration::new(Kind::Namespace, "kong")
//!         .with_params(json!({ "metadata": { "name": "kong" } }))?,
//! )?;
//!
//! deployment.graph.add(
//!     Declaration::new(Kind::HelmRelease, "kong")
//!         .param("chart", "kong")
//!         .param("namespace", ns.property("metadata.name"))
//!         .depends_on(&ns),
//! )?;
//!
//! deployment.validate()?;
//! assert_eq!(deployment.graph.waves()?.len(), 2);
//! # Ok::<(), declarative::GraphError>(())
//! ```
//!
//! ## Engine Trait
//!
//! [`Engine`] is the only seam to the outside world. The crate never orders,
//! retries or applies anything itself; [`submit`] validates, asks a
//! [`ConfirmCallback`], and calls the engine exactly once.

pub mod context;
pub mod deployment;
pub mod diff;
pub mod error;
pub mod executor;
pub mod graph;
pub mod output;
pub mod resource;
pub mod types;

// Re-export main types at crate root
pub use context::{AutoConfirm, AutoDecline, ConfirmCallback, Engine};
pub use deployment::{Deployment, Snapshot};
pub use diff::{compute_diffs, group_by_kind, Change, DiffSummary, ResourceDiff};
pub use error::{GraphError, Result};
pub use executor::{submit, submit_simple};
pub use graph::ResourceGraph;
pub use output::{OutputSet, OutputValue, Resolution};
pub use resource::Declaration;
pub use types::{Kind, PropertyRef, ResourceId, SubmitOptions, SubmitOutcome, SubmitReport};
