//! Engine and callback traits
//!
//! These traits keep the declarative crate independent of any particular
//! reconciliation engine or UI. The engine owns ordering, diffing against
//! live state and applying; this crate only hands it a validated deployment.

use crate::deployment::Deployment;
use crate::types::{SubmitOptions, SubmitReport};
use anyhow::Result;
use serde_json::{Map, Value};

/// External reconciliation engine
///
/// Implementations must not retry or rewrite failures: whatever the engine
/// reports as an error is returned as-is.
pub trait Engine {
    /// Short engine name for messages
    fn name(&self) -> &str;

    /// Hand the full deployment over for preview or apply
    fn submit(&self, deployment: &Deployment, opts: &SubmitOptions) -> Result<SubmitReport>;

    /// Output values the engine recorded for the last apply
    fn outputs(&self, opts: &SubmitOptions) -> Result<Map<String, Value>>;
}

/// Confirmation callback for user interaction
///
/// Implement this trait to handle user confirmations.
pub trait ConfirmCallback {
    /// Ask the user to confirm an action
    ///
    /// # Returns
    /// `true` if the user confirmed, `false` otherwise
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// Auto-confirm callback (always returns true)
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Auto-decline callback (always returns false)
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(false)
    }
}
