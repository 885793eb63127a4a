//! Engine integration for eksplat
//!
//! - `pulumi` - the reconciliation engine behind `declarative::Engine`
//! - `differ` - snapshot diff display

pub mod differ;
pub mod pulumi;

pub use pulumi::PulumiEngine;

use anyhow::Result;
use declarative::ConfirmCallback;

/// Asks on the terminal before an apply
pub struct PromptConfirm;

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        use dialoguer::Confirm;

        let confirmed = Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?;

        Ok(confirmed)
    }
}
