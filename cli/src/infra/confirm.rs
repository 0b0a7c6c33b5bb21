//! Terminal implementation of the `ScopeConfirmer` port.

use anyhow::{Context, Result};

use crate::application::ports::ScopeConfirmer;
use crate::domain::scopes::ScopePartition;

/// Prompts on the controlling terminal with `dialoguer`.
pub struct TerminalConfirmer {
    non_interactive: bool,
}

impl TerminalConfirmer {
    /// `non_interactive` comes from `--yes`, `CI` or `EXAPP_YES`.
    #[must_use]
    pub fn new(non_interactive: bool) -> Self {
        Self { non_interactive }
    }
}

impl ScopeConfirmer for TerminalConfirmer {
    fn is_interactive(&self) -> bool {
        !self.non_interactive && console::user_attended_stderr()
    }

    fn confirm(&self, appid: &str, partition: ScopePartition, names: &[String]) -> Result<bool> {
        eprintln!("{appid} requests {partition} scopes:");
        for name in names {
            eprintln!("  - {name}");
        }
        dialoguer::Confirm::new()
            .with_prompt(format!("Grant {partition} scopes to {appid}?"))
            .default(partition == ScopePartition::Required)
            .interact()
            .context("reading scope confirmation")
    }
}
