// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Interactive confirmation.
//!
//! Prompts are only shown when stdin and stderr are terminals. Anywhere else
//! a confirmation counts as "no", so scripted runs never mutate anything they
//! were told to ask about.

use crate::errors::ApiError;
use crate::reconcilers::{DnsTarget, ManagedEntry, OwnershipRule};
use anyhow::Result;
use async_trait::async_trait;
use dialoguer::{Confirm, Input};
use std::io::IsTerminal;
use tracing::warn;

/// Checks if both stdin and stderr are connected to a terminal.
#[must_use]
pub fn is_interactive_terminal() -> bool {
    std::io::stdin().is_terminal() && std::io::stderr().is_terminal()
}

/// Asks yes/no questions.
pub trait Confirmer: Send + Sync {
    /// Whether the operator agreed to `prompt`.
    fn confirm(&self, prompt: &str) -> bool;
}

/// Confirmer backed by the controlling terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalConfirmer;

impl Confirmer for TerminalConfirmer {
    fn confirm(&self, prompt: &str) -> bool {
        if !is_interactive_terminal() {
            warn!(prompt = %prompt, "Not a terminal, treating confirmation as declined");
            return false;
        }
        Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

/// Ask for confirmation unless `force` is set.
#[must_use]
pub fn confirm_unless_forced(confirmer: &dyn Confirmer, prompt: &str, force: bool) -> bool {
    force || confirmer.confirm(prompt)
}

/// Prompt for a text value with `current` pre-filled.
///
/// Off a terminal the current value is returned unchanged.
///
/// # Errors
///
/// Returns an error if the terminal cannot be read.
pub fn prompt_with_default(prompt: &str, current: &str) -> Result<String> {
    if !is_interactive_terminal() {
        return Ok(current.to_string());
    }
    Ok(Input::new()
        .with_prompt(prompt)
        .default(current.to_string())
        .allow_empty(true)
        .interact_text()?)
}

/// A target that asks before every mutating call.
///
/// A declined call fails with [`ApiError::Declined`], which the applier
/// records as a per-entry failure before moving on.
pub struct GuardedTarget<C: Confirmer> {
    inner: Box<dyn DnsTarget>,
    confirmer: C,
}

impl<C: Confirmer> GuardedTarget<C> {
    /// Guard `inner` with `confirmer`.
    #[must_use]
    pub fn new(inner: Box<dyn DnsTarget>, confirmer: C) -> Self {
        Self { inner, confirmer }
    }

    fn ask(&self, operation: String) -> Result<()> {
        let prompt = format!("{}: {operation}?", self.inner.name());
        if self.confirmer.confirm(&prompt) {
            Ok(())
        } else {
            Err(ApiError::Declined { operation }.into())
        }
    }
}

#[async_trait]
impl<C: Confirmer> DnsTarget for GuardedTarget<C> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn ownership(&self) -> OwnershipRule {
        self.inner.ownership()
    }

    async fn list_entries(&self) -> Result<Vec<ManagedEntry>> {
        self.inner.list_entries().await
    }

    async fn create_entry(&self, entry: &ManagedEntry) -> Result<Option<String>> {
        self.ask(format!("add {} -> {}", entry.key(), entry.value))?;
        self.inner.create_entry(entry).await
    }

    async fn update_entry(&self, current: &ManagedEntry, desired: &ManagedEntry) -> Result<()> {
        self.ask(format!(
            "update {} {} -> {}",
            current.key(),
            current.value,
            desired.value
        ))?;
        self.inner.update_entry(current, desired).await
    }

    async fn delete_entry(&self, entry: &ManagedEntry) -> Result<()> {
        self.ask(format!("remove {} ({})", entry.key(), entry.value))?;
        self.inner.delete_entry(entry).await
    }

    fn requires_activation(&self) -> bool {
        self.inner.requires_activation()
    }

    async fn activate(&self) -> Result<()> {
        self.ask("apply staged changes".to_string())?;
        self.inner.activate().await
    }
}

#[cfg(test)]
#[path = "prompt_tests.rs"]
mod prompt_tests;
