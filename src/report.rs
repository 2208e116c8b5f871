// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Human-readable change reports.
//!
//! Every reconciliation command renders its results through [`ChangeReport`]
//! (one target) or [`UnifiedReport`] (several targets); neither knows which
//! backend it is describing.

use crate::reconcilers::{
    Activation, ApplyStatus, ChangeKind, SyncResult, UnifiedSyncResult,
};
use std::fmt;

/// Banner printed above dry-run output.
pub const DRY_RUN_BANNER: &str = "DRY RUN - no changes will be made";

/// Report for one target.
pub struct ChangeReport<'a> {
    result: &'a SyncResult,
}

impl<'a> ChangeReport<'a> {
    /// Describe `result`.
    #[must_use]
    pub fn new(result: &'a SyncResult) -> Self {
        Self { result }
    }

    fn owned_value(&self, key: &str) -> &str {
        self.result
            .classification
            .owned
            .get(key)
            .map_or("?", |e| e.value.as_str())
    }

    fn desired_value(&self, key: &str) -> &str {
        self.result.mapping.get(key).map_or("?", String::as_str)
    }

    fn write_section(
        &self,
        f: &mut fmt::Formatter<'_>,
        title: &str,
        keys: &[String],
        line: impl Fn(&str) -> String,
    ) -> fmt::Result {
        if keys.is_empty() {
            return Ok(());
        }
        writeln!(f, "{title} ({}):", keys.len())?;
        for key in keys {
            writeln!(f, "  {}", line(key))?;
        }
        Ok(())
    }
}

impl fmt::Display for ChangeReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.result;
        let plan = &result.plan;

        writeln!(f, "== {} ==", result.target)?;
        writeln!(
            f,
            "Source hostnames: {} | existing entries: {} owned, {} other",
            result.mapping.len(),
            result.classification.owned.len() + result.classification.shadowed.len(),
            result.classification.foreign.len() + result.classification.foreign_duplicates.len()
        )?;

        if plan.is_empty() {
            return writeln!(f, "Already in sync, no changes needed.");
        }

        self.write_section(f, "To add", &plan.to_add, |key| {
            format!("+ {key} -> {}", self.desired_value(key))
        })?;
        self.write_section(f, "To update", &plan.to_update, |key| {
            format!(
                "~ {key}: {} -> {}",
                self.owned_value(key),
                self.desired_value(key)
            )
        })?;
        self.write_section(f, "To update marker", &plan.to_update_marker, |key| {
            let old = self
                .result
                .classification
                .owned
                .get(key)
                .and_then(|e| e.marker.as_deref())
                .unwrap_or_default();
            let new = self.result.marker.as_deref().unwrap_or_default();
            format!("~ {key}: '{old}' -> '{new}'")
        })?;
        self.write_section(f, "To remove", &plan.to_remove, |key| {
            format!("- {key} ({})", self.owned_value(key))
        })?;
        if !plan.to_remove_duplicates.is_empty() {
            writeln!(f, "To remove, duplicates ({}):", plan.to_remove_duplicates.len())?;
            for duplicate in &plan.to_remove_duplicates {
                writeln!(f, "  - {} ({})", duplicate.key(), duplicate.value)?;
            }
        }

        let Some(applied) = &result.applied else {
            return Ok(());
        };

        for kind in [
            ChangeKind::Add,
            ChangeKind::Update,
            ChangeKind::UpdateMarker,
            ChangeKind::Remove,
        ] {
            let (ok, failed) = (applied.succeeded(kind), applied.failed(kind));
            if ok + failed > 0 {
                writeln!(f, "{kind}: {ok} succeeded, {failed} failed")?;
            }
        }
        for failure in applied.failures() {
            writeln!(
                f,
                "  failed to {} {}: {}",
                failure.kind,
                failure.key,
                failure.error.as_deref().unwrap_or_default()
            )?;
        }

        match applied.status() {
            ApplyStatus::AlreadyInSync => writeln!(f, "Already in sync, no changes needed.")?,
            ApplyStatus::Applied => writeln!(f, "Changes applied.")?,
            ApplyStatus::NothingSucceeded => writeln!(f, "No changes were applied.")?,
        }

        match &applied.activation {
            Activation::NotRequired | Activation::Skipped => Ok(()),
            Activation::Succeeded => writeln!(f, "Changes activated."),
            Activation::Failed(error) => {
                writeln!(f, "WARNING: changes written but not activated: {error}")
            }
        }
    }
}

/// Report for a multi-target run.
pub struct UnifiedReport<'a> {
    result: &'a UnifiedSyncResult,
    dry_run: bool,
}

impl<'a> UnifiedReport<'a> {
    /// Describe `result`.
    #[must_use]
    pub fn new(result: &'a UnifiedSyncResult, dry_run: bool) -> Self {
        Self { result, dry_run }
    }
}

impl fmt::Display for UnifiedReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dry_run {
            writeln!(f, "{DRY_RUN_BANNER}")?;
            writeln!(f)?;
        }
        writeln!(
            f,
            "Source: {} ({} hostnames)",
            self.result.source,
            self.result.mapping.len()
        )?;

        for target in &self.result.targets {
            writeln!(f)?;
            match &target.outcome {
                Ok(result) => write!(f, "{}", ChangeReport::new(result))?,
                Err(error) => {
                    writeln!(f, "== {} ==", target.name)?;
                    writeln!(f, "ERROR: {error:#}")?;
                }
            }
        }

        if let Some(error) = &self.result.error {
            writeln!(f)?;
            writeln!(f, "ERROR: {error}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod report_tests;
