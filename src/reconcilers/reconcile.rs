// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Single-target reconciliation: list, classify, plan, apply.

use super::apply::{apply_changes, target_marker};
use super::diff::plan_changes;
use super::ownership::classify;
use super::target::DnsTarget;
use super::types::{ApplyReport, Classification, SyncOptions, SyncResult};
use crate::source::HostnameMapping;
use anyhow::{Context, Result};
use tracing::{info, warn};

/// Reconcile one target against `mapping`.
///
/// An empty mapping is treated as "source has nothing to say" and produces an
/// empty plan, so a misconfigured source never wipes the target.
///
/// # Errors
///
/// Returns an error if the target's existing entries cannot be listed. Failed
/// mutations are not errors; they are recorded in [`SyncResult::applied`].
pub async fn reconcile_target(
    target: &dyn DnsTarget,
    mapping: &HostnameMapping,
    options: &SyncOptions,
) -> Result<SyncResult> {
    let marker = target_marker(target, &options.marker);

    if mapping.is_empty() {
        warn!(target = %target.name(), "Source mapping is empty, nothing to reconcile");
        return Ok(SyncResult {
            target: target.name().to_string(),
            mapping: mapping.clone(),
            marker: marker.map(str::to_string),
            classification: Classification::default(),
            plan: Default::default(),
            applied: (!options.dry_run).then(ApplyReport::default),
        });
    }

    let entries = target
        .list_entries()
        .await
        .with_context(|| format!("Failed to list existing entries on {}", target.name()))?;
    let classification = classify(entries, &target.ownership(), mapping, options);
    let plan = plan_changes(mapping, &classification, marker);

    info!(
        target = %target.name(),
        owned = classification.owned.len(),
        foreign = classification.foreign.len(),
        shadowed = classification.shadowed.len(),
        to_add = plan.to_add.len(),
        to_update = plan.to_update.len(),
        to_update_marker = plan.to_update_marker.len(),
        to_remove = plan.to_remove.len(),
        to_remove_duplicates = plan.to_remove_duplicates.len(),
        dry_run = options.dry_run,
        "Planned changes"
    );

    let applied = if options.dry_run {
        None
    } else {
        Some(apply_changes(target, &plan, mapping, &classification, marker).await)
    };

    Ok(SyncResult {
        target: target.name().to_string(),
        mapping: mapping.clone(),
        marker: marker.map(str::to_string),
        classification,
        plan,
        applied,
    })
}
