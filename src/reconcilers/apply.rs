// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Best-effort application of a change plan.
//!
//! Each planned key, and each owned duplicate, becomes one mutation call. A failed call is logged and
//! recorded as an [`EntryOutcome`]; the remaining keys are still processed.
//! Targets that stage changes are activated once at the end, provided at
//! least one mutation went through.

use super::target::DnsTarget;
use super::types::{
    Activation, ApplyReport, ChangeKind, ChangePlan, Classification, EntryOutcome, ManagedEntry,
    OwnershipRule,
};
use crate::source::HostnameMapping;
use anyhow::{anyhow, Result};
use tracing::{debug, error, info, warn};

async fn apply_one(
    target: &dyn DnsTarget,
    kind: ChangeKind,
    key: &str,
    mapping: &HostnameMapping,
    classification: &Classification,
    marker: Option<&str>,
) -> Result<()> {
    let desired_value = || {
        mapping
            .get(key)
            .ok_or_else(|| anyhow!("'{key}' is not in the source mapping"))
    };
    let owned = || {
        classification
            .owned
            .get(key)
            .ok_or_else(|| anyhow!("'{key}' is not an owned entry"))
    };

    match kind {
        ChangeKind::Add => {
            let entry = ManagedEntry::from_fqdn(key, desired_value()?, marker);
            let id = target.create_entry(&entry).await?;
            debug!(key = %key, id = ?id, "Created entry");
        }
        ChangeKind::Update | ChangeKind::UpdateMarker => {
            let current = owned()?;
            let desired = ManagedEntry {
                value: desired_value()?.clone(),
                marker: marker.map(str::to_string).or_else(|| current.marker.clone()),
                enabled: true,
                ..current.clone()
            };
            target.update_entry(current, &desired).await?;
        }
        ChangeKind::Remove => target.delete_entry(owned()?).await?,
    }
    Ok(())
}

fn record(
    report: &mut ApplyReport,
    target: &dyn DnsTarget,
    key: &str,
    kind: ChangeKind,
    result: Result<()>,
) {
    let error = match result {
        Ok(()) => {
            info!(target = %target.name(), key = %key, operation = %kind, "Applied change");
            None
        }
        Err(e) => {
            let message = format!("{e:#}");
            error!(
                target = %target.name(),
                key = %key,
                operation = %kind,
                error = %message,
                "Failed to apply change, continuing"
            );
            Some(message)
        }
    };
    report.outcomes.push(EntryOutcome {
        key: key.to_string(),
        kind,
        error,
    });
}

/// Apply `plan` to `target`.
///
/// `marker` is written on created and updated entries (`None` for targets
/// without a marker field). Never fails: per-entry errors and activation
/// errors are carried in the returned report.
pub async fn apply_changes(
    target: &dyn DnsTarget,
    plan: &ChangePlan,
    mapping: &HostnameMapping,
    classification: &Classification,
    marker: Option<&str>,
) -> ApplyReport {
    let batches = [
        (ChangeKind::Add, &plan.to_add),
        (ChangeKind::Update, &plan.to_update),
        (ChangeKind::UpdateMarker, &plan.to_update_marker),
        (ChangeKind::Remove, &plan.to_remove),
    ];

    let mut report = ApplyReport::default();
    for (kind, keys) in batches {
        for key in keys {
            let result = apply_one(target, kind, key, mapping, classification, marker).await;
            record(&mut report, target, key, kind, result);
        }
    }
    for duplicate in &plan.to_remove_duplicates {
        let key = duplicate.key();
        let result = target.delete_entry(duplicate).await;
        record(&mut report, target, &key, ChangeKind::Remove, result);
    }

    report.activation = if !target.requires_activation() {
        Activation::NotRequired
    } else if !report.changes_applied() {
        Activation::Skipped
    } else {
        match target.activate().await {
            Ok(()) => Activation::Succeeded,
            Err(e) => {
                let message = format!("{e:#}");
                warn!(
                    target = %target.name(),
                    error = %message,
                    "Changes written but activation failed"
                );
                Activation::Failed(message)
            }
        }
    };

    report
}

/// Marker a target should carry: the current marker for marker-based
/// targets, none otherwise.
#[must_use]
pub fn target_marker<'a>(target: &dyn DnsTarget, marker: &'a str) -> Option<&'a str> {
    match target.ownership() {
        OwnershipRule::Marker => Some(marker),
        OwnershipRule::SourceAddress(_) => None,
    }
}

#[cfg(test)]
#[path = "apply_tests.rs"]
mod apply_tests;
