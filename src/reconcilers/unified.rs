// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Multi-target orchestration over one source snapshot.

use super::reconcile::reconcile_target;
use super::target::DnsTarget;
use super::types::{SyncOptions, SyncResult};
use crate::errors::SyncError;
use crate::source::{HostnameMapping, RouteSource};
use anyhow::{Context, Result};
use tracing::{error, info};

/// Outcome for one target.
#[derive(Debug)]
pub struct TargetSync {
    /// Target name
    pub name: String,
    /// Result, or the error that aborted this target
    pub outcome: Result<SyncResult>,
}

/// Results of a multi-target run.
#[derive(Debug)]
pub struct UnifiedSyncResult {
    /// Source description
    pub source: String,
    /// Mapping shared by every target
    pub mapping: HostnameMapping,
    /// Per-target outcomes, in target order
    pub targets: Vec<TargetSync>,
    /// Set when every target failed
    pub error: Option<SyncError>,
}

impl UnifiedSyncResult {
    /// Targets that failed, with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &anyhow::Error)> {
        self.targets
            .iter()
            .filter_map(|t| t.outcome.as_ref().err().map(|e| (t.name.as_str(), e)))
    }
}

/// Fetch `source` once and reconcile every target against it, one at a time.
///
/// A failing target does not stop the others. When all of them fail the
/// partial result is still returned, with [`UnifiedSyncResult::error`] set.
///
/// # Errors
///
/// Returns an error if no target is given or the source cannot be fetched.
pub async fn unified_sync(
    source: &dyn RouteSource,
    targets: &[Box<dyn DnsTarget>],
    options: &SyncOptions,
) -> Result<UnifiedSyncResult> {
    if targets.is_empty() {
        return Err(SyncError::NoTargets.into());
    }

    let mapping = source
        .fetch_mapping()
        .await
        .with_context(|| format!("Failed to fetch hostnames from {}", source.describe()))?;
    info!(source = %source.describe(), hostnames = mapping.len(), "Fetched source mapping");

    let mut results = Vec::with_capacity(targets.len());
    for target in targets {
        let outcome = reconcile_target(target.as_ref(), &mapping, options).await;
        if let Err(e) = &outcome {
            error!(target = %target.name(), error = ?e, "Target reconciliation failed");
        }
        results.push(TargetSync {
            name: target.name().to_string(),
            outcome,
        });
    }

    let error = results.iter().all(|t| t.outcome.is_err()).then(|| {
        let details = results
            .iter()
            .filter_map(|t| t.outcome.as_ref().err().map(|e| format!("{}: {e:#}", t.name)))
            .collect::<Vec<_>>()
            .join("; ");
        SyncError::AllTargetsFailed {
            count: results.len(),
            details,
        }
    });

    Ok(UnifiedSyncResult {
        source: source.describe(),
        mapping,
        targets: results,
        error,
    })
}

#[cfg(test)]
#[path = "unified_tests.rs"]
mod unified_tests;
