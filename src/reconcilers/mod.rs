// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation of DNS targets against a hostname mapping.
//!
//! # Pipeline
//!
//! 1. **Source** - a [`RouteSource`](crate::source::RouteSource) yields the mapping (once per run)
//! 2. **Classify** - [`classify`] partitions each target's entries into owned and foreign
//! 3. **Plan** - [`plan_changes`] computes add / update / update-marker / remove sets
//! 4. **Apply** - [`apply_changes`] runs the plan best-effort, then activates the target
//! 5. **Orchestrate** - [`unified_sync`] repeats 2-4 per target, isolating failures
//!
//! Nothing is persisted between runs; every run recomputes the plan from live state.
//!
//! # Example
//!
//! ```rust,no_run
//! use unbound_sync::reconcilers::{unified_sync, DnsTarget, SyncOptions};
//! use unbound_sync::source::RouteSource;
//!
//! async fn sync(source: &dyn RouteSource, targets: &[Box<dyn DnsTarget>]) -> anyhow::Result<()> {
//!     let options = SyncOptions::new("Entry created by unboundCLI sync");
//!     let result = unified_sync(source, targets, &options).await?;
//!     if let Some(err) = result.error {
//!         anyhow::bail!(err);
//!     }
//!     Ok(())
//! }
//! ```

pub mod apply;
pub mod diff;
pub mod ownership;
pub mod reconcile;
pub mod target;
pub mod types;
pub mod unified;

#[cfg(test)]
pub(crate) mod testing;

pub use apply::apply_changes;
pub use diff::plan_changes;
pub use ownership::classify;
pub use reconcile::reconcile_target;
pub use target::{AdguardTarget, DnsTarget, UnboundTarget};
pub use types::{
    Activation, ApplyReport, ApplyStatus, ChangeKind, ChangePlan, Classification, EntryOutcome,
    ManagedEntry, OwnershipRule, SyncOptions, SyncResult,
};
pub use unified::{unified_sync, TargetSync, UnifiedSyncResult};
