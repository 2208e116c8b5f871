// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Data types shared by the reconciliation pipeline.

use crate::source::HostnameMapping;
use std::collections::BTreeMap;
use std::fmt;

/// One DNS entry in a target system, independent of the backend's wire shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagedEntry {
    /// Backend identifier used for update/delete (absent for rewrite rules)
    pub id: Option<String>,
    /// First label of the FQDN
    pub hostname: String,
    /// Remainder of the FQDN (empty for bare hostnames)
    pub domain: String,
    /// Address or name the entry resolves to
    pub value: String,
    /// Ownership marker, for backends that carry one
    pub marker: Option<String>,
    /// Whether the entry is active
    pub enabled: bool,
}

impl ManagedEntry {
    /// Build an enabled entry by splitting `fqdn` at its first dot.
    #[must_use]
    pub fn from_fqdn(fqdn: &str, value: &str, marker: Option<&str>) -> Self {
        let (hostname, domain) = fqdn.split_once('.').unwrap_or((fqdn, ""));
        Self {
            id: None,
            hostname: hostname.to_string(),
            domain: domain.to_string(),
            value: value.to_string(),
            marker: marker.map(str::to_string),
            enabled: true,
        }
    }

    /// `hostname.domain` as stored, or just the hostname when the domain is empty.
    #[must_use]
    pub fn key(&self) -> String {
        if self.domain.is_empty() {
            self.hostname.clone()
        } else {
            format!("{}.{}", self.hostname, self.domain)
        }
    }
}

/// How a target decides which of its entries this tool created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnershipRule {
    /// The entry's marker equals the current marker or a legacy marker.
    Marker,
    /// The entry answers with this address and its key is in the current mapping.
    SourceAddress(String),
}

/// Existing entries partitioned by ownership, keyed by [`ManagedEntry::key`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// Entries created by this tool
    pub owned: BTreeMap<String, ManagedEntry>,
    /// Everything else; never mutated
    pub foreign: BTreeMap<String, ManagedEntry>,
    /// Owned entries whose key was already taken by an earlier owned entry
    pub shadowed: Vec<ManagedEntry>,
    /// Foreign entries whose key was already taken by an earlier foreign entry
    pub foreign_duplicates: Vec<ManagedEntry>,
}

impl Classification {
    /// Number of classified entries, duplicates included.
    #[must_use]
    pub fn total(&self) -> usize {
        self.owned.len() + self.foreign.len() + self.shadowed.len() + self.foreign_duplicates.len()
    }
}

/// Keys to add, update, re-mark and remove on one target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangePlan {
    /// In the mapping, absent from the target
    pub to_add: Vec<String>,
    /// Owned, value differs from the mapping
    pub to_update: Vec<String>,
    /// Owned, value correct, marker outdated
    pub to_update_marker: Vec<String>,
    /// Owned, no longer in the mapping
    pub to_remove: Vec<String>,
    /// Owned duplicates of a key already held by another owned entry
    pub to_remove_duplicates: Vec<ManagedEntry>,
}

impl ChangePlan {
    /// Whether there is nothing to do.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of planned operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.to_add.len() + self.to_update.len() + self.to_update_marker.len()
            + self.to_remove.len()
            + self.to_remove_duplicates.len()
    }
}

/// Options for one reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Marker written on created and updated entries
    pub marker: String,
    /// Older markers still recognised as owned
    pub legacy_markers: Vec<String>,
    /// Plan only; never mutate
    pub dry_run: bool,
}

impl SyncOptions {
    /// Options with no legacy markers.
    #[must_use]
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            legacy_markers: Vec::new(),
            dry_run: false,
        }
    }

    /// Whether `marker` identifies an entry created by this tool.
    #[must_use]
    pub fn is_owned_marker(&self, marker: &str) -> bool {
        marker == self.marker || self.legacy_markers.iter().any(|m| m == marker)
    }
}

/// Kind of mutation applied to an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Create
    Add,
    /// Change value
    Update,
    /// Refresh marker only
    UpdateMarker,
    /// Delete
    Remove,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::UpdateMarker => "update marker",
            Self::Remove => "remove",
        })
    }
}

/// Outcome of one attempted mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryOutcome {
    /// Entry key
    pub key: String,
    /// Mutation attempted
    pub kind: ChangeKind,
    /// Failure message; `None` on success
    pub error: Option<String>,
}

impl EntryOutcome {
    /// Whether the mutation succeeded.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of the activation step after mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// Target applies changes immediately
    NotRequired,
    /// Target needs activation but no mutation succeeded
    Skipped,
    /// Activation call succeeded
    Succeeded,
    /// Activation call failed; written changes are staged but not live
    Failed(String),
}

/// Aggregate status of an apply run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyStatus {
    /// The plan was empty
    AlreadyInSync,
    /// At least one mutation succeeded
    Applied,
    /// Mutations were attempted and all of them failed
    NothingSucceeded,
}

/// Per-entry outcomes of an apply run plus the activation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    /// One outcome per attempted mutation, in execution order
    pub outcomes: Vec<EntryOutcome>,
    /// Activation result
    pub activation: Activation,
}

impl Default for ApplyReport {
    fn default() -> Self {
        Self {
            outcomes: Vec::new(),
            activation: Activation::NotRequired,
        }
    }
}

impl ApplyReport {
    /// True iff at least one mutation succeeded.
    #[must_use]
    pub fn changes_applied(&self) -> bool {
        self.outcomes.iter().any(EntryOutcome::succeeded)
    }

    /// Successful mutations of `kind`.
    #[must_use]
    pub fn succeeded(&self, kind: ChangeKind) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.kind == kind && o.succeeded())
            .count()
    }

    /// Failed mutations of `kind`.
    #[must_use]
    pub fn failed(&self, kind: ChangeKind) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.kind == kind && !o.succeeded())
            .count()
    }

    /// Failed mutations of any kind.
    pub fn failures(&self) -> impl Iterator<Item = &EntryOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }

    /// Distinguish "nothing to do" from "tried and nothing worked".
    #[must_use]
    pub fn status(&self) -> ApplyStatus {
        if self.outcomes.is_empty() {
            ApplyStatus::AlreadyInSync
        } else if self.changes_applied() {
            ApplyStatus::Applied
        } else {
            ApplyStatus::NothingSucceeded
        }
    }
}

/// Result of reconciling one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncResult {
    /// Target name
    pub target: String,
    /// Mapping reconciled against
    pub mapping: HostnameMapping,
    /// Marker written by this target (`None` for marker-less targets)
    pub marker: Option<String>,
    /// Existing entries by ownership
    pub classification: Classification,
    /// Planned changes
    pub plan: ChangePlan,
    /// Apply outcome; `None` in dry-run mode
    pub applied: Option<ApplyReport>,
}

impl SyncResult {
    /// Whether this was a dry run.
    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        self.applied.is_none()
    }

    /// True iff at least one mutation succeeded.
    #[must_use]
    pub fn changes_applied(&self) -> bool {
        self.applied
            .as_ref()
            .is_some_and(ApplyReport::changes_applied)
    }
}
