// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Read-only comparison of the source mapping with every evaluated target.
//!
//! The hostname universe is every source hostname plus stale tool records:
//! entries a target holds for hostnames the source no longer defines, where a
//! tool record is an entry carrying a current or legacy marker (marker-based
//! targets) or answering with the proxy address (address-based targets).

use crate::reconcilers::{ManagedEntry, OwnershipRule, SyncOptions};
use crate::source::HostnameMapping;
use std::collections::BTreeSet;
use std::fmt;

/// Live entries of one evaluated target.
#[derive(Debug, Clone)]
pub struct SystemSnapshot {
    /// Target name
    pub name: String,
    /// How the target marks tool records
    pub rule: OwnershipRule,
    /// Every entry in the target
    pub entries: Vec<ManagedEntry>,
}

impl SystemSnapshot {
    fn is_tool_record(&self, entry: &ManagedEntry, options: &SyncOptions) -> bool {
        match &self.rule {
            OwnershipRule::Marker => entry
                .marker
                .as_deref()
                .is_some_and(|m| options.is_owned_marker(m)),
            OwnershipRule::SourceAddress(address) => entry.value == *address,
        }
    }

    fn lookup(&self, hostname: &str, options: &SyncOptions) -> Option<&ManagedEntry> {
        let mut first = None;
        for entry in self.entries.iter().filter(|e| e.key() == hostname) {
            if self.is_tool_record(entry, options) {
                return Some(entry);
            }
            first.get_or_insert(entry);
        }
        first
    }
}

/// State of one hostname in one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemState {
    /// Whether the target has an entry for the hostname
    pub present: bool,
    /// Entry value
    pub value: Option<String>,
    /// Entry identifier
    pub id: Option<String>,
    /// Entry marker
    pub marker: Option<String>,
    /// Value equals the source target (or, for non-source hostnames, entry absent)
    pub in_sync: bool,
}

/// Overall classification of a hostname.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OverallStatus {
    /// Every evaluated target is in sync
    FullyInSync,
    /// Some but not all evaluated targets are in sync
    PartiallyInSync,
    /// No target is in sync, or a stale record exists
    OutOfSync,
    /// In the source, absent from every target
    SourceOnly,
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FullyInSync => "in sync",
            Self::PartiallyInSync => "partial",
            Self::OutOfSync => "out of sync",
            Self::SourceOnly => "source only",
        })
    }
}

/// One row of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostStatus {
    /// Fully-qualified hostname
    pub hostname: String,
    /// Source target, `None` for stale records
    pub source_value: Option<String>,
    /// Per-target state, in snapshot order
    pub systems: Vec<SystemState>,
    /// Overall status
    pub overall: OverallStatus,
}

fn overall_status(in_source: bool, systems: &[SystemState]) -> OverallStatus {
    if !in_source {
        return OverallStatus::OutOfSync;
    }
    let present = systems.iter().filter(|s| s.present).count();
    let in_sync = systems.iter().filter(|s| s.in_sync).count();
    if present == 0 {
        OverallStatus::SourceOnly
    } else if in_sync == systems.len() {
        OverallStatus::FullyInSync
    } else if in_sync > 0 {
        OverallStatus::PartiallyInSync
    } else {
        OverallStatus::OutOfSync
    }
}

/// Compare `mapping` with every snapshot.
///
/// Rows are sorted by hostname.
#[must_use]
pub fn build_status(
    mapping: &HostnameMapping,
    snapshots: &[SystemSnapshot],
    options: &SyncOptions,
) -> Vec<HostStatus> {
    let mut universe: BTreeSet<&str> = mapping.keys().map(String::as_str).collect();
    let stale: Vec<String> = snapshots
        .iter()
        .flat_map(|s| {
            s.entries
                .iter()
                .filter(|e| s.is_tool_record(e, options))
                .map(ManagedEntry::key)
        })
        .filter(|key| !mapping.contains_key(key))
        .collect();
    universe.extend(stale.iter().map(String::as_str));

    universe
        .into_iter()
        .map(|hostname| {
            let source_value = mapping.get(hostname).cloned();
            let systems: Vec<SystemState> = snapshots
                .iter()
                .map(|snapshot| {
                    let entry = snapshot.lookup(hostname, options);
                    let in_sync = match (&source_value, entry) {
                        (Some(target), Some(e)) => e.value == *target,
                        (Some(_), None) => false,
                        (None, found) => found.is_none(),
                    };
                    SystemState {
                        present: entry.is_some(),
                        value: entry.map(|e| e.value.clone()),
                        id: entry.and_then(|e| e.id.clone()),
                        marker: entry.and_then(|e| e.marker.clone()),
                        in_sync,
                    }
                })
                .collect();
            HostStatus {
                hostname: hostname.to_string(),
                overall: overall_status(source_value.is_some(), &systems),
                source_value,
                systems,
            }
        })
        .collect()
}

/// Row filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusFilter {
    /// Hide rows that are fully in sync
    pub out_of_sync_only: bool,
    /// Case-insensitive hostname substring
    pub hostname: Option<String>,
}

impl StatusFilter {
    /// Whether `row` passes the filter.
    #[must_use]
    pub fn matches(&self, row: &HostStatus) -> bool {
        if self.out_of_sync_only && row.overall == OverallStatus::FullyInSync {
            return false;
        }
        self.hostname.as_ref().is_none_or(|needle| {
            row.hostname
                .to_lowercase()
                .contains(&needle.to_lowercase())
        })
    }
}

/// Row counts per overall status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusSummary {
    /// Rows evaluated
    pub total: usize,
    /// Fully in sync
    pub fully_in_sync: usize,
    /// Partially in sync
    pub partially_in_sync: usize,
    /// Out of sync
    pub out_of_sync: usize,
    /// Source only
    pub source_only: usize,
}

impl StatusSummary {
    /// Count `rows`.
    #[must_use]
    pub fn from_rows(rows: &[HostStatus]) -> Self {
        rows.iter().fold(Self::default(), |mut acc, row| {
            acc.total += 1;
            match row.overall {
                OverallStatus::FullyInSync => acc.fully_in_sync += 1,
                OverallStatus::PartiallyInSync => acc.partially_in_sync += 1,
                OverallStatus::OutOfSync => acc.out_of_sync += 1,
                OverallStatus::SourceOnly => acc.source_only += 1,
            }
            acc
        })
    }

    /// Whether any row is out of sync or partially in sync.
    #[must_use]
    pub fn needs_attention(&self) -> bool {
        self.out_of_sync > 0 || self.partially_in_sync > 0
    }
}

impl fmt::Display for StatusSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} hostnames: {} in sync, {} partial, {} out of sync, {} source only",
            self.total,
            self.fully_in_sync,
            self.partially_in_sync,
            self.out_of_sync,
            self.source_only
        )
    }
}

fn cell(state: &SystemState, show_ips: bool) -> String {
    let mark = match (state.present, state.in_sync) {
        (true, true) => "✓",
        (true, false) => "✗",
        (false, true) => "-",
        (false, false) => "missing",
    };
    match (&state.value, show_ips) {
        (Some(value), true) => format!("{mark} {value}"),
        _ => mark.to_string(),
    }
}

/// Rows rendered as a padded table, one column per system.
pub struct StatusTable<'a> {
    system_names: &'a [String],
    rows: &'a [HostStatus],
    show_ips: bool,
}

impl<'a> StatusTable<'a> {
    /// Lay out `rows` under `system_names`; `show_ips` adds the values to each cell.
    #[must_use]
    pub fn new(system_names: &'a [String], rows: &'a [HostStatus], show_ips: bool) -> Self {
        Self {
            system_names,
            rows,
            show_ips,
        }
    }
}

impl fmt::Display for StatusTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = if self.show_ips { 24 } else { 10 };

        write!(f, "{:<40} {:<12}", "HOSTNAME", "STATUS")?;
        if self.show_ips {
            write!(f, " {:<width$}", "SOURCE")?;
        }
        for name in self.system_names {
            write!(f, " {name:<width$}")?;
        }
        writeln!(f)?;

        for row in self.rows {
            write!(f, "{:<40} {:<12}", row.hostname, row.overall.to_string())?;
            if self.show_ips {
                write!(f, " {:<width$}", row.source_value.as_deref().unwrap_or("-"))?;
            }
            for state in &row.systems {
                write!(f, " {:<width$}", cell(state, self.show_ips))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;
