// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Change planning: mapping vs. classified entries.

use super::types::{ChangePlan, Classification};
use crate::source::HostnameMapping;
use tracing::debug;

/// Plan the changes that bring a target in line with `mapping`.
///
/// `marker` is the marker the target should carry; pass `None` for targets
/// without a marker field, which never get marker-only updates.
///
/// - Bare hostnames (no dot) are never synced.
/// - Hostnames held by foreign entries are left alone, including entries that
///   differ only in letter case (backends reject those as duplicates).
/// - A value mismatch wins over a marker mismatch.
/// - Owned entries absent from the mapping are removed, as are owned
///   duplicates of a key another owned entry already holds.
#[must_use]
pub fn plan_changes(
    mapping: &HostnameMapping,
    classification: &Classification,
    marker: Option<&str>,
) -> ChangePlan {
    let mut plan = ChangePlan::default();

    for (hostname, target) in mapping {
        if !hostname.contains('.') {
            debug!(hostname = %hostname, "Skipping hostname without a domain");
            continue;
        }

        match classification.owned.get(hostname) {
            Some(existing) if existing.value != *target => plan.to_update.push(hostname.clone()),
            Some(existing) => {
                if marker.is_some_and(|m| existing.marker.as_deref() != Some(m)) {
                    plan.to_update_marker.push(hostname.clone());
                }
            }
            None if classification.foreign.contains_key(hostname) => {
                debug!(hostname = %hostname, "Hostname held by an entry this tool does not own");
            }
            None => match foreign_case_collision(classification, hostname) {
                Some(existing) => debug!(
                    hostname = %hostname,
                    existing = %existing,
                    "Hostname held, in different case, by an entry this tool does not own"
                ),
                None => plan.to_add.push(hostname.clone()),
            },
        }
    }

    plan.to_remove = classification
        .owned
        .keys()
        .filter(|key| !mapping.contains_key(*key))
        .cloned()
        .collect();

    for duplicate in &classification.shadowed {
        let key = duplicate.key();
        let indistinguishable = duplicate.id.is_none()
            && classification
                .owned
                .get(&key)
                .is_some_and(|kept| kept.value == duplicate.value);
        if indistinguishable {
            // Deleting by key and value would take the kept entry with it
            debug!(key = %key, "Skipping exact duplicate without an identifier");
            continue;
        }
        plan.to_remove_duplicates.push(duplicate.clone());
    }

    plan
}

fn foreign_case_collision<'a>(
    classification: &'a Classification,
    hostname: &str,
) -> Option<&'a str> {
    classification
        .foreign
        .keys()
        .find(|key| key.eq_ignore_ascii_case(hostname))
        .map(String::as_str)
}

#[cfg(test)]
#[path = "diff_tests.rs"]
mod diff_tests;
