// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Ownership classification.
//!
//! Only entries this tool created may be updated or removed; everything else is
//! left alone even when its hostname collides with the source mapping.

use super::types::{Classification, ManagedEntry, OwnershipRule, SyncOptions};
use crate::source::HostnameMapping;
use tracing::{debug, warn};

/// Whether `entry` is owned under `rule`.
#[must_use]
pub fn is_owned(
    entry: &ManagedEntry,
    rule: &OwnershipRule,
    mapping: &HostnameMapping,
    options: &SyncOptions,
) -> bool {
    match rule {
        OwnershipRule::Marker => entry
            .marker
            .as_deref()
            .is_some_and(|marker| options.is_owned_marker(marker)),
        OwnershipRule::SourceAddress(address) => {
            entry.value == *address && mapping.contains_key(&entry.key())
        }
    }
}

/// Partition `entries` into owned and foreign maps.
///
/// The first entry listed for a key wins the map slot. Later entries with the
/// same key go to [`Classification::shadowed`] when owned, so they can be
/// cleaned up, or to [`Classification::foreign_duplicates`] otherwise. Every
/// entry lands in exactly one place.
#[must_use]
pub fn classify(
    entries: Vec<ManagedEntry>,
    rule: &OwnershipRule,
    mapping: &HostnameMapping,
    options: &SyncOptions,
) -> Classification {
    let mut classification = Classification::default();
    for entry in entries {
        let owned = is_owned(&entry, rule, mapping, options);
        let (side, duplicates) = if owned {
            (&mut classification.owned, &mut classification.shadowed)
        } else {
            (&mut classification.foreign, &mut classification.foreign_duplicates)
        };
        let key = entry.key();
        if side.contains_key(&key) {
            if owned {
                warn!(key = %key, id = ?entry.id, "Duplicate owned DNS entry");
            } else {
                debug!(key = %key, id = ?entry.id, "Duplicate foreign DNS entry");
            }
            duplicates.push(entry);
            continue;
        }
        side.insert(key, entry);
    }
    classification
}

#[cfg(test)]
#[path = "ownership_tests.rs"]
mod ownership_tests;
