// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory [`DnsTarget`] for unit tests.

use super::target::DnsTarget;
use super::types::{ManagedEntry, OwnershipRule};
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

pub(crate) struct MemoryTarget {
    pub name: String,
    pub rule: OwnershipRule,
    pub activation: bool,
    pub entries: Mutex<Vec<ManagedEntry>>,
    pub failing_keys: HashSet<String>,
    pub fail_list: bool,
    pub fail_activate: bool,
    pub activations: Mutex<usize>,
    next_id: Mutex<usize>,
}

impl MemoryTarget {
    pub fn marker_based(name: &str, entries: Vec<ManagedEntry>) -> Self {
        Self {
            name: name.to_string(),
            rule: OwnershipRule::Marker,
            activation: true,
            entries: Mutex::new(entries),
            failing_keys: HashSet::new(),
            fail_list: false,
            fail_activate: false,
            activations: Mutex::new(0),
            next_id: Mutex::new(0),
        }
    }

    pub fn address_based(name: &str, address: &str, entries: Vec<ManagedEntry>) -> Self {
        Self {
            rule: OwnershipRule::SourceAddress(address.to_string()),
            activation: false,
            ..Self::marker_based(name, entries)
        }
    }

    pub fn failing_on(mut self, key: &str) -> Self {
        self.failing_keys.insert(key.to_string());
        self
    }

    pub fn snapshot(&self) -> Vec<ManagedEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn activation_count(&self) -> usize {
        *self.activations.lock().unwrap()
    }

    fn check(&self, key: &str) -> Result<()> {
        if self.failing_keys.contains(key) {
            bail!("injected failure for {key}");
        }
        Ok(())
    }
}

/// Owned-looking entry with an id and marker.
pub(crate) fn entry(fqdn: &str, value: &str, marker: &str) -> ManagedEntry {
    let mut entry = ManagedEntry::from_fqdn(fqdn, value, Some(marker));
    entry.id = Some(format!("id-{fqdn}"));
    entry
}

#[async_trait]
impl DnsTarget for MemoryTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn ownership(&self) -> OwnershipRule {
        self.rule.clone()
    }

    async fn list_entries(&self) -> Result<Vec<ManagedEntry>> {
        if self.fail_list {
            bail!("listing unavailable");
        }
        Ok(self.snapshot())
    }

    async fn create_entry(&self, entry: &ManagedEntry) -> Result<Option<String>> {
        self.check(&entry.key())?;
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        let id = format!("new-{next}");
        let mut created = entry.clone();
        created.id = Some(id.clone());
        self.entries.lock().unwrap().push(created);
        Ok(Some(id))
    }

    async fn update_entry(&self, current: &ManagedEntry, desired: &ManagedEntry) -> Result<()> {
        self.check(&current.key())?;
        let mut entries = self.entries.lock().unwrap();
        let Some(slot) = entries.iter_mut().find(|e| e == &current) else {
            bail!("no such entry {}", current.key());
        };
        *slot = desired.clone();
        Ok(())
    }

    async fn delete_entry(&self, entry: &ManagedEntry) -> Result<()> {
        self.check(&entry.key())?;
        self.entries.lock().unwrap().retain(|e| e != entry);
        Ok(())
    }

    fn requires_activation(&self) -> bool {
        self.activation
    }

    async fn activate(&self) -> Result<()> {
        *self.activations.lock().unwrap() += 1;
        if self.fail_activate {
            bail!("reconfigure failed");
        }
        Ok(())
    }
}
