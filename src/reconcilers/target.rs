// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Target systems the reconciler writes to.
//!
//! [`DnsTarget`] hides the backend's wire shape behind [`ManagedEntry`]; the
//! adapters below map OPNsense host overrides and AdGuard Home rewrites onto it.

use super::types::{ManagedEntry, OwnershipRule};
use crate::api::adguard::{AdguardClient, Rewrite};
use crate::api::unbound::{HostOverride, UnboundClient};
use crate::errors::ApiError;
use anyhow::Result;
use async_trait::async_trait;

/// A DNS system whose entries are reconciled against a hostname mapping.
#[async_trait]
pub trait DnsTarget: Send + Sync {
    /// Name used in logs and reports.
    fn name(&self) -> &str;

    /// How this target recognises entries created by this tool.
    fn ownership(&self) -> OwnershipRule;

    /// Every entry currently in the target.
    async fn list_entries(&self) -> Result<Vec<ManagedEntry>>;

    /// Create `entry`, returning its identifier when the backend assigns one.
    async fn create_entry(&self, entry: &ManagedEntry) -> Result<Option<String>>;

    /// Replace `current` with `desired`.
    async fn update_entry(&self, current: &ManagedEntry, desired: &ManagedEntry) -> Result<()>;

    /// Delete `entry`.
    async fn delete_entry(&self, entry: &ManagedEntry) -> Result<()>;

    /// Whether mutations only take effect after [`DnsTarget::activate`].
    fn requires_activation(&self) -> bool {
        false
    }

    /// Make staged mutations live.
    async fn activate(&self) -> Result<()> {
        Ok(())
    }
}

/// OPNsense Unbound host overrides; ownership by description marker.
pub struct UnboundTarget {
    client: UnboundClient,
}

impl UnboundTarget {
    /// Adapt `client`.
    #[must_use]
    pub fn new(client: UnboundClient) -> Self {
        Self { client }
    }

    fn required_id<'a>(entry: &'a ManagedEntry, operation: &'static str) -> Result<&'a str> {
        entry
            .id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                ApiError::IdentifierRequired {
                    operation,
                    fqdn: entry.key(),
                }
                .into()
            })
    }
}

fn to_override(entry: &ManagedEntry) -> HostOverride {
    let mut host = HostOverride::new(
        &entry.hostname,
        &entry.domain,
        &entry.value,
        entry.marker.as_deref().unwrap_or_default(),
    );
    host.enabled = if entry.enabled { "1" } else { "0" }.to_string();
    host
}

impl From<HostOverride> for ManagedEntry {
    fn from(host: HostOverride) -> Self {
        let enabled = host.is_enabled();
        Self {
            id: (!host.uuid.is_empty()).then_some(host.uuid),
            hostname: host.host,
            domain: host.domain,
            value: host.server,
            marker: Some(host.description),
            enabled,
        }
    }
}

#[async_trait]
impl DnsTarget for UnboundTarget {
    fn name(&self) -> &str {
        "Unbound"
    }

    fn ownership(&self) -> OwnershipRule {
        OwnershipRule::Marker
    }

    async fn list_entries(&self) -> Result<Vec<ManagedEntry>> {
        Ok(self
            .client
            .list_overrides()
            .await?
            .into_iter()
            .map(ManagedEntry::from)
            .collect())
    }

    async fn create_entry(&self, entry: &ManagedEntry) -> Result<Option<String>> {
        let uuid = self.client.add_override(&to_override(entry)).await?;
        Ok(Some(uuid))
    }

    async fn update_entry(&self, current: &ManagedEntry, desired: &ManagedEntry) -> Result<()> {
        let mut host = to_override(desired);
        host.uuid = Self::required_id(current, "update")?.to_string();
        self.client.update_override(&host).await
    }

    async fn delete_entry(&self, entry: &ManagedEntry) -> Result<()> {
        self.client
            .delete_override(Self::required_id(entry, "delete")?)
            .await
    }

    fn requires_activation(&self) -> bool {
        true
    }

    async fn activate(&self) -> Result<()> {
        self.client.reconfigure().await
    }
}

/// AdGuard Home rewrites; ownership by answering with the proxy address.
pub struct AdguardTarget {
    client: AdguardClient,
    proxy_address: String,
}

impl AdguardTarget {
    /// Adapt `client`; rewrites answering with `proxy_address` may be owned.
    #[must_use]
    pub fn new(client: AdguardClient, proxy_address: impl Into<String>) -> Self {
        Self {
            client,
            proxy_address: proxy_address.into(),
        }
    }
}

fn to_rewrite(entry: &ManagedEntry) -> Rewrite {
    Rewrite::new(&entry.key(), &entry.value)
}

#[async_trait]
impl DnsTarget for AdguardTarget {
    fn name(&self) -> &str {
        "AdGuard Home"
    }

    fn ownership(&self) -> OwnershipRule {
        OwnershipRule::SourceAddress(self.proxy_address.clone())
    }

    async fn list_entries(&self) -> Result<Vec<ManagedEntry>> {
        Ok(self
            .client
            .list_rewrites()
            .await?
            .into_iter()
            .map(|r| ManagedEntry::from_fqdn(&r.domain, &r.answer, None))
            .collect())
    }

    async fn create_entry(&self, entry: &ManagedEntry) -> Result<Option<String>> {
        self.client.add_rewrite(&entry.key(), &entry.value).await?;
        Ok(None)
    }

    async fn update_entry(&self, current: &ManagedEntry, desired: &ManagedEntry) -> Result<()> {
        self.client
            .update_rewrite(&to_rewrite(current), &to_rewrite(desired))
            .await
    }

    async fn delete_entry(&self, entry: &ManagedEntry) -> Result<()> {
        self.client.delete_rewrite(&entry.key(), &entry.value).await
    }
}

#[cfg(test)]
#[path = "target_tests.rs"]
mod target_tests;
