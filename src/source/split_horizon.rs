// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Split-horizon name derivation.
//!
//! Every proxied service gets two names under a shared base domain: one that
//! resolves straight to the service (`{service}.{direct}.{base}`) and one that
//! resolves to the proxy (`{service}.{caddy}.{base}`). The service name is the
//! first label of the proxied hostname.

use super::caddy::CaddySource;
use super::{HostnameMapping, RouteSource};
use crate::constants::{DEFAULT_CADDY_SUBDOMAIN, DEFAULT_DIRECT_SUBDOMAIN};
use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

/// Which names to derive and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitHorizonOptions {
    /// Base domain, e.g. `example.net`
    pub base_domain: String,
    /// Subdomain for names resolving straight to the service
    pub direct_subdomain: String,
    /// Subdomain for names resolving to the proxy
    pub caddy_subdomain: String,
    /// Derive direct names
    pub direct: bool,
    /// Derive proxied names
    pub caddy: bool,
}

impl SplitHorizonOptions {
    /// Both variants with the default subdomains.
    #[must_use]
    pub fn new(base_domain: impl Into<String>) -> Self {
        Self {
            base_domain: base_domain.into(),
            direct_subdomain: DEFAULT_DIRECT_SUBDOMAIN.to_string(),
            caddy_subdomain: DEFAULT_CADDY_SUBDOMAIN.to_string(),
            direct: true,
            caddy: true,
        }
    }
}

fn service_name(hostname: &str) -> &str {
    hostname.split('.').next().unwrap_or(hostname)
}

/// Derive the split-horizon mapping from a proxy mapping.
///
/// Direct names take the proxy mapping's value, proxied names take
/// `proxy_address`. Each synthesized name is de-duplicated on its own; the
/// first hostname yielding it wins.
#[must_use]
pub fn split_horizon_mapping(
    proxy_mapping: &HostnameMapping,
    proxy_address: &str,
    options: &SplitHorizonOptions,
) -> HostnameMapping {
    let mut mapping = HostnameMapping::new();
    for (hostname, target) in proxy_mapping {
        let service = service_name(hostname);
        if options.direct {
            mapping
                .entry(format!("{service}.{}.{}", options.direct_subdomain, options.base_domain))
                .or_insert_with(|| target.clone());
        }
        if options.caddy {
            mapping
                .entry(format!("{service}.{}.{}", options.caddy_subdomain, options.base_domain))
                .or_insert_with(|| proxy_address.to_string());
        }
    }
    debug!(
        services = proxy_mapping.len(),
        names = mapping.len(),
        "Derived split-horizon names"
    );
    mapping
}

/// Route source deriving split-horizon names from the Caddy routes.
pub struct SplitHorizonSource {
    inner: CaddySource,
    options: SplitHorizonOptions,
}

impl SplitHorizonSource {
    /// Derive names from `inner` according to `options`.
    #[must_use]
    pub fn new(inner: CaddySource, options: SplitHorizonOptions) -> Self {
        Self { inner, options }
    }
}

#[async_trait]
impl RouteSource for SplitHorizonSource {
    fn describe(&self) -> String {
        format!("{} (split-horizon under {})", self.inner.describe(), self.options.base_domain)
    }

    async fn fetch_mapping(&self) -> Result<HostnameMapping> {
        let proxy_mapping = self.inner.fetch_mapping().await?;
        Ok(split_horizon_mapping(
            &proxy_mapping,
            self.inner.proxy_address(),
            &self.options,
        ))
    }
}

#[cfg(test)]
#[path = "split_horizon_tests.rs"]
mod split_horizon_tests;
