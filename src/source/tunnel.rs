// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Cloudflare tunnel ingress as a route source.

use super::{HostnameMapping, RouteSource};
use crate::api::cloudflare::CloudflareClient;
use crate::constants::WILDCARD_PREFIX;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, warn};

/// Drop wildcard hostnames from a tunnel's route map.
#[must_use]
pub fn tunnel_mapping(routes: HostnameMapping) -> HostnameMapping {
    routes
        .into_iter()
        .filter(|(hostname, _)| {
            let wildcard = hostname.starts_with(WILDCARD_PREFIX);
            if wildcard {
                debug!(hostname = %hostname, "Skipping wildcard tunnel hostname");
            }
            !wildcard
        })
        .collect()
}

/// Route source backed by a tunnel's ingress configuration.
pub struct TunnelSource {
    client: CloudflareClient,
    tunnel_id: String,
}

impl TunnelSource {
    /// Read routes of `tunnel_id` through `client`.
    #[must_use]
    pub fn new(client: CloudflareClient, tunnel_id: impl Into<String>) -> Self {
        Self {
            client,
            tunnel_id: tunnel_id.into(),
        }
    }
}

#[async_trait]
impl RouteSource for TunnelSource {
    fn describe(&self) -> String {
        format!("Cloudflare tunnel {}", self.tunnel_id)
    }

    async fn fetch_mapping(&self) -> Result<HostnameMapping> {
        let routes = self
            .client
            .list_routes(&self.tunnel_id)
            .await
            .context("Failed to fetch Cloudflare tunnel routes")?;
        let mapping = tunnel_mapping(routes);
        if mapping.is_empty() {
            warn!(tunnel_id = %self.tunnel_id, "No hostnames found in tunnel configuration");
        }
        Ok(mapping)
    }
}

#[cfg(test)]
#[path = "tunnel_tests.rs"]
mod tunnel_tests;
