// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Cloudflare tunnel API client.
//!
//! Every Cloudflare v4 response is wrapped in an envelope carrying a `success`
//! flag; a `false` flag is an error even when the HTTP status is 200.

use super::{api_request, http_client, Auth};
use crate::config::CloudflareSettings;
use crate::constants::CLOUDFLARE_TIMEOUT_SECS;
use crate::errors::ApiError;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

const BACKEND: &str = "Cloudflare";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<EnvelopeError>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// A Cloudflare tunnel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Tunnel {
    /// Tunnel id
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Deletion time, for deleted tunnels
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    /// Active connector connections
    #[serde(default)]
    pub connections: Vec<TunnelConnection>,
}

/// A connector connection to a Cloudflare data center.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TunnelConnection {
    /// Connection id
    #[serde(default)]
    pub id: String,
    /// Data center code
    #[serde(default)]
    pub colo_name: String,
    /// When the connection was opened
    #[serde(default)]
    pub opened_at: Option<DateTime<Utc>>,
}

/// One ingress rule of a tunnel configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IngressRule {
    /// Public hostname (empty for the catch-all rule)
    #[serde(default)]
    pub hostname: String,
    /// Origin service, e.g. `http://10.0.0.5:8080`
    #[serde(default)]
    pub service: String,
}

#[derive(Debug, Default, Deserialize)]
struct TunnelConfiguration {
    #[serde(default)]
    config: Option<IngressConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct IngressConfig {
    #[serde(default)]
    ingress: Vec<IngressRule>,
}

/// Strip an `http://` or `https://` prefix from a service locator.
#[must_use]
pub fn strip_service_scheme(service: &str) -> &str {
    service
        .strip_prefix("https://")
        .or_else(|| service.strip_prefix("http://"))
        .unwrap_or(service)
}

/// Client for the Cloudflare tunnel API.
#[derive(Debug, Clone)]
pub struct CloudflareClient {
    client: HttpClient,
    base_url: String,
    api_token: String,
    account_id: String,
}

impl CloudflareClient {
    /// Create a client from validated settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(settings: &CloudflareSettings) -> Result<Self> {
        Ok(Self {
            client: http_client(CLOUDFLARE_TIMEOUT_SECS, false)?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_token: settings.api_token.clone(),
            account_id: settings.account_id.clone(),
        })
    }

    async fn get<T: DeserializeOwned + Default>(&self, endpoint: &str) -> Result<T> {
        let url = format!("{}/accounts/{}{}", self.base_url, self.account_id, endpoint);
        let response = api_request::<()>(
            &self.client,
            BACKEND,
            Auth::Bearer(&self.api_token),
            "GET",
            &url,
            None,
        )
        .await?;

        let envelope: Envelope<T> = serde_json::from_str(&response.body)
            .with_context(|| format!("Failed to parse {BACKEND} response from {endpoint}"))?;
        if !envelope.success {
            let message = envelope
                .errors
                .iter()
                .map(|e| format!("{} (code {})", e.message, e.code))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ApiError::Rejected {
                backend: BACKEND,
                message,
            }
            .into());
        }
        Ok(envelope.result.unwrap_or_default())
    }

    /// List the account's tunnels that have not been deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the envelope reports failure.
    pub async fn list_tunnels(&self) -> Result<Vec<Tunnel>> {
        let tunnels: Vec<Tunnel> = self.get("/cfd_tunnel?is_deleted=false").await?;
        debug!(count = tunnels.len(), "Fetched Cloudflare tunnels");
        Ok(tunnels)
    }

    /// Fetch the ingress rules of a tunnel.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the envelope reports failure.
    pub async fn tunnel_ingress(&self, tunnel_id: &str) -> Result<Vec<IngressRule>> {
        let configuration: TunnelConfiguration = self
            .get(&format!("/cfd_tunnel/{tunnel_id}/configurations"))
            .await
            .with_context(|| format!("Failed to fetch configuration of tunnel {tunnel_id}"))?;
        let ingress = configuration.config.map(|c| c.ingress).unwrap_or_default();
        debug!(tunnel_id = %tunnel_id, rules = ingress.len(), "Fetched tunnel ingress rules");
        Ok(ingress)
    }

    /// Hostname → service locator map of a tunnel, scheme stripped.
    ///
    /// Catch-all rules (no hostname) are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the ingress rules cannot be fetched.
    pub async fn list_routes(&self, tunnel_id: &str) -> Result<BTreeMap<String, String>> {
        Ok(self
            .tunnel_ingress(tunnel_id)
            .await?
            .into_iter()
            .filter(|rule| !rule.hostname.is_empty())
            .map(|rule| {
                let service = strip_service_scheme(&rule.service).to_string();
                (rule.hostname, service)
            })
            .collect())
    }
}

#[cfg(test)]
#[path = "cloudflare_tests.rs"]
mod cloudflare_tests;
