// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Caddy admin API client.

use super::{api_request, build_api_url, http_client, Auth};
use crate::constants::{CADDY_CONFIG_PATH, CADDY_TIMEOUT_SECS};
use crate::source::caddy::CaddyConfig;
use anyhow::{Context, Result};
use reqwest::Client as HttpClient;
use tracing::debug;

const BACKEND: &str = "Caddy";

/// Client for the Caddy admin API.
#[derive(Debug, Clone)]
pub struct CaddyClient {
    client: HttpClient,
    base_url: String,
    server_ip: String,
}

impl CaddyClient {
    /// Create a client for the admin API at `server_ip:port`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(server_ip: &str, port: u16) -> Result<Self> {
        Ok(Self {
            client: http_client(CADDY_TIMEOUT_SECS, false)?,
            base_url: build_api_url(&format!("{server_ip}:{port}")),
            server_ip: server_ip.to_string(),
        })
    }

    /// Address of the Caddy server; every proxied hostname resolves here.
    #[must_use]
    pub fn server_ip(&self) -> &str {
        &self.server_ip
    }

    /// Fetch and decode the running configuration.
    ///
    /// A server with no configuration answers `null`, which decodes to an empty
    /// [`CaddyConfig`] and fails extraction with a missing `apps` section.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the configuration does not decode.
    pub async fn fetch_config(&self) -> Result<CaddyConfig> {
        let url = format!("{}{}", self.base_url, CADDY_CONFIG_PATH);
        let response = api_request::<()>(&self.client, BACKEND, Auth::None, "GET", &url, None)
            .await
            .context("Failed to fetch Caddy configuration")?;

        let config: Option<CaddyConfig> = serde_json::from_str(&response.body)
            .context("Failed to decode Caddy configuration")?;
        debug!(url = %url, bytes = response.body.len(), "Fetched Caddy configuration");
        Ok(config.unwrap_or_default())
    }
}
