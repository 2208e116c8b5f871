// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Typed view of the Caddy configuration and hostname extraction.
//!
//! Only the parts of the configuration that carry routing information are
//! decoded: `apps.http.servers.*.routes`, each route's `match[].host` lists,
//! and `subroute` handlers that nest further routes. Everything else is
//! ignored at decode time, so the walk below never inspects untyped JSON.

use super::{HostnameMapping, RouteSource};
use crate::api::caddy::CaddyClient;
use crate::constants::{CADDY_SUBROUTE_HANDLER, WILDCARD_PREFIX};
use crate::errors::SourceError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

/// Decode a list that may be absent or `null` as empty.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Root of the Caddy configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaddyConfig {
    /// Configured apps
    #[serde(default)]
    pub apps: Option<Apps>,
}

/// The `apps` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Apps {
    /// HTTP app
    #[serde(default)]
    pub http: Option<HttpApp>,
}

/// The `apps.http` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpApp {
    /// Servers keyed by name
    #[serde(default)]
    pub servers: Option<BTreeMap<String, Server>>,
}

/// One HTTP server.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Server {
    /// Top-level routes
    #[serde(default, deserialize_with = "null_as_empty")]
    pub routes: Vec<Route>,
}

/// A route: match conditions plus a handler chain.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Route {
    /// Matcher sets (any set matching selects the route)
    #[serde(rename = "match", default, deserialize_with = "null_as_empty")]
    pub matchers: Vec<MatcherSet>,
    /// Handler chain
    #[serde(default, deserialize_with = "null_as_empty")]
    pub handle: Vec<Handler>,
}

/// A matcher set; only host patterns matter here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatcherSet {
    /// Host patterns such as `app.example.com`, `*.example.com`, `app.example.com:8443`
    #[serde(default, deserialize_with = "null_as_empty")]
    pub host: Vec<String>,
}

/// A handler in a route's chain.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Handler {
    /// Handler module name (`subroute`, `reverse_proxy`, ...)
    #[serde(default)]
    pub handler: String,
    /// Nested routes (`subroute` handlers only)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub routes: Vec<Route>,
}

impl CaddyConfig {
    /// Servers of the HTTP app.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::MissingSection`] naming the first absent section.
    pub fn servers(&self) -> Result<&BTreeMap<String, Server>, SourceError> {
        self.apps
            .as_ref()
            .ok_or(SourceError::MissingSection { section: "apps" })?
            .http
            .as_ref()
            .ok_or(SourceError::MissingSection { section: "http" })?
            .servers
            .as_ref()
            .ok_or(SourceError::MissingSection { section: "servers" })
    }
}

/// Reduce a host pattern to a bare hostname.
///
/// Wildcards yield `None`; a `:port` suffix is dropped.
fn normalize_host(pattern: &str) -> Option<&str> {
    if pattern.starts_with(WILDCARD_PREFIX) {
        return None;
    }
    let host = pattern.split(':').next().unwrap_or(pattern).trim();
    (!host.is_empty()).then_some(host)
}

fn visit_routes<'a>(routes: &'a [Route], seen: &mut HashSet<&'a str>, out: &mut Vec<String>) {
    for route in routes {
        for pattern in route.matchers.iter().flat_map(|m| m.host.iter()) {
            match normalize_host(pattern) {
                Some(host) => {
                    if seen.insert(host) {
                        out.push(host.to_string());
                    }
                }
                None => debug!(pattern = %pattern, "Skipping wildcard host pattern"),
            }
        }

        for handler in &route.handle {
            if handler.handler == CADDY_SUBROUTE_HANDLER {
                visit_routes(&handler.routes, seen, out);
            }
        }
    }
}

/// Collect every hostname routed by the configuration, in discovery order.
///
/// Wildcard patterns are skipped, ports stripped, and duplicates dropped
/// (first occurrence wins).
///
/// # Errors
///
/// Returns [`SourceError::MissingSection`] when `apps`, `http` or `servers` is absent.
pub fn extract_hostnames(config: &CaddyConfig) -> Result<Vec<String>, SourceError> {
    let mut seen = HashSet::new();
    let mut hostnames = Vec::new();
    for server in config.servers()?.values() {
        visit_routes(&server.routes, &mut seen, &mut hostnames);
    }
    Ok(hostnames)
}

/// Flatten the configuration into a mapping of every routed hostname to `target`.
///
/// # Errors
///
/// Returns [`SourceError::MissingSection`] when `apps`, `http` or `servers` is absent.
pub fn extract_mapping(config: &CaddyConfig, target: &str) -> Result<HostnameMapping, SourceError> {
    Ok(extract_hostnames(config)?
        .into_iter()
        .map(|host| (host, target.to_string()))
        .collect())
}

/// Route source backed by the Caddy admin API.
pub struct CaddySource {
    client: CaddyClient,
}

impl CaddySource {
    /// Wrap a Caddy client; hostnames map to the client's server address.
    #[must_use]
    pub fn new(client: CaddyClient) -> Self {
        Self { client }
    }

    /// Address every extracted hostname maps to.
    #[must_use]
    pub fn proxy_address(&self) -> &str {
        self.client.server_ip()
    }
}

#[async_trait]
impl RouteSource for CaddySource {
    fn describe(&self) -> String {
        format!("Caddy at {}", self.client.server_ip())
    }

    async fn fetch_mapping(&self) -> Result<HostnameMapping> {
        let config = self.client.fetch_config().await?;
        let mapping = extract_mapping(&config, self.client.server_ip())
            .context("Failed to extract hostnames from Caddy configuration")?;
        if mapping.is_empty() {
            warn!("No hostnames found in Caddy config");
        }
        debug!(count = mapping.len(), "Extracted Caddy hostnames");
        Ok(mapping)
    }
}

#[cfg(test)]
#[path = "caddy_tests.rs"]
mod caddy_tests;
