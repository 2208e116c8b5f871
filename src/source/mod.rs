// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Route sources: where the desired hostname mapping comes from.
//!
//! - [`caddy`] - the Caddy route table (every hostname maps to the proxy)
//! - [`tunnel`] - a Cloudflare tunnel's ingress rules
//! - [`split_horizon`] - direct/proxied name pairs derived from the Caddy routes
//!
//! A source is fetched exactly once per run; the resulting [`HostnameMapping`]
//! is shared read-only by every target being reconciled.

pub mod caddy;
pub mod split_horizon;
pub mod tunnel;

use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Desired state: fully-qualified hostname → target address or service locator.
pub type HostnameMapping = BTreeMap<String, String>;

/// Something that can produce the desired hostname mapping.
#[async_trait]
pub trait RouteSource: Send + Sync {
    /// Human-readable description for logs and reports.
    fn describe(&self) -> String;

    /// Fetch the current mapping.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is unreachable or its configuration
    /// cannot be interpreted. Callers treat this as fatal for the whole run.
    async fn fetch_mapping(&self) -> Result<HostnameMapping>;
}
