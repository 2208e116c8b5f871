// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation commands.
//!
//! Every command builds one [`RouteSource`] and a list of targets, then runs
//! them through [`unified_sync`], even when there is only one target, so
//! reporting and exit codes behave the same everywhere.

use super::entries::unbound_client;
use super::Output;
use crate::api::adguard::AdguardClient;
use crate::api::caddy::CaddyClient;
use crate::api::cloudflare::{CloudflareClient, Tunnel};
use crate::config::AppConfig;
use crate::constants::{
    DEFAULT_CADDY_IP, DEFAULT_CADDY_PORT, DEFAULT_CADDY_SUBDOMAIN, DEFAULT_DIRECT_SUBDOMAIN,
    LEGACY_MARKER_CADDY, LEGACY_MARKER_CLOUDFLARE, MARKER_CADDY_SYNC, MARKER_CADDY_SYNC_ADGUARD,
    MARKER_CADDY_SYNC_ALL, MARKER_CADDY_SYNC_CLOUDFLARE, MARKER_CLOUDFLARE_SYNC,
};
use crate::errors::ConfigError;
use crate::prompt::{GuardedTarget, TerminalConfirmer};
use crate::reconcilers::{unified_sync, AdguardTarget, DnsTarget, SyncOptions, UnboundTarget};
use crate::report::UnifiedReport;
use crate::source::caddy::CaddySource;
use crate::source::split_horizon::{SplitHorizonOptions, SplitHorizonSource};
use crate::source::tunnel::TunnelSource;
use crate::source::RouteSource;
use anyhow::{bail, Context, Result};
use clap::Args;
use std::process::ExitCode;
use tracing::{info, warn};

/// Flags shared by every reconciliation command.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonSyncArgs {
    /// Show what would change without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Marker written to the description of created entries
    #[arg(long, value_name = "MARKER")]
    pub description: Option<String>,

    /// Older marker still treated as tool-owned (repeatable)
    #[arg(long = "legacy-desc", value_name = "MARKER")]
    pub legacy_desc: Vec<String>,

    /// Ask before every change
    #[arg(long)]
    pub prompt: bool,
}

impl CommonSyncArgs {
    /// Sync options with command defaults for unset markers.
    #[must_use]
    pub fn options(&self, default_marker: &str, default_legacy: &[&str]) -> SyncOptions {
        let legacy_markers = if self.legacy_desc.is_empty() {
            default_legacy.iter().map(|m| (*m).to_string()).collect()
        } else {
            self.legacy_desc.clone()
        };
        SyncOptions {
            legacy_markers,
            dry_run: self.dry_run,
            ..SyncOptions::new(self.description.as_deref().unwrap_or(default_marker))
        }
    }
}

/// Location of the Caddy admin API.
#[derive(Args, Debug, Clone)]
pub struct CaddyArgs {
    /// Caddy server address; synced names resolve here
    #[arg(long, default_value = DEFAULT_CADDY_IP)]
    pub caddy_ip: String,

    /// Caddy admin API port
    #[arg(long, default_value_t = DEFAULT_CADDY_PORT)]
    pub caddy_port: u16,
}

impl CaddyArgs {
    /// Route source for this Caddy server.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn source(&self) -> Result<CaddySource> {
        Ok(CaddySource::new(CaddyClient::new(&self.caddy_ip, self.caddy_port)?))
    }
}

/// Arguments for `caddy-sync` and `caddy-sync-adguard`
#[derive(Args, Debug)]
pub struct CaddySyncArgs {
    #[command(flatten)]
    pub common: CommonSyncArgs,

    #[command(flatten)]
    pub caddy: CaddyArgs,
}

/// Arguments for `caddy-sync-all`
#[derive(Args, Debug)]
pub struct CaddySyncAllArgs {
    #[command(flatten)]
    pub common: CommonSyncArgs,

    #[command(flatten)]
    pub caddy: CaddyArgs,

    /// Sync Unbound only
    #[arg(long, conflicts_with = "adguard_only")]
    pub unbound_only: bool,

    /// Sync AdGuard Home only
    #[arg(long)]
    pub adguard_only: bool,
}

/// Arguments for `caddy-sync-cloudflare`
#[derive(Args, Debug)]
pub struct SplitHorizonArgs {
    #[command(flatten)]
    pub common: CommonSyncArgs,

    #[command(flatten)]
    pub caddy: CaddyArgs,

    /// Domain the derived names live under (e.g. "example.com")
    #[arg(long)]
    pub base_domain: String,

    /// Subdomain for direct access
    #[arg(long, default_value = DEFAULT_DIRECT_SUBDOMAIN)]
    pub direct_subdomain: String,

    /// Subdomain for access through Caddy
    #[arg(long, default_value = DEFAULT_CADDY_SUBDOMAIN)]
    pub caddy_subdomain: String,

    /// Only derive direct-access names
    #[arg(long, conflicts_with = "caddy_only")]
    pub direct_only: bool,

    /// Only derive through-Caddy names
    #[arg(long)]
    pub caddy_only: bool,
}

impl SplitHorizonArgs {
    /// Split-horizon options from the flags.
    #[must_use]
    pub fn split_options(&self) -> SplitHorizonOptions {
        SplitHorizonOptions {
            direct_subdomain: self.direct_subdomain.clone(),
            caddy_subdomain: self.caddy_subdomain.clone(),
            direct: !self.caddy_only,
            caddy: !self.direct_only,
            ..SplitHorizonOptions::new(self.base_domain.clone())
        }
    }
}

/// Arguments for `cloudflare-sync`
#[derive(Args, Debug)]
pub struct CloudflareSyncArgs {
    #[command(flatten)]
    pub common: CommonSyncArgs,

    /// Tunnel whose ingress rules are synced (overrides config)
    #[arg(long)]
    pub tunnel_id: Option<String>,

    /// Cloudflare API token (overrides config)
    #[arg(long)]
    pub api_token: Option<String>,

    /// Cloudflare account id (overrides config)
    #[arg(long)]
    pub account_id: Option<String>,

    /// List the account's tunnels instead of syncing
    #[arg(long)]
    pub list_tunnels: bool,
}

fn unbound_target(config: &AppConfig) -> Result<Box<dyn DnsTarget>> {
    Ok(Box::new(UnboundTarget::new(unbound_client(config)?)))
}

fn adguard_target(config: &AppConfig, proxy_address: &str) -> Result<Option<Box<dyn DnsTarget>>> {
    let Some(settings) = config.adguard()? else {
        return Ok(None);
    };
    let client = AdguardClient::new(&settings)?;
    Ok(Some(Box::new(AdguardTarget::new(client, proxy_address))))
}

fn guard(targets: Vec<Box<dyn DnsTarget>>, prompt: bool) -> Vec<Box<dyn DnsTarget>> {
    if !prompt {
        return targets;
    }
    targets
        .into_iter()
        .map(|t| Box::new(GuardedTarget::new(t, TerminalConfirmer)) as Box<dyn DnsTarget>)
        .collect()
}

async fn run(
    source: &dyn RouteSource,
    targets: Vec<Box<dyn DnsTarget>>,
    common: &CommonSyncArgs,
    options: &SyncOptions,
    output: Output,
) -> Result<ExitCode> {
    let targets = guard(targets, common.prompt);
    let result = unified_sync(source, &targets, options).await?;

    if !output.quiet || result.error.is_some() {
        print!("{}", UnifiedReport::new(&result, options.dry_run));
    }

    if result.error.is_some() {
        return Ok(ExitCode::FAILURE);
    }
    for (name, e) in result.failures() {
        warn!(target = %name, error = ?e, "Target failed; other targets were synced");
    }
    Ok(ExitCode::SUCCESS)
}

/// `caddy-sync`: Caddy to Unbound.
///
/// # Errors
///
/// Returns an error when configuration is invalid or Caddy cannot be read.
pub async fn caddy_sync_unbound(config: &AppConfig, args: &CaddySyncArgs, output: Output) -> Result<ExitCode> {
    let options = args.common.options(MARKER_CADDY_SYNC, &[LEGACY_MARKER_CADDY]);
    let source = args.caddy.source()?;
    let targets = vec![unbound_target(config)?];
    run(&source, targets, &args.common, &options, output).await
}

/// `caddy-sync-adguard`: Caddy to AdGuard Home.
///
/// # Errors
///
/// Returns an error when AdGuard Home is disabled or misconfigured, or Caddy cannot be read.
pub async fn caddy_sync_adguard(config: &AppConfig, args: &CaddySyncArgs, output: Output) -> Result<ExitCode> {
    let options = args
        .common
        .options(MARKER_CADDY_SYNC_ADGUARD, &[LEGACY_MARKER_CADDY]);
    let source = args.caddy.source()?;
    let Some(target) = adguard_target(config, source.proxy_address())? else {
        bail!(ConfigError::Disabled { section: "adguard" });
    };
    run(&source, vec![target], &args.common, &options, output).await
}

/// `caddy-sync-all`: Caddy to Unbound and, when enabled, AdGuard Home.
///
/// # Errors
///
/// Returns an error when configuration is invalid, no target is selected, or
/// Caddy cannot be read.
pub async fn caddy_sync_all(config: &AppConfig, args: &CaddySyncAllArgs, output: Output) -> Result<ExitCode> {
    let options = args.common.options(MARKER_CADDY_SYNC_ALL, &[LEGACY_MARKER_CADDY]);
    let source = args.caddy.source()?;

    let mut targets = Vec::new();
    if !args.adguard_only {
        targets.push(unbound_target(config)?);
    }
    if !args.unbound_only {
        match adguard_target(config, source.proxy_address())? {
            Some(target) => targets.push(target),
            None if args.adguard_only => bail!(ConfigError::Disabled { section: "adguard" }),
            None => info!("AdGuard Home disabled in config, syncing Unbound only"),
        }
    }

    run(&source, targets, &args.common, &options, output).await
}

/// `caddy-sync-cloudflare`: split-horizon names derived from Caddy to Unbound.
///
/// # Errors
///
/// Returns an error when configuration is invalid or Caddy cannot be read.
pub async fn caddy_sync_split(config: &AppConfig, args: &SplitHorizonArgs, output: Output) -> Result<ExitCode> {
    if args.base_domain.trim().is_empty() {
        bail!("--base-domain must not be empty");
    }
    let options = args
        .common
        .options(MARKER_CADDY_SYNC_CLOUDFLARE, &[LEGACY_MARKER_CLOUDFLARE]);
    let source = SplitHorizonSource::new(args.caddy.source()?, args.split_options());
    let targets = vec![unbound_target(config)?];
    run(&source, targets, &args.common, &options, output).await
}

fn print_tunnels(tunnels: &[Tunnel]) {
    if tunnels.is_empty() {
        println!("No tunnels found.");
        return;
    }
    println!("{:<38} {:<24} {:<22} CONNECTIONS", "ID", "NAME", "CREATED");
    for tunnel in tunnels {
        let created = tunnel
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<38} {:<24} {:<22} {}",
            tunnel.id,
            tunnel.name,
            created,
            tunnel.connections.len()
        );
    }
}

/// `cloudflare-sync`: tunnel ingress hostnames to Unbound.
///
/// # Errors
///
/// Returns an error when configuration is invalid or the tunnel cannot be read.
pub async fn cloudflare_sync(config: &AppConfig, args: &CloudflareSyncArgs, output: Output) -> Result<ExitCode> {
    let mut config = config.clone();
    if let Some(token) = &args.api_token {
        config.cloudflare.api_token.clone_from(token);
    }
    if let Some(account) = &args.account_id {
        config.cloudflare.account_id.clone_from(account);
    }
    let client = CloudflareClient::new(&config.cloudflare()?)?;

    if args.list_tunnels {
        let tunnels = client
            .list_tunnels()
            .await
            .context("Failed to list Cloudflare tunnels")?;
        print_tunnels(&tunnels);
        return Ok(ExitCode::SUCCESS);
    }

    let tunnel_id = args
        .tunnel_id
        .clone()
        .unwrap_or_else(|| config.cloudflare.tunnel_id.clone());
    if tunnel_id.trim().is_empty() {
        return Err(ConfigError::MissingField {
            section: "cloudflare",
            field: "tunnel_id",
            env: crate::constants::ENV_CLOUDFLARE_TUNNEL_ID,
        }
        .into());
    }

    let options = args
        .common
        .options(MARKER_CLOUDFLARE_SYNC, &[LEGACY_MARKER_CLOUDFLARE]);
    let source = TunnelSource::new(client, tunnel_id);
    let targets = vec![unbound_target(&config)?];
    run(&source, targets, &args.common, &options, output).await
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod sync_tests;
