// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `status`: read-only comparison of Caddy, Unbound and AdGuard Home.

use super::entries::unbound_client;
use super::sync::{CaddyArgs, CommonSyncArgs};
use super::Output;
use crate::api::adguard::AdguardClient;
use crate::config::AppConfig;
use crate::constants::{
    LEGACY_MARKER_CADDY, MARKER_CADDY_SYNC, MARKER_CADDY_SYNC_ADGUARD, MARKER_CADDY_SYNC_ALL,
};
use crate::reconcilers::{AdguardTarget, DnsTarget, UnboundTarget};
use crate::source::RouteSource;
use crate::status::{
    build_status, HostStatus, StatusFilter, StatusSummary, StatusTable, SystemSnapshot,
};
use anyhow::{Context, Result};
use clap::Args;
use std::process::ExitCode;
use tracing::info;

/// Arguments for `status`
#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub caddy: CaddyArgs,

    /// Current marker of tool-created resolver entries
    #[arg(long, value_name = "MARKER")]
    pub description: Option<String>,

    /// Older marker still treated as tool-created (repeatable)
    #[arg(long = "legacy-desc", value_name = "MARKER")]
    pub legacy_desc: Vec<String>,

    /// Do not evaluate Unbound
    #[arg(long)]
    pub skip_unbound: bool,

    /// Do not evaluate AdGuard Home
    #[arg(long)]
    pub skip_adguard: bool,

    /// Only show hostnames that are not fully in sync
    #[arg(long)]
    pub out_of_sync_only: bool,

    /// Only show hostnames containing this text
    #[arg(long)]
    pub hostname: Option<String>,

    /// Show the value each system holds
    #[arg(long)]
    pub show_ips: bool,

    /// Print a single summary line
    #[arg(long)]
    pub compact: bool,
}

async fn snapshot(target: &dyn DnsTarget) -> Result<SystemSnapshot> {
    let entries = target
        .list_entries()
        .await
        .with_context(|| format!("Failed to list entries on {}", target.name()))?;
    Ok(SystemSnapshot {
        name: target.name().to_string(),
        rule: target.ownership(),
        entries,
    })
}

/// Run `status`.
///
/// Exits with failure when any hostname is out of sync or partially in sync.
///
/// # Errors
///
/// Returns an error when configuration is invalid or a system cannot be read.
pub async fn execute(config: &AppConfig, args: &StatusArgs, output: Output) -> Result<ExitCode> {
    let options = CommonSyncArgs {
        description: args.description.clone(),
        legacy_desc: args.legacy_desc.clone(),
        ..CommonSyncArgs::default()
    }
    .options(
        MARKER_CADDY_SYNC_ALL,
        &[MARKER_CADDY_SYNC, MARKER_CADDY_SYNC_ADGUARD, LEGACY_MARKER_CADDY],
    );

    let source = args.caddy.source()?;
    let mapping = source
        .fetch_mapping()
        .await
        .with_context(|| format!("Failed to fetch hostnames from {}", source.describe()))?;

    let mut snapshots = Vec::new();
    if !args.skip_unbound {
        snapshots.push(snapshot(&UnboundTarget::new(unbound_client(config)?)).await?);
    }
    if !args.skip_adguard {
        match config.adguard()? {
            Some(settings) => {
                let target = AdguardTarget::new(AdguardClient::new(&settings)?, source.proxy_address());
                snapshots.push(snapshot(&target).await?);
            }
            None => info!("AdGuard Home disabled in config, skipping"),
        }
    }

    let rows = build_status(&mapping, &snapshots, &options);
    let summary = StatusSummary::from_rows(&rows);

    if args.compact {
        println!("{summary}");
    } else {
        let filter = StatusFilter {
            out_of_sync_only: args.out_of_sync_only,
            hostname: args.hostname.clone(),
        };
        let shown: Vec<HostStatus> = rows.into_iter().filter(|r| filter.matches(r)).collect();
        let names: Vec<String> = snapshots.iter().map(|s| s.name.clone()).collect();
        output.info(format!("Source: {} ({} hostnames)", source.describe(), mapping.len()));
        print!("{}", StatusTable::new(&names, &shown, args.show_ips));
        println!();
        println!("{summary}");
    }

    Ok(if summary.needs_attention() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
