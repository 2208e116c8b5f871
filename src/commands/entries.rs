// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Direct management of resolver host overrides.

use super::Output;
use crate::api::unbound::{HostOverride, UnboundClient};
use crate::config::AppConfig;
use crate::errors::ApiError;
use crate::prompt::{confirm_unless_forced, is_interactive_terminal, prompt_with_default, TerminalConfirmer};
use anyhow::{bail, Context, Result};
use clap::Args;
use std::process::ExitCode;
use tracing::debug;

/// Arguments for `list`
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `find`
#[derive(Args, Debug)]
pub struct FindArgs {
    /// Host label to match (case-insensitive)
    #[arg(long, short = 'H')]
    pub host: Option<String>,

    /// Domain to match (case-insensitive)
    #[arg(long, short = 'd')]
    pub domain: Option<String>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `add`
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Host label (e.g. "grafana")
    #[arg(long, short = 'H')]
    pub host: String,

    /// Domain (e.g. "example.com")
    #[arg(long, short = 'd')]
    pub domain: String,

    /// Address the name resolves to
    #[arg(long, short = 's')]
    pub server: String,

    /// Description stored with the override
    #[arg(long, short = 'D', default_value = "")]
    pub description: String,

    /// Create the override disabled
    #[arg(long)]
    pub disabled: bool,

    /// Replace an existing override for the same name instead of failing
    #[arg(long)]
    pub force: bool,
}

/// Arguments for `edit`
#[derive(Args, Debug)]
pub struct EditArgs {
    /// UUID of the override
    pub uuid: String,

    /// New host label
    #[arg(long, short = 'H')]
    pub host: Option<String>,

    /// New domain
    #[arg(long, short = 'd')]
    pub domain: Option<String>,

    /// New address
    #[arg(long, short = 's')]
    pub server: Option<String>,

    /// New description
    #[arg(long, short = 'D')]
    pub description: Option<String>,

    /// Enable or disable the override
    #[arg(long)]
    pub enabled: Option<bool>,

    /// Do not prompt for fields that were not given
    #[arg(long)]
    pub no_prompt: bool,

    /// Activate the change afterwards
    #[arg(long)]
    pub apply: bool,
}

/// Arguments for `delete`
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// UUID of the override
    pub uuid: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'f')]
    pub force: bool,

    /// Activate the change afterwards
    #[arg(long)]
    pub apply: bool,
}

/// Build a resolver client from validated configuration.
///
/// # Errors
///
/// Returns an error when the resolver section is incomplete.
pub fn unbound_client(config: &AppConfig) -> Result<UnboundClient> {
    UnboundClient::new(&config.unbound()?)
}

fn print_table(overrides: &[HostOverride]) {
    if overrides.is_empty() {
        println!("No DNS overrides found.");
        return;
    }
    println!(
        "{:<38} {:<8} {:<20} {:<24} {:<16} DESCRIPTION",
        "UUID", "ENABLED", "HOST", "DOMAIN", "SERVER"
    );
    for o in overrides {
        println!(
            "{:<38} {:<8} {:<20} {:<24} {:<16} {}",
            o.uuid,
            if o.is_enabled() { "yes" } else { "no" },
            o.host,
            o.domain,
            o.server,
            o.description
        );
    }
}

fn print_overrides(overrides: &[HostOverride], json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(overrides).context("Failed to serialize overrides")?
        );
    } else {
        print_table(overrides);
    }
    Ok(())
}

/// Overrides whose host and/or domain equal the given values, ignoring case.
#[must_use]
pub fn filter_overrides(
    overrides: Vec<HostOverride>,
    host: Option<&str>,
    domain: Option<&str>,
) -> Vec<HostOverride> {
    overrides
        .into_iter()
        .filter(|o| host.is_none_or(|h| o.host.eq_ignore_ascii_case(h)))
        .filter(|o| domain.is_none_or(|d| o.domain.eq_ignore_ascii_case(d)))
        .collect()
}

/// `list`
///
/// # Errors
///
/// Returns an error when the resolver cannot be listed.
pub async fn list(config: &AppConfig, args: &ListArgs) -> Result<ExitCode> {
    let client = unbound_client(config)?;
    let overrides = client
        .list_overrides()
        .await
        .context("Failed to list DNS overrides")?;
    print_overrides(&overrides, args.json)?;
    Ok(ExitCode::SUCCESS)
}

/// `find`
///
/// # Errors
///
/// Returns an error when neither `--host` nor `--domain` is given or listing fails.
pub async fn find(config: &AppConfig, args: &FindArgs) -> Result<ExitCode> {
    if args.host.is_none() && args.domain.is_none() {
        bail!("at least one of --host or --domain is required");
    }
    let client = unbound_client(config)?;
    let overrides = client
        .list_overrides()
        .await
        .context("Failed to list DNS overrides")?;
    let matches = filter_overrides(overrides, args.host.as_deref(), args.domain.as_deref());
    debug!(count = matches.len(), "Matched DNS overrides");
    print_overrides(&matches, args.json)?;
    Ok(ExitCode::SUCCESS)
}

/// `add`
///
/// # Errors
///
/// Returns an error when the override exists (without `--force`) or a call fails.
pub async fn add(config: &AppConfig, args: &AddArgs, output: Output) -> Result<ExitCode> {
    let client = unbound_client(config)?;
    let mut entry = HostOverride::new(&args.host, &args.domain, &args.server, &args.description);
    if args.disabled {
        entry.enabled = "0".to_string();
    }

    match client.add_override(&entry).await {
        Ok(uuid) => output.info(format!("Added {} -> {} (UUID {uuid})", entry.fqdn(), entry.server)),
        Err(e) => match e.downcast_ref::<ApiError>() {
            Some(ApiError::Duplicate { uuid, .. }) if args.force => {
                let replacement = HostOverride {
                    uuid: uuid.clone(),
                    ..entry.clone()
                };
                client
                    .update_override(&replacement)
                    .await
                    .with_context(|| format!("Failed to replace DNS override {}", entry.fqdn()))?;
                output.info(format!("Replaced {} -> {} (UUID {uuid})", entry.fqdn(), entry.server));
            }
            _ => return Err(e.context(format!("Failed to add DNS override {}", entry.fqdn()))),
        },
    }

    client.reconfigure().await.context("Failed to apply changes")?;
    output.info("Changes applied.");
    Ok(ExitCode::SUCCESS)
}

/// `edit`
///
/// # Errors
///
/// Returns an error when the override does not exist or a call fails.
pub async fn edit(config: &AppConfig, args: EditArgs, output: Output) -> Result<ExitCode> {
    let client = unbound_client(config)?;
    let current = client.get_override(&args.uuid).await?;
    let interactive = !args.no_prompt && is_interactive_terminal();

    let field = |given: Option<String>, prompt: &str, existing: &str| -> Result<String> {
        match given {
            Some(value) => Ok(value),
            None if interactive => prompt_with_default(prompt, existing),
            None => Ok(existing.to_string()),
        }
    };

    let updated = HostOverride {
        host: field(args.host, "Host", &current.host)?,
        domain: field(args.domain, "Domain", &current.domain)?,
        server: field(args.server, "Server", &current.server)?,
        description: field(args.description, "Description", &current.description)?,
        enabled: match args.enabled {
            Some(true) => "1".to_string(),
            Some(false) => "0".to_string(),
            None => current.enabled.clone(),
        },
        ..current.clone()
    };

    if updated == current {
        output.info("No changes.");
        return Ok(ExitCode::SUCCESS);
    }

    client
        .update_override(&updated)
        .await
        .with_context(|| format!("Failed to update DNS override {}", args.uuid))?;
    output.info(format!("Updated {} -> {}", updated.fqdn(), updated.server));

    if args.apply {
        client.reconfigure().await.context("Failed to apply changes")?;
        output.info("Changes applied.");
    }
    Ok(ExitCode::SUCCESS)
}

/// `delete`
///
/// # Errors
///
/// Returns an error when the override does not exist or a call fails.
pub async fn delete(config: &AppConfig, args: &DeleteArgs, output: Output) -> Result<ExitCode> {
    let client = unbound_client(config)?;
    let current = client.get_override(&args.uuid).await?;

    let prompt = format!("Delete {} -> {} ({})?", current.fqdn(), current.server, current.uuid);
    if !confirm_unless_forced(&TerminalConfirmer, &prompt, args.force) {
        output.info("Aborted.");
        return Ok(ExitCode::FAILURE);
    }

    client
        .delete_override(&args.uuid)
        .await
        .with_context(|| format!("Failed to delete DNS override {}", args.uuid))?;
    output.info(format!("Deleted {}", current.fqdn()));

    if args.apply {
        client.reconfigure().await.context("Failed to apply changes")?;
        output.info("Changes applied.");
    }
    Ok(ExitCode::SUCCESS)
}

/// `apply`
///
/// # Errors
///
/// Returns an error when the reconfigure call fails.
pub async fn apply(config: &AppConfig, output: Output) -> Result<ExitCode> {
    unbound_client(config)?
        .reconfigure()
        .await
        .context("Failed to apply changes")?;
    output.info("Changes applied.");
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
#[path = "entries_tests.rs"]
mod entries_tests;
