// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `config`: create or test the configuration file.

use super::Output;
use crate::api::unbound::UnboundClient;
use crate::config::{default_config_path, AppConfig};
use crate::prompt::{confirm_unless_forced, prompt_with_default, TerminalConfirmer};
use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

/// Arguments for `config`
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Where to write the file (default: --config or ~/.unbound-sync.json)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Overwrite an existing file without asking
    #[arg(long, short = 'f')]
    pub force: bool,

    /// Only test the currently loaded configuration
    #[arg(long)]
    pub test: bool,

    /// OPNsense API key
    #[arg(long)]
    pub api_key: Option<String>,

    /// OPNsense API secret
    #[arg(long)]
    pub api_secret: Option<String>,

    /// OPNsense base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long)]
    pub insecure: bool,
}

async fn test_connection(config: &AppConfig, output: Output) -> Result<()> {
    let client = UnboundClient::new(&config.unbound()?)?;
    let overrides = client
        .list_overrides()
        .await
        .context("Connection test failed")?;
    output.info(format!(
        "Connection OK: {} DNS overrides found.",
        overrides.len()
    ));
    Ok(())
}

/// Run `config`.
///
/// # Errors
///
/// Returns an error when the connection test fails or the file cannot be written.
pub async fn execute(args: ConfigArgs, global_path: Option<&Path>, output: Output) -> Result<ExitCode> {
    let mut config = AppConfig::load(global_path)?;

    if args.test {
        test_connection(&config, output).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let path = match args.path.or_else(|| global_path.map(Path::to_path_buf)) {
        Some(p) => p,
        None => default_config_path()?,
    };

    if path.exists() {
        let prompt = format!("{} already exists. Overwrite?", path.display());
        if !confirm_unless_forced(&TerminalConfirmer, &prompt, args.force) {
            output.info("Aborted.");
            return Ok(ExitCode::FAILURE);
        }
    }

    let settings = &mut config.unbound;
    settings.api_key = match args.api_key {
        Some(v) => v,
        None => prompt_with_default("OPNsense API key", &settings.api_key)?,
    };
    settings.api_secret = match args.api_secret {
        Some(v) => v,
        None => prompt_with_default("OPNsense API secret", &settings.api_secret)?,
    };
    settings.base_url = match args.base_url {
        Some(v) => v,
        None => prompt_with_default("OPNsense base URL", &settings.base_url)?,
    };
    settings.insecure |= args.insecure;

    test_connection(&config, output).await?;

    config.save(&path)?;
    info!(path = %path.display(), "Saved configuration");
    output.info(format!("Configuration saved to {}", path.display()));
    Ok(ExitCode::SUCCESS)
}
