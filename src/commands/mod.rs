// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Command-line surface.
//!
//! One `Args` struct and one `execute` function per subcommand. Commands print
//! results to stdout; diagnostics go through `tracing` to stderr.

pub mod completions;
pub mod config;
pub mod entries;
pub mod status;
pub mod sync;

use crate::config::AppConfig;
use crate::constants::DEFAULT_LOG_LEVEL;
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

/// Log levels selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Errors only
    Error,
    /// Warnings and errors
    Warn,
    /// Progress information
    Info,
    /// Request-level detail
    Debug,
    /// Everything
    Trace,
}

impl LogLevel {
    /// Directive for `tracing_subscriber::EnvFilter`.
    #[must_use]
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Keep Unbound host overrides and AdGuard Home rewrites in line with Caddy
#[derive(Parser, Debug)]
#[command(name = "unbound-sync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (default: ~/.unbound-sync.json)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log level when RUST_LOG is not set
    #[arg(long, global = true, value_enum, default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: LogLevel,

    /// Suppress informational output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all DNS overrides
    List(entries::ListArgs),

    /// Find DNS overrides by host and/or domain
    Find(entries::FindArgs),

    /// Add a DNS override
    Add(entries::AddArgs),

    /// Edit an existing DNS override
    Edit(entries::EditArgs),

    /// Delete a DNS override
    #[command(visible_aliases = ["del", "remove", "rm"])]
    Delete(entries::DeleteArgs),

    /// Apply staged changes to the Unbound service
    Apply,

    /// Create or test the configuration file
    Config(config::ConfigArgs),

    /// Sync Caddy hostnames to Unbound
    #[command(visible_alias = "caddy-sync-unbound")]
    CaddySync(sync::CaddySyncArgs),

    /// Sync Caddy hostnames to AdGuard Home rewrites
    CaddySyncAdguard(sync::CaddySyncArgs),

    /// Sync Caddy hostnames to Unbound and AdGuard Home
    CaddySyncAll(sync::CaddySyncAllArgs),

    /// Sync split-horizon names derived from Caddy to Unbound
    CaddySyncCloudflare(sync::SplitHorizonArgs),

    /// Sync Cloudflare tunnel hostnames to Unbound
    #[command(visible_alias = "cf-sync")]
    CloudflareSync(sync::CloudflareSyncArgs),

    /// Compare Caddy, Unbound and AdGuard Home
    Status(status::StatusArgs),

    /// Generate shell completion scripts
    Completions(completions::CompletionsArgs),
}

/// Output settings shared by every command.
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    /// Suppress informational lines
    pub quiet: bool,
}

impl Output {
    /// Print an informational line unless quiet.
    pub fn info(&self, message: impl std::fmt::Display) {
        if !self.quiet {
            println!("{message}");
        }
    }
}

/// Run the parsed command line.
///
/// # Errors
///
/// Returns an error when configuration is invalid, the route source fails, or
/// a direct API call fails. Reconciliation failures limited to some targets or
/// entries are reported on stdout and reflected in the exit code instead.
pub async fn execute(cli: Cli) -> Result<ExitCode> {
    let output = Output { quiet: cli.quiet };

    if let Commands::Completions(args) = cli.command {
        completions::execute(&args);
        return Ok(ExitCode::SUCCESS);
    }
    if let Commands::Config(args) = cli.command {
        return config::execute(args, cli.config.as_deref(), output).await;
    }

    let app = AppConfig::load(cli.config.as_deref())?;
    match cli.command {
        Commands::List(args) => entries::list(&app, &args).await,
        Commands::Find(args) => entries::find(&app, &args).await,
        Commands::Add(args) => entries::add(&app, &args, output).await,
        Commands::Edit(args) => entries::edit(&app, args, output).await,
        Commands::Delete(args) => entries::delete(&app, &args, output).await,
        Commands::Apply => entries::apply(&app, output).await,
        Commands::CaddySync(args) => sync::caddy_sync_unbound(&app, &args, output).await,
        Commands::CaddySyncAdguard(args) => sync::caddy_sync_adguard(&app, &args, output).await,
        Commands::CaddySyncAll(args) => sync::caddy_sync_all(&app, &args, output).await,
        Commands::CaddySyncCloudflare(args) => sync::caddy_sync_split(&app, &args, output).await,
        Commands::CloudflareSync(args) => sync::cloudflare_sync(&app, &args, output).await,
        Commands::Status(args) => status::execute(&app, &args, output).await,
        Commands::Completions(_) | Commands::Config(_) => Ok(ExitCode::SUCCESS),
    }
}
