// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # unbound-sync - DNS override sync for a Caddy-fronted home lab
//!
//! unbound-sync reads the hostnames a reverse proxy (Caddy) or a Cloudflare
//! tunnel serves and keeps local DNS in line with them: OPNsense Unbound host
//! overrides and AdGuard Home rewrites.
//!
//! ## Overview
//!
//! Every sync run follows the same pipeline:
//!
//! 1. A [`source::RouteSource`] produces a hostname mapping (FQDN to address).
//! 2. Each [`reconcilers::DnsTarget`] lists its current entries, which are
//!    split into tool-owned and foreign records.
//! 3. A change plan (add, update, update marker, remove) is computed and,
//!    unless this is a dry run, applied entry by entry.
//! 4. Results are rendered with [`report`].
//!
//! Only entries the tool owns are ever changed or removed. Unbound entries are
//! owned when their description carries the current or a legacy marker;
//! AdGuard Home rewrites have no description and are owned when they answer
//! with the proxy address for a hostname the source still defines.
//!
//! ## Modules
//!
//! - [`api`] - HTTP clients for OPNsense, AdGuard Home, Caddy and Cloudflare
//! - [`source`] - Route sources and hostname extraction
//! - [`reconcilers`] - Ownership, diff, apply and multi-target orchestration
//! - [`status`] - Read-only comparison across systems
//! - [`report`] - Human-readable change reports
//! - [`config`] - Configuration file and environment resolution
//! - [`commands`] - Command-line interface

pub mod api;
pub mod commands;
pub mod config;
pub mod constants;
pub mod errors;
pub mod http_errors;
pub mod prompt;
pub mod reconcilers;
pub mod report;
pub mod source;
pub mod status;
