// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for unbound-sync.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Proxy (Caddy Admin API) Constants
// ============================================================================

/// Default address of the Caddy server (also the address DNS entries point at)
pub const DEFAULT_CADDY_IP: &str = "192.168.1.15";

/// Default Caddy admin API port
pub const DEFAULT_CADDY_PORT: u16 = 2019;

/// Caddy admin API path returning the full running configuration
pub const CADDY_CONFIG_PATH: &str = "/config/";

/// Timeout for Caddy admin API requests
pub const CADDY_TIMEOUT_SECS: u64 = 10;

/// Handler name Caddy uses for nested route groups
pub const CADDY_SUBROUTE_HANDLER: &str = "subroute";

/// Host pattern prefix that marks a wildcard route
pub const WILDCARD_PREFIX: &str = "*.";

// ============================================================================
// Resolver (OPNsense Unbound API) Constants
// ============================================================================

/// Timeout for OPNsense API requests
pub const UNBOUND_TIMEOUT_SECS: u64 = 10;

/// List all host overrides
pub const UNBOUND_SEARCH_PATH: &str = "/api/unbound/settings/searchHostOverride";

/// Create a host override
pub const UNBOUND_ADD_PATH: &str = "/api/unbound/settings/addHostOverride";

/// Update a host override (uuid appended)
pub const UNBOUND_SET_PATH: &str = "/api/unbound/settings/setHostOverride";

/// Delete a host override (uuid appended)
pub const UNBOUND_DEL_PATH: &str = "/api/unbound/settings/delHostOverride";

/// Reconfigure Unbound so staged overrides become live
pub const UNBOUND_RECONFIGURE_PATH: &str = "/api/unbound/service/reconfigure";

/// `result` value OPNsense returns after a successful add or update
pub const UNBOUND_RESULT_SAVED: &str = "saved";

/// `result` value OPNsense returns after a successful delete
pub const UNBOUND_RESULT_DELETED: &str = "deleted";

/// `status` value OPNsense returns for successful service actions
pub const UNBOUND_STATUS_OK: &str = "ok";

/// Record type used for every override the tool creates
pub const DEFAULT_RECORD_TYPE: &str = "A";

/// Query fragment OPNsense appends when redirecting to its login page
pub const LOGIN_REDIRECT_MARKER: &str = "/?url=";

/// Title fragment of the OPNsense login page
pub const LOGIN_PAGE_MARKER: &str = "<title>Login";

// ============================================================================
// Rewrite Engine (AdGuard Home API) Constants
// ============================================================================

/// Timeout for AdGuard Home API requests
pub const ADGUARD_TIMEOUT_SECS: u64 = 30;

/// List all DNS rewrites
pub const ADGUARD_LIST_PATH: &str = "/control/rewrite/list";

/// Add a DNS rewrite
pub const ADGUARD_ADD_PATH: &str = "/control/rewrite/add";

/// Replace one DNS rewrite with another
pub const ADGUARD_UPDATE_PATH: &str = "/control/rewrite/update";

/// Delete a DNS rewrite
pub const ADGUARD_DELETE_PATH: &str = "/control/rewrite/delete";

// ============================================================================
// Tunnel (Cloudflare API) Constants
// ============================================================================

/// Cloudflare v4 API base URL
pub const CLOUDFLARE_API_BASE_URL: &str = "https://api.cloudflare.com/client/v4";

/// Timeout for Cloudflare API requests
pub const CLOUDFLARE_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Ownership Marker Constants
// ============================================================================

/// Marker written by `caddy-sync`
pub const MARKER_CADDY_SYNC: &str = "Entry created by unboundCLI sync";

/// Marker written by `caddy-sync-adguard` (AdGuard has no marker field; shown in reports only)
pub const MARKER_CADDY_SYNC_ADGUARD: &str = "Entry created by unboundCLI caddy-sync-adguard";

/// Marker written by `caddy-sync-all`
pub const MARKER_CADDY_SYNC_ALL: &str = "Entry created by unboundCLI caddy-sync-all";

/// Marker written by `caddy-sync-cloudflare`
pub const MARKER_CADDY_SYNC_CLOUDFLARE: &str = "Entry created by unboundCLI caddy-sync-cloudflare";

/// Marker written by `cloudflare-sync`
pub const MARKER_CLOUDFLARE_SYNC: &str = "Entry created by unboundCLI cloudflare-sync";

/// Legacy marker of proxy-sourced entries
pub const LEGACY_MARKER_CADDY: &str = "Route via Caddy";

/// Legacy marker of tunnel-sourced entries
pub const LEGACY_MARKER_CLOUDFLARE: &str = "Route via Cloudflare";

// ============================================================================
// Split-Horizon Constants
// ============================================================================

/// Subdomain for direct service access (`service.dev.example.com`)
pub const DEFAULT_DIRECT_SUBDOMAIN: &str = "dev";

/// Subdomain for access through the proxy (`service.caddy.example.com`)
pub const DEFAULT_CADDY_SUBDOMAIN: &str = "caddy";

// ============================================================================
// Configuration Constants
// ============================================================================

/// Configuration file name, resolved relative to the home directory
pub const CONFIG_FILE_NAME: &str = ".unbound-sync.json";

/// Permissions of a saved configuration file (owner read/write only)
pub const CONFIG_FILE_MODE: u32 = 0o600;

/// Resolver API key
pub const ENV_UNBOUND_API_KEY: &str = "UNBOUND_SYNC_API_KEY";

/// Resolver API secret
pub const ENV_UNBOUND_API_SECRET: &str = "UNBOUND_SYNC_API_SECRET";

/// Resolver base URL
pub const ENV_UNBOUND_BASE_URL: &str = "UNBOUND_SYNC_BASE_URL";

/// Skip resolver TLS verification
pub const ENV_UNBOUND_INSECURE: &str = "UNBOUND_SYNC_INSECURE";

/// Enable the rewrite engine
pub const ENV_ADGUARD_ENABLED: &str = "ADGUARD_ENABLED";

/// Rewrite engine base URL
pub const ENV_ADGUARD_BASE_URL: &str = "ADGUARD_BASE_URL";

/// Rewrite engine username
pub const ENV_ADGUARD_USERNAME: &str = "ADGUARD_USERNAME";

/// Rewrite engine password
pub const ENV_ADGUARD_PASSWORD: &str = "ADGUARD_PASSWORD";

/// Skip rewrite engine TLS verification
pub const ENV_ADGUARD_INSECURE: &str = "ADGUARD_INSECURE";

/// Cloudflare API token
pub const ENV_CLOUDFLARE_API_TOKEN: &str = "CLOUDFLARE_API_TOKEN";

/// Cloudflare account id
pub const ENV_CLOUDFLARE_ACCOUNT_ID: &str = "CLOUDFLARE_ACCOUNT_ID";

/// Cloudflare tunnel id
pub const ENV_CLOUDFLARE_TUNNEL_ID: &str = "CLOUDFLARE_TUNNEL_ID";

// ============================================================================
// Logging Constants
// ============================================================================

/// Environment variable selecting the log output format (`json` or `text`)
pub const ENV_LOG_FORMAT: &str = "RUST_LOG_FORMAT";

/// Default log level for interactive CLI use
pub const DEFAULT_LOG_LEVEL: &str = "warn";
