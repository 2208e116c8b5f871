// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Configuration loading, validation and persistence.
//!
//! Settings are resolved per field in this order:
//!
//! 1. Environment variables (`UNBOUND_SYNC_*`, `ADGUARD_*`, `CLOUDFLARE_*`)
//! 2. The configuration file (`~/.unbound-sync.json` unless `--config` is given)
//! 3. Built-in defaults
//!
//! The file is JSON unless its extension is `.yaml` or `.yml`. Resolver
//! settings live at the top level of the file, the rewrite engine and tunnel
//! settings in `adguard` and `cloudflare` sections:
//!
//! ```json
//! {
//!   "api_key": "key",
//!   "api_secret": "secret",
//!   "base_url": "https://opnsense.lan",
//!   "insecure": false,
//!   "adguard": { "enabled": true, "base_url": "http://adguard.lan:3000", "username": "admin", "password": "pw" },
//!   "cloudflare": { "api_token": "token", "account_id": "acct", "tunnel_id": "tunnel" }
//! }
//! ```

use crate::constants::{
    CLOUDFLARE_API_BASE_URL, CONFIG_FILE_NAME, ENV_ADGUARD_BASE_URL, ENV_ADGUARD_ENABLED,
    ENV_ADGUARD_INSECURE, ENV_ADGUARD_PASSWORD, ENV_ADGUARD_USERNAME, ENV_CLOUDFLARE_ACCOUNT_ID,
    ENV_CLOUDFLARE_API_TOKEN, ENV_CLOUDFLARE_TUNNEL_ID, ENV_UNBOUND_API_KEY,
    ENV_UNBOUND_API_SECRET, ENV_UNBOUND_BASE_URL, ENV_UNBOUND_INSECURE,
};
use crate::errors::ConfigError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use url::Url;

/// OPNsense Unbound API settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnboundSettings {
    /// API key (basic auth user)
    pub api_key: String,
    /// API secret (basic auth password)
    pub api_secret: String,
    /// Appliance base URL, e.g. `https://opnsense.lan`
    pub base_url: String,
    /// Skip TLS certificate verification
    pub insecure: bool,
}

/// AdGuard Home API settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdguardSettings {
    /// Whether the rewrite engine takes part in unified sync and status
    pub enabled: bool,
    /// Base URL, e.g. `http://adguard.lan:3000`
    pub base_url: String,
    /// Basic auth user (falls back to the resolver API key)
    pub username: String,
    /// Basic auth password (falls back to the resolver API secret)
    pub password: String,
    /// Skip TLS certificate verification
    pub insecure: bool,
}

/// Cloudflare tunnel API settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudflareSettings {
    /// API token with tunnel read permission
    pub api_token: String,
    /// Account owning the tunnel
    pub account_id: String,
    /// Tunnel whose ingress rules are the route source
    pub tunnel_id: String,
    /// API base URL override (defaults to the public v4 API)
    #[serde(skip_serializing_if = "String::is_empty")]
    pub base_url: String,
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Resolver settings, stored at the top level of the file
    #[serde(flatten)]
    pub unbound: UnboundSettings,
    /// Rewrite engine settings
    pub adguard: AdguardSettings,
    /// Tunnel settings
    pub cloudflare: CloudflareSettings,
}

/// Default configuration path: `~/.unbound-sync.json`.
///
/// # Errors
///
/// Returns [`ConfigError::NoHomeDirectory`] when the home directory is unknown.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(CONFIG_FILE_NAME))
        .ok_or(ConfigError::NoHomeDirectory)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    )
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl AppConfig {
    /// Load configuration from `path` (or the default path) and apply environment overrides.
    ///
    /// A missing file is not an error: environment variables alone may provide
    /// everything a command needs. Validation happens later, per section, when a
    /// command asks for the settings it uses.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_config_path()?,
        };

        let mut config = Self::from_file(&path)?.unwrap_or_else(|| {
            debug!(path = %path.display(), "Config file not found, using environment only");
            Self::default()
        });
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Read and parse a configuration file, returning `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON/YAML.
    pub fn from_file(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = if is_yaml(path) {
            serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config {}", path.display()))?
        } else {
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config {}", path.display()))?
        };
        debug!(path = %path.display(), "Loaded config file");
        Ok(Some(config))
    }

    /// Write the configuration to `path`, readable by the owner only.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization, directory creation, or the write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents = if is_yaml(path) {
            serde_yaml::to_string(self).context("Failed to serialize config to YAML")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?
        };
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;

        #[cfg(unix)]
        {
            use crate::constants::CONFIG_FILE_MODE;
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(CONFIG_FILE_MODE))
                .with_context(|| format!("Failed to restrict permissions on {}", path.display()))?;
        }

        Ok(())
    }

    /// Override fields with values from `lookup` (normally `std::env::var`).
    ///
    /// Empty values are ignored so an exported-but-blank variable does not wipe
    /// a value from the file.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_UNBOUND_API_KEY) {
            self.unbound.api_key = v;
        }
        if let Some(v) = get(ENV_UNBOUND_API_SECRET) {
            self.unbound.api_secret = v;
        }
        if let Some(v) = get(ENV_UNBOUND_BASE_URL) {
            self.unbound.base_url = v;
        }
        if let Some(v) = get(ENV_UNBOUND_INSECURE) {
            self.unbound.insecure = parse_bool(&v);
        }

        if let Some(v) = get(ENV_ADGUARD_ENABLED) {
            self.adguard.enabled = parse_bool(&v);
        }
        if let Some(v) = get(ENV_ADGUARD_BASE_URL) {
            self.adguard.base_url = v;
        }
        if let Some(v) = get(ENV_ADGUARD_USERNAME) {
            self.adguard.username = v;
        }
        if let Some(v) = get(ENV_ADGUARD_PASSWORD) {
            self.adguard.password = v;
        }
        if let Some(v) = get(ENV_ADGUARD_INSECURE) {
            self.adguard.insecure = parse_bool(&v);
        }

        if let Some(v) = get(ENV_CLOUDFLARE_API_TOKEN) {
            self.cloudflare.api_token = v;
        }
        if let Some(v) = get(ENV_CLOUDFLARE_ACCOUNT_ID) {
            self.cloudflare.account_id = v;
        }
        if let Some(v) = get(ENV_CLOUDFLARE_TUNNEL_ID) {
            self.cloudflare.tunnel_id = v;
        }
    }

    /// Validated resolver settings with a normalized `https://` base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when key, secret or base URL is missing or the URL is invalid.
    pub fn unbound(&self) -> Result<UnboundSettings, ConfigError> {
        let settings = &self.unbound;
        require("unbound", "api_key", ENV_UNBOUND_API_KEY, &settings.api_key)?;
        require("unbound", "api_secret", ENV_UNBOUND_API_SECRET, &settings.api_secret)?;
        require("unbound", "base_url", ENV_UNBOUND_BASE_URL, &settings.base_url)?;

        Ok(UnboundSettings {
            base_url: normalize_resolver_url(&settings.base_url)?,
            ..settings.clone()
        })
    }

    /// Validated rewrite engine settings, or `None` when the engine is disabled.
    ///
    /// Username and password fall back to the resolver API key and secret.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the engine is enabled but incompletely configured.
    pub fn adguard(&self) -> Result<Option<AdguardSettings>, ConfigError> {
        if !self.adguard.enabled {
            return Ok(None);
        }

        let mut settings = self.adguard.clone();
        if settings.username.is_empty() {
            settings.username = self.unbound.api_key.clone();
        }
        if settings.password.is_empty() {
            settings.password = self.unbound.api_secret.clone();
        }

        require("adguard", "base_url", ENV_ADGUARD_BASE_URL, &settings.base_url)?;
        require("adguard", "username", ENV_ADGUARD_USERNAME, &settings.username)?;
        require("adguard", "password", ENV_ADGUARD_PASSWORD, &settings.password)?;

        settings.base_url = normalize_url("adguard base_url", &settings.base_url, "http")?;
        Ok(Some(settings))
    }

    /// Validated tunnel settings. The tunnel id is checked by the commands that need it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the token or account id is missing.
    pub fn cloudflare(&self) -> Result<CloudflareSettings, ConfigError> {
        let settings = &self.cloudflare;
        require("cloudflare", "api_token", ENV_CLOUDFLARE_API_TOKEN, &settings.api_token)?;
        require("cloudflare", "account_id", ENV_CLOUDFLARE_ACCOUNT_ID, &settings.account_id)?;

        let base_url = if settings.base_url.is_empty() {
            CLOUDFLARE_API_BASE_URL.to_string()
        } else {
            normalize_url("cloudflare base_url", &settings.base_url, "https")?
        };
        Ok(CloudflareSettings {
            base_url,
            ..settings.clone()
        })
    }
}

fn require(
    section: &'static str,
    field: &'static str,
    env: &'static str,
    value: &str,
) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingField {
            section,
            field,
            env,
        });
    }
    Ok(())
}

/// Normalize the resolver base URL to `https://`.
///
/// The OPNsense API is only served over TLS, so a plain `http://` URL is
/// upgraded (with a warning) and a bare host gets an `https://` scheme.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidUrl`] when the result does not parse.
pub fn normalize_resolver_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    let upgraded = match trimmed.strip_prefix("http://") {
        Some(rest) => {
            warn!(original = %trimmed, "Resolver base URL uses http://, upgrading to https://");
            format!("https://{rest}")
        }
        None => trimmed.to_string(),
    };
    normalize_url("unbound base_url", &upgraded, "https")
}

fn normalize_url(
    field: &'static str,
    raw: &str,
    default_scheme: &str,
) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("{default_scheme}://{trimmed}")
    };

    let parsed = Url::parse(&candidate).map_err(|e| ConfigError::InvalidUrl {
        field,
        value: raw.to_string(),
        reason: e.to_string(),
    })?;
    if parsed.host_str().is_none() {
        return Err(ConfigError::InvalidUrl {
            field,
            value: raw.to_string(),
            reason: "URL has no host".to_string(),
        });
    }
    Ok(candidate)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
