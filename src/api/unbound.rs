// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! OPNsense Unbound host override API client.
//!
//! The appliance stages override edits and only serves them after an explicit
//! reconfigure call ([`UnboundClient::reconfigure`]). Bad credentials are not
//! answered with 401 but with a redirect to the web login page, which this
//! client detects and reports as [`ApiError::AuthenticationFailed`].

use super::{api_request, http_client, Auth, RawResponse};
use crate::config::UnboundSettings;
use crate::constants::{
    DEFAULT_RECORD_TYPE, LOGIN_PAGE_MARKER, LOGIN_REDIRECT_MARKER, UNBOUND_ADD_PATH,
    UNBOUND_DEL_PATH, UNBOUND_RECONFIGURE_PATH, UNBOUND_RESULT_DELETED, UNBOUND_RESULT_SAVED,
    UNBOUND_SEARCH_PATH, UNBOUND_SET_PATH, UNBOUND_STATUS_OK, UNBOUND_TIMEOUT_SECS,
};
use crate::errors::ApiError;
use anyhow::{Context, Result};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{debug, error, info};

const BACKEND: &str = "OPNsense Unbound";

/// A single Unbound host override as the OPNsense API represents it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostOverride {
    /// Identifier assigned by OPNsense (empty until created)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uuid: String,
    /// "1" when enabled, "0" when disabled
    #[serde(default)]
    pub enabled: String,
    /// Host label (first label of the FQDN)
    #[serde(rename = "hostname", default)]
    pub host: String,
    /// Domain (remainder of the FQDN)
    #[serde(default)]
    pub domain: String,
    /// Record type
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rr: String,
    /// MX priority (MX records only)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mxprio: String,
    /// MX host (MX records only)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mx: String,
    /// Address the name resolves to
    #[serde(default)]
    pub server: String,
    /// Free-text description, used as the ownership marker
    #[serde(default)]
    pub description: String,
}

impl HostOverride {
    /// Build an enabled A-record override.
    #[must_use]
    pub fn new(host: &str, domain: &str, server: &str, description: &str) -> Self {
        Self {
            enabled: "1".to_string(),
            host: host.to_string(),
            domain: domain.to_string(),
            rr: DEFAULT_RECORD_TYPE.to_string(),
            server: server.to_string(),
            description: description.to_string(),
            ..Self::default()
        }
    }

    /// `host.domain`, or just the host when the domain is empty.
    #[must_use]
    pub fn fqdn(&self) -> String {
        if self.domain.is_empty() {
            self.host.clone()
        } else {
            format!("{}.{}", self.host, self.domain)
        }
    }

    /// Whether the override is active.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled == "1"
    }
}

/// Envelope returned by every OPNsense settings/service call.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiResponse {
    status: String,
    result: String,
    message: String,
    uuid: String,
    data: Option<Value>,
    rows: Option<Vec<HostOverride>>,
}

impl ApiResponse {
    fn is(&self, result: &str) -> bool {
        self.result == result || self.status == UNBOUND_STATUS_OK
    }

    fn rejected(&self, operation: impl Into<String>) -> ApiError {
        ApiError::UnexpectedResult {
            backend: BACKEND,
            operation: operation.into(),
            result: self.result.clone(),
            status: self.status.clone(),
            message: self.message.clone(),
        }
    }
}

/// Client for the OPNsense Unbound API.
#[derive(Debug, Clone)]
pub struct UnboundClient {
    client: HttpClient,
    base_url: String,
    api_key: String,
    api_secret: String,
}

impl UnboundClient {
    /// Create a client from validated settings.
    ///
    /// The base URL is used as given; scheme normalization happens when the
    /// settings are validated.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(settings: &UnboundSettings) -> Result<Self> {
        Ok(Self {
            client: http_client(UNBOUND_TIMEOUT_SECS, settings.insecure)?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            api_secret: settings.api_secret.clone(),
        })
    }

    async fn request(&self, method: &str, endpoint: &str, body: Option<&Value>) -> Result<ApiResponse> {
        let url = format!("{}{}", self.base_url, endpoint);
        let RawResponse { final_url, body } = api_request(
            &self.client,
            BACKEND,
            Auth::Basic {
                username: &self.api_key,
                password: &self.api_secret,
            },
            method,
            &url,
            body,
        )
        .await?;

        if final_url.contains(LOGIN_REDIRECT_MARKER) || body.contains(LOGIN_PAGE_MARKER) {
            error!(final_url = %final_url, "Redirected to login page - authentication failed");
            return Err(ApiError::AuthenticationFailed {
                backend: BACKEND,
                url: final_url,
            }
            .into());
        }

        serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse {BACKEND} response from {endpoint}: {body}"))
    }

    /// List every host override.
    ///
    /// Newer firmware returns a `rows` array; older firmware returns a `data`
    /// object keyed by uuid, which is flattened here.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload cannot be decoded.
    pub async fn list_overrides(&self) -> Result<Vec<HostOverride>> {
        debug!("Fetching DNS overrides");
        let response = self.request("GET", UNBOUND_SEARCH_PATH, None).await?;

        let overrides = match (response.rows, response.data) {
            (Some(rows), _) => rows,
            (None, Some(data)) => {
                let keyed: BTreeMap<String, HostOverride> = serde_json::from_value(data)
                    .context("Failed to parse keyed host overrides")?;
                keyed
                    .into_iter()
                    .map(|(uuid, mut entry)| {
                        entry.uuid = uuid;
                        entry
                    })
                    .collect()
            }
            (None, None) => Vec::new(),
        };

        debug!(count = overrides.len(), "Fetched DNS overrides");
        Ok(overrides)
    }

    /// Find an override by host and domain (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if listing fails.
    pub async fn find_override(&self, host: &str, domain: &str) -> Result<Option<HostOverride>> {
        Ok(self.list_overrides().await?.into_iter().find(|o| {
            o.host.eq_ignore_ascii_case(host) && o.domain.eq_ignore_ascii_case(domain)
        }))
    }

    /// Fetch a single override by uuid.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] when no override has this uuid.
    pub async fn get_override(&self, uuid: &str) -> Result<HostOverride> {
        self.list_overrides()
            .await?
            .into_iter()
            .find(|o| o.uuid == uuid)
            .ok_or_else(|| {
                ApiError::NotFound {
                    backend: BACKEND,
                    id: uuid.to_string(),
                }
                .into()
            })
    }

    /// Create an override and return its uuid.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Duplicate`] when the host/domain pair already exists,
    /// or an error if the appliance does not confirm the save.
    pub async fn add_override(&self, entry: &HostOverride) -> Result<String> {
        if let Some(existing) = self.find_override(&entry.host, &entry.domain).await? {
            info!(fqdn = %entry.fqdn(), uuid = %existing.uuid, "DNS override already exists");
            return Err(ApiError::Duplicate {
                fqdn: entry.fqdn(),
                uuid: existing.uuid,
            }
            .into());
        }

        let body = json!({ "host": entry });
        let response = self.request("POST", UNBOUND_ADD_PATH, Some(&body)).await?;
        if response.result != UNBOUND_RESULT_SAVED {
            return Err(response.rejected(format!("add {}", entry.fqdn())).into());
        }

        let uuid = if response.uuid.is_empty() {
            response
                .data
                .as_ref()
                .and_then(|d| d.get("uuid"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        } else {
            response.uuid
        };
        if uuid.is_empty() {
            return Err(ApiError::MissingIdentifier {
                backend: BACKEND,
                operation: format!("add {}", entry.fqdn()),
            }
            .into());
        }

        info!(fqdn = %entry.fqdn(), uuid = %uuid, "Added DNS override");
        Ok(uuid)
    }

    /// Replace the fields of an existing override.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry has no uuid or the appliance rejects the update.
    pub async fn update_override(&self, entry: &HostOverride) -> Result<()> {
        if entry.uuid.is_empty() {
            return Err(ApiError::IdentifierRequired {
                operation: "update",
                fqdn: entry.fqdn(),
            }
            .into());
        }

        let endpoint = format!("{UNBOUND_SET_PATH}/{}", entry.uuid);
        let body = json!({ "host": entry });
        let response = self.request("POST", &endpoint, Some(&body)).await?;
        if !response.is(UNBOUND_RESULT_SAVED) {
            return Err(response.rejected(format!("update {}", entry.fqdn())).into());
        }

        info!(fqdn = %entry.fqdn(), uuid = %entry.uuid, server = %entry.server, "Updated DNS override");
        Ok(())
    }

    /// Delete an override by uuid.
    ///
    /// # Errors
    ///
    /// Returns an error if the appliance does not confirm the deletion.
    pub async fn delete_override(&self, uuid: &str) -> Result<()> {
        let endpoint = format!("{UNBOUND_DEL_PATH}/{uuid}");
        let response = self.request("POST", &endpoint, None).await?;
        if !response.is(UNBOUND_RESULT_DELETED) {
            return Err(response.rejected(format!("delete {uuid}")).into());
        }

        info!(uuid = %uuid, "Deleted DNS override");
        Ok(())
    }

    /// Reconfigure Unbound so staged changes take effect.
    ///
    /// # Errors
    ///
    /// Returns an error if the service call fails.
    pub async fn reconfigure(&self) -> Result<()> {
        let body = json!({});
        let response = self
            .request("POST", UNBOUND_RECONFIGURE_PATH, Some(&body))
            .await?;
        if !response.is(UNBOUND_RESULT_SAVED) {
            return Err(response.rejected("reconfigure").into());
        }

        info!("Applied changes to Unbound service");
        Ok(())
    }
}

#[cfg(test)]
#[path = "unbound_tests.rs"]
mod unbound_tests;
