// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP clients for the systems unbound-sync talks to.
//!
//! - [`unbound`] - OPNsense Unbound host overrides (the router resolver)
//! - [`adguard`] - AdGuard Home DNS rewrites (the ad-blocking resolver)
//! - [`caddy`] - Caddy admin API (the route source)
//! - [`cloudflare`] - Cloudflare tunnel configuration (alternative route source)
//!
//! Every client funnels its calls through [`api_request`], which logs the call,
//! attaches authentication, and turns non-success statuses into
//! [`ApiError::Http`]. Nothing is retried: a failed call is final for the
//! current run.

pub mod adguard;
pub mod caddy;
pub mod cloudflare;
pub mod unbound;

use crate::errors::ApiError;
use anyhow::{Context, Result};
use reqwest::Client as HttpClient;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};

/// Authentication attached to a request.
#[derive(Clone, Copy)]
pub(crate) enum Auth<'a> {
    /// HTTP basic auth
    Basic {
        /// User or API key
        username: &'a str,
        /// Password or API secret
        password: &'a str,
    },
    /// `Authorization: Bearer <token>`
    Bearer(&'a str),
    /// No authentication
    None,
}

/// Successful response body plus the URL it was finally served from.
#[derive(Debug)]
pub(crate) struct RawResponse {
    /// URL after following redirects
    pub final_url: String,
    /// Response body
    pub body: String,
}

/// Build the API base URL from a server address
///
/// Converts "opnsense.lan" or "10.0.0.1:3000" to `<http://opnsense.lan>` or
/// `<http://10.0.0.1:3000>`; URLs that already carry a scheme keep it. Trailing
/// slashes are removed so endpoint paths can be appended directly.
#[must_use]
pub fn build_api_url(server: &str) -> String {
    if server.starts_with("http://") || server.starts_with("https://") {
        server.trim_end_matches('/').to_string()
    } else {
        format!("http://{}", server.trim_end_matches('/'))
    }
}

/// Build a `reqwest` client with a fixed per-request timeout.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialised.
pub(crate) fn http_client(timeout_secs: u64, insecure: bool) -> Result<HttpClient> {
    HttpClient::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .danger_accept_invalid_certs(insecure)
        .build()
        .context("Failed to build HTTP client")
}

/// Execute a request against a backend API.
///
/// # Arguments
/// * `client` - HTTP client
/// * `backend` - Backend name used in logs and errors
/// * `auth` - Authentication to attach
/// * `method` - HTTP method (GET, POST)
/// * `url` - Full URL to the endpoint
/// * `body` - Optional JSON body for POST requests
///
/// # Errors
///
/// Returns an error if the request cannot be sent, the body cannot be read, or
/// the backend answers with a non-success status ([`ApiError::Http`]).
pub(crate) async fn api_request<T: Serialize + std::fmt::Debug>(
    client: &HttpClient,
    backend: &'static str,
    auth: Auth<'_>,
    method: &str,
    url: &str,
    body: Option<&T>,
) -> Result<RawResponse> {
    debug!(
        backend = backend,
        method = %method,
        url = %url,
        body = ?body,
        "HTTP API request"
    );

    let mut request = match method {
        "GET" => client.get(url),
        "POST" => {
            let mut req = client.post(url);
            if let Some(body_data) = body {
                req = req.json(body_data);
            }
            req
        }
        _ => anyhow::bail!("Unsupported HTTP method: {method}"),
    };

    request = match auth {
        Auth::Basic { username, password } => request.basic_auth(username, Some(password)),
        Auth::Bearer(token) => request.bearer_auth(token),
        Auth::None => request,
    };

    let response = request
        .send()
        .await
        .context(format!("Failed to send HTTP request to {url}"))?;

    let status = response.status();
    let final_url = response.url().to_string();

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        error!(
            backend = backend,
            method = %method,
            url = %url,
            status = %status,
            error = %error_text,
            "HTTP API request failed"
        );
        return Err(ApiError::from_status(backend, status.as_u16(), error_text).into());
    }

    let text = response
        .text()
        .await
        .context("Failed to read response body")?;

    debug!(
        backend = backend,
        method = %method,
        url = %url,
        status = %status,
        response_len = text.len(),
        "HTTP API request successful"
    );

    Ok(RawResponse {
        final_url,
        body: text,
    })
}
