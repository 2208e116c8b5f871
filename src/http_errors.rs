// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP error code mapping to operator-facing reasons.
//!
//! Every backend (OPNsense, AdGuard Home, Caddy, Cloudflare) answers failures
//! with a bare status code and an often unhelpful body. This module turns the
//! status into a short machine-readable reason plus a message naming the
//! backend, so errors read the same no matter which system produced them.
//!
//! # Usage
//!
//! ```rust
//! use unbound_sync::http_errors::map_http_error_to_reason;
//!
//! let (reason, message) = map_http_error_to_reason("AdGuard Home", 401);
//! assert_eq!(reason, "AuthFailed");
//! assert!(message.contains("AdGuard Home"));
//! ```

/// Credentials rejected or missing
pub const REASON_AUTH_FAILED: &str = "AuthFailed";

/// Request was malformed or rejected by validation
pub const REASON_BAD_REQUEST: &str = "BadRequest";

/// Endpoint or resource does not exist
pub const REASON_NOT_FOUND: &str = "NotFound";

/// Backend asked us to slow down
pub const REASON_RATE_LIMITED: &str = "RateLimited";

/// Backend failed internally
pub const REASON_BACKEND_ERROR: &str = "BackendError";

/// A proxy or gateway in front of the backend failed
pub const REASON_GATEWAY_ERROR: &str = "GatewayError";

/// Anything else
pub const REASON_UNEXPECTED: &str = "UnexpectedStatus";

/// Map HTTP status code to a reason and message.
///
/// # Arguments
///
/// * `backend` - Human-readable backend name used in the message (e.g. "OPNsense Unbound")
/// * `status_code` - HTTP status code (e.g., 400, 404, 500)
///
/// # Returns
///
/// A tuple of `(reason, message)`.
///
/// | HTTP Code | Reason | Meaning |
/// |-----------|--------|---------|
/// | 400, 422 | `BadRequest` | Invalid request format |
/// | 401, 403 | `AuthFailed` | Credentials missing, wrong, or lacking privileges |
/// | 404 | `NotFound` | Endpoint not found (plugin missing, wrong base URL) |
/// | 429 | `RateLimited` | Too many requests |
/// | 500 | `BackendError` | Internal server error |
/// | 502, 503, 504 | `GatewayError` | Backend unreachable behind a proxy |
/// | Other | `UnexpectedStatus` | Unexpected error |
#[must_use]
pub fn map_http_error_to_reason(backend: &str, status_code: u16) -> (&'static str, String) {
    match status_code {
        400 | 422 => (
            REASON_BAD_REQUEST,
            format!("Invalid request to {backend} API ({status_code})"),
        ),
        401 => (
            REASON_AUTH_FAILED,
            format!("{backend} authentication required, check credentials ({status_code})"),
        ),
        403 => (
            REASON_AUTH_FAILED,
            format!("{backend} authorization failed, credentials lack privileges ({status_code})"),
        ),
        404 => (
            REASON_NOT_FOUND,
            format!("{backend} endpoint not found, check base URL ({status_code})"),
        ),
        429 => (
            REASON_RATE_LIMITED,
            format!("{backend} rate limit exceeded ({status_code})"),
        ),
        500 => (
            REASON_BACKEND_ERROR,
            format!("{backend} internal error ({status_code})"),
        ),
        502 => (
            REASON_GATEWAY_ERROR,
            format!("Bad gateway reaching {backend} ({status_code})"),
        ),
        503 => (
            REASON_GATEWAY_ERROR,
            format!("{backend} service unavailable ({status_code})"),
        ),
        504 => (
            REASON_GATEWAY_ERROR,
            format!("Gateway timeout reaching {backend} ({status_code})"),
        ),
        _ => (
            REASON_UNEXPECTED,
            format!("Unexpected HTTP error from {backend} ({status_code})"),
        ),
    }
}
