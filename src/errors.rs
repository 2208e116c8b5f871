// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for unbound-sync.
//!
//! This module provides specialized error types for:
//! - Route extraction from the proxy configuration tree
//! - Backend HTTP API operations (OPNsense, AdGuard Home, Caddy, Cloudflare)
//! - Configuration resolution
//! - Multi-target orchestration
//!
//! Application code carries these inside `anyhow::Error` with added context;
//! callers that need to branch on a failure downcast to the typed error.

use crate::http_errors::map_http_error_to_reason;
use thiserror::Error;

/// Errors raised while flattening the proxy configuration into a hostname mapping.
///
/// The proxy configuration layout is assumed stable; a missing section means the
/// admin API answered with something other than a full server configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// A required top-level section is absent
    #[error("proxy configuration has no '{section}' section")]
    MissingSection {
        /// Section name (`apps`, `http` or `servers`)
        section: &'static str,
    },
}

/// Errors returned by the backend HTTP clients.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Backend answered with a non-success HTTP status
    #[error("{description}: {body}")]
    Http {
        /// Backend name (e.g. "OPNsense Unbound")
        backend: &'static str,
        /// HTTP status code
        status: u16,
        /// Machine-readable reason from `http_errors`
        reason: &'static str,
        /// Human-readable description of the status
        description: String,
        /// Response body as returned by the backend
        body: String,
    },

    /// Request was answered with the login page instead of API data
    ///
    /// OPNsense does not return 401 for bad API credentials; it redirects to its
    /// login form.
    #[error("{backend} authentication failed: redirected to login page ({url})")]
    AuthenticationFailed {
        /// Backend name
        backend: &'static str,
        /// Final URL after redirects
        url: String,
    },

    /// Backend accepted the request but reported an unexpected result
    #[error("{backend} rejected {operation}: result='{result}' status='{status}' message='{message}'")]
    UnexpectedResult {
        /// Backend name
        backend: &'static str,
        /// Operation being attempted
        operation: String,
        /// `result` field returned
        result: String,
        /// `status` field returned
        status: String,
        /// `message` field returned
        message: String,
    },

    /// A create call succeeded but the backend did not return an identifier
    #[error("{backend} returned no identifier for {operation}")]
    MissingIdentifier {
        /// Backend name
        backend: &'static str,
        /// Operation being attempted
        operation: String,
    },

    /// An update or delete was requested for an entry without an identifier
    #[error("cannot {operation} '{fqdn}': entry has no identifier")]
    IdentifierRequired {
        /// Operation being attempted
        operation: &'static str,
        /// Fully-qualified name of the entry
        fqdn: String,
    },

    /// A host override with the same host and domain already exists
    #[error("DNS override for {fqdn} already exists with UUID {uuid}")]
    Duplicate {
        /// Fully-qualified name
        fqdn: String,
        /// UUID of the existing override
        uuid: String,
    },

    /// No entry with the given identifier exists
    #[error("no {backend} entry with identifier '{id}'")]
    NotFound {
        /// Backend name
        backend: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// Backend returned an envelope flagged as unsuccessful
    #[error("{backend} request failed: {message}")]
    Rejected {
        /// Backend name
        backend: &'static str,
        /// Concatenated error messages from the envelope
        message: String,
    },

    /// The operator declined a mutating call at an interactive prompt
    #[error("{operation} skipped by operator")]
    Declined {
        /// Operation that was declined
        operation: String,
    },
}

impl ApiError {
    /// Build an [`ApiError::Http`] from a status code and response body.
    #[must_use]
    pub fn from_status(backend: &'static str, status: u16, body: impl Into<String>) -> Self {
        let (reason, description) = map_http_error_to_reason(backend, status);
        Self::Http {
            backend,
            status,
            reason,
            description,
            body: body.into(),
        }
    }
}

/// Errors raised while resolving configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required setting is empty after env and file resolution
    #[error("{section} setting '{field}' is not configured (set it in the config file or via {env})")]
    MissingField {
        /// Configuration section (`unbound`, `adguard`, `cloudflare`)
        section: &'static str,
        /// Field name in the file
        field: &'static str,
        /// Environment variable that can supply it
        env: &'static str,
    },

    /// A URL setting could not be parsed
    #[error("invalid {field} '{value}': {reason}")]
    InvalidUrl {
        /// Field name
        field: &'static str,
        /// Value as configured
        value: String,
        /// Parser error
        reason: String,
    },

    /// The home directory could not be determined for the default config path
    #[error("cannot determine home directory for the default configuration path")]
    NoHomeDirectory,

    /// A command needs a backend that is disabled in configuration
    #[error("{section} is disabled in configuration")]
    Disabled {
        /// Configuration section
        section: &'static str,
    },
}

/// Errors produced by the multi-target orchestrator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Every selected target failed to reconcile
    #[error("all {count} target(s) failed: {details}")]
    AllTargetsFailed {
        /// Number of targets attempted
        count: usize,
        /// `target: error` pairs joined with "; "
        details: String,
    },

    /// No target was selected for reconciliation
    #[error("no sync targets selected")]
    NoTargets,
}
