// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! AdGuard Home DNS rewrite API client.
//!
//! Rewrites are plain `(domain, answer)` pairs: there is no identifier and no
//! description field, so a rewrite is addressed by its full pair and changes
//! take effect immediately.

use super::{api_request, http_client, Auth};
use crate::config::AdguardSettings;
use crate::constants::{
    ADGUARD_ADD_PATH, ADGUARD_DELETE_PATH, ADGUARD_LIST_PATH, ADGUARD_TIMEOUT_SECS,
    ADGUARD_UPDATE_PATH,
};
use anyhow::{Context, Result};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const BACKEND: &str = "AdGuard Home";

/// A DNS rewrite rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rewrite {
    /// Domain being rewritten
    pub domain: String,
    /// Address (or name) the domain resolves to
    pub answer: String,
}

impl Rewrite {
    /// Build a rewrite.
    #[must_use]
    pub fn new(domain: &str, answer: &str) -> Self {
        Self {
            domain: domain.to_string(),
            answer: answer.to_string(),
        }
    }
}

#[derive(Serialize, Debug)]
struct UpdateRequest<'a> {
    target: &'a Rewrite,
    update: &'a Rewrite,
}

/// Client for the AdGuard Home control API.
#[derive(Debug, Clone)]
pub struct AdguardClient {
    client: HttpClient,
    base_url: String,
    username: String,
    password: String,
}

impl AdguardClient {
    /// Create a client from validated settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(settings: &AdguardSettings) -> Result<Self> {
        Ok(Self {
            client: http_client(ADGUARD_TIMEOUT_SECS, settings.insecure)?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            username: settings.username.clone(),
            password: settings.password.clone(),
        })
    }

    fn auth(&self) -> Auth<'_> {
        Auth::Basic {
            username: &self.username,
            password: &self.password,
        }
    }

    async fn post(&self, endpoint: &str, body: &impl Serialize) -> Result<()> {
        let url = format!("{}{}", self.base_url, endpoint);
        let body = serde_json::to_value(body).context("Failed to encode rewrite request")?;
        api_request(&self.client, BACKEND, self.auth(), "POST", &url, Some(&body)).await?;
        Ok(())
    }

    /// List all rewrites.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload cannot be decoded.
    pub async fn list_rewrites(&self) -> Result<Vec<Rewrite>> {
        let url = format!("{}{}", self.base_url, ADGUARD_LIST_PATH);
        let response = api_request::<()>(&self.client, BACKEND, self.auth(), "GET", &url, None).await?;

        // An instance with no rewrites answers `null`
        let rewrites: Option<Vec<Rewrite>> = serde_json::from_str(&response.body)
            .with_context(|| format!("Failed to parse {BACKEND} rewrite list: {}", response.body))?;
        let rewrites = rewrites.unwrap_or_default();
        debug!(count = rewrites.len(), "Fetched DNS rewrites");
        Ok(rewrites)
    }

    /// Add a rewrite.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn add_rewrite(&self, domain: &str, answer: &str) -> Result<()> {
        self.post(ADGUARD_ADD_PATH, &Rewrite::new(domain, answer)).await?;
        info!(domain = %domain, answer = %answer, "Added DNS rewrite");
        Ok(())
    }

    /// Replace `target` with `update`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn update_rewrite(&self, target: &Rewrite, update: &Rewrite) -> Result<()> {
        self.post(ADGUARD_UPDATE_PATH, &UpdateRequest { target, update })
            .await?;
        info!(
            domain = %update.domain,
            old_answer = %target.answer,
            new_answer = %update.answer,
            "Updated DNS rewrite"
        );
        Ok(())
    }

    /// Delete a rewrite.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn delete_rewrite(&self, domain: &str, answer: &str) -> Result<()> {
        self.post(ADGUARD_DELETE_PATH, &Rewrite::new(domain, answer))
            .await?;
        info!(domain = %domain, answer = %answer, "Deleted DNS rewrite");
        Ok(())
    }
}

#[cfg(test)]
#[path = "adguard_tests.rs"]
mod adguard_tests;
