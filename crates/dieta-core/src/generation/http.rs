//! HTTP adapter for the generation service.
//!
//! Sends the profile as JSON to `POST {base_url}/create` and expects
//! `{"data": <plan>}` back.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use crate::plan::{self, DietPlan, UserProfile};

use super::trait_def::GenerationClient;

/// Longest slice of an error body included in error messages.
const MAX_ERROR_BODY: usize = 512;

/// Generation client speaking HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpGenerationClient {
    client: Client,
    base_url: String,
}

impl HttpGenerationClient {
    /// Create a client for the service at `base_url`.
    ///
    /// `timeout` bounds each request at the transport level.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("dieta/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn create_url(&self) -> String {
        format!("{}/create", self.base_url)
    }
}

#[async_trait]
impl GenerationClient for HttpGenerationClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn generate(&self, profile: &UserProfile) -> Result<DietPlan> {
        let url = self.create_url();
        debug!(%url, profile = %profile.name, "requesting diet plan");

        let response = self
            .client
            .post(&url)
            .json(profile)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .with_context(|| format!("failed to read response body from {url}"))?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            let snippet: String = text.chars().take(MAX_ERROR_BODY).collect();
            bail!("generation service returned {status}: {snippet}");
        }

        let plan = plan::decode_response(&body)
            .with_context(|| format!("malformed plan in response from {url}"))?;

        info!(plan = %plan.name, meals = plan.meals.len(), "diet plan received");
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let client =
            HttpGenerationClient::new("http://localhost:3333/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3333");
        assert_eq!(client.create_url(), "http://localhost:3333/create");
    }
}
