// src/services/practice.rs

//! Pass-through client for the external grammar-practice model server.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

use crate::error::AppError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct PracticeClient {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl PracticeClient {
    pub fn new(base_url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self { client, base_url }
    }

    /// Sends `body` to `{base_url}{path}` and returns the upstream JSON as-is.
    pub async fn forward(&self, path: &str, body: &Value) -> Result<Value, AppError> {
        let base_url = self.base_url.as_deref().ok_or_else(|| {
            AppError::UpstreamUnavailable("Practice service is not configured".to_string())
        })?;
        let url = format!("{}{}", base_url, path);

        let res = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(path, "Practice service unreachable: {}", e);
                AppError::UpstreamUnavailable("Practice service is unavailable".to_string())
            })?;

        let status = res.status();
        if !status.is_success() {
            tracing::warn!(path, %status, "Practice service returned an error");
            return Err(AppError::UpstreamUnavailable(format!(
                "Practice service returned HTTP {}",
                status
            )));
        }

        res.json::<Value>().await.map_err(|e| {
            AppError::UpstreamUnavailable(format!("Practice service sent invalid JSON: {}", e))
        })
    }
}
