//! Page-to-PDF rendering collaborator.
//!
//! The renderer is a pure function of (URL) -> (bytes | failure); it holds no
//! pipeline state. Failures are reported in the [`RenderResult`], not raised,
//! so the orchestrator never depends on error-message matching.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::RenderConfig;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to build render client: {0}")]
    ClientBuild(String),
}

/// Outcome of one render invocation. Created per call, never persisted.
#[derive(Debug, Clone)]
pub struct RenderResult {
    pub success: bool,
    pub file_name: String,
    pub buffer: Bytes,
    pub error: Option<String>,
}

impl RenderResult {
    pub fn completed(file_name: String, buffer: Bytes) -> Self {
        Self {
            success: true,
            file_name,
            buffer,
            error: None,
        }
    }

    pub fn failed(file_name: String, error: impl Into<String>) -> Self {
        Self {
            success: false,
            file_name,
            buffer: Bytes::new(),
            error: Some(error.into()),
        }
    }
}

/// Produces a PDF byte buffer for a fully-resolved page URL.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &str, slug: &str) -> RenderResult;
}

/// Renderer backed by a headless-browser rendering endpoint
/// (browserless-style `POST /pdf`).
pub struct HttpRenderer {
    client: Client,
    endpoint: String,
    navigation_timeout_ms: u64,
}

impl HttpRenderer {
    pub fn new(config: &RenderConfig) -> Result<Self, RenderError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| RenderError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            navigation_timeout_ms: config.navigation_timeout_ms,
        })
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn render(&self, url: &str, slug: &str) -> RenderResult {
        let file_name = format!("{slug}.pdf");
        debug!(url, slug, "Rendering page to PDF");

        let body = json!({
            "url": url,
            "gotoOptions": {
                "waitUntil": "networkidle2",
                "timeout": self.navigation_timeout_ms,
            },
            "options": {
                "format": "A4",
                "printBackground": true,
                "margin": {
                    "top": "1cm",
                    "right": "1cm",
                    "bottom": "1cm",
                    "left": "1cm",
                },
            },
        });

        let response = match self.client.post(&self.endpoint).json(&body).send().await {
            Ok(response) => response,
            Err(e) => {
                error!(url, error = %e, "Render request failed");
                return RenderResult::failed(file_name, e.to_string());
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            error!(url, %status, detail, "Render endpoint returned error status");
            return RenderResult::failed(file_name, format!("render endpoint returned {status}: {detail}"));
        }

        match response.bytes().await {
            Ok(buffer) => {
                debug!(url, size = buffer.len(), "Render completed");
                RenderResult::completed(file_name, buffer)
            }
            Err(e) => {
                error!(url, error = %e, "Failed to read rendered PDF body");
                RenderResult::failed(file_name, e.to_string())
            }
        }
    }
}
