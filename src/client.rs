//! Client for a running describe-image server.
//!
//! Posts `{"image_path": ...}` and reads back either `description` or
//! `error`. The path is resolved by the *server*, so it must be valid on the
//! server's file system.

use crate::error::DescribeError;
use crate::server::DescribeRequest;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Default address of a locally started server.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

/// Either field may be present; `error` wins when both are.
#[derive(Debug, Deserialize)]
struct ServerReply {
    description: Option<String>,
    error: Option<String>,
}

/// Thin `reqwest` wrapper around `POST /describe-image`.
#[derive(Debug, Clone)]
pub struct DescribeClient {
    http: reqwest::Client,
    endpoint: String,
}

impl DescribeClient {
    /// Client for the server at `base_url` (e.g. `http://127.0.0.1:5000`).
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint_for(base_url.as_ref()),
        }
    }

    /// Same as [`DescribeClient::new`] with a whole-request timeout.
    pub fn with_timeout(base_url: impl AsRef<str>, timeout_secs: u64) -> Result<Self, DescribeError> {
        let endpoint = endpoint_for(base_url.as_ref());
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| DescribeError::RequestFailed {
                url: endpoint.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Ask the server to describe the image at `image_path`.
    ///
    /// # Errors
    /// - [`DescribeError::RequestFailed`] when the server is unreachable or
    ///   its body is not the expected JSON
    /// - [`DescribeError::Remote`] carrying the server's `error` message
    pub async fn describe(&self, image_path: &str) -> Result<String, DescribeError> {
        let body = DescribeRequest {
            image_path: Some(image_path.to_string()),
        };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.request_failed(e))?;

        let status = response.status();
        let reply: ServerReply = response.json().await.map_err(|e| self.request_failed(e))?;
        debug!("{} → HTTP {}", self.endpoint, status);

        match reply {
            ServerReply {
                error: Some(message),
                ..
            } => Err(DescribeError::Remote {
                status: status.as_u16(),
                message,
            }),
            ServerReply {
                description: Some(description),
                ..
            } => Ok(description),
            _ => Err(DescribeError::RequestFailed {
                url: self.endpoint.clone(),
                reason: format!("HTTP {} with neither description nor error", status),
            }),
        }
    }

    fn request_failed(&self, e: reqwest::Error) -> DescribeError {
        DescribeError::RequestFailed {
            url: self.endpoint.clone(),
            reason: e.to_string(),
        }
    }
}

fn endpoint_for(base_url: &str) -> String {
    format!("{}/describe-image", base_url.trim_end_matches('/'))
}
