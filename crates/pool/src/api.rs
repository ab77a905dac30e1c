//! HTTP client for a layout worker's `/calculate` endpoint.
//!
//! One [`WorkerApi`] per worker; they share a single [`reqwest::Client`]
//! so connection pooling and the request timeout apply pool-wide.

use std::time::Duration;

use lgl_core::JobRequest;
use reqwest::StatusCode;

/// HTTP client for a single layout worker.
#[derive(Debug, Clone)]
pub struct WorkerApi {
    client: reqwest::Client,
    base_url: String,
}

/// Errors from a worker call.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The HTTP request itself failed (connection refused, timeout, etc.).
    #[error("Worker request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The worker answered with anything other than 200.
    #[error("Worker returned HTTP {status}: {body}")]
    Status {
        status: u16,
        /// Raw response body, passed through unmodified.
        body: String,
    },

    /// The worker process has exited; the job was not sent.
    #[error("Worker on port {port} is not running")]
    WorkerExited { port: u16 },

    /// The pool shut down before the job was resolved.
    #[error("Job was dropped before a worker resolved it")]
    Dropped,
}

/// Build the client shared by every [`WorkerApi`] in a pool.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, RpcError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

impl WorkerApi {
    /// Create an API client for the worker listening on `port`.
    pub fn with_client(client: reqwest::Client, port: u16) -> Self {
        Self {
            client,
            base_url: format!("http://localhost:{port}"),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask the worker to lay out the network in `request.source` and write
    /// positions to `request.target`.
    ///
    /// Sends `POST /calculate` with the request as JSON. A 200 response body
    /// is returned as-is (as a JSON string if it is not JSON).
    pub async fn calculate(&self, request: &JobRequest) -> Result<serde_json::Value, RpcError> {
        let response = self
            .client
            .post(format!("{}/calculate", self.base_url))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            return Err(RpcError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(parse_body(body))
    }
}

fn parse_body(body: String) -> serde_json::Value {
    serde_json::from_str(&body).unwrap_or(serde_json::Value::String(body))
}
