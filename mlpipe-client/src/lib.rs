//! mlpipe HTTP Clients
//!
//! Type-safe HTTP clients for the mlpipe dispatcher API and for the external
//! services the dispatcher depends on.
//!
//! - [`DispatcherClient`]: trigger intake, job queries, alarms and lifecycle
//!   maintenance (used by the CLI)
//! - [`ComputeClient`]: the compute-job submission API
//! - [`CloudClient`]: network inventory and metric publishing
//! - [`StorageClient`]: object listing, copy and delete in the artifact store
//!
//! # Example
//!
//! ```no_run
//! use mlpipe_client::DispatcherClient;
//! use mlpipe_core::dto::trigger::ObjectCreatedEvent;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = DispatcherClient::new("http://localhost:8080");
//!
//!     let response = client.object_created(ObjectCreatedEvent {
//!         bucket: "data".to_string(),
//!         key: "raw/input.csv".to_string(),
//!         size: 1024,
//!     }).await?;
//!
//!     println!("Outcome: {:?}", response.outcome);
//!     Ok(())
//! }
//! ```

mod cloud;
mod compute;
pub mod error;
mod jobs;
mod storage;
mod triggers;

pub use cloud::CloudClient;
pub use compute::ComputeClient;
pub use error::{ClientError, Result};
pub use storage::StorageClient;

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the mlpipe dispatcher API
///
/// Methods are organized into logical groups:
/// - Trigger intake (object-created, notification envelopes, schedule, direct)
/// - Job queries
/// - Alarms
/// - Lifecycle maintenance
#[derive(Debug, Clone)]
pub struct DispatcherClient {
    /// Base URL of the dispatcher (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl DispatcherClient {
    /// Create a new dispatcher client
    ///
    /// # Example
    /// ```
    /// use mlpipe_client::DispatcherClient;
    ///
    /// let client = DispatcherClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new dispatcher client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            client,
        }
    }

    /// Get the base URL of the dispatcher
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

pub(crate) fn normalize_base_url(base_url: impl Into<String>) -> String {
    base_url.into().trim_end_matches('/').to_string()
}

// =============================================================================
// Response Handlers
// =============================================================================

/// Check the status code and deserialize the JSON body
///
/// Non-success responses become [`ClientError::ApiError`] carrying the
/// response body as message.
pub(crate) async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::api_error(status.as_u16(), error_text));
    }

    response
        .json()
        .await
        .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
}

/// Check the status code of a response that carries no body
pub(crate) async fn handle_empty_response(response: reqwest::Response) -> Result<()> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::api_error(status.as_u16(), error_text));
    }

    Ok(())
}
