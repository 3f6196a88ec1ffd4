//! Base provider trait and shared HTTP helpers
//!
//! Every engine in the catalog is backed by one [`Provider`]. A provider
//! turns a [`History`] plus [`GenerationParams`] into exactly one reply
//! string; how the history is shaped on the wire is the provider's concern.

use crate::config::{EngineKind, GenerationParams};
use crate::error::{RagbotError, Result};
use crate::history::History;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};

/// Provider trait for text-generation backends
///
/// Implementations must not mutate the history and must return the whole
/// reply; streamed fragments are drained before `submit` resolves.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use ragbot::config::{EngineKind, GenerationParams};
/// use ragbot::error::Result;
/// use ragbot::history::History;
/// use ragbot::providers::Provider;
///
/// struct Echo;
///
/// #[async_trait]
/// impl Provider for Echo {
///     fn name(&self) -> &str {
///         "echo"
///     }
///
///     fn kind(&self) -> EngineKind {
///         EngineKind::Chat
///     }
///
///     async fn submit(&self, history: &History, _params: &GenerationParams) -> Result<String> {
///         Ok(history.latest_user_content().unwrap_or_default().to_string())
///     }
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync {
    /// Engine name this provider is registered under
    fn name(&self) -> &str;

    /// Request shape the provider speaks
    fn kind(&self) -> EngineKind;

    /// Submit a conversation and return the full reply
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, the provider rejects it, or the
    /// response cannot be decoded
    async fn submit(&self, history: &History, params: &GenerationParams) -> Result<String>;
}

/// Build the HTTP client shared by the built-in providers
///
/// No client-wide timeout is set; each request carries its own.
pub(crate) fn build_client(provider: &str) -> Result<Client> {
    Client::builder()
        .user_agent(concat!("ragbot/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| {
            RagbotError::provider(provider, format!("Failed to create HTTP client: {}", e)).into()
        })
}

/// Map a non-success status and body to a provider error
pub(crate) fn format_api_error(provider: &str, status: StatusCode, body: &str) -> RagbotError {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        RagbotError::provider(
            provider,
            format!(
                "Authentication failed ({}): {}. Check the API key environment variable",
                status, body
            ),
        )
    } else {
        RagbotError::provider(provider, format!("API returned error {}: {}", status, body))
    }
}

/// Pass successful responses through, turn the rest into errors
pub(crate) async fn check_status(provider: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::error!("{} returned error {}: {}", provider, status, body);
    Err(format_api_error(provider, status, &body).into())
}
