//! Text-completion provider
//!
//! Speaks the legacy `/v1/complete` API: the latest user turn is wrapped in
//! human/assistant markers and sent as one prompt string. Earlier turns and
//! system material are not transmitted.

use crate::config::{EngineKind, GenerationParams};
use crate::error::{RagbotError, Result};
use crate::history::History;
use crate::providers::base::{build_client, check_status, Provider};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Marker opening a human turn; also the stop sequence
pub const HUMAN_PROMPT: &str = "\n\nHuman:";

/// Marker opening the assistant turn
pub const AI_PROMPT: &str = "\n\nAssistant:";

/// API version header value
const API_VERSION: &str = "2023-06-01";

/// Provider for single-prompt engines
pub struct TextCompletionProvider {
    name: String,
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

/// Request body for `/v1/complete`
#[derive(Debug, Serialize)]
struct CompleteRequest<'a> {
    model: &'a str,
    prompt: String,
    max_tokens_to_sample: u32,
    temperature: f32,
    stop_sequences: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
struct CompleteResponse {
    #[serde(default)]
    completion: Option<String>,
}

/// Wrap the latest user turn in human/assistant markers
///
/// Returns `None` when the history has no user turn.
///
/// # Examples
///
/// ```
/// use ragbot::history::{History, Turn};
/// use ragbot::providers::anthropic::build_prompt;
///
/// let history: History = vec![Turn::system("ignored"), Turn::user("Hi")].into();
/// assert_eq!(
///     build_prompt(&history).as_deref(),
///     Some("\n\nHuman: Hi \n\nAssistant:")
/// );
/// ```
pub fn build_prompt(history: &History) -> Option<String> {
    history
        .latest_user_content()
        .map(|content| format!("{} {} {}", HUMAN_PROMPT, content, AI_PROMPT))
}

impl TextCompletionProvider {
    /// Create a provider for the engine at `api_base`
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created
    pub fn new(name: impl Into<String>, api_base: &str, api_key: Option<String>) -> Result<Self> {
        let name = name.into();
        let client = build_client(&name)?;
        let endpoint = format!("{}/v1/complete", api_base.trim_end_matches('/'));

        tracing::info!("Initialized prompt provider: name={}, endpoint={}", name, endpoint);
        if api_key.is_none() {
            tracing::warn!("No API key configured for engine {}", name);
        }

        Ok(Self {
            name,
            endpoint,
            api_key,
            client,
        })
    }

    /// Full URL requests are posted to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body<'a>(
        &self,
        history: &History,
        params: &'a GenerationParams,
    ) -> Result<CompleteRequest<'a>> {
        let prompt = build_prompt(history).ok_or_else(|| {
            RagbotError::provider(&self.name, "Conversation has no user turn to send")
        })?;

        Ok(CompleteRequest {
            model: &params.model,
            prompt,
            max_tokens_to_sample: params.max_tokens,
            temperature: params.temperature,
            stop_sequences: vec![HUMAN_PROMPT],
        })
    }
}

#[async_trait]
impl Provider for TextCompletionProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> EngineKind {
        EngineKind::Prompt
    }

    async fn submit(&self, history: &History, params: &GenerationParams) -> Result<String> {
        let body = self.request_body(history, params)?;

        if params.stream {
            tracing::debug!("{} does not stream; waiting for the full reply", self.name);
        }
        tracing::debug!(
            "Sending {} request: model={}, prompt={} chars",
            self.name,
            params.model,
            body.prompt.len()
        );

        let mut request = self
            .client
            .post(&self.endpoint)
            .timeout(params.request_timeout)
            .header("anthropic-version", API_VERSION)
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!("{} request failed: {}", self.name, e);
            RagbotError::provider(&self.name, format!("Request failed: {}", e))
        })?;
        let response = check_status(&self.name, response).await?;

        let parsed: CompleteResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse {} response: {}", self.name, e);
            RagbotError::provider(&self.name, format!("Failed to parse response: {}", e))
        })?;

        Ok(parsed.completion.unwrap_or_default())
    }
}
