//! Chat-completions provider
//!
//! Sends the whole history as an ordered role/content message list to an
//! OpenAI-compatible `/chat/completions` endpoint. Streamed replies are
//! decoded from Server-Sent Events and drained into one string.

use crate::config::{EngineKind, GenerationParams};
use crate::error::{RagbotError, Result};
use crate::history::{History, Turn};
use crate::providers::base::{build_client, check_status, Provider};
use crate::providers::sse::data_events;

use async_trait::async_trait;
use futures::future;
use futures::stream::{Stream, TryStreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Marker payload that ends a streamed reply
const DONE_MARKER: &str = "[DONE]";

/// Provider for chat-style engines
///
/// # Examples
///
/// ```no_run
/// use ragbot::config::Config;
/// use ragbot::history::HistoryBuilder;
/// use ragbot::providers::{ChatCompletionsProvider, Provider};
///
/// # async fn example() -> ragbot::error::Result<()> {
/// let config = Config::default();
/// let engine = config.engine("openai")?;
/// let provider = ChatCompletionsProvider::new(
///     "openai",
///     &engine.api_base,
///     std::env::var("OPENAI_API_KEY").ok(),
/// )?;
/// let params = config.resolve_params(engine, &Default::default())?;
/// let history = HistoryBuilder::new().prompt("Hello!").build()?;
/// let reply = provider.submit(&history, &params).await?;
/// println!("{}", reply);
/// # Ok(())
/// # }
/// ```
pub struct ChatCompletionsProvider {
    name: String,
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

/// Request body for `/chat/completions`
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

/// Non-streamed response body
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ReplyMessage>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// One streamed chunk
#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<Delta>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionsProvider {
    /// Create a provider for the engine at `api_base`
    ///
    /// A missing key is not an error here; the API rejects the request.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created
    pub fn new(name: impl Into<String>, api_base: &str, api_key: Option<String>) -> Result<Self> {
        let name = name.into();
        let client = build_client(&name)?;
        let endpoint = format!("{}/chat/completions", api_base.trim_end_matches('/'));

        tracing::info!("Initialized chat provider: name={}, endpoint={}", name, endpoint);
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

    async fn send(
        &self,
        body: &ChatRequest<'_>,
        params: &GenerationParams,
    ) -> Result<reqwest::Response> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .timeout(params.request_timeout)
            .json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!("{} request failed: {}", self.name, e);
            RagbotError::provider(&self.name, format!("Request failed: {}", e))
        })?;

        check_status(&self.name, response).await
    }
}

#[async_trait]
impl Provider for ChatCompletionsProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> EngineKind {
        EngineKind::Chat
    }

    async fn submit(&self, history: &History, params: &GenerationParams) -> Result<String> {
        let body = ChatRequest {
            model: &params.model,
            messages: history.turns(),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            stream: params.stream,
        };

        tracing::debug!(
            "Sending {} request: model={}, {} messages, stream={}",
            self.name,
            params.model,
            history.len(),
            params.stream
        );

        let response = self.send(&body, params).await?;

        if params.stream {
            let events = data_events(Box::pin(response.bytes_stream()));
            let reply = collect_fragments(reply_fragments(events)).await.map_err(|e| {
                RagbotError::provider(&self.name, format!("Stream failed: {:#}", e))
            })?;
            tracing::debug!("{} streamed reply: {} chars", self.name, reply.len());
            return Ok(reply);
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse {} response: {}", self.name, e);
            RagbotError::provider(&self.name, format!("Failed to parse response: {}", e))
        })?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_default())
    }
}

/// Text carried by one streamed chunk, if any
fn parse_delta(data: &str) -> Result<Option<String>> {
    let chunk: ChatChunk = serde_json::from_str(data)
        .map_err(|e| anyhow::anyhow!("Malformed stream chunk: {}", e))?;
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta)
        .and_then(|d| d.content))
}

/// Lazy stream of reply fragments, ending at the done marker
pub fn reply_fragments<S>(events: S) -> impl Stream<Item = Result<String>>
where
    S: Stream<Item = Result<String>>,
{
    events
        .try_take_while(|data| future::ready(Ok(data.trim() != DONE_MARKER)))
        .try_filter_map(|data| future::ready(parse_delta(&data)))
}

/// Drain a fragment stream into one string, in arrival order
///
/// Partial text is dropped if the stream fails.
pub async fn collect_fragments<S>(fragments: S) -> Result<String>
where
    S: Stream<Item = Result<String>>,
{
    fragments
        .try_fold(String::new(), |mut reply, fragment| {
            reply.push_str(&fragment);
            future::ready(Ok(reply))
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use std::time::Duration;

    fn events(items: &[&str]) -> impl Stream<Item = Result<String>> {
        let owned: Vec<Result<String>> = items.iter().map(|s| Ok(s.to_string())).collect();
        stream::iter(owned)
    }

    #[test]
    fn test_provider_endpoint_trims_trailing_slash() {
        let provider =
            ChatCompletionsProvider::new("openai", "http://localhost:9999/v1/", None).unwrap();
        assert_eq!(provider.endpoint(), "http://localhost:9999/v1/chat/completions");
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.kind(), EngineKind::Chat);
    }

    #[test]
    fn test_request_serializes_history_in_order() {
        let history: History = vec![Turn::system("Be concise"), Turn::user("Hi")].into();
        let params = GenerationParams {
            model: "gpt-4o".to_string(),
            max_tokens: 64,
            temperature: 0.5,
            stream: false,
            request_timeout: Duration::from_secs(5),
        };
        let body = ChatRequest {
            model: &params.model,
            messages: history.turns(),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            stream: params.stream,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "Hi");
        assert_eq!(json["max_tokens"], 64);
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn test_parse_delta() {
        let data = r#"{"choices":[{"delta":{"content":"Hel"}}]}"#;
        assert_eq!(parse_delta(data).unwrap(), Some("Hel".to_string()));

        let role_only = r#"{"choices":[{"delta":{"role":"assistant"}}]}"#;
        assert_eq!(parse_delta(role_only).unwrap(), None);

        let no_choices = r#"{"choices":[]}"#;
        assert_eq!(parse_delta(no_choices).unwrap(), None);

        assert!(parse_delta("not json").is_err());
    }

    #[tokio::test]
    async fn test_fragments_concatenate_in_order() {
        let stream = events(&[
            r#"{"choices":[{"delta":{"role":"assistant"}}]}"#,
            r#"{"choices":[{"delta":{"content":"Hel"}}]}"#,
            r#"{"choices":[{"delta":{"content":"lo"}}]}"#,
            r#"{"choices":[{"delta":{"content":"!"}}]}"#,
            "[DONE]",
        ]);
        let reply = collect_fragments(reply_fragments(stream)).await.unwrap();
        assert_eq!(reply, "Hello!");
    }

    #[tokio::test]
    async fn test_fragments_stop_at_done_marker() {
        let stream = events(&[
            r#"{"choices":[{"delta":{"content":"a"}}]}"#,
            "[DONE]",
            r#"{"choices":[{"delta":{"content":"ignored"}}]}"#,
        ]);
        let reply = collect_fragments(reply_fragments(stream)).await.unwrap();
        assert_eq!(reply, "a");
    }

    #[tokio::test]
    async fn test_fragments_with_no_content_yield_empty_reply() {
        let reply = collect_fragments(reply_fragments(events(&["[DONE]"])))
            .await
            .unwrap();
        assert_eq!(reply, "");
    }

    #[tokio::test]
    async fn test_fragments_error_discards_partial_text() {
        let items: Vec<Result<String>> = vec![
            Ok(r#"{"choices":[{"delta":{"content":"partial"}}]}"#.to_string()),
            Err(anyhow::anyhow!("connection reset")),
        ];
        let result = collect_fragments(reply_fragments(stream::iter(items))).await;
        assert!(result.is_err());
    }
}
