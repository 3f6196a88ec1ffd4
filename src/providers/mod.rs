//! Provider module for Ragbot
//!
//! This module contains the provider abstraction, the chat-style and
//! single-prompt implementations, and the [`Dispatcher`] that routes a
//! conversation to the engine named by the caller.

pub mod anthropic;
pub mod base;
pub mod openai;
pub mod sse;

pub use anthropic::TextCompletionProvider;
pub use base::Provider;
pub use openai::ChatCompletionsProvider;

use crate::config::{Config, EngineKind, EngineProfile, GenerationParams};
use crate::error::{RagbotError, Result};
use crate::history::History;

use std::collections::HashMap;

/// Create a provider instance for a catalog engine
///
/// # Arguments
///
/// * `profile` - Engine entry from the catalog
/// * `api_key` - Credential read from the engine's key variable, if set
///
/// # Errors
///
/// Returns error if provider initialization fails
pub fn create_provider(
    profile: &EngineProfile,
    api_key: Option<String>,
) -> Result<Box<dyn Provider>> {
    match profile.kind {
        EngineKind::Chat => Ok(Box::new(ChatCompletionsProvider::new(
            &profile.name,
            &profile.api_base,
            api_key,
        )?)),
        EngineKind::Prompt => Ok(Box::new(TextCompletionProvider::new(
            &profile.name,
            &profile.api_base,
            api_key,
        )?)),
    }
}

/// Routes a conversation to one provider and returns its reply
///
/// Selection is a lookup by engine name; the catalog default is used when
/// the caller names none.
///
/// # Examples
///
/// ```no_run
/// use ragbot::config::{Config, ParamOverrides};
/// use ragbot::history::HistoryBuilder;
/// use ragbot::providers::Dispatcher;
///
/// # async fn example() -> ragbot::error::Result<()> {
/// let config = Config::default();
/// let dispatcher = Dispatcher::from_config(&config)?;
/// let engine = config.select_engine(None)?;
/// let params = config.resolve_params(engine, &ParamOverrides::default())?;
/// let history = HistoryBuilder::new().prompt("Hi").build()?;
/// let reply = dispatcher.dispatch(None, &history, &params).await?;
/// # Ok(())
/// # }
/// ```
pub struct Dispatcher {
    providers: HashMap<String, Box<dyn Provider>>,
    default_engine: String,
}

impl Dispatcher {
    /// Create an empty dispatcher whose default is `default_engine`
    pub fn new(default_engine: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_engine: default_engine.into(),
        }
    }

    /// Build one provider per catalog engine
    ///
    /// Each engine's key variable is read here, once.
    ///
    /// # Errors
    ///
    /// Returns error if any provider cannot be created
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut dispatcher = Self::new(&config.default_engine);
        for profile in &config.engines {
            let api_key = profile
                .api_key_name
                .as_deref()
                .and_then(|var| std::env::var(var).ok())
                .filter(|key| !key.is_empty());
            dispatcher = dispatcher.with_provider(create_provider(profile, api_key)?);
        }

        tracing::debug!(
            "Dispatcher ready: {} engines, default={}",
            dispatcher.providers.len(),
            dispatcher.default_engine
        );
        Ok(dispatcher)
    }

    /// Register a provider, replacing any with the same name
    pub fn with_provider(mut self, provider: Box<dyn Provider>) -> Self {
        self.providers.insert(provider.name().to_string(), provider);
        self
    }

    /// Engine used when none is named
    pub fn default_engine(&self) -> &str {
        &self.default_engine
    }

    /// Registered engine names, sorted
    pub fn engine_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Look up a provider by name, falling back to the default engine
    ///
    /// # Errors
    ///
    /// Returns `RagbotError::Config` when no provider has that name
    pub fn provider(&self, engine: Option<&str>) -> Result<&dyn Provider> {
        let name = engine.unwrap_or(&self.default_engine);
        self.providers
            .get(name)
            .map(|p| p.as_ref())
            .ok_or_else(|| {
                RagbotError::Config(format!(
                    "Unknown engine: {}. Configured engines: {}",
                    name,
                    self.engine_names().join(", ")
                ))
                .into()
            })
    }

    /// Send the history to one engine and return the full reply
    ///
    /// The history is borrowed immutably; callers append the reply only on
    /// success.
    ///
    /// # Errors
    ///
    /// Returns `RagbotError::Config` for an unknown engine and
    /// `RagbotError::Provider` for any failure of the call itself,
    /// including exceeding `params.request_timeout`
    pub async fn dispatch(
        &self,
        engine: Option<&str>,
        history: &History,
        params: &GenerationParams,
    ) -> Result<String> {
        let provider = self.provider(engine)?;
        let name = provider.name().to_string();

        tracing::info!("Dispatching to {} (model {})", name, params.model);

        let outcome = tokio::time::timeout(params.request_timeout, provider.submit(history, params))
            .await
            .map_err(|_| {
                tracing::error!("{} timed out after {:?}", name, params.request_timeout);
                RagbotError::provider(
                    &name,
                    format!("Timed out after {}s", params.request_timeout.as_secs()),
                )
            })?;

        outcome.map_err(|e| match e.downcast::<RagbotError>() {
            Ok(err @ RagbotError::Provider { .. }) => err.into(),
            Ok(other) => RagbotError::provider(&name, other.to_string()).into(),
            Err(other) => RagbotError::provider(&name, format!("{:#}", other)).into(),
        })
    }
}
