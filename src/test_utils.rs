//! Test utilities for Ragbot
//!
//! This module provides a scripted provider, fixed generation parameters,
//! and assertion helpers shared by the unit tests.

use crate::config::{EngineKind, GenerationParams};
use crate::error::{RagbotError, Result};
use crate::history::History;
use crate::providers::Provider;

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Create a temporary directory for testing
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Generation parameters suitable for tests
pub fn test_params() -> GenerationParams {
    GenerationParams {
        model: "test-model".to_string(),
        max_tokens: 128,
        temperature: 0.5,
        stream: false,
        request_timeout: Duration::from_secs(5),
    }
}

/// Provider that answers from a queue and records every history it sees
///
/// `Err` entries become provider failures. An exhausted queue fails too.
pub struct ScriptedProvider {
    name: String,
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    seen: Arc<Mutex<Vec<History>>>,
}

impl ScriptedProvider {
    /// Create a provider registered as `name`
    pub fn new(name: &str, replies: Vec<std::result::Result<&str, &str>>) -> Self {
        Self {
            name: name.to_string(),
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle to the recorded histories, usable after the provider is boxed
    pub fn seen(&self) -> Arc<Mutex<Vec<History>>> {
        Arc::clone(&self.seen)
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> EngineKind {
        EngineKind::Chat
    }

    async fn submit(&self, history: &History, _params: &GenerationParams) -> Result<String> {
        self.seen.lock().unwrap().push(history.clone());
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(RagbotError::provider(&self.name, message).into()),
            None => Err(RagbotError::provider(&self.name, "no scripted reply left").into()),
        }
    }
}

/// Assert that an error chain contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T: std::fmt::Debug>(result: Result<T>, expected: &str) {
    match result {
        Ok(v) => panic!("Expected error containing '{}' but got Ok({:?})", expected, v),
        Err(e) => {
            let error_msg = format!("{:#}", e);
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::Turn;

    #[tokio::test]
    async fn test_scripted_provider_replays_queue() {
        let provider = ScriptedProvider::new("mock", vec![Ok("one"), Err("down")]);
        let seen = provider.seen();
        let history: History = vec![Turn::user("q")].into();

        assert_eq!(provider.submit(&history, &test_params()).await.unwrap(), "one");
        assert_error_contains(provider.submit(&history, &test_params()).await, "down");
        assert_error_contains(
            provider.submit(&history, &test_params()).await,
            "no scripted reply",
        );
        assert_eq!(seen.lock().unwrap().len(), 3);
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_error_contains_ok() {
        assert_error_contains(Ok(()), "error");
    }

    #[test]
    fn test_temp_dir_creation() {
        let dir = temp_dir();
        assert!(dir.path().exists());
    }
}
