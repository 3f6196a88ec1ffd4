//! Ragbot - conversational assistant library
//!
//! This library provides the core functionality behind the `ragbot` CLI:
//! composing conversation histories from custom instructions and curated
//! datasets, dispatching them to pluggable LLM providers, and persisting
//! conversations as named sessions.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `history`: Turns, histories, and the history builder
//! - `providers`: Provider abstraction, chat-style and single-prompt implementations, dispatcher
//! - `session`: Named session files
//! - `chat_session`: Interactive session state machine and command parser
//! - `context`: Instruction and dataset loading from files and folders
//! - `output`: Structured output extraction for one-shot replies
//! - `config`: Engine catalog, overrides, and parameter resolution
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use ragbot::config::ParamOverrides;
//! use ragbot::history::HistoryBuilder;
//! use ragbot::providers::Dispatcher;
//! use ragbot::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/engines.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let dispatcher = Dispatcher::from_config(&config)?;
//!     let engine = config.select_engine(None)?;
//!     let params = config.resolve_params(engine, &ParamOverrides::default())?;
//!     let history = HistoryBuilder::new()
//!         .instructions(vec!["Answer in one sentence.".to_string()])
//!         .prompt("What is Rust?")
//!         .build()?;
//!
//!     println!("{}", dispatcher.dispatch(None, &history, &params).await?);
//!     Ok(())
//! }
//! ```

pub mod chat_session;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod history;
pub mod output;
pub mod providers;
pub mod session;

// Re-export commonly used types
pub use config::Config;
pub use error::{RagbotError, Result};
pub use history::{History, HistoryBuilder, Role, Turn};
pub use providers::{Dispatcher, Provider};
pub use session::SessionStore;

#[cfg(test)]
pub mod test_utils;
