//! Interactive chat session state machine
//!
//! This module parses the reserved inputs of the interactive loop and drives
//! the conversation: prompts are dispatched, replies appended, and the
//! history saved on request. Rendering is left to the caller.
//!
//! Reserved inputs are case-insensitive:
//! - `/quit`, `/exit` (also bare `quit` and `exit`)
//! - `/save <name>` (also bare `save <name>` for a single-word name)
//! - `/help`
//! - `/retry`

use crate::config::GenerationParams;
use crate::error::Result;
use crate::history::{History, HistoryBuilder};
use crate::providers::Dispatcher;
use crate::session::SessionStore;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when parsing chat commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// End the session
    Quit,
    /// Persist the history under a name
    Save(String),
    /// Show reserved inputs
    Help,
    /// Re-send an unanswered user turn
    Retry,
    /// Anything else, blank lines included: a new user prompt
    Prompt(String),
}

/// Parse one line of interactive input
///
/// # Examples
///
/// ```
/// use ragbot::chat_session::{parse_chat_command, ChatCommand};
///
/// assert_eq!(parse_chat_command("/QUIT").unwrap(), ChatCommand::Quit);
/// assert_eq!(
///     parse_chat_command("save demo.json").unwrap(),
///     ChatCommand::Save("demo.json".to_string())
/// );
/// assert_eq!(
///     parse_chat_command("save the whales").unwrap(),
///     ChatCommand::Prompt("save the whales".to_string())
/// );
/// ```
pub fn parse_chat_command(input: &str) -> std::result::Result<ChatCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    match lower.as_str() {
        "/quit" | "/exit" | "quit" | "exit" => return Ok(ChatCommand::Quit),
        "/help" | "/?" => return Ok(ChatCommand::Help),
        "/retry" => return Ok(ChatCommand::Retry),
        "/save" => {
            return Err(CommandError::MissingArgument {
                command: "/save".to_string(),
                usage: "/save <name>".to_string(),
            })
        }
        _ => {}
    }

    if lower.starts_with("/save ") {
        return Ok(ChatCommand::Save(trimmed[6..].trim().to_string()));
    }

    if lower.starts_with("save ") {
        let name = trimmed[5..].trim();
        if !name.is_empty() && !name.contains(char::is_whitespace) {
            return Ok(ChatCommand::Save(name.to_string()));
        }
    }

    if trimmed.starts_with('/') {
        let command = lower.split_whitespace().next().unwrap_or(&lower);
        return Err(CommandError::UnknownCommand(command.to_string()));
    }

    Ok(ChatCommand::Prompt(trimmed.to_string()))
}

/// Lifecycle of an interactive session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the next line
    AwaitingInput,
    /// Quit was requested; no further input is accepted
    Terminated,
}

/// What handling one line produced
#[derive(Debug)]
pub enum LineOutcome {
    /// Input arrived after the session ended
    Ignored,
    /// Provider reply, already appended to the history
    Replied(String),
    /// History was written to this path
    Saved { name: String, path: PathBuf },
    /// Caller should print help
    ShowHelp,
    /// Input was a malformed or unknown command
    Rejected(CommandError),
    /// Dispatch or save failed; the session continues
    Failed(anyhow::Error),
    /// Session ended
    Quit,
}

/// Interactive conversation bound to one engine
///
/// Instruction and dataset material is applied only when the first prompt
/// starts a new conversation.
pub struct ChatSession<'a> {
    dispatcher: &'a Dispatcher,
    store: &'a SessionStore,
    engine: Option<String>,
    params: GenerationParams,
    instructions: Vec<String>,
    datasets: Vec<String>,
    history: History,
    state: SessionState,
}

impl<'a> ChatSession<'a> {
    /// Start a session, optionally continuing a loaded history
    pub fn new(
        dispatcher: &'a Dispatcher,
        store: &'a SessionStore,
        engine: Option<String>,
        params: GenerationParams,
        history: Option<History>,
    ) -> Self {
        Self {
            dispatcher,
            store,
            engine,
            params,
            instructions: Vec::new(),
            datasets: Vec::new(),
            history: history.unwrap_or_default(),
            state: SessionState::AwaitingInput,
        }
    }

    /// Material for a fresh conversation
    pub fn with_material(mut self, instructions: Vec<String>, datasets: Vec<String>) -> Self {
        self.instructions = instructions;
        self.datasets = datasets;
        self
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Conversation so far
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Parameters used for every dispatch
    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// Handle one line of input
    ///
    /// Lines received after termination are ignored.
    pub async fn handle_line(&mut self, line: &str) -> LineOutcome {
        if self.state == SessionState::Terminated {
            return LineOutcome::Ignored;
        }

        let command = match parse_chat_command(line) {
            Ok(command) => command,
            Err(e) => return LineOutcome::Rejected(e),
        };

        match command {
            ChatCommand::Quit => {
                self.terminate();
                LineOutcome::Quit
            }
            ChatCommand::Help => LineOutcome::ShowHelp,
            ChatCommand::Save(name) => match self.save(&name) {
                Ok(path) => LineOutcome::Saved { name, path },
                Err(e) => LineOutcome::Failed(e),
            },
            ChatCommand::Retry => match self.retry().await {
                Ok(reply) => LineOutcome::Replied(reply),
                Err(e) => LineOutcome::Failed(e),
            },
            ChatCommand::Prompt(prompt) => match self.submit(prompt).await {
                Ok(reply) => LineOutcome::Replied(reply),
                Err(e) => LineOutcome::Failed(e),
            },
        }
    }

    /// Append a user turn, dispatch, and append the reply on success
    ///
    /// On failure the user turn stays last and no assistant turn is added.
    pub async fn submit(&mut self, prompt: impl Into<String>) -> Result<String> {
        let prior = if self.history.is_empty() {
            None
        } else {
            Some(self.history.clone())
        };

        self.history = HistoryBuilder::new()
            .instructions(self.instructions.clone())
            .datasets(self.datasets.clone())
            .prior(prior)
            .prompt(prompt)
            .build()?;

        self.dispatch_pending().await
    }

    /// Re-send the last user turn if it is still unanswered
    ///
    /// # Errors
    ///
    /// Returns `RagbotError::Input` when there is nothing to retry
    pub async fn retry(&mut self) -> Result<String> {
        self.history = HistoryBuilder::new()
            .prior(Some(self.history.clone()))
            .build()?;
        self.dispatch_pending().await
    }

    async fn dispatch_pending(&mut self) -> Result<String> {
        let reply = self
            .dispatcher
            .dispatch(self.engine.as_deref(), &self.history, &self.params)
            .await?;
        self.history.push_assistant(reply.clone());
        Ok(reply)
    }

    /// Persist the current history
    pub fn save(&self, name: &str) -> Result<PathBuf> {
        self.store.save(&self.history, name)
    }

    /// Move to the terminal state
    pub fn terminate(&mut self) {
        tracing::debug!("Chat session terminated after {} turns", self.history.len());
        self.state = SessionState::Terminated;
    }
}

/// Display help for reserved inputs
pub fn print_help() {
    println!(
        r#"
Interactive Chat Commands
=========================

  /save <name>    - Save the conversation to <name> in the sessions folder
  save <name>     - Same as /save when <name> is a single word
  /retry          - Re-send the last prompt if it got no reply
  /help           - Show this help message
  /quit, /exit    - End the session (quit and exit also work)

Anything else is sent to the engine as a prompt.
Press Ctrl-C or Ctrl-D to leave at any time.
"#
    );
}
