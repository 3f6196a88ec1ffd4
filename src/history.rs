//! Conversation history and the history builder
//!
//! A [`History`] is the ordered list of role-tagged [`Turn`]s sent to a
//! provider. [`HistoryBuilder`] composes one either from instruction and
//! dataset material plus a prompt, or by extending a prior history.

use crate::error::{RagbotError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a turn's author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instruction or curated dataset material
    System,
    /// Prompt entered by the user
    User,
    /// Reply produced by a provider
    Assistant,
}

impl Role {
    /// Wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message in a conversation
///
/// Unknown fields are ignored on deserialization so session files written
/// by newer versions still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Author of the turn
    pub role: Role,
    /// Text of the turn
    pub content: String,
}

impl Turn {
    /// Creates a system turn
    ///
    /// # Examples
    ///
    /// ```
    /// use ragbot::history::{Role, Turn};
    ///
    /// let turn = Turn::system("Be concise");
    /// assert_eq!(turn.role, Role::System);
    /// ```
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Creates a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates an assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered sequence of turns exchanged with a provider
///
/// Turns are append-only; insertion order is the conversation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    turns: Vec<Turn>,
}

impl History {
    /// Creates an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a user turn
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::user(content));
    }

    /// Appends an assistant turn
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::assistant(content));
    }

    /// Appends a system turn
    pub fn push_system(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::system(content));
    }

    /// All turns in order
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of turns
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the history has no turns
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Last turn, if any
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Content of the most recent user turn
    ///
    /// # Examples
    ///
    /// ```
    /// use ragbot::history::History;
    ///
    /// let mut history = History::new();
    /// history.push_user("first");
    /// history.push_assistant("reply");
    /// history.push_user("second");
    /// assert_eq!(history.latest_user_content(), Some("second"));
    /// ```
    pub fn latest_user_content(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == Role::User)
            .map(|t| t.content.as_str())
    }

    /// Whether the last turn is a user turn still waiting for a reply
    pub fn awaiting_reply(&self) -> bool {
        matches!(self.last(), Some(t) if t.role == Role::User)
    }
}

impl From<Vec<Turn>> for History {
    fn from(turns: Vec<Turn>) -> Self {
        Self { turns }
    }
}

impl FromIterator<Turn> for History {
    fn from_iter<I: IntoIterator<Item = Turn>>(iter: I) -> Self {
        Self {
            turns: iter.into_iter().collect(),
        }
    }
}

/// Composes the history to send to a provider
///
/// Without a prior history the result is one system turn per instruction
/// text, then one system turn per dataset text, then the user prompt. With a
/// prior history the material is ignored and the prompt is appended.
///
/// # Examples
///
/// ```
/// use ragbot::history::{HistoryBuilder, Turn};
///
/// let history = HistoryBuilder::new()
///     .instructions(vec!["Be concise".to_string()])
///     .prompt("Hi")
///     .build()
///     .unwrap();
/// assert_eq!(history.turns(), &[Turn::system("Be concise"), Turn::user("Hi")]);
/// ```
#[derive(Debug, Default)]
pub struct HistoryBuilder {
    instructions: Vec<String>,
    datasets: Vec<String>,
    prior: Option<History>,
    prompt: Option<String>,
}

impl HistoryBuilder {
    /// Creates an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Instruction texts, in the order their sources were given
    pub fn instructions(mut self, instructions: Vec<String>) -> Self {
        self.instructions = instructions;
        self
    }

    /// Curated dataset texts, in the order their sources were given
    pub fn datasets(mut self, datasets: Vec<String>) -> Self {
        self.datasets = datasets;
        self
    }

    /// Existing conversation to extend
    pub fn prior(mut self, prior: Option<History>) -> Self {
        self.prior = prior;
        self
    }

    /// New user prompt (may be empty)
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Builds the history
    ///
    /// # Errors
    ///
    /// Returns `RagbotError::Input` when no prompt was given and there is no
    /// prior history ending in an unanswered user turn.
    pub fn build(self) -> Result<History> {
        match self.prior {
            Some(mut history) => {
                match self.prompt {
                    Some(prompt) => history.push_user(prompt),
                    None if history.awaiting_reply() => {
                        tracing::debug!("Reusing unanswered user turn from prior history");
                    }
                    None => {
                        return Err(RagbotError::Input(
                            "No prompt given and the conversation has no unanswered user turn"
                                .to_string(),
                        )
                        .into())
                    }
                }
                Ok(history)
            }
            None => {
                let prompt = self.prompt.ok_or_else(|| {
                    RagbotError::Input("No prompt given for a new conversation".to_string())
                })?;

                let mut history = History::new();
                for text in self.instructions {
                    history.push_system(text);
                }
                for text in self.datasets {
                    history.push_system(text);
                }
                history.push_user(prompt);

                tracing::debug!("Built new history with {} turns", history.len());
                Ok(history)
            }
        }
    }
}
