//! Session persistence
//!
//! A session is a [`History`] saved as a pretty-printed JSON array of
//! `{role, content}` records at `<data_dir>/sessions/<name>`.

use crate::config::Config;
use crate::error::{RagbotError, Result};
use crate::history::History;

use anyhow::Context;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// File-backed store of named conversation histories
///
/// The sessions directory is created on first save. Saving over an existing
/// name replaces it.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions_dir: PathBuf,
}

impl SessionStore {
    /// Store under the configured data directory, or the platform default
    ///
    /// # Errors
    ///
    /// Returns `RagbotError::Config` if no data directory can be determined
    pub fn from_config(config: &Config) -> Result<Self> {
        let data_dir = match &config.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir()?,
        };
        Ok(Self::new_with_path(data_dir))
    }

    /// Store rooted at an explicit data directory
    pub fn new_with_path<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self {
            sessions_dir: data_dir.into().join("sessions"),
        }
    }

    /// Directory holding the session files
    pub fn sessions_dir(&self) -> &Path {
        &self.sessions_dir
    }

    /// Persist a history under `name`
    ///
    /// # Errors
    ///
    /// Returns `RagbotError::Input` for an invalid name, or an IO error if
    /// the file cannot be written
    ///
    /// # Examples
    ///
    /// ```
    /// use ragbot::history::{History, Turn};
    /// use ragbot::session::SessionStore;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = SessionStore::new_with_path(dir.path());
    /// let history: History = vec![Turn::user("Hi"), Turn::assistant("Hello")].into();
    ///
    /// store.save(&history, "demo.json").unwrap();
    /// assert_eq!(store.load("demo.json").unwrap(), history);
    /// ```
    pub fn save(&self, history: &History, name: &str) -> Result<PathBuf> {
        validate_name(name)?;

        let dir = &self.sessions_dir;
        std::fs::create_dir_all(dir)
            .map_err(RagbotError::Io)
            .with_context(|| format!("Failed to create sessions directory {}", dir.display()))?;

        let path = self.sessions_dir.join(name);
        let json = serde_json::to_string_pretty(history).map_err(RagbotError::Serialization)?;
        std::fs::write(&path, json)
            .map_err(RagbotError::Io)
            .with_context(|| format!("Failed to write session {}", path.display()))?;

        tracing::info!("Saved session {} ({} turns)", name, history.len());
        Ok(path)
    }

    /// Read a history saved under `name`
    ///
    /// # Errors
    ///
    /// Returns `RagbotError::SessionNotFound` if there is no such file and
    /// `RagbotError::SessionCorrupt` if it is not a valid turn list
    pub fn load(&self, name: &str) -> Result<History> {
        validate_name(name)?;

        let path = self.sessions_dir.join(name);
        if !path.is_file() {
            return Err(RagbotError::SessionNotFound(name.to_string()).into());
        }

        let contents = std::fs::read_to_string(&path).map_err(|e| RagbotError::SessionCorrupt {
            name: name.to_string(),
            message: e.to_string(),
        })?;

        let history: History =
            serde_json::from_str(&contents).map_err(|e| RagbotError::SessionCorrupt {
                name: name.to_string(),
                message: e.to_string(),
            })?;

        tracing::debug!("Loaded session {} ({} turns)", name, history.len());
        Ok(history)
    }

    /// Names of all saved sessions, sorted
    ///
    /// Empty when the sessions directory does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the directory exists but cannot be read
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.sessions_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        let dir = &self.sessions_dir;
        let entries = std::fs::read_dir(dir)
            .map_err(RagbotError::Io)
            .with_context(|| format!("Failed to read sessions directory {}", dir.display()))?;
        for entry in entries {
            let entry = entry.map_err(RagbotError::Io)?;
            if entry.file_type().map_err(RagbotError::Io)?.is_file() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }

        names.sort();
        Ok(names)
    }
}

fn default_data_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "ragbot").ok_or_else(|| {
        RagbotError::Config("Could not determine data directory".to_string())
    })?;
    Ok(dirs.data_dir().to_path_buf())
}

/// Session names are single plain file names
fn validate_name(name: &str) -> Result<()> {
    let plain = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\');

    if plain {
        Ok(())
    } else {
        Err(RagbotError::Input(format!("Invalid session name: {:?}", name)).into())
    }
}
