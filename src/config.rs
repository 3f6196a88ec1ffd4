//! Configuration management for Ragbot
//!
//! This module handles loading, parsing, validating, and managing the engine
//! catalog from a YAML file, environment variables, and CLI overrides. It
//! also owns the precedence rules that turn per-request overrides and
//! catalog defaults into concrete [`GenerationParams`].

use crate::error::{RagbotError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure for Ragbot
///
/// Built once at startup and passed by reference to everything that needs
/// catalog data. Read-only after [`Config::load`] returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Engine used when the caller does not name one
    #[serde(rename = "default")]
    pub default_engine: String,

    /// Engine catalog
    pub engines: Vec<EngineProfile>,

    /// Named creativity presets
    #[serde(default)]
    pub temperature_settings: TemperatureSettings,

    /// Max output tokens when neither the request nor the model sets one
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Upper bound on a whole provider exchange (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Stream replies from chat-style engines
    #[serde(default = "default_stream")]
    pub stream: bool,

    /// Application data directory; platform default when unset
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Instruction paths applied to every new conversation
    #[serde(default)]
    pub custom_instructions: Vec<String>,

    /// Dataset paths applied to every new conversation
    #[serde(default)]
    pub curated_datasets: Vec<String>,

    /// Named bundles of instruction and dataset paths
    #[serde(default)]
    pub profiles: Vec<Profile>,

    /// Model forced through `RAGBOT_MODEL`
    ///
    /// Applies to the default engine, and to any other engine that lists it.
    #[serde(skip)]
    pub model_override: Option<String>,
}

/// Request shape an engine expects
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// Ordered role/content message list
    Chat,
    /// Single prompt string with human/assistant markers
    Prompt,
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Chat => write!(f, "chat"),
            Self::Prompt => write!(f, "prompt"),
        }
    }
}

/// One backend in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineProfile {
    /// Engine name used for lookup
    pub name: String,

    /// Request shape
    pub kind: EngineKind,

    /// Environment variable holding the API key
    #[serde(default)]
    pub api_key_name: Option<String>,

    /// Base URL of the API; endpoints are appended to it
    pub api_base: String,

    /// Model used when the caller does not pick one
    pub default_model: String,

    /// Supported models
    #[serde(default)]
    pub models: Vec<ModelProfile>,
}

impl EngineProfile {
    /// Look up a model by name
    pub fn model(&self, name: &str) -> Option<&ModelProfile> {
        self.models.iter().find(|m| m.name == name)
    }
}

/// Per-model generation defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelProfile {
    /// Model identifier sent to the API
    pub name: String,

    /// Default temperature
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Default max output tokens
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

/// Temperatures behind the named creativity presets
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TemperatureSettings {
    /// Preset for precise answers
    #[serde(default = "default_precise")]
    pub precise: f32,
    /// Preset between precise and creative
    #[serde(default = "default_balanced")]
    pub balanced: f32,
    /// Preset for creative answers; also the global fallback temperature
    #[serde(default = "default_creative")]
    pub creative: f32,
}

fn default_precise() -> f32 {
    0.20
}

fn default_balanced() -> f32 {
    0.50
}

fn default_creative() -> f32 {
    0.75
}

impl Default for TemperatureSettings {
    fn default() -> Self {
        Self {
            precise: default_precise(),
            balanced: default_balanced(),
            creative: default_creative(),
        }
    }
}

/// Named creativity preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Creativity {
    /// Low temperature
    Precise,
    /// Medium temperature
    Balanced,
    /// High temperature
    Creative,
}

impl TemperatureSettings {
    /// Temperature for a preset
    pub fn for_preset(&self, preset: Creativity) -> f32 {
        match preset {
            Creativity::Precise => self.precise,
            Creativity::Balanced => self.balanced,
            Creativity::Creative => self.creative,
        }
    }
}

/// Named bundle of instruction and dataset paths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Profile name
    pub name: String,
    /// Instruction file/folder paths
    #[serde(default)]
    pub custom_instructions: Vec<String>,
    /// Dataset file/folder paths
    #[serde(default)]
    pub curated_datasets: Vec<String>,
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_request_timeout() -> u64 {
    15
}

fn default_stream() -> bool {
    true
}

/// Per-request overrides supplied by a front end
#[derive(Debug, Clone, Default)]
pub struct ParamOverrides {
    /// Explicit model
    pub model: Option<String>,
    /// Explicit temperature; wins over `creativity`
    pub temperature: Option<f32>,
    /// Named creativity preset
    pub creativity: Option<Creativity>,
    /// Explicit max output tokens
    pub max_tokens: Option<u32>,
    /// Explicit streaming choice
    pub stream: Option<bool>,
}

/// Fully resolved parameters for one provider call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    /// Model identifier
    pub model: String,
    /// Max output tokens (positive)
    pub max_tokens: u32,
    /// Sampling temperature in [0.0, 1.0]
    pub temperature: f32,
    /// Whether to stream the reply
    pub stream: bool,
    /// Bound on the whole exchange
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the engine catalog file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns `RagbotError::Config` if the file exists but cannot be read
    /// or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using built-in catalog", path);
            Self::default_config()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn default_config() -> Self {
        Self {
            default_engine: "openai".to_string(),
            engines: vec![
                EngineProfile {
                    name: "openai".to_string(),
                    kind: EngineKind::Chat,
                    api_key_name: Some("OPENAI_API_KEY".to_string()),
                    api_base: "https://api.openai.com/v1".to_string(),
                    default_model: "gpt-4o".to_string(),
                    models: vec![
                        ModelProfile {
                            name: "gpt-4o".to_string(),
                            temperature: Some(0.75),
                            max_tokens: Some(4096),
                        },
                        ModelProfile {
                            name: "gpt-4o-mini".to_string(),
                            temperature: Some(0.75),
                            max_tokens: Some(4096),
                        },
                    ],
                },
                EngineProfile {
                    name: "anthropic".to_string(),
                    kind: EngineKind::Prompt,
                    api_key_name: Some("ANTHROPIC_API_KEY".to_string()),
                    api_base: "https://api.anthropic.com".to_string(),
                    default_model: "claude-2.1".to_string(),
                    models: vec![
                        ModelProfile {
                            name: "claude-2.1".to_string(),
                            temperature: Some(0.75),
                            max_tokens: Some(4096),
                        },
                        ModelProfile {
                            name: "claude-instant-1.2".to_string(),
                            temperature: Some(0.75),
                            max_tokens: Some(4096),
                        },
                    ],
                },
            ],
            temperature_settings: TemperatureSettings::default(),
            default_max_tokens: default_max_tokens(),
            request_timeout_seconds: default_request_timeout(),
            stream: default_stream(),
            data_dir: None,
            custom_instructions: Vec::new(),
            curated_datasets: Vec::new(),
            profiles: Vec::new(),
            model_override: None,
        }
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RagbotError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml(&contents)
    }

    /// Parse a catalog from YAML text
    ///
    /// # Errors
    ///
    /// Returns `RagbotError::Config` when the text is not a valid catalog
    pub fn from_yaml(contents: &str) -> Result<Self> {
        serde_yaml::from_str(contents)
            .map_err(|e| RagbotError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(engine) = std::env::var("RAGBOT_ENGINE") {
            tracing::debug!(engine = %engine, "Env override: RAGBOT_ENGINE");
            self.default_engine = engine;
        }

        if let Ok(model) = std::env::var("RAGBOT_MODEL") {
            tracing::debug!(model = %model, "Env override: RAGBOT_MODEL");
            self.model_override = Some(model);
        }

        if let Ok(timeout) = std::env::var("RAGBOT_REQUEST_TIMEOUT") {
            if let Ok(value) = timeout.parse() {
                self.request_timeout_seconds = value;
            } else {
                tracing::warn!("Invalid RAGBOT_REQUEST_TIMEOUT: {}", timeout);
            }
        }

        if let Ok(dir) = std::env::var("RAGBOT_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }

        if let Ok(paths) = std::env::var("RAGBOT_CUSTOM_INSTRUCTIONS") {
            self.custom_instructions.extend(split_path_list(&paths));
        }

        if let Ok(paths) = std::env::var("RAGBOT_CURATED_DATASETS") {
            self.curated_datasets.extend(split_path_list(&paths));
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Some(dir) = &cli.data_dir {
            tracing::debug!("Using data dir override from CLI: {}", dir.display());
            self.data_dir = Some(dir.clone());
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `RagbotError::Config` if any catalog check fails
    pub fn validate(&self) -> Result<()> {
        if self.engines.is_empty() {
            return Err(RagbotError::Config("No engines configured".to_string()).into());
        }

        let mut seen = HashSet::new();
        for engine in &self.engines {
            if !seen.insert(engine.name.as_str()) {
                return Err(RagbotError::Config(format!(
                    "Duplicate engine name: {}",
                    engine.name
                ))
                .into());
            }

            if engine.model(&engine.default_model).is_none() {
                return Err(RagbotError::Config(format!(
                    "Default model {} of engine {} is not in its model list",
                    engine.default_model, engine.name
                ))
                .into());
            }

            for model in &engine.models {
                if let Some(t) = model.temperature {
                    if !(0.0..=1.0).contains(&t) {
                        return Err(RagbotError::Config(format!(
                            "Temperature of {}/{} must be between 0.0 and 1.0",
                            engine.name, model.name
                        ))
                        .into());
                    }
                }
                if model.max_tokens == Some(0) {
                    return Err(RagbotError::Config(format!(
                        "max_tokens of {}/{} must be greater than 0",
                        engine.name, model.name
                    ))
                    .into());
                }
            }
        }

        self.engine(&self.default_engine)?;

        let presets = self.temperature_settings;
        for t in [presets.precise, presets.balanced, presets.creative] {
            if !(0.0..=1.0).contains(&t) {
                return Err(RagbotError::Config(
                    "temperature_settings must be between 0.0 and 1.0".to_string(),
                )
                .into());
            }
        }

        if self.default_max_tokens == 0 {
            return Err(RagbotError::Config(
                "default_max_tokens must be greater than 0".to_string(),
            )
            .into());
        }

        if self.request_timeout_seconds == 0 {
            return Err(RagbotError::Config(
                "request_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }

    /// Look up an engine by name
    ///
    /// # Errors
    ///
    /// Returns `RagbotError::Config` when the catalog has no such engine
    pub fn engine(&self, name: &str) -> Result<&EngineProfile> {
        self.engines.iter().find(|e| e.name == name).ok_or_else(|| {
            RagbotError::Config(format!(
                "Unknown engine: {}. Configured engines: {}",
                name,
                self.engine_names().join(", ")
            ))
            .into()
        })
    }

    /// Names of all configured engines, in catalog order
    pub fn engine_names(&self) -> Vec<&str> {
        self.engines.iter().map(|e| e.name.as_str()).collect()
    }

    /// Engine selected by an optional explicit name, else the default
    pub fn select_engine(&self, name: Option<&str>) -> Result<&EngineProfile> {
        self.engine(name.unwrap_or(&self.default_engine))
    }

    /// Look up a profile by name
    pub fn profile(&self, name: &str) -> Result<&Profile> {
        self.profiles.iter().find(|p| p.name == name).ok_or_else(|| {
            RagbotError::Config(format!("Unknown profile: {}", name)).into()
        })
    }

    /// Resolve generation parameters for an engine
    ///
    /// Precedence for each field: explicit override, then the model's
    /// catalog default, then the global setting. A numeric temperature beats
    /// a creativity preset.
    ///
    /// # Errors
    ///
    /// Returns `RagbotError::Config` for an unknown model and
    /// `RagbotError::Input` for out-of-range overrides
    ///
    /// # Examples
    ///
    /// ```
    /// use ragbot::config::{Config, ParamOverrides};
    ///
    /// let config = Config::default();
    /// let engine = config.select_engine(None).unwrap();
    /// let params = config.resolve_params(engine, &ParamOverrides::default()).unwrap();
    /// assert_eq!(params.model, engine.default_model);
    /// ```
    pub fn resolve_params(
        &self,
        engine: &EngineProfile,
        overrides: &ParamOverrides,
    ) -> Result<GenerationParams> {
        let model_name = overrides
            .model
            .clone()
            .or_else(|| self.env_model_for(engine))
            .unwrap_or_else(|| engine.default_model.clone());

        let model = engine.model(&model_name).ok_or_else(|| {
            RagbotError::Config(format!(
                "Unknown model {} for engine {}",
                model_name, engine.name
            ))
        })?;

        let temperature = overrides
            .temperature
            .or_else(|| {
                overrides
                    .creativity
                    .map(|c| self.temperature_settings.for_preset(c))
            })
            .or(model.temperature)
            .unwrap_or(self.temperature_settings.creative);

        if !(0.0..=1.0).contains(&temperature) {
            return Err(RagbotError::Input(format!(
                "Temperature must be between 0.0 and 1.0, got {}",
                temperature
            ))
            .into());
        }

        let max_tokens = overrides
            .max_tokens
            .or(model.max_tokens)
            .unwrap_or(self.default_max_tokens);

        if max_tokens == 0 {
            return Err(RagbotError::Input("max_tokens must be greater than 0".to_string()).into());
        }

        Ok(GenerationParams {
            model: model.name.clone(),
            max_tokens,
            temperature,
            stream: overrides.stream.unwrap_or(self.stream),
            request_timeout: Duration::from_secs(self.request_timeout_seconds),
        })
    }

    /// `RAGBOT_MODEL`, when it applies to `engine`
    fn env_model_for(&self, engine: &EngineProfile) -> Option<String> {
        let model = self.model_override.as_ref()?;
        if engine.name == self.default_engine || engine.model(model).is_some() {
            Some(model.clone())
        } else {
            tracing::debug!(
                "Ignoring RAGBOT_MODEL {} for engine {}, which does not list it",
                model,
                engine.name
            );
            None
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

/// Split a newline-separated path list, dropping blank entries
fn split_path_list(value: &str) -> Vec<String> {
    value
        .lines()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const CATALOG: &str = r#"
default: anthropic
temperature_settings:
  precise: 0.1
  balanced: 0.4
  creative: 0.9
default_max_tokens: 512
request_timeout_seconds: 30
engines:
  - name: openai
    kind: chat
    api_key_name: OPENAI_API_KEY
    api_base: https://api.openai.com/v1
    default_model: gpt-4
    models:
      - name: gpt-4
        temperature: 0.75
        max_tokens: 2048
      - name: gpt-3.5-turbo
  - name: anthropic
    kind: prompt
    api_key_name: ANTHROPIC_API_KEY
    api_base: https://api.anthropic.com
    default_model: claude-2
    models:
      - name: claude-2
        temperature: 0.5
        max_tokens: 8192
profiles:
  - name: work
    custom_instructions:
      - instructions/work
    curated_datasets:
      - datasets/work
"#;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.default_engine, "openai");
        assert_eq!(config.engines.len(), 2);
        assert_eq!(config.request_timeout_seconds, 15);
        assert!(config.stream);
    }

    #[test]
    fn test_config_validation_success() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_yaml() {
        let config = Config::from_yaml(CATALOG).unwrap();
        assert_eq!(config.default_engine, "anthropic");
        assert_eq!(config.engines[1].kind, EngineKind::Prompt);
        assert_eq!(config.default_max_tokens, 512);
        assert_eq!(config.profiles[0].custom_instructions, vec!["instructions/work"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_yaml_malformed_is_config_error() {
        let err = Config::from_yaml("engines: [").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RagbotError>(),
            Some(RagbotError::Config(_))
        ));
    }

    #[test]
    fn test_config_validation_unknown_default_engine() {
        let mut config = Config::default();
        config.default_engine = "cohere".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_default_model_missing() {
        let mut config = Config::default();
        config.engines[0].default_model = "gpt-99".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_duplicate_engine() {
        let mut config = Config::default();
        let dup = config.engines[0].clone();
        config.engines.push(dup);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_model_temperature() {
        let mut config = Config::default();
        config.engines[0].models[0].temperature = Some(1.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = Config::default();
        config.request_timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_no_engines() {
        let mut config = Config::default();
        config.engines.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_resolve_params_uses_model_defaults() {
        let config = Config::from_yaml(CATALOG).unwrap();
        let engine = config.engine("openai").unwrap();
        let params = config
            .resolve_params(engine, &ParamOverrides::default())
            .unwrap();
        assert_eq!(params.model, "gpt-4");
        assert_eq!(params.temperature, 0.75);
        assert_eq!(params.max_tokens, 2048);
        assert_eq!(params.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_resolve_params_falls_back_to_global_settings() {
        let config = Config::from_yaml(CATALOG).unwrap();
        let engine = config.engine("openai").unwrap();
        let overrides = ParamOverrides {
            model: Some("gpt-3.5-turbo".to_string()),
            ..Default::default()
        };
        let params = config.resolve_params(engine, &overrides).unwrap();
        assert_eq!(params.temperature, 0.9);
        assert_eq!(params.max_tokens, 512);
    }

    #[test]
    fn test_resolve_params_explicit_overrides_win() {
        let config = Config::from_yaml(CATALOG).unwrap();
        let engine = config.engine("anthropic").unwrap();
        let overrides = ParamOverrides {
            temperature: Some(0.3),
            creativity: Some(Creativity::Creative),
            max_tokens: Some(100),
            stream: Some(false),
            ..Default::default()
        };
        let params = config.resolve_params(engine, &overrides).unwrap();
        assert_eq!(params.temperature, 0.3);
        assert_eq!(params.max_tokens, 100);
        assert!(!params.stream);
    }

    #[test]
    fn test_resolve_params_creativity_preset_beats_model_default() {
        let config = Config::from_yaml(CATALOG).unwrap();
        let engine = config.engine("anthropic").unwrap();
        let overrides = ParamOverrides {
            creativity: Some(Creativity::Precise),
            ..Default::default()
        };
        let params = config.resolve_params(engine, &overrides).unwrap();
        assert_eq!(params.temperature, 0.1);
    }

    #[test]
    fn test_resolve_params_unknown_model_is_config_error() {
        let config = Config::default();
        let engine = config.select_engine(None).unwrap();
        let overrides = ParamOverrides {
            model: Some("nope".to_string()),
            ..Default::default()
        };
        let err = config.resolve_params(engine, &overrides).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RagbotError>(),
            Some(RagbotError::Config(_))
        ));
    }

    #[test]
    fn test_resolve_params_out_of_range_is_input_error() {
        let config = Config::default();
        let engine = config.select_engine(None).unwrap();
        let overrides = ParamOverrides {
            temperature: Some(1.2),
            ..Default::default()
        };
        let err = config.resolve_params(engine, &overrides).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RagbotError>(),
            Some(RagbotError::Input(_))
        ));

        let overrides = ParamOverrides {
            max_tokens: Some(0),
            ..Default::default()
        };
        assert!(config.resolve_params(engine, &overrides).is_err());
    }

    #[test]
    fn test_select_engine_unknown() {
        let config = Config::default();
        assert!(config.select_engine(Some("bard")).is_err());
        assert_eq!(config.select_engine(None).unwrap().name, "openai");
    }

    #[test]
    fn test_profile_lookup() {
        let config = Config::from_yaml(CATALOG).unwrap();
        assert_eq!(config.profile("work").unwrap().curated_datasets, vec!["datasets/work"]);
        assert!(config.profile("home").is_err());
    }

    #[test]
    fn test_split_path_list() {
        let paths = split_path_list("a.md\n\n  folder/ \n");
        assert_eq!(paths, vec!["a.md", "folder/"]);
    }

    #[test]
    #[serial]
    fn test_load_nonexistent_file_uses_defaults() {
        let cli = crate::cli::Cli::default();
        let config = Config::load("nonexistent.yaml", &cli).unwrap();
        assert!(!config.engines.is_empty());
    }

    #[test]
    #[serial]
    fn test_cli_data_dir_override() {
        let cli = crate::cli::Cli {
            data_dir: Some(PathBuf::from("/tmp/ragbot-data")),
            ..Default::default()
        };
        let config = Config::load("nonexistent.yaml", &cli).unwrap();
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/ragbot-data")));
    }

    #[test]
    fn test_example_config_parses() {
        let contents = std::fs::read_to_string("config/engines.yaml")
            .expect("Failed to read example config/engines.yaml");
        let config = Config::from_yaml(&contents).expect("Failed to parse engines.yaml");
        assert!(config.validate().is_ok());
        assert!(config.engine("openai").is_ok());
        assert!(config.engine("anthropic").is_ok());
    }

    #[test]
    #[serial]
    fn test_apply_env_vars_overrides() {
        std::env::set_var("RAGBOT_ENGINE", "anthropic");
        std::env::set_var("RAGBOT_MODEL", "claude-instant-1.2");
        std::env::set_var("RAGBOT_CUSTOM_INSTRUCTIONS", "one.md\ntwo.md");
        std::env::remove_var("RAGBOT_REQUEST_TIMEOUT");

        let mut config = Config::default();
        config.apply_env_vars();

        std::env::remove_var("RAGBOT_ENGINE");
        std::env::remove_var("RAGBOT_MODEL");
        std::env::remove_var("RAGBOT_CUSTOM_INSTRUCTIONS");

        assert_eq!(config.default_engine, "anthropic");
        assert_eq!(config.custom_instructions, vec!["one.md", "two.md"]);

        let engine = config.select_engine(None).unwrap();
        let params = config
            .resolve_params(engine, &ParamOverrides::default())
            .unwrap();
        assert_eq!(params.model, "claude-instant-1.2");
    }

    #[test]
    fn test_env_model_only_applies_where_it_fits() {
        let mut config = Config::default();
        config.model_override = Some("gpt-4o-mini".to_string());

        let openai = config.engine("openai").unwrap();
        let params = config
            .resolve_params(openai, &ParamOverrides::default())
            .unwrap();
        assert_eq!(params.model, "gpt-4o-mini");

        let anthropic = config.engine("anthropic").unwrap();
        let params = config
            .resolve_params(anthropic, &ParamOverrides::default())
            .unwrap();
        assert_eq!(params.model, "claude-2.1");
    }

    #[test]
    fn test_env_model_unknown_to_default_engine_is_config_error() {
        let mut config = Config::default();
        config.model_override = Some("gpt-nope".to_string());

        let engine = config.select_engine(None).unwrap();
        let err = config
            .resolve_params(engine, &ParamOverrides::default())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RagbotError>(),
            Some(RagbotError::Config(_))
        ));
    }

    #[test]
    #[serial]
    fn test_apply_env_vars_invalid_timeout_is_ignored() {
        std::env::set_var("RAGBOT_REQUEST_TIMEOUT", "soon");
        let mut config = Config::default();
        config.apply_env_vars();
        std::env::remove_var("RAGBOT_REQUEST_TIMEOUT");
        assert_eq!(config.request_timeout_seconds, 15);
    }
}
