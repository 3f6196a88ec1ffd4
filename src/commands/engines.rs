//! Engine catalog listing
//!
//! Prints every configured engine and model with the generation defaults
//! that would apply to it, as a table or as JSON.

use crate::config::{Config, EngineKind};
use crate::error::{RagbotError, Result};

use prettytable::{cell, row, Table};
use serde::Serialize;

/// One engine/model pair as listed
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EngineRow {
    /// Engine name
    pub engine: String,
    /// Request shape
    pub kind: EngineKind,
    /// Model name
    pub model: String,
    /// Effective default temperature
    pub temperature: f32,
    /// Effective default max tokens
    pub max_tokens: u32,
    /// Engine is the catalog default
    pub default_engine: bool,
    /// Model is its engine's default
    pub default_model: bool,
}

/// Flatten the catalog into rows, in catalog order
///
/// Temperature and max tokens fall back to the global settings when a model
/// does not set them.
pub fn catalog_rows(config: &Config) -> Vec<EngineRow> {
    config
        .engines
        .iter()
        .flat_map(|engine| {
            engine.models.iter().map(move |model| EngineRow {
                engine: engine.name.clone(),
                kind: engine.kind,
                model: model.name.clone(),
                temperature: model
                    .temperature
                    .unwrap_or(config.temperature_settings.creative),
                max_tokens: model.max_tokens.unwrap_or(config.default_max_tokens),
                default_engine: engine.name == config.default_engine,
                default_model: model.name == engine.default_model,
            })
        })
        .collect()
}

/// List the engine catalog
///
/// # Errors
///
/// Returns `RagbotError::Serialization` if JSON output fails
pub fn list_engines(config: &Config, json: bool) -> Result<()> {
    let rows = catalog_rows(config);

    if json {
        let output = serde_json::to_string_pretty(&rows).map_err(RagbotError::Serialization)?;
        println!("{}", output);
        return Ok(());
    }

    output_engines_table(&rows);
    Ok(())
}

fn output_engines_table(rows: &[EngineRow]) {
    let mut table = Table::new();
    table.add_row(row![
        "Engine",
        "Kind",
        "Model",
        "Temperature",
        "Max Tokens"
    ]);

    for r in rows {
        let engine = if r.default_engine {
            format!("{} (default)", r.engine)
        } else {
            r.engine.clone()
        };
        let model = if r.default_model {
            format!("{} *", r.model)
        } else {
            r.model.clone()
        };

        table.add_row(row![
            engine,
            r.kind,
            model,
            format!("{:.2}", r.temperature),
            r.max_tokens
        ]);
    }

    println!("\nConfigured engines (* = engine default model):\n");
    table.printstd();
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_rows_default_config() {
        let config = Config::default();
        let rows = catalog_rows(&config);
        assert_eq!(rows.len(), 4);

        let first = &rows[0];
        assert_eq!(first.engine, "openai");
        assert_eq!(first.kind, EngineKind::Chat);
        assert!(first.default_engine);
        assert!(first.default_model);

        let anthropic: Vec<&EngineRow> = rows.iter().filter(|r| r.engine == "anthropic").collect();
        assert_eq!(anthropic.len(), 2);
        assert!(anthropic.iter().all(|r| !r.default_engine));
    }

    #[test]
    fn test_catalog_rows_fall_back_to_global_settings() {
        let mut config = Config::default();
        config.engines[0].models[1].temperature = None;
        config.engines[0].models[1].max_tokens = None;
        config.default_max_tokens = 777;

        let rows = catalog_rows(&config);
        assert_eq!(rows[1].temperature, config.temperature_settings.creative);
        assert_eq!(rows[1].max_tokens, 777);
    }

    #[test]
    fn test_rows_serialize_kind_lowercase() {
        let rows = catalog_rows(&Config::default());
        let json = serde_json::to_value(&rows).unwrap();
        assert_eq!(json[0]["kind"], "chat");
        assert_eq!(json[2]["kind"], "prompt");
    }

    #[test]
    fn test_list_engines_outputs() {
        let config = Config::default();
        assert!(list_engines(&config, true).is_ok());
        assert!(list_engines(&config, false).is_ok());
    }
}
