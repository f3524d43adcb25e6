use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Project config file read from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "rag-mcp.yaml";

/// Prefix of environment overrides, nested keys split on `__`.
pub const ENV_PREFIX: &str = "RAG_MCP_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Collection name cannot be empty")]
    EmptyCollection,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid embedding dimensions: {0}. Must be at least 1")]
    InvalidDimensions(usize),

    #[error("Invalid max_input_tokens: {0}. Must be at least 1")]
    InvalidMaxInputTokens(usize),

    #[error("Embedding model cannot be empty")]
    EmptyModel,

    #[error("Config file not found: {0}")]
    MissingFile(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. `rag-mcp.yaml` in the working directory, or `config_file` when given
    /// 3. Environment variables (`RAG_MCP_*`, `__` for nesting)
    pub fn load(config_file: Option<&Path>) -> Result<Config> {
        if let Some(path) = config_file {
            if !path.exists() {
                return Err(ConfigError::MissingFile(path.display().to_string()).into());
            }
        }

        let config: Config = Self::figment(config_file)
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// The merged provider chain, before extraction.
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let file = config_file.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.trim().is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.collection.trim().is_empty() {
            return Err(ConfigError::EmptyCollection);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        if config.embedding.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel);
        }

        if config.embedding.dimensions == 0 {
            return Err(ConfigError::InvalidDimensions(config.embedding.dimensions));
        }

        if let Some(0) = config.embedding.max_input_tokens {
            return Err(ConfigError::InvalidMaxInputTokens(0));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}
