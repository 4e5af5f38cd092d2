//! Configuration loading with hierarchical merging.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

/// Configuration error types.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("test command cannot be empty")]
    EmptyTestCommand,

    #[error("lint command cannot be empty")]
    EmptyLintCommand,

    #[error("agent binary path cannot be empty")]
    EmptyAgentBinary,

    #[error("ledger path cannot be empty")]
    EmptyLedgerPath,

    #[error("blocking_headings cannot be empty")]
    EmptyBlockingHeadings,

    #[error("excerpt_lines must be at least 1")]
    InvalidExcerptLines,

    #[error("max_detail_lines must be at least 1")]
    InvalidMaxDetailLines,
}

/// Configuration loader.
///
/// Precedence (lowest to highest):
/// 1. Programmatic defaults
/// 2. `.ostinato/config.yaml` (project config)
/// 3. `.ostinato/local.yaml` (local overrides, optional)
/// 4. Environment variables (`OSTINATO_*`, highest priority)
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".ostinato/config.yaml"))
            .merge(Yaml::file(".ostinato/local.yaml"))
            .merge(Env::prefixed("OSTINATO_").split("__"))
            .extract()
            .context("failed to extract configuration")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still layered over defaults.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .with_context(|| {
                format!("failed to load config from {}", path.as_ref().display())
            })?;

        Self::validate(&config)?;
        Ok(config)
    }

    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.validation.test_command.is_empty() {
            return Err(ConfigError::EmptyTestCommand);
        }
        if config.validation.lint_command.is_empty() {
            return Err(ConfigError::EmptyLintCommand);
        }
        if config.agent.binary_path.is_empty() {
            return Err(ConfigError::EmptyAgentBinary);
        }
        if config.ledger.path.is_empty() {
            return Err(ConfigError::EmptyLedgerPath);
        }
        if config.ledger.blocking_headings.is_empty() {
            return Err(ConfigError::EmptyBlockingHeadings);
        }
        if config.validation.lint.excerpt_lines == 0 {
            return Err(ConfigError::InvalidExcerptLines);
        }
        if config.validation.max_detail_lines == 0 {
            return Err(ConfigError::InvalidMaxDetailLines);
        }
        Ok(())
    }
}
