use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for the requisition engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SolpedEngineConfig {
    /// Observability settings
    pub observability: ObservabilityConfig,
    /// Identifier allocation retry policy
    pub sequence: SequenceConfig,
    /// Persistence call limits
    pub storage: StorageConfig,
    /// Database settings (optional)
    pub database: Option<DatabaseConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Enable structured tracing output
    pub tracing_enabled: bool,
    /// Log level
    pub log_level: String,
}

/// Backoff applied when sequence allocation is contended. Only
/// allocation retries internally; everything else is the caller's retry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SequenceConfig {
    /// Maximum allocation attempts before surfacing a transient failure
    pub max_attempts: u32,
    /// First backoff delay in milliseconds
    pub base_delay_ms: u64,
    /// Backoff ceiling in milliseconds
    pub max_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Upper bound for any single persistence call, in seconds
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database URL (SQLite file path or connection string)
    pub url: String,
    /// Maximum connections in pool
    pub max_connections: u32,
    /// Enable automatic migrations
    pub auto_migrate: bool,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 25,
            max_delay_ms: 500,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { timeout_seconds: 5 }
    }
}

impl Default for SolpedEngineConfig {
    fn default() -> Self {
        Self {
            observability: ObservabilityConfig {
                tracing_enabled: true,
                log_level: "info".to_string(),
            },
            sequence: SequenceConfig::default(),
            storage: StorageConfig::default(),
            database: Some(DatabaseConfig {
                url: ".solped/solped.db".to_string(),
                max_connections: 10,
                auto_migrate: true,
            }),
        }
    }
}

impl SolpedEngineConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (solped-engine.toml)
    /// 3. Environment variables (prefixed with SOLPED_)
    pub fn load() -> Result<Self> {
        let defaults = Config::try_from(&Self::default())?;
        let mut builder = Config::builder().add_source(defaults);

        if Path::new("solped-engine.toml").exists() {
            builder = builder.add_source(File::with_name("solped-engine"));
        }

        builder = builder.add_source(
            Environment::with_prefix("SOLPED")
                .separator("_")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let config = SolpedEngineConfig::default();
        assert!(config.sequence.max_attempts >= 1);
        assert!(config.sequence.base_delay_ms <= config.sequence.max_delay_ms);
        assert!(config.storage.timeout_seconds > 0);
    }

    #[test]
    fn test_round_trips_through_toml() {
        let config = SolpedEngineConfig::default();
        let rendered = toml::to_string_pretty(&config).unwrap();
        let back: SolpedEngineConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(back.sequence.max_attempts, config.sequence.max_attempts);
        assert_eq!(back.storage.timeout_seconds, config.storage.timeout_seconds);
    }
}
