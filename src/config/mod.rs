//! Configuration management module
//!
//! Handles loading, validation, and management of application configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Ordered list of client credentials; empty entries are skipped at
    /// startup but still consume their position for index assignment
    pub tokens: Vec<String>,

    /// The only user whose commands are honored
    pub owner_id: u64,

    /// Logging level
    pub log_level: String,

    /// File-based logging configuration
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    /// Absolute or relative path to the log file
    pub file_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tokens: Vec::new(),
            owner_id: 0,
            log_level: "info".to_string(),
            log: LogConfig::default(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file_path: "logs/macrobot.log".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment variable overrides
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        config.apply_env_overrides();

        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        // MACROBOT_TOKENS - comma-separated credential list; empty segments
        // keep their slot so later credentials retain their index
        if let Ok(tokens) = env::var("MACROBOT_TOKENS") {
            self.tokens = tokens.split(',').map(|s| s.trim().to_string()).collect();
        }

        // TOKEN1, TOKEN2, ... - positional credential overrides
        let mut slot = 1;
        while let Ok(token) = env::var(format!("TOKEN{}", slot)) {
            if self.tokens.len() < slot {
                self.tokens.resize(slot, String::new());
            }
            self.tokens[slot - 1] = token;
            slot += 1;
        }

        // MACROBOT_OWNER_ID / OWNER_ID - authorized command issuer
        for key in ["MACROBOT_OWNER_ID", "OWNER_ID"] {
            if let Ok(owner) = env::var(key) {
                if let Ok(value) = owner.parse::<u64>() {
                    self.owner_id = value;
                    break;
                }
            }
        }

        // MACROBOT_LOG_LEVEL - logging level
        if let Ok(log_level) = env::var("MACROBOT_LOG_LEVEL") {
            self.log_level = log_level;
        }

        // MACROBOT_LOG_FILE_PATH - logging destination file
        if let Ok(file_path) = env::var("MACROBOT_LOG_FILE_PATH") {
            if !file_path.trim().is_empty() {
                self.log.file_path = file_path;
            }
        }
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Load configuration with fallback to default
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::load_from_file(path).unwrap_or_else(|err| {
            tracing::warn!("Failed to load config: {}, using defaults", err);
            let mut config = Self::default();
            config.apply_env_overrides();
            config
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.owner_id == 0 {
            anyhow::bail!("owner_id must be set to a non-zero user id");
        }

        if !self.tokens.iter().any(|t| !t.trim().is_empty()) {
            anyhow::bail!("At least one non-empty credential must be configured");
        }

        if self.log.file_path.trim().is_empty() {
            anyhow::bail!("Log file path must not be empty");
        }

        Ok(())
    }

    /// Number of credentials that will actually start a client
    pub fn active_credentials(&self) -> usize {
        self.tokens.iter().filter(|t| !t.trim().is_empty()).count()
    }

    /// Display configuration summary
    pub fn display_summary(&self) -> Result<()> {
        println!("Configuration loaded successfully");
        println!(
            "Credentials: {} configured, {} active",
            self.tokens.len(),
            self.active_credentials()
        );
        println!("Owner id: {}", self.owner_id);
        println!("Log level: {}", self.log_level);
        println!("Log file: {}", self.log.file_path);
        Ok(())
    }
}
