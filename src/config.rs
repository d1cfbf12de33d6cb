//! Application configuration
//!
//! Settings come from an optional TOML file; secrets come from the
//! environment (and `.env`) so the file can be shared safely.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable holding the inference service API key
pub const API_KEY_ENV: &str = "CSV_SQL_AGENT_API_KEY";

/// Directory name used under the platform config and temp directories
const APP_DIR: &str = "csv-sql-agent";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file
    pub database_path: PathBuf,
    /// The single managed table
    pub table_name: String,
    /// Where uploads are copied and the dataset snapshot is kept
    pub temp_dir: PathBuf,
    /// File name of the dataset snapshot inside `temp_dir`
    pub snapshot_file: String,
    /// Optional JSON-lines file receiving response votes
    pub feedback_log: Option<PathBuf>,
    pub agent: AgentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Base URL of an OpenAI-compatible API
    pub endpoint: String,
    pub model: String,
    /// Maximum number of model round trips per prompt
    pub max_steps: usize,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    /// Read from the environment, never from the file
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: PathBuf::from("agentDB.db"),
            table_name: "agent_table".to_string(),
            temp_dir: std::env::temp_dir().join(APP_DIR),
            snapshot_file: "table_data.bin".to_string(),
            feedback_log: None,
            agent: AgentConfig::default(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            endpoint: "https://api.studio.nebius.com/v1".to_string(),
            model: "Qwen/Qwen3-235B-A22B".to_string(),
            max_steps: 5,
            temperature: 0.1,
            max_tokens: 2048,
            timeout_secs: 120,
            api_key: None,
        }
    }
}

impl Config {
    /// Loads configuration.
    ///
    /// An explicit `path` must exist. Without one, the platform default
    /// location is tried and defaults are used when nothing is there.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(default) if default.is_file() => Self::from_file(&default)?,
                _ => {
                    tracing::debug!("No configuration file found, using defaults");
                    Config::default()
                }
            },
        };

        config.agent.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.table_name.trim().is_empty() {
            return Err(anyhow!("table_name must not be empty"));
        }
        if self.snapshot_file.trim().is_empty() {
            return Err(anyhow!("snapshot_file must not be empty"));
        }
        if self.agent.max_steps == 0 {
            return Err(anyhow!("agent.max_steps must be at least 1"));
        }
        Ok(())
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.temp_dir.join(&self.snapshot_file)
    }
}

/// `<config dir>/csv-sql-agent/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}
