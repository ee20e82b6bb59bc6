use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON5 parse error: {0}")]
    Json5(#[from] json5::Error),
    #[error("Config directory not found")]
    NoDirFound,
}

/// Which system adapter to use for the live scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AdapterMode {
    /// Pick the crontab adapter when the platform command exists, otherwise
    /// fall back to the file-backed stand-in.
    #[default]
    Auto,
    Crontab,
    File,
}

/// Task table and log file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    /// The authoritative local copy of the cron table.
    #[serde(default = "default_table_file")]
    pub file: PathBuf,
    /// Mutation audit log (one line per table change).
    #[serde(default = "default_audit_log")]
    pub audit_log: PathBuf,
    /// Execution history, newline-delimited JSON.
    #[serde(default = "default_execution_log")]
    pub execution_log: PathBuf,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            file: default_table_file(),
            audit_log: default_audit_log(),
            execution_log: default_execution_log(),
        }
    }
}

/// Live scheduler integration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default)]
    pub adapter: AdapterMode,
    /// File standing in for the live table when the file adapter is used.
    #[serde(default = "default_system_file")]
    pub file: PathBuf,
    /// Where pre-overwrite backups of the live table are written.
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            adapter: AdapterMode::default(),
            file: default_system_file(),
            backup_dir: default_backup_dir(),
        }
    }
}

/// Command execution settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecConfig {
    /// Optional wall-clock limit for manual runs. Absent means unbounded;
    /// a hung command then blocks its caller indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// External tracking endpoint settings (consumed by the wrapper script).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL the wrapper script reports completions to.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Secret file holding the shared API key; generated on first use.
    #[serde(default = "default_api_key_file")]
    pub key_file: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            key_file: default_api_key_file(),
        }
    }
}

/// Top-level cronman configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CronmanConfig {
    #[serde(default)]
    pub table: TableConfig,
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub exec: ExecConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

fn default_base() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".cronman"))
        .unwrap_or_else(|| PathBuf::from(".cronman"))
}

fn default_table_file() -> PathBuf {
    default_base().join("crontab")
}

fn default_audit_log() -> PathBuf {
    default_base().join("logs").join("cron_tasks.log")
}

fn default_execution_log() -> PathBuf {
    default_base().join("logs").join("cron_tasks_executions.log")
}

fn default_system_file() -> PathBuf {
    default_base().join("system_crontab")
}

fn default_backup_dir() -> PathBuf {
    std::env::temp_dir()
}

fn default_api_key_file() -> PathBuf {
    default_base().join("api_key.txt")
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

/// Resolve the cronman config directory (~/.cronman/).
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|h| h.join(".cronman"))
        .ok_or(ConfigError::NoDirFound)
}

/// Resolve the config file path (~/.cronman/config.json5).
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.json5"))
}

/// Load configuration from the default path, falling back to defaults.
pub fn load_config() -> Result<CronmanConfig, ConfigError> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let path = config_file_path()?;
    load_config_from(&path)
}

/// Load configuration from a specific path, falling back to defaults if not found.
pub fn load_config_from(path: &Path) -> Result<CronmanConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("Config file not found at {}, using defaults", path.display());
        return Ok(CronmanConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: CronmanConfig = json5::from_str(&content)?;
    Ok(config)
}

/// Ensure the config directory exists.
pub fn ensure_config_dir() -> Result<PathBuf, ConfigError> {
    let dir = config_dir()?;
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(dir)
}

/// Save configuration to the default path.
pub fn save_config(config: &CronmanConfig) -> Result<(), ConfigError> {
    let dir = ensure_config_dir()?;
    let path = dir.join("config.json5");
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| ConfigError::Io(std::io::Error::other(e)))?;
    std::fs::write(path, content)?;
    Ok(())
}
