// Configuration Storage Service
// Handles config file read/write and version backup

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::detection::HeuristicConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("No configuration directory available on this platform")]
    NoConfigDir,
}

impl ConfigError {
    fn io(action: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub heuristics: HeuristicConfig,
    #[serde(default)]
    pub limits: InputLimits,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            heuristics: HeuristicConfig::default(),
            limits: InputLimits::default(),
            storage: StorageConfig::default(),
        }
    }
}

/// Bounds enforced by the analysis boundary before the engine runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputLimits {
    /// Checked against the trimmed text, in characters.
    #[serde(default = "default_min_text_chars")]
    pub min_text_chars: usize,
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            min_text_chars: default_min_text_chars(),
            max_text_chars: default_max_text_chars(),
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Defaults to `<data dir>/detectia/detections` when unset.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            data_dir: None,
        }
    }
}

impl StorageConfig {
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .map(|p| p.join("detectia").join("detections"))
                .unwrap_or_else(|| PathBuf::from("detections"))
        })
    }
}

fn default_version() -> String { env!("CARGO_PKG_VERSION").to_string() }
fn default_true() -> bool { true }
fn default_min_text_chars() -> usize { 10 }
fn default_max_text_chars() -> usize { 50_000 }
fn default_max_file_bytes() -> u64 { 10 * 1024 * 1024 }

pub struct ConfigStore {
    config_dir: PathBuf,
    config_file: PathBuf,
}

impl ConfigStore {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_file = config_dir.join("config.json");
        Self { config_dir, config_file }
    }

    /// Get default config directory
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("detectia"))
    }

    pub fn with_default_dir() -> Result<Self, ConfigError> {
        Self::default_config_dir()
            .map(Self::new)
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Ensure config directory exists
    pub fn ensure_dir(&self) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.config_dir)
            .map_err(|e| ConfigError::io("create config dir", &self.config_dir, e))
    }

    /// Load configuration from file, defaults when it does not exist yet
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        if !self.config_file.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_file)
            .map_err(|e| ConfigError::io("read", &self.config_file, e))?;

        let config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: self.config_file.clone(),
            source,
        })?;
        info!("[CONFIG] Loaded {}", self.config_file.display());
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        self.ensure_dir()?;

        if self.config_file.exists() {
            self.create_backup()?;
        }

        let content = serde_json::to_string_pretty(config).map_err(ConfigError::Serialize)?;

        fs::write(&self.config_file, content)
            .map_err(|e| ConfigError::io("write", &self.config_file, e))
    }

    fn create_backup(&self) -> Result<(), ConfigError> {
        let backup_dir = self.config_dir.join("backups");
        fs::create_dir_all(&backup_dir)
            .map_err(|e| ConfigError::io("create backup dir", &backup_dir, e))?;

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S%3f");
        let backup_file = backup_dir.join(format!("config_{}.json", timestamp));

        fs::copy(&self.config_file, &backup_file)
            .map_err(|e| ConfigError::io("back up", &backup_file, e))?;

        self.cleanup_old_backups(&backup_dir, 10);
        Ok(())
    }

    /// Remove old backups, keeping only the most recent N
    fn cleanup_old_backups(&self, backup_dir: &Path, keep: usize) {
        let mut entries: Vec<_> = match fs::read_dir(backup_dir) {
            Ok(rd) => rd
                .filter_map(|e| e.ok())
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
                .collect(),
            Err(e) => {
                warn!("[CONFIG] Cannot list backups in {}: {}", backup_dir.display(), e);
                return;
            }
        };

        if entries.len() <= keep {
            return;
        }

        // Oldest first; the timestamped names sort chronologically
        entries.sort_by_key(|e| e.file_name());

        let remove_count = entries.len() - keep;
        for entry in entries.iter().take(remove_count) {
            let _ = fs::remove_file(entry.path());
        }
    }
}
