use crate::export::DEFAULT_EXPORT_FILE;
use crate::store::DEFAULT_BUSY_TIMEOUT_MS;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const PROJECT_NAME: &str = env!("CARGO_PKG_NAME");

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub storage: StorageConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database: PathBuf,
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(PROJECT_NAME)
                .join("tasks.db"),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub default_file: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_file: PathBuf::from(DEFAULT_EXPORT_FILE),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("warn".to_string()),
            storage: StorageConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

/// A config file that was found but could not be used
#[derive(Debug, Clone)]
pub struct SkippedConfig {
    pub path: PathBuf,
    pub error: String,
}

impl Config {
    /// Load configuration with fallback chain
    ///
    /// Also returns the candidate files that existed but failed to load, so
    /// the caller can report them once logging is installed.
    pub fn load(config_path: Option<&PathBuf>) -> Result<(Self, Vec<SkippedConfig>)> {
        // An explicit path must load
        if let Some(path) = config_path {
            let config =
                Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()))?;
            return Ok((config, Vec::new()));
        }

        Ok(Self::load_first(&Self::candidates()))
    }

    /// ~/.config/tasklist/tasklist.yml, then ./tasklist.yml
    fn candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join(PROJECT_NAME).join(format!("{}.yml", PROJECT_NAME)));
        }
        candidates.push(PathBuf::from(format!("{}.yml", PROJECT_NAME)));
        candidates
    }

    fn load_first(candidates: &[PathBuf]) -> (Self, Vec<SkippedConfig>) {
        let mut skipped = Vec::new();

        for path in candidates.iter().filter(|p| p.exists()) {
            match Self::load_from_file(path) {
                Ok(config) => return (config, skipped),
                Err(e) => {
                    let error = format!("{:#}", e);
                    warn!(path = %path.display(), error = %error, "Failed to load config, skipping");
                    skipped.push(SkippedConfig {
                        path: path.clone(),
                        error,
                    });
                }
            }
        }

        info!("No usable config file found, using defaults");
        (Self::default(), skipped)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        info!(path = %path.as_ref().display(), "Loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.log_level.as_deref(), Some("warn"));
        assert_eq!(config.storage.busy_timeout_ms, DEFAULT_BUSY_TIMEOUT_MS);
        assert!(config.storage.database.ends_with("tasklist/tasks.db"));
        assert_eq!(config.export.default_file, PathBuf::from("tasks.csv"));
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tasklist.yml");
        fs::write(&path, "storage:\n  database: /tmp/custom.db\nlog_level: debug\n").unwrap();

        let (config, skipped) = Config::load(Some(&path)).unwrap();
        assert!(skipped.is_empty());
        assert_eq!(config.storage.database, PathBuf::from("/tmp/custom.db"));
        assert_eq!(config.storage.busy_timeout_ms, DEFAULT_BUSY_TIMEOUT_MS);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.export.default_file, PathBuf::from("tasks.csv"));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("absent.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.yml");
        fs::write(&path, "storage: [not, a, map]\n").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_malformed_candidate_falls_back_and_is_reported() {
        let temp = TempDir::new().unwrap();
        let primary = temp.path().join("primary.yml");
        let fallback = temp.path().join("fallback.yml");
        fs::write(&primary, "storage: [broken\n").unwrap();

        let (config, skipped) = Config::load_first(&[primary.clone(), fallback]);
        assert_eq!(config.export.default_file, PathBuf::from("tasks.csv"));
        assert_eq!(config.storage.busy_timeout_ms, DEFAULT_BUSY_TIMEOUT_MS);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].path, primary);
        assert!(skipped[0].error.contains("parse"));
    }

    #[test]
    fn test_later_candidate_used_after_skip() {
        let temp = TempDir::new().unwrap();
        let primary = temp.path().join("primary.yml");
        let fallback = temp.path().join("fallback.yml");
        fs::write(&primary, "storage: [broken\n").unwrap();
        fs::write(&fallback, "export:\n  default_file: out.csv\n").unwrap();

        let (config, skipped) = Config::load_first(&[primary.clone(), fallback]);
        assert_eq!(config.export.default_file, PathBuf::from("out.csv"));
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].path, primary);
    }
}
