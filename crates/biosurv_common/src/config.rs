//! Biosurveillance Configuration
//!
//! Configuration lives in `biosurv.toml`. Lookup order:
//! 1. Explicit path (`--config`)
//! 2. `$BIOSURV_CONFIG`
//! 3. `$XDG_CONFIG_HOME/biosurv/config.toml`
//! 4. `~/.config/biosurv/config.toml`
//! 5. Built-in defaults
//!
//! The AI API key is never read from the file, only from the environment.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::RetryPolicy;

const CONFIG_ENV: &str = "BIOSURV_CONFIG";
const CONFIG_DIR: &str = "biosurv";
const CONFIG_FILE: &str = "config.toml";

/// Key variable consulted when the configured one is unset
pub const FALLBACK_API_KEY_ENV: &str = "API_KEY";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write config: {0}")]
    Write(String),
}

/// Generative-AI provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_ai_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_ai_model")]
    pub model: String,

    #[serde(default = "default_ai_timeout")]
    pub timeout_secs: u64,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_ai_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_ai_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_ai_timeout() -> u64 {
    60
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_ai_endpoint(),
            model: default_ai_model(),
            timeout_secs: default_ai_timeout(),
            api_key_env: default_api_key_env(),
        }
    }
}

/// Whether an API key is available to the process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiKeyStatus {
    Present { source: String },
    Missing,
}

impl AiConfig {
    /// API key from the configured variable, then `API_KEY`
    pub fn api_key(&self) -> Option<String> {
        [self.api_key_env.as_str(), FALLBACK_API_KEY_ENV]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|v| !v.trim().is_empty())
    }

    pub fn api_key_status(&self) -> ApiKeyStatus {
        for var in [self.api_key_env.as_str(), FALLBACK_API_KEY_ENV] {
            if std::env::var(var).map(|v| !v.trim().is_empty()).unwrap_or(false) {
                return ApiKeyStatus::Present {
                    source: var.to_string(),
                };
            }
        }
        ApiKeyStatus::Missing
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// REST backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    #[serde(default = "default_backend_timeout")]
    pub timeout_secs: u64,
}

fn default_backend_url() -> String {
    "http://localhost:3001".to_string()
}

fn default_backend_timeout() -> u64 {
    15
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            timeout_secs: default_backend_timeout(),
        }
    }
}

/// Polling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// How often to re-fetch the active escalation (seconds, valid: 1-300)
    #[serde(default = "default_escalation_interval")]
    pub escalation_interval_secs: u64,
}

fn default_escalation_interval() -> u64 {
    8
}

impl PollingConfig {
    /// Validate and clamp the interval to 1-300 seconds
    pub fn effective_interval(&self) -> Duration {
        Duration::from_secs(self.escalation_interval_secs.clamp(1, 300))
    }

    pub fn interval_was_clamped(&self) -> bool {
        Duration::from_secs(self.escalation_interval_secs) != self.effective_interval()
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            escalation_interval_secs: default_escalation_interval(),
        }
    }
}

/// Outbreak simulation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_simulation_duration")]
    pub duration_secs: u64,
}

fn default_simulation_duration() -> u64 {
    12
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_simulation_duration(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Complete configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BiosurvConfig {
    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub retry: RetryPolicy,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub simulation: SimulationConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl BiosurvConfig {
    /// Load from the first existing file in the lookup chain, else defaults.
    /// An explicit path must exist; a file that does not parse is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        match discover_config_path(None) {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Write(e.to_string()))?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Write(e.to_string()))?;
        fs::write(path, content).map_err(|e| ConfigError::Write(e.to_string()))
    }

    pub fn simulation_duration(&self) -> Duration {
        Duration::from_secs(self.simulation.duration_secs.max(1))
    }
}

/// Resolve the config path without touching the filesystem
pub fn discover_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.is_empty() {
            return Some(PathBuf::from(xdg).join(CONFIG_DIR).join(CONFIG_FILE));
        }
    }

    dirs::home_dir().map(|home| home.join(".config").join(CONFIG_DIR).join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BiosurvConfig::default();
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.initial_delay_ms, 2000);
        assert_eq!(config.polling.escalation_interval_secs, 8);
        assert_eq!(config.simulation.duration_secs, 12);
        assert_eq!(config.ai.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_polling_clamping() {
        let mut polling = PollingConfig {
            escalation_interval_secs: 0,
        };
        assert_eq!(polling.effective_interval(), Duration::from_secs(1));
        assert!(polling.interval_was_clamped());

        polling.escalation_interval_secs = 1000;
        assert_eq!(polling.effective_interval(), Duration::from_secs(300));

        polling.escalation_interval_secs = 8;
        assert!(!polling.interval_was_clamped());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: BiosurvConfig = toml::from_str(
            r#"
            [retry]
            max_retries = 5

            [backend]
            base_url = "http://surveillance.internal:8080"
            "#,
        )
        .unwrap();
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.backoff_factor, 2.0);
        assert_eq!(config.backend.base_url, "http://surveillance.internal:8080");
        assert_eq!(config.backend.timeout_secs, 15);
        assert_eq!(config.ai.model, "gemini-2.5-flash");
    }

    #[test]
    fn test_toml_serialization() {
        let toml_str = toml::to_string_pretty(&BiosurvConfig::default()).unwrap();
        assert!(toml_str.contains("[ai]"));
        assert!(toml_str.contains("[retry]"));
        assert!(toml_str.contains("[polling]"));
        assert!(!toml_str.contains("api_key ="));
    }

    #[test]
    fn test_explicit_path_wins() {
        let path = PathBuf::from("/tmp/custom-biosurv.toml");
        assert_eq!(discover_config_path(Some(&path)), Some(path));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = BiosurvConfig::default();
        config.polling.escalation_interval_secs = 20;
        config.save_to(&path).unwrap();

        let loaded = BiosurvConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded.polling.escalation_interval_secs, 20);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[retry]\nmax_retries = \"three\"\n").unwrap();
        assert!(matches!(
            BiosurvConfig::load(Some(&path)),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typo.toml");
        assert!(matches!(
            BiosurvConfig::load(Some(&path)),
            Err(ConfigError::Read { .. })
        ));
    }
}
