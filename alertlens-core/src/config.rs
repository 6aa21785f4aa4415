use crate::error::{AlertLensError, Result};
use crate::timestamp::{parse_offset, TimestampNormalizer};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const DEFAULT_OFFSET: &str = "+05:30";
pub const DEFAULT_TRACE_WINDOW: usize = 5;
pub const DEFAULT_KILL_BLOCK_WINDOW: usize = 10;
pub const DEFAULT_MAX_PROMPT_CHARS: usize = 9000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisSettings,
    #[serde(default)]
    pub ai: AiSettings,
}

/// Knobs for the extraction pass and timestamp normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Offset assumed for timestamps that carry none. This is an assumption
    /// about where the log was written, not something read from the log.
    pub default_offset: String,
    /// Maximum distance (in lines, forward) between an event and its trace file.
    pub trace_window: usize,
    /// Maximum number of lines read for a kill session block, marker included.
    pub kill_block_window: usize,
    /// ORA codes treated as noise and never reported.
    pub excluded_codes: Vec<String>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            default_offset: DEFAULT_OFFSET.to_string(),
            trace_window: DEFAULT_TRACE_WINDOW,
            kill_block_window: DEFAULT_KILL_BLOCK_WINDOW,
            excluded_codes: vec![
                "ORA-0".to_string(),
                "ORA-3136".to_string(),
                "ORA-03136".to_string(),
            ],
        }
    }
}

impl AnalysisSettings {
    pub fn offset(&self) -> Result<FixedOffset> {
        parse_offset(&self.default_offset)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    pub provider: String,
    pub model: String,
    pub temperature: f32,
    /// Per-request timeout in seconds.
    pub timeout: u64,
    pub max_prompt_chars: usize,
    pub max_attempts: u32,
    /// Linear backoff step in seconds; attempt `n` waits `n * backoff_secs`.
    pub backoff_secs: u64,
    pub api_key: Option<String>,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            provider: "mistral".to_string(),
            model: "mistral-large-latest".to_string(),
            temperature: 0.2,
            timeout: 120,
            max_prompt_chars: DEFAULT_MAX_PROMPT_CHARS,
            max_attempts: 3,
            backoff_secs: 5,
            api_key: None,
        }
    }
}

impl Config {
    /// Loads the first config file found, falling back to defaults.
    pub fn load() -> Result<Self> {
        match Self::get_config_path() {
            Some(path) => Self::load_from_path(&path),
            None => {
                debug!("No config file found, using defaults");
                Ok(Config::default())
            }
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        info!("Loading config from {}", path.display());
        let content = fs::read_to_string(path).map_err(|source| AlertLensError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config = toml::from_str(&content)?;
        // Surface a bad offset now rather than at first use.
        config.analysis.offset()?;
        Ok(config)
    }

    /// Environment variable holding the provider's key, e.g. `MISTRAL_API_KEY`.
    pub fn api_key_var(&self) -> String {
        format!("{}_API_KEY", self.ai.provider.to_uppercase())
    }

    /// Priority: environment variable > config file > None
    pub fn get_api_key(&self) -> Option<String> {
        if let Ok(key) = env::var(self.api_key_var()) {
            if !key.trim().is_empty() {
                return Some(key);
            }
        }
        self.ai.api_key.clone().filter(|k| !k.trim().is_empty())
    }

    fn get_config_path() -> Option<PathBuf> {
        // Check for project-level config first
        if let Ok(current_dir) = env::current_dir() {
            let project_config = current_dir.join(".alertlens.toml");
            if project_config.exists() {
                return Some(project_config);
            }
        }

        // Check for user-level config
        if let Some(home_dir) = dirs::home_dir() {
            let user_config = home_dir.join(".config").join("alertlens").join("config.toml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        None
    }

    pub fn save_to_path(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let toml_content = toml::to_string_pretty(self)?;
        fs::write(path, toml_content)?;
        Ok(())
    }

    pub fn default_offset(&self) -> FixedOffset {
        match self.analysis.offset() {
            Ok(offset) => offset,
            Err(e) => {
                warn!("{}; falling back to {}", e, DEFAULT_OFFSET);
                TimestampNormalizer::default().default_offset()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.analysis.default_offset, "+05:30");
        assert_eq!(config.analysis.trace_window, 5);
        assert_eq!(config.analysis.kill_block_window, 10);
        assert!(config.analysis.excluded_codes.contains(&"ORA-0".to_string()));
        assert_eq!(config.ai.max_prompt_chars, 9000);
        assert_eq!(config.ai.max_attempts, 3);
        assert_eq!(config.default_offset().local_minus_utc(), 5 * 3600 + 30 * 60);
    }

    #[test]
    fn test_partial_file_merges_defaults() {
        let config: Config = toml::from_str(
            r#"
            [analysis]
            default_offset = "-07:00"

            [ai]
            model = "mistral-small-latest"
            "#,
        )
        .unwrap();
        assert_eq!(config.analysis.default_offset, "-07:00");
        assert_eq!(config.analysis.trace_window, 5);
        assert_eq!(config.ai.model, "mistral-small-latest");
        assert_eq!(config.ai.provider, "mistral");
        assert_eq!(config.default_offset().local_minus_utc(), -7 * 3600);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.analysis.trace_window = 8;
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.analysis.trace_window, 8);
    }

    #[test]
    fn test_bad_offset_is_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[analysis]\ndefault_offset = \"IST\"\n").unwrap();
        let err = Config::load_from_path(&path).unwrap_err();
        assert!(matches!(err, AlertLensError::InvalidOffset(_)));
    }

    #[test]
    fn test_api_key_from_config() {
        let mut config = Config::default();
        config.ai.provider = "alertlens_test_provider".to_string();
        assert_eq!(config.api_key_var(), "ALERTLENS_TEST_PROVIDER_API_KEY");
        assert_eq!(config.get_api_key(), None);
        config.ai.api_key = Some("secret".to_string());
        assert_eq!(config.get_api_key(), Some("secret".to_string()));
    }
}
