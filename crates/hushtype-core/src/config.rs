use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::types::{LanguageHint, RecordingTimeout};

/// Top-level configuration for the Hushtype application.
///
/// Loaded from `~/.hushtype/config.toml` by default (override with the
/// `HUSHTYPE_CONFIG` environment variable). Each section corresponds to one
/// subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HushConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub recording: RecordingConfig,
    #[serde(default)]
    pub transcription: TranscriptionConfig,
}

impl HushConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: HushConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Resolve the config file path (`HUSHTYPE_CONFIG` env, or
    /// `~/.hushtype/config.toml`).
    pub fn default_path() -> PathBuf {
        if let Ok(p) = std::env::var("HUSHTYPE_CONFIG") {
            return PathBuf::from(p);
        }
        #[cfg(target_os = "windows")]
        if let Ok(home) = std::env::var("USERPROFILE") {
            return PathBuf::from(home).join(".hushtype").join("config.toml");
        }
        #[cfg(not(target_os = "windows"))]
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".hushtype").join("config.toml");
        }
        PathBuf::from("config.toml")
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Recording settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Maximum recording duration in seconds. Must be 60, 120, or 300.
    pub timeout_secs: u64,
    /// Input device name substring, or "default" for the system default.
    pub device: String,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            device: "default".to_string(),
        }
    }
}

impl RecordingConfig {
    /// Validated recording timeout. Out-of-set values fall back to the
    /// default with a warning.
    pub fn timeout(&self) -> RecordingTimeout {
        match RecordingTimeout::from_secs(self.timeout_secs) {
            Some(t) => t,
            None => {
                warn!(
                    timeout_secs = self.timeout_secs,
                    "Unsupported recording timeout, using default"
                );
                RecordingTimeout::default()
            }
        }
    }
}

/// Remote transcription settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// API credential. Empty means transcription is not configured.
    pub api_key: String,
    /// Transcription endpoint URL.
    pub endpoint: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Two-letter language code, or "auto" to let the service detect.
    pub language: String,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: "https://api.openai.com/v1/audio/transcriptions".to_string(),
            model: "whisper-1".to_string(),
            language: "auto".to_string(),
        }
    }
}

impl TranscriptionConfig {
    /// Whether an API credential is present.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Validated language hint. Unknown codes fall back to auto-detect with
    /// a warning.
    pub fn language_hint(&self) -> LanguageHint {
        match LanguageHint::from_code(&self.language) {
            Some(hint) => hint,
            None => {
                warn!(
                    language = %self.language,
                    "Unknown language code, using auto-detect"
                );
                LanguageHint::Auto
            }
        }
    }
}
