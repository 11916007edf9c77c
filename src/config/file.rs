//! TOML configuration file loading
//!
//! Supports `~/.config/tutor/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct TutorConfigFile {
    /// Server/runtime configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Language model configuration
    #[serde(default)]
    pub tutor: TutorFileConfig,

    /// XP and leveling configuration
    #[serde(default)]
    pub progress: ProgressFileConfig,

    /// Conversation context configuration
    #[serde(default)]
    pub context: ContextFileConfig,

    /// Study materials configuration
    #[serde(default)]
    pub materials: MaterialsFileConfig,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// API server port
    pub port: Option<u16>,

    /// Directory holding the database
    pub data_dir: Option<String>,

    /// Static web UI directory
    pub static_dir: Option<String>,

    /// Requests per second allowed across all clients
    pub rate_limit: Option<u32>,
}

/// Language model configuration
#[derive(Debug, Default, Deserialize)]
pub struct TutorFileConfig {
    /// Ollama base URL (e.g. "http://localhost:11434")
    pub base_url: Option<String>,

    /// Model name (e.g. "llama3")
    pub model: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// XP and leveling configuration
#[derive(Debug, Default, Deserialize)]
pub struct ProgressFileConfig {
    /// XP required for each level, starting at 0
    pub xp_thresholds: Option<Vec<u64>>,

    /// XP per chat message
    pub xp_per_chat: Option<u64>,

    /// XP bonus for completing a goal
    pub goal_bonus_xp: Option<u64>,
}

/// Conversation context configuration
#[derive(Debug, Default, Deserialize)]
pub struct ContextFileConfig {
    /// Message pairs kept verbatim; signed so negative values can be reported
    pub retention_limit: Option<i64>,
}

/// Study materials configuration
#[derive(Debug, Default, Deserialize)]
pub struct MaterialsFileConfig {
    /// Path to the study materials JSON file
    pub path: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `TutorConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> TutorConfigFile {
    config_file_path().map_or_else(TutorConfigFile::default, |path| load_from(&path))
}

/// Load a TOML config file from an explicit path
///
/// Returns `TutorConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_from(path: &Path) -> TutorConfigFile {
    if !path.exists() {
        return TutorConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                TutorConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            TutorConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/tutor/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("tutor").join("config.toml"))
}
