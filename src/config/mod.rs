//! Configuration management for the tutor backend
//!
//! Values resolve env > TOML file > default.

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use crate::context::{ContextConfig, DEFAULT_RETENTION_LIMIT};
use crate::progress::{
    ProgressConfig, XpThresholds, DEFAULT_GOAL_BONUS_XP, DEFAULT_XP_PER_CHAT,
    DEFAULT_XP_THRESHOLDS,
};
use crate::{Error, Result};

use file::TutorConfigFile;

/// Default API port
pub const DEFAULT_PORT: u16 = 8000;

/// Tutor backend configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to data directory (database)
    pub data_dir: PathBuf,

    /// HTTP API server configuration
    pub api_server: ApiServerConfig,

    /// Language model configuration
    pub tutor: TutorConfig,

    /// XP and leveling configuration
    pub progress: ProgressConfig,

    /// Conversation context configuration
    pub context: ContextConfig,

    /// Study materials JSON file, if any
    pub materials_path: Option<PathBuf>,
}

/// HTTP API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Path to static files directory (web UI)
    pub static_dir: Option<PathBuf>,

    /// Requests per second across all clients; unlimited when unset
    pub rate_limit: Option<u32>,
}

/// Language model configuration
#[derive(Debug, Clone)]
pub struct TutorConfig {
    /// Ollama base URL
    pub base_url: String,

    /// Model name
    pub model: String,

    /// Request timeout
    pub timeout: Duration,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl Config {
    /// Load configuration from the environment and the config file
    ///
    /// # Errors
    ///
    /// Returns error if a value is invalid (bad XP table, negative retention limit)
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();
        let config = Self::resolve(fc, |key| std::env::var(key).ok())?;

        if let Err(e) = std::fs::create_dir_all(&config.data_dir) {
            tracing::warn!(
                path = %config.data_dir.display(),
                error = %e,
                "failed to create data directory"
            );
        }

        Ok(config)
    }

    /// Resolve configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a value is invalid
    pub fn resolve<F>(fc: TutorConfigFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // API server config (env > toml > default)
        let api_server = ApiServerConfig {
            port: env("TUTOR_PORT")
                .or_else(|| env("PORT"))
                .and_then(|s| s.parse().ok())
                .or(fc.server.port)
                .unwrap_or(DEFAULT_PORT),
            static_dir: env("TUTOR_STATIC_DIR")
                .or(fc.server.static_dir)
                .map(PathBuf::from),
            rate_limit: env("TUTOR_RATE_LIMIT")
                .and_then(|s| s.parse().ok())
                .or(fc.server.rate_limit)
                .filter(|&n| n > 0),
        };

        // Data directory (~/.local/share/tutor on Linux)
        let data_dir = env("TUTOR_DATA_DIR")
            .or(fc.server.data_dir)
            .map_or_else(default_data_dir, PathBuf::from);

        // Language model (env > toml > default)
        let default_tutor = TutorConfig::default();
        let tutor = TutorConfig {
            base_url: env("OLLAMA_BASE_URL")
                .or(fc.tutor.base_url)
                .unwrap_or(default_tutor.base_url),
            model: env("LLAMA_MODEL")
                .or(fc.tutor.model)
                .unwrap_or(default_tutor.model),
            timeout: env("TUTOR_LLM_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .or(fc.tutor.timeout_secs)
                .map_or(default_tutor.timeout, Duration::from_secs),
        };

        // Progress (env > toml > default)
        let thresholds =
            XpThresholds::new(fc.progress.xp_thresholds.unwrap_or_else(|| {
                DEFAULT_XP_THRESHOLDS.to_vec()
            }))?;
        let progress = ProgressConfig {
            thresholds,
            xp_per_chat: parse_env(&env, "TUTOR_XP_PER_CHAT")?
                .or(fc.progress.xp_per_chat)
                .unwrap_or(DEFAULT_XP_PER_CHAT),
            goal_bonus_xp: parse_env(&env, "TUTOR_GOAL_BONUS_XP")?
                .or(fc.progress.goal_bonus_xp)
                .unwrap_or(DEFAULT_GOAL_BONUS_XP),
        };

        // Context retention; negative limits are rejected rather than clamped
        let retention_limit = parse_env::<_, i64>(&env, "TUTOR_RETENTION_LIMIT")?
            .or(fc.context.retention_limit)
            .map_or(Ok(DEFAULT_RETENTION_LIMIT), |limit| {
                usize::try_from(limit).map_err(|_| {
                    Error::Config(format!(
                        "retention_limit must not be negative, got {limit}"
                    ))
                })
            })?;

        let materials_path = env("TUTOR_MATERIALS_PATH")
            .or(fc.materials.path)
            .map(PathBuf::from);

        Ok(Self {
            data_dir,
            api_server,
            tutor,
            progress,
            context: ContextConfig { retention_limit },
            materials_path,
        })
    }

    /// Path of the `SQLite` database
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("tutor.db")
    }
}

/// Parse an env value, failing loudly on garbage instead of falling back
fn parse_env<F, T>(env: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    env(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| Error::Config(format!("invalid value for {key}: {raw}")))
        })
        .transpose()
}

fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(|| PathBuf::from("."), |d| d.data_dir().join("tutor"))
}
