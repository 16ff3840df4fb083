//! Survey configuration
//!
//! Loaded from `$SURVEY_HOME/config.toml` (default `~/.survey-bot`),
//! with environment variables taking precedence over the file and the
//! file over built-in defaults.

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::db::InterviewStatus;
use crate::error::Result;
use crate::time::offset_from_minutes;

pub const ENV_HOME: &str = "SURVEY_HOME";
pub const ENV_DATABASE_PATH: &str = "SURVEY_DATABASE_PATH";
pub const ENV_ADVISOR_URL: &str = "SURVEY_ADVISOR_URL";
pub const ENV_ADVISOR_MODEL: &str = "SURVEY_ADVISOR_MODEL";
pub const ENV_ADVISOR_API_KEY: &str = "SURVEY_ADVISOR_API_KEY";
pub const ENV_BIND_ADDR: &str = "SURVEY_BIND_ADDR";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
    pub database: DatabaseConfig,
    pub advisor: AdvisorConfig,
    pub display: DisplayConfig,
    pub retention: RetentionConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_home().join("survey.db"),
        }
    }
}

/// Advisory backend (OpenAI-compatible chat completions)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Base URL, e.g. `https://api.example.com/v1`. Empty disables the advisor.
    pub base_url: String,

    /// Bearer token (optional)
    pub api_key: Option<String>,

    /// Model name (default: GigaChat)
    pub model: String,

    /// Request timeout in seconds (default: 60)
    pub timeout_secs: u64,

    /// Word cap stated in the prompt (default: 300)
    pub max_words: u32,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: None,
            model: "GigaChat".to_string(),
            timeout_secs: 60,
            max_words: 300,
        }
    }
}

impl AdvisorConfig {
    pub fn is_enabled(&self) -> bool {
        !self.base_url.trim().is_empty()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Minutes east of UTC used for rendered times (default: 180, Moscow)
    pub utc_offset_minutes: i32,

    /// Longest single transport message before splitting (default: 4000)
    pub max_message_length: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 180,
            max_message_length: 4000,
        }
    }
}

impl DisplayConfig {
    /// Display offset; falls back to UTC when out of range
    pub fn offset(&self) -> FixedOffset {
        offset_from_minutes(self.utc_offset_minutes).unwrap_or_else(|| Utc.fix())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Run the periodic cleanup task in the server (default: false)
    pub enabled: bool,

    /// Age in days after completion (default: 30)
    pub days: u32,

    /// Statuses eligible for cleanup (default: completed, restarted)
    pub statuses: Vec<InterviewStatus>,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            days: 30,
            statuses: vec![InterviewStatus::Completed, InterviewStatus::Restarted],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address for the HTTP transport
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8787".to_string(),
        }
    }
}

/// `~/.survey-bot`, or `./.survey-bot` when no home directory is known
pub fn default_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".survey-bot")
}

impl SurveyConfig {
    /// Configuration home: `SURVEY_HOME` if set, otherwise `~/.survey-bot`
    pub fn home_dir() -> PathBuf {
        std::env::var(ENV_HOME)
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_home())
    }

    /// Load configuration from the process environment
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::home_dir(), |key| std::env::var(key).ok())
    }

    /// Load configuration from `home/config.toml`, applying overrides from `lookup`.
    ///
    /// A missing config file is not an error. The default database lives
    /// under `home`.
    pub fn load_from<F>(home: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_path = home.join("config.toml");
        let mut config = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            let mut parsed: SurveyConfig = toml::from_str(&contents)?;
            if parsed.database.path == DatabaseConfig::default().path {
                parsed.database.path = home.join("survey.db");
            }
            parsed
        } else {
            Self {
                database: DatabaseConfig {
                    path: home.join("survey.db"),
                },
                ..Default::default()
            }
        };

        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(path) = value(ENV_DATABASE_PATH) {
            config.database.path = PathBuf::from(path);
        }
        if let Some(url) = value(ENV_ADVISOR_URL) {
            config.advisor.base_url = url;
        }
        if let Some(model) = value(ENV_ADVISOR_MODEL) {
            config.advisor.model = model;
        }
        if let Some(key) = value(ENV_ADVISOR_API_KEY) {
            config.advisor.api_key = Some(key);
        }
        if let Some(addr) = value(ENV_BIND_ADDR) {
            config.server.bind_addr = addr;
        }

        Ok(config)
    }

    /// Set the database path
    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database.path = path.into();
        self
    }

    /// Set advisor configuration
    pub fn with_advisor(mut self, advisor: AdvisorConfig) -> Self {
        self.advisor = advisor;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if self.advisor.timeout_secs == 0 {
            return Err(ConfigValidationError::InvalidValue {
                field: "advisor.timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        if self.display.max_message_length == 0 {
            return Err(ConfigValidationError::InvalidValue {
                field: "display.max_message_length".into(),
                message: "must be greater than 0".into(),
            });
        }

        if self.display.utc_offset_minutes.abs() > 14 * 60 {
            return Err(ConfigValidationError::InvalidValue {
                field: "display.utc_offset_minutes".into(),
                message: "must be within ±14 hours".into(),
            });
        }

        if self.retention.days == 0 {
            return Err(ConfigValidationError::InvalidValue {
                field: "retention.days".into(),
                message: "must be greater than 0".into(),
            });
        }

        if self.retention.statuses.iter().any(|s| !s.is_terminal()) {
            return Err(ConfigValidationError::InvalidValue {
                field: "retention.statuses".into(),
                message: "only completed and restarted interviews can be cleaned up".into(),
            });
        }

        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}
