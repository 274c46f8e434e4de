use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::guardrails::GuardrailOptions;

// ── Top-level config ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    pub gemini_api_key: Option<String>,
    pub serp_api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// SQLite content store location. Tilde is expanded on access,
    /// not at parse time, so the stored value stays portable.
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Generations scoring below this get a warning on the CLI.
    #[serde(default = "default_min_quality_score")]
    pub min_quality_score: f64,

    /// Sessions idle longer than this are swept by the gateway.
    #[serde(default = "default_session_timeout_minutes")]
    pub session_timeout_minutes: u64,

    /// Origins allowed to call the gateway from a browser. Empty means no
    /// CORS headers are sent.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default)]
    pub guardrails: GuardrailOptions,
}

fn default_model() -> String {
    "gemini-1.5-pro".into()
}

fn default_image_model() -> String {
    "imagen-4.0-generate-001".into()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    8192
}

fn default_db_path() -> String {
    "~/.reach/content.db".into()
}

fn default_min_quality_score() -> f64 {
    0.7
}

fn default_session_timeout_minutes() -> u64 {
    60
}

// ── Config impl ──────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        let home =
            UserDirs::new().map_or_else(|| PathBuf::from("."), |u| u.home_dir().to_path_buf());
        let reach_dir = home.join(".reach");

        Self {
            config_path: reach_dir.join("config.toml"),
            gemini_api_key: None,
            serp_api_key: None,
            model: default_model(),
            image_model: default_image_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            db_path: default_db_path(),
            min_quality_score: default_min_quality_score(),
            session_timeout_minutes: default_session_timeout_minutes(),
            cors_origins: Vec::new(),
            guardrails: GuardrailOptions::default(),
        }
    }
}

impl Config {
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        let reach_dir = home.join(".reach");
        let config_path = reach_dir.join("config.toml");

        if !reach_dir.exists() {
            fs::create_dir_all(&reach_dir).context("Failed to create .reach directory")?;
        }

        if config_path.exists() {
            let contents =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            let mut config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            // Set computed paths that are skipped during serialization
            config.config_path.clone_from(&config_path);
            config.validate()?;
            Ok(config)
        } else {
            let config = Self {
                config_path: config_path.clone(),
                ..Self::default()
            };
            config.save()?;
            Ok(config)
        }
    }

    /// Apply environment variable overrides to config
    pub fn apply_env_overrides(&mut self) {
        // Gemini key: REACH_GEMINI_API_KEY or GEMINI_API_KEY
        if let Ok(key) =
            std::env::var("REACH_GEMINI_API_KEY").or_else(|_| std::env::var("GEMINI_API_KEY"))
        {
            if !key.is_empty() {
                self.gemini_api_key = Some(key);
            }
        }

        // Search key: REACH_SERP_API_KEY or SERPAPI_KEY
        if let Ok(key) =
            std::env::var("REACH_SERP_API_KEY").or_else(|_| std::env::var("SERPAPI_KEY"))
        {
            if !key.is_empty() {
                self.serp_api_key = Some(key);
            }
        }

        // Text model: REACH_MODEL
        if let Ok(model) = std::env::var("REACH_MODEL") {
            if !model.is_empty() {
                self.model = model;
            }
        }

        // Image model: REACH_IMAGE_MODEL
        if let Ok(model) = std::env::var("REACH_IMAGE_MODEL") {
            if !model.is_empty() {
                self.image_model = model;
            }
        }

        // Content store path: REACH_DB_PATH
        if let Ok(path) = std::env::var("REACH_DB_PATH") {
            if !path.is_empty() {
                self.db_path = path;
            }
        }

        // Temperature: REACH_TEMPERATURE
        if let Ok(temp_str) = std::env::var("REACH_TEMPERATURE") {
            if let Ok(temp) = temp_str.parse::<f64>() {
                if (0.0..=2.0).contains(&temp) {
                    self.temperature = temp;
                }
            }
        }
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Validation(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::Validation("max_tokens must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.min_quality_score) {
            return Err(ConfigError::Validation(format!(
                "min_quality_score must be between 0.0 and 1.0, got {}",
                self.min_quality_score
            )));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::Validation("model must not be empty".into()));
        }
        if self.db_path.trim().is_empty() {
            return Err(ConfigError::Validation("db_path must not be empty".into()));
        }
        Ok(())
    }

    /// The content store path with `~` expanded to the home directory.
    pub fn expanded_db_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.db_path).to_string())
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }
}
