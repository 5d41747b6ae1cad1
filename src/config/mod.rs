use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

use crate::error::StudioError;
use crate::export::ExportFormat;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub pipeline: PipelineConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub endpoint: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_snippets: usize,
    pub min_snippet_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pause between consecutive external calls. Historically a search-rate
    /// courtesy; tests set it to zero.
    pub inter_call_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub output_directory: PathBuf,
    pub default_format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub console_enabled: bool,
    pub file_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = get_data_directory();

        Self {
            llm: LlmConfig {
                base_url: "http://localhost:4000/api/v1".to_string(),
                api_key: String::new(),
                model: "us.anthropic.claude-3-7-sonnet-20250219-v1:0".to_string(),
            },
            search: SearchConfig::default(),
            pipeline: PipelineConfig {
                inter_call_delay_ms: 2000,
            },
            export: ExportConfig {
                output_directory: data_dir.join("output"),
                default_format: "json".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                console_enabled: true,
                file_enabled: false,
            },
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://www.google.com/search".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
            timeout_seconds: 15,
            max_snippets: 5,
            min_snippet_chars: 15,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location, writing defaults on
    /// first run
    pub async fn load() -> Result<Self> {
        let config_path = get_config_path();

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            info!("No configuration file found, using defaults");
            let config = Self::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Load configuration from a specific file
    pub async fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: AppConfig = toml::from_str(&content)?;

        config.validate()?;

        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Save configuration to the default location
    pub async fn save(&self) -> Result<()> {
        let config_path = get_config_path();

        if let Some(parent) = config_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(&config_path, content).await?;

        info!("Configuration saved to: {}", config_path.display());
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.llm.base_url.trim().is_empty() {
            return Err(StudioError::config("llm.base_url must not be empty").into());
        }

        if self.llm.model.trim().is_empty() {
            return Err(StudioError::config("llm.model must not be empty").into());
        }

        if self.search.endpoint.trim().is_empty() {
            return Err(StudioError::config("search.endpoint must not be empty").into());
        }

        if self.search.max_snippets == 0 {
            return Err(StudioError::config("search.max_snippets must be > 0").into());
        }

        if self.search.timeout_seconds == 0 {
            return Err(StudioError::config("search.timeout_seconds must be > 0").into());
        }

        self.export
            .default_format
            .parse::<ExportFormat>()
            .map_err(|_| StudioError::UnsupportedFormat {
                format: self.export.default_format.clone(),
            })?;

        Ok(())
    }
}

/// Get the default data directory
fn get_data_directory() -> PathBuf {
    directories::ProjectDirs::from("com", "whiskeystudio", "studio")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default().join("data"))
}

/// Get the configuration file path
fn get_config_path() -> PathBuf {
    directories::ProjectDirs::from("com", "whiskeystudio", "studio")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default().join("config.toml"))
}

/// Environment-based configuration overrides
pub struct ConfigOverrides;

impl ConfigOverrides {
    /// Apply environment variable overrides to the configuration
    pub fn apply(config: &mut AppConfig) {
        if let Ok(api_key) = std::env::var("WS_LLM_API_KEY") {
            config.llm.api_key = api_key;
        }

        if let Ok(base_url) = std::env::var("WS_LLM_BASE_URL") {
            config.llm.base_url = base_url;
        }

        if let Ok(model) = std::env::var("WS_LLM_MODEL") {
            config.llm.model = model;
        }

        if let Ok(endpoint) = std::env::var("WS_SEARCH_ENDPOINT") {
            config.search.endpoint = endpoint;
        }

        if let Ok(delay_str) = std::env::var("WS_DELAY_MS") {
            if let Ok(delay) = delay_str.parse::<u64>() {
                config.pipeline.inter_call_delay_ms = delay;
            }
        }

        if let Ok(log_level) = std::env::var("WS_LOG_LEVEL") {
            config.logging.level = log_level;
        }
    }
}
