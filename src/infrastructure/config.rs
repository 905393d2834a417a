//! Configuration infrastructure
//!
//! Configuration is loaded from a JSON file under the user config directory
//! and created with defaults on first run. Two tiers:
//! 1. User-facing settings (crawl budgets, delays, logging)
//! 2. Advanced settings (rate limits, retries, proxy, database)

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

use super::http_client::{HttpClientConfig, RenderingProxyConfig};

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub user: UserConfig,
    pub advanced: AdvancedConfig,
}

/// User-facing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    /// Maximum pages to visit in a single crawl.
    pub max_pages: u32,

    /// Maximum product containers processed per page.
    pub max_products_per_page: u32,

    /// Delay between page fetches in milliseconds.
    pub request_delay_ms: u64,

    /// Per-request timeout in seconds (clamped to 10..=90).
    pub request_timeout_seconds: u64,

    /// End-to-end crawl deadline in seconds.
    pub crawl_timeout_seconds: u64,

    /// Product batch size toward storage.
    pub batch_size: u32,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Hidden/advanced settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    pub user_agent: String,
    pub max_requests_per_second: u32,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,

    /// Rendering proxy endpoint for JavaScript-heavy storefronts.
    pub rendering_proxy_endpoint: Option<String>,
    pub rendering_proxy_api_key: Option<String>,

    pub database_url: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    pub level: String,
    pub console_output: bool,
    pub file_output: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user: UserConfig::default(),
            advanced: AdvancedConfig::default(),
        }
    }
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            max_pages: defaults::MAX_PAGES,
            max_products_per_page: defaults::MAX_PRODUCTS_PER_PAGE,
            request_delay_ms: defaults::REQUEST_DELAY_MS,
            request_timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            crawl_timeout_seconds: defaults::CRAWL_TIMEOUT_SECONDS,
            batch_size: defaults::BATCH_SIZE,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            user_agent: HttpClientConfig::default().user_agent,
            max_requests_per_second: defaults::MAX_REQUESTS_PER_SECOND,
            max_retries: defaults::MAX_RETRIES,
            retry_base_delay_ms: defaults::RETRY_BASE_DELAY_MS,
            rendering_proxy_endpoint: None,
            rendering_proxy_api_key: None,
            database_url: defaults::DATABASE_URL.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_output: true,
            file_output: false,
        }
    }
}

impl AppConfig {
    /// Per-request timeout clamped to the supported range.
    pub fn effective_request_timeout(&self) -> u64 {
        self.user
            .request_timeout_seconds
            .clamp(defaults::MIN_REQUEST_TIMEOUT_SECONDS, defaults::MAX_REQUEST_TIMEOUT_SECONDS)
    }

    /// Build the HTTP client configuration from this config.
    ///
    /// A proxy endpoint without an api key is passed through so client
    /// construction can reject it as a configuration error.
    pub fn http_client_config(&self) -> HttpClientConfig {
        let rendering_proxy = self
            .advanced
            .rendering_proxy_endpoint
            .as_ref()
            .map(|endpoint| RenderingProxyConfig {
                endpoint: endpoint.clone(),
                api_key: self
                    .advanced
                    .rendering_proxy_api_key
                    .clone()
                    .unwrap_or_default(),
            });

        HttpClientConfig {
            user_agent: self.advanced.user_agent.clone(),
            timeout_seconds: self.effective_request_timeout(),
            max_requests_per_second: self.advanced.max_requests_per_second,
            max_retries: self.advanced.max_retries,
            retry_base_delay_ms: self.advanced.retry_base_delay_ms,
            follow_redirects: true,
            rendering_proxy,
        }
    }
}

/// Loads and persists the configuration file.
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// The application configuration directory.
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join("shopcrawl");
        Ok(config_dir)
    }

    pub fn new() -> Result<Self> {
        let config_path = Self::get_config_dir()?.join("shopcrawl_config.json");
        Ok(Self { config_path })
    }

    /// A manager bound to an explicit path (tests, alternate setups).
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load the configuration, writing defaults on first run.
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            info!("Configuration file not found, creating default: {:?}", self.config_path);
            let default_config = AppConfig::default();
            self.save_config(&default_config).await?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .context("Failed to read configuration file")?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid configuration file: {:?}", self.config_path))?;
        Ok(config)
    }

    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }
        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;
        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;
        Ok(())
    }
}

/// Default configuration constants.
pub mod defaults {
    pub const MAX_PAGES: u32 = 50;
    pub const MAX_PRODUCTS_PER_PAGE: u32 = 50;
    pub const REQUEST_DELAY_MS: u64 = 250;
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;
    pub const MIN_REQUEST_TIMEOUT_SECONDS: u64 = 10;
    pub const MAX_REQUEST_TIMEOUT_SECONDS: u64 = 90;
    pub const CRAWL_TIMEOUT_SECONDS: u64 = 90;
    pub const BATCH_SIZE: u32 = 50;
    pub const MAX_REQUESTS_PER_SECOND: u32 = 4;
    pub const MAX_RETRIES: u32 = 2;
    pub const RETRY_BASE_DELAY_MS: u64 = 500;
    pub const DATABASE_URL: &str = "sqlite:shopcrawl.db";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_timeout_is_clamped() {
        let mut config = AppConfig::default();
        config.user.request_timeout_seconds = 5;
        assert_eq!(config.effective_request_timeout(), 10);
        config.user.request_timeout_seconds = 600;
        assert_eq!(config.effective_request_timeout(), 90);
        config.user.request_timeout_seconds = 45;
        assert_eq!(config.effective_request_timeout(), 45);
    }

    #[tokio::test]
    async fn first_run_writes_defaults_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("shopcrawl_config.json"));

        let config = manager.load_config().await.unwrap();
        assert_eq!(config.user.max_pages, defaults::MAX_PAGES);
        assert!(manager.config_path().exists());

        let mut modified = config.clone();
        modified.user.max_pages = 7;
        manager.save_config(&modified).await.unwrap();
        let reloaded = manager.load_config().await.unwrap();
        assert_eq!(reloaded.user.max_pages, 7);
    }
}
