//! Configuration module for workx-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables.

pub mod file;
pub mod runtime;

use crate::config::file::FileConfig;
use crate::config::runtime::{IntakeConfig, NotificationConfig, ServerConfig, TelegramConfig};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use workx_core::config::{AdminChats, LocaleConfig, PacingConfig};
use workx_core::entities::ChatId;
use workx_sdk::client::DEFAULT_API_URL;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("invalid url: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Loaded configuration result containing all parts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub intake: IntakeConfig,
    pub telegram: TelegramConfig,
    pub notification: NotificationConfig,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        self.load_from_str(&config_content)
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn load_from_str(&self, content: &str) -> Result<LoadedConfig, ConfigError> {
        let mut file_config: FileConfig = toml::from_str(content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        self.validate(&file_config)?;
        build_loaded_config(file_config)
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        if config.intake.secret.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "intake.secret must not be empty".to_string(),
            ));
        }
        if config.telegram.bot_token.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "telegram.bot_token must not be empty".to_string(),
            ));
        }
        if config.telegram.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "telegram.request_timeout_secs must be positive".to_string(),
            ));
        }
        if config.telegram.bot_username.starts_with('@') {
            return Err(ConfigError::ValidationError(
                "telegram.bot_username must not start with '@'".to_string(),
            ));
        }
        Ok(())
    }
}

fn build_loaded_config(file_config: FileConfig) -> Result<LoadedConfig, ConfigError> {
    let api_url = match file_config.telegram.api_url {
        Some(url) => url,
        None => url::Url::parse(DEFAULT_API_URL)?,
    };

    Ok(LoadedConfig {
        server: ServerConfig {
            listen: file_config.server.listen,
        },
        intake: IntakeConfig::new(file_config.intake.secret.into_bytes()),
        telegram: TelegramConfig {
            bot_token: file_config.telegram.bot_token,
            api_url,
            request_timeout: Duration::from_secs(file_config.telegram.request_timeout_secs),
        },
        notification: NotificationConfig {
            admin: AdminChats {
                proposals: ChatId(file_config.admin.proposals_chat_id),
                reviews: ChatId(file_config.admin.reviews_chat_id),
            },
            pacing: PacingConfig {
                channel_delay: Duration::from_millis(file_config.pacing.channel_delay_ms),
                direct_delay: Duration::from_millis(file_config.pacing.direct_delay_ms),
            },
            locales: LocaleConfig {
                workers: file_config.locales.workers,
                employers: file_config.locales.employers,
                admin: file_config.locales.admin,
            },
            bot_username: file_config.telegram.bot_username,
        },
    })
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use workx_core::render::Locale;
    use workx_sdk::client::DEFAULT_TIMEOUT;

    const MINIMAL: &str = r#"
[intake]
secret = "intake-secret"

[telegram]
bot_token = "123:abc"
bot_username = "workx_bot"

[admin]
proposals_chat_id = -1001
reviews_chat_id = -1002
"#;

    fn loader() -> ConfigLoader {
        ConfigLoader::new("unused.toml", None)
    }

    #[test]
    fn test_minimal_config_builds_notification_settings() {
        let loaded = loader().load_from_str(MINIMAL).unwrap();
        assert_eq!(loaded.intake.secret_bytes(), b"intake-secret");
        assert_eq!(loaded.telegram.api_url.as_str(), "https://api.telegram.org/");
        assert_eq!(loaded.telegram.request_timeout, DEFAULT_TIMEOUT);
        assert_eq!(loaded.notification.admin.proposals, ChatId(-1001));
        assert_eq!(loaded.notification.admin.reviews, ChatId(-1002));
        assert_eq!(loaded.notification.pacing, PacingConfig::default());
        assert_eq!(loaded.notification.locales.employers, Locale::Hebrew);
        assert_eq!(loaded.notification.bot_username, "workx_bot");
    }

    #[test]
    fn test_listen_override_wins() {
        let addr: SocketAddr = "127.0.0.1:9999".parse().unwrap();
        let loaded = ConfigLoader::new("unused.toml", Some(addr))
            .load_from_str(MINIMAL)
            .unwrap();
        assert_eq!(loaded.server.listen, addr);
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        let content = MINIMAL.replace("\"intake-secret\"", "\"  \"");
        let err = loader().load_from_str(&content).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_empty_bot_token_is_rejected() {
        let content = MINIMAL.replace("\"123:abc\"", "\"\"");
        let err = loader().load_from_str(&content).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_zero_request_timeout_is_rejected() {
        let content = MINIMAL.replace(
            "bot_username = \"workx_bot\"",
            "bot_username = \"workx_bot\"\nrequest_timeout_secs = 0",
        );
        let err = loader().load_from_str(&content).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ConfigLoader::new("/nonexistent/workx-config.toml", None)
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
