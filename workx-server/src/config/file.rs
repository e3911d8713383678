//! TOML file configuration structures.
//!
//! These structs directly map to the `workx-config.toml` file format.

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use workx_core::render::Locale;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub intake: IntakeConfig,
    pub telegram: TelegramConfig,
    pub admin: AdminConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub locales: LocalesConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080))
}

/// Event intake section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeConfig {
    /// Shared secret the form bot and admin panel sign request bodies with.
    pub secret: String,
}

/// Telegram Bot API section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Bot API root. Defaults to the public Telegram endpoint.
    #[serde(default)]
    pub api_url: Option<url::Url>,
    /// Username of the form bot, used in channel deep links.
    pub bot_username: String,
    /// Deadline for one Bot API request, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Admin chats section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub proposals_chat_id: i64,
    pub reviews_chat_id: i64,
}

/// Pacing section, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    #[serde(default = "default_channel_delay_ms")]
    pub channel_delay_ms: u64,
    #[serde(default = "default_direct_delay_ms")]
    pub direct_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            channel_delay_ms: default_channel_delay_ms(),
            direct_delay_ms: default_direct_delay_ms(),
        }
    }
}

fn default_channel_delay_ms() -> u64 {
    10_000
}

fn default_direct_delay_ms() -> u64 {
    3_000
}

/// Language of each audience.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalesConfig {
    #[serde(default = "default_workers_locale")]
    pub workers: Locale,
    #[serde(default = "default_employers_locale")]
    pub employers: Locale,
    #[serde(default = "default_admin_locale")]
    pub admin: Locale,
}

impl Default for LocalesConfig {
    fn default() -> Self {
        Self {
            workers: default_workers_locale(),
            employers: default_employers_locale(),
            admin: default_admin_locale(),
        }
    }
}

fn default_workers_locale() -> Locale {
    Locale::Russian
}

fn default_employers_locale() -> Locale {
    Locale::Hebrew
}

fn default_admin_locale() -> Locale {
    Locale::Russian
}
