//! Runtime configuration held by the running server.
//!
//! The notification settings live in `workx_core::config`; this module holds
//! the parts only the HTTP side reads.

use std::net::SocketAddr;
use std::time::Duration;

pub use workx_core::config::{NotificationConfig, SharedNotificationConfig};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
}

/// Event intake authentication.
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    secret: Box<[u8]>,
}

impl IntakeConfig {
    pub fn new(secret: impl Into<Box<[u8]>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// The HMAC key request bodies are verified with.
    pub fn secret_bytes(&self) -> &[u8] {
        &self.secret
    }
}

/// Telegram Bot API connection settings.
///
/// Read once at startup; a reload does not reconnect the bot client.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub api_url: url::Url,
    /// Deadline for one Bot API request. A proposal claim stays open while
    /// its admin report is in flight, so this also bounds how long the
    /// claim holds its locks.
    pub request_timeout: Duration,
}
