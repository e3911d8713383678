//! Runtime notification configuration.
//!
//! These types hold the validated settings the notification center reads at
//! the start of every event. Loading and parsing happen in the server crate.

mod config_store;

pub use config_store::ConfigStore;

use crate::dispatch::{DEFAULT_CHANNEL_DELAY, DEFAULT_DIRECT_DELAY};
use crate::entities::ChatId;
use crate::render::Locale;
use std::time::Duration;

/// Admin chats that receive reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminChats {
    pub proposals: ChatId,
    pub reviews: ChatId,
}

/// Pauses between consecutive sends of one fanout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingConfig {
    pub channel_delay: Duration,
    pub direct_delay: Duration,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            channel_delay: DEFAULT_CHANNEL_DELAY,
            direct_delay: DEFAULT_DIRECT_DELAY,
        }
    }
}

/// Language of each audience.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocaleConfig {
    pub workers: Locale,
    pub employers: Locale,
    pub admin: Locale,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            workers: Locale::Russian,
            employers: Locale::Hebrew,
            admin: Locale::Russian,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationConfig {
    pub admin: AdminChats,
    pub pacing: PacingConfig,
    pub locales: LocaleConfig,
    /// Bot username (without `@`) used in channel deep links.
    pub bot_username: String,
}

/// Shared, reloadable notification configuration.
pub type SharedNotificationConfig = ConfigStore<NotificationConfig>;
