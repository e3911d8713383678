//! Application state shared across all request handlers.

use crate::config::runtime::IntakeConfig;
use std::sync::Arc;
use tokio::sync::RwLock;
use workx_core::events::NotificationEventSender;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Intake authentication (can be reloaded via SIGHUP).
    pub intake: Arc<RwLock<IntakeConfig>>,
    /// Queue feeding the notification center.
    pub events: NotificationEventSender,
}

impl AppState {
    pub fn new(intake: IntakeConfig, events: NotificationEventSender) -> Self {
        Self {
            intake: Arc::new(RwLock::new(intake)),
            events,
        }
    }

    /// Replace the intake secret (used during SIGHUP reload).
    pub async fn update_intake(&self, intake: IntakeConfig) {
        *self.intake.write().await = intake;
    }
}
