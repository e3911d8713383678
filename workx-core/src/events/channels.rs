//! Event channel factory and handles.

use super::types::NotificationEvent;
use tokio::sync::mpsc;

/// Default buffer size for event channels.
///
/// Enough to absorb a burst of approvals while keeping memory bounded. The
/// intake endpoint waits for capacity once it is full.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle for NotificationEvent events.
pub type NotificationEventSender = mpsc::Sender<NotificationEvent>;
/// Receiver handle for NotificationEvent events.
pub type NotificationEventReceiver = mpsc::Receiver<NotificationEvent>;

/// Create a new NotificationEvent channel.
pub fn notification_event_channel() -> (NotificationEventSender, NotificationEventReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}
