//! Event system.
//!
//! # Event Flow
//!
//! 1. The intake API turns a signed `NotificationRequest` into a
//!    `NotificationEvent` and queues it.
//! 2. `NotificationCenter` spawns one task per event and fans the resulting
//!    messages out through the transport.

pub mod channels;
pub mod types;

pub use channels::{
    notification_event_channel, NotificationEventReceiver, NotificationEventSender,
    DEFAULT_CHANNEL_BUFFER,
};

pub use types::NotificationEvent;
