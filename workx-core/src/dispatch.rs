//! Fanout dispatcher.
//!
//! Delivers one message to many recipients, one at a time, pausing between
//! sends. A failing recipient is logged and counted; it never stops the
//! loop and is never retried.

use crate::entities::{BroadcastChannel, ChatId, Employer, Worker};
use crate::render::RenderError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use workx_sdk::objects::{Payload, ReplyControls};

/// Pause between two channel posts.
pub const DEFAULT_CHANNEL_DELAY: Duration = Duration::from_secs(10);
/// Pause between two direct messages.
pub const DEFAULT_DIRECT_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The messaging API answered but refused the message (blocked bot,
    /// unknown chat, malformed markup, rate limit).
    #[error("rejected by messaging API: {0}")]
    Rejected(String),
    #[error("messaging API unreachable: {0}")]
    Unreachable(String),
}

/// Outbound message channel.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        controls: Option<&ReplyControls>,
    ) -> Result<(), TransportError>;

    async fn send_photo(
        &self,
        chat: ChatId,
        photo: &str,
        caption: &str,
        controls: Option<&ReplyControls>,
    ) -> Result<(), TransportError>;
}

/// Pacing strategy between consecutive sends.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, delay: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Anything a message can be addressed to.
pub trait Recipient {
    fn chat_id(&self) -> ChatId;
}

impl Recipient for ChatId {
    fn chat_id(&self) -> ChatId {
        *self
    }
}

impl Recipient for Worker {
    fn chat_id(&self) -> ChatId {
        self.chat_id
    }
}

impl Recipient for Employer {
    fn chat_id(&self) -> ChatId {
        self.chat_id
    }
}

impl Recipient for BroadcastChannel {
    fn chat_id(&self) -> ChatId {
        self.chat_id
    }
}

/// Outcome of one fanout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanoutReport {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
    /// Recipients whose payload could not be built.
    pub skipped: usize,
}

#[derive(Clone)]
pub struct FanoutDispatcher {
    transport: Arc<dyn Transport>,
    pacer: Arc<dyn Pacer>,
}

impl FanoutDispatcher {
    pub fn new(transport: Arc<dyn Transport>, pacer: Arc<dyn Pacer>) -> Self {
        Self { transport, pacer }
    }

    /// Send one payload to one chat, as a photo when it carries one.
    pub async fn deliver(&self, chat: ChatId, payload: &Payload) -> Result<(), TransportError> {
        let controls = payload.controls.as_ref();
        match &payload.photo {
            Some(photo) => {
                self.transport
                    .send_photo(chat, photo, &payload.text, controls)
                    .await
            }
            None => self.transport.send_text(chat, &payload.text, controls).await,
        }
    }

    /// Deliver to every recipient in order, pausing `delay` between sends.
    pub async fn notify<R, F>(
        &self,
        recipients: &[R],
        mut build_payload: F,
        delay: Duration,
    ) -> FanoutReport
    where
        R: Recipient + Sync,
        F: FnMut(&R) -> Result<Payload, RenderError> + Send,
    {
        let mut report = FanoutReport::default();
        for (index, recipient) in recipients.iter().enumerate() {
            if index > 0 {
                self.pacer.pause(delay).await;
            }
            let chat = recipient.chat_id();
            let payload = match build_payload(recipient) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(chat = %chat, error = %e, "Skipping recipient, message could not be built");
                    report.skipped += 1;
                    continue;
                }
            };
            report.attempted += 1;
            match self.deliver(chat, &payload).await {
                Ok(()) => {
                    debug!(chat = %chat, "Delivered");
                    report.delivered += 1;
                }
                Err(e) => {
                    warn!(chat = %chat, error = %e, "Delivery failed");
                    report.failed += 1;
                }
            }
        }
        report
    }
}
