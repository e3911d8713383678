use super::lock;
use crate::dispatch::{Pacer, Transport, TransportError};
use crate::entities::ChatId;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;
use workx_sdk::objects::ReplyControls;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat: ChatId,
    pub text: String,
    pub photo: Option<String>,
    pub controls: Option<ReplyControls>,
}

/// Transport that records every successful send.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<SentMessage>>,
    failing: Mutex<HashSet<ChatId>>,
    latency: Duration,
}

impl RecordingTransport {
    /// Every send takes `latency` before it is recorded.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    /// Reject every message to `chat` from now on.
    pub fn fail_for(&self, chat: ChatId) {
        lock(&self.failing).insert(chat);
    }

    pub fn recover(&self, chat: ChatId) {
        lock(&self.failing).remove(&chat);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        lock(&self.sent).clone()
    }

    pub fn sent_to(&self, chat: ChatId) -> Vec<SentMessage> {
        lock(&self.sent)
            .iter()
            .filter(|message| message.chat == chat)
            .cloned()
            .collect()
    }

    async fn record(
        &self,
        chat: ChatId,
        text: &str,
        photo: Option<&str>,
        controls: Option<&ReplyControls>,
    ) -> Result<(), TransportError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if lock(&self.failing).contains(&chat) {
            return Err(TransportError::Rejected(format!("chat {chat} not found")));
        }
        lock(&self.sent).push(SentMessage {
            chat,
            text: text.to_string(),
            photo: photo.map(str::to_string),
            controls: controls.cloned(),
        });
        Ok(())
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        controls: Option<&ReplyControls>,
    ) -> Result<(), TransportError> {
        self.record(chat, text, None, controls).await
    }

    async fn send_photo(
        &self,
        chat: ChatId,
        photo: &str,
        caption: &str,
        controls: Option<&ReplyControls>,
    ) -> Result<(), TransportError> {
        self.record(chat, caption, Some(photo), controls).await
    }
}

/// Pacer that records requested delays and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingPacer {
    pauses: Mutex<Vec<Duration>>,
}

impl RecordingPacer {
    pub fn pauses(&self) -> Vec<Duration> {
        lock(&self.pauses).clone()
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self, delay: Duration) {
        lock(&self.pauses).push(delay);
    }
}
