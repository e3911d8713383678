//! Telegram-backed message transport.

use async_trait::async_trait;
use workx_core::dispatch::{Transport, TransportError};
use workx_core::entities::ChatId;
use workx_sdk::client::{BotClient, ClientError};
use workx_sdk::objects::ReplyControls;

/// Sends notification payloads through the Telegram Bot API.
pub struct TelegramTransport {
    client: BotClient,
}

impl TelegramTransport {
    pub fn new(client: BotClient) -> Self {
        Self { client }
    }
}

fn classify(err: ClientError) -> TransportError {
    match err {
        ClientError::Http(e) => TransportError::Unreachable(e.to_string()),
        ClientError::Api {
            code,
            description,
            retry_after: Some(retry_after),
        } => TransportError::Rejected(format!(
            "{code}: {description} (retry after {retry_after}s)"
        )),
        ClientError::Api {
            code, description, ..
        } => TransportError::Rejected(format!("{code}: {description}")),
        other @ (ClientError::Json(_) | ClientError::Url(_)) => {
            TransportError::Rejected(other.to_string())
        }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        controls: Option<&ReplyControls>,
    ) -> Result<(), TransportError> {
        self.client
            .send_message(chat, text, controls)
            .await
            .map_err(classify)
    }

    async fn send_photo(
        &self,
        chat: ChatId,
        photo: &str,
        caption: &str,
        controls: Option<&ReplyControls>,
    ) -> Result<(), TransportError> {
        self.client
            .send_photo(chat, photo, caption, controls)
            .await
            .map_err(classify)
    }
}
