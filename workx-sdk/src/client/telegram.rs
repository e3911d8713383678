//! Telegram Bot API client.
//!
//! Thin typed wrapper over `sendMessage` and `sendPhoto`. Every call is a
//! single attempt; callers decide what a failure means.

use reqwest::Client;
use std::time::Duration;
use url::Url;

use super::ClientError;
use crate::objects::telegram::{ApiResponse, ParseMode, SendMessage, SendPhoto};
use crate::objects::{ChatId, ReplyControls};

/// Default Bot API root.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Default per-request deadline, connect through body.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct BotClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl BotClient {
    /// Create a new `BotClient`.
    ///
    /// * `base_url` – Bot API root (see [`DEFAULT_API_URL`]).
    /// * `token` – the bot token issued by BotFather.
    pub fn new(base_url: Url, token: impl Into<String>) -> Self {
        Self::with_timeout(base_url, token, DEFAULT_TIMEOUT)
    }

    /// Like [`new`](Self::new), failing every request that takes longer
    /// than `timeout`.
    pub fn with_timeout(base_url: Url, token: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url,
            token: token.into(),
        }
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure timeouts or a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `sendMessage` with Markdown parse mode.
    pub async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        controls: Option<&ReplyControls>,
    ) -> Result<(), ClientError> {
        let body = SendMessage {
            chat_id,
            text,
            parse_mode: ParseMode::Markdown,
            reply_markup: controls,
        };
        let resp = self
            .http
            .post(self.method_url("sendMessage")?)
            .json(&body)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `sendPhoto` with a Markdown caption.
    pub async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: &str,
        caption: &str,
        controls: Option<&ReplyControls>,
    ) -> Result<(), ClientError> {
        let body = SendPhoto {
            chat_id,
            photo,
            caption,
            parse_mode: ParseMode::Markdown,
            reply_markup: controls,
        };
        let resp = self
            .http
            .post(self.method_url("sendPhoto")?)
            .json(&body)
            .send()
            .await?;
        parse_response(resp).await
    }

    fn method_url(&self, method: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(&format!("/bot{}/{}", self.token, method))
    }
}

async fn parse_response(resp: reqwest::Response) -> Result<(), ClientError> {
    let status = resp.status();
    let bytes = resp.bytes().await?;
    let parsed: ApiResponse = match serde_json::from_slice(&bytes) {
        Ok(parsed) => parsed,
        Err(e) if status.is_success() => return Err(ClientError::Json(e)),
        Err(_) => {
            return Err(ClientError::Api {
                code: status.as_u16(),
                description: String::from_utf8_lossy(&bytes).into_owned(),
                retry_after: None,
            });
        }
    };
    if parsed.ok {
        return Ok(());
    }
    Err(ClientError::Api {
        code: parsed.error_code.unwrap_or(status.as_u16()),
        description: parsed.description.unwrap_or_default(),
        retry_after: parsed.parameters.and_then(|p| p.retry_after),
    })
}
