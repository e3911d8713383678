//! Telegram Bot API request and response shapes.
//!
//! Only the two methods the notification service needs are modelled:
//! `sendMessage` and `sendPhoto`.

use serde::{Deserialize, Serialize};

use super::message::{ChatId, ReplyControls};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    Markdown,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: ChatId,
    pub text: &'a str,
    pub parse_mode: ParseMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<&'a ReplyControls>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendPhoto<'a> {
    pub chat_id: ChatId,
    /// A `file_id` already known to Telegram, or an HTTP URL.
    pub photo: &'a str,
    pub caption: &'a str,
    pub parse_mode: ParseMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<&'a ReplyControls>,
}

/// Envelope of every Bot API response. The `result` field is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    pub ok: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_code: Option<u16>,
    #[serde(default)]
    pub parameters: Option<ResponseParameters>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseParameters {
    #[serde(default)]
    pub retry_after: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_message_omits_missing_markup() {
        let body = SendMessage {
            chat_id: ChatId(-100),
            text: "*hi*",
            parse_mode: ParseMode::Markdown,
            reply_markup: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "chat_id": -100, "text": "*hi*", "parse_mode": "Markdown" })
        );
    }

    #[test]
    fn test_error_response_parsing() {
        let raw = r#"{"ok":false,"error_code":403,"description":"Forbidden: bot was blocked by the user"}"#;
        let resp: ApiResponse = serde_json::from_str(raw).unwrap();
        assert!(!resp.ok);
        assert_eq!(resp.error_code, Some(403));

        let raw = r#"{"ok":false,"error_code":429,"description":"Too Many Requests","parameters":{"retry_after":7}}"#;
        let resp: ApiResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.parameters.and_then(|p| p.retry_after), Some(7));
    }
}
