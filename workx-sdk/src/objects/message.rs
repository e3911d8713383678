//! Outbound message payloads.

use serde::{Deserialize, Serialize};

/// Telegram chat identifier (user, group or channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A rendered notification, ready for delivery.
///
/// `text` is Telegram Markdown. When `photo` is set the text is sent as the
/// photo caption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub text: String,
    pub photo: Option<String>,
    pub controls: Option<ReplyControls>,
}

impl Payload {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            photo: None,
            controls: None,
        }
    }

    pub fn with_photo(mut self, photo: Option<String>) -> Self {
        self.photo = photo;
        self
    }

    pub fn with_controls(mut self, controls: Option<ReplyControls>) -> Self {
        self.controls = controls;
        self
    }
}

/// Inline keyboard attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyControls {
    pub inline_keyboard: Vec<Vec<InlineButton>>,
}

impl ReplyControls {
    /// A keyboard with a single button.
    pub fn single(button: InlineButton) -> Self {
        Self {
            inline_keyboard: vec![vec![button]],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub text: String,
    #[serde(flatten)]
    pub action: ButtonAction,
}

impl InlineButton {
    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: ButtonAction::Url(url.into()),
        }
    }

    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: ButtonAction::CallbackData(data.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonAction {
    Url(String),
    CallbackData(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controls_serialize_as_inline_keyboard() {
        let controls = ReplyControls::single(InlineButton::callback("Open", "suitable-jobs:7"));
        let json = serde_json::to_value(&controls).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "inline_keyboard": [[{ "text": "Open", "callback_data": "suitable-jobs:7" }]]
            })
        );
    }
}
