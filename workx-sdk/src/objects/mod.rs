pub mod intake;
pub mod message;
pub mod telegram;

pub use intake::NotificationRequest;
pub use message::{ButtonAction, ChatId, InlineButton, Payload, ReplyControls};
