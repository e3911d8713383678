//! Shared wire types for the Work Exchange notification service.
//!
//! - [`objects`]: chat ids, outbound message payloads, the event intake body
//!   and Telegram Bot API request/response shapes.
//! - [`signature`]: HMAC-SHA256 body signing used by the intake API.
//! - `client` (feature `client`): a typed Telegram Bot API client.

#[cfg(feature = "client")]
pub mod client;
pub mod objects;
pub mod signature;
