#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod dispatch;
pub mod entities;
pub mod events;
pub mod framework;
pub mod guard;
pub mod matching;
pub mod memory;
pub mod processors;
pub mod render;
pub mod store;
pub mod utils;
