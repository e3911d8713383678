//! In-memory collaborators.
//!
//! Used by the test suites and handy for running the notification center
//! without a database or a bot token.

mod recording;
mod store;
mod templates;

pub use recording::{RecordingPacer, RecordingTransport, SentMessage};
pub use store::{MemoryClaim, MemoryStore};
pub use templates::StaticTemplates;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a std mutex, recovering the data if a holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
