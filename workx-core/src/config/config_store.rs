//! Versioned config store.
//!
//! Readers take an `Arc` snapshot and drop no lock while they use it, so a
//! reload never waits on a long-running reader and a reader never sees a
//! half-applied update.

use std::sync::Arc;
use tokio::sync::watch;

/// A shared configuration value that can be swapped at runtime.
pub struct ConfigStore<T> {
    tx: Arc<watch::Sender<Versioned<T>>>,
}

struct Versioned<T> {
    version: u64,
    value: Arc<T>,
}

impl<T> ConfigStore<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _) = watch::channel(Versioned {
            version: 0,
            value: Arc::new(initial),
        });
        Self { tx: Arc::new(tx) }
    }

    /// Replace the stored value.
    pub fn update(&self, value: T) {
        let value = Arc::new(value);
        self.tx.send_modify(|current| {
            current.version += 1;
            current.value = value;
        });
    }

    /// The current value. Later updates do not affect the returned snapshot.
    pub fn snapshot(&self) -> Arc<T> {
        Arc::clone(&self.tx.borrow().value)
    }

    /// Number of updates applied so far.
    pub fn version(&self) -> u64 {
        self.tx.borrow().version
    }
}

impl<T> Clone for ConfigStore<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_survives_update() {
        let store = ConfigStore::new(1u32);
        let before = store.snapshot();
        store.update(2);
        assert_eq!(*before, 1);
        assert_eq!(*store.snapshot(), 2);
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn test_clones_share_updates() {
        let store = ConfigStore::new("a".to_string());
        let clone = store.clone();
        clone.update("b".to_string());
        clone.update("c".to_string());
        assert_eq!(store.snapshot().as_str(), "c");
        assert_eq!(store.version(), 2);
    }
}
