//! Per-key async locks so concurrent misses for one key generate once

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Slots = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// Registry of in-flight keys.
///
/// Entries exist only while some caller holds or waits on the key's lock.
#[derive(Debug, Clone, Default)]
pub struct KeyLocks {
    slots: Slots,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other caller holds `key`
    pub async fn acquire(&self, key: &str) -> KeyGuard {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            slots
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        let guard = slot.clone().lock_owned().await;

        KeyGuard {
            key: key.to_string(),
            slots: self.slots.clone(),
            slot,
            guard: Some(guard),
        }
    }

    /// Keys currently held or awaited
    pub fn in_flight(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Holds a key until dropped
#[derive(Debug)]
pub struct KeyGuard {
    key: String,
    slots: Slots,
    slot: Arc<AsyncMutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        // Release before checking, so the owned guard's reference is gone
        self.guard.take();

        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());

        // The map and this guard hold the last two references: nobody waits
        if Arc::strong_count(&self.slot) == 2 {
            slots.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_entry_removed_after_release() {
        let locks = KeyLocks::new();

        {
            let _guard = locks.acquire("k").await;
            assert_eq!(locks.in_flight(), 1);
        }

        assert_eq!(locks.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block() {
        let locks = KeyLocks::new();

        let _a = locks.acquire("a").await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.acquire("b")).await;

        assert!(b.is_ok());
        assert_eq!(locks.in_flight(), 2);
    }

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = KeyLocks::new();
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let locks = locks.clone();
                let active = active.clone();
                let peak = peak.clone();

                tokio::spawn(async move {
                    let _guard = locks.acquire("shared").await;
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(locks.in_flight(), 0);
    }
}
