use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockTable = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Serializes uploads that target the same destination filename.
///
/// Each name gets its own async mutex, created on first use and dropped
/// again once nobody holds or waits for it.
#[derive(Debug, Clone, Default)]
pub struct NameLocks {
    table: LockTable,
}

/// Exclusive hold on one filename; releases and tidies up on drop.
#[derive(Debug)]
pub struct NameGuard {
    name: String,
    table: LockTable,
    held: Option<OwnedMutexGuard<()>>,
}

impl NameLocks {
    /// Waits until no other upload holds `name`.
    pub async fn acquire(&self, name: &str) -> NameGuard {
        let mutex = self
            .table
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();

        let held = mutex.lock_owned().await;
        NameGuard {
            name: name.to_string(),
            table: self.table.clone(),
            held: Some(held),
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.table.len()
    }
}

impl Drop for NameGuard {
    fn drop(&mut self) {
        drop(self.held.take());
        // Waiters hold their own clone of the mutex, so the entry survives while anyone queues on it
        self.table
            .remove_if(self.name.as_str(), |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
