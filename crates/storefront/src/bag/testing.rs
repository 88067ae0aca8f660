//! In-memory remote store for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use valiero_core::{BagItem, UserId};

use super::remote::{RemoteError, RemoteStore};

/// A remote store backed by a map, with switchable failures and an op log.
#[derive(Debug)]
pub struct MemoryRemote<T> {
    rows: Mutex<HashMap<UserId, Vec<T>>>,
    log: Mutex<Vec<String>>,
    fail_fetch: AtomicBool,
    fail_writes: AtomicBool,
    latency: bool,
}

impl<T> Default for MemoryRemote<T> {
    fn default() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            log: Mutex::new(Vec::new()),
            fail_fetch: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            latency: false,
        }
    }
}

#[allow(clippy::unwrap_used)]
impl<T: BagItem> MemoryRemote<T> {
    /// A store that yields before every write, so queued writes interleave
    /// with the caller.
    pub fn with_latency() -> Self {
        Self {
            latency: true,
            ..Self::default()
        }
    }

    pub fn seed(&self, account: UserId, items: Vec<T>) {
        self.rows.lock().unwrap().insert(account, items);
    }

    pub fn rows(&self, account: UserId) -> Vec<T> {
        self.rows.lock().unwrap().get(&account).cloned().unwrap_or_default()
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn record(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }

    async fn write_gate(&self) -> Result<(), RemoteError> {
        if self.latency {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

#[allow(clippy::unwrap_used)]
impl<T: BagItem> RemoteStore<T> for MemoryRemote<T> {
    async fn fetch_all(&self, account: UserId) -> Result<Vec<T>, RemoteError> {
        self.record("fetch_all".to_string());
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("connection refused".to_string()));
        }
        Ok(self.rows(account))
    }

    async fn upsert(&self, account: UserId, item: T) -> Result<(), RemoteError> {
        self.write_gate().await?;
        self.record(format!("upsert {}", item.quantity()));
        let mut rows = self.rows.lock().unwrap();
        let rows = rows.entry(account).or_default();
        let key = item.key();
        match rows.iter_mut().find(|row| row.key() == key) {
            Some(row) => *row = item,
            None => rows.push(item),
        }
        Ok(())
    }

    async fn delete(&self, account: UserId, key: T::Key) -> Result<(), RemoteError> {
        self.write_gate().await?;
        self.record("delete".to_string());
        if let Some(rows) = self.rows.lock().unwrap().get_mut(&account) {
            rows.retain(|row| row.key() != key);
        }
        Ok(())
    }

    async fn delete_all(&self, account: UserId) -> Result<(), RemoteError> {
        self.write_gate().await?;
        self.record("delete_all".to_string());
        self.rows.lock().unwrap().remove(&account);
        Ok(())
    }
}
