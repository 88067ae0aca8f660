//! Device-scoped persistence for anonymous visitors.
//!
//! Items are kept as a JSON array in a [`JsonSlot`] that the HTTP layer
//! mirrors into the visitor's session record (see `middleware::visitor`).

use std::marker::PhantomData;

use thiserror::Error;
use tracing::{error, warn};
use valiero_core::BagItem;

/// Persisted local data could not be parsed.
#[derive(Debug, Error)]
#[error("stored {key} list is corrupt: {source}")]
pub struct StorageCorruption {
    key: &'static str,
    #[source]
    source: serde_json::Error,
}

/// Synchronous device-local item storage.
pub trait LocalStore<T: BagItem>: Send + Sync {
    /// The persisted list, or empty if absent or unreadable.
    fn load(&self) -> Vec<T>;

    /// Overwrite the persisted list.
    fn save(&mut self, items: &[T]);

    /// Remove the persisted list entirely.
    fn clear(&mut self);
}

/// A single serialized list under a well-known key.
#[derive(Debug, Clone)]
pub struct JsonSlot<T> {
    key: &'static str,
    raw: Option<String>,
    dirty: bool,
    _item: PhantomData<fn() -> T>,
}

impl<T: BagItem> JsonSlot<T> {
    /// An empty slot. Nothing is persisted until the first save.
    #[must_use]
    pub const fn new(key: &'static str) -> Self {
        Self {
            key,
            raw: None,
            dirty: false,
            _item: PhantomData,
        }
    }

    /// A slot holding previously persisted content.
    #[must_use]
    pub const fn seeded(key: &'static str, raw: Option<String>) -> Self {
        Self {
            key,
            raw,
            dirty: false,
            _item: PhantomData,
        }
    }

    /// Storage key of this slot.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        self.key
    }

    /// The serialized list, `None` when nothing is stored.
    #[must_use]
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// Whether the slot changed since it was seeded or last marked clean.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark the current content as mirrored.
    pub const fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Parse the stored list.
    ///
    /// # Errors
    ///
    /// Returns `StorageCorruption` if the content is not a JSON array of items.
    pub fn parse(&self) -> Result<Vec<T>, StorageCorruption> {
        match &self.raw {
            None => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(raw).map_err(|source| StorageCorruption {
                key: self.key,
                source,
            }),
        }
    }
}

impl<T: BagItem> LocalStore<T> for JsonSlot<T> {
    fn load(&self) -> Vec<T> {
        self.parse().unwrap_or_else(|e| {
            warn!(error = %e, "Discarding unreadable local list");
            Vec::new()
        })
    }

    fn save(&mut self, items: &[T]) {
        match serde_json::to_string(items) {
            Ok(raw) => {
                self.raw = Some(raw);
                self.dirty = true;
            }
            Err(e) => error!(key = self.key, error = %e, "Failed to serialize local list"),
        }
    }

    fn clear(&mut self) {
        if self.raw.take().is_some() {
            self.dirty = true;
        }
    }
}
