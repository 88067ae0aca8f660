//! In-memory item list with natural-key deduplication.

use std::collections::HashSet;

use rust_decimal::Decimal;

use super::item::{BagItem, LineItem, LineKey, MAX_QUANTITY, ValidationError};
use super::shipping::{CartSummary, ShippingPolicy};

/// Result of adding an item to an [`ItemList`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Added<T> {
    /// The key was new; the item was appended.
    Inserted(T),
    /// The key existed and absorbed the incoming item. Holds the updated row.
    Merged(T),
    /// The key existed and nothing changed (wishlist re-add).
    Unchanged,
}

impl<T> Added<T> {
    /// The row to persist, if anything changed.
    #[must_use]
    pub fn changed(self) -> Option<T> {
        match self {
            Self::Inserted(item) | Self::Merged(item) => Some(item),
            Self::Unchanged => None,
        }
    }
}

/// Ordered list of items holding at most one item per natural key.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemList<T: BagItem> {
    items: Vec<T>,
}

impl<T: BagItem> Default for ItemList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: BagItem> ItemList<T> {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from possibly duplicated rows, folding duplicates into
    /// the first occurrence.
    ///
    /// Rows that [`Self::add`] rejects (out-of-range quantities) are dropped.
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = T>) -> Self {
        let mut list = Self::new();
        for item in items {
            let _ = list.add(item);
        }
        list
    }

    /// Items in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Consume the list, returning its items.
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Number of distinct rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether a row with this key exists.
    #[must_use]
    pub fn contains(&self, key: &T::Key) -> bool {
        self.get(key).is_some()
    }

    /// Look up a row by key.
    #[must_use]
    pub fn get(&self, key: &T::Key) -> Option<&T> {
        self.items.iter().find(|item| &item.key() == key)
    }

    /// Add an item, merging into an existing row with the same key.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::QuantityTooLarge` if the new or merged row
    /// would exceed [`MAX_QUANTITY`]. The list is unchanged in that case.
    pub fn add(&mut self, item: T) -> Result<Added<T>, ValidationError> {
        let key = item.key();
        match self.items.iter_mut().find(|existing| existing.key() == key) {
            Some(existing) => {
                if existing.absorb(&item)? {
                    Ok(Added::Merged(existing.clone()))
                } else {
                    Ok(Added::Unchanged)
                }
            }
            None => {
                if item.quantity() > MAX_QUANTITY {
                    return Err(ValidationError::QuantityTooLarge(i64::from(item.quantity())));
                }
                self.items.push(item.clone());
                Ok(Added::Inserted(item))
            }
        }
    }

    /// Remove the row with this key. Absent keys are a no-op.
    pub fn remove(&mut self, key: &T::Key) -> Option<T> {
        let index = self.items.iter().position(|item| &item.key() == key)?;
        Some(self.items.remove(index))
    }

    /// Remove every row.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of quantities.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity())).sum()
    }

    /// Sum of quantity × unit price.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.items
            .iter()
            .map(|item| item.unit_price() * Decimal::from(item.quantity()))
            .sum()
    }

    /// Natural keys present in the list.
    #[must_use]
    pub fn keys(&self) -> HashSet<T::Key> {
        self.items.iter().map(BagItem::key).collect()
    }
}

impl ItemList<LineItem> {
    /// Set the quantity of an existing line, returning the updated row.
    ///
    /// Absent keys are a no-op. A quantity of zero is the caller's concern
    /// (it means removal).
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::QuantityTooLarge` above [`MAX_QUANTITY`],
    /// leaving the line untouched.
    pub fn set_quantity(
        &mut self,
        key: &LineKey,
        quantity: u32,
    ) -> Result<Option<LineItem>, ValidationError> {
        if quantity > MAX_QUANTITY {
            return Err(ValidationError::QuantityTooLarge(i64::from(quantity)));
        }
        Ok(self
            .items
            .iter_mut()
            .find(|item| &item.key() == key)
            .map(|line| {
                line.quantity = quantity;
                line.clone()
            }))
    }

    /// Subtotal, shipping and order total under `policy`.
    #[must_use]
    pub fn summary(&self, policy: &ShippingPolicy) -> CartSummary {
        policy.summarize(self.total_price(), self.is_empty())
    }
}

impl<T: BagItem> FromIterator<T> for ItemList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_items(iter)
    }
}
