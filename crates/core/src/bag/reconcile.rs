//! Sign-in merge of device-local items into an account's remote items.

use std::collections::HashSet;

use super::item::BagItem;

/// Outcome of [`reconcile`].
#[derive(Debug, Clone, PartialEq)]
pub struct Merge<T> {
    /// The merged list: remote rows first, then adopted local rows.
    pub items: Vec<T>,
    /// Local rows whose key was absent remotely; each must be upserted.
    pub adopted: Vec<T>,
}

/// Fold local items into remote items.
///
/// Remote wins on key conflicts: a local row whose natural key already
/// exists remotely is discarded, quantities are never summed across sources.
///
/// # Example
///
/// ```
/// use valiero_core::{ProductId, WishlistEntry, reconcile};
/// # use rust_decimal::Decimal;
/// # fn entry(id: &str) -> WishlistEntry {
/// #     WishlistEntry { id: ProductId::new(id), name: id.into(), price: Decimal::ONE,
/// #         original_price: None, image: String::new(), secondary_image: None }
/// # }
/// let merge = reconcile(vec![entry("b")], vec![entry("a"), entry("b")]);
/// assert_eq!(merge.items.len(), 2);
/// assert_eq!(merge.adopted, vec![entry("a")]);
/// ```
#[must_use]
pub fn reconcile<T: BagItem>(remote: Vec<T>, local: Vec<T>) -> Merge<T> {
    let mut seen: HashSet<T::Key> = remote.iter().map(BagItem::key).collect();
    let mut items = remote;
    let mut adopted = Vec::new();

    for item in local {
        if seen.insert(item.key()) {
            items.push(item.clone());
            adopted.push(item);
        }
    }

    Merge { items, adopted }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::bag::item::LineItem;
    use crate::types::ProductId;

    fn line(id: &str, quantity: u32) -> LineItem {
        LineItem {
            id: ProductId::new(id),
            name: id.to_uppercase(),
            price: Decimal::new(1500, 2),
            original_price: None,
            image: String::new(),
            size: "M".to_string(),
            color: "Olive".to_string(),
            quantity,
        }
    }

    #[test]
    fn test_disjoint_sets_are_unioned() {
        let merge = reconcile(vec![line("b", 2)], vec![line("a", 1)]);
        assert_eq!(merge.items, vec![line("b", 2), line("a", 1)]);
        assert_eq!(merge.adopted, vec![line("a", 1)]);
    }

    #[test]
    fn test_remote_wins_without_summing() {
        let merge = reconcile(vec![line("a", 3)], vec![line("a", 1)]);
        assert_eq!(merge.items, vec![line("a", 3)]);
        assert!(merge.adopted.is_empty());
    }

    #[test]
    fn test_empty_local_returns_remote() {
        let merge = reconcile(vec![line("a", 3), line("b", 1)], Vec::new());
        assert_eq!(merge.items.len(), 2);
        assert!(merge.adopted.is_empty());
    }

    #[test]
    fn test_duplicate_local_rows_adopted_once() {
        let merge = reconcile(Vec::new(), vec![line("a", 1), line("a", 4)]);
        assert_eq!(merge.items, vec![line("a", 1)]);
        assert_eq!(merge.adopted.len(), 1);
    }
}
