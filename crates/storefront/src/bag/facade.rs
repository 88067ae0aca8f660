//! The cart/wishlist facade consumed by route handlers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use valiero_core::{
    BagItem, CartSummary, ItemList, LineItem, LineKey, Merge, ShippingPolicy, UserId,
    ValidationError, checked_quantity, reconcile,
};

use super::local::LocalStore;
use super::remote::{RemoteError, RemoteStore};
use super::writer::{RemoteWriter, SyncNotice};

/// Who the bag belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Identity {
    /// No account; items persist to the local store.
    #[default]
    Anonymous,
    /// Signed in; items persist to the account's remote rows.
    Authenticated(UserId),
}

impl Identity {
    /// The signed-in account, if any.
    #[must_use]
    pub const fn account(self) -> Option<UserId> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(account) => Some(account),
        }
    }
}

/// Errors returned by bag operations.
#[derive(Debug, Error)]
pub enum BagError {
    /// Input rejected before any mutation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The account's items could not be fetched.
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Resets the loading flag even if the fetch future is dropped.
struct Loading<'a>(&'a AtomicBool);

impl<'a> Loading<'a> {
    fn start(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One cart or wishlist.
///
/// State changes are applied in memory first, then persisted to whichever
/// store is authoritative: the local store while anonymous (or while a
/// sign-in merge is pending), the account's remote rows once reconciled.
/// Remote writes go through an in-order queue and never block the caller.
pub struct Bag<T: BagItem, L, R> {
    concern: &'static str,
    items: ItemList<T>,
    identity: Identity,
    pending_reconcile: bool,
    loading: Arc<AtomicBool>,
    local: L,
    remote: Arc<R>,
    writer: RemoteWriter<T>,
    notice_tx: mpsc::UnboundedSender<SyncNotice>,
    notices: mpsc::UnboundedReceiver<SyncNotice>,
}

impl<T, L, R> Bag<T, L, R>
where
    T: BagItem,
    L: LocalStore<T>,
    R: RemoteStore<T>,
{
    /// Create an empty, anonymous bag. Call [`Self::hydrate`] before use.
    ///
    /// Must be called inside a tokio runtime (spawns the write queue).
    pub fn new(concern: &'static str, local: L, remote: Arc<R>) -> Self {
        let (notice_tx, notices) = mpsc::unbounded_channel();
        let writer = RemoteWriter::spawn(concern, Arc::clone(&remote), notice_tx.clone());
        Self {
            concern,
            items: ItemList::new(),
            identity: Identity::Anonymous,
            pending_reconcile: false,
            loading: Arc::new(AtomicBool::new(false)),
            local,
            remote,
            writer,
            notice_tx,
            notices,
        }
    }

    /// Use an externally owned loading flag, so it can be read without
    /// locking the bag.
    #[must_use]
    pub fn with_loading_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.loading = flag;
        self
    }

    /// Initial load for a freshly constructed bag.
    ///
    /// Anonymous bags read the local store; authenticated bags run the
    /// sign-in merge.
    pub async fn hydrate(&mut self, identity: Identity) {
        match identity {
            Identity::Anonymous => {
                self.identity = Identity::Anonymous;
                self.items = ItemList::from_items(self.local.load());
            }
            Identity::Authenticated(account) => self.sign_in(account).await,
        }
    }

    /// Observe an anonymous → authenticated transition.
    ///
    /// Fetches the account's rows, adopts local rows with new keys, clears
    /// the local store and switches persistence to remote. Repeating the call
    /// for the same account is a no-op unless an earlier merge failed.
    pub async fn sign_in(&mut self, account: UserId) {
        match self.identity {
            Identity::Authenticated(current) if current == account => {
                if !self.pending_reconcile {
                    return;
                }
            }
            Identity::Authenticated(_) => self.sign_out(),
            Identity::Anonymous => {}
        }

        self.identity = Identity::Authenticated(account);
        // Failures are already recorded as a notice and a pending merge.
        let _ = self.reconcile_with(account).await;
    }

    /// Re-run a sign-in merge that failed to fetch remote rows.
    ///
    /// # Errors
    ///
    /// Returns `BagError::Remote` if the fetch fails again.
    pub async fn retry_reconcile(&mut self) -> Result<(), BagError> {
        match self.identity {
            Identity::Authenticated(account) if self.pending_reconcile => {
                self.reconcile_with(account).await?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Observe an authenticated → anonymous transition.
    ///
    /// In-memory state resets to whatever the local store holds.
    pub fn sign_out(&mut self) {
        if let Identity::Authenticated(account) = self.identity {
            debug!(concern = self.concern, account = %account, "Bag signed out");
        }
        self.identity = Identity::Anonymous;
        self.pending_reconcile = false;
        self.items = ItemList::from_items(self.local.load());
    }

    async fn reconcile_with(&mut self, account: UserId) -> Result<(), RemoteError> {
        let fetched = {
            let _loading = Loading::start(&self.loading);
            self.remote.fetch_all(account).await
        };

        match fetched {
            Ok(remote) => {
                let Merge { items, adopted } = reconcile(remote, self.local.load());
                info!(
                    concern = self.concern,
                    account = %account,
                    total = items.len(),
                    adopted = adopted.len(),
                    "Reconciled local items into account"
                );
                for item in adopted {
                    self.writer.upsert(account, item);
                }
                self.local.clear();
                self.items = ItemList::from_items(items);
                self.pending_reconcile = false;
                Ok(())
            }
            Err(e) => {
                warn!(
                    concern = self.concern,
                    account = %account,
                    error = %e,
                    "Could not fetch account items, keeping local items"
                );
                self.pending_reconcile = true;
                self.items = ItemList::from_items(self.local.load());
                let _ = self
                    .notice_tx
                    .send(SyncNotice::new(self.concern, "fetch_all", &e));
                Err(e)
            }
        }
    }

    /// Account that receives writes, `None` while local is authoritative.
    const fn remote_account(&self) -> Option<UserId> {
        match self.identity {
            Identity::Authenticated(account) if !self.pending_reconcile => Some(account),
            _ => None,
        }
    }

    fn persist_row(&mut self, row: T) {
        match self.remote_account() {
            Some(account) => self.writer.upsert(account, row),
            None => self.local.save(self.items.as_slice()),
        }
    }

    /// Add an item, folding it into an existing row with the same key.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::ZeroQuantity` for an empty item and
    /// `ValidationError::QuantityTooLarge` if the row would exceed
    /// [`valiero_core::MAX_QUANTITY`]. Nothing changes on error.
    pub fn add_item(&mut self, item: T) -> Result<(), BagError> {
        if item.quantity() == 0 {
            return Err(ValidationError::ZeroQuantity.into());
        }
        if let Some(row) = self.items.add(item)?.changed() {
            self.persist_row(row);
        }
        Ok(())
    }

    /// Remove the row with this key. Returns whether anything was removed.
    pub fn remove_item(&mut self, key: &T::Key) -> bool {
        if self.items.remove(key).is_none() {
            return false;
        }
        match self.remote_account() {
            Some(account) => self.writer.delete(account, key.clone()),
            None => self.local.save(self.items.as_slice()),
        }
        true
    }

    /// Remove every row.
    pub fn clear(&mut self) {
        self.items.clear();
        match self.remote_account() {
            Some(account) => self.writer.delete_all(account),
            None => self.local.clear(),
        }
    }

    /// Remove the item if present, add it otherwise. Returns whether the
    /// item is now in the bag.
    ///
    /// # Errors
    ///
    /// Propagates validation errors from [`Self::add_item`].
    pub fn toggle(&mut self, item: T) -> Result<bool, BagError> {
        let key = item.key();
        if self.items.contains(&key) {
            self.remove_item(&key);
            Ok(false)
        } else {
            self.add_item(item)?;
            Ok(true)
        }
    }

    /// Whether a row with this key is in the bag.
    #[must_use]
    pub fn contains(&self, key: &T::Key) -> bool {
        self.items.contains(key)
    }

    /// Current rows in insertion order.
    #[must_use]
    pub fn items(&self) -> &[T] {
        self.items.as_slice()
    }

    /// Sum of quantities.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items.total_items()
    }

    /// Sum of quantity × unit price.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.items.total_price()
    }

    /// Who the bag currently belongs to.
    #[must_use]
    pub const fn identity(&self) -> Identity {
        self.identity
    }

    /// Whether a sign-in merge failed and local is still authoritative.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending_reconcile
    }

    /// Whether a remote fetch is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Sync failures reported since the last call.
    pub fn take_notices(&mut self) -> Vec<SyncNotice> {
        let mut notices = Vec::new();
        while let Ok(notice) = self.notices.try_recv() {
            notices.push(notice);
        }
        notices
    }

    /// Wait for queued remote writes to be attempted.
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    /// The local store backing anonymous state.
    #[must_use]
    pub const fn local(&self) -> &L {
        &self.local
    }

    /// Mutable access to the local store.
    pub const fn local_mut(&mut self) -> &mut L {
        &mut self.local
    }
}

impl<L, R> Bag<LineItem, L, R>
where
    L: LocalStore<LineItem>,
    R: RemoteStore<LineItem>,
{
    /// Set a line's quantity. Anything below 1 removes the line; absent keys
    /// are a no-op.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::QuantityTooLarge` above
    /// [`valiero_core::MAX_QUANTITY`], leaving the line untouched.
    pub fn update_quantity(&mut self, key: &LineKey, quantity: i64) -> Result<(), BagError> {
        if quantity < 1 {
            self.remove_item(key);
            return Ok(());
        }
        let quantity = checked_quantity(quantity)?;
        if let Some(row) = self.items.set_quantity(key, quantity)? {
            self.persist_row(row);
        }
        Ok(())
    }

    /// Subtotal, shipping and order total under `policy`.
    #[must_use]
    pub fn summary(&self, policy: &ShippingPolicy) -> CartSummary {
        self.items.summary(policy)
    }
}
