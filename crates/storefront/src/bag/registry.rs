//! Per-visitor bag lifecycle.
//!
//! Each visitor (identified by a UUID kept in their session) gets one cart
//! and one wishlist, built and hydrated on first use and cached until the
//! visitor goes idle.
//!
//! Sign-in and sign-out bump the visitor's identity epoch while holding the
//! bag lock. A request that read its identity before the bump does not
//! align the bags with it, so a slow request from before a sign-out cannot
//! sign the bags back in.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};
use uuid::Uuid;
use valiero_core::{BagItem, LineItem, WishlistEntry};

use super::facade::{Bag, Identity};
use super::local::JsonSlot;
use super::remote::RemoteStore;
use crate::models::session::keys;

/// A visitor's cart.
pub type CartBag<C> = Bag<LineItem, JsonSlot<LineItem>, C>;

/// A visitor's wishlist.
pub type WishlistBag<W> = Bag<WishlistEntry, JsonSlot<WishlistEntry>, W>;

/// Everything needed to rebuild a visitor's bags.
#[derive(Debug, Clone, Default)]
pub struct VisitorSeed {
    /// Identity at construction time.
    pub identity: Identity,
    /// Raw local cart list, as mirrored in the session.
    pub cart: Option<String>,
    /// Raw local wishlist, as mirrored in the session.
    pub wishlist: Option<String>,
}

/// Both bags of one visitor, locked together.
pub struct VisitorBags<C, W> {
    pub cart: CartBag<C>,
    pub wishlist: WishlistBag<W>,
}

/// An identity read from the session, stamped with the visitor's identity
/// epoch at the time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityView {
    pub identity: Identity,
    epoch: u64,
}

/// A cached visitor.
pub struct Visitor<C, W> {
    bags: Mutex<VisitorBags<C, W>>,
    identity_epoch: AtomicU64,
    cart_loading: Arc<AtomicBool>,
    wishlist_loading: Arc<AtomicBool>,
}

impl<C, W> Visitor<C, W>
where
    C: RemoteStore<LineItem>,
    W: RemoteStore<WishlistEntry>,
{
    /// Lock both bags as they are. Mutations apply in lock order.
    pub async fn lock(&self) -> MutexGuard<'_, VisitorBags<C, W>> {
        self.bags.lock().await
    }

    /// Stamp an identity read from the session with the current epoch.
    #[must_use]
    pub fn observe(&self, identity: Identity) -> IdentityView {
        IdentityView {
            identity,
            epoch: self.identity_epoch.load(Ordering::Acquire),
        }
    }

    /// Lock both bags, aligning them with `view` unless a sign-in or
    /// sign-out happened after it was observed.
    pub async fn lock_as(&self, view: IdentityView) -> MutexGuard<'_, VisitorBags<C, W>> {
        let mut bags = self.bags.lock().await;
        if self.identity_epoch.load(Ordering::Acquire) == view.epoch {
            align_both(&mut bags, view.identity).await;
        } else if bags.cart.identity() != view.identity {
            debug!(stale = ?view.identity, current = ?bags.cart.identity(), "Stale identity ignored");
        }
        bags
    }

    /// Lock both bags after a sign-in or sign-out, making `identity` current.
    ///
    /// Views observed before this call no longer align the bags.
    pub async fn lock_switching(&self, identity: Identity) -> MutexGuard<'_, VisitorBags<C, W>> {
        let mut bags = self.bags.lock().await;
        self.identity_epoch.fetch_add(1, Ordering::AcqRel);
        align_both(&mut bags, identity).await;
        bags
    }

    /// Whether the cart is fetching remote rows. Does not lock.
    #[must_use]
    pub fn cart_loading(&self) -> bool {
        self.cart_loading.load(Ordering::Acquire)
    }

    /// Whether the wishlist is fetching remote rows. Does not lock.
    #[must_use]
    pub fn wishlist_loading(&self) -> bool {
        self.wishlist_loading.load(Ordering::Acquire)
    }
}

/// Cache of live visitors.
pub struct BagRegistry<C, W> {
    visitors: Cache<Uuid, Arc<Visitor<C, W>>>,
    carts: Arc<C>,
    wishlists: Arc<W>,
}

impl<C, W> BagRegistry<C, W>
where
    C: RemoteStore<LineItem>,
    W: RemoteStore<WishlistEntry>,
{
    /// Create a registry holding at most `capacity` visitors, each evicted
    /// after `idle` without a request.
    #[must_use]
    pub fn new(carts: C, wishlists: W, capacity: u64, idle: Duration) -> Self {
        let visitors = Cache::builder()
            .max_capacity(capacity)
            .time_to_idle(idle)
            .eviction_listener(|visitor, _, cause| {
                debug!(visitor = %visitor, ?cause, "Visitor bags evicted");
            })
            .build();

        Self {
            visitors,
            carts: Arc::new(carts),
            wishlists: Arc::new(wishlists),
        }
    }

    /// The visitor's bags, building and hydrating them from `seed` if the
    /// visitor is not cached.
    #[instrument(skip_all, fields(visitor = %visitor))]
    pub async fn open(&self, visitor: Uuid, seed: VisitorSeed) -> Arc<Visitor<C, W>> {
        self.visitors
            .get_with(visitor, async move { Arc::new(self.build(seed).await) })
            .await
    }

    /// The visitor's bags, if cached.
    pub async fn get(&self, visitor: Uuid) -> Option<Arc<Visitor<C, W>>> {
        self.visitors.get(&visitor).await
    }

    async fn build(&self, seed: VisitorSeed) -> Visitor<C, W> {
        let cart_loading = Arc::new(AtomicBool::new(false));
        let wishlist_loading = Arc::new(AtomicBool::new(false));

        let mut cart = Bag::new(
            "cart",
            JsonSlot::seeded(keys::CART, seed.cart),
            Arc::clone(&self.carts),
        )
        .with_loading_flag(Arc::clone(&cart_loading));
        let mut wishlist = Bag::new(
            "wishlist",
            JsonSlot::seeded(keys::WISHLIST, seed.wishlist),
            Arc::clone(&self.wishlists),
        )
        .with_loading_flag(Arc::clone(&wishlist_loading));

        tokio::join!(cart.hydrate(seed.identity), wishlist.hydrate(seed.identity));
        debug!(identity = ?seed.identity, "Visitor bags hydrated");

        Visitor {
            bags: Mutex::new(VisitorBags { cart, wishlist }),
            identity_epoch: AtomicU64::new(0),
            cart_loading,
            wishlist_loading,
        }
    }

    /// Wait for every cached visitor's queued remote writes.
    pub async fn flush_all(&self) {
        let visitors: Vec<_> = self.visitors.iter().map(|(_, visitor)| visitor).collect();
        for visitor in &visitors {
            let bags = visitor.lock().await;
            tokio::join!(bags.cart.flush(), bags.wishlist.flush());
        }
        info!(visitors = visitors.len(), "Flushed pending bag writes");
    }
}

async fn align_both<C, W>(bags: &mut VisitorBags<C, W>, target: Identity)
where
    C: RemoteStore<LineItem>,
    W: RemoteStore<WishlistEntry>,
{
    let VisitorBags { cart, wishlist } = bags;
    tokio::join!(align(cart, target), align(wishlist, target));
}

/// Run the sign-in merge or sign-out reset if `bag` is not on `target`.
async fn align<T, R>(bag: &mut Bag<T, JsonSlot<T>, R>, target: Identity)
where
    T: BagItem,
    R: RemoteStore<T>,
{
    if bag.identity() == target {
        return;
    }
    match target {
        Identity::Anonymous => bag.sign_out(),
        Identity::Authenticated(account) => bag.sign_in(account).await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use valiero_core::{ProductId, UserId};

    use super::*;
    use crate::bag::local::LocalStore;
    use crate::bag::testing::MemoryRemote;

    type TestRegistry = BagRegistry<MemoryRemote<LineItem>, MemoryRemote<WishlistEntry>>;

    fn registry() -> TestRegistry {
        BagRegistry::new(
            MemoryRemote::default(),
            MemoryRemote::default(),
            100,
            Duration::from_secs(60),
        )
    }

    fn line(id: &str) -> LineItem {
        LineItem {
            id: ProductId::new(id),
            name: "Cord Trousers".to_string(),
            price: Decimal::new(8900, 2),
            original_price: None,
            image: String::new(),
            size: "32".to_string(),
            color: "Rust".to_string(),
            quantity: 1,
        }
    }

    #[tokio::test]
    async fn test_open_reuses_cached_visitor() {
        let registry = registry();
        let visitor = Uuid::new_v4();

        let first = registry.open(visitor, VisitorSeed::default()).await;
        first.lock().await.cart.add_item(line("a")).unwrap();

        // A second seed is ignored once the visitor is cached.
        let second = registry.open(visitor, VisitorSeed::default()).await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.lock().await.cart.items().len(), 1);
    }

    #[tokio::test]
    async fn test_open_hydrates_from_seed() {
        let registry = registry();
        let seed = VisitorSeed {
            identity: Identity::Anonymous,
            cart: Some(serde_json::to_string(&[line("a")]).unwrap()),
            wishlist: Some("garbage".to_string()),
        };

        let visitor = registry.open(Uuid::new_v4(), seed).await;
        let bags = visitor.lock().await;
        assert_eq!(bags.cart.items(), &[line("a")]);
        assert!(bags.wishlist.items().is_empty());
        assert_eq!(bags.cart.local().key(), keys::CART);
        assert!(!visitor.cart_loading());
    }

    #[tokio::test]
    async fn test_authenticated_seed_reconciles() {
        let carts = MemoryRemote::default();
        let account = UserId::new(9);
        carts.seed(account, vec![line("remote")]);
        let registry: TestRegistry =
            BagRegistry::new(carts, MemoryRemote::default(), 10, Duration::from_secs(60));
        let seed = VisitorSeed {
            identity: Identity::Authenticated(account),
            cart: Some(serde_json::to_string(&[line("local")]).unwrap()),
            wishlist: None,
        };

        let visitor = registry.open(Uuid::new_v4(), seed).await;
        registry.flush_all().await;

        let bags = visitor.lock().await;
        assert_eq!(bags.cart.items(), &[line("remote"), line("local")]);
        assert!(bags.cart.local().load().is_empty());
        assert!(bags.cart.local().is_dirty());
        assert_eq!(bags.wishlist.identity(), Identity::Authenticated(account));
    }

    #[tokio::test]
    async fn test_lock_as_aligns_current_view() {
        let registry = registry();
        let account = UserId::new(4);
        let visitor = registry.open(Uuid::new_v4(), VisitorSeed::default()).await;

        let view = visitor.observe(Identity::Authenticated(account));
        let bags = visitor.lock_as(view).await;
        assert_eq!(bags.cart.identity(), Identity::Authenticated(account));
        assert_eq!(bags.wishlist.identity(), Identity::Authenticated(account));
    }

    #[tokio::test]
    async fn test_view_from_before_sign_out_does_not_sign_back_in() {
        let carts = MemoryRemote::default();
        let account = UserId::new(9);
        carts.seed(account, vec![line("remote")]);
        let registry: TestRegistry =
            BagRegistry::new(carts, MemoryRemote::default(), 10, Duration::from_secs(60));
        let seed = VisitorSeed {
            identity: Identity::Authenticated(account),
            ..VisitorSeed::default()
        };
        let visitor = registry.open(Uuid::new_v4(), seed).await;

        // Read while still signed in, locked after the sign-out.
        let stale = visitor.observe(Identity::Authenticated(account));
        drop(visitor.lock_switching(Identity::Anonymous).await);

        let bags = visitor.lock_as(stale).await;
        assert_eq!(bags.cart.identity(), Identity::Anonymous);
        assert_eq!(bags.wishlist.identity(), Identity::Anonymous);
        assert!(!bags.cart.contains(&line("remote").key()));
    }

    #[tokio::test]
    async fn test_view_after_switch_aligns() {
        let registry = registry();
        let account = UserId::new(2);
        let visitor = registry.open(Uuid::new_v4(), VisitorSeed::default()).await;

        drop(visitor.lock_switching(Identity::Authenticated(account)).await);
        let fresh = visitor.observe(Identity::Anonymous);

        let bags = visitor.lock_as(fresh).await;
        assert_eq!(bags.cart.identity(), Identity::Anonymous);
    }
}
