//! Visitor extractor: binds a request to the visitor's cart and wishlist.
//!
//! The session holds a visitor id, the signed-in user (if any) and the
//! anonymous cart/wishlist lists. On extraction the visitor's bags are
//! looked up in the registry, built from the session lists on a miss.
//! [`VisitorContext::lock`] brings both bags in line with the session's
//! identity (running the sign-in merge or sign-out reset when it changed)
//! unless a sign-in or sign-out landed after the session was read, and
//! [`VisitorContext::persist`] mirrors local list changes back into the
//! session.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use tokio::sync::MutexGuard;
use tower_sessions::Session;
use tracing::debug;
use uuid::Uuid;
use valiero_core::BagItem;

use crate::bag::{Identity, IdentityView, JsonSlot, Visitor, VisitorBags, VisitorSeed};
use crate::db::{CartRepository, WishlistRepository};
use crate::error::AppError;
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Both bags of the current visitor, locked.
pub type BagsGuard<'a> = MutexGuard<'a, VisitorBags<CartRepository, WishlistRepository>>;

/// The current visitor and their session.
pub struct VisitorContext {
    session: Session,
    id: Uuid,
    user: Option<CurrentUser>,
    /// Identity as read from the session at extraction.
    observed: IdentityView,
    /// Set once this request signs in or out.
    switched: bool,
    visitor: Arc<Visitor<CartRepository, WishlistRepository>>,
}

impl FromRequestParts<AppState> for VisitorContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer is not installed".to_string()))?;

        let id = if let Some(id) = session.get::<Uuid>(session_keys::VISITOR_ID).await? {
            id
        } else {
            let id = Uuid::new_v4();
            session.insert(session_keys::VISITOR_ID, id).await?;
            debug!(visitor = %id, "New visitor");
            id
        };

        let user = session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await?;

        let visitor = match state.bags().get(id).await {
            Some(visitor) => visitor,
            None => {
                let seed = VisitorSeed {
                    identity: identity_of(user.as_ref()),
                    cart: session.get::<String>(session_keys::CART).await?,
                    wishlist: session.get::<String>(session_keys::WISHLIST).await?,
                };
                state.bags().open(id, seed).await
            }
        };
        let observed = visitor.observe(identity_of(user.as_ref()));

        Ok(Self {
            session,
            id,
            user,
            observed,
            switched: false,
            visitor,
        })
    }
}

fn identity_of(user: Option<&CurrentUser>) -> Identity {
    user.map_or(Identity::Anonymous, |u| Identity::Authenticated(u.id))
}

impl VisitorContext {
    /// The visitor id stored in the session.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// The signed-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&CurrentUser> {
        self.user.as_ref()
    }

    /// The identity the bags are brought in line with on [`Self::lock`].
    #[must_use]
    pub fn identity(&self) -> Identity {
        identity_of(self.user.as_ref())
    }

    /// The session this visitor was extracted from.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Loading flags, readable without waiting for the bag lock.
    #[must_use]
    pub fn loading(&self) -> (bool, bool) {
        (self.visitor.cart_loading(), self.visitor.wishlist_loading())
    }

    /// Change the signed-in user for the rest of this request.
    ///
    /// Takes effect on the next [`Self::lock`], which also stops requests
    /// that read the previous user from re-applying it.
    pub fn set_user(&mut self, user: Option<CurrentUser>) {
        self.user = user;
        self.switched = true;
    }

    /// Lock both bags, first applying any identity change.
    pub async fn lock(&self) -> BagsGuard<'_> {
        if self.switched {
            self.visitor.lock_switching(self.identity()).await
        } else {
            self.visitor.lock_as(self.observed).await
        }
    }

    /// Mirror changed local lists into the session.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the session cannot be written.
    pub async fn persist(&self, bags: &mut BagsGuard<'_>) -> Result<(), AppError> {
        mirror(&self.session, bags.cart.local_mut()).await?;
        mirror(&self.session, bags.wishlist.local_mut()).await?;
        Ok(())
    }
}

async fn mirror<T: BagItem>(
    session: &Session,
    slot: &mut JsonSlot<T>,
) -> Result<(), tower_sessions::session::Error> {
    if !slot.is_dirty() {
        return Ok(());
    }
    match slot.raw() {
        Some(raw) => session.insert(slot.key(), raw).await?,
        None => {
            session.remove::<String>(slot.key()).await?;
        }
    }
    slot.mark_clean();
    Ok(())
}
