//! Authentication route handlers.
//!
//! Signing in moves the visitor's anonymous cart and wishlist into the
//! account (account rows win on conflicts). Signing out drops back to
//! whatever is still stored on the device.

use axum::{Json, extract::State};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::{Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::{VisitorContext, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::routes::cart::CartView;
use crate::routes::wishlist::WishlistView;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Email/password credentials.
#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

/// Session state after an auth change.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub user: Option<CurrentUser>,
    pub cart: CartView,
    pub wishlist: WishlistView,
}

/// Create an account and sign in.
#[instrument(skip_all, fields(visitor = %visitor.id()))]
pub async fn register(
    State(state): State<AppState>,
    visitor: VisitorContext,
    Json(credentials): Json<Credentials>,
) -> Result<Json<SessionView>> {
    let user = AuthService::new(state.pool())
        .register(&credentials.email, credentials.password.expose_secret())
        .await?;

    sign_in(&state, visitor, user).await
}

/// Sign in with email and password.
#[instrument(skip_all, fields(visitor = %visitor.id()))]
pub async fn login(
    State(state): State<AppState>,
    visitor: VisitorContext,
    Json(credentials): Json<Credentials>,
) -> Result<Json<SessionView>> {
    let user = AuthService::new(state.pool())
        .login(&credentials.email, credentials.password.expose_secret())
        .await?;

    sign_in(&state, visitor, user).await
}

async fn sign_in(
    state: &AppState,
    mut visitor: VisitorContext,
    user: User,
) -> Result<Json<SessionView>> {
    let current = CurrentUser {
        id: user.id,
        email: user.email,
    };

    // New session id on privilege change
    visitor.session().cycle_id().await?;
    set_current_user(visitor.session(), &current).await?;
    set_sentry_user(&current.id, Some(current.email.as_str()));
    add_breadcrumb("auth", "Signed in", None);
    info!(user_id = %current.id, "User signed in");

    visitor.set_user(Some(current));
    let mut bags = visitor.lock().await;
    visitor.persist(&mut bags).await?;

    Ok(Json(SessionView {
        user: visitor.user().cloned(),
        cart: CartView::drain(&mut bags.cart, &state.config().bags),
        wishlist: WishlistView::drain(&mut bags.wishlist),
    }))
}

/// Sign out. The visitor keeps their device-local items.
#[instrument(skip_all, fields(visitor = %visitor.id()))]
pub async fn logout(
    State(state): State<AppState>,
    mut visitor: VisitorContext,
) -> Result<Json<SessionView>> {
    if let Some(user) = visitor.user() {
        info!(user_id = %user.id, "User signed out");
    }

    clear_current_user(visitor.session()).await?;
    visitor.session().cycle_id().await?;
    clear_sentry_user();
    add_breadcrumb("auth", "Signed out", None);

    visitor.set_user(None);
    let mut bags = visitor.lock().await;
    visitor.persist(&mut bags).await?;

    Ok(Json(SessionView {
        user: None,
        cart: CartView::drain(&mut bags.cart, &state.config().bags),
        wishlist: WishlistView::drain(&mut bags.wishlist),
    }))
}

