//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//! 5. Rate limiting (governor) on auth and bag mutations
//!
//! [`VisitorContext`] is an extractor rather than a layer: only bag routes
//! pay for the registry lookup.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod session;
pub mod visitor;

pub use auth::{RequireAuth, clear_current_user, set_current_user};
pub use rate_limit::{auth_rate_limiter, bag_rate_limiter};
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
pub use visitor::{BagsGuard, VisitorContext};
