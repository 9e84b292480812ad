//! Route definitions for the `/auth` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /login       -> login
/// POST /refresh     -> refresh
/// POST /revoke      -> revoke_session
/// POST /logout      -> logout
/// POST /logout-all  -> logout_all (requires auth)
/// GET  /sessions    -> list_sessions (requires auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/revoke", post(auth::revoke_session))
        .route("/logout", post(auth::logout))
        .route("/logout-all", post(auth::logout_all))
        .route("/sessions", get(auth::list_sessions))
}
