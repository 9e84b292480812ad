//! Route definitions for user accounts.

use axum::routing::{delete, get, put};
use axum::Router;

use crate::handlers::account;
use crate::state::AppState;

/// Account routes, merged at the API root.
///
/// ```text
/// GET    /users/me                  -> me
/// PUT    /users/me                  -> update_me
/// GET    /admin/users               -> list_users (admin only; role, search, active_only)
/// POST   /admin/users               -> create_user (admin only)
/// DELETE /admin/users/{id}          -> delete_user (admin only, soft delete)
/// PUT    /admin/users/{id}/status   -> set_active (admin only)
/// PUT    /admin/users/{id}/advisor  -> assign_advisor (admin only)
/// GET    /advisors                  -> list_advisors (admin only)
/// GET    /advisors/{id}/advisees    -> list_advisees
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(account::me).put(account::update_me))
        .route(
            "/admin/users",
            get(account::list_users).post(account::create_user),
        )
        .route("/admin/users/{id}", delete(account::delete_user))
        .route("/admin/users/{id}/status", put(account::set_active))
        .route("/admin/users/{id}/advisor", put(account::assign_advisor))
        .route("/advisors", get(account::list_advisors))
        .route("/advisors/{id}/advisees", get(account::list_advisees))
}
