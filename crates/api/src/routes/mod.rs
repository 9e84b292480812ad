pub mod achievements;
pub mod auth;
pub mod health;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                                      login (public)
/// /auth/refresh                                    rotate refresh token (public)
/// /auth/revoke                                     revoke one session (public)
/// /auth/logout                                     revoke all sessions (best effort)
/// /auth/logout-all                                 revoke all sessions (requires auth)
/// /auth/sessions                                   active sessions (requires auth)
///
/// /users/me                                        caller's profile, update
/// /admin/users                                     list, create (admin only)
/// /admin/users/{id}                                soft delete (admin only)
/// /admin/users/{id}/status                         activate, deactivate (admin only)
/// /admin/users/{id}/advisor                        assign advisor (admin only)
/// /advisors                                        active advisors (admin only)
/// /advisors/{id}/advisees                          list advisees
///
/// /achievements                                    list, create
/// /achievements/pending                            review queue (advisor, admin)
/// /achievements/{id}                               get, update, delete
/// /achievements/{id}/submit                        draft -> submitted
/// /achievements/{id}/verify                        submitted -> verified
/// /achievements/{id}/reject                        submitted -> rejected
/// /achievements/{id}/files                         list, upload
/// /achievements/{id}/files/{file_id}               download, delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/achievements", achievements::router())
        .merge(users::router())
}
