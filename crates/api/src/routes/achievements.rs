//! Route definitions for the `/achievements` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{achievement, attachment};
use crate::state::AppState;

/// Routes mounted at `/achievements`.
///
/// ```text
/// GET    /                        -> list
/// POST   /                        -> create
/// GET    /pending                 -> list_pending
/// GET    /{id}                    -> get
/// PUT    /{id}                    -> update
/// DELETE /{id}                    -> delete
/// POST   /{id}/submit             -> submit
/// POST   /{id}/verify             -> verify
/// POST   /{id}/reject             -> reject
/// GET    /{id}/files              -> list attachments
/// POST   /{id}/files              -> upload (multipart)
/// GET    /{id}/files/{file_id}    -> download
/// DELETE /{id}/files/{file_id}    -> delete attachment
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(achievement::list).post(achievement::create))
        .route("/pending", get(achievement::list_pending))
        .route(
            "/{id}",
            get(achievement::get)
                .put(achievement::update)
                .delete(achievement::delete),
        )
        .route("/{id}/submit", post(achievement::submit))
        .route("/{id}/verify", post(achievement::verify))
        .route("/{id}/reject", post(achievement::reject))
        .route(
            "/{id}/files",
            get(attachment::list).post(attachment::upload),
        )
        .route(
            "/{id}/files/{file_id}",
            get(attachment::download).delete(attachment::delete),
        )
}
