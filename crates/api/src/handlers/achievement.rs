//! Handlers for the `/achievements` resource and its review workflow.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use laurel_core::types::DbId;
use laurel_db::models::achievement::{Achievement, UpdateAchievement};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireReviewer;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::workflow::NewAchievement;

/// Request body for `POST /achievements/{id}/reject`.
#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

/// GET /api/v1/achievements
///
/// Students see their own records; advisors and admins see everything.
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Achievement>>>> {
    let items = state.workflow.list(&auth.actor()).await?;
    Ok(Json(DataResponse { data: items }))
}

/// POST /api/v1/achievements
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<NewAchievement>,
) -> AppResult<impl IntoResponse> {
    let achievement = state.workflow.create(&auth.actor(), input).await?;

    tracing::info!(
        user_id = auth.user_id,
        achievement_id = achievement.id,
        "Achievement created"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: achievement })))
}

/// GET /api/v1/achievements/pending
///
/// Review queue, oldest submission first.
pub async fn list_pending(
    RequireReviewer(auth): RequireReviewer,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Achievement>>>> {
    let items = state.workflow.list_pending(&auth.actor()).await?;
    Ok(Json(DataResponse { data: items }))
}

/// GET /api/v1/achievements/{id}
pub async fn get(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Achievement>>> {
    let achievement = state.workflow.get(&auth.actor(), id).await?;
    Ok(Json(DataResponse { data: achievement }))
}

/// PUT /api/v1/achievements/{id}
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateAchievement>,
) -> AppResult<Json<DataResponse<Achievement>>> {
    let achievement = state.workflow.update(&auth.actor(), id, input).await?;

    tracing::info!(user_id = auth.user_id, achievement_id = id, "Achievement updated");
    Ok(Json(DataResponse { data: achievement }))
}

/// DELETE /api/v1/achievements/{id}
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.workflow.delete(&auth.actor(), id).await?;

    tracing::info!(user_id = auth.user_id, achievement_id = id, "Achievement deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/achievements/{id}/submit
pub async fn submit(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Achievement>>> {
    let achievement = state.workflow.submit(&auth.actor(), id).await?;

    tracing::info!(user_id = auth.user_id, achievement_id = id, "Achievement submitted");
    Ok(Json(DataResponse { data: achievement }))
}

/// POST /api/v1/achievements/{id}/verify
pub async fn verify(
    RequireReviewer(auth): RequireReviewer,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Achievement>>> {
    let achievement = state.workflow.verify(&auth.actor(), id).await?;

    tracing::info!(
        user_id = auth.user_id,
        achievement_id = id,
        decision = "verified",
        "Achievement reviewed"
    );
    Ok(Json(DataResponse { data: achievement }))
}

/// POST /api/v1/achievements/{id}/reject
pub async fn reject(
    RequireReviewer(auth): RequireReviewer,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<RejectRequest>,
) -> AppResult<Json<DataResponse<Achievement>>> {
    let achievement = state
        .workflow
        .reject(&auth.actor(), id, &input.reason)
        .await?;

    tracing::info!(
        user_id = auth.user_id,
        achievement_id = id,
        decision = "rejected",
        "Achievement reviewed"
    );
    Ok(Json(DataResponse { data: achievement }))
}
