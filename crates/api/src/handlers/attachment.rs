//! Handlers for evidence files under `/achievements/{id}/files`.

use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use laurel_core::types::DbId;
use laurel_db::models::attachment::Attachment;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Multipart field carrying the file.
const FILE_FIELD: &str = "file";

/// POST /api/v1/achievements/{id}/files
///
/// Accepts a multipart form with a required `file` field. Other fields are
/// ignored.
pub async fn upload(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(achievement_id): Path<DbId>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest("The 'file' field has no file name".into()))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        file = Some((file_name, data.to_vec()));
    }

    let (file_name, bytes) =
        file.ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;

    let attachment = state
        .attachments
        .upload(&auth.actor(), achievement_id, &file_name, bytes)
        .await?;

    tracing::info!(
        user_id = auth.user_id,
        achievement_id,
        attachment_id = attachment.id,
        size_bytes = attachment.size_bytes,
        "Attachment uploaded"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: attachment })))
}

/// GET /api/v1/achievements/{id}/files
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(achievement_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Attachment>>>> {
    let items = state.attachments.list(&auth.actor(), achievement_id).await?;
    Ok(Json(DataResponse { data: items }))
}

/// GET /api/v1/achievements/{id}/files/{file_id}
///
/// Streams the stored bytes back with the derived content type.
pub async fn download(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((achievement_id, attachment_id)): Path<(DbId, DbId)>,
) -> AppResult<Response> {
    let download = state
        .attachments
        .download(&auth.actor(), achievement_id, attachment_id)
        .await?;

    let content_type = HeaderValue::from_str(&download.attachment.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        download.attachment.file_name.replace('"', "")
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        download.bytes,
    )
        .into_response())
}

/// DELETE /api/v1/achievements/{id}/files/{file_id}
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((achievement_id, attachment_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    let removal = state
        .attachments
        .delete(&auth.actor(), achievement_id, attachment_id)
        .await?;

    if !removal.blob_removed {
        tracing::warn!(achievement_id, attachment_id, "Attachment bytes were not removed");
    }
    tracing::info!(
        user_id = auth.user_id,
        achievement_id,
        attachment_id,
        "Attachment deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}
