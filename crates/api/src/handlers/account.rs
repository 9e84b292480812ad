//! Handlers for user accounts and advisor assignment.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use laurel_core::types::DbId;
use laurel_db::models::user::{UserFilter, UserResponse};
use serde::Deserialize;

use crate::accounts::{NewAccount, ProfileUpdate};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `PUT /admin/users/{id}/advisor`.
#[derive(Debug, Deserialize)]
pub struct AssignAdvisorRequest {
    pub advisor_id: DbId,
}

/// Request body for `PUT /admin/users/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

/// GET /api/v1/users/me
pub async fn me(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = state.accounts.profile(&auth.actor()).await?;
    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

/// PUT /api/v1/users/me
pub async fn update_me(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<ProfileUpdate>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let password_changed = input.password.is_some();
    let user = state.accounts.update_profile(&auth.actor(), input).await?;

    tracing::info!(user_id = user.id, password_changed, "Profile updated");
    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

/// GET /api/v1/admin/users?role=&search=&active_only=
pub async fn list_users(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Query(filter): Query<UserFilter>,
) -> AppResult<Json<DataResponse<Vec<UserResponse>>>> {
    let users = state.accounts.list_users(&admin.actor(), &filter).await?;
    Ok(Json(DataResponse {
        data: users.iter().map(UserResponse::from).collect(),
    }))
}

/// POST /api/v1/admin/users
pub async fn create_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<NewAccount>,
) -> AppResult<impl IntoResponse> {
    let user = state.accounts.create_user(&admin.actor(), input).await?;

    tracing::info!(
        admin_id = admin.user_id,
        user_id = user.id,
        role = %user.role,
        "User created"
    );
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: UserResponse::from(&user),
        }),
    ))
}

/// PUT /api/v1/admin/users/{id}/advisor
pub async fn assign_advisor(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(student_id): Path<DbId>,
    Json(input): Json<AssignAdvisorRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let student = state
        .accounts
        .assign_advisor(&admin.actor(), student_id, input.advisor_id)
        .await?;

    tracing::info!(
        admin_id = admin.user_id,
        student_id,
        advisor_id = input.advisor_id,
        "Advisor assigned"
    );
    Ok(Json(DataResponse {
        data: UserResponse::from(&student),
    }))
}

/// PUT /api/v1/admin/users/{id}/status
pub async fn set_active(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
    Json(input): Json<SetActiveRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = state
        .accounts
        .set_active(&admin.actor(), user_id, input.is_active)
        .await?;

    tracing::info!(
        admin_id = admin.user_id,
        user_id,
        is_active = input.is_active,
        "User activation changed"
    );
    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

/// DELETE /api/v1/admin/users/{id}
pub async fn delete_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.accounts.delete_user(&admin.actor(), user_id).await?;

    tracing::info!(admin_id = admin.user_id, user_id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/advisors
pub async fn list_advisors(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<UserResponse>>>> {
    let advisors = state.accounts.list_advisors(&admin.actor()).await?;
    Ok(Json(DataResponse {
        data: advisors.iter().map(UserResponse::from).collect(),
    }))
}

/// GET /api/v1/advisors/{id}/advisees
pub async fn list_advisees(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(advisor_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<UserResponse>>>> {
    let users = state
        .accounts
        .list_advisees(&auth.actor(), advisor_id)
        .await?;
    Ok(Json(DataResponse {
        data: users.iter().map(UserResponse::from).collect(),
    }))
}
