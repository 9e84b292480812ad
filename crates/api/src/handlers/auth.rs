//! Handlers for the `/auth` resource.

use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use laurel_db::models::refresh_token::{ClientMeta, SessionInfo};
use laurel_db::models::user::UserResponse;
use serde::{Deserialize, Serialize};

use crate::auth::jwt::TokenPair;
use crate::error::AppResult;
use crate::middleware::auth::{bearer_token, require_bearer_token};
use crate::response::{DataResponse, MessageResponse};
use crate::session::LogoutOutcome;
use crate::state::AppState;

/// Header carrying out-of-band warnings on otherwise successful responses.
pub const WARNING_HEADER: &str = "x-warning";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/refresh` and `POST /auth/revoke`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Successful login payload.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: UserResponse,
}

/// Payload for `POST /auth/logout-all`.
#[derive(Debug, Serialize)]
pub struct RevokedCount {
    pub revoked: u64,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<DataResponse<LoginResponse>>> {
    let outcome = state
        .sessions
        .login(&input.email, &input.password, &client_meta(&headers))
        .await?;

    tracing::info!(user_id = outcome.user.id, role = %outcome.user.role, "User logged in");
    Ok(Json(DataResponse {
        data: LoginResponse {
            tokens: outcome.tokens,
            user: outcome.user,
        },
    }))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a refresh token for a new pair; the presented token is revoked.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<DataResponse<TokenPair>>> {
    let outcome = state
        .sessions
        .refresh(&input.refresh_token, &client_meta(&headers))
        .await?;

    if !outcome.metadata_recorded {
        tracing::warn!("Refresh succeeded but usage metadata was not recorded");
    }
    Ok(Json(DataResponse {
        data: outcome.tokens,
    }))
}

/// POST /api/v1/auth/logout
///
/// Revokes every session of the caller. Always answers 200; a failed
/// revocation is reported in the `X-Warning` header.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let outcome = state.sessions.logout(bearer_token(&headers)).await;
    let body = Json(DataResponse {
        data: MessageResponse {
            message: "Logged out",
        },
    });

    match outcome {
        LogoutOutcome::Revoked(count) => {
            tracing::info!(revoked = count, "User logged out");
            (StatusCode::OK, body).into_response()
        }
        LogoutOutcome::Anonymous => {
            tracing::debug!("Logout without a usable access token");
            (StatusCode::OK, body).into_response()
        }
        LogoutOutcome::RevocationFailed(error) => {
            tracing::warn!(%error, "Logout could not revoke sessions");
            let mut response = (StatusCode::OK, body).into_response();
            response.headers_mut().insert(
                WARNING_HEADER,
                HeaderValue::from_static("session revocation failed; sessions expire naturally"),
            );
            response
        }
    }
}

/// POST /api/v1/auth/logout-all
pub async fn logout_all(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<DataResponse<RevokedCount>>> {
    let token = require_bearer_token(&headers)?;
    let revoked = state.sessions.logout_all(token).await?;

    tracing::info!(revoked, "User revoked all sessions");
    Ok(Json(DataResponse {
        data: RevokedCount { revoked },
    }))
}

/// GET /api/v1/auth/sessions
pub async fn list_sessions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<DataResponse<Vec<SessionInfo>>>> {
    let token = require_bearer_token(&headers)?;
    let sessions = state.sessions.list_active_sessions(token).await?;
    Ok(Json(DataResponse { data: sessions }))
}

/// POST /api/v1/auth/revoke
///
/// Sign out the single device holding this refresh token.
pub async fn revoke_session(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<StatusCode> {
    state.sessions.revoke_session(&input.refresh_token).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Client address and agent, as reported by the proxy in front of us.
pub fn client_meta(headers: &HeaderMap) -> ClientMeta {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let ip_address = header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .or_else(|| header("x-real-ip"))
        .map(str::to_string);

    ClientMeta {
        ip_address,
        user_agent: header("user-agent").map(str::to_string),
    }
}
