//! # 学習セッション API ハンドラ

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use lexitrack_domain::{
    session::{SessionId, UserSession},
    user::UserId,
};
use lexitrack_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{PageQuery, paginated};
use crate::{
    error::ApiError,
    extract::{ValidJson, ValidQuery, parse_uuid},
    usecase::{CreateSessionInput, SessionUseCaseImpl, UpdateSessionInput},
};

pub struct SessionState {
    pub usecase: SessionUseCaseImpl,
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub user_id: Uuid,
    /// `active` / `completed`（省略時は `active`）
    #[serde(default)]
    pub status:  Option<String>,
}

/// `ended_at` は RFC 3339
#[derive(Debug, Deserialize)]
pub struct UpdateSessionRequest {
    pub status:   String,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct SessionDto {
    pub id:         String,
    pub user_id:    String,
    pub status:     String,
    pub started_at: String,
    pub ended_at:   Option<String>,
}

impl SessionDto {
    fn from_session(session: &UserSession) -> Self {
        Self {
            id:         session.id().to_string(),
            user_id:    session.user_id().to_string(),
            status:     session.status().as_str().to_string(),
            started_at: session.started_at().to_rfc3339(),
            ended_at:   session.ended_at().map(|t| t.to_rfc3339()),
        }
    }
}

fn session_id(value: &str) -> Result<SessionId, ApiError> {
    parse_uuid("id", value).map(SessionId::from_uuid)
}

/// POST /api/v1/sessions
#[tracing::instrument(skip_all)]
pub async fn create_session(
    State(state): State<Arc<SessionState>>,
    ValidJson(req): ValidJson<CreateSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = CreateSessionInput {
        user_id: UserId::from_uuid(req.user_id),
        status:  req.status,
    };

    let session = state.usecase.create_session(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(SessionDto::from_session(&session))),
    ))
}

/// GET /api/v1/sessions/{id}
#[tracing::instrument(skip_all, fields(%id))]
pub async fn get_session(
    State(state): State<Arc<SessionState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.usecase.get_session(session_id(&id)?).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(SessionDto::from_session(&session))),
    ))
}

/// GET /api/v1/users/{user_id}/sessions
#[tracing::instrument(skip_all, fields(%user_id))]
pub async fn list_sessions(
    State(state): State<Arc<SessionState>>,
    Path(user_id): Path<String>,
    ValidQuery(query): ValidQuery<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = UserId::from_uuid(parse_uuid("user_id", &user_id)?);

    let (items, page) = state
        .usecase
        .list_sessions(user_id, query.limit, query.offset)
        .await?;

    Ok((
        StatusCode::OK,
        Json(paginated(&items, page, SessionDto::from_session)),
    ))
}

/// GET /api/v1/sessions/active
#[tracing::instrument(skip_all)]
pub async fn list_active_sessions(
    State(state): State<Arc<SessionState>>,
    ValidQuery(query): ValidQuery<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, page) = state
        .usecase
        .list_active_sessions(query.limit, query.offset)
        .await?;

    Ok((
        StatusCode::OK,
        Json(paginated(&items, page, SessionDto::from_session)),
    ))
}

/// PUT /api/v1/sessions/{id}
#[tracing::instrument(skip_all, fields(%id))]
pub async fn update_session(
    State(state): State<Arc<SessionState>>,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<UpdateSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = UpdateSessionInput {
        status:   req.status,
        ended_at: req.ended_at,
    };

    let session = state
        .usecase
        .update_session(session_id(&id)?, input)
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(SessionDto::from_session(&session))),
    ))
}

/// DELETE /api/v1/sessions/{id}
#[tracing::instrument(skip_all, fields(%id))]
pub async fn delete_session(
    State(state): State<Arc<SessionState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.usecase.delete_session(session_id(&id)?).await?;

    Ok(StatusCode::NO_CONTENT)
}
