//! # ユーザー API ハンドラ

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use lexitrack_domain::user::{User, UserId};
use lexitrack_shared::ApiResponse;
use serde::{Deserialize, Serialize};

use super::{PageQuery, paginated};
use crate::{
    error::ApiError,
    extract::{ValidJson, ValidQuery, parse_uuid},
    usecase::{UserInput, UserUseCaseImpl},
};

/// ユーザーハンドラーの State
pub struct UserState {
    pub usecase: UserUseCaseImpl,
}

/// ユーザー作成・更新リクエスト
#[derive(Debug, Deserialize)]
pub struct UserRequest {
    pub username: String,
    pub email:    String,
}

impl From<UserRequest> for UserInput {
    fn from(req: UserRequest) -> Self {
        Self {
            username: req.username,
            email:    req.email,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id:         String,
    pub username:   String,
    pub email:      String,
    pub created_at: String,
    pub updated_at: String,
}

impl UserDto {
    fn from_user(user: &User) -> Self {
        Self {
            id:         user.id().to_string(),
            username:   user.username().as_str().to_string(),
            email:      user.email().as_str().to_string(),
            created_at: user.created_at().to_rfc3339(),
            updated_at: user.updated_at().to_rfc3339(),
        }
    }
}

fn user_id(value: &str) -> Result<UserId, ApiError> {
    parse_uuid("id", value).map(UserId::from_uuid)
}

/// POST /api/v1/users
#[tracing::instrument(skip_all)]
pub async fn create_user(
    State(state): State<Arc<UserState>>,
    ValidJson(req): ValidJson<UserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.usecase.create_user(req.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(UserDto::from_user(&user))),
    ))
}

/// GET /api/v1/users?limit={limit}&offset={offset}
#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<Arc<UserState>>,
    ValidQuery(query): ValidQuery<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (users, page) = state.usecase.list_users(query.limit, query.offset).await?;

    Ok((StatusCode::OK, Json(paginated(&users, page, UserDto::from_user))))
}

/// GET /api/v1/users/{user_id}
#[tracing::instrument(skip_all, fields(%id))]
pub async fn get_user(
    State(state): State<Arc<UserState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.usecase.get_user(user_id(&id)?).await?;

    Ok((StatusCode::OK, Json(ApiResponse::new(UserDto::from_user(&user)))))
}

/// GET /api/v1/users/email/{email}
///
/// パスにメールアドレスを含むため、span には記録しない。
#[tracing::instrument(skip_all)]
pub async fn get_user_by_email(
    State(state): State<Arc<UserState>>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.usecase.get_user_by_email(email).await?;

    Ok((StatusCode::OK, Json(ApiResponse::new(UserDto::from_user(&user)))))
}

/// PUT /api/v1/users/{user_id}
#[tracing::instrument(skip_all, fields(%id))]
pub async fn update_user(
    State(state): State<Arc<UserState>>,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<UserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.usecase.update_user(user_id(&id)?, req.into()).await?;

    Ok((StatusCode::OK, Json(ApiResponse::new(UserDto::from_user(&user)))))
}

/// DELETE /api/v1/users/{user_id}
#[tracing::instrument(skip_all, fields(%id))]
pub async fn delete_user(
    State(state): State<Arc<UserState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.usecase.delete_user(user_id(&id)?).await?;

    Ok(StatusCode::NO_CONTENT)
}
