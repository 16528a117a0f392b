//! # 学習進捗 API ハンドラ

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use lexitrack_domain::{
    progress::{ProgressId, UserProgress, WordId},
    user::UserId,
};
use lexitrack_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{PageQuery, paginated};
use crate::{
    error::ApiError,
    extract::{ValidJson, ValidQuery, parse_uuid},
    usecase::{CreateProgressInput, ProgressUseCaseImpl, UpdateProgressInput},
};

pub struct ProgressState {
    pub usecase: ProgressUseCaseImpl,
}

#[derive(Debug, Deserialize)]
pub struct CreateProgressRequest {
    pub user_id:         Uuid,
    pub word_id:         Uuid,
    #[serde(default)]
    pub correct_count:   i32,
    #[serde(default)]
    pub incorrect_count: i32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateProgressRequest {
    pub correct_count:   i32,
    pub incorrect_count: i32,
}

#[derive(Debug, Serialize)]
pub struct ProgressDto {
    pub id:              String,
    pub user_id:         String,
    pub word_id:         String,
    pub correct_count:   i32,
    pub incorrect_count: i32,
    pub created_at:      String,
    pub updated_at:      String,
}

impl ProgressDto {
    fn from_progress(progress: &UserProgress) -> Self {
        Self {
            id:              progress.id().to_string(),
            user_id:         progress.user_id().to_string(),
            word_id:         progress.word_id().to_string(),
            correct_count:   progress.correct_count().as_i32(),
            incorrect_count: progress.incorrect_count().as_i32(),
            created_at:      progress.created_at().to_rfc3339(),
            updated_at:      progress.updated_at().to_rfc3339(),
        }
    }
}

fn progress_id(value: &str) -> Result<ProgressId, ApiError> {
    parse_uuid("id", value).map(ProgressId::from_uuid)
}

/// POST /api/v1/progress
#[tracing::instrument(skip_all)]
pub async fn create_progress(
    State(state): State<Arc<ProgressState>>,
    ValidJson(req): ValidJson<CreateProgressRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = CreateProgressInput {
        user_id:         UserId::from_uuid(req.user_id),
        word_id:         WordId::from_uuid(req.word_id),
        correct_count:   req.correct_count,
        incorrect_count: req.incorrect_count,
    };

    let progress = state.usecase.create_progress(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(ProgressDto::from_progress(&progress))),
    ))
}

/// GET /api/v1/progress/{id}
#[tracing::instrument(skip_all, fields(%id))]
pub async fn get_progress(
    State(state): State<Arc<ProgressState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let progress = state.usecase.get_progress(progress_id(&id)?).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(ProgressDto::from_progress(&progress))),
    ))
}

/// GET /api/v1/users/{user_id}/progress/{word_id}
#[tracing::instrument(skip_all, fields(%user_id, %word_id))]
pub async fn get_progress_by_word(
    State(state): State<Arc<ProgressState>>,
    Path((user_id, word_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = UserId::from_uuid(parse_uuid("user_id", &user_id)?);
    let word_id = WordId::from_uuid(parse_uuid("word_id", &word_id)?);

    let progress = state
        .usecase
        .get_progress_by_word(user_id, word_id)
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(ProgressDto::from_progress(&progress))),
    ))
}

/// GET /api/v1/users/{user_id}/progress
#[tracing::instrument(skip_all, fields(%user_id))]
pub async fn list_progress(
    State(state): State<Arc<ProgressState>>,
    Path(user_id): Path<String>,
    ValidQuery(query): ValidQuery<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = UserId::from_uuid(parse_uuid("user_id", &user_id)?);

    let (items, page) = state
        .usecase
        .list_progress(user_id, query.limit, query.offset)
        .await?;

    Ok((
        StatusCode::OK,
        Json(paginated(&items, page, ProgressDto::from_progress)),
    ))
}

/// PUT /api/v1/progress/{id}
#[tracing::instrument(skip_all, fields(%id))]
pub async fn update_progress(
    State(state): State<Arc<ProgressState>>,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<UpdateProgressRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = UpdateProgressInput {
        correct_count:   req.correct_count,
        incorrect_count: req.incorrect_count,
    };

    let progress = state
        .usecase
        .update_progress(progress_id(&id)?, input)
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(ProgressDto::from_progress(&progress))),
    ))
}

/// DELETE /api/v1/progress/{id}
#[tracing::instrument(skip_all, fields(%id))]
pub async fn delete_progress(
    State(state): State<Arc<ProgressState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.usecase.delete_progress(progress_id(&id)?).await?;

    Ok(StatusCode::NO_CONTENT)
}
