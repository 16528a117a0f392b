//! # 単語セット割り当て API ハンドラ

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use lexitrack_domain::{
    user::UserId,
    word_set::{UserWordSet, UserWordSetId, WordSetId},
};
use lexitrack_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{PageQuery, paginated};
use crate::{
    error::ApiError,
    extract::{ValidJson, ValidQuery, parse_uuid},
    usecase::{CreateWordSetInput, WordSetUseCaseImpl},
};

pub struct WordSetState {
    pub usecase: WordSetUseCaseImpl,
}

#[derive(Debug, Deserialize)]
pub struct CreateWordSetRequest {
    pub user_id:     Uuid,
    pub word_set_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UpdateWordSetRequest {
    pub word_set_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct WordSetDto {
    pub id:          String,
    pub user_id:     String,
    pub word_set_id: String,
    pub created_at:  String,
}

impl WordSetDto {
    fn from_word_set(word_set: &UserWordSet) -> Self {
        Self {
            id:          word_set.id().to_string(),
            user_id:     word_set.user_id().to_string(),
            word_set_id: word_set.word_set_id().to_string(),
            created_at:  word_set.created_at().to_rfc3339(),
        }
    }
}

fn user_word_set_id(value: &str) -> Result<UserWordSetId, ApiError> {
    parse_uuid("id", value).map(UserWordSetId::from_uuid)
}

/// POST /api/v1/word-sets
#[tracing::instrument(skip_all)]
pub async fn create_word_set(
    State(state): State<Arc<WordSetState>>,
    ValidJson(req): ValidJson<CreateWordSetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = CreateWordSetInput {
        user_id:     UserId::from_uuid(req.user_id),
        word_set_id: WordSetId::from_uuid(req.word_set_id),
    };

    let word_set = state.usecase.create_word_set(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(WordSetDto::from_word_set(&word_set))),
    ))
}

/// GET /api/v1/word-sets/{id}
#[tracing::instrument(skip_all, fields(%id))]
pub async fn get_word_set(
    State(state): State<Arc<WordSetState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let word_set = state.usecase.get_word_set(user_word_set_id(&id)?).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(WordSetDto::from_word_set(&word_set))),
    ))
}

/// GET /api/v1/users/{user_id}/word-sets
#[tracing::instrument(skip_all, fields(%user_id))]
pub async fn list_word_sets(
    State(state): State<Arc<WordSetState>>,
    Path(user_id): Path<String>,
    ValidQuery(query): ValidQuery<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = UserId::from_uuid(parse_uuid("user_id", &user_id)?);

    let (items, page) = state
        .usecase
        .list_word_sets(user_id, query.limit, query.offset)
        .await?;

    Ok((
        StatusCode::OK,
        Json(paginated(&items, page, WordSetDto::from_word_set)),
    ))
}

/// PUT /api/v1/word-sets/{id}
#[tracing::instrument(skip_all, fields(%id))]
pub async fn update_word_set(
    State(state): State<Arc<WordSetState>>,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<UpdateWordSetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let word_set = state
        .usecase
        .update_word_set(user_word_set_id(&id)?, WordSetId::from_uuid(req.word_set_id))
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(WordSetDto::from_word_set(&word_set))),
    ))
}

/// DELETE /api/v1/word-sets/{id}
#[tracing::instrument(skip_all, fields(%id))]
pub async fn delete_word_set(
    State(state): State<Arc<WordSetState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.usecase.delete_word_set(user_word_set_id(&id)?).await?;

    Ok(StatusCode::NO_CONTENT)
}
