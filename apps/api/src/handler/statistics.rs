//! # 学習統計 API ハンドラ
//!
//! 統計はユーザーごとに 1 件のため、パスの ID はユーザー ID。

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use lexitrack_domain::{statistics::UserStatistics, user::UserId};
use lexitrack_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{PageQuery, paginated};
use crate::{
    error::ApiError,
    extract::{ValidJson, ValidQuery, parse_uuid},
    usecase::{StatisticsInput, StatisticsUseCaseImpl},
};

pub struct StatisticsState {
    pub usecase: StatisticsUseCaseImpl,
}

/// 集計値（省略した項目は 0）
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StatisticsValuesRequest {
    pub total_words_learned: i32,
    pub accuracy:            f64,
    pub total_time:          i32,
}

impl From<StatisticsValuesRequest> for StatisticsInput {
    fn from(req: StatisticsValuesRequest) -> Self {
        Self {
            total_words_learned: req.total_words_learned,
            accuracy:            req.accuracy,
            total_time:          req.total_time,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateStatisticsRequest {
    pub user_id:             Uuid,
    #[serde(default)]
    pub total_words_learned: i32,
    #[serde(default)]
    pub accuracy:            f64,
    #[serde(default)]
    pub total_time:          i32,
}

#[derive(Debug, Serialize)]
pub struct StatisticsDto {
    pub user_id:             String,
    pub total_words_learned: i32,
    pub accuracy:            f64,
    pub total_time:          i32,
    pub created_at:          String,
    pub updated_at:          String,
}

impl StatisticsDto {
    fn from_statistics(statistics: &UserStatistics) -> Self {
        Self {
            user_id:             statistics.user_id().to_string(),
            total_words_learned: statistics.total_words_learned().as_i32(),
            accuracy:            statistics.accuracy().as_f64(),
            total_time:          statistics.total_time().as_i32(),
            created_at:          statistics.created_at().to_rfc3339(),
            updated_at:          statistics.updated_at().to_rfc3339(),
        }
    }
}

fn parse_user_id(value: &str) -> Result<UserId, ApiError> {
    parse_uuid("user_id", value).map(UserId::from_uuid)
}

/// POST /api/v1/statistics
#[tracing::instrument(skip_all)]
pub async fn create_statistics(
    State(state): State<Arc<StatisticsState>>,
    ValidJson(req): ValidJson<CreateStatisticsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let statistics = state
        .usecase
        .create_statistics(
            UserId::from_uuid(req.user_id),
            StatisticsInput {
                total_words_learned: req.total_words_learned,
                accuracy:            req.accuracy,
                total_time:          req.total_time,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatisticsDto::from_statistics(&statistics))),
    ))
}

/// GET /api/v1/statistics
#[tracing::instrument(skip_all)]
pub async fn list_statistics(
    State(state): State<Arc<StatisticsState>>,
    ValidQuery(query): ValidQuery<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, page) = state
        .usecase
        .list_statistics(query.limit, query.offset)
        .await?;

    Ok((
        StatusCode::OK,
        Json(paginated(&items, page, StatisticsDto::from_statistics)),
    ))
}

/// GET /api/v1/statistics/{user_id}
#[tracing::instrument(skip_all, fields(%user_id))]
pub async fn get_statistics(
    State(state): State<Arc<StatisticsState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let statistics = state.usecase.get_statistics(parse_user_id(&user_id)?).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(StatisticsDto::from_statistics(&statistics))),
    ))
}

/// PUT /api/v1/statistics/{user_id}
#[tracing::instrument(skip_all, fields(%user_id))]
pub async fn update_statistics(
    State(state): State<Arc<StatisticsState>>,
    Path(user_id): Path<String>,
    ValidJson(req): ValidJson<StatisticsValuesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let statistics = state
        .usecase
        .update_statistics(parse_user_id(&user_id)?, req.into())
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(StatisticsDto::from_statistics(&statistics))),
    ))
}

/// DELETE /api/v1/statistics/{user_id}
#[tracing::instrument(skip_all, fields(%user_id))]
pub async fn delete_statistics(
    State(state): State<Arc<StatisticsState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .usecase
        .delete_statistics(parse_user_id(&user_id)?)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
