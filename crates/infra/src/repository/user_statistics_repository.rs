//! # UserStatisticsRepository
//!
//! 学習統計の永続化を担当するリポジトリ。主キーは `user_id`。
//!
//! `accuracy` は DB 上 `NUMERIC(5,2)`。読み出しは `float8` にキャストし、
//! 書き込みは `f64` をバインドして `NUMERIC(5,2)` にキャストする。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lexitrack_domain::{
    pagination::Pagination,
    statistics::{StatisticsValues, UserStatistics},
    user::UserId,
    value_objects::{Accuracy, Count},
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// 学習統計リポジトリトレイト
#[async_trait]
pub trait UserStatisticsRepository: Send + Sync {
    /// 参照先ユーザーが存在しなければ `ForeignKey`、既に存在すれば `Conflict`
    async fn insert(&self, statistics: &UserStatistics) -> Result<(), InfraError>;

    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Option<UserStatistics>, InfraError>;

    async fn list(&self, page: Pagination) -> Result<Vec<UserStatistics>, InfraError>;

    async fn update(&self, statistics: &UserStatistics) -> Result<bool, InfraError>;

    async fn delete(&self, user_id: &UserId) -> Result<bool, InfraError>;
}

#[derive(sqlx::FromRow)]
struct UserStatisticsRow {
    user_id:             Uuid,
    total_words_learned: i32,
    accuracy:            f64,
    total_time:          i32,
    created_at:          DateTime<Utc>,
    updated_at:          DateTime<Utc>,
}

impl TryFrom<UserStatisticsRow> for UserStatistics {
    type Error = InfraError;

    fn try_from(row: UserStatisticsRow) -> Result<Self, Self::Error> {
        let to_infra = |e: lexitrack_domain::DomainError| InfraError::unexpected(e.to_string());
        Ok(UserStatistics::from_db(
            UserId::from_uuid(row.user_id),
            StatisticsValues {
                total_words_learned: Count::new("total_words_learned", row.total_words_learned)
                    .map_err(to_infra)?,
                accuracy:            Accuracy::new(row.accuracy).map_err(to_infra)?,
                total_time:          Count::new("total_time", row.total_time).map_err(to_infra)?,
            },
            row.created_at,
            row.updated_at,
        ))
    }
}

const SELECT_STATISTICS: &str = r#"
    SELECT user_id, total_words_learned, accuracy::float8 AS accuracy, total_time,
           created_at, updated_at
    FROM user_statistics
"#;

/// PostgreSQL 実装の UserStatisticsRepository
#[derive(Debug, Clone)]
pub struct PostgresUserStatisticsRepository {
    pool: PgPool,
}

impl PostgresUserStatisticsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStatisticsRepository for PostgresUserStatisticsRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(user_id = %statistics.user_id()))]
    async fn insert(&self, statistics: &UserStatistics) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO user_statistics
                (user_id, total_words_learned, accuracy, total_time, created_at, updated_at)
            VALUES ($1, $2, CAST($3 AS NUMERIC(5,2)), $4, $5, $6)
            "#,
        )
        .bind(statistics.user_id().as_uuid())
        .bind(statistics.total_words_learned().as_i32())
        .bind(statistics.accuracy().as_f64())
        .bind(statistics.total_time().as_i32())
        .bind(statistics.created_at())
        .bind(statistics.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(user_id = %user_id))]
    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Option<UserStatistics>, InfraError> {
        let row = sqlx::query_as::<_, UserStatisticsRow>(&format!(
            "{SELECT_STATISTICS} WHERE user_id = $1"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserStatistics::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(limit = page.limit(), offset = page.offset()))]
    async fn list(&self, page: Pagination) -> Result<Vec<UserStatistics>, InfraError> {
        let rows = sqlx::query_as::<_, UserStatisticsRow>(&format!(
            "{SELECT_STATISTICS} ORDER BY created_at DESC, user_id LIMIT $1 OFFSET $2"
        ))
        .bind(i64::from(page.limit()))
        .bind(i64::from(page.offset()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(UserStatistics::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(user_id = %statistics.user_id()))]
    async fn update(&self, statistics: &UserStatistics) -> Result<bool, InfraError> {
        let result = sqlx::query(
            r#"
            UPDATE user_statistics
            SET total_words_learned = $2,
                accuracy = CAST($3 AS NUMERIC(5,2)),
                total_time = $4,
                updated_at = $5
            WHERE user_id = $1
            "#,
        )
        .bind(statistics.user_id().as_uuid())
        .bind(statistics.total_words_learned().as_i32())
        .bind(statistics.accuracy().as_f64())
        .bind(statistics.total_time().as_i32())
        .bind(statistics.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(user_id = %user_id))]
    async fn delete(&self, user_id: &UserId) -> Result<bool, InfraError> {
        let result = sqlx::query("DELETE FROM user_statistics WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
