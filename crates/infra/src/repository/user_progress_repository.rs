//! # UserProgressRepository
//!
//! 単語ごとの学習進捗の永続化を担当するリポジトリ。
//! `(user_id, word_id)` の重複は一意制約違反として返る。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lexitrack_domain::{
    pagination::Pagination,
    progress::{ProgressId, UserProgress, WordId},
    user::UserId,
    value_objects::Count,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// 学習進捗リポジトリトレイト
#[async_trait]
pub trait UserProgressRepository: Send + Sync {
    async fn insert(&self, progress: &UserProgress) -> Result<(), InfraError>;

    async fn find_by_id(&self, id: &ProgressId) -> Result<Option<UserProgress>, InfraError>;

    async fn find_by_user_and_word(
        &self,
        user_id: &UserId,
        word_id: &WordId,
    ) -> Result<Option<UserProgress>, InfraError>;

    async fn list_by_user(
        &self,
        user_id: &UserId,
        page: Pagination,
    ) -> Result<Vec<UserProgress>, InfraError>;

    /// 正誤回数と更新日時を保存する
    async fn update(&self, progress: &UserProgress) -> Result<bool, InfraError>;

    async fn delete(&self, id: &ProgressId) -> Result<bool, InfraError>;
}

#[derive(sqlx::FromRow)]
struct UserProgressRow {
    id:              Uuid,
    user_id:         Uuid,
    word_id:         Uuid,
    correct_count:   i32,
    incorrect_count: i32,
    created_at:      DateTime<Utc>,
    updated_at:      DateTime<Utc>,
}

impl TryFrom<UserProgressRow> for UserProgress {
    type Error = InfraError;

    fn try_from(row: UserProgressRow) -> Result<Self, Self::Error> {
        Ok(UserProgress::from_db(
            ProgressId::from_uuid(row.id),
            UserId::from_uuid(row.user_id),
            WordId::from_uuid(row.word_id),
            Count::new("correct_count", row.correct_count)
                .map_err(|e| InfraError::unexpected(e.to_string()))?,
            Count::new("incorrect_count", row.incorrect_count)
                .map_err(|e| InfraError::unexpected(e.to_string()))?,
            row.created_at,
            row.updated_at,
        ))
    }
}

const SELECT_PROGRESS: &str = r#"
    SELECT id, user_id, word_id, correct_count, incorrect_count, created_at, updated_at
    FROM user_progress
"#;

/// PostgreSQL 実装の UserProgressRepository
#[derive(Debug, Clone)]
pub struct PostgresUserProgressRepository {
    pool: PgPool,
}

impl PostgresUserProgressRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserProgressRepository for PostgresUserProgressRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(progress_id = %progress.id()))]
    async fn insert(&self, progress: &UserProgress) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO user_progress
                (id, user_id, word_id, correct_count, incorrect_count, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(progress.id().as_uuid())
        .bind(progress.user_id().as_uuid())
        .bind(progress.word_id().as_uuid())
        .bind(progress.correct_count().as_i32())
        .bind(progress.incorrect_count().as_i32())
        .bind(progress.created_at())
        .bind(progress.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(progress_id = %id))]
    async fn find_by_id(&self, id: &ProgressId) -> Result<Option<UserProgress>, InfraError> {
        let row = sqlx::query_as::<_, UserProgressRow>(&format!("{SELECT_PROGRESS} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserProgress::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(user_id = %user_id, word_id = %word_id))]
    async fn find_by_user_and_word(
        &self,
        user_id: &UserId,
        word_id: &WordId,
    ) -> Result<Option<UserProgress>, InfraError> {
        let row = sqlx::query_as::<_, UserProgressRow>(&format!(
            "{SELECT_PROGRESS} WHERE user_id = $1 AND word_id = $2"
        ))
        .bind(user_id.as_uuid())
        .bind(word_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserProgress::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(user_id = %user_id))]
    async fn list_by_user(
        &self,
        user_id: &UserId,
        page: Pagination,
    ) -> Result<Vec<UserProgress>, InfraError> {
        let rows = sqlx::query_as::<_, UserProgressRow>(&format!(
            "{SELECT_PROGRESS} WHERE user_id = $1 ORDER BY created_at DESC, id LIMIT $2 OFFSET $3"
        ))
        .bind(user_id.as_uuid())
        .bind(i64::from(page.limit()))
        .bind(i64::from(page.offset()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(UserProgress::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(progress_id = %progress.id()))]
    async fn update(&self, progress: &UserProgress) -> Result<bool, InfraError> {
        let result = sqlx::query(
            r#"
            UPDATE user_progress
            SET correct_count = $2, incorrect_count = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(progress.id().as_uuid())
        .bind(progress.correct_count().as_i32())
        .bind(progress.incorrect_count().as_i32())
        .bind(progress.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(progress_id = %id))]
    async fn delete(&self, id: &ProgressId) -> Result<bool, InfraError> {
        let result = sqlx::query("DELETE FROM user_progress WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
