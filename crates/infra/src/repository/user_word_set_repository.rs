//! # UserWordSetRepository
//!
//! 単語セット割り当ての永続化を担当するリポジトリ。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lexitrack_domain::{
    pagination::Pagination,
    user::UserId,
    word_set::{UserWordSet, UserWordSetId, WordSetId},
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// 単語セット割り当てリポジトリトレイト
#[async_trait]
pub trait UserWordSetRepository: Send + Sync {
    async fn insert(&self, word_set: &UserWordSet) -> Result<(), InfraError>;

    async fn find_by_id(&self, id: &UserWordSetId) -> Result<Option<UserWordSet>, InfraError>;

    async fn list_by_user(
        &self,
        user_id: &UserId,
        page: Pagination,
    ) -> Result<Vec<UserWordSet>, InfraError>;

    /// 割り当てる単語セットを差し替える
    async fn update(&self, word_set: &UserWordSet) -> Result<bool, InfraError>;

    async fn delete(&self, id: &UserWordSetId) -> Result<bool, InfraError>;
}

#[derive(sqlx::FromRow)]
struct UserWordSetRow {
    id:          Uuid,
    user_id:     Uuid,
    word_set_id: Uuid,
    created_at:  DateTime<Utc>,
}

impl From<UserWordSetRow> for UserWordSet {
    fn from(row: UserWordSetRow) -> Self {
        UserWordSet::new(
            UserWordSetId::from_uuid(row.id),
            UserId::from_uuid(row.user_id),
            WordSetId::from_uuid(row.word_set_id),
            row.created_at,
        )
    }
}

const SELECT_WORD_SET: &str = "SELECT id, user_id, word_set_id, created_at FROM user_word_sets";

/// PostgreSQL 実装の UserWordSetRepository
#[derive(Debug, Clone)]
pub struct PostgresUserWordSetRepository {
    pool: PgPool,
}

impl PostgresUserWordSetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserWordSetRepository for PostgresUserWordSetRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(user_word_set_id = %word_set.id()))]
    async fn insert(&self, word_set: &UserWordSet) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO user_word_sets (id, user_id, word_set_id, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(word_set.id().as_uuid())
        .bind(word_set.user_id().as_uuid())
        .bind(word_set.word_set_id().as_uuid())
        .bind(word_set.created_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(user_word_set_id = %id))]
    async fn find_by_id(&self, id: &UserWordSetId) -> Result<Option<UserWordSet>, InfraError> {
        let row = sqlx::query_as::<_, UserWordSetRow>(&format!("{SELECT_WORD_SET} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(UserWordSet::from))
    }

    #[tracing::instrument(skip_all, level = "debug", fields(user_id = %user_id))]
    async fn list_by_user(
        &self,
        user_id: &UserId,
        page: Pagination,
    ) -> Result<Vec<UserWordSet>, InfraError> {
        let rows = sqlx::query_as::<_, UserWordSetRow>(&format!(
            "{SELECT_WORD_SET} WHERE user_id = $1 ORDER BY created_at DESC, id LIMIT $2 OFFSET $3"
        ))
        .bind(user_id.as_uuid())
        .bind(i64::from(page.limit()))
        .bind(i64::from(page.offset()))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(UserWordSet::from).collect())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(user_word_set_id = %word_set.id()))]
    async fn update(&self, word_set: &UserWordSet) -> Result<bool, InfraError> {
        let result = sqlx::query("UPDATE user_word_sets SET word_set_id = $2 WHERE id = $1")
            .bind(word_set.id().as_uuid())
            .bind(word_set.word_set_id().as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(user_word_set_id = %id))]
    async fn delete(&self, id: &UserWordSetId) -> Result<bool, InfraError> {
        let result = sqlx::query("DELETE FROM user_word_sets WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
