//! # UserRepository
//!
//! ユーザーの永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **実行時クエリ**: `sqlx::query_as` + `FromRow` の中間構造体で受け、
//!   `TryFrom` でドメインモデルへ変換する（変換ロジックを一箇所に集約）
//! - **一意制約**: `username` / `email` の重複は DB の一意制約で検出し、
//!   [`InfraErrorKind::Conflict`](crate::error::InfraErrorKind::Conflict) として返す
//! - **更新・削除の結果**: 対象行が存在したかを `bool` で返す

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lexitrack_domain::{
    pagination::Pagination,
    user::{Email, User, UserId, Username},
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// ユーザーリポジトリトレイト
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: &User) -> Result<(), InfraError>;

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, InfraError>;

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, InfraError>;

    /// 作成日時の新しい順
    async fn list(&self, page: Pagination) -> Result<Vec<User>, InfraError>;

    /// ユーザー名・メールアドレス・更新日時を保存する
    ///
    /// 対象が存在しなければ `Ok(false)`。
    async fn update(&self, user: &User) -> Result<bool, InfraError>;

    /// 対象が存在しなければ `Ok(false)`。
    async fn delete(&self, id: &UserId) -> Result<bool, InfraError>;
}

/// DB の users テーブルの行
#[derive(sqlx::FromRow)]
struct UserRow {
    id:         Uuid,
    username:   String,
    email:      String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = InfraError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User::from_db(
            UserId::from_uuid(row.id),
            Username::new(row.username).map_err(|e| InfraError::unexpected(e.to_string()))?,
            Email::new(row.email).map_err(|e| InfraError::unexpected(e.to_string()))?,
            row.created_at,
            row.updated_at,
        ))
    }
}

const SELECT_USER: &str = "SELECT id, username, email, created_at, updated_at FROM users";

/// PostgreSQL 実装の UserRepository
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(user_id = %user.id()))]
    async fn insert(&self, user: &User) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.id().as_uuid())
        .bind(user.username().as_str())
        .bind(user.email().as_str())
        .bind(user.created_at())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(user_id = %id))]
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, InfraError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(User::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, InfraError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE email = $1"))
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(User::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(limit = page.limit(), offset = page.offset()))]
    async fn list(&self, page: Pagination) -> Result<Vec<User>, InfraError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "{SELECT_USER} ORDER BY created_at DESC, id LIMIT $1 OFFSET $2"
        ))
        .bind(i64::from(page.limit()))
        .bind(i64::from(page.offset()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(user_id = %user.id()))]
    async fn update(&self, user: &User) -> Result<bool, InfraError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = $2, email = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(user.id().as_uuid())
        .bind(user.username().as_str())
        .bind(user.email().as_str())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(user_id = %id))]
    async fn delete(&self, id: &UserId) -> Result<bool, InfraError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
