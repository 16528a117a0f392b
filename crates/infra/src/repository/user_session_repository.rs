//! # UserSessionRepository
//!
//! 学習セッションの永続化を担当するリポジトリ。
//! 一覧は開始日時の新しい順に返す。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lexitrack_domain::{
    pagination::Pagination,
    session::{SessionId, SessionStatus, UserSession},
    user::UserId,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// 学習セッションリポジトリトレイト
#[async_trait]
pub trait UserSessionRepository: Send + Sync {
    async fn insert(&self, session: &UserSession) -> Result<(), InfraError>;

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<UserSession>, InfraError>;

    async fn list_by_user(
        &self,
        user_id: &UserId,
        page: Pagination,
    ) -> Result<Vec<UserSession>, InfraError>;

    /// 全ユーザーの `active` なセッション
    async fn list_active(&self, page: Pagination) -> Result<Vec<UserSession>, InfraError>;

    /// 状態と終了日時を保存する
    async fn update(&self, session: &UserSession) -> Result<bool, InfraError>;

    async fn delete(&self, id: &SessionId) -> Result<bool, InfraError>;
}

#[derive(sqlx::FromRow)]
struct UserSessionRow {
    id:         Uuid,
    user_id:    Uuid,
    status:     String,
    started_at: DateTime<Utc>,
    ended_at:   Option<DateTime<Utc>>,
}

impl TryFrom<UserSessionRow> for UserSession {
    type Error = InfraError;

    fn try_from(row: UserSessionRow) -> Result<Self, Self::Error> {
        Ok(UserSession::from_db(
            SessionId::from_uuid(row.id),
            UserId::from_uuid(row.user_id),
            SessionStatus::parse(&row.status).map_err(|e| InfraError::unexpected(e.to_string()))?,
            row.started_at,
            row.ended_at,
        ))
    }
}

const SELECT_SESSION: &str = "SELECT id, user_id, status, started_at, ended_at FROM user_sessions";

/// PostgreSQL 実装の UserSessionRepository
#[derive(Debug, Clone)]
pub struct PostgresUserSessionRepository {
    pool: PgPool,
}

impl PostgresUserSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserSessionRepository for PostgresUserSessionRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(session_id = %session.id()))]
    async fn insert(&self, session: &UserSession) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO user_sessions (id, user_id, status, started_at, ended_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(session.id().as_uuid())
        .bind(session.user_id().as_uuid())
        .bind(session.status().as_str())
        .bind(session.started_at())
        .bind(session.ended_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(session_id = %id))]
    async fn find_by_id(&self, id: &SessionId) -> Result<Option<UserSession>, InfraError> {
        let row = sqlx::query_as::<_, UserSessionRow>(&format!("{SELECT_SESSION} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserSession::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(user_id = %user_id))]
    async fn list_by_user(
        &self,
        user_id: &UserId,
        page: Pagination,
    ) -> Result<Vec<UserSession>, InfraError> {
        let rows = sqlx::query_as::<_, UserSessionRow>(&format!(
            "{SELECT_SESSION} WHERE user_id = $1 ORDER BY started_at DESC, id LIMIT $2 OFFSET $3"
        ))
        .bind(user_id.as_uuid())
        .bind(i64::from(page.limit()))
        .bind(i64::from(page.offset()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(UserSession::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn list_active(&self, page: Pagination) -> Result<Vec<UserSession>, InfraError> {
        let rows = sqlx::query_as::<_, UserSessionRow>(&format!(
            "{SELECT_SESSION} WHERE status = $1 ORDER BY started_at DESC, id LIMIT $2 OFFSET $3"
        ))
        .bind(SessionStatus::Active.as_str())
        .bind(i64::from(page.limit()))
        .bind(i64::from(page.offset()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(UserSession::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(session_id = %session.id()))]
    async fn update(&self, session: &UserSession) -> Result<bool, InfraError> {
        let result = sqlx::query("UPDATE user_sessions SET status = $2, ended_at = $3 WHERE id = $1")
            .bind(session.id().as_uuid())
            .bind(session.status().as_str())
            .bind(session.ended_at())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(session_id = %id))]
    async fn delete(&self, id: &SessionId) -> Result<bool, InfraError> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
