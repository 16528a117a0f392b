//! 学習セッションユースケース
//!
//! 状態遷移のルール（`ended_at` の補完・前後関係）は
//! [`UserSession::update`] に委ねる。

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use lexitrack_domain::{
    DomainError,
    clock::Clock,
    pagination::Pagination,
    session::{SessionId, SessionStatus, UserSession},
    user::UserId,
};
use lexitrack_infra::{db::with_timeout, repository::UserSessionRepository};
use lexitrack_shared::observability::{Field, Logger};

use super::{OperationLog, from_infra, page_fields};
use crate::error::ApiError;

#[derive(Debug, Clone)]
pub struct CreateSessionInput {
    pub user_id: UserId,
    /// 未指定は `active`
    pub status:  Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateSessionInput {
    pub status:   String,
    pub ended_at: Option<DateTime<Utc>>,
}

pub struct SessionUseCaseImpl {
    session_repository: Arc<dyn UserSessionRepository>,
    clock:              Arc<dyn Clock>,
    logger:             Logger,
    timeout:            Duration,
}

fn session_not_found(id: &SessionId) -> ApiError {
    DomainError::not_found("UserSession", id).into()
}

fn session_fields(session: &UserSession) -> [Field; 2] {
    [
        Field::new("session_id", session.id().to_string()),
        Field::new("status", session.status().as_str()),
    ]
}

impl SessionUseCaseImpl {
    pub fn new(
        session_repository: Arc<dyn UserSessionRepository>,
        clock: Arc<dyn Clock>,
        logger: Logger,
        timeout: Duration,
    ) -> Self {
        Self {
            session_repository,
            clock,
            logger,
            timeout,
        }
    }

    /// セッションを開始する
    pub async fn create_session(&self, input: CreateSessionInput) -> Result<UserSession, ApiError> {
        let op = OperationLog::start(
            &self.logger,
            "session.create",
            "creating session",
            std::iter::once(Field::new("user_id", input.user_id.to_string()))
                .chain(input.status.as_deref().map(|s| Field::new("status", s))),
        );

        let result = async {
            let status = match input.status.as_deref() {
                Some(s) => SessionStatus::parse(s)?,
                None => SessionStatus::default(),
            };
            let session =
                UserSession::start(SessionId::new(), input.user_id, status, self.clock.now());

            with_timeout(self.timeout, self.session_repository.insert(&session))
                .await
                .map_err(|e| from_infra(e, "セッションは既に存在します"))?;

            Ok::<_, ApiError>(session)
        }
        .await;

        op.finish(result, "session created", session_fields)
    }

    pub async fn get_session(&self, id: SessionId) -> Result<UserSession, ApiError> {
        let op = OperationLog::start(
            &self.logger,
            "session.get",
            "getting session",
            [Field::new("session_id", id.to_string())],
        );

        let result = async {
            with_timeout(self.timeout, self.session_repository.find_by_id(&id))
                .await?
                .ok_or_else(|| session_not_found(&id))
        }
        .await;

        op.finish(result, "session found", |_| [])
    }

    pub async fn list_sessions(
        &self,
        user_id: UserId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<(Vec<UserSession>, Pagination), ApiError> {
        let op = OperationLog::start(
            &self.logger,
            "session.list",
            "listing sessions",
            std::iter::once(Field::new("user_id", user_id.to_string()))
                .chain(page_fields(limit, offset)),
        );

        let result = async {
            let page = Pagination::new(limit, offset)?;
            let items = with_timeout(
                self.timeout,
                self.session_repository.list_by_user(&user_id, page),
            )
            .await?;
            Ok::<_, ApiError>((items, page))
        }
        .await;

        op.finish(result, "sessions listed", |(items, _)| {
            [Field::new("count", items.len() as u64)]
        })
    }

    /// 全ユーザーの進行中セッション
    pub async fn list_active_sessions(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<(Vec<UserSession>, Pagination), ApiError> {
        let op = OperationLog::start(
            &self.logger,
            "session.list_active",
            "listing active sessions",
            page_fields(limit, offset),
        );

        let result = async {
            let page = Pagination::new(limit, offset)?;
            let items =
                with_timeout(self.timeout, self.session_repository.list_active(page)).await?;
            Ok::<_, ApiError>((items, page))
        }
        .await;

        op.finish(result, "active sessions listed", |(items, _)| {
            [Field::new("count", items.len() as u64)]
        })
    }

    /// 状態と終了日時を更新する
    ///
    /// `completed` で `ended_at` を省略した場合は現在時刻で終了する。
    pub async fn update_session(
        &self,
        id: SessionId,
        input: UpdateSessionInput,
    ) -> Result<UserSession, ApiError> {
        let op = OperationLog::start(
            &self.logger,
            "session.update",
            "updating session",
            std::iter::once(Field::new("session_id", id.to_string()))
                .chain(std::iter::once(Field::new("status", input.status.as_str())))
                .chain(input.ended_at.map(|at| Field::new("ended_at", at.to_rfc3339()))),
        );

        let result = async {
            let status = SessionStatus::parse(&input.status)?;

            let session = with_timeout(self.timeout, self.session_repository.find_by_id(&id))
                .await?
                .ok_or_else(|| session_not_found(&id))?
                .update(status, input.ended_at, self.clock.now())?;

            let updated =
                with_timeout(self.timeout, self.session_repository.update(&session)).await?;
            if !updated {
                return Err(session_not_found(&id));
            }

            Ok(session)
        }
        .await;

        op.finish(result, "session updated", session_fields)
    }

    pub async fn delete_session(&self, id: SessionId) -> Result<(), ApiError> {
        let op = OperationLog::start(
            &self.logger,
            "session.delete",
            "deleting session",
            [Field::new("session_id", id.to_string())],
        );

        let result = async {
            let deleted = with_timeout(self.timeout, self.session_repository.delete(&id)).await?;
            if deleted {
                Ok(())
            } else {
                Err(session_not_found(&id))
            }
        }
        .await;

        op.finish(result, "session deleted", |()| [])
    }
}
