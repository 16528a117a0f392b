//! ユーザー管理ユースケース

use std::{sync::Arc, time::Duration};

use lexitrack_domain::{
    DomainError,
    clock::Clock,
    pagination::Pagination,
    user::{Email, User, UserId, Username},
};
use lexitrack_infra::{InfraError, InfraErrorKind, db::with_timeout, repository::UserRepository};
use lexitrack_shared::observability::{Field, Logger};

use super::{OperationLog, from_infra, page_fields};
use crate::error::ApiError;

/// ユーザー作成・更新の入力
#[derive(Debug, Clone)]
pub struct UserInput {
    pub username: String,
    pub email:    String,
}

/// ユーザー管理ユースケース
pub struct UserUseCaseImpl {
    user_repository: Arc<dyn UserRepository>,
    clock:           Arc<dyn Clock>,
    logger:          Logger,
    timeout:         Duration,
}

fn user_not_found(id: &UserId) -> ApiError {
    DomainError::not_found("User", id).into()
}

/// 一意制約（ユーザー名・メールアドレス）違反を区別する
fn from_user_infra(err: InfraError) -> ApiError {
    let detail = match err.kind() {
        InfraErrorKind::Conflict { constraint, .. } if constraint.contains("email") => {
            "メールアドレスは既に使用されています"
        }
        _ => "ユーザー名は既に使用されています",
    };
    from_infra(err, detail)
}

impl UserUseCaseImpl {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
        logger: Logger,
        timeout: Duration,
    ) -> Self {
        Self {
            user_repository,
            clock,
            logger,
            timeout,
        }
    }

    /// ユーザーを作成する
    ///
    /// ユーザー名・メールアドレスの重複は DB の一意制約で検出する。
    pub async fn create_user(&self, input: UserInput) -> Result<User, ApiError> {
        let op = OperationLog::start(
            &self.logger,
            "user.create",
            "creating user",
            [
                Field::new("username", input.username.as_str()),
                Field::new("email", input.email.as_str()),
            ],
        );

        let result = async {
            let username = Username::new(input.username)?;
            let email = Email::new(input.email)?;
            let user = User::new(UserId::new(), username, email, self.clock.now());

            with_timeout(self.timeout, self.user_repository.insert(&user))
                .await
                .map_err(from_user_infra)?;

            Ok::<_, ApiError>(user)
        }
        .await;

        op.finish(result, "user created", |user| {
            [Field::new("user_id", user.id().to_string())]
        })
    }

    pub async fn get_user(&self, id: UserId) -> Result<User, ApiError> {
        let op = OperationLog::start(
            &self.logger,
            "user.get",
            "getting user by id",
            [Field::new("user_id", id.to_string())],
        );

        let result = async {
            with_timeout(self.timeout, self.user_repository.find_by_id(&id))
                .await?
                .ok_or_else(|| user_not_found(&id))
        }
        .await;

        op.finish(result, "user found", |_| [])
    }

    /// メールアドレスでユーザーを取得する
    ///
    /// 応答・ログの detail にはメールアドレスを含めない。
    pub async fn get_user_by_email(&self, email: String) -> Result<User, ApiError> {
        let op = OperationLog::start(
            &self.logger,
            "user.get_by_email",
            "getting user by email",
            [Field::new("email", email.as_str())],
        );

        let result = async {
            let email = Email::new(email)?;
            with_timeout(self.timeout, self.user_repository.find_by_email(&email))
                .await?
                .ok_or_else(|| {
                    ApiError::NotFound("指定されたメールアドレスのユーザーが見つかりません".to_string())
                })
        }
        .await;

        op.finish(result, "user found", |user| {
            [Field::new("user_id", user.id().to_string())]
        })
    }

    pub async fn list_users(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<(Vec<User>, Pagination), ApiError> {
        let op = OperationLog::start(
            &self.logger,
            "user.list",
            "listing users",
            page_fields(limit, offset),
        );

        let result = async {
            let page = Pagination::new(limit, offset)?;
            let users = with_timeout(self.timeout, self.user_repository.list(page)).await?;
            Ok::<_, ApiError>((users, page))
        }
        .await;

        op.finish(result, "users listed", |(users, _)| {
            [Field::new("count", users.len() as u64)]
        })
    }

    /// ユーザー名とメールアドレスを更新する
    pub async fn update_user(&self, id: UserId, input: UserInput) -> Result<User, ApiError> {
        let op = OperationLog::start(
            &self.logger,
            "user.update",
            "updating user",
            [
                Field::new("user_id", id.to_string()),
                Field::new("username", input.username.as_str()),
                Field::new("email", input.email.as_str()),
            ],
        );

        let result = async {
            let username = Username::new(input.username)?;
            let email = Email::new(input.email)?;

            let user = with_timeout(self.timeout, self.user_repository.find_by_id(&id))
                .await?
                .ok_or_else(|| user_not_found(&id))?
                .updated(username, email, self.clock.now());

            let updated = with_timeout(self.timeout, self.user_repository.update(&user))
                .await
                .map_err(from_user_infra)?;
            if !updated {
                return Err(user_not_found(&id));
            }

            Ok(user)
        }
        .await;

        op.finish(result, "user updated", |_| [])
    }

    pub async fn delete_user(&self, id: UserId) -> Result<(), ApiError> {
        let op = OperationLog::start(
            &self.logger,
            "user.delete",
            "deleting user",
            [Field::new("user_id", id.to_string())],
        );

        let result = async {
            let deleted = with_timeout(self.timeout, self.user_repository.delete(&id)).await?;
            if deleted {
                Ok(())
            } else {
                Err(user_not_found(&id))
            }
        }
        .await;

        op.finish(result, "user deleted", |()| [])
    }
}
