//! 単語ごとの学習進捗ユースケース

use std::{sync::Arc, time::Duration};

use lexitrack_domain::{
    DomainError,
    clock::Clock,
    pagination::Pagination,
    progress::{ProgressId, UserProgress, WordId},
    user::UserId,
    value_objects::Count,
};
use lexitrack_infra::{db::with_timeout, repository::UserProgressRepository};
use lexitrack_shared::observability::{Field, Logger};

use super::{OperationLog, from_infra, page_fields};
use crate::error::ApiError;

#[derive(Debug, Clone, Copy)]
pub struct CreateProgressInput {
    pub user_id:         UserId,
    pub word_id:         WordId,
    pub correct_count:   i32,
    pub incorrect_count: i32,
}

#[derive(Debug, Clone, Copy)]
pub struct UpdateProgressInput {
    pub correct_count:   i32,
    pub incorrect_count: i32,
}

pub struct ProgressUseCaseImpl {
    progress_repository: Arc<dyn UserProgressRepository>,
    clock:               Arc<dyn Clock>,
    logger:              Logger,
    timeout:             Duration,
}

fn counts(correct_count: i32, incorrect_count: i32) -> Result<(Count, Count), DomainError> {
    Ok((
        Count::new("correct_count", correct_count)?,
        Count::new("incorrect_count", incorrect_count)?,
    ))
}

fn progress_not_found(id: &ProgressId) -> ApiError {
    DomainError::not_found("UserProgress", id).into()
}

impl ProgressUseCaseImpl {
    pub fn new(
        progress_repository: Arc<dyn UserProgressRepository>,
        clock: Arc<dyn Clock>,
        logger: Logger,
        timeout: Duration,
    ) -> Self {
        Self {
            progress_repository,
            clock,
            logger,
            timeout,
        }
    }

    /// 進捗を作成する
    ///
    /// 同じユーザー・単語の組は 1 件のみ。
    pub async fn create_progress(
        &self,
        input: CreateProgressInput,
    ) -> Result<UserProgress, ApiError> {
        let op = OperationLog::start(
            &self.logger,
            "progress.create",
            "creating progress",
            [
                Field::new("user_id", input.user_id.to_string()),
                Field::new("word_id", input.word_id.to_string()),
                Field::new("correct_count", input.correct_count),
                Field::new("incorrect_count", input.incorrect_count),
            ],
        );

        let result = async {
            let (correct, incorrect) = counts(input.correct_count, input.incorrect_count)?;
            let progress = UserProgress::new(
                ProgressId::new(),
                input.user_id,
                input.word_id,
                correct,
                incorrect,
                self.clock.now(),
            );

            with_timeout(self.timeout, self.progress_repository.insert(&progress))
                .await
                .map_err(|e| from_infra(e, "この単語の進捗は既に存在します"))?;

            Ok::<_, ApiError>(progress)
        }
        .await;

        op.finish(result, "progress created", |progress| {
            [Field::new("progress_id", progress.id().to_string())]
        })
    }

    pub async fn get_progress(&self, id: ProgressId) -> Result<UserProgress, ApiError> {
        let op = OperationLog::start(
            &self.logger,
            "progress.get",
            "getting progress",
            [Field::new("progress_id", id.to_string())],
        );

        let result = async {
            with_timeout(self.timeout, self.progress_repository.find_by_id(&id))
                .await?
                .ok_or_else(|| progress_not_found(&id))
        }
        .await;

        op.finish(result, "progress found", |_| [])
    }

    pub async fn get_progress_by_word(
        &self,
        user_id: UserId,
        word_id: WordId,
    ) -> Result<UserProgress, ApiError> {
        let op = OperationLog::start(
            &self.logger,
            "progress.get_by_word",
            "getting progress by user and word",
            [
                Field::new("user_id", user_id.to_string()),
                Field::new("word_id", word_id.to_string()),
            ],
        );

        let result = async {
            with_timeout(
                self.timeout,
                self.progress_repository
                    .find_by_user_and_word(&user_id, &word_id),
            )
            .await?
            .ok_or_else(|| ApiError::from(DomainError::not_found("UserProgress", word_id)))
        }
        .await;

        op.finish(result, "progress found", |progress| {
            [Field::new("progress_id", progress.id().to_string())]
        })
    }

    pub async fn list_progress(
        &self,
        user_id: UserId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<(Vec<UserProgress>, Pagination), ApiError> {
        let op = OperationLog::start(
            &self.logger,
            "progress.list",
            "listing progress",
            std::iter::once(Field::new("user_id", user_id.to_string()))
                .chain(page_fields(limit, offset)),
        );

        let result = async {
            let page = Pagination::new(limit, offset)?;
            let items = with_timeout(
                self.timeout,
                self.progress_repository.list_by_user(&user_id, page),
            )
            .await?;
            Ok::<_, ApiError>((items, page))
        }
        .await;

        op.finish(result, "progress listed", |(items, _)| {
            [Field::new("count", items.len() as u64)]
        })
    }

    /// 正誤回数を置き換える
    pub async fn update_progress(
        &self,
        id: ProgressId,
        input: UpdateProgressInput,
    ) -> Result<UserProgress, ApiError> {
        let op = OperationLog::start(
            &self.logger,
            "progress.update",
            "updating progress",
            [
                Field::new("progress_id", id.to_string()),
                Field::new("correct_count", input.correct_count),
                Field::new("incorrect_count", input.incorrect_count),
            ],
        );

        let result = async {
            let (correct, incorrect) = counts(input.correct_count, input.incorrect_count)?;

            let progress = with_timeout(self.timeout, self.progress_repository.find_by_id(&id))
                .await?
                .ok_or_else(|| progress_not_found(&id))?
                .with_counts(correct, incorrect, self.clock.now());

            let updated =
                with_timeout(self.timeout, self.progress_repository.update(&progress)).await?;
            if !updated {
                return Err(progress_not_found(&id));
            }

            Ok(progress)
        }
        .await;

        op.finish(result, "progress updated", |_| [])
    }

    pub async fn delete_progress(&self, id: ProgressId) -> Result<(), ApiError> {
        let op = OperationLog::start(
            &self.logger,
            "progress.delete",
            "deleting progress",
            [Field::new("progress_id", id.to_string())],
        );

        let result = async {
            let deleted = with_timeout(self.timeout, self.progress_repository.delete(&id)).await?;
            if deleted {
                Ok(())
            } else {
                Err(progress_not_found(&id))
            }
        }
        .await;

        op.finish(result, "progress deleted", |()| [])
    }
}
