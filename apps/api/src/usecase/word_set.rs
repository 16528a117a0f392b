//! 単語セット割り当てユースケース

use std::{sync::Arc, time::Duration};

use lexitrack_domain::{
    DomainError,
    clock::Clock,
    pagination::Pagination,
    user::UserId,
    word_set::{UserWordSet, UserWordSetId, WordSetId},
};
use lexitrack_infra::{db::with_timeout, repository::UserWordSetRepository};
use lexitrack_shared::observability::{Field, Logger};

use super::{OperationLog, from_infra, page_fields};
use crate::error::ApiError;

#[derive(Debug, Clone, Copy)]
pub struct CreateWordSetInput {
    pub user_id:     UserId,
    pub word_set_id: WordSetId,
}

pub struct WordSetUseCaseImpl {
    word_set_repository: Arc<dyn UserWordSetRepository>,
    clock:               Arc<dyn Clock>,
    logger:              Logger,
    timeout:             Duration,
}

fn word_set_not_found(id: &UserWordSetId) -> ApiError {
    DomainError::not_found("UserWordSet", id).into()
}

impl WordSetUseCaseImpl {
    pub fn new(
        word_set_repository: Arc<dyn UserWordSetRepository>,
        clock: Arc<dyn Clock>,
        logger: Logger,
        timeout: Duration,
    ) -> Self {
        Self {
            word_set_repository,
            clock,
            logger,
            timeout,
        }
    }

    /// ユーザーに単語セットを割り当てる
    pub async fn create_word_set(&self, input: CreateWordSetInput) -> Result<UserWordSet, ApiError> {
        let op = OperationLog::start(
            &self.logger,
            "word_set.create",
            "assigning word set",
            [
                Field::new("user_id", input.user_id.to_string()),
                Field::new("word_set_id", input.word_set_id.to_string()),
            ],
        );

        let result = async {
            let word_set = UserWordSet::new(
                UserWordSetId::new(),
                input.user_id,
                input.word_set_id,
                self.clock.now(),
            );

            with_timeout(self.timeout, self.word_set_repository.insert(&word_set))
                .await
                .map_err(|e| from_infra(e, "単語セットの割り当ては既に存在します"))?;

            Ok::<_, ApiError>(word_set)
        }
        .await;

        op.finish(result, "word set assigned", |word_set| {
            [Field::new("user_word_set_id", word_set.id().to_string())]
        })
    }

    pub async fn get_word_set(&self, id: UserWordSetId) -> Result<UserWordSet, ApiError> {
        let op = OperationLog::start(
            &self.logger,
            "word_set.get",
            "getting word set assignment",
            [Field::new("user_word_set_id", id.to_string())],
        );

        let result = async {
            with_timeout(self.timeout, self.word_set_repository.find_by_id(&id))
                .await?
                .ok_or_else(|| word_set_not_found(&id))
        }
        .await;

        op.finish(result, "word set assignment found", |_| [])
    }

    pub async fn list_word_sets(
        &self,
        user_id: UserId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<(Vec<UserWordSet>, Pagination), ApiError> {
        let op = OperationLog::start(
            &self.logger,
            "word_set.list",
            "listing word set assignments",
            std::iter::once(Field::new("user_id", user_id.to_string()))
                .chain(page_fields(limit, offset)),
        );

        let result = async {
            let page = Pagination::new(limit, offset)?;
            let items = with_timeout(
                self.timeout,
                self.word_set_repository.list_by_user(&user_id, page),
            )
            .await?;
            Ok::<_, ApiError>((items, page))
        }
        .await;

        op.finish(result, "word set assignments listed", |(items, _)| {
            [Field::new("count", items.len() as u64)]
        })
    }

    /// 割り当てる単語セットを差し替える
    pub async fn update_word_set(
        &self,
        id: UserWordSetId,
        word_set_id: WordSetId,
    ) -> Result<UserWordSet, ApiError> {
        let op = OperationLog::start(
            &self.logger,
            "word_set.update",
            "reassigning word set",
            [
                Field::new("user_word_set_id", id.to_string()),
                Field::new("word_set_id", word_set_id.to_string()),
            ],
        );

        let result = async {
            let word_set = with_timeout(self.timeout, self.word_set_repository.find_by_id(&id))
                .await?
                .ok_or_else(|| word_set_not_found(&id))?
                .reassigned(word_set_id);

            let updated = with_timeout(self.timeout, self.word_set_repository.update(&word_set))
                .await
                .map_err(|e| from_infra(e, "単語セットの割り当ては既に存在します"))?;
            if !updated {
                return Err(word_set_not_found(&id));
            }

            Ok(word_set)
        }
        .await;

        op.finish(result, "word set reassigned", |_| [])
    }

    pub async fn delete_word_set(&self, id: UserWordSetId) -> Result<(), ApiError> {
        let op = OperationLog::start(
            &self.logger,
            "word_set.delete",
            "deleting word set assignment",
            [Field::new("user_word_set_id", id.to_string())],
        );

        let result = async {
            let deleted = with_timeout(self.timeout, self.word_set_repository.delete(&id)).await?;
            if deleted {
                Ok(())
            } else {
                Err(word_set_not_found(&id))
            }
        }
        .await;

        op.finish(result, "word set assignment deleted", |()| [])
    }
}
