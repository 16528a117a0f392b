//! 学習統計ユースケース
//!
//! 統計はユーザーごとに 1 件。作成済みのユーザーに再度作成すると競合になる。

use std::{sync::Arc, time::Duration};

use lexitrack_domain::{
    DomainError,
    clock::Clock,
    pagination::Pagination,
    statistics::{StatisticsValues, UserStatistics},
    user::UserId,
    value_objects::{Accuracy, Count},
};
use lexitrack_infra::{db::with_timeout, repository::UserStatisticsRepository};
use lexitrack_shared::observability::{Field, Logger};

use super::{OperationLog, from_infra, page_fields};
use crate::error::ApiError;

/// 学習統計の入力（作成・更新で共通）
#[derive(Debug, Clone, Copy)]
pub struct StatisticsInput {
    pub total_words_learned: i32,
    pub accuracy:            f64,
    pub total_time:          i32,
}

impl StatisticsInput {
    fn fields(&self) -> [Field; 3] {
        [
            Field::new("total_words_learned", self.total_words_learned),
            Field::new("accuracy", self.accuracy),
            Field::new("total_time", self.total_time),
        ]
    }

    fn to_values(self) -> Result<StatisticsValues, DomainError> {
        Ok(StatisticsValues {
            total_words_learned: Count::new("total_words_learned", self.total_words_learned)?,
            accuracy:            Accuracy::new(self.accuracy)?,
            total_time:          Count::new("total_time", self.total_time)?,
        })
    }
}

pub struct StatisticsUseCaseImpl {
    statistics_repository: Arc<dyn UserStatisticsRepository>,
    clock:                 Arc<dyn Clock>,
    logger:                Logger,
    timeout:               Duration,
}

fn statistics_not_found(user_id: &UserId) -> ApiError {
    DomainError::not_found("UserStatistics", user_id).into()
}

impl StatisticsUseCaseImpl {
    pub fn new(
        statistics_repository: Arc<dyn UserStatisticsRepository>,
        clock: Arc<dyn Clock>,
        logger: Logger,
        timeout: Duration,
    ) -> Self {
        Self {
            statistics_repository,
            clock,
            logger,
            timeout,
        }
    }

    /// ユーザーの学習統計を作成する
    pub async fn create_statistics(
        &self,
        user_id: UserId,
        input: StatisticsInput,
    ) -> Result<UserStatistics, ApiError> {
        let op = OperationLog::start(
            &self.logger,
            "statistics.create",
            "creating statistics",
            std::iter::once(Field::new("user_id", user_id.to_string())).chain(input.fields()),
        );

        let result = async {
            let statistics = UserStatistics::new(user_id, input.to_values()?, self.clock.now());

            with_timeout(self.timeout, self.statistics_repository.insert(&statistics))
                .await
                .map_err(|e| from_infra(e, "このユーザーの学習統計は既に存在します"))?;

            Ok::<_, ApiError>(statistics)
        }
        .await;

        op.finish(result, "statistics created", |_| [])
    }

    pub async fn get_statistics(&self, user_id: UserId) -> Result<UserStatistics, ApiError> {
        let op = OperationLog::start(
            &self.logger,
            "statistics.get",
            "getting statistics",
            [Field::new("user_id", user_id.to_string())],
        );

        let result = async {
            with_timeout(
                self.timeout,
                self.statistics_repository.find_by_user_id(&user_id),
            )
            .await?
            .ok_or_else(|| statistics_not_found(&user_id))
        }
        .await;

        op.finish(result, "statistics found", |_| [])
    }

    pub async fn list_statistics(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<(Vec<UserStatistics>, Pagination), ApiError> {
        let op = OperationLog::start(
            &self.logger,
            "statistics.list",
            "listing statistics",
            page_fields(limit, offset),
        );

        let result = async {
            let page = Pagination::new(limit, offset)?;
            let items = with_timeout(self.timeout, self.statistics_repository.list(page)).await?;
            Ok::<_, ApiError>((items, page))
        }
        .await;

        op.finish(result, "statistics listed", |(items, _)| {
            [Field::new("count", items.len() as u64)]
        })
    }

    /// 集計値を置き換える
    pub async fn update_statistics(
        &self,
        user_id: UserId,
        input: StatisticsInput,
    ) -> Result<UserStatistics, ApiError> {
        let op = OperationLog::start(
            &self.logger,
            "statistics.update",
            "updating statistics",
            std::iter::once(Field::new("user_id", user_id.to_string())).chain(input.fields()),
        );

        let result = async {
            let values = input.to_values()?;

            let statistics = with_timeout(
                self.timeout,
                self.statistics_repository.find_by_user_id(&user_id),
            )
            .await?
            .ok_or_else(|| statistics_not_found(&user_id))?
            .updated(values, self.clock.now());

            let updated =
                with_timeout(self.timeout, self.statistics_repository.update(&statistics)).await?;
            if !updated {
                return Err(statistics_not_found(&user_id));
            }

            Ok(statistics)
        }
        .await;

        op.finish(result, "statistics updated", |_| [])
    }

    pub async fn delete_statistics(&self, user_id: UserId) -> Result<(), ApiError> {
        let op = OperationLog::start(
            &self.logger,
            "statistics.delete",
            "deleting statistics",
            [Field::new("user_id", user_id.to_string())],
        );

        let result = async {
            let deleted =
                with_timeout(self.timeout, self.statistics_repository.delete(&user_id)).await?;
            if deleted {
                Ok(())
            } else {
                Err(statistics_not_found(&user_id))
            }
        }
        .await;

        op.finish(result, "statistics deleted", |()| [])
    }
}

#[cfg(test)]
mod tests {
    use lexitrack_domain::clock::FixedClock;
    use lexitrack_infra::mock::{MockUserRepository, MockUserStatisticsRepository};
    use lexitrack_shared::observability::MemorySink;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::test_utils::{memory_logger, now, sample_user};

    struct Fixture {
        usecase: StatisticsUseCaseImpl,
        users:   MockUserRepository,
        repo:    MockUserStatisticsRepository,
        sink:    MemorySink,
    }

    fn fixture() -> Fixture {
        let users = MockUserRepository::new();
        let repo = MockUserStatisticsRepository::new().linked_to(&users);
        let (logger, sink) = memory_logger();
        let usecase = StatisticsUseCaseImpl::new(
            Arc::new(repo.clone()),
            Arc::new(FixedClock::new(now())),
            logger,
            Duration::from_millis(200),
        );
        Fixture {
            usecase,
            users,
            repo,
            sink,
        }
    }

    fn input(total_words_learned: i32, accuracy: f64, total_time: i32) -> StatisticsInput {
        StatisticsInput {
            total_words_learned,
            accuracy,
            total_time,
        }
    }

    #[tokio::test]
    async fn test_create_statisticsで正答率を丸めて保存する() {
        let f = fixture();
        let user = sample_user("alice");
        f.users.add_user(user.clone());

        let created = f
            .usecase
            .create_statistics(*user.id(), input(10, 87.456, 600))
            .await
            .unwrap();

        assert_eq!(created.accuracy().as_f64(), 87.46);
        let found = f.usecase.get_statistics(*user.id()).await.unwrap();
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn test_create_statisticsは2件目を競合にする() {
        let f = fixture();
        let user = sample_user("alice");
        f.users.add_user(user.clone());
        f.usecase
            .create_statistics(*user.id(), input(0, 0.0, 0))
            .await
            .unwrap();

        let err = f
            .usecase
            .create_statistics(*user.id(), input(1, 50.0, 1))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_statisticsは存在しないユーザーをnot_foundにする() {
        let f = fixture();

        let err = f
            .usecase
            .create_statistics(UserId::new(), input(0, 0.0, 0))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[rstest]
    #[case(input(-1, 10.0, 0))]
    #[case(input(0, 100.5, 0))]
    #[case(input(0, 10.0, -30))]
    #[tokio::test]
    async fn test_create_statisticsは範囲外の値を検証エラーにする(#[case] input: StatisticsInput) {
        let f = fixture();
        let user = sample_user("alice");
        f.users.add_user(user.clone());

        let err = f
            .usecase
            .create_statistics(*user.id(), input)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_statisticsで値を置き換える() {
        let f = fixture();
        let user = sample_user("alice");
        f.users.add_user(user.clone());
        f.usecase
            .create_statistics(*user.id(), input(1, 10.0, 60))
            .await
            .unwrap();

        let updated = f
            .usecase
            .update_statistics(*user.id(), input(120, 92.5, 3600))
            .await
            .unwrap();

        assert_eq!(updated.total_words_learned().as_i32(), 120);
        assert_eq!(updated.total_time().as_i32(), 3600);
        assert_eq!(updated.created_at(), now());
    }

    #[tokio::test]
    async fn test_delete_statisticsは未作成のユーザーをnot_foundにする() {
        let f = fixture();

        let err = f
            .usecase
            .delete_statistics(UserId::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_リポジトリ障害はerrorレベルで出力する() {
        let f = fixture();
        f.repo.set_unavailable(true);

        let err = f.usecase.list_statistics(None, None).await.unwrap_err();

        assert!(matches!(err, ApiError::Infra(_)));
        let failed = f
            .sink
            .records()
            .into_iter()
            .find(|r| r["msg"] == "operation failed")
            .unwrap();
        assert_eq!(failed["level"], "ERROR");
        assert_eq!(failed["operation"], "statistics.list");
    }
}
