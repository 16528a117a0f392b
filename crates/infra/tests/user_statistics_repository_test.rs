//! UserStatisticsRepository 統合テスト
//!
//! 実行方法:
//! ```bash
//! DATABASE_URL=postgres://... cargo test -p lexitrack-infra --test user_statistics_repository_test -- --ignored
//! ```

mod common;

use common::{seed_user, test_now, test_now_plus};
use lexitrack_domain::{
    pagination::Pagination,
    statistics::{StatisticsValues, UserStatistics},
    user::UserId,
    value_objects::{Accuracy, Count},
};
use lexitrack_infra::repository::{
    PostgresUserRepository,
    PostgresUserStatisticsRepository,
    UserRepository,
    UserStatisticsRepository,
};
use pretty_assertions::assert_eq;
use sqlx::PgPool;

fn values(words: i32, accuracy: f64, time: i32) -> StatisticsValues {
    StatisticsValues {
        total_words_learned: Count::new("total_words_learned", words).unwrap(),
        accuracy:            Accuracy::new(accuracy).unwrap(),
        total_time:          Count::new("total_time", time).unwrap(),
    }
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要（DATABASE_URL）"]
async fn test_正答率は小数第2位まで保存される(pool: PgPool) {
    let user = seed_user(&pool, "stats_user").await;
    let sut = PostgresUserStatisticsRepository::new(pool);
    let statistics = UserStatistics::new(*user.id(), values(120, 87.456, 3600), test_now());

    sut.insert(&statistics).await.unwrap();
    let found = sut.find_by_user_id(user.id()).await.unwrap().unwrap();

    assert_eq!(found.accuracy().as_f64(), 87.46);
    assert_eq!(found.total_words_learned().as_i32(), 120);
    assert_eq!(found.total_time().as_i32(), 3600);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要（DATABASE_URL）"]
async fn test_存在しないユーザーの統計はforeign_keyになる(pool: PgPool) {
    let sut = PostgresUserStatisticsRepository::new(pool);
    let statistics = UserStatistics::new(UserId::new(), values(0, 0.0, 0), test_now());

    let err = sut.insert(&statistics).await.unwrap_err();

    assert!(err.is_foreign_key());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要（DATABASE_URL）"]
async fn test_同じユーザーの統計の二重作成はconflictになる(pool: PgPool) {
    let user = seed_user(&pool, "twice").await;
    let sut = PostgresUserStatisticsRepository::new(pool);
    let statistics = UserStatistics::new(*user.id(), values(1, 50.0, 10), test_now());
    sut.insert(&statistics).await.unwrap();

    let err = sut.insert(&statistics).await.unwrap_err();

    assert!(err.is_conflict());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要（DATABASE_URL）"]
async fn test_更新した値が一覧に反映される(pool: PgPool) {
    let user = seed_user(&pool, "updater").await;
    let sut = PostgresUserStatisticsRepository::new(pool);
    let statistics = UserStatistics::new(*user.id(), values(1, 10.0, 10), test_now());
    sut.insert(&statistics).await.unwrap();

    let updated = statistics.updated(values(2, 100.0, 20), test_now_plus(5));
    assert!(sut.update(&updated).await.unwrap());

    let listed = sut.list(Pagination::default()).await.unwrap();
    assert_eq!(listed, vec![updated]);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要（DATABASE_URL）"]
async fn test_ユーザー削除で統計も削除される(pool: PgPool) {
    let user = seed_user(&pool, "cascade").await;
    let statistics = UserStatistics::new(*user.id(), values(1, 1.0, 1), test_now());
    let sut = PostgresUserStatisticsRepository::new(pool.clone());
    sut.insert(&statistics).await.unwrap();

    PostgresUserRepository::new(pool).delete(user.id()).await.unwrap();

    assert!(sut.find_by_user_id(user.id()).await.unwrap().is_none());
}
