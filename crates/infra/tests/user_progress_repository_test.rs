//! UserProgressRepository 統合テスト
//!
//! 実行方法:
//! ```bash
//! DATABASE_URL=postgres://... cargo test -p lexitrack-infra --test user_progress_repository_test -- --ignored
//! ```

mod common;

use common::{seed_user, test_now, test_now_plus};
use lexitrack_domain::{
    pagination::Pagination,
    progress::{ProgressId, UserProgress, WordId},
    user::UserId,
    value_objects::Count,
};
use lexitrack_infra::repository::{PostgresUserProgressRepository, UserProgressRepository};
use pretty_assertions::assert_eq;
use sqlx::PgPool;

fn count(value: i32) -> Count {
    Count::new("count", value).unwrap()
}

fn progress(user_id: UserId, word_id: WordId) -> UserProgress {
    UserProgress::new(ProgressId::new(), user_id, word_id, count(0), count(0), test_now())
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要（DATABASE_URL）"]
async fn test_ユーザーと単語の組で進捗を取得できる(pool: PgPool) {
    let user = seed_user(&pool, "learner").await;
    let sut = PostgresUserProgressRepository::new(pool);
    let word_id = WordId::new();
    let created = progress(*user.id(), word_id);
    sut.insert(&created).await.unwrap();

    let found = sut.find_by_user_and_word(user.id(), &word_id).await.unwrap();

    assert_eq!(found, Some(created));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要（DATABASE_URL）"]
async fn test_同じ単語の進捗の二重作成はconflictになる(pool: PgPool) {
    let user = seed_user(&pool, "learner").await;
    let sut = PostgresUserProgressRepository::new(pool);
    let word_id = WordId::new();
    sut.insert(&progress(*user.id(), word_id)).await.unwrap();

    let err = sut.insert(&progress(*user.id(), word_id)).await.unwrap_err();

    assert!(err.is_conflict());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要（DATABASE_URL）"]
async fn test_正誤回数を更新できる(pool: PgPool) {
    let user = seed_user(&pool, "learner").await;
    let sut = PostgresUserProgressRepository::new(pool);
    let created = progress(*user.id(), WordId::new());
    sut.insert(&created).await.unwrap();

    let updated = created.with_counts(count(5), count(2), test_now_plus(30));
    assert!(sut.update(&updated).await.unwrap());

    let found = sut.find_by_id(updated.id()).await.unwrap().unwrap();
    assert_eq!(found.correct_count().as_i32(), 5);
    assert_eq!(found.incorrect_count().as_i32(), 2);
    assert_eq!(found.updated_at(), test_now_plus(30));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要（DATABASE_URL）"]
async fn test_ユーザーごとの一覧は他ユーザーの進捗を含まない(pool: PgPool) {
    let alice = seed_user(&pool, "alice").await;
    let bob = seed_user(&pool, "bob").await;
    let sut = PostgresUserProgressRepository::new(pool);
    let mine = progress(*alice.id(), WordId::new());
    sut.insert(&mine).await.unwrap();
    sut.insert(&progress(*bob.id(), WordId::new())).await.unwrap();

    let listed = sut.list_by_user(alice.id(), Pagination::default()).await.unwrap();

    assert_eq!(listed, vec![mine]);
}
