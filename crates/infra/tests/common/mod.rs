//! テスト共通フィクスチャ
//!
//! DB を使用する統合テストで共通利用するエンティティ生成ヘルパー。

// 各テストファイルが独立したクレートとしてコンパイルされるため、
// 使用しない関数に dead_code 警告が出る。モジュール全体で抑制する。
#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use lexitrack_domain::user::{Email, User, UserId, Username};
use lexitrack_infra::repository::{PostgresUserRepository, UserRepository};
use sqlx::PgPool;

/// テスト用の固定日時
///
/// DB の `TIMESTAMPTZ` はマイクロ秒精度のため、秒単位の値を使う。
pub fn test_now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

/// `test_now()` から `seconds` 秒後
pub fn test_now_plus(seconds: i64) -> DateTime<Utc> {
    test_now() + Duration::seconds(seconds)
}

/// 指定した名前のユーザーを作成する（メールアドレスは `{name}@example.com`）
pub fn build_user(name: &str) -> User {
    User::new(
        UserId::new(),
        Username::new(name).unwrap(),
        Email::new(format!("{name}@example.com")).unwrap(),
        test_now(),
    )
}

/// ユーザーを作成して DB に登録する
pub async fn seed_user(pool: &PgPool, name: &str) -> User {
    let user = build_user(name);
    PostgresUserRepository::new(pool.clone())
        .insert(&user)
        .await
        .expect("ユーザー作成に失敗");
    user
}
