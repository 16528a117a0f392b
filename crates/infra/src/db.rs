//! # PostgreSQL データベース接続管理
//!
//! 接続プールの作成、疎通確認、マイグレーション、操作ごとのタイムアウトを扱う。
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use std::time::Duration;
//!
//! use lexitrack_infra::db::{self, PoolSettings};
//! use sqlx::postgres::PgConnectOptions;
//!
//! let options = PgConnectOptions::new().host("localhost").password("secret");
//! let pool = db::create_pool(options, &PoolSettings::default()).await?;
//! db::ping(&pool, Duration::from_secs(5)).await?;
//! db::run_migrations(&pool).await?;
//! ```

use std::{future::Future, time::Duration};

use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
};

use crate::error::InfraError;

/// 接続プールの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections:     u32,
    pub min_connections:     u32,
    /// 接続の最大寿命
    pub max_lifetime:        Duration,
    /// アイドル接続を閉じるまでの時間
    pub idle_timeout:        Duration,
    /// プールから接続を取得するまでの待ち時間の上限
    pub acquire_timeout:     Duration,
    /// 0 以外なら、貸し出し前に接続の生存を確認する
    pub health_check_period: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections:     16,
            min_connections:     4,
            max_lifetime:        Duration::from_secs(60 * 60),
            idle_timeout:        Duration::from_secs(15 * 60),
            acquire_timeout:     Duration::from_secs(5),
            health_check_period: Duration::from_secs(60),
        }
    }
}

/// 設定から `PgPoolOptions` を組み立てる
///
/// sqlx のプールには定期ヘルスチェックがないため、`health_check_period` は
/// `test_before_acquire` の有効・無効として反映する。
pub fn pool_options(settings: &PoolSettings) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .max_lifetime(settings.max_lifetime)
        .idle_timeout(settings.idle_timeout)
        .acquire_timeout(settings.acquire_timeout)
        .test_before_acquire(!settings.health_check_period.is_zero())
}

/// PostgreSQL 接続プールを作成する
///
/// アプリケーション起動時に一度だけ呼び出し、作成したプールを共有する。
/// `min_connections` 分の接続を確立できなければエラーを返す。
pub async fn create_pool(
    connect_options: PgConnectOptions,
    settings: &PoolSettings,
) -> Result<PgPool, sqlx::Error> {
    pool_options(settings)
        .connect_with(connect_options)
        .await
}

/// データベースマイグレーションを実行する
///
/// 適用済みのマイグレーションはスキップされる。
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}

/// 疎通確認（`SELECT 1`）を制限時間付きで行う
#[tracing::instrument(skip_all, level = "debug")]
pub async fn ping(pool: &PgPool, limit: Duration) -> Result<(), InfraError> {
    with_timeout(limit, async {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    })
    .await
}

/// 操作を制限時間付きで実行する
///
/// 制限時間を過ぎると `fut` をドロップする。実行中のクエリはドロップによって
/// 中断され、接続はプールに戻らず破棄される。
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, InfraError>
where
    F: Future<Output = Result<T, InfraError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(InfraError::timeout(limit)),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    };

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::InfraErrorKind;

    #[tokio::test]
    async fn test_with_timeout_期限内に終われば結果をそのまま返す() {
        let result = with_timeout(Duration::from_secs(1), async { Ok::<_, InfraError>(42) }).await;

        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_timeout_内側のエラーはそのまま返す() {
        let result: Result<(), _> = with_timeout(Duration::from_secs(1), async {
            Err(InfraError::unexpected("boom"))
        })
        .await;

        assert!(matches!(
            result.unwrap_err().kind(),
            InfraErrorKind::Unexpected(msg) if msg == "boom"
        ));
    }

    #[tokio::test]
    async fn test_with_timeout_期限切れでtimeoutを返し処理を中断する() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);

        let result = with_timeout(Duration::from_millis(20), async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            flag.store(true, Ordering::SeqCst);
            Ok::<_, InfraError>(())
        })
        .await;

        assert!(matches!(
            result.unwrap_err().kind(),
            InfraErrorKind::Timeout(d) if *d == Duration::from_millis(20)
        ));
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(!finished.load(Ordering::SeqCst), "ドロップされた処理は再開しない");
    }

    #[test]
    fn test_pool_settingsの既定値() {
        let settings = PoolSettings::default();

        assert_eq!(settings.max_connections, 16);
        assert_eq!(settings.min_connections, 4);
        assert_eq!(settings.max_lifetime, Duration::from_secs(3600));
        assert_eq!(settings.idle_timeout, Duration::from_secs(900));
        assert_eq!(settings.health_check_period, Duration::from_secs(60));
    }

    #[test]
    fn test_pool_optionsに設定値が反映される() {
        let settings = PoolSettings {
            max_connections: 3,
            min_connections: 1,
            health_check_period: Duration::ZERO,
            ..PoolSettings::default()
        };

        let options = pool_options(&settings);

        assert_eq!(options.get_max_connections(), 3);
        assert_eq!(options.get_min_connections(), 1);
        assert!(!options.get_test_before_acquire());
    }
}
