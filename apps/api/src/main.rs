//! # Lexitrack API サーバー
//!
//! ## 起動手順
//!
//! 1. 環境変数の読み込み（.env ファイル）と設定の検証
//! 2. ロガーとトレーシングの初期化
//! 3. DB 接続プールの作成と疎通確認
//! 4. マイグレーションの適用（`APP_RUN_MIGRATIONS=true` の場合）
//! 5. ルーターの構築と HTTP サーバーの起動
//!
//! ## 停止
//!
//! SIGINT / SIGTERM で新規接続の受け付けを止め、処理中のリクエストを待つ。
//! `TIMEOUTS_SHUTDOWN` を過ぎても終わらなければエラーで終了する。
//!
//! ## 起動方法
//!
//! ```bash
//! POSTGRES_PASSWORD=postgres cargo run -p lexitrack-api
//! ```

use std::{future::IntoFuture, sync::Arc, time::Duration};

use anyhow::Context;
use lexitrack_api::{
    app_builder::{AppDependencies, Repositories, build_router},
    config::AppConfig,
};
use lexitrack_domain::clock::SystemClock;
use lexitrack_infra::db;
use lexitrack_shared::observability::{Field, Logger, init_tracing};
use tokio::{net::TcpListener, sync::Notify};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 本番環境では .env ファイルは使用せず、環境変数を直接設定する
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().context("設定の読み込みに失敗しました")?;

    let logger = Logger::stdout(config.logger_config(), config.redaction_policy());
    init_tracing(&logger).context("トレーシングの初期化に失敗しました")?;

    logger.info(
        "starting server",
        [
            Field::new("address", config.http.address()),
            Field::new("db_host", config.postgres.host.as_str()),
        ],
    );

    let pool = db::create_pool(config.postgres.connect_options(), &config.pool)
        .await
        .context("データベースへの接続に失敗しました")?;
    db::ping(&pool, config.timeouts.per_request)
        .await
        .context("データベースの疎通確認に失敗しました")?;

    if config.app.run_migrations {
        db::run_migrations(&pool)
            .await
            .context("マイグレーションの適用に失敗しました")?;
        logger.info("migrations applied", []);
    }

    let app = build_router(AppDependencies {
        logger:       logger.clone(),
        pool:         pool.clone(),
        timeouts:     config.timeouts,
        repositories: Repositories::postgres(&pool),
        clock:        Arc::new(SystemClock),
    });

    let listener = TcpListener::bind((config.http.host.as_str(), config.http.port))
        .await
        .with_context(|| format!("{} にバインドできません", config.http.address()))?;
    logger.info(
        "server started",
        [Field::new("address", config.http.address())],
    );

    let result = serve(listener, app, &logger, config.timeouts.shutdown).await;

    pool.close().await;
    logger.info("server stopped", []);

    result
}

/// シグナル受信後、`drain_timeout` 以内に処理中のリクエストが終わるのを待つ
async fn serve(
    listener: TcpListener,
    app: axum::Router,
    logger: &Logger,
    drain_timeout: Duration,
) -> anyhow::Result<()> {
    let signaled = Arc::new(Notify::new());

    let server = axum::serve(listener, app)
        .with_graceful_shutdown({
            let signaled = signaled.clone();
            let logger = logger.clone();
            async move {
                shutdown_signal().await;
                logger.info(
                    "shutdown signal received",
                    [Field::new(
                        "drain_timeout_ms",
                        u64::try_from(drain_timeout.as_millis()).unwrap_or(u64::MAX),
                    )],
                );
                signaled.notify_one();
            }
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => result?,
        () = signaled.notified() => {
            tokio::time::timeout(drain_timeout, &mut server)
                .await
                .map_err(|_| anyhow::anyhow!("処理中のリクエストが {drain_timeout:?} 以内に完了しませんでした"))??;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "SIGINT ハンドラを登録できません");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM ハンドラを登録できません");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
