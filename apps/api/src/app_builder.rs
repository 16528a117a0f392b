//! # アプリケーション構築
//!
//! State の初期化とルーター構築を担当する。
//! `main.rs` はインフラ初期化とサーバー起動に集中する。
//!
//! リポジトリと時刻は [`AppDependencies`] で外部から渡すため、
//! テストではモックを注入したルーターをそのまま検証できる。

use std::sync::Arc;

use axum::{
    Router,
    middleware::{from_fn, map_request},
    routing::{get, post},
};
use lexitrack_domain::clock::Clock;
use lexitrack_infra::repository::{
    PostgresUserProgressRepository,
    PostgresUserRepository,
    PostgresUserSessionRepository,
    PostgresUserStatisticsRepository,
    PostgresUserWordSetRepository,
    UserProgressRepository,
    UserRepository,
    UserSessionRepository,
    UserStatisticsRepository,
    UserWordSetRepository,
};
use lexitrack_shared::observability::{Logger, MakeTraceId, TRACE_ID_HEADER_NAME};
use sqlx::PgPool;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::{RequestBodyTimeoutLayer, TimeoutLayer},
    trace::TraceLayer,
};

use crate::{
    config::TimeoutConfig,
    error::{ApiError, handle_panic},
    handler::{
        ProgressState,
        ReadinessState,
        SessionState,
        StatisticsState,
        UserState,
        WordSetState,
        create_progress,
        create_session,
        create_statistics,
        create_user,
        create_word_set,
        delete_progress,
        delete_session,
        delete_statistics,
        delete_user,
        delete_word_set,
        get_progress,
        get_progress_by_word,
        get_session,
        get_statistics,
        get_user,
        get_user_by_email,
        get_word_set,
        health_check,
        list_active_sessions,
        list_progress,
        list_sessions,
        list_statistics,
        list_users,
        list_word_sets,
        readiness_check,
        update_progress,
        update_session,
        update_statistics,
        update_user,
        update_word_set,
    },
    middleware::{RequestLogLayer, make_request_span, scope_trace_id, strip_client_trace_id},
    usecase::{
        ProgressUseCaseImpl,
        SessionUseCaseImpl,
        StatisticsUseCaseImpl,
        UserUseCaseImpl,
        WordSetUseCaseImpl,
    },
};

/// リソースごとのリポジトリ
#[derive(Clone)]
pub struct Repositories {
    pub users:      Arc<dyn UserRepository>,
    pub statistics: Arc<dyn UserStatisticsRepository>,
    pub progress:   Arc<dyn UserProgressRepository>,
    pub sessions:   Arc<dyn UserSessionRepository>,
    pub word_sets:  Arc<dyn UserWordSetRepository>,
}

impl Repositories {
    /// PostgreSQL 実装で揃える
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            users:      Arc::new(PostgresUserRepository::new(pool.clone())),
            statistics: Arc::new(PostgresUserStatisticsRepository::new(pool.clone())),
            progress:   Arc::new(PostgresUserProgressRepository::new(pool.clone())),
            sessions:   Arc::new(PostgresUserSessionRepository::new(pool.clone())),
            word_sets:  Arc::new(PostgresUserWordSetRepository::new(pool.clone())),
        }
    }
}

/// ルーター構築に必要な依存
pub struct AppDependencies {
    pub logger:       Logger,
    /// readiness の ping 先
    pub pool:         PgPool,
    pub timeouts:     TimeoutConfig,
    pub repositories: Repositories,
    pub clock:        Arc<dyn Clock>,
}

/// ルーターを構築する
///
/// レイヤーは下に書いたものが外側になる:
///
/// 1. `strip_client_trace_id`（最外）: クライアントの `X-Trace-Id` を捨てる
/// 2. `SetRequestIdLayer`: `X-Trace-Id` に UUID v7 を採番する
/// 3. `PropagateRequestIdLayer`: 採番した ID をレスポンスヘッダーに載せる
/// 4. `scope_trace_id`: ID を task-local に載せて内側を実行する
/// 5. `TraceLayer`: メソッドとルートテンプレートを持つスパン
/// 6. `RequestLogLayer`: 完了時のリクエストログ
/// 7. `CatchPanicLayer`: パニックを 500 に変換
/// 8. `TimeoutLayer`: リクエスト全体の上限（408）
/// 9. `RequestBodyTimeoutLayer`: ボディ読み取りの上限
pub fn build_router(deps: AppDependencies) -> Router {
    let AppDependencies {
        logger,
        pool,
        timeouts,
        repositories,
        clock,
    } = deps;
    let per_request = timeouts.per_request;

    let user_state = Arc::new(UserState {
        usecase: UserUseCaseImpl::new(
            repositories.users,
            clock.clone(),
            logger.clone(),
            per_request,
        ),
    });
    let statistics_state = Arc::new(StatisticsState {
        usecase: StatisticsUseCaseImpl::new(
            repositories.statistics,
            clock.clone(),
            logger.clone(),
            per_request,
        ),
    });
    let progress_state = Arc::new(ProgressState {
        usecase: ProgressUseCaseImpl::new(
            repositories.progress,
            clock.clone(),
            logger.clone(),
            per_request,
        ),
    });
    let session_state = Arc::new(SessionState {
        usecase: SessionUseCaseImpl::new(
            repositories.sessions,
            clock.clone(),
            logger.clone(),
            per_request,
        ),
    });
    let word_set_state = Arc::new(WordSetState {
        usecase: WordSetUseCaseImpl::new(
            repositories.word_sets,
            clock,
            logger.clone(),
            per_request,
        ),
    });
    let readiness_state = Arc::new(ReadinessState {
        pool,
        timeout: per_request,
    });

    Router::new()
        .route("/livez", get(health_check))
        .merge(
            Router::new()
                .route("/readyz", get(readiness_check))
                .with_state(readiness_state),
        )
        .merge(
            Router::new()
                .route("/api/v1/users", post(create_user).get(list_users))
                .route(
                    "/api/v1/users/{user_id}",
                    get(get_user).put(update_user).delete(delete_user),
                )
                .route("/api/v1/users/email/{email}", get(get_user_by_email))
                .with_state(user_state),
        )
        .merge(
            Router::new()
                .route(
                    "/api/v1/statistics",
                    post(create_statistics).get(list_statistics),
                )
                .route(
                    "/api/v1/statistics/{user_id}",
                    get(get_statistics)
                        .put(update_statistics)
                        .delete(delete_statistics),
                )
                .with_state(statistics_state),
        )
        .merge(
            Router::new()
                .route("/api/v1/progress", post(create_progress))
                .route(
                    "/api/v1/progress/{id}",
                    get(get_progress)
                        .put(update_progress)
                        .delete(delete_progress),
                )
                .route("/api/v1/users/{user_id}/progress", get(list_progress))
                .route(
                    "/api/v1/users/{user_id}/progress/{word_id}",
                    get(get_progress_by_word),
                )
                .with_state(progress_state),
        )
        .merge(
            Router::new()
                .route("/api/v1/sessions", post(create_session))
                .route("/api/v1/sessions/active", get(list_active_sessions))
                .route(
                    "/api/v1/sessions/{id}",
                    get(get_session).put(update_session).delete(delete_session),
                )
                .route("/api/v1/users/{user_id}/sessions", get(list_sessions))
                .with_state(session_state),
        )
        .merge(
            Router::new()
                .route("/api/v1/word-sets", post(create_word_set))
                .route(
                    "/api/v1/word-sets/{id}",
                    get(get_word_set)
                        .put(update_word_set)
                        .delete(delete_word_set),
                )
                .route("/api/v1/users/{user_id}/word-sets", get(list_word_sets))
                .with_state(word_set_state),
        )
        .fallback(route_not_found)
        .layer(RequestBodyTimeoutLayer::new(timeouts.read))
        .layer(TimeoutLayer::new(timeouts.write))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(RequestLogLayer::new(logger))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(from_fn(scope_trace_id))
        .layer(PropagateRequestIdLayer::new(TRACE_ID_HEADER_NAME))
        .layer(SetRequestIdLayer::new(TRACE_ID_HEADER_NAME, MakeTraceId))
        .layer(map_request(strip_client_trace_id))
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound("指定されたパスは存在しません".to_string())
}
