//! # ヘルスチェックハンドラ
//!
//! ## エンドポイント
//!
//! ```text
//! GET /livez    プロセスの稼働確認（依存先は確認しない）
//! GET /readyz   DB に ping し、受け付け可能かを返す
//! ```
//!
//! どちらもリクエストログには出力しない。

use std::{sync::Arc, time::Duration};

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use lexitrack_infra::db;
use lexitrack_shared::{CheckStatus, HealthResponse, ReadinessResponse};
use sqlx::PgPool;

/// Liveness エンドポイント
///
/// 常に 200 を返す。
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy(env!("CARGO_PKG_VERSION")))
}

/// Readiness Check 用の State
pub struct ReadinessState {
    pub pool:    PgPool,
    /// ping の上限時間
    pub timeout: Duration,
}

/// Readiness エンドポイント
///
/// ping が上限時間内に成功すれば 200、失敗・タイムアウトは 503。
#[tracing::instrument(skip_all)]
pub async fn readiness_check(State(state): State<Arc<ReadinessState>>) -> impl IntoResponse {
    let response = ReadinessResponse::default().check(
        "database",
        check_database(&state.pool, state.timeout).await,
    );

    let status = if response.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

async fn check_database(pool: &PgPool, timeout: Duration) -> CheckStatus {
    match db::ping(pool, timeout).await {
        Ok(()) => CheckStatus::Ok,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check: database ping failed");
            CheckStatus::Error
        }
    }
}
