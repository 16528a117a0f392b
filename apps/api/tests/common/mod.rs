//! ルーター結合テストの共通ヘルパー
//!
//! モックリポジトリ・メモリ出力のロガー・固定時刻を注入したルーターを組み立て、
//! `oneshot` でリクエストを送る。

#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode},
};
use chrono::{DateTime, TimeZone, Utc};
use lexitrack_api::{
    app_builder::{AppDependencies, Repositories, build_router},
    config::TimeoutConfig,
};
use lexitrack_domain::clock::FixedClock;
use lexitrack_infra::mock::{
    MockUserProgressRepository,
    MockUserRepository,
    MockUserSessionRepository,
    MockUserStatisticsRepository,
    MockUserWordSetRepository,
};
use lexitrack_shared::observability::{
    Level,
    Logger,
    LoggerConfig,
    LoggerLayer,
    MemorySink,
    RedactionPolicy,
    TRACE_ID_HEADER,
};
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use tower::ServiceExt;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::layer::SubscriberExt;

pub fn now() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

/// テスト対象のルーターと、その裏側のモック
pub struct TestApp {
    pub router:     Router,
    pub logger:     Logger,
    pub sink:       MemorySink,
    pub users:      MockUserRepository,
    pub statistics: MockUserStatisticsRepository,
    pub progress:   MockUserProgressRepository,
    pub sessions:   MockUserSessionRepository,
    pub word_sets:  MockUserWordSetRepository,
}

/// HTTP レスポンスを検証しやすい形にしたもの
pub struct TestResponse {
    pub status:  StatusCode,
    pub headers: HeaderMap,
    /// ボディが空なら `Value::Null`
    pub body:    Value,
}

impl TestResponse {
    pub fn trace_id(&self) -> Option<&str> {
        self.headers
            .get(TRACE_ID_HEADER)
            .and_then(|v| v.to_str().ok())
    }

    /// エラーレスポンスの `code`
    pub fn error_code(&self) -> &str {
        self.body["code"].as_str().unwrap_or_default()
    }
}

/// 到達できない PostgreSQL を指す遅延接続プール
///
/// readiness が 503 を返すことの検証に使う。
fn unreachable_pool() -> sqlx::PgPool {
    let options = PgConnectOptions::new()
        .host("127.0.0.1")
        .port(1)
        .username("postgres")
        .password("postgres");
    PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(200))
        .connect_lazy_with(options)
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_timeouts(TimeoutConfig {
            per_request: Duration::from_millis(500),
            ..TimeoutConfig::default()
        })
    }

    pub fn with_timeouts(timeouts: TimeoutConfig) -> Self {
        let sink = MemorySink::new();
        let logger = Logger::new(
            LoggerConfig::new("lexitrack-api", "test", "0.0.0", Level::Debug),
            RedactionPolicy::default(),
            Arc::new(sink.clone()),
        );

        let users = MockUserRepository::new();
        let statistics = MockUserStatisticsRepository::new().linked_to(&users);
        let progress = MockUserProgressRepository::new().linked_to(&users);
        let sessions = MockUserSessionRepository::new().linked_to(&users);
        let word_sets = MockUserWordSetRepository::new().linked_to(&users);

        let router = build_router(AppDependencies {
            logger: logger.clone(),
            pool: unreachable_pool(),
            timeouts,
            repositories: Repositories {
                users:      Arc::new(users.clone()),
                statistics: Arc::new(statistics.clone()),
                progress:   Arc::new(progress.clone()),
                sessions:   Arc::new(sessions.clone()),
                word_sets:  Arc::new(word_sets.clone()),
            },
            clock: Arc::new(FixedClock::new(now())),
        });

        Self {
            router,
            logger,
            sink,
            users,
            statistics,
            progress,
            sessions,
            word_sets,
        }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, None).await
    }

    /// ユーザーを作成し、その ID を返す
    pub async fn create_user(&self, name: &str) -> String {
        let response = self
            .post(
                "/api/v1/users",
                serde_json::json!({
                    "username": name,
                    "email": format!("{name}@example.com"),
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["data"]["id"].as_str().unwrap().to_string()
    }

    /// `tracing` のイベントもこのアプリのロガーに流す
    ///
    /// 戻り値を保持している間、現在のスレッドでのみ有効。
    pub fn capture_tracing(&self) -> DefaultGuard {
        let subscriber = tracing_subscriber::registry().with(LoggerLayer::new(self.logger.clone()));
        tracing::subscriber::set_default(subscriber)
    }

    /// `msg` が "HTTP Request" のログレコード
    pub fn request_logs(&self) -> Vec<Value> {
        self.sink
            .records()
            .into_iter()
            .filter(|r| r["msg"] == "HTTP Request")
            .collect()
    }
}
