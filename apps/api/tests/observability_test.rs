//! # トレース ID とリクエストログの結合テスト
//!
//! 本番と同じレイヤー構成のルーターに対して、次を検証する。
//!
//! - 成功・失敗・プローブのいずれのレスポンスにも `X-Trace-Id` が付く
//! - リクエストログの `trace_id` がレスポンスヘッダーと一致する
//! - リクエストログの `path` はルートテンプレートで、メールアドレスを含まない
//! - ユースケースのログにメールアドレスが平文で残らない
//! - 並行したリクエストのログが互いの `trace_id` に混ざらない

mod common;

use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::TestApp;
use lexitrack_shared::observability::TRACE_ID_HEADER;
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn test_livezのレスポンスにx_trace_idが含まれる() {
    let app = TestApp::new();

    let response = app.get("/livez").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
    let trace_id = response.trace_id().expect("x-trace-id ヘッダーが含まれること");
    let uuid = uuid::Uuid::parse_str(trace_id).unwrap();
    assert_eq!(uuid.get_version(), Some(uuid::Version::SortRand));
}

#[tokio::test]
async fn test_プローブはリクエストログを出力しない() {
    let app = TestApp::new();

    app.get("/livez").await;

    assert!(app.request_logs().is_empty());
}

#[tokio::test]
async fn test_未定義のパスは404でもx_trace_idが含まれる() {
    let app = TestApp::new();

    let response = app.get("/api/v1/unknown").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.error_code(), "NOT_FOUND");
    assert!(response.trace_id().is_some());
}

#[tokio::test]
async fn test_クライアント提供のx_trace_idは採用されない() {
    let app = TestApp::new();

    let response = app
        .send(
            Request::builder()
                .uri("/livez")
                .header(TRACE_ID_HEADER, "client-chosen")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_ne!(response.trace_id(), Some("client-chosen"));
}

#[tokio::test]
async fn test_リクエストログのtrace_idがレスポンスヘッダーと一致する() {
    let app = TestApp::new();
    app.create_user("alice").await;
    let before = app.request_logs().len();

    let response = app.get("/api/v1/users?limit=10").await;

    assert_eq!(response.status, StatusCode::OK);
    let logs = app.request_logs();
    assert_eq!(logs.len(), before + 1);
    let record = logs.last().unwrap();
    assert_eq!(record["level"], "INFO");
    assert_eq!(record["method"], "GET");
    assert_eq!(record["path"], "/api/v1/users");
    assert_eq!(record["status"], 200);
    assert!(record["duration_ms"].is_u64());
    assert_eq!(record["trace_id"].as_str(), response.trace_id());
}

#[tokio::test]
async fn test_同じリクエスト内のログは同じtrace_idを持つ() {
    let app = TestApp::new();

    let response = app
        .post(
            "/api/v1/users",
            json!({ "username": "alice", "email": "alice@example.com" }),
        )
        .await;

    let trace_id = response.trace_id().unwrap();
    let records = app.sink.records();
    let operation_logs: Vec<_> = records
        .iter()
        .filter(|r| r["operation"] == "user.create")
        .collect();
    assert!(!operation_logs.is_empty());
    for record in records {
        assert_eq!(record["trace_id"].as_str(), Some(trace_id), "{record}");
    }
}

#[tokio::test]
async fn test_連続したリクエストはそれぞれ別のtrace_idを受け取る() {
    let app = TestApp::new();

    let first = app.get("/api/v1/users").await;
    let second = app.get("/api/v1/users").await;

    let logs = app.request_logs();
    assert_eq!(logs.len(), 2);
    assert_ne!(first.trace_id(), second.trace_id());
    assert_eq!(logs[0]["trace_id"].as_str(), first.trace_id());
    assert_eq!(logs[1]["trace_id"].as_str(), second.trace_id());
}

#[tokio::test]
async fn test_メールアドレス検索のログにアドレスが平文で残らない() {
    let app = TestApp::new();
    app.create_user("alice").await;

    let response = app.get("/api/v1/users/email/alice@example.com").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["email"], "alice@example.com");

    let record = app.request_logs().pop().unwrap();
    assert_eq!(record["path"], "/api/v1/users/email/{email}");
    assert!(
        !app.sink.contents().contains("alice@example.com"),
        "ログにメールアドレスが平文で含まれないこと: {}",
        app.sink.contents()
    );
}

#[tokio::test]
async fn test_失敗したリクエストもステータス付きで記録される() {
    let app = TestApp::new();

    let response = app.get("/api/v1/users/not-a-uuid").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let record = app.request_logs().pop().unwrap();
    assert_eq!(record["path"], "/api/v1/users/{user_id}");
    assert_eq!(record["status"], 400);
    assert_eq!(record["trace_id"].as_str(), response.trace_id());
}

#[tokio::test]
async fn test_idの位置に渡したメールアドレスはログにもレスポンスにも残らない() {
    let app = TestApp::new();
    let _guard = app.capture_tracing();

    let response = app.get("/api/v1/users/alice@example.com").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "UUID_PARSING_FAILED");
    assert!(
        !response.body.to_string().contains("alice@example.com"),
        "レスポンスにメールアドレスが含まれないこと: {}",
        response.body
    );

    let warning = app
        .sink
        .records()
        .into_iter()
        .find(|r| r["msg"] == "リクエストを解釈できません")
        .expect("抽出失敗の警告ログが出力されること");
    assert_eq!(warning["level"], "WARN");
    assert_eq!(warning["trace_id"].as_str(), response.trace_id());
    assert!(
        !app.sink.contents().contains("alice@example.com"),
        "ログにメールアドレスが平文で含まれないこと: {}",
        app.sink.contents()
    );
}

#[tokio::test]
async fn test_クエリパラメータの解釈失敗は警告ログに残る() {
    let app = TestApp::new();
    let _guard = app.capture_tracing();

    let response = app.get("/api/v1/users?limit=abc").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "VALIDATION_ERROR");
    let warnings: Vec<_> = app
        .sink
        .records()
        .into_iter()
        .filter(|r| r["level"] == "WARN")
        .collect();
    assert_eq!(warnings.len(), 1, "{warnings:?}");
    assert_eq!(warnings[0]["msg"], "リクエストを解釈できません");
    assert_eq!(warnings[0]["trace_id"].as_str(), response.trace_id());
    assert!(warnings[0]["error"].as_str().unwrap().contains("limit"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_並行リクエストのログはそれぞれのtrace_idに分かれる() {
    const REQUESTS: usize = 16;
    let app = Arc::new(TestApp::new());

    let handles: Vec<_> = (0..REQUESTS)
        .map(|i| {
            let app = Arc::clone(&app);
            tokio::spawn(async move {
                let username = format!("user{i:02}");
                let response = app
                    .post(
                        "/api/v1/users",
                        json!({ "username": username, "email": format!("{username}@example.com") }),
                    )
                    .await;
                (username, response)
            })
        })
        .collect();

    // trace_id → (username, user_id)
    let mut by_trace_id = HashMap::new();
    for handle in handles {
        let (username, response) = handle.await.unwrap();
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        let trace_id = response.trace_id().unwrap().to_string();
        let user_id = response.body["data"]["id"].as_str().unwrap().to_string();
        assert!(
            by_trace_id.insert(trace_id, (username, user_id)).is_none(),
            "trace_id が重複しないこと"
        );
    }

    let mut request_log_counts: HashMap<String, usize> = HashMap::new();
    for record in app.sink.records() {
        let trace_id = record["trace_id"]
            .as_str()
            .unwrap_or_else(|| panic!("trace_id がないレコード: {record}"));
        let (username, user_id) = by_trace_id
            .get(trace_id)
            .unwrap_or_else(|| panic!("どのレスポンスにもない trace_id: {record}"));
        if let Some(logged) = record["username"].as_str() {
            assert_eq!(logged, username, "{record}");
        }
        if let Some(logged) = record["user_id"].as_str() {
            assert_eq!(logged, user_id, "{record}");
        }
        if record["msg"] == "HTTP Request" {
            *request_log_counts.entry(trace_id.to_string()).or_default() += 1;
        }
    }

    assert_eq!(request_log_counts.len(), REQUESTS);
    assert!(request_log_counts.values().all(|&count| count == 1));
}
