//! # リソース API の結合テスト
//!
//! モックリポジトリを注入したルーターで、各リソースの CRUD と
//! エラーコードの振り分けを検証する。

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use common::TestApp;
use lexitrack_api::config::TimeoutConfig;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

const UNKNOWN_ID: &str = "018f0000-0000-7000-8000-000000000000";

// ===== ユーザー =====

#[tokio::test]
async fn test_ユーザーのcrudが一通り動く() {
    let app = TestApp::new();

    let id = app.create_user("alice").await;

    let fetched = app.get(&format!("/api/v1/users/{id}")).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["data"]["username"], "alice");
    assert_eq!(fetched.body["data"]["created_at"], "2023-11-14T22:13:20+00:00");

    let updated = app
        .put(
            &format!("/api/v1/users/{id}"),
            json!({ "username": "alice2", "email": "alice2@example.com" }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["data"]["username"], "alice2");

    let deleted = app.delete(&format!("/api/v1/users/{id}")).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert_eq!(deleted.body, serde_json::Value::Null);

    let missing = app.get(&format!("/api/v1/users/{id}")).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.error_code(), "NOT_FOUND");
}

#[tokio::test]
async fn test_ユーザー一覧はlimitとoffsetを返す() {
    let app = TestApp::new();
    for name in ["alice", "bob", "carol"] {
        app.create_user(name).await;
    }

    let response = app.get("/api/v1/users?limit=2&offset=1").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"].as_array().unwrap().len(), 2);
    assert_eq!(response.body["limit"], 2);
    assert_eq!(response.body["offset"], 1);
}

#[tokio::test]
async fn test_ユーザー一覧の既定のlimitは20() {
    let app = TestApp::new();

    let response = app.get("/api/v1/users").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["limit"], 20);
    assert_eq!(response.body["offset"], 0);
}

#[tokio::test]
async fn test_重複したメールアドレスは409を返す() {
    let app = TestApp::new();
    app.create_user("alice").await;

    let response = app
        .post(
            "/api/v1/users",
            json!({ "username": "alice_other", "email": "alice@example.com" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.error_code(), "CONFLICT");
    assert_eq!(response.body["detail"], "メールアドレスは既に使用されています");
}

#[tokio::test]
async fn test_存在しないメールアドレスの検索は404を返す() {
    let app = TestApp::new();

    let response = app.get("/api/v1/users/email/nobody@example.com").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(
        !response.body["detail"]
            .as_str()
            .unwrap()
            .contains("nobody@example.com")
    );
}

// ===== エラーコード =====

#[rstest]
#[case::不正なjson("{\"username\": ", "DECODE_FAILED")]
#[case::必須フィールドの欠落("{\"username\": \"alice\"}", "DECODE_FAILED")]
#[case::短すぎるユーザー名(
    "{\"username\": \"al\", \"email\": \"al@example.com\"}",
    "VALIDATION_ERROR"
)]
#[case::不正なメールアドレス(
    "{\"username\": \"alice\", \"email\": \"alice.example.com\"}",
    "VALIDATION_ERROR"
)]
#[tokio::test]
async fn test_ユーザー作成の入力エラーは400とエラーコードを返す(
    #[case] body: &str,
    #[case] expected: &str,
) {
    let app = TestApp::new();

    let response = app
        .send(
            axum::http::Request::builder()
                .method("POST")
                .uri("/api/v1/users")
                .header("content-type", "application/json")
                .body(axum::body::Body::from(body.to_string()))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), expected);
    assert_eq!(response.body["status"], 400);
}

#[rstest]
#[case::上限超過("/api/v1/users?limit=101")]
#[case::負のlimit("/api/v1/users?limit=-1")]
#[case::負のoffset("/api/v1/users?offset=-1")]
#[case::数値でない("/api/v1/users?limit=abc")]
#[tokio::test]
async fn test_不正なページ指定は400のvalidation_errorを返す(#[case] uri: &str) {
    let app = TestApp::new();

    let response = app.get(uri).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "VALIDATION_ERROR");
}

#[rstest]
#[case("/api/v1/users/not-a-uuid")]
#[case("/api/v1/statistics/not-a-uuid")]
#[case("/api/v1/progress/not-a-uuid")]
#[case("/api/v1/sessions/not-a-uuid")]
#[case("/api/v1/word-sets/not-a-uuid")]
#[case("/api/v1/users/not-a-uuid/sessions")]
#[tokio::test]
async fn test_パスのidがuuidでなければ400のuuid_parsing_failedを返す(#[case] uri: &str) {
    let app = TestApp::new();

    let response = app.get(uri).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "UUID_PARSING_FAILED");
}

#[tokio::test]
async fn test_ボディのuser_idがuuidでなければdecode_failedを返す() {
    let app = TestApp::new();

    let response = app
        .post("/api/v1/statistics", json!({ "user_id": "not-a-uuid" }))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "DECODE_FAILED");
}

#[tokio::test]
async fn test_リポジトリ障害は500の固定メッセージを返す() {
    let app = TestApp::new();
    app.users.set_unavailable(true);

    let response = app.get("/api/v1/users").await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.error_code(), "INFRASTRUCTURE_UNEXPECTED");
    assert_eq!(response.body["detail"], "内部エラーが発生しました");
    let failed = app
        .sink
        .records()
        .into_iter()
        .find(|r| r["operation"] == "user.list" && r["level"] == "ERROR");
    assert!(failed.is_some(), "{}", app.sink.contents());
}

#[tokio::test]
async fn test_リポジトリ呼び出しがタイムアウトすると500を返す() {
    let app = TestApp::with_timeouts(TimeoutConfig {
        per_request: Duration::from_millis(20),
        ..TimeoutConfig::default()
    });
    app.users.set_delay(Duration::from_millis(500));

    let response = app.get("/api/v1/users").await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.error_code(), "INFRASTRUCTURE_UNEXPECTED");
}

// ===== 学習統計 =====

#[tokio::test]
async fn test_学習統計のcrudが一通り動く() {
    let app = TestApp::new();
    let user_id = app.create_user("alice").await;

    let created = app
        .post(
            "/api/v1/statistics",
            json!({
                "user_id": user_id,
                "total_words_learned": 10,
                "accuracy": 87.5,
                "total_time": 300,
            }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["data"]["accuracy"], 87.5);

    let duplicated = app
        .post("/api/v1/statistics", json!({ "user_id": user_id }))
        .await;
    assert_eq!(duplicated.status, StatusCode::CONFLICT);

    let updated = app
        .put(
            &format!("/api/v1/statistics/{user_id}"),
            json!({ "total_words_learned": 20, "accuracy": 90.0, "total_time": 600 }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["data"]["total_words_learned"], 20);

    let listed = app.get("/api/v1/statistics").await;
    assert_eq!(listed.body["data"].as_array().unwrap().len(), 1);

    let deleted = app.delete(&format!("/api/v1/statistics/{user_id}")).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let missing = app.get(&format!("/api/v1/statistics/{user_id}")).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_存在しないユーザーの学習統計作成は404を返す() {
    let app = TestApp::new();

    let response = app
        .post("/api/v1/statistics", json!({ "user_id": UNKNOWN_ID }))
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["detail"], "参照先のユーザーが見つかりません");
}

#[rstest]
#[case::正答率が範囲外(json!({ "accuracy": 100.5 }))]
#[case::負の学習語数(json!({ "total_words_learned": -1 }))]
#[tokio::test]
async fn test_範囲外の学習統計は400を返す(#[case] values: serde_json::Value) {
    let app = TestApp::new();
    let user_id = app.create_user("alice").await;
    let mut body = values;
    body["user_id"] = json!(user_id);

    let response = app.post("/api/v1/statistics", body).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "VALIDATION_ERROR");
}

// ===== 進捗 =====

#[tokio::test]
async fn test_進捗のcrudが一通り動く() {
    let app = TestApp::new();
    let user_id = app.create_user("alice").await;
    let word_id = uuid::Uuid::now_v7().to_string();

    let created = app
        .post(
            "/api/v1/progress",
            json!({ "user_id": user_id, "word_id": word_id, "correct_count": 1 }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["data"]["incorrect_count"], 0);
    let id = created.body["data"]["id"].as_str().unwrap().to_string();

    let by_word = app
        .get(&format!("/api/v1/users/{user_id}/progress/{word_id}"))
        .await;
    assert_eq!(by_word.status, StatusCode::OK);
    assert_eq!(by_word.body["data"]["id"], id.as_str());

    let duplicated = app
        .post(
            "/api/v1/progress",
            json!({ "user_id": user_id, "word_id": word_id }),
        )
        .await;
    assert_eq!(duplicated.status, StatusCode::CONFLICT);

    let updated = app
        .put(
            &format!("/api/v1/progress/{id}"),
            json!({ "correct_count": 5, "incorrect_count": 2 }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["data"]["correct_count"], 5);

    let listed = app.get(&format!("/api/v1/users/{user_id}/progress")).await;
    assert_eq!(listed.body["data"].as_array().unwrap().len(), 1);

    let deleted = app.delete(&format!("/api/v1/progress/{id}")).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let deleted_again = app.delete(&format!("/api/v1/progress/{id}")).await;
    assert_eq!(deleted_again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_負のカウントの進捗は400を返す() {
    let app = TestApp::new();
    let user_id = app.create_user("alice").await;

    let response = app
        .post(
            "/api/v1/progress",
            json!({
                "user_id": user_id,
                "word_id": uuid::Uuid::now_v7(),
                "incorrect_count": -5,
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "VALIDATION_ERROR");
}

// ===== セッション =====

#[tokio::test]
async fn test_セッションの開始から完了までが動く() {
    let app = TestApp::new();
    let user_id = app.create_user("alice").await;

    let created = app
        .post("/api/v1/sessions", json!({ "user_id": user_id }))
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["data"]["status"], "active");
    assert_eq!(created.body["data"]["ended_at"], serde_json::Value::Null);
    let id = created.body["data"]["id"].as_str().unwrap().to_string();

    let active = app.get("/api/v1/sessions/active").await;
    assert_eq!(active.status, StatusCode::OK);
    assert_eq!(active.body["data"].as_array().unwrap().len(), 1);

    let completed = app
        .put(
            &format!("/api/v1/sessions/{id}"),
            json!({ "status": "completed" }),
        )
        .await;
    assert_eq!(completed.status, StatusCode::OK);
    assert_eq!(completed.body["data"]["status"], "completed");
    assert_eq!(
        completed.body["data"]["ended_at"],
        "2023-11-14T22:13:20+00:00"
    );

    let active = app.get("/api/v1/sessions/active").await;
    assert_eq!(active.body["data"].as_array().unwrap().len(), 0);

    let listed = app.get(&format!("/api/v1/users/{user_id}/sessions")).await;
    assert_eq!(listed.body["data"].as_array().unwrap().len(), 1);

    let deleted = app.delete(&format!("/api/v1/sessions/{id}")).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
}

#[rstest]
#[case::未知のステータス(json!({ "status": "paused" }))]
#[case::activeにended_at(json!({ "status": "active", "ended_at": "2023-11-15T00:00:00Z" }))]
#[case::開始前のended_at(json!({ "status": "completed", "ended_at": "2020-01-01T00:00:00Z" }))]
#[tokio::test]
async fn test_不正なセッション更新は400を返す(#[case] body: serde_json::Value) {
    let app = TestApp::new();
    let user_id = app.create_user("alice").await;
    let created = app
        .post("/api/v1/sessions", json!({ "user_id": user_id }))
        .await;
    let id = created.body["data"]["id"].as_str().unwrap().to_string();

    let response = app.put(&format!("/api/v1/sessions/{id}"), body).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "VALIDATION_ERROR");
}

// ===== 単語セット =====

#[tokio::test]
async fn test_単語セット割り当てのcrudが一通り動く() {
    let app = TestApp::new();
    let user_id = app.create_user("alice").await;
    let word_set_id = uuid::Uuid::now_v7().to_string();

    let created = app
        .post(
            "/api/v1/word-sets",
            json!({ "user_id": user_id, "word_set_id": word_set_id }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let id = created.body["data"]["id"].as_str().unwrap().to_string();

    let fetched = app.get(&format!("/api/v1/word-sets/{id}")).await;
    assert_eq!(fetched.body["data"]["word_set_id"], word_set_id.as_str());

    let other_set = uuid::Uuid::now_v7().to_string();
    let updated = app
        .put(
            &format!("/api/v1/word-sets/{id}"),
            json!({ "word_set_id": other_set }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["data"]["word_set_id"], other_set.as_str());

    let listed = app.get(&format!("/api/v1/users/{user_id}/word-sets")).await;
    assert_eq!(listed.body["data"].as_array().unwrap().len(), 1);

    let deleted = app.delete(&format!("/api/v1/word-sets/{id}")).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_存在しないユーザーへの単語セット割り当ては404を返す() {
    let app = TestApp::new();

    let response = app
        .post(
            "/api/v1/word-sets",
            json!({ "user_id": UNKNOWN_ID, "word_set_id": uuid::Uuid::now_v7() }),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.error_code(), "NOT_FOUND");
}

// ===== ヘルスチェック =====

#[tokio::test]
async fn test_dbに接続できなければreadyzは503を返す() {
    let app = TestApp::new();

    let response = app.get("/readyz").await;

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.body["status"], "not_ready");
    assert!(response.trace_id().is_some());
}
