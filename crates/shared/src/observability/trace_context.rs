//! # トレース ID 伝播
//!
//! リクエストごとに一意なトレース ID を採番し、リクエスト処理の呼び出し経路全体から
//! 引数なしで参照できるようにする。
//!
//! ## 仕組み
//!
//! tower-http の `request-id` レイヤーに ID の生成を任せ、ここでは次を提供する。
//!
//! 1. [`MakeTraceId`]: `SetRequestIdLayer` に渡す UUID v7 の採番
//! 2. [`trace_id_of`]: リクエスト extensions の `RequestId` からの取り出し
//! 3. [`TraceId::scope`]: 内側の処理を task-local のスコープに入れる
//!
//! レスポンスへの `X-Trace-Id` 付与は `PropagateRequestIdLayer` が行う。
//!
//! ハンドラやユースケースは [`current_trace_id`] で ID を取得する。
//! [`Logger`](super::Logger) は出力時に自動で参照するため、通常は意識しなくてよい。
//!
//! task-local はタスクをまたがない。リクエスト処理中に `tokio::spawn` する場合は
//! [`in_current_trace`] で包む。

use std::{fmt, future::Future};

use http::{HeaderName, HeaderValue, Request};
use serde::Serialize;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// トレース ID を載せるヘッダー名
pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// [`TRACE_ID_HEADER`] の [`HeaderName`]
pub const TRACE_ID_HEADER_NAME: HeaderName = HeaderName::from_static(TRACE_ID_HEADER);

tokio::task_local! {
    static TRACE_ID: TraceId;
}

/// リクエスト単位のトレース ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TraceId(String);

impl TraceId {
    /// 新しいトレース ID を生成する（UUID v7）
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// 既存の文字列からトレース ID を作成する
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// このトレース ID をスコープとして `fut` を実行する
    pub async fn scope<F: Future>(self, fut: F) -> F::Output {
        TRACE_ID.scope(self, fut).await
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 現在のリクエストのトレース ID を取得する
///
/// リクエスト処理のスコープ外（起動処理・テスト等）では `None` を返す。
pub fn current_trace_id() -> Option<TraceId> {
    TRACE_ID.try_with(TraceId::clone).ok()
}

/// 呼び出し時点のトレース ID を引き継ぐ Future を返す
///
/// ID は呼び出した時点で取得する。`tokio::spawn(in_current_trace(fut))` のように使う。
pub fn in_current_trace<F: Future>(fut: F) -> impl Future<Output = F::Output> {
    let trace_id = current_trace_id();
    async move {
        match trace_id {
            Some(id) => TRACE_ID.scope(id, fut).await,
            None => fut.await,
        }
    }
}

/// `X-Trace-Id` に UUID v7 を採番する [`MakeRequestId`]
///
/// `SetRequestIdLayer` は既存のヘッダー値を優先するため、クライアントが送ってきた
/// `X-Trace-Id` は手前で取り除いておく。
///
/// ```
/// use http::Request;
/// use lexitrack_shared::observability::MakeTraceId;
/// use tower_http::request_id::MakeRequestId;
///
/// let id = MakeTraceId.make_request_id(&Request::new(())).unwrap();
/// assert_eq!(id.header_value().len(), 36);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct MakeTraceId;

impl MakeRequestId for MakeTraceId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(TraceId::new().as_str())
            .ok()
            .map(RequestId::new)
    }
}

/// `SetRequestIdLayer` が付けた [`RequestId`] をトレース ID として読む
///
/// 値が文字列として読めない場合は新しく採番する。
pub fn trace_id_of<B>(request: &Request<B>) -> TraceId {
    request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .map_or_else(TraceId::new, TraceId::from_string)
}
