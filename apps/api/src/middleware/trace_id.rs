//! # トレース ID のスコープ
//!
//! tower-http の `SetRequestIdLayer` / `PropagateRequestIdLayer` で採番と
//! レスポンスヘッダーへの付与を行い、その間に次の 2 つを挟む。
//!
//! ```text
//! strip_client_trace_id → SetRequestIdLayer(MakeTraceId) → PropagateRequestIdLayer
//!     → scope_trace_id → TraceLayer → ...
//! ```
//!
//! - [`strip_client_trace_id`]: クライアントが送ってきた `X-Trace-Id` を捨てる
//! - [`scope_trace_id`]: 採番済みの ID を task-local と extensions に載せる

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use lexitrack_shared::observability::{TRACE_ID_HEADER_NAME, trace_id_of};

/// リクエストから `X-Trace-Id` を取り除く
///
/// `SetRequestIdLayer` は既存のヘッダー値をそのまま採用するため、その外側に置く。
pub async fn strip_client_trace_id(mut request: Request<Body>) -> Request<Body> {
    request.headers_mut().remove(TRACE_ID_HEADER_NAME);
    request
}

/// 内側の処理をトレース ID の task-local スコープで実行する
pub async fn scope_trace_id(mut request: Request<Body>, next: Next) -> Response {
    let trace_id = trace_id_of(&request);
    request.extensions_mut().insert(trace_id.clone());

    trace_id.scope(next.run(request)).await
}
