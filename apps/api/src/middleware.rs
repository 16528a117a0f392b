//! # HTTP ミドルウェア
//!
//! ## レイヤー配置
//!
//! ```text
//! strip_client_trace_id → SetRequestIdLayer → PropagateRequestIdLayer → scope_trace_id
//!     → TraceLayer → RequestLogLayer → CatchPanicLayer → TimeoutLayer → handler
//! ```
//!
//! いずれも `Router::layer` で適用するため、ルーティング後に実行され
//! [`MatchedPath`] を参照できる。

pub mod request_log;
pub mod trace_id;

use axum::{body::Body, extract::MatchedPath, http::Request};
pub use request_log::RequestLogLayer;
pub use trace_id::{scope_trace_id, strip_client_trace_id};
use tracing::Span;

/// 一致したルートのテンプレート（未一致は `-`）
///
/// 実際のパスはメールアドレス等を含みうるため、ログにはテンプレートのみを出す。
pub(crate) fn route_template<B>(req: &Request<B>) -> String {
    req.extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "-".to_string(), |p| p.as_str().to_owned())
}

/// `TraceLayer` のリクエストスパンを作成する
pub fn make_request_span(req: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        method = %req.method(),
        path = %route_template(req),
    )
}
