//! # リクエストログ
//!
//! リクエスト完了時に、メソッド・ルート・ステータス・処理時間を 1 行で出力する
//! tower Layer。
//!
//! - 出力は [`Logger`] 経由（`trace_id` は task-local から付与される）
//! - `path` は一致したルートのテンプレート。パスパラメータはログに残らない
//! - `/livez` と `/readyz` は出力しない

use std::{
    fmt::Display,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Instant,
};

use axum::http::{Request, Response};
use lexitrack_shared::observability::{Field, Logger};
use tower::{Layer, Service};

use super::route_template;

const PROBE_PATHS: [&str; 2] = ["/livez", "/readyz"];

const MESSAGE: &str = "HTTP Request";

fn is_probe_path(path: &str) -> bool {
    PROBE_PATHS.contains(&path)
}

/// リクエストログを出力する Layer
#[derive(Clone)]
pub struct RequestLogLayer {
    logger: Logger,
}

impl RequestLogLayer {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

impl<S> Layer<S> for RequestLogLayer {
    type Service = RequestLogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLogService {
            inner,
            logger: self.logger.clone(),
        }
    }
}

/// [`RequestLogLayer`] が生成する Service
#[derive(Clone)]
pub struct RequestLogService<S> {
    inner:  S,
    logger: Logger,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RequestLogService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Display + 'static,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;
    type Response = S::Response;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        // clone-swap パターン: poll_ready で得た readiness を保持する inner を使う
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        if is_probe_path(req.uri().path()) {
            return Box::pin(async move { inner.call(req).await });
        }

        let logger = self.logger.clone();
        let method = req.method().to_string();
        let path = route_template(&req);
        let start = Instant::now();

        Box::pin(async move {
            let result = inner.call(req).await;
            let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

            match &result {
                Ok(response) => logger.info(
                    MESSAGE,
                    [
                        Field::new("method", method),
                        Field::new("path", path),
                        Field::new("status", response.status().as_u16()),
                        Field::new("duration_ms", duration_ms),
                    ],
                ),
                Err(err) => logger.error(
                    MESSAGE,
                    [
                        Field::new("method", method),
                        Field::new("path", path),
                        Field::new("duration_ms", duration_ms),
                        Field::new("error", err.to_string()),
                    ],
                ),
            }

            result
        })
    }
}
