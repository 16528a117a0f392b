//! # リクエスト抽出
//!
//! axum 標準の extractor の失敗を [`ApiError`] に揃える。
//!
//! | 対象 | 失敗時 |
//! |------|--------|
//! | JSON ボディ（[`ValidJson`]） | `DECODE_FAILED` |
//! | クエリ（[`ValidQuery`]） | `VALIDATION_ERROR`（[`ApiError::InvalidQuery`]） |
//! | パスの UUID（[`parse_uuid`]） | `UUID_PARSING_FAILED` |

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::ApiError;

/// JSON ボディ
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::Decode(rejection.body_text())),
        }
    }
}

/// クエリパラメータ
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::InvalidQuery(rejection.body_text())),
        }
    }
}

/// パスパラメータを UUID として解釈する
///
/// 入力値はメッセージに含めない（レスポンスと警告ログに載る）。
pub fn parse_uuid(field: &str, value: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(value)
        .map_err(|_| ApiError::InvalidUuid(format!("{field} は UUID である必要があります")))
}
