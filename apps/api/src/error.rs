//! # API エラー定義
//!
//! ハンドラ・ユースケースで発生するエラーと、HTTP レスポンスへの変換を定義する。
//!
//! ## エラーの階層
//!
//! ```text
//! DomainError ─┐
//!              ├─▶ ApiError ──IntoResponse──▶ StatusCode + ErrorResponse（RFC 9457）
//! InfraError ──┘
//! ```
//!
//! ## ログ出力の分担
//!
//! ユースケース由来の失敗はユースケースがログを出力済みのため、ここでは出力しない。
//! 抽出段階で失敗した `Decode` / `InvalidQuery` / `InvalidUuid` と、経路不明の
//! `Internal` のみここで出力する。

use std::any::Any;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lexitrack_domain::DomainError;
use lexitrack_infra::InfraError;
use lexitrack_shared::ErrorResponse;
use thiserror::Error;

/// API 層で発生するエラー
#[derive(Debug, Error)]
pub enum ApiError {
    /// 入力値の検証失敗（400）
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// リソースが存在しない（404）
    #[error("リソースが見つかりません: {0}")]
    NotFound(String),

    /// 一意制約違反（409）
    #[error("競合が発生しました: {0}")]
    Conflict(String),

    /// リクエストボディの JSON を解釈できない（400）
    #[error("リクエストボディを解釈できません: {0}")]
    Decode(String),

    /// クエリパラメータを解釈できない（400, `VALIDATION_ERROR`）
    #[error("クエリパラメータが不正です: {0}")]
    InvalidQuery(String),

    /// パスの UUID を解釈できない（400）
    #[error("ID の形式が不正です: {0}")]
    InvalidUuid(String),

    /// DB 障害・タイムアウト（500）
    #[error("インフラエラー: {0}")]
    Infra(#[from] InfraError),

    /// その他の予期しないエラー（500）
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => Self::Validation(msg),
            e @ DomainError::NotFound { .. } => Self::NotFound(e.to_string()),
            DomainError::Conflict(msg) => Self::Conflict(msg),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::Decode(_)
            | Self::InvalidQuery(_)
            | Self::InvalidUuid(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Infra(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn to_error_response(&self) -> ErrorResponse {
        match self {
            Self::Validation(msg) | Self::InvalidQuery(msg) => {
                ErrorResponse::validation_error(msg.clone())
            }
            Self::NotFound(msg) => ErrorResponse::not_found(msg.clone()),
            Self::Conflict(msg) => ErrorResponse::conflict(msg.clone()),
            Self::Decode(msg) => ErrorResponse::decode_failed(msg.clone()),
            Self::InvalidUuid(msg) => ErrorResponse::uuid_parsing_failed(msg.clone()),
            Self::Infra(_) | Self::Internal(_) => ErrorResponse::internal_error(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Decode(msg) | Self::InvalidQuery(msg) | Self::InvalidUuid(msg) => {
                tracing::warn!(error = %msg, "リクエストを解釈できません");
            }
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "内部エラー");
            }
            _ => {}
        }

        (self.status(), Json(self.to_error_response())).into_response()
    }
}

/// `CatchPanicLayer` 用のパニックハンドラ
///
/// パニックの内容はログにのみ出力し、クライアントには固定の 500 を返す。
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };

    tracing::error!(error = %detail, "ハンドラがパニックしました");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::internal_error()),
    )
        .into_response()
}
