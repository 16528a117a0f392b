//! # エラーレスポンス（RFC 9457 Problem Details）
//!
//! API 全体で共通のエラーレスポンス構造体を提供する。
//!
//! ## 設計
//!
//! - `ErrorResponse` は純粋なデータ構造（`Serialize` / `Deserialize` のみ）
//! - axum の `IntoResponse` 変換は API クレートの責務（shared に axum 依存を入れない）
//! - RFC 9457 の拡張メンバーとして機械可読な `code` を持つ
//! - 内部エラーの detail は固定文言にし、原因はサーバーログにのみ残す

use serde::{Deserialize, Serialize};

/// error_type URI のベースパス
const ERROR_TYPE_BASE: &str = "https://lexitrack.example.com/errors";

/// 内部エラー時にクライアントへ返す固定 detail
const INTERNAL_ERROR_DETAIL: &str = "内部エラーが発生しました";

/// クライアントが分岐に使うエラーコード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// 入力値の検証失敗
    ValidationError,
    /// リクエストボディの JSON デコード失敗
    DecodeFailed,
    /// パス・クエリの UUID 解析失敗
    UuidParsingFailed,
    /// リソースが存在しない
    NotFound,
    /// 一意制約違反
    Conflict,
    /// DB 障害・タイムアウトなどインフラ起因の失敗
    InfrastructureUnexpected,
}

/// エラーレスポンス（RFC 9457 Problem Details）
///
/// `type` フィールドは URI で問題の種類を識別する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub error_type: String,
    pub title:      String,
    pub status:     u16,
    pub code:       ErrorCode,
    pub detail:     String,
}

impl ErrorResponse {
    /// 汎用コンストラクタ
    ///
    /// `error_type_suffix` はベース URI に付加される（例: `"not-found"`）。
    pub fn new(
        error_type_suffix: &str,
        title: impl Into<String>,
        status: u16,
        code: ErrorCode,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            error_type: format!("{ERROR_TYPE_BASE}/{error_type_suffix}"),
            title: title.into(),
            status,
            code,
            detail: detail.into(),
        }
    }

    /// 400 Validation Error
    pub fn validation_error(detail: impl Into<String>) -> Self {
        Self::new(
            "validation-error",
            "Validation Error",
            400,
            ErrorCode::ValidationError,
            detail,
        )
    }

    /// 400 Decode Failed
    pub fn decode_failed(detail: impl Into<String>) -> Self {
        Self::new(
            "decode-failed",
            "Bad Request",
            400,
            ErrorCode::DecodeFailed,
            detail,
        )
    }

    /// 400 UUID Parsing Failed
    pub fn uuid_parsing_failed(detail: impl Into<String>) -> Self {
        Self::new(
            "uuid-parsing-failed",
            "Bad Request",
            400,
            ErrorCode::UuidParsingFailed,
            detail,
        )
    }

    /// 404 Not Found
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new("not-found", "Not Found", 404, ErrorCode::NotFound, detail)
    }

    /// 409 Conflict
    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::new("conflict", "Conflict", 409, ErrorCode::Conflict, detail)
    }

    /// 500 Internal Server Error
    ///
    /// detail は固定値（内部情報を漏らさないため）。
    pub fn internal_error() -> Self {
        Self::new(
            "internal-error",
            "Internal Server Error",
            500,
            ErrorCode::InfrastructureUnexpected,
            INTERNAL_ERROR_DETAIL,
        )
    }
}
