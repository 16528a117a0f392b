//! # インフラ層エラー定義
//!
//! データベース操作で発生するエラーを表現する。
//!
//! ## 構造
//!
//! `std::io::Error` と同じ struct + enum パターン:
//! - [`InfraError`]: エラー種別（[`InfraErrorKind`]）と [`SpanTrace`] を保持するラッパー
//! - [`InfraErrorKind`]: エラーの具体的な種別
//!
//! `From<sqlx::Error>` や convenience constructor で生成すると、
//! その時点のスパン（リポジトリの `#[tracing::instrument]` 等）が記録される。
//!
//! ## 制約違反の分類
//!
//! PostgreSQL のエラーコードで分類し、API 層が HTTP ステータスを選べるようにする。
//!
//! | SQLSTATE | 種別 | API 層での扱い |
//! |----------|------|---------------|
//! | `23505` unique_violation | [`InfraErrorKind::Conflict`] | 409 |
//! | `23503` foreign_key_violation | [`InfraErrorKind::ForeignKey`] | 404（参照先が存在しない） |
//! | その他 | [`InfraErrorKind::Database`] | 500 |

use std::{fmt, time::Duration};

use derive_more::Display;
use thiserror::Error;
use tracing_error::SpanTrace;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// インフラ層で発生するエラー
#[derive(Display)]
#[display("{kind}")]
pub struct InfraError {
    kind:       InfraErrorKind,
    span_trace: SpanTrace,
}

/// インフラ層エラーの種別
#[derive(Debug, Error)]
pub enum InfraErrorKind {
    /// SQL の実行失敗・接続エラーなど
    #[error("データベースエラー: {0}")]
    Database(#[source] sqlx::Error),

    /// 操作が制限時間内に完了しなかった（実行中のクエリは破棄済み）
    #[error("タイムアウトしました: {}ms", .0.as_millis())]
    Timeout(Duration),

    /// 一意制約違反
    #[error("一意制約違反: {table}({constraint})")]
    Conflict {
        /// 違反が発生したテーブル
        table:      String,
        /// 違反した制約名
        constraint: String,
    },

    /// 外部キー制約違反（参照先の行が存在しない）
    #[error("外部キー制約違反: {table}({constraint})")]
    ForeignKey {
        table:      String,
        constraint: String,
    },

    /// DB から読み出した値がドメインの制約を満たさない等
    #[error("予期しないエラー: {0}")]
    Unexpected(String),
}

impl InfraError {
    pub fn kind(&self) -> &InfraErrorKind {
        &self.kind
    }

    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    pub fn into_parts(self) -> (InfraErrorKind, SpanTrace) {
        (self.kind, self.span_trace)
    }

    /// 一意制約違反かどうか
    pub fn is_conflict(&self) -> bool {
        matches!(self.kind, InfraErrorKind::Conflict { .. })
    }

    /// 外部キー制約違反かどうか
    pub fn is_foreign_key(&self) -> bool {
        matches!(self.kind, InfraErrorKind::ForeignKey { .. })
    }

    // ===== Convenience constructors =====

    fn with_kind(kind: InfraErrorKind) -> Self {
        Self {
            kind,
            span_trace: SpanTrace::capture(),
        }
    }

    pub fn timeout(limit: Duration) -> Self {
        Self::with_kind(InfraErrorKind::Timeout(limit))
    }

    pub fn conflict(table: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self::with_kind(InfraErrorKind::Conflict {
            table:      table.into(),
            constraint: constraint.into(),
        })
    }

    pub fn foreign_key(table: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self::with_kind(InfraErrorKind::ForeignKey {
            table:      table.into(),
            constraint: constraint.into(),
        })
    }

    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::with_kind(InfraErrorKind::Unexpected(msg.into()))
    }
}

/// SQLSTATE から制約違反の種別を決める
///
/// 制約違反でなければ `None`。
fn classify_constraint_violation(
    code: Option<&str>,
    table: Option<&str>,
    constraint: Option<&str>,
) -> Option<InfraErrorKind> {
    let table = table.unwrap_or_default().to_string();
    let constraint = constraint.unwrap_or_default().to_string();
    match code? {
        UNIQUE_VIOLATION => Some(InfraErrorKind::Conflict { table, constraint }),
        FOREIGN_KEY_VIOLATION => Some(InfraErrorKind::ForeignKey { table, constraint }),
        _ => None,
    }
}

// ===== トレイト実装 =====

impl fmt::Debug for InfraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfraError")
            .field("kind", &self.kind)
            .field("span_trace", &self.span_trace)
            .finish()
    }
}

impl std::error::Error for InfraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.kind)
    }
}

impl From<sqlx::Error> for InfraError {
    fn from(source: sqlx::Error) -> Self {
        let classified = match &source {
            sqlx::Error::Database(db) => classify_constraint_violation(
                db.code().as_deref(),
                db.table(),
                db.constraint(),
            ),
            _ => None,
        };
        Self::with_kind(classified.unwrap_or(InfraErrorKind::Database(source)))
    }
}
