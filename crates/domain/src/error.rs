//! # ドメイン層エラー定義
//!
//! ビジネスルール違反を表現するエラー型。
//!
//! ## エラーの種類と HTTP ステータスの対応
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `Validation` | 400 Bad Request | 入力値の検証失敗 |
//! | `NotFound` | 404 Not Found | エンティティが存在しない |
//! | `Conflict` | 409 Conflict | 一意制約違反 |
//!
//! ## 使用例
//!
//! ```rust
//! use lexitrack_domain::DomainError;
//!
//! let error = DomainError::NotFound {
//!     entity_type: "User",
//!     id:          "0190...".to_string(),
//! };
//! assert_eq!(error.to_string(), "User が見つかりません: 0190...");
//! ```

use thiserror::Error;

/// ドメイン層で発生するエラー
///
/// API 層でこのエラーを受け取り、HTTP レスポンスに変換する。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// 入力値がビジネスルールに違反している
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// 指定された ID のエンティティが存在しない
    #[error("{entity_type} が見つかりません: {id}")]
    NotFound {
        /// エンティティの種類（"User", "UserSession" など）
        entity_type: &'static str,
        /// 検索に使用した識別子
        id:          String,
    },

    /// 既存のエンティティと競合する
    #[error("競合が発生しました: {0}")]
    Conflict(String),
}

impl DomainError {
    /// `NotFound` を作成する
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }
}
