//! # Lexitrack ドメイン層
//!
//! 語彙学習サービスのドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **値オブジェクト**: 生成時に検証し、不正な値を型レベルで排除する
//!   （例: [`user::Username`], [`value_objects::Accuracy`]）
//! - **エンティティ**: ID を持ち、状態遷移はメソッド経由で行う
//!   （例: [`session::UserSession::update`]）
//! - **ドメインエラー**: ビジネスルール違反を [`DomainError`] で表現する
//!
//! ## 依存関係の方向
//!
//! ```text
//! api → infra → domain
//! ```
//!
//! ドメイン層は DB・HTTP に依存しない。
//!
//! ## モジュール構成
//!
//! - [`user`] - ユーザー
//! - [`statistics`] - 学習統計（ユーザーごとに 1 件）
//! - [`progress`] - 単語ごとの正誤回数
//! - [`session`] - 学習セッション
//! - [`word_set`] - ユーザーへの単語セット割り当て
//! - [`pagination`] - 一覧取得のページング
//! - [`clock`] - 時刻プロバイダ
//!
//! ## 使用例
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use lexitrack_domain::user::{Email, User, UserId, Username};
//!
//! let user = User::new(
//!     UserId::new(),
//!     Username::new("alice")?,
//!     Email::new("alice@example.com")?,
//!     chrono::Utc::now(),
//! );
//! assert_eq!(user.username().as_str(), "alice");
//! # Ok(())
//! # }
//! ```

#[macro_use]
mod macros;

pub mod clock;
pub mod error;
pub mod pagination;
pub mod progress;
pub mod session;
pub mod statistics;
pub mod user;
pub mod value_objects;
pub mod word_set;

pub use error::DomainError;
