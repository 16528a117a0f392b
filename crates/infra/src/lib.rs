//! # Lexitrack インフラ層
//!
//! PostgreSQL への接続とリポジトリ実装を提供する。
//!
//! ## 依存関係
//!
//! ```text
//! api → infra → domain
//!  ↓
//! shared
//! ```
//!
//! ## モジュール構成
//!
//! - [`db`] - 接続プール、マイグレーション、疎通確認、タイムアウト
//! - [`error`] - インフラ層エラー定義
//! - [`repository`] - リポジトリ実装
//! - `mock` - テスト用インメモリリポジトリ（`test-utils` feature）

pub mod db;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod repository;

pub use error::{InfraError, InfraErrorKind};
