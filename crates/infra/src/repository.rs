//! # リポジトリ実装
//!
//! ドメインモデルを PostgreSQL に永続化するリポジトリ群。
//!
//! ## 設計方針
//!
//! - **トレイト境界**: ユースケースは `Arc<dyn XxxRepository>` 経由で利用し、
//!   テストでは [`crate::mock`] のインメモリ実装に差し替える
//! - **制約違反の分類**: 一意制約・外部キー制約の違反は
//!   [`InfraError`](crate::InfraError) の種別として呼び出し側に返す

pub mod user_progress_repository;
pub mod user_repository;
pub mod user_session_repository;
pub mod user_statistics_repository;
pub mod user_word_set_repository;

pub use user_progress_repository::{PostgresUserProgressRepository, UserProgressRepository};
pub use user_repository::{PostgresUserRepository, UserRepository};
pub use user_session_repository::{PostgresUserSessionRepository, UserSessionRepository};
pub use user_statistics_repository::{
    PostgresUserStatisticsRepository,
    UserStatisticsRepository,
};
pub use user_word_set_repository::{PostgresUserWordSetRepository, UserWordSetRepository};
