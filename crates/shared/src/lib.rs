//! # Lexitrack 共有ユーティリティ
//!
//! このクレートは、Lexitrack
//! プロジェクト全体で使用される共通ユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - 他のすべてのクレート（domain, infra, api）から依存される
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - 構造化ログ・トレース ID 伝播は `observability` feature で有効化する
//! - axum には依存しない（HTTP 型は `http` / `tower-http` で扱う）

pub mod api_response;
pub mod error_response;
pub mod health;
#[cfg(feature = "observability")]
pub mod observability;
pub mod paginated_response;

pub use api_response::ApiResponse;
pub use error_response::{ErrorCode, ErrorResponse};
pub use health::{CheckStatus, HealthResponse, ReadinessResponse, ReadinessStatus};
pub use paginated_response::PaginatedResponse;
