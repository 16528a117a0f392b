//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは HTTP との変換のみを行い、検証とログはユースケースに委譲
//! - 日時は RFC 3339 文字列で返す

pub mod health;
pub mod progress;
pub mod session;
pub mod statistics;
pub mod user;
pub mod word_set;

pub use health::{ReadinessState, health_check, readiness_check};
pub use progress::{
    ProgressState,
    create_progress,
    delete_progress,
    get_progress,
    get_progress_by_word,
    list_progress,
    update_progress,
};
use lexitrack_domain::pagination::Pagination;
use lexitrack_shared::PaginatedResponse;
use serde::Deserialize;
pub use session::{
    SessionState,
    create_session,
    delete_session,
    get_session,
    list_active_sessions,
    list_sessions,
    update_session,
};
pub use statistics::{
    StatisticsState,
    create_statistics,
    delete_statistics,
    get_statistics,
    list_statistics,
    update_statistics,
};
pub use user::{
    UserState,
    create_user,
    delete_user,
    get_user,
    get_user_by_email,
    list_users,
    update_user,
};
pub use word_set::{
    WordSetState,
    create_word_set,
    delete_word_set,
    get_word_set,
    list_word_sets,
    update_word_set,
};

/// 一覧系のクエリパラメータ
///
/// 範囲の検証は [`Pagination::new`] で行う。
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit:  Option<i64>,
    pub offset: Option<i64>,
}

/// 一覧結果をページ条件付きのレスポンスに変換する
fn paginated<T, D>(
    items: &[T],
    page: Pagination,
    to_dto: impl Fn(&T) -> D,
) -> PaginatedResponse<D> {
    PaginatedResponse::new(
        items.iter().map(to_dto).collect(),
        page.limit(),
        page.offset(),
    )
}
