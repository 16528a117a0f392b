//! # 単一リソースのレスポンス
//!
//! 成功時のボディは `{"data": ...}` に包む。一覧は
//! [`PaginatedResponse`](crate::PaginatedResponse) が `limit` / `offset` を並べる。

use serde::{Deserialize, Serialize};

/// `{"data": T}` のエンベロープ
///
/// ```
/// use lexitrack_shared::ApiResponse;
///
/// let body = serde_json::to_string(&ApiResponse::new(3)).unwrap();
/// assert_eq!(body, r#"{"data":3}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
