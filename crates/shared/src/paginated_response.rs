//! # ページネーション付きレスポンス
//!
//! limit / offset 方式の一覧 API レスポンス型。

use serde::{Deserialize, Serialize};

/// ページネーション付きレスポンス
///
/// `ApiResponse<T>` が単一データ用であるのに対し、
/// `PaginatedResponse<T>` はリストと、そのリストを取得した条件を返す。
///
/// ## JSON 形式
///
/// ```json
/// {
///   "data": [...],
///   "limit": 20,
///   "offset": 40
/// }
/// ```
///
/// `data` の件数が `limit` 未満であれば最後のページ。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data:   Vec<T>,
    pub limit:  u32,
    pub offset: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, limit: u32, offset: u32) -> Self {
        Self {
            data,
            limit,
            offset,
        }
    }
}
