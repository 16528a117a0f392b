//! # ページング
//!
//! 一覧取得の `limit` / `offset` を検証済みの値として表現する。
//!
//! - `limit`: 0 〜 100。0 または未指定は既定値 [`DEFAULT_LIMIT`] として扱う
//! - `offset`: 0 以上。未指定は 0

use serde::Serialize;

use crate::DomainError;

/// 既定のページサイズ
pub const DEFAULT_LIMIT: u32 = 20;

/// ページサイズの上限
pub const MAX_LIMIT: u32 = 100;

/// 検証済みのページング指定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    limit:  u32,
    offset: u32,
}

impl Pagination {
    /// クエリパラメータの値から作成する
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Result<Self, DomainError> {
        let limit = match limit.unwrap_or(0) {
            0 => DEFAULT_LIMIT,
            l if (1..=i64::from(MAX_LIMIT)).contains(&l) => l as u32,
            l => {
                return Err(DomainError::Validation(format!(
                    "limit は 0 〜 {MAX_LIMIT} である必要があります: {l}"
                )));
            }
        };

        let offset = match offset.unwrap_or(0) {
            o if (0..=i64::from(u32::MAX)).contains(&o) => o as u32,
            o => {
                return Err(DomainError::Validation(format!(
                    "offset は 0 以上である必要があります: {o}"
                )));
            }
        };

        Ok(Self { limit, offset })
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit:  DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(None, None, 20, 0)]
    #[case(Some(0), Some(0), 20, 0)]
    #[case(Some(1), Some(5), 1, 5)]
    #[case(Some(100), Some(1000), 100, 1000)]
    fn test_newで範囲内の値を受け付ける(
        #[case] limit: Option<i64>,
        #[case] offset: Option<i64>,
        #[case] expected_limit: u32,
        #[case] expected_offset: u32,
    ) {
        let page = Pagination::new(limit, offset).unwrap();

        assert_eq!(page.limit(), expected_limit);
        assert_eq!(page.offset(), expected_offset);
    }

    #[rstest]
    #[case(Some(101), None)]
    #[case(Some(-1), None)]
    #[case(None, Some(-1))]
    fn test_newで範囲外の値はバリデーションエラー(
        #[case] limit: Option<i64>,
        #[case] offset: Option<i64>,
    ) {
        let result = Pagination::new(limit, offset);

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }
}
