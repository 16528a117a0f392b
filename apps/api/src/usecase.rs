//! # ユースケース層
//!
//! 入力の検証、リポジトリ呼び出し、ログ出力をまとめる。
//!
//! ## 設計方針
//!
//! - **依存性注入**: リポジトリと時刻を `Arc<dyn Trait>` で外部から注入
//! - **薄いハンドラ**: ハンドラは HTTP の変換のみを行い、検証はここで行う
//! - **タイムアウト**: リポジトリ呼び出しは 1 回ごとに `timeout` で打ち切る
//! - **ログ**: 各操作は `operation` をバインドしたロガーで開始・完了・失敗を出力する
//!
//! ## 失敗時のログレベル
//!
//! | エラー | レベル |
//! |--------|--------|
//! | `Infra` / `Internal` | error |
//! | `NotFound` | info |
//! | その他（検証・競合） | warn |

pub mod progress;
pub mod session;
pub mod statistics;
pub mod user;
pub mod word_set;

use std::iter;

use lexitrack_infra::{InfraError, InfraErrorKind};
use lexitrack_shared::observability::{Field, Logger};
pub use progress::{CreateProgressInput, ProgressUseCaseImpl, UpdateProgressInput};
pub use session::{CreateSessionInput, SessionUseCaseImpl, UpdateSessionInput};
pub use statistics::{StatisticsInput, StatisticsUseCaseImpl};
pub use user::{UserInput, UserUseCaseImpl};
pub use word_set::{CreateWordSetInput, WordSetUseCaseImpl};

use crate::error::ApiError;

const FAILED_MESSAGE: &str = "operation failed";

/// 1 回の操作のログ
pub(crate) struct OperationLog {
    logger: Logger,
}

impl OperationLog {
    /// `operation` と入力値をバインドし、開始ログを debug で出力する
    pub(crate) fn start(
        logger: &Logger,
        operation: &'static str,
        message: &str,
        fields: impl IntoIterator<Item = Field>,
    ) -> Self {
        let logger =
            logger.with_fields(iter::once(Field::new("operation", operation)).chain(fields));
        logger.debug(message, []);
        Self { logger }
    }

    /// 結果をログに出力してそのまま返す
    pub(crate) fn finish<T, I>(
        self,
        result: Result<T, ApiError>,
        message: &str,
        fields: impl FnOnce(&T) -> I,
    ) -> Result<T, ApiError>
    where
        I: IntoIterator<Item = Field>,
    {
        match &result {
            Ok(value) => self.logger.info(message, fields(value)),
            Err(err) => self.failed(err),
        }
        result
    }

    fn failed(&self, err: &ApiError) {
        let fields = [Field::new("error", err.to_string())];
        match err {
            ApiError::Infra(_) | ApiError::Internal(_) => self.logger.error(FAILED_MESSAGE, fields),
            ApiError::NotFound(_) => self.logger.info(FAILED_MESSAGE, fields),
            _ => self.logger.warn(FAILED_MESSAGE, fields),
        }
    }
}

/// 一覧系の開始ログに載せるページング指定（未指定は出力しない）
pub(crate) fn page_fields(limit: Option<i64>, offset: Option<i64>) -> Vec<Field> {
    [("limit", limit), ("offset", offset)]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| Field::new(key, v)))
        .collect()
}

/// リポジトリのエラーを API エラーに変換する
///
/// - 一意制約違反は `conflict_detail` を持つ `Conflict`
/// - 外部キー制約違反は参照先ユーザーの `NotFound`
pub(crate) fn from_infra(err: InfraError, conflict_detail: &str) -> ApiError {
    match err.kind() {
        InfraErrorKind::Conflict { .. } => ApiError::Conflict(conflict_detail.to_string()),
        InfraErrorKind::ForeignKey { .. } => {
            ApiError::NotFound("参照先のユーザーが見つかりません".to_string())
        }
        _ => ApiError::Infra(err),
    }
}
