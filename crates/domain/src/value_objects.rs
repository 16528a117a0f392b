//! # 共通値オブジェクト
//!
//! | 型 | ラップ対象 | 用途 |
//! |---|-----------|------|
//! | [`Count`] | `i32` | 学習語数・学習時間・正誤回数などの非負カウント |
//! | [`Accuracy`] | `f64` | 正答率（0 〜 100、小数 2 桁） |

use serde::{Deserialize, Serialize};

use crate::DomainError;

// =========================================================================
// Count（非負カウント）
// =========================================================================

/// 非負の整数カウント
///
/// DB では `INTEGER` で保持するため `i32` の範囲に収まる。
///
/// ```rust
/// use lexitrack_domain::value_objects::Count;
///
/// assert_eq!(Count::new("correct_count", 3).unwrap().as_i32(), 3);
/// assert!(Count::new("correct_count", -1).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Count(i32);

impl Count {
    /// カウントを作成する
    ///
    /// `field` はエラーメッセージに使うフィールド名。
    pub fn new(field: &str, value: i32) -> Result<Self, DomainError> {
        if value < 0 {
            return Err(DomainError::Validation(format!(
                "{field} は 0 以上である必要があります: {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn as_i32(&self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for Count {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =========================================================================
// Accuracy（正答率）
// =========================================================================

/// 正答率（パーセント）
///
/// DB の `NUMERIC(5,2)` に合わせ、生成時に小数 2 桁へ丸める。
///
/// ```rust
/// use lexitrack_domain::value_objects::Accuracy;
///
/// assert_eq!(Accuracy::new(87.456).unwrap().as_f64(), 87.46);
/// assert!(Accuracy::new(100.01).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Accuracy(f64);

impl Accuracy {
    pub const MAX: f64 = 100.0;
    pub const MIN: f64 = 0.0;

    pub fn new(value: f64) -> Result<Self, DomainError> {
        if !value.is_finite() {
            return Err(DomainError::Validation(
                "正答率は数値である必要があります".to_string(),
            ));
        }

        let rounded = (value * 100.0).round() / 100.0;
        if !(Self::MIN..=Self::MAX).contains(&rounded) {
            return Err(DomainError::Validation(format!(
                "正答率は {} 〜 {} である必要があります: {value}",
                Self::MIN,
                Self::MAX
            )));
        }

        Ok(Self(rounded))
    }

    pub fn as_f64(&self) -> f64 {
        self.0
    }
}
