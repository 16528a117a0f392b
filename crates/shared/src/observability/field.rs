//! # ログフィールド
//!
//! 構造化ログの 1 フィールド（キーと型付きの値）を表現する。
//! 値の種類は文字列・整数・浮動小数点数・真偽値の 4 種類に閉じている。

use std::fmt;

use derive_more::From;
use serde::{Serialize, Serializer};

/// フィールドの値
#[derive(Debug, Clone, PartialEq, From)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl FieldValue {
    /// 文字列値であれば参照を返す
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u16> for FieldValue {
    fn from(value: u16) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u64> for FieldValue {
    /// `i64` に収まらない値は `i64::MAX` に丸める
    fn from(value: u64) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(v) => f.write_str(v),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Str(v) => serializer.serialize_str(v),
            Self::Int(v) => serializer.serialize_i64(*v),
            // NaN / ±∞ は JSON で表現できないため null にする
            Self::Float(v) if !v.is_finite() => serializer.serialize_unit(),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::Bool(v) => serializer.serialize_bool(*v),
        }
    }
}

/// キーと値の組
///
/// ```
/// use lexitrack_shared::observability::{Field, FieldValue};
///
/// let field = Field::new("status", 201_u16);
/// assert_eq!(field.key(), "status");
/// assert_eq!(field.value(), &FieldValue::Int(201));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    key:   String,
    value: FieldValue,
}

impl Field {
    pub fn new(key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            key:   key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    pub fn into_parts(self) -> (String, FieldValue) {
        (self.key, self.value)
    }
}
