//! # プローブのレスポンス型
//!
//! `/livez` と `/readyz` のボディ。
//!
//! ```text
//! GET /livez  → {"status":"healthy","version":"0.1.0"}
//! GET /readyz → {"status":"not_ready","checks":{"database":"error"}}
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Liveness のボディ
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status:  &'static str,
    pub version: String,
}

impl HealthResponse {
    pub fn healthy(version: impl Into<String>) -> Self {
        Self {
            status:  "healthy",
            version: version.into(),
        }
    }
}

/// 依存先 1 つ分の確認結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Error,
}

impl From<bool> for CheckStatus {
    fn from(ok: bool) -> Self {
        if ok { Self::Ok } else { Self::Error }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessStatus {
    Ready,
    NotReady,
}

/// Readiness のボディ
///
/// 確認結果を [`check`](Self::check) で積み上げ、1 つでも `Error` があれば
/// `NotReady` になる。`checks` は名前順に出力する。
///
/// ```
/// use lexitrack_shared::{CheckStatus, ReadinessResponse};
///
/// let response = ReadinessResponse::default().check("database", CheckStatus::Error);
/// assert!(!response.is_ready());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub status: ReadinessStatus,
    pub checks: BTreeMap<String, CheckStatus>,
}

impl Default for ReadinessResponse {
    fn default() -> Self {
        Self {
            status: ReadinessStatus::Ready,
            checks: BTreeMap::new(),
        }
    }
}

impl ReadinessResponse {
    pub fn check(mut self, name: impl Into<String>, result: CheckStatus) -> Self {
        if result == CheckStatus::Error {
            self.status = ReadinessStatus::NotReady;
        }
        self.checks.insert(name.into(), result);
        self
    }

    pub fn is_ready(&self) -> bool {
        self.status == ReadinessStatus::Ready
    }
}
