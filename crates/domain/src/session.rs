//! # 学習セッション
//!
//! ## 状態遷移
//!
//! ```text
//! active ──(complete)──▶ completed
//!   ▲                       │
//!   └──────(reopen)─────────┘
//! ```
//!
//! ## 不変条件
//!
//! - `active` のセッションは `ended_at` を持たない
//! - `completed` のセッションは必ず `ended_at` を持つ。
//!   指定がなければ完了時点の時刻を記録する
//! - `ended_at` は `started_at` より前にならない

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

use crate::{DomainError, user::UserId};

define_uuid_id! {
    /// セッション ID
    pub struct SessionId;
}

/// セッションの状態
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    IntoStaticStr,
    EnumString,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Active,
    Completed,
}

impl SessionStatus {
    /// DB・JSON 上の表現
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// 文字列からパースする（不正な値は `Validation` エラー）
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        value.parse().map_err(|_| {
            DomainError::Validation(format!(
                "status は active または completed である必要があります: {value}"
            ))
        })
    }
}

/// 学習セッション
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSession {
    id:         SessionId,
    user_id:    UserId,
    status:     SessionStatus,
    started_at: DateTime<Utc>,
    ended_at:   Option<DateTime<Utc>>,
}

impl UserSession {
    /// セッションを開始する
    ///
    /// `completed` で作成した場合は開始と同時に終了したものとして扱う。
    pub fn start(id: SessionId, user_id: UserId, status: SessionStatus, now: DateTime<Utc>) -> Self {
        let ended_at = match status {
            SessionStatus::Active => None,
            SessionStatus::Completed => Some(now),
        };
        Self {
            id,
            user_id,
            status,
            started_at: now,
            ended_at,
        }
    }

    pub fn from_db(
        id: SessionId,
        user_id: UserId,
        status: SessionStatus,
        started_at: DateTime<Utc>,
        ended_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            user_id,
            status,
            started_at,
            ended_at,
        }
    }

    /// 状態と終了時刻を更新した新しいインスタンスを返す
    ///
    /// # エラー
    ///
    /// - `active` なのに `ended_at` が指定された
    /// - `ended_at` が `started_at` より前
    pub fn update(
        self,
        status: SessionStatus,
        ended_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let ended_at = match (status, ended_at) {
            (SessionStatus::Active, None) => None,
            (SessionStatus::Active, Some(_)) => {
                return Err(DomainError::Validation(
                    "active のセッションに ended_at は指定できません".to_string(),
                ));
            }
            (SessionStatus::Completed, Some(at)) => Some(at),
            (SessionStatus::Completed, None) => Some(now),
        };

        if let Some(at) = ended_at
            && at < self.started_at
        {
            return Err(DomainError::Validation(format!(
                "ended_at は started_at ({}) 以降である必要があります",
                self.started_at.to_rfc3339()
            )));
        }

        Ok(Self {
            status,
            ended_at,
            ..self
        })
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }
}
