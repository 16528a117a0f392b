//! # 単語ごとの学習進捗
//!
//! ユーザーと単語の組ごとに正解・不正解の回数を持つ。
//! `(user_id, word_id)` の組は一意。

use chrono::{DateTime, Utc};

use crate::{user::UserId, value_objects::Count};

define_uuid_id! {
    /// 学習進捗 ID
    pub struct ProgressId;
}

define_uuid_id! {
    /// 単語 ID（単語マスタは別サービスが管理する）
    pub struct WordId;
}

/// 学習進捗
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProgress {
    id:              ProgressId,
    user_id:         UserId,
    word_id:         WordId,
    correct_count:   Count,
    incorrect_count: Count,
    created_at:      DateTime<Utc>,
    updated_at:      DateTime<Utc>,
}

impl UserProgress {
    pub fn new(
        id: ProgressId,
        user_id: UserId,
        word_id: WordId,
        correct_count: Count,
        incorrect_count: Count,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            word_id,
            correct_count,
            incorrect_count,
            created_at: now,
            updated_at: now,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn from_db(
        id: ProgressId,
        user_id: UserId,
        word_id: WordId,
        correct_count: Count,
        incorrect_count: Count,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            word_id,
            correct_count,
            incorrect_count,
            created_at,
            updated_at,
        }
    }

    /// 回数を置き換えた新しいインスタンスを返す
    pub fn with_counts(self, correct_count: Count, incorrect_count: Count, now: DateTime<Utc>) -> Self {
        Self {
            correct_count,
            incorrect_count,
            updated_at: now,
            ..self
        }
    }

    pub fn id(&self) -> &ProgressId {
        &self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn word_id(&self) -> &WordId {
        &self.word_id
    }

    pub fn correct_count(&self) -> Count {
        self.correct_count
    }

    pub fn incorrect_count(&self) -> Count {
        self.incorrect_count
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
