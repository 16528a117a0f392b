//! # 単語セットの割り当て
//!
//! ユーザーに単語セットを割り当てた記録。`(user_id, word_set_id)` の組は一意。

use chrono::{DateTime, Utc};

use crate::user::UserId;

define_uuid_id! {
    /// 割り当て ID
    pub struct UserWordSetId;
}

define_uuid_id! {
    /// 単語セット ID（単語セット本体は別サービスが管理する）
    pub struct WordSetId;
}

/// ユーザーへの単語セット割り当て
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserWordSet {
    id:          UserWordSetId,
    user_id:     UserId,
    word_set_id: WordSetId,
    created_at:  DateTime<Utc>,
}

impl UserWordSet {
    pub fn new(
        id: UserWordSetId,
        user_id: UserId,
        word_set_id: WordSetId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            word_set_id,
            created_at,
        }
    }

    /// 割り当てる単語セットを差し替える
    pub fn reassigned(self, word_set_id: WordSetId) -> Self {
        Self {
            word_set_id,
            ..self
        }
    }

    pub fn id(&self) -> &UserWordSetId {
        &self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn word_set_id(&self) -> &WordSetId {
        &self.word_set_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
