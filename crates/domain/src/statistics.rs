//! # 学習統計
//!
//! ユーザーごとに 1 件だけ存在する集計値。主キーは `user_id`。

use chrono::{DateTime, Utc};

use crate::{
    user::UserId,
    value_objects::{Accuracy, Count},
};

/// 学習統計の更新内容
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatisticsValues {
    pub total_words_learned: Count,
    pub accuracy:            Accuracy,
    pub total_time:          Count,
}

/// ユーザーの学習統計
#[derive(Debug, Clone, PartialEq)]
pub struct UserStatistics {
    user_id:    UserId,
    values:     StatisticsValues,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserStatistics {
    pub fn new(user_id: UserId, values: StatisticsValues, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            values,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn from_db(
        user_id: UserId,
        values: StatisticsValues,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            values,
            created_at,
            updated_at,
        }
    }

    /// 値を置き換えた新しいインスタンスを返す
    pub fn updated(self, values: StatisticsValues, now: DateTime<Utc>) -> Self {
        Self {
            values,
            updated_at: now,
            ..self
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn total_words_learned(&self) -> Count {
        self.values.total_words_learned
    }

    pub fn accuracy(&self) -> Accuracy {
        self.values.accuracy
    }

    pub fn total_time(&self) -> Count {
        self.values.total_time
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
