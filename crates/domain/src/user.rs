//! # ユーザー
//!
//! ユーザーエンティティと、その識別子・ユーザー名・メールアドレスを定義する。
//!
//! ## 不変条件
//!
//! - `username` は前後の空白を除いて 3 〜 50 文字
//! - `email` は `local@domain` 形式で 255 文字以内
//! - `username` と `email` はそれぞれ全ユーザーで一意（DB の一意制約で保証）

use chrono::{DateTime, Utc};

use crate::DomainError;

define_uuid_id! {
    /// ユーザー ID
    pub struct UserId;
}

define_validated_string! {
    /// ユーザー名
    pub struct Username {
        label: "ユーザー名",
        min_length: 3,
        max_length: 50,
    }
}

const EMAIL_MAX_LENGTH: usize = 255;

/// メールアドレス（値オブジェクト）
///
/// `@` がちょうど 1 つあり、ローカル部・ドメイン部が空でないことを要求する。
/// ログへの出力時はロガー側でマスクされる。
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスは必須です".to_string(),
            ));
        }

        let mut parts = value.split('@');
        let well_formed = matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(local), Some(domain), None)
                if !local.is_empty() && !domain.is_empty() && !value.contains(char::is_whitespace)
        );
        if !well_formed {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        }

        if value.chars().count() > EMAIL_MAX_LENGTH {
            return Err(DomainError::Validation(format!(
                "メールアドレスは{EMAIL_MAX_LENGTH}文字以内である必要があります"
            )));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// ユーザーエンティティ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id:         UserId,
    username:   Username,
    email:      Email,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// 新しいユーザーを作成する
    pub fn new(id: UserId, username: Username, email: Email, now: DateTime<Utc>) -> Self {
        Self {
            id,
            username,
            email,
            created_at: now,
            updated_at: now,
        }
    }

    /// 既存のデータからユーザーを復元する（データベースから取得時）
    pub fn from_db(
        id: UserId,
        username: Username,
        email: Email,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username,
            email,
            created_at,
            updated_at,
        }
    }

    /// ユーザー名とメールアドレスを更新した新しいインスタンスを返す
    pub fn updated(self, username: Username, email: Email, now: DateTime<Utc>) -> Self {
        Self {
            username,
            email,
            updated_at: now,
            ..self
        }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
