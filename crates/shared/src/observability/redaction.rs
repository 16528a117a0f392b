//! # PII マスキング
//!
//! ログフィールドのキー名（大文字小文字を区別しない）に応じて値をマスクする。
//!
//! | キー | 規則 | 例 |
//! |------|------|----|
//! | `authorization`, `set-cookie`, `x-api-key`, 追加指定キー | 全置換 | `***REDACTED***` |
//! | `email` | ローカル部の先頭・末尾以外を `*` に | `user@example.com` → `u**r@example.com` |
//! | `phone` | 末尾 4 文字以外を `*` に | `+79991234567` → `********4567` |
//!
//! 形式が想定と異なる値は素通しせず、全体をマスクする側に倒す。
//! 文字数は `char` 単位で数える（バイト単位で切るとマルチバイト文字を壊すため）。

use super::field::{Field, FieldValue};

/// 全置換時のマーカー
pub const REDACTED: &str = "***REDACTED***";

/// `local@domain` として解釈できないメールアドレスの置換値
pub const MASKED_EMAIL: &str = "***@***";

const MASK_CHAR: char = '*';

/// ローカル部が 2 文字以下の場合の置換値（長さも伏せる）
const MASKED_SHORT_LOCAL: &str = "***";

const PHONE_VISIBLE_SUFFIX: usize = 4;

const DEFAULT_SECRET_KEYS: [&str; 3] = ["authorization", "set-cookie", "x-api-key"];

/// キーに適用されるマスキング規則
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedactionRule {
    /// 値全体を [`REDACTED`] に置換する
    Full,
    /// メールアドレスの部分マスク
    Email,
    /// 電話番号の部分マスク
    Phone,
}

/// マスキング規則の集合
///
/// 全置換キーは既定の 3 つに加え、デプロイごとに追加できる。
///
/// ```
/// use lexitrack_shared::observability::{Field, RedactionPolicy};
///
/// let policy = RedactionPolicy::default().with_secret_keys(["X-Session-Token"]);
/// let field = policy.redact(Field::new("x-session-token", "abc"));
/// assert_eq!(field.value().as_str(), Some("***REDACTED***"));
/// ```
#[derive(Debug, Clone)]
pub struct RedactionPolicy {
    secret_keys: Vec<String>,
}

impl Default for RedactionPolicy {
    fn default() -> Self {
        Self {
            secret_keys: DEFAULT_SECRET_KEYS.iter().map(|k| (*k).to_owned()).collect(),
        }
    }
}

impl RedactionPolicy {
    /// 全置換キーを追加する
    ///
    /// 前後の空白を除いて小文字化する。空文字と重複は無視する。
    pub fn with_secret_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for key in keys {
            let key = key.as_ref().trim().to_lowercase();
            if !key.is_empty() && !self.secret_keys.contains(&key) {
                self.secret_keys.push(key);
            }
        }
        self
    }

    /// 全置換キーの一覧
    pub fn secret_keys(&self) -> &[String] {
        &self.secret_keys
    }

    /// キーに対応する規則を返す
    pub fn rule_for(&self, key: &str) -> Option<RedactionRule> {
        let key = key.to_lowercase();
        if self.secret_keys.contains(&key) {
            return Some(RedactionRule::Full);
        }
        match key.as_str() {
            "email" => Some(RedactionRule::Email),
            "phone" => Some(RedactionRule::Phone),
            _ => None,
        }
    }

    /// フィールドをマスクする
    pub fn redact(&self, field: Field) -> Field {
        let (key, value) = field.into_parts();
        let value = self.redact_value(&key, value);
        Field::new(key, value)
    }

    /// キーに応じて値をマスクする
    ///
    /// 部分マスク対象のキーに文字列以外の値が入っていた場合は、
    /// 文字列表現に対して同じ規則を適用する。
    pub fn redact_value(&self, key: &str, value: FieldValue) -> FieldValue {
        let Some(rule) = self.rule_for(key) else {
            return value;
        };

        match (rule, value) {
            (RedactionRule::Full, _) => FieldValue::Str(REDACTED.to_owned()),
            (_, FieldValue::Str(s)) if s.is_empty() => FieldValue::Str(s),
            (RedactionRule::Email, v) => FieldValue::Str(mask_email(&v.to_string())),
            (RedactionRule::Phone, v) => FieldValue::Str(mask_phone(&v.to_string())),
        }
    }
}

/// メールアドレスを部分マスクする
///
/// - `@` がちょうど 1 つでなければ [`MASKED_EMAIL`]
/// - ローカル部が 2 文字以下なら `***@domain`
/// - それ以外は先頭・末尾の 1 文字を残し、間を `*` にする
///
/// ```
/// use lexitrack_shared::observability::mask_email;
///
/// assert_eq!(mask_email("admin@test.com"), "a***n@test.com");
/// assert_eq!(mask_email("ab@example.com"), "***@example.com");
/// assert_eq!(mask_email("not-an-email"), "***@***");
/// ```
pub fn mask_email(value: &str) -> String {
    let mut parts = value.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return MASKED_EMAIL.to_owned();
    };

    let len = local.chars().count();
    if len <= 2 {
        return format!("{MASKED_SHORT_LOCAL}@{domain}");
    }

    let mut masked = String::with_capacity(value.len());
    for (i, c) in local.chars().enumerate() {
        if i == 0 || i == len - 1 {
            masked.push(c);
        } else {
            masked.push(MASK_CHAR);
        }
    }
    masked.push('@');
    masked.push_str(domain);
    masked
}

/// 電話番号を部分マスクする
///
/// 末尾 4 文字を残し、それより前をすべて `*` にする。4 文字以下は全体を `*` にする。
///
/// ```
/// use lexitrack_shared::observability::mask_phone;
///
/// assert_eq!(mask_phone("+79991234567"), "********4567");
/// assert_eq!(mask_phone("123"), "***");
/// ```
pub fn mask_phone(value: &str) -> String {
    let len = value.chars().count();
    if len <= PHONE_VISIBLE_SUFFIX {
        return MASK_CHAR.to_string().repeat(len);
    }

    let masked_len = len - PHONE_VISIBLE_SUFFIX;
    value
        .chars()
        .enumerate()
        .map(|(i, c)| if i < masked_len { MASK_CHAR } else { c })
        .collect()
}
