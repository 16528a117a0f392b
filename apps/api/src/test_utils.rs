//! ユースケース・ミドルウェアの単体テスト用ヘルパー

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use lexitrack_domain::user::{Email, User, UserId, Username};
use lexitrack_shared::observability::{Level, Logger, LoggerConfig, MemorySink, RedactionPolicy};

/// 出力をメモリに溜める debug レベルのロガー
pub(crate) fn memory_logger() -> (Logger, MemorySink) {
    let sink = MemorySink::new();
    let logger = Logger::new(
        LoggerConfig::new("lexitrack-api", "test", "0.0.0", Level::Debug),
        RedactionPolicy::default(),
        Arc::new(sink.clone()),
    );
    (logger, sink)
}

pub(crate) fn now() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

/// `{name}@example.com` のユーザー
pub(crate) fn sample_user(name: &str) -> User {
    User::new(
        UserId::new(),
        Username::new(name).unwrap(),
        Email::new(format!("{name}@example.com")).unwrap(),
        now(),
    )
}
