//! # 構造化ロガー
//!
//! PII をマスクした JSON Lines を出力するロガー。
//!
//! ## 設計方針
//!
//! - **不変値**: [`Logger::with_fields`] は新しいロガーを返し、元のロガーは変わらない。
//!   内部状態は `Arc` で共有するため、clone と並行利用にロックは不要
//! - **バインド時マスク**: `with_fields` で渡したフィールドはその場でマスクして保持する。
//!   出力時に再マスクしないため、バインド済みの値が平文に戻る経路がない
//! - **失敗を伝播しない**: シリアライズ・書き込みエラーは握りつぶす
//!
//! ## 使用例
//!
//! ```
//! use std::sync::Arc;
//!
//! use lexitrack_shared::observability::{
//!     Field, Level, Logger, LoggerConfig, MemorySink, RedactionPolicy,
//! };
//!
//! let sink = MemorySink::new();
//! let logger = Logger::new(
//!     LoggerConfig::new("lexitrack-api", "development", "1.0.0", Level::Info),
//!     RedactionPolicy::default(),
//!     Arc::new(sink.clone()),
//! );
//!
//! let logger = logger.with_fields([Field::new("operation", "user.create")]);
//! logger.info("ユーザーを作成しました", [Field::new("email", "alice@example.com")]);
//!
//! let record = &sink.records()[0];
//! assert_eq!(record["operation"], "user.create");
//! assert_eq!(record["email"], "a***e@example.com");
//! ```

use std::{fmt, sync::Arc};

use chrono::Utc;

use super::{
    field::Field,
    level::Level,
    log_entry::LogEntry,
    redaction::RedactionPolicy,
    sink::{LogSink, StdoutSink},
    trace_context::current_trace_id,
};

/// ロガーのプロセス共通設定
///
/// 全レコードに `service` / `env` / `version` として出力される。
/// `level` 未満のレコードは出力しない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    pub service: String,
    pub env:     String,
    pub version: String,
    pub level:   Level,
}

impl LoggerConfig {
    pub fn new(
        service: impl Into<String>,
        env: impl Into<String>,
        version: impl Into<String>,
        level: Level,
    ) -> Self {
        Self {
            service: service.into(),
            env: env.into(),
            version: version.into(),
            level,
        }
    }
}

struct LoggerInner {
    config: LoggerConfig,
    policy: RedactionPolicy,
    sink:   Arc<dyn LogSink>,
}

/// 構造化ロガー
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
    bound: Arc<[Field]>,
}

impl Logger {
    pub fn new(config: LoggerConfig, policy: RedactionPolicy, sink: Arc<dyn LogSink>) -> Self {
        Self {
            inner: Arc::new(LoggerInner {
                config,
                policy,
                sink,
            }),
            bound: Arc::from(Vec::new()),
        }
    }

    /// 標準出力に書き込むロガーを作成する
    pub fn stdout(config: LoggerConfig, policy: RedactionPolicy) -> Self {
        Self::new(config, policy, Arc::new(StdoutSink))
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.inner.config
    }

    pub fn policy(&self) -> &RedactionPolicy {
        &self.inner.policy
    }

    /// バインド済みフィールド（マスク済み）
    pub fn bound_fields(&self) -> &[Field] {
        &self.bound
    }

    /// 指定レベルのレコードを出力するか
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.inner.config.level
    }

    /// フィールドをバインドした新しいロガーを返す
    ///
    /// フィールドはこの時点でマスクされる。
    pub fn with_fields(&self, fields: impl IntoIterator<Item = Field>) -> Self {
        let bound: Vec<Field> = self
            .bound
            .iter()
            .cloned()
            .chain(fields.into_iter().map(|f| self.inner.policy.redact(f)))
            .collect();

        Self {
            inner: Arc::clone(&self.inner),
            bound: Arc::from(bound),
        }
    }

    /// レコードを 1 件出力する
    ///
    /// 呼び出し時のフィールドをマスクし、サービス情報と（リクエスト処理中であれば）
    /// `trace_id` を付与する。
    pub fn emit(&self, level: Level, msg: &str, fields: impl IntoIterator<Item = Field>) {
        self.emit_in_context(level, msg, &[], fields);
    }

    /// 追加のコンテキストフィールドを挟んでレコードを出力する
    ///
    /// `context` はマスク済みであること（[`LoggerLayer`](super::LoggerLayer) が
    /// スパンのフィールドを渡すために使う）。`fields` はここでマスクする。
    pub(crate) fn emit_in_context(
        &self,
        level: Level,
        msg: &str,
        context: &[Field],
        fields: impl IntoIterator<Item = Field>,
    ) {
        if !self.enabled(level) {
            return;
        }

        let fields: Vec<Field> = fields
            .into_iter()
            .map(|f| self.inner.policy.redact(f))
            .collect();
        let trace_id = current_trace_id();

        let mut entry = LogEntry::new(
            Utc::now(),
            level,
            msg,
            &self.inner.config,
            trace_id.as_ref(),
        );
        entry.extend(self.bound.iter());
        entry.extend(context);
        entry.extend(&fields);

        let Ok(line) = entry.to_json_line() else {
            return;
        };
        let _ = self.inner.sink.write_line(&line);
    }

    pub fn debug(&self, msg: &str, fields: impl IntoIterator<Item = Field>) {
        self.emit(Level::Debug, msg, fields);
    }

    pub fn info(&self, msg: &str, fields: impl IntoIterator<Item = Field>) {
        self.emit(Level::Info, msg, fields);
    }

    pub fn warn(&self, msg: &str, fields: impl IntoIterator<Item = Field>) {
        self.emit(Level::Warn, msg, fields);
    }

    pub fn error(&self, msg: &str, fields: impl IntoIterator<Item = Field>) {
        self.emit(Level::Error, msg, fields);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("config", &self.inner.config)
            .field("bound", &self.bound)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::observability::{MemorySink, REDACTED, TraceId};

    fn logger_with_level(level: Level) -> (Logger, MemorySink) {
        let sink = MemorySink::new();
        let logger = Logger::new(
            LoggerConfig::new("lexitrack-api", "test", "1.0.0", level),
            RedactionPolicy::default(),
            Arc::new(sink.clone()),
        );
        (logger, sink)
    }

    fn logger() -> (Logger, MemorySink) {
        logger_with_level(Level::Debug)
    }

    /// 常に失敗する出力先
    struct BrokenSink;

    impl LogSink for BrokenSink {
        fn write_line(&self, _line: &[u8]) -> io::Result<()> {
            Err(io::Error::other("disk full"))
        }
    }

    // ===== emit テスト =====

    #[test]
    fn test_emitでサービス情報とメッセージが出力される() {
        let (logger, sink) = logger();

        logger.emit(Level::Info, "started", []);

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["msg"], "started");
        assert_eq!(records[0]["level"], "INFO");
        assert_eq!(records[0]["service"], "lexitrack-api");
        assert_eq!(records[0]["env"], "test");
        assert_eq!(records[0]["version"], "1.0.0");
        assert!(records[0].get("trace_id").is_none());
    }

    #[test]
    fn test_1レコードは改行で終わる1行になる() {
        let (logger, sink) = logger();

        logger.info("a", [Field::new("note", "line1\nline2")]);
        logger.info("b", []);

        assert_eq!(sink.lines().len(), 2);
        assert!(sink.contents().ends_with('\n'));
    }

    #[test]
    fn test_ログイン時のemailとauthorizationがマスクされる() {
        let (logger, sink) = logger();

        logger.info(
            "login",
            [
                Field::new("email", "ab@example.com"),
                Field::new("authorization", "Bearer xyz"),
            ],
        );

        let line = sink.contents();
        assert!(line.contains(r#""email":"***@example.com""#), "{line}");
        assert!(line.contains(r#""authorization":"***REDACTED***""#), "{line}");
        assert!(!line.contains("xyz"));
        assert!(!line.contains("ab@"));
    }

    #[test]
    fn test_phoneは末尾4桁以外がマスクされる() {
        let (logger, sink) = logger();

        logger.info("sms", [Field::new("phone", "+79991234567")]);

        let line = sink.contents();
        assert!(line.contains(r#""phone":"********4567""#), "{line}");
        assert!(!line.contains("+7999123"));
    }

    #[test]
    fn test_秘匿キーの値はどんな内容でも出力されない() {
        let (logger, sink) = logger();
        let secrets = [
            "s3cr3t-token-value",
            "email=alice@example.com",
            "\"quoted\" \\ value",
            "日本語のシークレット",
        ];

        for secret in secrets {
            for key in ["authorization", "Set-Cookie", "X-API-KEY"] {
                logger.warn("header", [Field::new(key, secret)]);
            }
        }

        let contents = sink.contents();
        for secret in secrets {
            let encoded = serde_json::to_string(secret).unwrap();
            assert!(!contents.contains(secret), "{secret} が出力に含まれる");
            assert!(!contents.contains(encoded.trim_matches('"')));
        }
        assert_eq!(sink.records().len(), 12);
        assert!(sink.records().iter().all(|r| {
            r.as_object()
                .unwrap()
                .iter()
                .any(|(_, v)| v == REDACTED)
        }));
    }

    #[test]
    fn test_最小レベル未満は出力されない() {
        let (logger, sink) = logger_with_level(Level::Warn);

        logger.debug("d", []);
        logger.info("i", []);
        logger.warn("w", []);
        logger.error("e", []);

        let levels: Vec<String> = sink
            .records()
            .iter()
            .map(|r| r["level"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(levels, vec!["WARN", "ERROR"]);
    }

    #[test]
    fn test_書き込み失敗は呼び出し元に伝播しない() {
        let logger = Logger::new(
            LoggerConfig::new("svc", "test", "1.0.0", Level::Debug),
            RedactionPolicy::default(),
            Arc::new(BrokenSink),
        );

        // パニックせずに戻ること
        logger.error("write fails", [Field::new("k", "v")]);
    }

    // ===== with_fields テスト =====

    #[test]
    fn test_with_fieldsでバインドした秘匿値は複数回の出力でも漏れない() {
        let (logger, sink) = logger();

        let bound = logger.with_fields([Field::new("authorization", "secret")]);
        bound.info("first", []);
        bound.warn("second", [Field::new("k", 1_i64)]);
        bound.error("third", [Field::new("email", "carol@example.com")]);

        let contents = sink.contents();
        assert!(!contents.contains("secret"));
        let records = sink.records();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r["authorization"] == REDACTED));
    }

    #[test]
    fn test_with_fieldsはバインド時にマスクする() {
        let (logger, _sink) = logger();

        let bound = logger.with_fields([
            Field::new("email", "alice@example.com"),
            Field::new("user_id", "u-1"),
        ]);

        assert_eq!(
            bound.bound_fields(),
            &[
                Field::new("email", "a***e@example.com"),
                Field::new("user_id", "u-1"),
            ]
        );
    }

    #[test]
    fn test_with_fieldsは元のロガーを変更しない() {
        let (logger, sink) = logger();

        let child = logger.with_fields([Field::new("operation", "user.get")]);
        let grandchild = child.with_fields([Field::new("user_id", "u-1")]);
        logger.info("root", []);
        grandchild.info("leaf", []);

        let records = sink.records();
        assert!(records[0].get("operation").is_none());
        assert_eq!(records[1]["operation"], "user.get");
        assert_eq!(records[1]["user_id"], "u-1");
        assert!(logger.bound_fields().is_empty());
        assert_eq!(child.bound_fields().len(), 1);
    }

    #[test]
    fn test_呼び出し時フィールドがバインド済みフィールドより優先される() {
        let (logger, sink) = logger();

        let bound = logger.with_fields([Field::new("stage", "bound")]);
        bound.info("m", [Field::new("stage", "call")]);

        assert_eq!(sink.records()[0]["stage"], "call");
    }

    #[test]
    fn test_派生ロガーを並行に使っても各レコードは1行に収まる() {
        let (logger, sink) = logger();

        std::thread::scope(|scope| {
            for i in 0..8_i64 {
                let worker = logger.with_fields([Field::new("worker", i)]);
                scope.spawn(move || {
                    for _ in 0..25 {
                        worker.info("tick", [Field::new("authorization", "Bearer t")]);
                    }
                });
            }
        });

        let records = sink.records();
        assert_eq!(records.len(), 200);
        assert_eq!(sink.lines().len(), 200);
        assert!(!sink.contents().contains("Bearer t"));
    }

    // ===== trace_id テスト =====

    #[tokio::test]
    async fn test_トレーススコープ内ではtrace_idが付与される() {
        let (logger, sink) = logger();
        let trace_id = TraceId::from_string("trace-abc");

        trace_id
            .scope(async {
                logger.info("inside", []);
            })
            .await;
        logger.info("outside", []);

        let records = sink.records();
        assert_eq!(records[0]["trace_id"], "trace-abc");
        assert!(records[1].get("trace_id").is_none());
    }
}
