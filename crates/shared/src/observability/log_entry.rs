//! # ログレコード
//!
//! 1 回のログ呼び出しで出力される JSON オブジェクト。
//!
//! ## キーの並び
//!
//! `time`, `level`, `msg`, `service`, `env`, `version`, `trace_id`（あれば）,
//! バインド済みフィールド, 呼び出し時フィールド の順に出力する。
//!
//! - ユーザーフィールドが上記ヘッダーキーと衝突した場合は `field.<key>` として出力する
//! - ユーザーフィールド同士でキーが重複した場合は後勝ちで、最初の位置に上書きする

use std::borrow::Cow;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer, ser::SerializeMap};

use super::{
    field::{Field, FieldValue},
    level::Level,
    logger::LoggerConfig,
    trace_context::TraceId,
};

const HEADER_KEYS: [&str; 7] = ["time", "level", "msg", "service", "env", "version", "trace_id"];

/// ログレコード
///
/// フィールドはマスク済みの [`Field`] を借用する。
/// [`to_json_line`](LogEntry::to_json_line) で改行付きの 1 行にシリアライズする。
#[derive(Debug)]
pub struct LogEntry<'a> {
    time:     DateTime<Utc>,
    level:    Level,
    msg:      &'a str,
    config:   &'a LoggerConfig,
    trace_id: Option<&'a TraceId>,
    fields:   Vec<(Cow<'a, str>, &'a FieldValue)>,
}

impl<'a> LogEntry<'a> {
    pub fn new(
        time: DateTime<Utc>,
        level: Level,
        msg: &'a str,
        config: &'a LoggerConfig,
        trace_id: Option<&'a TraceId>,
    ) -> Self {
        Self {
            time,
            level,
            msg,
            config,
            trace_id,
            fields: Vec::new(),
        }
    }

    /// フィールドを追加する
    pub fn extend(&mut self, fields: impl IntoIterator<Item = &'a Field>) {
        for field in fields {
            let key: Cow<'a, str> = if HEADER_KEYS.contains(&field.key()) {
                Cow::Owned(format!("field.{}", field.key()))
            } else {
                Cow::Borrowed(field.key())
            };

            match self.fields.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = field.value(),
                None => self.fields.push((key, field.value())),
            }
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// 改行付きの JSON 1 行にシリアライズする
    pub fn to_json_line(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }
}

impl Serialize for LogEntry<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(
            "time",
            &self.time.to_rfc3339_opts(SecondsFormat::Millis, true),
        )?;
        map.serialize_entry("level", self.level.as_str())?;
        map.serialize_entry("msg", self.msg)?;
        map.serialize_entry("service", &self.config.service)?;
        map.serialize_entry("env", &self.config.env)?;
        map.serialize_entry("version", &self.config.version)?;
        if let Some(trace_id) = self.trace_id {
            map.serialize_entry("trace_id", trace_id.as_str())?;
        }
        for (key, value) in &self.fields {
            map.serialize_entry(key.as_ref(), value)?;
        }
        map.end()
    }
}
