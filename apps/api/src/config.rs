//! # アプリケーション設定
//!
//! 環境変数からアプリケーション設定を読み込み、起動前に検証する。
//!
//! ## 設計方針
//!
//! - 起動時に一度だけ読み込み、以降は不変値として各コンポーネントに渡す
//! - 読み込み元は `Fn(&str) -> Option<String>` で抽象化し、テストでは
//!   `HashMap` を渡す（プロセスの環境変数を書き換えない）
//! - パスワードは `Debug` 出力に含めない
//!
//! ## 環境変数一覧
//!
//! | 変数名 | デフォルト | 制約 |
//! |--------|------------|------|
//! | `LOGGER_LEVEL` | `info` | debug / info / warn / error |
//! | `LOGGER_REDACT_KEYS` | (空) | 追加で全置換するキー（カンマ区切り） |
//! | `HTTP_HOST` | `localhost` | |
//! | `HTTP_PORT` | `8080` | 1024 〜 65535 |
//! | `POSTGRES_HOST` | `localhost` | |
//! | `POSTGRES_PORT` | `5432` | |
//! | `POSTGRES_USER` | `postgres` | |
//! | `POSTGRES_PASSWORD` | **必須** | 空文字不可 |
//! | `POSTGRES_DBNAME` | `postgres` | |
//! | `POSTGRES_SSLMODE` | `disable` | disable / require / verify-ca / verify-full |
//! | `POOL_MAX_CONNS` | `16` | 1 以上 |
//! | `POOL_MIN_CONNS` | `4` | `POOL_MAX_CONNS` 以下 |
//! | `POOL_MAX_CONN_LIFETIME` | `1h` | 期間 |
//! | `POOL_MAX_CONN_IDLE_TIME` | `15m` | 期間 |
//! | `POOL_HEALTH_CHECK_PERIOD` | `1m` | 期間（`0` で無効） |
//! | `TIMEOUTS_READ` | `10s` | リクエストボディ読み込みの上限 |
//! | `TIMEOUTS_WRITE` | `10s` | リクエスト全体の上限 |
//! | `TIMEOUTS_PER_REQUEST` | `5s` | DB 操作 1 回・readiness ping の上限 |
//! | `TIMEOUTS_SHUTDOWN` | `30s` | グレースフルシャットダウンの上限 |
//! | `APP_SERVICE` | `lexitrack-api` | |
//! | `APP_ENV` | `development` | development / staging / production |
//! | `APP_VERSION` | クレートのバージョン | |
//! | `APP_RUN_MIGRATIONS` | `true` | 起動時にマイグレーションを適用するか |
//!
//! 期間は `500ms` / `10s` / `15m` / `1h` の形式で指定する。

use std::{collections::HashMap, env, fmt, str::FromStr, time::Duration};

use lexitrack_infra::db::PoolSettings;
use lexitrack_shared::observability::{Level, LoggerConfig, RedactionPolicy};
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use strum::{Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// 設定の読み込み・検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{key} が設定されていません")]
    Missing { key: &'static str },

    #[error("{key} の値が不正です（{value}）: {reason}")]
    Invalid {
        key:    &'static str,
        value:  String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// 実行環境
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

/// PostgreSQL の SSL モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum SslMode {
    #[default]
    Disable,
    Require,
    VerifyCa,
    VerifyFull,
}

impl From<SslMode> for PgSslMode {
    fn from(mode: SslMode) -> Self {
        match mode {
            SslMode::Disable => PgSslMode::Disable,
            SslMode::Require => PgSslMode::Require,
            SslMode::VerifyCa => PgSslMode::VerifyCa,
            SslMode::VerifyFull => PgSslMode::VerifyFull,
        }
    }
}

/// サービス情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInfo {
    pub service:        String,
    pub env:            Environment,
    pub version:        String,
    pub run_migrations: bool,
}

/// ロガー設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerSettings {
    pub level:       Level,
    /// 追加の全置換キー
    pub redact_keys: Vec<String>,
}

/// HTTP サーバー設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl HttpConfig {
    /// `host:port` 形式のアドレス
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// PostgreSQL 接続設定
#[derive(Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    pub host:     String,
    pub port:     u16,
    pub user:     String,
    pub password: String,
    pub dbname:   String,
    pub sslmode:  SslMode,
}

impl PostgresConfig {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.dbname)
            .ssl_mode(self.sslmode.into())
    }
}

impl fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("dbname", &self.dbname)
            .field("sslmode", &self.sslmode)
            .finish()
    }
}

/// タイムアウト設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    pub read:        Duration,
    pub write:       Duration,
    pub per_request: Duration,
    pub shutdown:    Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            read:        Duration::from_secs(10),
            write:       Duration::from_secs(10),
            per_request: Duration::from_secs(5),
            shutdown:    Duration::from_secs(30),
        }
    }
}

/// アプリケーション全体の設定
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app:      AppInfo,
    pub logger:   LoggerSettings,
    pub http:     HttpConfig,
    pub postgres: PostgresConfig,
    pub pool:     PoolSettings,
    pub timeouts: TimeoutConfig,
}

impl AppConfig {
    /// プロセスの環境変数から読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// キーと値の組から読み込む
    pub fn from_map(values: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| values.get(key).cloned())
    }

    /// 任意の読み込み元から設定を構築して検証する
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = Source { lookup };

        let app = AppInfo {
            service:        source.string("APP_SERVICE", "lexitrack-api"),
            env:            source.parsed("APP_ENV", Environment::default(), |v| {
                Environment::from_str(v).map_err(|_| {
                    "development / staging / production のいずれかを指定してください".to_string()
                })
            })?,
            version:        source.string("APP_VERSION", env!("CARGO_PKG_VERSION")),
            run_migrations: source.parsed("APP_RUN_MIGRATIONS", true, parse_bool)?,
        };

        let logger = LoggerSettings {
            level:       source.parsed("LOGGER_LEVEL", Level::Info, parse_level)?,
            redact_keys: source
                .get("LOGGER_REDACT_KEYS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|k| !k.is_empty())
                        .map(str::to_owned)
                        .collect()
                })
                .unwrap_or_default(),
        };

        let http = HttpConfig {
            host: source.string("HTTP_HOST", "localhost"),
            port: source.parsed("HTTP_PORT", 8080, |v| parse_port(v, 1024))?,
        };

        let password = source
            .get("POSTGRES_PASSWORD")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing {
                key: "POSTGRES_PASSWORD",
            })?;

        let postgres = PostgresConfig {
            host: source.string("POSTGRES_HOST", "localhost"),
            port: source.parsed("POSTGRES_PORT", 5432, |v| parse_port(v, 1))?,
            user: source.string("POSTGRES_USER", "postgres"),
            password,
            dbname: source.string("POSTGRES_DBNAME", "postgres"),
            sslmode: source.parsed("POSTGRES_SSLMODE", SslMode::default(), |v| {
                SslMode::from_str(v).map_err(|_| {
                    "disable / require / verify-ca / verify-full のいずれかを指定してください"
                        .to_string()
                })
            })?,
        };

        let timeouts = TimeoutConfig {
            read:        source.positive_duration("TIMEOUTS_READ", "10s")?,
            write:       source.positive_duration("TIMEOUTS_WRITE", "10s")?,
            per_request: source.positive_duration("TIMEOUTS_PER_REQUEST", "5s")?,
            shutdown:    source.positive_duration("TIMEOUTS_SHUTDOWN", "30s")?,
        };

        let max_connections = source.parsed("POOL_MAX_CONNS", 16, |v| {
            v.parse::<u32>()
                .ok()
                .filter(|n| *n >= 1)
                .ok_or_else(|| "1 以上の整数を指定してください".to_string())
        })?;
        let min_connections = source.parsed("POOL_MIN_CONNS", 4, |v| {
            v.parse::<u32>()
                .map_err(|_| "0 以上の整数を指定してください".to_string())
        })?;
        if min_connections > max_connections {
            return Err(ConfigError::invalid(
                "POOL_MIN_CONNS",
                &min_connections.to_string(),
                format!("POOL_MAX_CONNS（{max_connections}）以下である必要があります"),
            ));
        }

        let pool = PoolSettings {
            max_connections,
            min_connections,
            max_lifetime: source.positive_duration("POOL_MAX_CONN_LIFETIME", "1h")?,
            idle_timeout: source.positive_duration("POOL_MAX_CONN_IDLE_TIME", "15m")?,
            acquire_timeout: timeouts.per_request,
            health_check_period: source.duration("POOL_HEALTH_CHECK_PERIOD", "1m")?,
        };

        Ok(Self {
            app,
            logger,
            http,
            postgres,
            pool,
            timeouts,
        })
    }

    /// ロガーの共通設定
    pub fn logger_config(&self) -> LoggerConfig {
        LoggerConfig::new(
            self.app.service.clone(),
            self.app.env.to_string(),
            self.app.version.clone(),
            self.logger.level,
        )
    }

    /// 既定のキーに `LOGGER_REDACT_KEYS` を加えたマスキング規則
    pub fn redaction_policy(&self) -> RedactionPolicy {
        RedactionPolicy::default().with_secret_keys(&self.logger.redact_keys)
    }
}

struct Source<F> {
    lookup: F,
}

impl<F> Source<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// 値を取得する（前後の空白を除き、空文字は未設定扱い）
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T>(
        &self,
        key: &'static str,
        default: T,
        parse: impl FnOnce(&str) -> Result<T, String>,
    ) -> Result<T, ConfigError> {
        match self.get(key) {
            Some(value) => parse(&value).map_err(|reason| ConfigError::invalid(key, &value, reason)),
            None => Ok(default),
        }
    }

    fn duration(&self, key: &'static str, default: &str) -> Result<Duration, ConfigError> {
        let value = self.string(key, default);
        parse_duration(&value).ok_or_else(|| {
            ConfigError::invalid(key, &value, "500ms / 10s / 15m / 1h の形式で指定してください")
        })
    }

    /// 0 を受け付けない期間
    fn positive_duration(&self, key: &'static str, default: &str) -> Result<Duration, ConfigError> {
        let duration = self.duration(key, default)?;
        if duration.is_zero() {
            return Err(ConfigError::invalid(
                key,
                &self.string(key, default),
                "0 より大きい期間を指定してください",
            ));
        }
        Ok(duration)
    }
}

/// `500ms` / `10s` / `15m` / `1h` 形式の期間をパースする
///
/// 単位なしは `0` のみ受け付ける。
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);
    let n: u64 = number.parse().ok()?;

    match unit {
        "ms" => Some(Duration::from_millis(n)),
        "s" => Some(Duration::from_secs(n)),
        "m" => n.checked_mul(60).map(Duration::from_secs),
        "h" => n.checked_mul(60 * 60).map(Duration::from_secs),
        "" if n == 0 => Some(Duration::ZERO),
        _ => None,
    }
}

fn parse_port(value: &str, min: u16) -> Result<u16, String> {
    value
        .parse::<u16>()
        .ok()
        .filter(|port| *port >= min)
        .ok_or_else(|| format!("{min} 〜 65535 の整数を指定してください"))
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err("true / false を指定してください".to_string()),
    }
}

fn parse_level(value: &str) -> Result<Level, String> {
    match value.to_ascii_lowercase().as_str() {
        "debug" | "info" | "warn" | "warning" | "error" => Ok(Level::parse(value)),
        _ => Err("debug / info / warn / error のいずれかを指定してください".to_string()),
    }
}
