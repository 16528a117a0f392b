//! # ログレベル

use strum::{Display, IntoStaticStr};

/// ログレベル
///
/// JSON には大文字（`"INFO"` など）で出力する。順序は `Debug < Info < Warn < Error`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Display, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Level {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl Level {
    /// 設定値からログレベルをパースする
    ///
    /// 大文字小文字は区別しない。`warning` は `warn` の別名。
    /// 空文字や不正な値の場合は [`Info`](Level::Info) にフォールバックする。
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Self::Debug,
            "info" => Self::Info,
            "warn" | "warning" => Self::Warn,
            "error" => Self::Error,
            _ => Self::Info,
        }
    }

    /// JSON に出力する名前
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// `EnvFilter` のディレクティブ文字列
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl From<tracing::Level> for Level {
    /// `TRACE` は `Debug` に丸める
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Self::Debug,
            tracing::Level::INFO => Self::Info,
            tracing::Level::WARN => Self::Warn,
            tracing::Level::ERROR => Self::Error,
        }
    }
}
