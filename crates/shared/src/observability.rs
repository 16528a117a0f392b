//! # Observability 基盤
//!
//! 構造化ログ（JSON Lines）と、リクエスト単位のトレース ID 伝播を提供する。
//!
//! ## 構成
//!
//! ```text
//! tracing::info!(...) ──▶ LoggerLayer ─┐
//!                                      ├─▶ Logger ──(redact)──▶ LogEntry ──▶ LogSink
//! logger.info("...", fields) ──────────┘        ▲
//!                                               └── current_trace_id()（task-local）
//! ```
//!
//! - [`Logger`]: サービス情報・バインド済みフィールド・マスキング規則を持つ不変値
//! - [`RedactionPolicy`]: キー名に基づくフィールド単位のマスキング
//! - [`MakeTraceId`] / [`TraceId::scope`]: tower-http の `SetRequestIdLayer` で採番した ID を
//!   task-local に載せる
//! - [`LoggerLayer`]: `tracing` のイベントを [`Logger`] に流す subscriber レイヤー
//!
//! ## 設計方針
//!
//! - リクエスト処理コードはグローバルなロガーを参照しない。[`Logger`] は起動時に
//!   構築して State 経由で渡す。プロセス全体で共有するのは [`init_tracing`] で
//!   登録する subscriber のみ
//! - ログ出力の失敗は呼び出し元に伝播させない

mod field;
mod layer;
mod level;
mod log_entry;
mod logger;
mod redaction;
mod sink;
mod trace_context;

pub use field::{Field, FieldValue};
pub use layer::LoggerLayer;
pub use level::Level;
pub use log_entry::LogEntry;
pub use logger::{Logger, LoggerConfig};
pub use redaction::{
    MASKED_EMAIL,
    REDACTED,
    RedactionPolicy,
    RedactionRule,
    mask_email,
    mask_phone,
};
pub use sink::{LogSink, MemorySink, StdoutSink};
pub use trace_context::{
    MakeTraceId,
    TRACE_ID_HEADER,
    TRACE_ID_HEADER_NAME,
    TraceId,
    current_trace_id,
    in_current_trace,
    trace_id_of,
};
use tracing_subscriber::util::TryInitError;

/// トレーシングを初期化する
///
/// `RUST_LOG` 環境変数でフィルタを制御可能。
/// 未設定の場合は [`LoggerConfig::level`] をデフォルトとする。
///
/// 登録するレイヤー:
/// - `EnvFilter`
/// - [`LoggerLayer`]（全イベントを `logger` 経由で JSON 出力）
/// - `tracing_error::ErrorLayer`（`SpanTrace` の捕捉）
///
/// subscriber が既に登録済みの場合はエラーを返す。
pub fn init_tracing(logger: &Logger) -> Result<(), TryInitError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logger.config().level.as_directive().into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(LoggerLayer::new(logger.clone()))
        .with(tracing_error::ErrorLayer::default())
        .try_init()
}
