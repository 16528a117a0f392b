//! # tracing 連携レイヤー
//!
//! `tracing` のイベントを [`Logger`] 経由で JSON 出力する subscriber レイヤー。
//! ライブラリ（sqlx, tower-http 等）や `tracing::info!` で出したログも、
//! [`Logger`] と同じマスキング・ヘッダー付与を経て出力される。
//!
//! ## フィールドの扱い
//!
//! - イベントの `message` はレコードの `msg` になる
//! - 親スパンのフィールドはルート側から順に、イベントのフィールドより前に並ぶ
//! - スパンのフィールドは記録時点でマスクして extensions に保持する
//! - `target` にイベントのモジュールパスを出力する

use tracing::{
    Event,
    Subscriber,
    field::{self as tracing_field, Visit},
    span,
};
use tracing_subscriber::{Layer, layer::Context, registry::LookupSpan};

use super::{
    field::{Field, FieldValue},
    level::Level,
    logger::Logger,
};

const MESSAGE_FIELD: &str = "message";

/// `tracing` のイベントを [`Logger`] に流すレイヤー
#[derive(Debug, Clone)]
pub struct LoggerLayer {
    logger: Logger,
}

impl LoggerLayer {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

/// スパンに保持するマスク済みフィールド
struct SpanFields(Vec<Field>);

impl SpanFields {
    /// 同じキーは上書き、新しいキーは末尾に追加する
    fn merge(&mut self, fields: Vec<Field>) {
        for field in fields {
            match self.0.iter_mut().find(|f| f.key() == field.key()) {
                Some(slot) => *slot = field,
                None => self.0.push(field),
            }
        }
    }
}

#[derive(Default)]
struct FieldCollector {
    message: Option<String>,
    fields:  Vec<Field>,
}

impl FieldCollector {
    fn push(&mut self, field: &tracing_field::Field, value: impl Into<FieldValue>) {
        let value = value.into();
        if field.name() == MESSAGE_FIELD {
            self.message = Some(value.to_string());
        } else {
            self.fields.push(Field::new(field.name(), value));
        }
    }
}

impl Visit for FieldCollector {
    fn record_f64(&mut self, field: &tracing_field::Field, value: f64) {
        self.push(field, value);
    }

    fn record_i64(&mut self, field: &tracing_field::Field, value: i64) {
        self.push(field, value);
    }

    fn record_u64(&mut self, field: &tracing_field::Field, value: u64) {
        self.push(field, value);
    }

    fn record_bool(&mut self, field: &tracing_field::Field, value: bool) {
        self.push(field, value);
    }

    fn record_str(&mut self, field: &tracing_field::Field, value: &str) {
        self.push(field, value);
    }

    fn record_error(
        &mut self,
        field: &tracing_field::Field,
        value: &(dyn std::error::Error + 'static),
    ) {
        self.push(field, value.to_string());
    }

    fn record_debug(&mut self, field: &tracing_field::Field, value: &dyn std::fmt::Debug) {
        self.push(field, format!("{value:?}"));
    }
}

impl<S> Layer<S> for LoggerLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(&self, attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        let mut collector = FieldCollector::default();
        attrs.record(&mut collector);

        let policy = self.logger.policy();
        let fields = collector
            .fields
            .into_iter()
            .map(|f| policy.redact(f))
            .collect();
        span.extensions_mut().insert(SpanFields(fields));
    }

    fn on_record(&self, id: &span::Id, values: &span::Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        let mut collector = FieldCollector::default();
        values.record(&mut collector);

        let policy = self.logger.policy();
        let fields: Vec<Field> = collector
            .fields
            .into_iter()
            .map(|f| policy.redact(f))
            .collect();

        let mut extensions = span.extensions_mut();
        match extensions.get_mut::<SpanFields>() {
            Some(existing) => existing.merge(fields),
            None => extensions.insert(SpanFields(fields)),
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = Level::from(*metadata.level());
        if !self.logger.enabled(level) {
            return;
        }

        let mut context = Vec::new();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(fields) = span.extensions().get::<SpanFields>() {
                    context.extend(fields.0.iter().cloned());
                }
            }
        }

        let mut collector = FieldCollector::default();
        event.record(&mut collector);
        let msg = collector
            .message
            .unwrap_or_else(|| metadata.name().to_owned());

        let fields =
            std::iter::once(Field::new("target", metadata.target())).chain(collector.fields);
        self.logger.emit_in_context(level, &msg, &context, fields);
    }
}
