//! Tracing layer that forwards host events into a capture buffer

use crate::capture::{CaptureError, SharedCapture};
use crate::viewer::Value;
use tracing::{field::Visit, Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Records from this crate never enter the buffer they describe
const OWN_TARGET: &str = "inspector_ui";

/// Category used when an event names none the buffer knows
pub const FALLBACK_CATEGORY: &str = "logs";

/// Captures tracing events as `[message, {fields}]` records
#[derive(Debug, Clone)]
pub struct CaptureLayer {
    capture: SharedCapture,
}

impl CaptureLayer {
    pub fn new(capture: SharedCapture) -> Self {
        Self { capture }
    }

    /// Explicit `category` field first, then the last target segment, then the fallback
    fn category_for(&self, explicit: Option<&str>, target: &str) -> Option<String> {
        let last_segment = target.rsplit("::").next().unwrap_or(target);
        self.capture.read(|buffer| {
            let filter = buffer.filter();
            explicit
                .filter(|c| filter.is_declared(c))
                .or_else(|| Some(last_segment).filter(|c| filter.is_declared(c)))
                .or_else(|| Some(FALLBACK_CATEGORY).filter(|c| filter.is_declared(c)))
                .map(str::to_string)
        })
    }

    // No tracing from here: the event would come straight back into this layer
    fn store(&self, category: &str, payload: Vec<Value>) {
        if let Err(e) = self.capture.record(category, payload) {
            // Only a category retired after it was resolved lands here. The
            // record is dropped and the buffer has counted it under `rejected`.
            debug_assert!(matches!(e, CaptureError::UnknownCategory(_)), "{}", e);
        }
    }
}

/// Field visitor that keeps the message apart from typed fields
#[derive(Default)]
struct FieldCollector {
    message: String,
    category: Option<String>,
    fields: Vec<(String, Value)>,
}

impl FieldCollector {
    fn push(&mut self, field: &tracing::field::Field, value: Value) {
        self.fields.push((field.name().to_string(), value));
    }
}

impl Visit for FieldCollector {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        let mut text = format!("{:?}", value);
        if text.len() > 1 && text.starts_with('"') && text.ends_with('"') {
            text = text[1..text.len() - 1].to_string();
        }
        match field.name() {
            "message" => self.message = text,
            "category" => self.category = Some(text),
            _ => self.push(field, Value::String(text)),
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            "category" => self.category = Some(value.to_string()),
            _ => self.push(field, Value::from(value)),
        }
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.push(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.push(field, Value::Number(value as f64));
    }

    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.push(field, Value::Number(value));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.push(field, Value::Bool(value));
    }
}

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let target = metadata.target();
        if target.starts_with(OWN_TARGET) {
            return;
        }

        let mut collector = FieldCollector::default();
        event.record(&mut collector);

        let Some(category) = self.category_for(collector.category.as_deref(), target) else {
            return;
        };

        let mut details = collector.fields;
        details.push(("level".to_string(), Value::from(metadata.level().as_str())));
        details.push(("target".to_string(), Value::from(target)));
        let payload = vec![Value::String(collector.message), Value::object(details)];
        self.store(&category, payload);
    }
}
