//! Host event capture with a lower-fidelity fallback

use super::HookError;
use crate::capture::{SharedCapture, EVENT_CATEGORY};
use crate::viewer::Value;
use parking_lot::Mutex;
use std::sync::Arc;

/// Event name recorded once when capture falls back to mutations
pub const LOADED_EVENT: &str = "inspector.loaded";
/// Event name for each batch of observed mutations
pub const MUTATION_EVENT: &str = "dom.changed";

pub type EventCallback = Arc<dyn Fn(&str, Value) + Send + Sync>;
pub type MutationCallback = Arc<dyn Fn(usize) + Send + Sync>;

/// A host bus that reports every event it emits
pub trait EventBus {
    fn on_any(&self, callback: EventCallback) -> Result<(), HookError>;
}

/// Coarse change notifications, reported as a count per batch
pub trait MutationSource {
    fn observe(&self, callback: MutationCallback) -> Result<(), HookError>;
}

/// How event capture ended up wired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventMode {
    Bus,
    Mutations,
    Inactive,
}

pub struct EventCapture;

impl EventCapture {
    /// Subscribe to the bus if there is one, otherwise fall back to mutations.
    ///
    /// Every path feeds `capture` with `label = event name`, `payload = [value]`.
    pub fn install(
        bus: Option<&dyn EventBus>,
        mutations: Option<&dyn MutationSource>,
        capture: SharedCapture,
    ) -> EventMode {
        if let Some(bus) = bus {
            let sink = capture.clone();
            let callback: EventCallback = Arc::new(move |event: &str, value: Value| {
                record_event(&sink, event, value);
            });
            match bus.on_any(callback) {
                Ok(()) => {
                    tracing::info!("event capture attached to host bus");
                    return EventMode::Bus;
                }
                Err(e) => tracing::warn!(error = %e, "event bus refused subscription"),
            }
        }

        record_event(
            &capture,
            LOADED_EVENT,
            Value::object([("message", Value::from("inspector started without an event bus"))]),
        );

        let Some(mutations) = mutations else {
            tracing::warn!("no event source available");
            return EventMode::Inactive;
        };

        let sink = capture.clone();
        let callback: MutationCallback = Arc::new(move |count: usize| {
            record_event(
                &sink,
                MUTATION_EVENT,
                Value::object([("mutations", Value::Number(count as f64))]),
            );
        });
        match mutations.observe(callback) {
            Ok(()) => {
                tracing::info!("event capture falling back to mutation observation");
                EventMode::Mutations
            }
            Err(e) => {
                tracing::warn!(error = %e, "mutation observation unavailable");
                EventMode::Inactive
            }
        }
    }
}

fn record_event(capture: &SharedCapture, event: &str, value: Value) {
    if let Err(e) = capture.record_labeled(EVENT_CATEGORY, event, vec![value]) {
        tracing::warn!(event, error = %e, "dropped host event");
    }
}

/// Event bus living in the same process, for hosts without their own
#[derive(Clone, Default)]
pub struct LocalEventBus {
    listeners: Arc<Mutex<Vec<EventCallback>>>,
}

impl LocalEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: &str, value: Value) {
        let listeners: Vec<EventCallback> = self.listeners.lock().clone();
        for listener in listeners {
            listener(event, value.clone());
        }
    }
}

impl EventBus for LocalEventBus {
    fn on_any(&self, callback: EventCallback) -> Result<(), HookError> {
        self.listeners.lock().push(callback);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CaptureBuffer;

    struct ClosedBus;

    impl EventBus for ClosedBus {
        fn on_any(&self, _callback: EventCallback) -> Result<(), HookError> {
            Err(HookError::UnavailableCapability("onAny".into()))
        }
    }

    #[derive(Default)]
    struct ManualMutations {
        callback: Mutex<Option<MutationCallback>>,
    }

    impl ManualMutations {
        fn fire(&self, count: usize) {
            if let Some(callback) = self.callback.lock().clone() {
                callback(count);
            }
        }
    }

    impl MutationSource for ManualMutations {
        fn observe(&self, callback: MutationCallback) -> Result<(), HookError> {
            *self.callback.lock() = Some(callback);
            Ok(())
        }
    }

    fn labels(capture: &SharedCapture) -> Vec<String> {
        capture.list().iter().filter_map(|r| r.label.clone()).collect()
    }

    #[test]
    fn test_bus_events_are_labelled() {
        let capture = SharedCapture::new(CaptureBuffer::for_events(10));
        let bus = LocalEventBus::new();
        assert_eq!(EventCapture::install(Some(&bus), None, capture.clone()), EventMode::Bus);

        bus.emit("chat.active_chat", Value::from("123@c.us"));
        let records = capture.list();
        assert_eq!(records[0].label.as_deref(), Some("chat.active_chat"));
        assert_eq!(records[0].payload_json(), serde_json::json!(["123@c.us"]));
    }

    #[test]
    fn test_fallback_records_loaded_then_mutations() {
        let capture = SharedCapture::new(CaptureBuffer::for_events(10));
        let mutations = ManualMutations::default();
        let mode = EventCapture::install(Some(&ClosedBus), Some(&mutations), capture.clone());
        assert_eq!(mode, EventMode::Mutations);

        mutations.fire(4);
        assert_eq!(labels(&capture), vec![MUTATION_EVENT.to_string(), LOADED_EVENT.to_string()]);
        assert_eq!(capture.list()[0].payload_json(), serde_json::json!([{ "mutations": 4 }]));
    }

    #[test]
    fn test_no_source_is_inactive() {
        let capture = SharedCapture::new(CaptureBuffer::for_events(10));
        assert_eq!(EventCapture::install(None, None, capture.clone()), EventMode::Inactive);
        assert_eq!(labels(&capture), vec![LOADED_EVENT.to_string()]);
    }
}
