//! Shared handle over a capture buffer with change notification

use super::export::{ExportFormat, ExportOutcome};
use super::filter::DisplayFilter;
use super::store::{CaptureBuffer, CaptureStats, CaptureStatus};
use super::types::{Category, LogRecord};
use super::CaptureError;
use crate::viewer::Value;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// What changed in a shared buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureChange {
    Recorded { category: Category, seq: u64 },
    Cleared,
    FilterChanged,
}

type Observer = Arc<dyn Fn(&CaptureChange) + Send + Sync>;

/// Cloneable handle used by hooks, the tracing layer and the panel alike.
///
/// Observers run after the buffer lock has been released, so they may read
/// the buffer again.
#[derive(Clone)]
pub struct SharedCapture {
    buffer: Arc<Mutex<CaptureBuffer>>,
    observers: Arc<Mutex<Vec<Observer>>>,
}

impl std::fmt::Debug for SharedCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedCapture")
            .field("len", &self.buffer.lock().len())
            .field("observers", &self.observers.lock().len())
            .finish()
    }
}

impl SharedCapture {
    pub fn new(buffer: CaptureBuffer) -> Self {
        Self {
            buffer: Arc::new(Mutex::new(buffer)),
            observers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register a callback for every change
    pub fn on_change<F>(&self, observer: F)
    where
        F: Fn(&CaptureChange) + Send + Sync + 'static,
    {
        self.observers.lock().push(Arc::new(observer));
    }

    fn notify(&self, change: CaptureChange) {
        let observers: Vec<Observer> = self.observers.lock().clone();
        for observer in observers {
            observer(&change);
        }
    }

    /// Run `f` with the buffer locked; no notification is sent
    pub fn read<R>(&self, f: impl FnOnce(&CaptureBuffer) -> R) -> R {
        f(&self.buffer.lock())
    }

    pub fn record(&self, category: &str, payload: Vec<Value>) -> Result<Option<u64>, CaptureError> {
        let seq = self.buffer.lock().record(category, payload)?;
        self.notify_recorded(category, seq);
        Ok(seq)
    }

    pub fn record_labeled(
        &self,
        category: &str,
        label: impl Into<String>,
        payload: Vec<Value>,
    ) -> Result<Option<u64>, CaptureError> {
        let seq = self.buffer.lock().record_labeled(category, label, payload)?;
        self.notify_recorded(category, seq);
        Ok(seq)
    }

    fn notify_recorded(&self, category: &str, seq: Option<u64>) {
        if let Some(seq) = seq {
            self.notify(CaptureChange::Recorded {
                category: Category::new(category),
                seq,
            });
        }
    }

    pub fn clear(&self) {
        self.buffer.lock().clear();
        self.notify(CaptureChange::Cleared);
    }

    pub fn set_category_enabled(&self, category: &str, enabled: bool) -> Result<(), CaptureError> {
        self.buffer.lock().set_category_enabled(category, enabled)?;
        self.notify(CaptureChange::FilterChanged);
        Ok(())
    }

    pub fn set_all_enabled(&self, enabled: bool) {
        self.buffer.lock().set_all_enabled(enabled);
        self.notify(CaptureChange::FilterChanged);
    }

    pub fn set_all_categories(&self, enabled: bool) {
        self.buffer.lock().set_all_categories(enabled);
        self.notify(CaptureChange::FilterChanged);
    }

    pub fn list(&self) -> Vec<LogRecord> {
        self.buffer.lock().list()
    }

    pub fn view(&self, display: &DisplayFilter, start: usize, count: usize) -> Vec<LogRecord> {
        self.buffer.lock().view(display, start, count)
    }

    pub fn get(&self, seq: u64) -> Option<LogRecord> {
        self.buffer.lock().get(seq)
    }

    pub fn counts(&self) -> BTreeMap<Category, usize> {
        self.buffer.lock().counts()
    }

    pub fn stats(&self) -> CaptureStats {
        self.buffer.lock().stats()
    }

    pub fn status(&self) -> CaptureStatus {
        self.buffer.lock().status()
    }

    /// Serialize outside the lock; host getters may record into this buffer
    pub fn export(&self, format: ExportFormat) -> Result<ExportOutcome, CaptureError> {
        let snapshot = self.buffer.lock().export_snapshot();
        snapshot.finish(format)
    }
}
