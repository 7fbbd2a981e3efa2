//! Bounded, category-gated record storage

use super::export::{build_artifact, ExportFormat, ExportOutcome};
use super::filter::{CategoryFilter, DisplayFilter};
use super::types::{Category, LogRecord, EVENT_CATEGORY, LOG_CATEGORIES};
use super::CaptureError;
use crate::viewer::Value;
use chrono::Utc;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};

pub const DEFAULT_LOG_CAPACITY: usize = 200;
pub const DEFAULT_EVENT_CAPACITY: usize = 100;

/// Statistics about a capture buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureStats {
    /// Records accepted since creation
    pub accepted: u64,
    /// Records refused because their category or the buffer was disabled
    pub dropped_by_filter: u64,
    /// Records pushed out by capacity since the last clear
    pub evicted: u64,
    /// Records refused for naming a category the buffer does not declare
    pub rejected: u64,
    pub current: usize,
    pub capacity: usize,
}

/// Global and per-category flags, as reported to the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureStatus {
    pub enabled: bool,
    pub categories: BTreeMap<String, bool>,
}

/// Records copied out of a buffer for serialization.
///
/// Serializing reads host accessors, which may log back into the same
/// buffer, so it happens on the snapshot after the buffer is unlocked.
pub(crate) struct ExportSnapshot {
    records: Vec<LogRecord>,
    prefix: String,
}

impl ExportSnapshot {
    pub(crate) fn finish(self, format: ExportFormat) -> Result<ExportOutcome, CaptureError> {
        if self.records.is_empty() {
            return Ok(ExportOutcome::Empty);
        }
        let artifact = build_artifact(&self.records, format, &self.prefix, Utc::now())?;
        Ok(ExportOutcome::Ready(artifact))
    }
}

/// Ring buffer of the most recent `capacity` accepted records
#[derive(Debug, Clone)]
pub struct CaptureBuffer {
    records: VecDeque<LogRecord>,
    capacity: usize,
    next_seq: u64,
    filter: CategoryFilter,
    export_prefix: String,
    accepted: u64,
    dropped_by_filter: u64,
    evicted: u64,
    rejected: u64,
}

impl CaptureBuffer {
    /// Create a buffer accepting the given categories, all enabled
    pub fn new<I, S>(capacity: usize, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            records: VecDeque::new(),
            capacity,
            next_seq: 1,
            filter: CategoryFilter::new(categories),
            export_prefix: "inspector_capture".to_string(),
            accepted: 0,
            dropped_by_filter: 0,
            evicted: 0,
            rejected: 0,
        }
    }

    /// Protocol log buffer with the standard log categories
    pub fn for_logs(capacity: usize) -> Self {
        Self::new(capacity, LOG_CATEGORIES).with_export_prefix("inspector_logs")
    }

    /// Host event buffer with the single `events` category
    pub fn for_events(capacity: usize) -> Self {
        Self::new(capacity, [EVENT_CATEGORY]).with_export_prefix("inspector_events")
    }

    pub fn with_export_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.export_prefix = prefix.into();
        self
    }

    /// Declare the category set and which categories are active.
    ///
    /// Categories missing from `enabled` start enabled. Stored records are kept.
    pub fn configure<I, S>(&mut self, categories: I, enabled: &HashMap<String, bool>) -> Result<(), CaptureError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut filter = CategoryFilter::new(categories);
        filter.enabled = self.filter.enabled;
        for (category, flag) in enabled {
            filter.set_category(category, *flag)?;
        }
        self.filter = filter;
        Ok(())
    }

    /// Append a record if the buffer and its category are enabled.
    ///
    /// Returns the record's sequence number, or `None` when it was refused.
    pub fn record(&mut self, category: &str, payload: Vec<Value>) -> Result<Option<u64>, CaptureError> {
        self.push(category, None, payload)
    }

    /// Like [`record`](Self::record) with a label, used for host event names
    pub fn record_labeled(
        &mut self,
        category: &str,
        label: impl Into<String>,
        payload: Vec<Value>,
    ) -> Result<Option<u64>, CaptureError> {
        self.push(category, Some(label.into()), payload)
    }

    fn push(&mut self, category: &str, label: Option<String>, payload: Vec<Value>) -> Result<Option<u64>, CaptureError> {
        let accepted = match self.filter.accepts(category) {
            Ok(accepted) => accepted,
            Err(e) => {
                self.rejected += 1;
                return Err(e);
            }
        };
        if !accepted {
            self.dropped_by_filter += 1;
            return Ok(None);
        }
        if self.capacity == 0 {
            self.evicted += 1;
            return Ok(None);
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.accepted += 1;
        self.records
            .push_back(LogRecord::new(seq, Category::new(category), label, payload));

        while self.records.len() > self.capacity {
            self.records.pop_front();
            self.evicted += 1;
        }

        #[cfg(feature = "debug_logging")]
        tracing::trace!(seq, category, len = self.records.len(), "record accepted");

        Ok(Some(seq))
    }

    /// Snapshot of every stored record, newest first
    pub fn list(&self) -> Vec<LogRecord> {
        self.records.iter().rev().cloned().collect()
    }

    /// Newest-first page of records passing `display` and the category flags
    pub fn view(&self, display: &DisplayFilter, start: usize, count: usize) -> Vec<LogRecord> {
        self.records
            .iter()
            .rev()
            .filter(|record| display.should_include(record, &self.filter))
            .skip(start)
            .take(count)
            .cloned()
            .collect()
    }

    pub fn get(&self, seq: u64) -> Option<LogRecord> {
        self.records.iter().find(|record| record.seq == seq).cloned()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.evicted = 0;
        // accepted and dropped_by_filter are lifetime stats
    }

    pub fn set_category_enabled(&mut self, category: &str, enabled: bool) -> Result<(), CaptureError> {
        self.filter.set_category(category, enabled)?;
        tracing::debug!(category, enabled, "category toggled");
        Ok(())
    }

    /// Global switch; per-category flags are left as they are
    pub fn set_all_enabled(&mut self, enabled: bool) {
        self.filter.enabled = enabled;
        tracing::debug!(enabled, "capture toggled");
    }

    /// Set every category flag at once
    pub fn set_all_categories(&mut self, enabled: bool) {
        self.filter.set_all_categories(enabled);
    }

    pub fn is_enabled(&self) -> bool {
        self.filter.enabled
    }

    pub fn filter(&self) -> &CategoryFilter {
        &self.filter
    }

    pub fn status(&self) -> CaptureStatus {
        CaptureStatus {
            enabled: self.filter.enabled,
            categories: self
                .filter
                .categories
                .iter()
                .map(|(category, flag)| (category.as_str().to_string(), *flag))
                .collect(),
        }
    }

    /// Stored records per declared category
    pub fn counts(&self) -> BTreeMap<Category, usize> {
        let mut counts: BTreeMap<Category, usize> =
            self.filter.categories.keys().map(|c| (c.clone(), 0)).collect();
        for record in &self.records {
            *counts.entry(record.category.clone()).or_default() += 1;
        }
        counts
    }

    pub fn stats(&self) -> CaptureStats {
        CaptureStats {
            accepted: self.accepted,
            dropped_by_filter: self.dropped_by_filter,
            evicted: self.evicted,
            rejected: self.rejected,
            current: self.records.len(),
            capacity: self.capacity,
        }
    }

    /// Serialize every stored record, oldest first
    pub fn export(&self, format: ExportFormat) -> Result<ExportOutcome, CaptureError> {
        self.export_snapshot().finish(format)
    }

    /// Stored records and the export prefix, taken without serializing anything
    pub(crate) fn export_snapshot(&self) -> ExportSnapshot {
        ExportSnapshot {
            records: self.records.iter().cloned().collect(),
            prefix: self.export_prefix.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
