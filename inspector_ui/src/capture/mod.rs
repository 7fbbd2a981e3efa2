//! Capture ring buffers for protocol logs and host events
//!
//! Records are gated by category at capture time, stored in a bounded
//! buffer that evicts the oldest first, listed newest first and exported as
//! JSON, text or CSV.

pub mod export;
pub mod filter;
pub mod shared;
pub mod store;
pub mod types;

pub use export::{build_artifact, DirectorySink, ExportArtifact, ExportFormat, ExportOutcome, ExportSink};
pub use filter::{CategoryFilter, DisplayFilter};
pub use shared::{CaptureChange, SharedCapture};
pub use store::{CaptureBuffer, CaptureStats, CaptureStatus, DEFAULT_EVENT_CAPACITY, DEFAULT_LOG_CAPACITY};
pub use types::{Category, LogRecord, EVENT_CATEGORY, LOG_CATEGORIES};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("unknown category '{0}'")]
    UnknownCategory(String),
    #[error("unknown export format '{0}'")]
    UnknownFormat(String),
    #[error("failed to serialize export: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
}
