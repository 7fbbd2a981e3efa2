//! Instrumentation panel for inspecting a host client's internals
//!
//! - [`viewer`]: lazy, depth-bounded, cycle-safe rendering of host values
//! - [`capture`]: bounded, category-gated record buffers with export
//! - [`hooks`]: optional host capabilities and the interceptors that feed the buffers
//! - [`panel`]: terminal shell over the buffers and the viewer

pub mod capture;
pub mod config;
pub mod hooks;
pub mod logging;
pub mod panel;
pub mod viewer;

pub use capture::{CaptureBuffer, CaptureError, ExportFormat, ExportOutcome, LogRecord, SharedCapture};
pub use config::{ConfigError, InspectorConfig};
pub use hooks::{HookError, HookSet};
pub use panel::{Panel, PanelError};
pub use viewer::{render, ExpandedPaths, ExpansionPath, RenderOptions, Value, ViewTree, Viewer};
