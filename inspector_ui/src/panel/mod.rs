//! Terminal panel over the capture buffers and the object viewer
//!
//! A thin imperative shell: it reads buffer snapshots, keeps the viewer
//! handle and swaps in each new viewer generation after toggle or drill.

pub mod app;
pub mod command;
pub mod renderer;
pub mod session;
pub mod state;

pub use app::Panel;
pub use command::{CommandParser, PanelCommand, HELP_TEXT};
pub use renderer::{draw, BufferSummary};
pub use session::TerminalSession;
pub use state::{record_line, KeyOutcome, OpenRecord, PanelList, PanelState, Tab};

use crate::capture::CaptureError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("terminal error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Capture(#[from] CaptureError),
}
