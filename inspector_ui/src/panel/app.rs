//! Main panel event loop

use super::renderer::{draw, BufferSummary};
use super::session::TerminalSession;
use super::state::{KeyOutcome, PanelList, PanelState, Tab};
use super::PanelError;
use crate::capture::{DirectorySink, SharedCapture};
use crate::config::InspectorConfig;
use crate::hooks::{list_modules, SharedModules};
use crossterm::event::{self, Event, KeyEventKind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Buffers and settings the panel works with
pub struct Panel {
    pub logs: SharedCapture,
    pub events: SharedCapture,
    pub sink: DirectorySink,
    /// Host module system listed on the Modules tab, when there is one
    modules: Option<SharedModules>,
    state: PanelState,
    /// Set by observers whenever a buffer changes
    dirty: Arc<AtomicBool>,
}

impl Panel {
    pub fn new(logs: SharedCapture, events: SharedCapture, config: &InspectorConfig) -> Self {
        let dirty = Arc::new(AtomicBool::new(true));
        for capture in [&logs, &events] {
            let flag = dirty.clone();
            capture.on_change(move |_| flag.store(true, Ordering::Release));
        }
        Self {
            logs,
            events,
            sink: DirectorySink::new(config.capture.export_dir.clone()),
            modules: None,
            state: PanelState::new(config.render_options(), config.viewer.drill_step),
            dirty,
        }
    }

    pub fn with_modules(mut self, modules: SharedModules) -> Self {
        self.modules = Some(modules);
        self
    }

    /// Run until `/quit`, Ctrl+C or `shutdown` is set
    pub fn run(mut self, shutdown: Arc<AtomicBool>) -> Result<(), PanelError> {
        let mut session = TerminalSession::new()?;
        tracing::info!("panel started");

        let mut redraw = true;
        while !shutdown.load(Ordering::Acquire) {
            let active = self.state.active(&self.logs, &self.events).cloned();
            let records = match &active {
                Some(capture) => self.state.visible(capture),
                None => Vec::new(),
            };
            let modules = match (&self.modules, self.state.tab) {
                (Some(modules), Tab::Modules) => self.state.visible_modules(list_modules(modules.as_ref())),
                _ => Vec::new(),
            };
            let list = match self.state.tab {
                Tab::Modules => PanelList::Modules(&modules),
                Tab::Logs | Tab::Events => PanelList::Records(&records),
            };

            if redraw || self.dirty.swap(false, Ordering::AcqRel) {
                let figures = active.as_ref().map(|capture| {
                    self.state.sync_open(capture);
                    (capture.counts(), capture.status(), capture.stats())
                });
                let summary = figures.as_ref().map(|(counts, status, stats)| BufferSummary { counts, status, stats });
                let state = &self.state;
                session.terminal_mut().draw(|frame| {
                    draw(frame, state, list, summary.as_ref());
                })?;
                redraw = false;
            }

            if !event::poll(POLL_INTERVAL)? {
                continue;
            }
            let Event::Key(key) = event::read()? else {
                redraw = true;
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            redraw = true;

            if let KeyOutcome::Command(command) = self.state.handle_key(key, list) {
                match self.state.process_command(command, active.as_ref(), &self.sink) {
                    Ok(true) => break,
                    Ok(false) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "panel command failed");
                        self.state.status = e.to_string();
                    }
                }
            }
        }

        tracing::info!("panel closed");
        Ok(())
    }
}
