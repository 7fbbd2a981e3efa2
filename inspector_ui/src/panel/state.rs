//! Panel state and its reaction to keys and commands

use super::command::{CommandParser, PanelCommand, HELP_TEXT};
use super::PanelError;
use crate::capture::{DisplayFilter, ExportOutcome, ExportSink, LogRecord, SharedCapture};
use crate::hooks::ModuleEntry;
use crate::viewer::{preview, RenderOptions, Value, ViewRow, Viewer, DEFAULT_DRILL_STEP, PREVIEW_LEN};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Logs,
    Events,
    Modules,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Logs, Tab::Events, Tab::Modules];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Logs => "Logs",
            Tab::Events => "Events",
            Tab::Modules => "Modules",
        }
    }

    fn next(self) -> Self {
        match self {
            Tab::Logs => Tab::Events,
            Tab::Events => Tab::Modules,
            Tab::Modules => Tab::Logs,
        }
    }
}

/// Rows of the active tab's list
#[derive(Debug, Clone, Copy)]
pub enum PanelList<'a> {
    Records(&'a [LogRecord]),
    Modules(&'a [ModuleEntry]),
}

impl PanelList<'_> {
    pub fn len(&self) -> usize {
        match self {
            PanelList::Records(records) => records.len(),
            PanelList::Modules(modules) => modules.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A record opened in the object viewer
#[derive(Debug, Clone)]
pub struct OpenRecord {
    pub seq: u64,
    pub viewer: Viewer,
    /// Highlighted row of the viewer
    pub cursor: usize,
    /// The record has since been pushed out of its buffer
    pub evicted: bool,
}

impl OpenRecord {
    pub fn rows(&self) -> Vec<ViewRow> {
        self.viewer.tree().rows()
    }
}

/// What the key loop should do after an input
#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    Handled,
    Command(PanelCommand),
}

/// Plain text of a record's list row, the text `/search` matches
pub fn record_line(record: &LogRecord) -> String {
    let mut line = format!("{} [{}] ", record.formatted_time, record.category.tag());
    if let Some(label) = &record.label {
        line.push_str(label);
        line.push(' ');
    }
    line.push_str(&preview(&record.payload, PREVIEW_LEN));
    line
}

pub struct PanelState {
    pub tab: Tab,
    pub input: String,
    pub status: String,
    /// Index into the visible list
    pub selected: usize,
    pub filter: DisplayFilter,
    /// Case-insensitive text every visible row must contain
    pub search: String,
    pub open: Option<OpenRecord>,
    pub render_options: RenderOptions,
    pub drill_step: usize,
}

impl Default for PanelState {
    fn default() -> Self {
        Self::new(RenderOptions::default(), DEFAULT_DRILL_STEP)
    }
}

impl PanelState {
    pub fn new(render_options: RenderOptions, drill_step: usize) -> Self {
        Self {
            tab: Tab::Logs,
            input: String::new(),
            status: "Ready. Type /help for commands.".to_string(),
            selected: 0,
            filter: DisplayFilter::All,
            search: String::new(),
            open: None,
            render_options,
            drill_step,
        }
    }

    /// Buffer behind the active tab; the Modules tab has none
    pub fn active<'a>(&self, logs: &'a SharedCapture, events: &'a SharedCapture) -> Option<&'a SharedCapture> {
        match self.tab {
            Tab::Logs => Some(logs),
            Tab::Events => Some(events),
            Tab::Modules => None,
        }
    }

    fn matches_search(&self, text: &str) -> bool {
        self.search.is_empty() || text.to_lowercase().contains(&self.search.to_lowercase())
    }

    /// Records shown in the list, newest first
    pub fn visible(&self, capture: &SharedCapture) -> Vec<LogRecord> {
        capture
            .view(&self.filter, 0, usize::MAX)
            .into_iter()
            .filter(|record| self.matches_search(&record_line(record)))
            .collect()
    }

    /// Modules whose id or any export name matches the search
    pub fn visible_modules(&self, modules: Vec<ModuleEntry>) -> Vec<ModuleEntry> {
        modules
            .into_iter()
            .filter(|entry| {
                self.matches_search(&entry.id) || entry.exports.iter().any(|export| self.matches_search(export))
            })
            .collect()
    }

    pub fn handle_key(&mut self, key: KeyEvent, list: PanelList<'_>) -> KeyOutcome {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return KeyOutcome::Command(PanelCommand::Quit);
        }

        let typing = !self.input.is_empty();
        match key.code {
            KeyCode::Char(c) if typing || c == '/' => self.input.push(c),
            KeyCode::Backspace if typing => {
                self.input.pop();
            }
            KeyCode::Enter if typing => {
                let line = std::mem::take(&mut self.input);
                match CommandParser::parse(&line) {
                    Some(command) => return KeyOutcome::Command(command),
                    None => self.status = format!("Unknown command: {}", line.trim()),
                }
            }
            KeyCode::Esc if typing => self.input.clear(),
            KeyCode::Esc => self.open = None,
            KeyCode::Tab => self.switch_tab(),
            KeyCode::Enter => {
                if let PanelList::Records(records) = list {
                    self.open_selected(records);
                }
            }
            KeyCode::Char(' ') => self.toggle_at_cursor(),
            KeyCode::Char('d') => self.drill_at_cursor(),
            KeyCode::Up => self.move_cursor(-1, list.len()),
            KeyCode::Down => self.move_cursor(1, list.len()),
            KeyCode::Home => self.move_cursor(isize::MIN, list.len()),
            KeyCode::End => self.move_cursor(isize::MAX, list.len()),
            _ => {}
        }
        KeyOutcome::Handled
    }

    fn switch_tab(&mut self) {
        self.tab = self.tab.next();
        self.selected = 0;
        self.filter = DisplayFilter::All;
        self.open = None;
        self.status = format!("Showing {}", self.tab.title());
    }

    fn move_cursor(&mut self, delta: isize, list_len: usize) {
        let (position, len) = match &mut self.open {
            Some(open) => {
                let len = open.rows().len();
                (&mut open.cursor, len)
            }
            None => (&mut self.selected, list_len),
        };
        if len == 0 {
            *position = 0;
            return;
        }
        let target = (*position as isize).saturating_add(delta);
        *position = target.clamp(0, len as isize - 1) as usize;
    }

    /// Open the highlighted record in the viewer
    pub fn open_selected(&mut self, records: &[LogRecord]) {
        let Some(record) = records.get(self.selected) else {
            return;
        };
        let root = Value::array(record.payload.iter().cloned());
        let viewer = Viewer::new(root, self.render_options).with_drill_step(self.drill_step);
        self.open = Some(OpenRecord {
            seq: record.seq,
            viewer,
            cursor: 0,
            evicted: false,
        });
        self.status = format!("Record #{} [{}]", record.seq, record.category.tag());
    }

    /// Flag the open record once its buffer no longer holds it
    pub fn sync_open(&mut self, capture: &SharedCapture) {
        let Some(open) = &mut self.open else {
            return;
        };
        if !open.evicted && capture.get(open.seq).is_none() {
            open.evicted = true;
            self.status = format!("Record #{} left the buffer, showing the copy taken when opened", open.seq);
        }
    }

    /// Expand or collapse the row under the viewer cursor
    pub fn toggle_at_cursor(&mut self) {
        let Some(open) = &mut self.open else {
            return;
        };
        let Some(row) = open.rows().into_iter().nth(open.cursor) else {
            return;
        };
        if row.placeholder {
            self.status = "Nested object: press d to load deeper".to_string();
        } else if row.toggle.is_some() && open.cursor > 0 {
            open.viewer = open.viewer.toggle(&row.path);
        }
    }

    /// Re-root the viewer at the placeholder under the cursor
    pub fn drill_at_cursor(&mut self) {
        let Some(open) = &mut self.open else {
            return;
        };
        let Some(row) = open.rows().into_iter().nth(open.cursor) else {
            return;
        };
        match open.viewer.drill(&row.path) {
            Some(viewer) => {
                open.viewer = viewer;
                open.cursor = 0;
                self.status = format!("Drilled into {}", row.path);
            }
            None => self.status = "Only nested placeholders can be drilled".to_string(),
        }
    }

    /// Apply a command; buffer commands go to `capture`. `Ok(true)` means quit.
    pub fn process_command(
        &mut self,
        command: PanelCommand,
        capture: Option<&SharedCapture>,
        sink: &dyn ExportSink,
    ) -> Result<bool, PanelError> {
        match command {
            PanelCommand::Quit => return Ok(true),
            PanelCommand::Help => self.status = HELP_TEXT.to_string(),
            PanelCommand::Search(query) => {
                self.search = query.unwrap_or_default();
                self.selected = 0;
                self.status = if self.search.is_empty() {
                    "Search cleared.".to_string()
                } else {
                    format!("Searching for \"{}\"", self.search)
                };
            }
            command => match capture {
                Some(capture) => self.apply_to_buffer(command, capture, sink)?,
                None => self.status = format!("{} has no capture buffer.", self.tab.title()),
            },
        }
        Ok(false)
    }

    fn apply_to_buffer(
        &mut self,
        command: PanelCommand,
        capture: &SharedCapture,
        sink: &dyn ExportSink,
    ) -> Result<(), PanelError> {
        match command {
            PanelCommand::Clear => {
                capture.clear();
                self.selected = 0;
                self.open = None;
                self.status = format!("{} cleared.", self.tab.title());
            }
            PanelCommand::Export(format) => {
                self.status = match capture.export(format)? {
                    ExportOutcome::Empty => "Nothing to export.".to_string(),
                    ExportOutcome::Ready(artifact) => {
                        let path = sink.deliver(&artifact)?;
                        format!("Exported to {}", path.display())
                    }
                };
            }
            PanelCommand::Filter(filter) => {
                self.status = match &filter {
                    DisplayFilter::All => "Filter cleared.".to_string(),
                    DisplayFilter::Only(category) => format!("Filtering by type: {}", category),
                };
                self.filter = filter;
                self.selected = 0;
                self.open = None;
            }
            PanelCommand::Enable(category) => {
                capture.set_category_enabled(&category, true)?;
                self.status = format!("Type '{}' enabled.", category);
            }
            PanelCommand::Disable(category) => {
                capture.set_category_enabled(&category, false)?;
                self.status = format!("Type '{}' disabled.", category);
            }
            PanelCommand::AllCategories(enabled) => {
                capture.set_all_categories(enabled);
                self.status = format!("All types {}.", if enabled { "enabled" } else { "disabled" });
            }
            PanelCommand::Capture(enabled) => {
                capture.set_all_enabled(enabled);
                self.status = format!("Capture {}.", if enabled { "on" } else { "off" });
            }
            PanelCommand::Quit | PanelCommand::Help | PanelCommand::Search(_) => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureBuffer, CaptureError, ExportArtifact, ExportFormat};
    use parking_lot::Mutex;
    use std::path::PathBuf;

    #[derive(Default)]
    struct MemorySink {
        delivered: Mutex<Vec<ExportArtifact>>,
    }

    impl ExportSink for MemorySink {
        fn deliver(&self, artifact: &ExportArtifact) -> Result<PathBuf, CaptureError> {
            self.delivered.lock().push(artifact.clone());
            Ok(PathBuf::from(&artifact.filename))
        }
    }

    const NO_ROWS: PanelList<'static> = PanelList::Records(&[]);

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_line(state: &mut PanelState, line: &str) -> KeyOutcome {
        for c in line.chars() {
            state.handle_key(key(KeyCode::Char(c)), NO_ROWS);
        }
        state.handle_key(key(KeyCode::Enter), NO_ROWS)
    }

    fn nested_record() -> SharedCapture {
        let capture = SharedCapture::new(CaptureBuffer::for_logs(10));
        let payload = Value::object([("a", Value::object([("b", Value::object([("c", Value::Null)]))]))]);
        capture.record("received", vec![payload]).unwrap();
        capture
    }

    fn modules() -> Vec<ModuleEntry> {
        vec![
            ModuleEntry {
                id: "logger".to_string(),
                exports: vec!["log".to_string()],
            },
            ModuleEntry {
                id: "wap".to_string(),
                exports: vec!["decode_stanza".to_string(), "encode_stanza".to_string()],
            },
        ]
    }

    #[test]
    fn test_typed_command_is_parsed() {
        let mut state = PanelState::default();
        assert_eq!(type_line(&mut state, "/filter sent"), KeyOutcome::Command(PanelCommand::Filter("sent".parse().unwrap())));
        assert!(state.input.is_empty());

        type_line(&mut state, "/nope");
        assert_eq!(state.status, "Unknown command: /nope");
    }

    #[test]
    fn test_open_toggle_and_drill() {
        let capture = nested_record();
        let records = capture.list();
        let list = PanelList::Records(&records);
        let mut state = PanelState::new(RenderOptions { max_depth: 2, ..Default::default() }, 3);

        state.handle_key(key(KeyCode::Enter), list);
        assert_eq!(state.open.as_ref().map(|o| o.seq), Some(records[0].seq));

        // rows: root, [0]
        state.handle_key(key(KeyCode::Down), list);
        state.handle_key(key(KeyCode::Char(' ')), list);
        // rows: root, [0], a
        state.handle_key(key(KeyCode::Down), list);
        state.handle_key(key(KeyCode::Char(' ')), list);
        let rows = state.open.as_ref().unwrap().rows();
        let placeholder = rows.iter().position(|r| r.placeholder).expect("b is beyond the depth budget");
        assert_eq!(rows[placeholder].path.key(), "0.a.b");

        state.open.as_mut().unwrap().cursor = placeholder;
        state.handle_key(key(KeyCode::Char('d')), list);
        let open = state.open.as_ref().unwrap();
        assert_eq!(open.viewer.base().key(), "0.a.b");
        assert_eq!(open.viewer.options().max_depth, 5);
        assert!(!open.rows().iter().any(|r| r.placeholder));
    }

    #[test]
    fn test_esc_closes_viewer() {
        let capture = nested_record();
        let records = capture.list();
        let mut state = PanelState::default();
        state.handle_key(key(KeyCode::Enter), PanelList::Records(&records));
        state.handle_key(key(KeyCode::Esc), PanelList::Records(&records));
        assert!(state.open.is_none());
    }

    #[test]
    fn test_commands_act_on_buffer() {
        let capture = nested_record();
        let sink = MemorySink::default();
        let mut state = PanelState::default();

        assert!(!state.process_command(PanelCommand::Export(ExportFormat::Json), Some(&capture), &sink).unwrap());
        assert_eq!(sink.delivered.lock().len(), 1);

        state.process_command(PanelCommand::Disable("sent".into()), Some(&capture), &sink).unwrap();
        assert_eq!(capture.status().categories["sent"], false);
        assert!(state.process_command(PanelCommand::Disable("bogus".into()), Some(&capture), &sink).is_err());

        state.process_command(PanelCommand::Clear, Some(&capture), &sink).unwrap();
        state.process_command(PanelCommand::Export(ExportFormat::Csv), Some(&capture), &sink).unwrap();
        assert_eq!(state.status, "Nothing to export.");
        assert_eq!(sink.delivered.lock().len(), 1);

        assert!(state.process_command(PanelCommand::Quit, Some(&capture), &sink).unwrap());
    }

    #[test]
    fn test_buffer_commands_on_modules_tab() {
        let sink = MemorySink::default();
        let mut state = PanelState::default();
        state.tab = Tab::Modules;

        state.process_command(PanelCommand::Clear, None, &sink).unwrap();
        assert_eq!(state.status, "Modules has no capture buffer.");
        assert!(state.process_command(PanelCommand::Quit, None, &sink).unwrap());
    }

    #[test]
    fn test_tab_switch_cycles_and_resets_view() {
        let mut state = PanelState::default();
        state.filter = DisplayFilter::Only("sent".into());
        state.handle_key(key(KeyCode::Tab), NO_ROWS);
        assert_eq!(state.tab, Tab::Events);
        assert_eq!(state.filter, DisplayFilter::All);

        state.handle_key(key(KeyCode::Tab), NO_ROWS);
        assert_eq!(state.tab, Tab::Modules);
        state.handle_key(key(KeyCode::Tab), NO_ROWS);
        assert_eq!(state.tab, Tab::Logs);
    }

    #[test]
    fn test_search_filters_records_case_insensitively() {
        let capture = SharedCapture::new(CaptureBuffer::for_logs(10));
        capture.record("sent", vec![Value::from("Encode stanza")]).unwrap();
        capture.record("received", vec![Value::from("ping")]).unwrap();
        let sink = MemorySink::default();
        let mut state = PanelState::default();

        state
            .process_command(PanelCommand::Search(Some("ENCODE".into())), Some(&capture), &sink)
            .unwrap();
        let visible = state.visible(&capture);
        assert_eq!(visible.len(), 1);
        assert!(record_line(&visible[0]).contains("[SENT] Encode stanza"));

        state.process_command(PanelCommand::Search(Some("received".into())), None, &sink).unwrap();
        assert_eq!(state.visible(&capture).len(), 1);

        state.process_command(PanelCommand::Search(None), None, &sink).unwrap();
        assert_eq!(state.status, "Search cleared.");
        assert_eq!(state.visible(&capture).len(), 2);
    }

    #[test]
    fn test_search_matches_module_ids_and_exports() {
        let mut state = PanelState::default();
        state.search = "DECODE".to_string();
        let visible = state.visible_modules(modules());
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "wap");

        state.search = "log".to_string();
        assert_eq!(state.visible_modules(modules())[0].id, "logger");
    }

    #[test]
    fn test_module_list_moves_selection_without_opening() {
        let entries = modules();
        let mut state = PanelState::default();
        state.tab = Tab::Modules;

        state.handle_key(key(KeyCode::End), PanelList::Modules(&entries));
        assert_eq!(state.selected, 1);
        state.handle_key(key(KeyCode::Enter), PanelList::Modules(&entries));
        assert!(state.open.is_none());
    }

    #[test]
    fn test_evicted_open_record_is_flagged() {
        let capture = SharedCapture::new(CaptureBuffer::new(1, ["logs"]));
        capture.record("logs", vec![Value::from("first")]).unwrap();
        let mut state = PanelState::default();
        state.open_selected(&capture.list());

        state.sync_open(&capture);
        assert!(!state.open.as_ref().unwrap().evicted);

        capture.record("logs", vec![Value::from("second")]).unwrap();
        state.sync_open(&capture);
        let open = state.open.as_ref().unwrap();
        assert!(open.evicted);
        assert!(state.status.starts_with(&format!("Record #{} left the buffer", open.seq)));
    }
}
