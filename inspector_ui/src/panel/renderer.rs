//! Painting the panel with ratatui

use super::command::HELP_TEXT;
use super::state::{PanelList, PanelState, Tab};
use crate::capture::{CaptureStats, CaptureStatus, Category, LogRecord};
use crate::hooks::ModuleEntry;
use crate::viewer::{preview, ViewRow, PREVIEW_LEN};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use std::collections::BTreeMap;

/// Buffer figures for the active tab
pub struct BufferSummary<'a> {
    pub counts: &'a BTreeMap<Category, usize>,
    pub status: &'a CaptureStatus,
    pub stats: &'a CaptureStats,
}

fn category_color(category: &Category) -> Color {
    match category.as_str() {
        "app_state" => Color::Magenta,
        "logs" => Color::Red,
        "received" => Color::LightRed,
        "sent" => Color::Green,
        "decode" | "encode" => Color::Yellow,
        _ => Color::Cyan,
    }
}

fn record_item(record: &LogRecord) -> ListItem<'static> {
    let mut spans = vec![
        Span::styled(record.formatted_time.clone(), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("[{}]", record.category.tag()),
            Style::default().fg(category_color(&record.category)),
        ),
        Span::raw(" "),
    ];
    if let Some(label) = &record.label {
        spans.push(Span::styled(label.clone(), Style::default().fg(Color::Blue)));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::raw(preview(&record.payload, PREVIEW_LEN)));
    ListItem::new(Line::from(spans))
}

fn row_item(row: &ViewRow) -> ListItem<'static> {
    let style = if row.error {
        Style::default().fg(Color::Red)
    } else if row.placeholder {
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC)
    } else {
        Style::default()
    };
    ListItem::new(Line::from(Span::styled(row.display(), style)))
}

fn module_item(entry: &ModuleEntry) -> ListItem<'static> {
    ListItem::new(Line::from(Span::styled(entry.label(), Style::default().fg(Color::Cyan))))
}

fn export_item(name: &str) -> ListItem<'static> {
    ListItem::new(Line::from(vec![
        Span::styled("ƒ ", Style::default().fg(Color::Yellow)),
        Span::raw(name.to_string()),
    ]))
}

fn header_line(state: &PanelState, list: PanelList<'_>, summary: Option<&BufferSummary<'_>>) -> Line<'static> {
    let mut spans = Vec::new();
    for tab in Tab::ALL {
        let style = if tab == state.tab {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default().fg(Color::Cyan)
        };
        spans.push(Span::styled(format!(" {} ", tab.title()), style));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::raw("| "));
    let Some(summary) = summary else {
        spans.push(Span::raw(format!("{} modules", list.len())));
        return Line::from(spans);
    };
    for (category, count) in summary.counts {
        let enabled = summary.status.categories.get(category.as_str()).copied().unwrap_or(false);
        let style = if enabled {
            Style::default().fg(category_color(category))
        } else {
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
        };
        spans.push(Span::styled(format!("{}:{} ", category, count), style));
    }
    if !summary.status.enabled {
        spans.push(Span::styled("CAPTURE OFF", Style::default().fg(Color::Red)));
    }
    Line::from(spans)
}

fn list_title(state: &PanelState, shown: usize, summary: Option<&BufferSummary<'_>>) -> String {
    let mut title = match summary {
        Some(summary) => format!(
            "{} ({} shown, {} accepted, {} dropped, {} evicted, {} rejected)",
            state.tab.title(),
            shown,
            summary.stats.accepted,
            summary.stats.dropped_by_filter,
            summary.stats.evicted,
            summary.stats.rejected,
        ),
        None => format!("{} ({} shown)", state.tab.title(), shown),
    };
    if !state.search.is_empty() {
        title.push_str(&format!(" search: \"{}\"", state.search));
    }
    title
}

/// Draw one frame. Returns the input box area for cursor placement.
///
/// `summary` describes the active buffer and is absent on the Modules tab.
pub fn draw(frame: &mut Frame, state: &PanelState, list: PanelList<'_>, summary: Option<&BufferSummary<'_>>) -> Rect {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(1),    // List and detail pane
            Constraint::Length(4), // Input box (3 lines) + Help (1 line)
        ])
        .split(frame.area());

    let header = Paragraph::new(header_line(state, list, summary))
        .alignment(Alignment::Left)
        .block(Block::default().borders(Borders::ALL).title(" Inspector "));
    frame.render_widget(header, chunks[0]);

    let selected_module = match list {
        PanelList::Modules(modules) => modules.get(state.selected),
        PanelList::Records(_) => None,
    };
    let split = state.open.is_some() || selected_module.is_some();
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(if split {
            [Constraint::Percentage(40), Constraint::Percentage(60)]
        } else {
            [Constraint::Percentage(100), Constraint::Percentage(0)]
        })
        .split(chunks[1]);

    let items: Vec<ListItem<'static>> = match list {
        PanelList::Records(records) => records.iter().map(record_item).collect(),
        PanelList::Modules(modules) => modules.iter().map(module_item).collect(),
    };
    let list_widget = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(list_title(state, list.len(), summary)))
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("► ");
    let mut list_state = ListState::default().with_selected((!list.is_empty()).then_some(state.selected));
    frame.render_stateful_widget(list_widget, body[0], &mut list_state);

    if let Some(open) = &state.open {
        let rows = open.rows();
        let title = format!(" #{} {} ", open.seq, open.viewer.base());
        let viewer = List::new(rows.iter().map(row_item).collect::<Vec<_>>())
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol("► ");
        let mut viewer_state = ListState::default().with_selected(Some(open.cursor));
        frame.render_stateful_widget(viewer, body[1], &mut viewer_state);
    } else if let Some(module) = selected_module {
        let exports = List::new(module.exports.iter().map(|name| export_item(name)).collect::<Vec<_>>())
            .block(Block::default().borders(Borders::ALL).title(format!(" {} exports ", module.id)));
        frame.render_widget(exports, body[1]);
    }

    let input_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Input area with borders
            Constraint::Length(1), // Status line
        ])
        .split(chunks[2]);

    let input = Paragraph::new(format!("> {}", state.input))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Command Input ")
                .style(Style::default().fg(Color::Cyan)),
        )
        .style(Style::default().fg(Color::White));
    frame.render_widget(input, input_layout[0]);

    let status = if state.status.is_empty() { HELP_TEXT } else { state.status.as_str() };
    frame.render_widget(
        Paragraph::new(status).style(Style::default().fg(Color::Gray)),
        input_layout[1],
    );

    let input_area = input_layout[0];
    frame.set_cursor_position(Position::new(
        input_area.x + 3 + state.input.chars().count() as u16,
        input_area.y + 1,
    ));
    input_area
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureBuffer, SharedCapture};
    use crate::viewer::Value;
    use ratatui::{backend::TestBackend, Terminal};

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_draws_records_and_viewer() {
        let capture = SharedCapture::new(CaptureBuffer::for_logs(10));
        capture
            .record("sent", vec![Value::object([("tag", Value::from("iq"))])])
            .unwrap();
        let records = capture.list();
        let counts = capture.counts();
        let status = capture.status();
        let stats = capture.stats();
        let summary = BufferSummary {
            counts: &counts,
            status: &status,
            stats: &stats,
        };

        let mut state = PanelState::default();
        state.open_selected(&records);

        let mut terminal = Terminal::new(TestBackend::new(120, 20)).unwrap();
        terminal
            .draw(|frame| {
                draw(frame, &state, PanelList::Records(&records), Some(&summary));
            })
            .unwrap();

        let text = screen(&terminal);
        assert!(text.contains("[SENT] { tag: string ... }"), "{}", text);
        assert!(text.contains("sent:1"));
        assert!(text.contains("Sequence(1)"));
        assert!(text.contains("Command Input"));
    }

    #[test]
    fn test_draws_modules_and_selected_exports() {
        let modules = vec![
            ModuleEntry {
                id: "logger".to_string(),
                exports: vec!["log".to_string()],
            },
            ModuleEntry {
                id: "wap".to_string(),
                exports: vec!["decode_stanza".to_string(), "encode_stanza".to_string()],
            },
        ];
        let mut state = PanelState::default();
        state.tab = Tab::Modules;
        state.selected = 1;
        state.search = "stanza".to_string();

        let mut terminal = Terminal::new(TestBackend::new(120, 20)).unwrap();
        terminal
            .draw(|frame| {
                draw(frame, &state, PanelList::Modules(&modules), None);
            })
            .unwrap();

        let text = screen(&terminal);
        assert!(text.contains("2 modules"), "{}", text);
        assert!(text.contains("wap (2 exports)"));
        assert!(text.contains("wap exports"));
        assert!(text.contains("ƒ encode_stanza"));
        assert!(text.contains("search: \"stanza\""));
    }
}
