//! Slash commands typed into the panel

use crate::capture::{DisplayFilter, ExportFormat};

pub const HELP_TEXT: &str =
    "Commands: /quit, /clear, /export json|txt|csv, /filter <type|all>, /search [text], /enable <type>, /disable <type>, /all on|off, /capture on|off";

#[derive(Debug, Clone, PartialEq)]
pub enum PanelCommand {
    Quit,
    /// Empty the active buffer
    Clear,
    Export(ExportFormat),
    /// Type filter of the record list
    Filter(DisplayFilter),
    /// Case-insensitive text filter of the list; `None` clears it
    Search(Option<String>),
    Enable(String),
    Disable(String),
    /// Every category flag of the active buffer
    AllCategories(bool),
    /// Global capture switch of the active buffer
    Capture(bool),
    Help,
}

pub struct CommandParser;

impl CommandParser {
    /// Parse a `/command args` line; anything else is `None`
    pub fn parse(input: &str) -> Option<PanelCommand> {
        let input = input.trim();
        let rest = input.strip_prefix('/')?;
        let parts: Vec<&str> = rest.split_whitespace().collect();
        let (name, args) = parts.split_first()?;

        match *name {
            "q" | "quit" => Some(PanelCommand::Quit),
            "c" | "clear" => Some(PanelCommand::Clear),
            "h" | "help" => Some(PanelCommand::Help),
            "e" | "export" => {
                let format = args.first().copied().unwrap_or("json");
                format.parse().ok().map(PanelCommand::Export)
            }
            "f" | "filter" => {
                let filter = args.first().copied().unwrap_or("all");
                filter.parse().ok().map(PanelCommand::Filter)
            }
            "s" | "search" => Some(PanelCommand::Search((!args.is_empty()).then(|| args.join(" ")))),
            "enable" => args.first().map(|c| PanelCommand::Enable(c.to_string())),
            "disable" => args.first().map(|c| PanelCommand::Disable(c.to_string())),
            "all" => args.first().and_then(|s| parse_switch(s)).map(PanelCommand::AllCategories),
            "capture" => args.first().and_then(|s| parse_switch(s)).map(PanelCommand::Capture),
            _ => None,
        }
    }
}

fn parse_switch(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Some(true),
        "off" | "false" | "0" => Some(false),
        _ => None,
    }
}
