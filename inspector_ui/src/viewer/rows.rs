//! Flattening a view tree into indented rows for a painting layer

use super::node::{NodeKind, ViewNode};
use super::path::ExpansionPath;
use super::render::ViewTree;

/// One visible line of a rendered tree
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRow {
    pub depth: usize,
    pub path: ExpansionPath,
    pub label: Option<String>,
    pub text: String,
    /// `Some(expanded)` when the row can be toggled
    pub toggle: Option<bool>,
    pub placeholder: bool,
    pub error: bool,
    /// Untruncated text for truncated scalars
    pub full_text: Option<String>,
}

impl ViewRow {
    fn from_node(node: &ViewNode) -> Self {
        let full_text = match &node.kind {
            NodeKind::Scalar { full_text, .. } => full_text.clone(),
            _ => None,
        };
        Self {
            depth: node.depth,
            path: node.path.clone(),
            label: node.label.clone(),
            text: node.kind.text(),
            toggle: node.kind.toggle(),
            placeholder: node.kind.is_placeholder(),
            error: node.kind.is_error(),
            full_text,
        }
    }

    /// `▶ label: text` with two spaces of indent per level
    pub fn display(&self) -> String {
        let indent = "  ".repeat(self.depth);
        let marker = match self.toggle {
            Some(true) => "▼ ",
            Some(false) => "▶ ",
            None => "  ",
        };
        match &self.label {
            Some(label) => format!("{}{}{}: {}", indent, marker, label, self.text),
            None => format!("{}{}{}", indent, marker, self.text),
        }
    }
}

impl ViewTree {
    /// Every node of the tree in pre-order; the tree only holds visible nodes
    pub fn rows(&self) -> Vec<ViewRow> {
        flatten(&self.root)
    }
}

fn flatten(node: &ViewNode) -> Vec<ViewRow> {
    let mut rows = vec![ViewRow::from_node(node)];
    for child in &node.children {
        rows.extend(flatten(child));
    }
    rows
}
