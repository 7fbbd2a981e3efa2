//! Render tree produced by a single render pass

use super::classify::ScalarKind;
use super::path::ExpansionPath;

/// Where an inline error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Reading one member failed
    AccessDenied,
    /// The value itself could not be inspected
    Object,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Depth budget exhausted; drilling in renders this branch with a larger budget
    Placeholder,
    Null,
    Absent,
    Scalar {
        kind: ScalarKind,
        /// Display text, quoted and truncated for strings
        text: String,
        /// Complete text when `text` was truncated
        full_text: Option<String>,
    },
    Callable {
        signature: String,
        expanded: bool,
    },
    /// Source text shown under an expanded callable
    Source(String),
    Empty(&'static str),
    Composite {
        summary: String,
        expanded: bool,
    },
    Error {
        kind: FailureKind,
        message: String,
    },
}

impl NodeKind {
    /// Text a painting layer shows for this node
    pub fn text(&self) -> String {
        match self {
            NodeKind::Placeholder => "[nested object]".to_string(),
            NodeKind::Null => "null".to_string(),
            NodeKind::Absent => "undefined".to_string(),
            NodeKind::Scalar { text, .. } => text.clone(),
            NodeKind::Callable { signature, .. } => signature.clone(),
            NodeKind::Source(source) => source.clone(),
            NodeKind::Empty(literal) => literal.to_string(),
            NodeKind::Composite { summary, .. } => summary.clone(),
            NodeKind::Error { kind, message } => match kind {
                FailureKind::AccessDenied => format!("[Access denied: {}]", message),
                FailureKind::Object => format!("[Error processing object: {}]", message),
            },
        }
    }

    /// `Some(expanded)` for nodes that carry a toggle
    pub fn toggle(&self) -> Option<bool> {
        match self {
            NodeKind::Callable { expanded, .. } | NodeKind::Composite { expanded, .. } => {
                Some(*expanded)
            }
            _ => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, NodeKind::Placeholder)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, NodeKind::Error { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewNode {
    /// Member label (`key` or `[index]`); `None` for the root and source nodes
    pub label: Option<String>,
    pub path: ExpansionPath,
    /// Distance from the render root
    pub depth: usize,
    pub kind: NodeKind,
    pub children: Vec<ViewNode>,
}

impl ViewNode {
    pub(crate) fn leaf(label: Option<String>, path: ExpansionPath, depth: usize, kind: NodeKind) -> Self {
        Self {
            label,
            path,
            depth,
            kind,
            children: Vec::new(),
        }
    }

    /// Pre-order walk over this node and everything below it
    pub fn walk(&self) -> Vec<&ViewNode> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.walk());
        }
        out
    }

    /// First node (pre-order) whose path is `path`, skipping source lines
    pub fn find(&self, path: &ExpansionPath) -> Option<&ViewNode> {
        if self.path == *path && !matches!(self.kind, NodeKind::Source(_)) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(path))
    }

    /// Deepest `depth` anywhere in this subtree
    pub fn max_depth(&self) -> usize {
        self.children
            .iter()
            .map(ViewNode::max_depth)
            .max()
            .unwrap_or(self.depth)
            .max(self.depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_text() {
        let denied = NodeKind::Error {
            kind: FailureKind::AccessDenied,
            message: "nope".into(),
        };
        assert_eq!(denied.text(), "[Access denied: nope]");
        assert!(denied.is_error());
        assert_eq!(denied.toggle(), None);
    }

    #[test]
    fn test_find_and_depth() {
        let leaf = ViewNode::leaf(Some("b".into()), ExpansionPath::parse("a.b"), 2, NodeKind::Null);
        let mut mid = ViewNode::leaf(
            Some("a".into()),
            ExpansionPath::parse("a"),
            1,
            NodeKind::Composite { summary: "{}".into(), expanded: true },
        );
        mid.children.push(leaf);
        let mut root = ViewNode::leaf(
            None,
            ExpansionPath::root(),
            0,
            NodeKind::Composite { summary: "{}".into(), expanded: true },
        );
        root.children.push(mid);

        assert_eq!(root.max_depth(), 2);
        assert_eq!(root.walk().len(), 3);
        assert_eq!(root.find(&ExpansionPath::parse("a.b")).map(|n| n.depth), Some(2));
        assert!(root.find(&ExpansionPath::parse("zzz")).is_none());
    }
}
