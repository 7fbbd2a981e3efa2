//! Pure, depth-bounded rendering of host values into a [`ViewTree`]

use super::classify::{classify, ScalarKind, Shape};
use super::node::{FailureKind, NodeKind, ViewNode};
use super::path::{ExpandedPaths, ExpansionPath};
use super::value::{ArrayRef, ObjectRef, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Keys that belong to the delegation mechanism rather than the data
const ARTIFACT_KEYS: [&str; 2] = ["constructor", "prototype"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Nodes deeper than this render as placeholders
    pub max_depth: usize,
    /// Strings longer than this many characters are truncated for display
    pub truncate_at: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_depth: 3,
            truncate_at: 100,
        }
    }
}

/// Output of one render pass
#[derive(Debug, Clone, PartialEq)]
pub struct ViewTree {
    pub root: ViewNode,
    pub options: RenderOptions,
}

/// Render `value` rooted at `base`.
///
/// The render root is always shown expanded. Every other container or
/// callable is expanded only if its path is in `expanded`. Nothing here can
/// fail: problems become [`NodeKind::Error`] nodes.
pub fn render(
    value: &Value,
    base: &ExpansionPath,
    options: &RenderOptions,
    expanded: &ExpandedPaths,
) -> ViewTree {
    let renderer = Renderer { options, expanded };
    ViewTree {
        root: renderer.node(None, value, base.clone(), 0),
        options: *options,
    }
}

struct Renderer<'a> {
    options: &'a RenderOptions,
    expanded: &'a ExpandedPaths,
}

impl Renderer<'_> {
    /// The render root opens by itself only when it is a container
    fn is_expanded(&self, path: &ExpansionPath, depth: usize) -> bool {
        depth == 0 || self.expanded.contains(path)
    }

    fn node(&self, label: Option<String>, value: &Value, path: ExpansionPath, depth: usize) -> ViewNode {
        if depth > self.options.max_depth {
            return ViewNode::leaf(label, path, depth, NodeKind::Placeholder);
        }

        let shape = match classify(value) {
            Ok(shape) => shape,
            Err(failure) => {
                let kind = NodeKind::Error {
                    kind: FailureKind::Object,
                    message: failure.message,
                };
                return ViewNode::leaf(label, path, depth, kind);
            }
        };

        match shape {
            Shape::Null => ViewNode::leaf(label, path, depth, NodeKind::Null),
            Shape::Absent => ViewNode::leaf(label, path, depth, NodeKind::Absent),
            Shape::Scalar(scalar) => {
                let kind = self.scalar(scalar.kind, &scalar.text);
                ViewNode::leaf(label, path, depth, kind)
            }
            Shape::Callable { signature, source } => {
                let expanded = self.expanded.contains(&path);
                let mut node = ViewNode::leaf(
                    label,
                    path.clone(),
                    depth,
                    NodeKind::Callable {
                        signature: signature.display(),
                        expanded,
                    },
                );
                if expanded {
                    node.children
                        .push(ViewNode::leaf(None, path, depth + 1, NodeKind::Source(source)));
                }
                node
            }
            Shape::Sequence(array) => self.sequence(label, &array, path, depth),
            Shape::Keyed(object) => self.keyed(label, &object, path, depth),
        }
    }

    fn scalar(&self, kind: ScalarKind, text: &str) -> NodeKind {
        if kind != ScalarKind::String {
            return NodeKind::Scalar {
                kind,
                text: text.to_string(),
                full_text: None,
            };
        }

        if text.chars().count() > self.options.truncate_at {
            let head: String = text.chars().take(self.options.truncate_at).collect();
            NodeKind::Scalar {
                kind,
                text: format!("\"{}...\"", head),
                full_text: Some(text.to_string()),
            }
        } else {
            NodeKind::Scalar {
                kind,
                text: format!("\"{}\"", text),
                full_text: None,
            }
        }
    }

    fn sequence(&self, label: Option<String>, array: &ArrayRef, path: ExpansionPath, depth: usize) -> ViewNode {
        let items = array.items();
        if items.is_empty() {
            return ViewNode::leaf(label, path, depth, NodeKind::Empty("[]"));
        }

        let expanded = self.is_expanded(&path, depth);
        let mut node = ViewNode::leaf(
            label,
            path.clone(),
            depth,
            NodeKind::Composite {
                summary: format!("Sequence({})", items.len()),
                expanded,
            },
        );
        if expanded {
            node.children = items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    self.node(Some(format!("[{}]", index)), item, path.child(index.to_string()), depth + 1)
                })
                .collect();
        }
        node
    }

    fn keyed(&self, label: Option<String>, object: &ObjectRef, path: ExpansionPath, depth: usize) -> ViewNode {
        if object.is_empty() {
            return ViewNode::leaf(label, path, depth, NodeKind::Empty("{}"));
        }

        let summary = match object.constructor_name() {
            Some(name) if name != "Object" => format!("{} {{}}", name),
            _ => "{}".to_string(),
        };
        let expanded = self.is_expanded(&path, depth);
        let mut node = ViewNode::leaf(
            label,
            path.clone(),
            depth,
            NodeKind::Composite { summary, expanded },
        );
        if !expanded {
            return node;
        }

        for key in member_keys(object) {
            let member_path = path.child(key.clone());
            let child = match object.get(&key) {
                Ok(member) => self.node(Some(key), &member, member_path, depth + 1),
                Err(message) => ViewNode::leaf(
                    Some(key),
                    member_path,
                    depth + 1,
                    NodeKind::Error {
                        kind: FailureKind::AccessDenied,
                        message,
                    },
                ),
            };
            node.children.push(child);
        }
        node
    }
}

/// Own keys across the whole prototype chain, de-duplicated, without
/// implementation artifacts, numeric-looking keys first.
pub(crate) fn member_keys(object: &ObjectRef) -> Vec<String> {
    let mut seen_objects = HashSet::new();
    let mut seen_keys = HashSet::new();
    let mut keys = Vec::new();

    let mut current = Some(object.clone());
    while let Some(layer) = current {
        if !seen_objects.insert(layer.id()) {
            break;
        }
        for key in layer.own_keys() {
            if key.starts_with("__") || ARTIFACT_KEYS.contains(&key.as_str()) {
                continue;
            }
            if seen_keys.insert(key.clone()) {
                keys.push(key);
            }
        }
        current = layer.prototype();
    }

    sort_keys(&mut keys);
    keys
}

pub(crate) fn sort_keys(keys: &mut [String]) {
    keys.sort_by(|a, b| {
        is_numeric_key(b)
            .cmp(&is_numeric_key(a))
            .then_with(|| a.cmp(b))
    });
}

/// Whether the host coerces `key` to a number rather than NaN.
///
/// Blank keys count as numeric (they coerce to 0). Only the exact spelling
/// `Infinity` names infinity; `inf`, `nan` and friends are ordinary keys.
fn is_numeric_key(key: &str) -> bool {
    let key = key.trim();
    if key.is_empty() {
        return true;
    }

    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = key.strip_prefix(prefix) {
            return !digits.is_empty() && digits.chars().all(|c| c.is_digit(radix));
        }
    }

    let unsigned = key.strip_prefix(['+', '-']).unwrap_or(key);
    if unsigned == "Infinity" {
        return true;
    }
    unsigned.starts_with(|c: char| c.is_ascii_digit() || c == '.') && key.parse::<f64>().is_ok()
}
