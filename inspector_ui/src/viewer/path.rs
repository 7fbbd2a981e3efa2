//! Expansion paths and the immutable set of expanded paths

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Property-name segments from the render root to a node
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ExpansionPath(Vec<String>);

impl ExpansionPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse the dotted form; the empty string is the root
    pub fn parse(dotted: &str) -> Self {
        if dotted.is_empty() {
            return Self::root();
        }
        Self(dotted.split('.').map(str::to_string).collect())
    }

    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Segments after `base`, or `None` if this path is not under `base`
    pub fn strip_prefix(&self, base: &ExpansionPath) -> Option<&[String]> {
        self.0.strip_prefix(base.0.as_slice())
    }

    /// Dotted key used in [`ExpandedPaths`]
    pub fn key(&self) -> String {
        self.0.join(".")
    }
}

impl fmt::Display for ExpansionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Set of expanded path keys.
///
/// Never mutated in place: every change returns a new set, so a view rendered
/// from an older generation stays valid until the caller swaps it out.
#[derive(Debug, Clone, Default)]
pub struct ExpandedPaths(Arc<HashSet<String>>);

impl ExpandedPaths {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, path: &ExpansionPath) -> bool {
        self.0.contains(&path.key())
    }

    pub fn with(&self, path: &ExpansionPath) -> Self {
        let mut next = (*self.0).clone();
        next.insert(path.key());
        Self(Arc::new(next))
    }

    pub fn without(&self, path: &ExpansionPath) -> Self {
        let mut next = (*self.0).clone();
        next.remove(&path.key());
        Self(Arc::new(next))
    }

    pub fn toggled(&self, path: &ExpansionPath) -> Self {
        if self.contains(path) {
            self.without(path)
        } else {
            self.with(path)
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_superset(&self, other: &ExpandedPaths) -> bool {
        self.0.is_superset(&other.0)
    }
}

impl PartialEq for ExpandedPaths {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<S: Into<String>> FromIterator<S> for ExpandedPaths {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(Arc::new(iter.into_iter().map(Into::into).collect()))
    }
}
