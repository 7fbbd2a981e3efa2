//! Viewer handle: the value being inspected plus the current render generation

use super::classify::RenderFailure;
use super::path::{ExpandedPaths, ExpansionPath};
use super::render::{render, RenderOptions, ViewTree};
use super::value::Value;

/// Budget added to `max_depth` each time the user drills into a placeholder
pub const DEFAULT_DRILL_STEP: usize = 3;

/// An immutable view of one value.
///
/// `toggle` and `drill` never modify `self`; they return the next generation,
/// which the caller swaps in for display.
#[derive(Debug, Clone)]
pub struct Viewer {
    root: Value,
    base: ExpansionPath,
    options: RenderOptions,
    expanded: ExpandedPaths,
    drill_step: usize,
    tree: ViewTree,
}

impl Viewer {
    pub fn new(root: Value, options: RenderOptions) -> Self {
        Self::build(root, ExpansionPath::root(), options, ExpandedPaths::new(), DEFAULT_DRILL_STEP)
    }

    pub fn with_drill_step(mut self, drill_step: usize) -> Self {
        self.drill_step = drill_step;
        self
    }

    pub fn with_expanded(self, expanded: ExpandedPaths) -> Self {
        Self::build(self.root, self.base, self.options, expanded, self.drill_step)
    }

    fn build(
        root: Value,
        base: ExpansionPath,
        options: RenderOptions,
        expanded: ExpandedPaths,
        drill_step: usize,
    ) -> Self {
        let tree = render(&root, &base, &options, &expanded);
        Self {
            root,
            base,
            options,
            expanded,
            drill_step,
            tree,
        }
    }

    pub fn tree(&self) -> &ViewTree {
        &self.tree
    }

    pub fn expanded(&self) -> &ExpandedPaths {
        &self.expanded
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Path of the render root; non-empty after drilling
    pub fn base(&self) -> &ExpansionPath {
        &self.base
    }

    /// Next generation with `path` flipped between expanded and collapsed
    pub fn toggle(&self, path: &ExpansionPath) -> Viewer {
        Self::build(
            self.root.clone(),
            self.base.clone(),
            self.options,
            self.expanded.toggled(path),
            self.drill_step,
        )
    }

    /// Re-root the view at the placeholder found at `path`.
    ///
    /// The new view keeps absolute paths, marks `path` expanded and grows the
    /// depth budget by the drill step. Returns `None` when `path` is not a
    /// placeholder in the current tree.
    pub fn drill(&self, path: &ExpansionPath) -> Option<Viewer> {
        let node = self.tree.root.find(path)?;
        if !node.kind.is_placeholder() {
            return None;
        }

        let target = self
            .resolve(path)
            .unwrap_or_else(|failure| Value::Inaccessible(failure.message));
        let options = RenderOptions {
            max_depth: self.options.max_depth + self.drill_step,
            ..self.options
        };
        Some(Self::build(
            target,
            path.clone(),
            options,
            self.expanded.with(path),
            self.drill_step,
        ))
    }

    /// Read the value at an absolute `path` below this view's base
    pub fn resolve(&self, path: &ExpansionPath) -> Result<Value, RenderFailure> {
        let segments = path
            .strip_prefix(&self.base)
            .ok_or_else(|| RenderFailure::new(format!("path {} is outside this view", path)))?;

        let mut current = self.root.clone();
        for segment in segments {
            current = match &current {
                Value::Array(array) => segment
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| array.get(index))
                    .unwrap_or(Value::Undefined),
                Value::Object(object) => object.get(segment).map_err(RenderFailure::new)?,
                _ => Value::Undefined,
            };
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::ObjectRef;

    fn nested() -> Value {
        Value::object([(
            "a",
            Value::object([("b", Value::object([("c", Value::object([("d", Value::from(1i64))]))]))]),
        )])
    }

    #[test]
    fn test_toggle_leaves_previous_generation_untouched() {
        let viewer = Viewer::new(nested(), RenderOptions::default());
        let path = ExpansionPath::parse("a");
        let next = viewer.toggle(&path);

        assert!(viewer.tree().root.find(&path).map_or(false, |n| n.children.is_empty()));
        assert!(!next.tree().root.find(&path).map_or(true, |n| n.children.is_empty()));
        assert!(!viewer.expanded().contains(&path));
    }

    #[test]
    fn test_drill_extends_budget_and_keeps_paths_absolute() {
        let options = RenderOptions { max_depth: 1, ..Default::default() };
        let viewer = Viewer::new(nested(), options).with_expanded(["a"].into_iter().collect());
        let placeholder = ExpansionPath::parse("a.b");
        assert!(viewer.tree().root.find(&placeholder).unwrap().kind.is_placeholder());

        let drilled = viewer.drill(&placeholder).expect("placeholder can be drilled");
        assert_eq!(drilled.options().max_depth, 4);
        assert_eq!(drilled.base(), &placeholder);
        assert!(drilled.expanded().contains(&placeholder));
        assert_eq!(drilled.tree().root.path, placeholder);
        assert_eq!(drilled.tree().root.children[0].path.key(), "a.b.c");
    }

    #[test]
    fn test_drill_rejects_non_placeholder() {
        let viewer = Viewer::new(nested(), RenderOptions::default());
        assert!(viewer.drill(&ExpansionPath::parse("a")).is_none());
        assert!(viewer.drill(&ExpansionPath::parse("missing")).is_none());
    }

    #[test]
    fn test_resolve_through_failing_accessor() {
        let object = ObjectRef::new();
        object.define_accessor("locked", || Err("denied".into()));
        let viewer = Viewer::new(Value::Object(object), RenderOptions::default());
        let failure = viewer.resolve(&ExpansionPath::parse("locked")).unwrap_err();
        assert_eq!(failure.message, "denied");
    }
}
