//! Lazy, depth-bounded object viewer
//!
//! A host value is classified once into a closed [`Shape`] and rendered by a
//! pure function of `(value, base path, options, expanded paths)`. Cycles are
//! handled by the depth budget alone: anything deeper than `max_depth` becomes
//! a placeholder, so a render pass always terminates. Failures while reading
//! the value are rendered inline as error nodes and never reach the caller.

pub mod classify;
pub mod inspector;
pub mod node;
pub mod path;
pub mod preview;
pub mod render;
pub mod rows;
pub mod signature;
pub mod value;

pub use classify::{classify, RenderFailure, Scalar, ScalarKind, Shape};
pub use inspector::{Viewer, DEFAULT_DRILL_STEP};
pub use node::{FailureKind, NodeKind, ViewNode};
pub use path::{ExpandedPaths, ExpansionPath};
pub use preview::{preview, PREVIEW_LEN};
pub use render::{render, RenderOptions, ViewTree};
pub use rows::ViewRow;
pub use signature::{Signature, ANONYMOUS};
pub use value::{ArrayRef, FunctionValue, ObjectRef, Property, Value};
