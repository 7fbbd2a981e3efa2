//! Classification of host values into the closed set of shapes the renderer understands

use super::signature::Signature;
use super::value::{ArrayRef, ObjectRef, Value};
use thiserror::Error;

/// Inspecting a value raised instead of producing something renderable
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RenderFailure {
    pub message: String,
}

impl RenderFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Number,
    Boolean,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scalar {
    pub kind: ScalarKind,
    /// Unquoted, untruncated text form
    pub text: String,
}

/// Everything the renderer dispatches on
#[derive(Debug, Clone)]
pub enum Shape {
    Null,
    Absent,
    Scalar(Scalar),
    Callable { signature: Signature, source: String },
    Sequence(ArrayRef),
    Keyed(ObjectRef),
}

/// Map a raw host value onto a [`Shape`]
pub fn classify(value: &Value) -> Result<Shape, RenderFailure> {
    let shape = match value {
        Value::Null => Shape::Null,
        Value::Undefined => Shape::Absent,
        Value::Bool(b) => Shape::Scalar(Scalar {
            kind: ScalarKind::Boolean,
            text: b.to_string(),
        }),
        Value::Number(n) => Shape::Scalar(Scalar {
            kind: ScalarKind::Number,
            text: format_number(*n),
        }),
        Value::String(s) => Shape::Scalar(Scalar {
            kind: ScalarKind::String,
            text: s.clone(),
        }),
        Value::Function(function) => Shape::Callable {
            signature: Signature::extract(function),
            source: function.source.clone(),
        },
        Value::Array(array) => Shape::Sequence(array.clone()),
        Value::Object(object) => Shape::Keyed(object.clone()),
        Value::Inaccessible(reason) => return Err(RenderFailure::new(reason.clone())),
    };
    Ok(shape)
}

/// Number text as the host prints it: integral values without a fraction
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        // covers -0, which the host prints as 0
        "0".to_string()
    } else if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}
