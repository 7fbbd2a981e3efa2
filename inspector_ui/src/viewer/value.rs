//! Host value model
//!
//! Values captured from the host are dynamic: they can be scalars, callables,
//! sequences or keyed containers, and containers may reference themselves.
//! Objects and arrays are shared handles so cyclic graphs can be built the
//! same way the host builds them.

use parking_lot::RwLock;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Property read that may fail, like a throwing getter on the host side
pub type AccessorFn = dyn Fn() -> Result<Value, String> + Send + Sync;

/// A runtime value observed in the host
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    /// The host's absence marker
    Undefined,
    Bool(bool),
    Number(f64),
    String(String),
    Function(Arc<FunctionValue>),
    Array(ArrayRef),
    Object(ObjectRef),
    /// A value that refuses inspection altogether (e.g. a revoked proxy)
    Inaccessible(String),
}

/// Callable captured from the host: its declared name and textual form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionValue {
    pub name: Option<String>,
    pub source: String,
}

/// A single own property slot
#[derive(Clone)]
pub enum Property {
    Data(Value),
    Accessor(Arc<AccessorFn>),
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Property::Data(value) => f.debug_tuple("Data").field(value).finish(),
            Property::Accessor(_) => f.write_str("Accessor(..)"),
        }
    }
}

#[derive(Default)]
struct ObjectData {
    constructor: Option<String>,
    prototype: Option<ObjectRef>,
    properties: Vec<(String, Property)>,
}

/// Shared handle to a keyed container
#[derive(Clone, Default)]
pub struct ObjectRef(Arc<RwLock<ObjectData>>);

/// Shared handle to an ordered sequence
#[derive(Clone, Default)]
pub struct ArrayRef(Arc<RwLock<Vec<Value>>>);

impl ObjectRef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an object whose constructor reports the given name
    pub fn with_constructor(name: impl Into<String>) -> Self {
        let object = Self::new();
        object.0.write().constructor = Some(name.into());
        object
    }

    /// Set an own data property, replacing any previous slot with the same key
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.put(key.into(), Property::Data(value));
    }

    /// Define an own property whose read runs `read`
    pub fn define_accessor<F>(&self, key: impl Into<String>, read: F)
    where
        F: Fn() -> Result<Value, String> + Send + Sync + 'static,
    {
        self.put(key.into(), Property::Accessor(Arc::new(read)));
    }

    fn put(&self, key: String, property: Property) {
        let mut data = self.0.write();
        match data.properties.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = property,
            None => data.properties.push((key, property)),
        }
    }

    pub fn set_prototype(&self, prototype: Option<ObjectRef>) {
        self.0.write().prototype = prototype;
    }

    pub fn prototype(&self) -> Option<ObjectRef> {
        self.0.read().prototype.clone()
    }

    pub fn constructor_name(&self) -> Option<String> {
        self.0.read().constructor.clone()
    }

    /// Own keys in definition order
    pub fn own_keys(&self) -> Vec<String> {
        self.0.read().properties.iter().map(|(key, _)| key.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().properties.is_empty()
    }

    fn own_property(&self, key: &str) -> Option<Property> {
        self.0
            .read()
            .properties
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, property)| property.clone())
    }

    /// Read a property, walking the prototype chain.
    ///
    /// Missing keys read as `Undefined`. Accessors run outside the lock so
    /// they may freely read the object they belong to.
    pub fn get(&self, key: &str) -> Result<Value, String> {
        let mut seen = HashSet::new();
        let mut current = Some(self.clone());
        while let Some(object) = current {
            if !seen.insert(object.id()) {
                break;
            }
            match object.own_property(key) {
                Some(Property::Data(value)) => return Ok(value),
                Some(Property::Accessor(read)) => return read(),
                None => current = object.prototype(),
            }
        }
        Ok(Value::Undefined)
    }

    /// Identity of the underlying allocation
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never recurse: the graph may be cyclic
        let data = self.0.read();
        write!(
            f,
            "ObjectRef({:#x}, {} keys)",
            self.id(),
            data.properties.len()
        )
    }
}

impl ArrayRef {
    pub fn new(items: Vec<Value>) -> Self {
        Self(Arc::new(RwLock::new(items)))
    }

    pub fn push(&self, value: Value) {
        self.0.write().push(value);
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.read().get(index).cloned()
    }

    /// Copy of the current elements
    pub fn items(&self) -> Vec<Value> {
        self.0.read().clone()
    }

    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl fmt::Debug for ArrayRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArrayRef({:#x}, len {})", self.id(), self.len())
    }
}

impl Value {
    /// Build a plain object from key/value pairs
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let object = ObjectRef::new();
        for (key, value) in entries {
            object.set(key, value);
        }
        Value::Object(object)
    }

    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(ArrayRef::new(items.into_iter().collect()))
    }

    pub fn function(name: Option<&str>, source: impl Into<String>) -> Self {
        Value::Function(Arc::new(FunctionValue {
            name: name.map(str::to_string),
            source: source.into(),
        }))
    }

    /// Host type name, as the host's `typeof` would report it
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null | Value::Array(_) | Value::Object(_) | Value::Inaccessible(_) => "object",
            Value::Undefined => "undefined",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) => "function",
        }
    }

    /// Convert to JSON for export.
    ///
    /// A container that is already being converted higher up the current
    /// branch becomes `"[Circular]"`; shared but acyclic references are
    /// written out in full.
    pub fn to_json(&self) -> serde_json::Value {
        let mut ancestors = Vec::new();
        self.to_json_inner(&mut ancestors)
    }

    fn to_json_inner(&self, ancestors: &mut Vec<usize>) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Value::Null | Value::Undefined => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 => {
                Json::Number((*n as i64).into())
            }
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::String(s) => Json::String(s.clone()),
            Value::Function(function) => {
                Json::String(super::signature::Signature::extract(function).display())
            }
            Value::Inaccessible(reason) => Json::String(format!("[Error: {}]", reason)),
            Value::Array(array) => {
                if ancestors.contains(&array.id()) {
                    return Json::String("[Circular]".to_string());
                }
                ancestors.push(array.id());
                let items = array
                    .items()
                    .iter()
                    .map(|item| item.to_json_inner(ancestors))
                    .collect();
                ancestors.pop();
                Json::Array(items)
            }
            Value::Object(object) => {
                if ancestors.contains(&object.id()) {
                    return Json::String("[Circular]".to_string());
                }
                ancestors.push(object.id());
                let mut map = serde_json::Map::new();
                for key in object.own_keys() {
                    let entry = match object.own_property(&key) {
                        Some(Property::Data(value)) => value.to_json_inner(ancestors),
                        Some(Property::Accessor(read)) => match read() {
                            Ok(value) => value.to_json_inner(ancestors),
                            Err(message) => Json::String(format!("[Access denied: {}]", message)),
                        },
                        None => continue,
                    };
                    map.insert(key, entry);
                }
                ancestors.pop();
                Json::Object(map)
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::array(items.into_iter().map(Value::from)),
            Json::Object(map) => Value::object(map.into_iter().map(|(k, v)| (k, Value::from(v)))),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<ObjectRef> for Value {
    fn from(object: ObjectRef) -> Self {
        Value::Object(object)
    }
}
