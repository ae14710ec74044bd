//! Span attribute values.
//!
//! `Value` mirrors the scalar shapes spec.md §3 names for span attributes
//! (`string`/`number`/`boolean`), plus a `String` arm that is how
//! [`crate::serialize::serialize`] smuggles any non-scalar, serializer-produced
//! value through the same attribute map. Arrays are supported because the
//! teacher's attribute model supports them and nothing in spec.md forbids
//! storing a homogeneous array directly without going through the serializer.
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// A namespaced attribute key. Always a `'static` or ref-counted string; see
/// `crate::keys` for the fixed `judgment.*` constants.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(KeyRepr);

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum KeyRepr {
    Static(&'static str),
    Owned(Arc<str>),
}

impl Key {
    pub fn new(value: impl Into<Key>) -> Self {
        value.into()
    }

    pub fn as_str(&self) -> &str {
        match &self.0 {
            KeyRepr::Static(s) => s,
            KeyRepr::Owned(s) => s,
        }
    }
}

impl From<&'static str> for Key {
    fn from(s: &'static str) -> Self {
        Key(KeyRepr::Static(s))
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key(KeyRepr::Owned(Arc::from(s)))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scalar or serializer-produced attribute value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    I64(i64),
    F64(f64),
    String(Arc<str>),
    Array(Vec<Value>),
}

impl Value {
    /// The value's JSON-ish rendering, used only for exported attributes
    /// that don't have a native OTLP scalar slot (arrays).
    pub fn as_str(&self) -> Cow<'_, str> {
        match self {
            Value::String(s) => Cow::Borrowed(s),
            other => Cow::Owned(other.to_string()),
        }
    }

    /// Converts to `serde_json::Value`, for exporters and `observe`'s
    /// input-attribute formatting that speak JSON.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::I64(i) => serde_json::Value::from(*i),
            Value::F64(f) => serde_json::json!(f),
            Value::String(s) => serde_json::Value::String(s.to_string()),
            Value::Array(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => v.fmt(f),
            Value::I64(v) => v.fmt(f),
            Value::F64(v) => v.fmt(f),
            Value::String(v) => f.write_str(v),
            Value::Array(v) => {
                write!(f, "[")?;
                for (i, item) in v.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

macro_rules! from_scalar {
    ($($t:ty => $variant:path),+ $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    $variant(v.into())
                }
            }
        )+
    };
}

from_scalar!(
    bool => Value::Bool,
    i64 => Value::I64,
    f64 => Value::F64,
);

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

/// A `(key, value)` attribute pair, as attached to a span, event, or resource.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyValue {
    pub key: Key,
    pub value: Value,
}

impl KeyValue {
    pub fn new<K: Into<Key>, V: Into<Value>>(key: K, value: V) -> Self {
        KeyValue {
            key: key.into(),
            value: value.into(),
        }
    }
}
