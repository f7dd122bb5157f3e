//! Document representation
//!
//! A Document is a single markdown file with YAML frontmatter.
//! The frontmatter contains structured data (fields), and the body
//! contains the markdown content.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A document in the store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier (derived from filename, without .md extension).
    /// Empty until the store assigns one.
    pub id: String,

    /// YAML frontmatter fields
    pub fields: Fields,

    /// Markdown body content
    pub body: String,
}

/// Field values that can be stored in frontmatter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Order two values of the same kind. Numbers compare across Int/Float;
    /// values of different kinds are incomparable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        }
    }

    /// Equality that treats `1` and `1.0` as the same number
    pub fn loosely_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                self.compare(other) == Some(Ordering::Equal)
            }
            _ => self == other,
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

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

/// A map of field names to values, kept sorted so rendered files diff cleanly
pub type Fields = BTreeMap<String, Value>;

impl Document {
    /// Create a new document with the given ID
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Fields::new(),
            body: String::new(),
        }
    }

    /// Create a document whose id will be assigned on insert
    pub fn draft() -> Self {
        Self::new("")
    }

    /// Set a field value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Get a field value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Set the body content
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Resolve a dotted field path such as `sizes.name`.
    ///
    /// Arrays met along the way are traversed element-wise, and an array at the
    /// end of the path contributes its elements, so `sizes.name` yields every
    /// size name. `id` resolves to the document id.
    pub fn resolve_path(&self, path: &str) -> Vec<&Value> {
        let mut segments = path.split('.');
        let Some(first) = segments.next() else {
            return Vec::new();
        };

        let mut current: Vec<&Value> = match self.fields.get(first) {
            Some(value) => vec![value],
            None => return Vec::new(),
        };

        for segment in segments {
            let mut next = Vec::new();
            for value in current {
                match value {
                    Value::Object(map) => next.extend(map.get(segment)),
                    Value::Array(items) => {
                        for item in items {
                            if let Value::Object(map) = item {
                                next.extend(map.get(segment));
                            }
                        }
                    }
                    _ => {}
                }
            }
            current = next;
        }

        current
            .into_iter()
            .flat_map(|value| match value {
                Value::Array(items) => items.iter().collect::<Vec<_>>(),
                other => vec![other],
            })
            .collect()
    }

    /// Parse a document from markdown content
    pub fn parse(id: impl Into<String>, content: &str) -> crate::Result<Self> {
        let (fields, body) = super::frontmatter::parse(content)?;

        Ok(Self {
            id: id.into(),
            fields,
            body,
        })
    }

    /// Render document back to markdown
    pub fn render(&self) -> crate::Result<String> {
        super::frontmatter::render(&self.fields, &self.body)
    }
}
