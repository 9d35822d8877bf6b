// Copyright (c) 2018-2022 The Botho Foundation

//! An in-memory, order-preserving handshake response.
//!
//! [Document] is what the rest of the workspace uses when a response does not
//! come straight off the wire: responses captured as JSON, and test fixtures.

use crate::response::{FieldShapeError, HandshakeResponse};
use serde::{
    de::{self, MapAccess, SeqAccess, Visitor},
    Deserialize, Deserializer,
};
use std::fmt::{self, Display, Formatter};

/// A single field value of a handshake response.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Explicit null
    Null,
    /// Boolean
    Bool(bool),
    /// 32-bit integer
    Int32(i32),
    /// 64-bit integer
    Int64(i64),
    /// Double precision float
    Double(f64),
    /// UTF-8 string
    String(String),
    /// Array of values
    Array(Vec<Value>),
    /// Nested document
    Document(Document),
}

impl Value {
    /// The string, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean view using the data store's truthiness: numbers are true when
    /// non-zero (NaN is false). Other types have no boolean view.
    pub fn to_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(b) => Some(b),
            Value::Int32(i) => Some(i != 0),
            Value::Int64(i) => Some(i != 0),
            Value::Double(d) => Some(!(d.is_nan() || d == 0.0)),
            _ => None,
        }
    }

    /// 32-bit integer view. 64-bit integers must be in range; doubles are
    /// truncated toward zero and must be finite and in range.
    pub fn to_i32(&self) -> Option<i32> {
        match *self {
            Value::Int32(i) => Some(i),
            Value::Int64(i) => i32::try_from(i).ok(),
            Value::Double(d) if d.is_finite() => {
                let t = d.trunc();
                (t >= i32::MIN as f64 && t <= i32::MAX as f64).then_some(t as i32)
            }
            _ => None,
        }
    }

    /// Text form: strings verbatim, everything else as rendered by
    /// [Display].
    pub fn to_text(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int32(i) => write!(f, "{i}"),
            Value::Int64(i) => write!(f, "{i}"),
            Value::Double(d) => write!(f, "{d}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Document(doc) => write!(f, "{doc}"),
        }
    }
}

impl From<bool> for Value {
    fn from(src: bool) -> Self {
        Value::Bool(src)
    }
}

impl From<i32> for Value {
    fn from(src: i32) -> Self {
        Value::Int32(src)
    }
}

impl From<i64> for Value {
    fn from(src: i64) -> Self {
        Value::Int64(src)
    }
}

impl From<f64> for Value {
    fn from(src: f64) -> Self {
        Value::Double(src)
    }
}

impl From<&str> for Value {
    fn from(src: &str) -> Self {
        Value::String(src.to_owned())
    }
}

impl From<String> for Value {
    fn from(src: String) -> Self {
        Value::String(src)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(src: Vec<T>) -> Self {
        Value::Array(src.into_iter().map(Into::into).collect())
    }
}

impl From<Document> for Value {
    fn from(src: Document) -> Self {
        Value::Document(src)
    }
}

/// Ordered field list with unique names.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    fields: Vec<(String, Value)>,
}

impl Document {
    /// An empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field. Replacing an existing field keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Builder form of [Document::insert].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Look up a field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Remove a field, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let idx = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(idx).1)
    }

    /// Fields in order.
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when there are no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut doc = Document::new();
        for (name, value) in iter {
            doc.insert(name, value);
        }
        doc
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if self.fields.is_empty() {
            return f.write_str("{ }");
        }
        f.write_str("{ ")?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name:?} : {value}")?;
        }
        f.write_str(" }")
    }
}

impl HandshakeResponse for Document {
    fn has_field(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    fn get_bool(&self, name: &str, default: bool) -> bool {
        self.get(name).and_then(Value::to_bool).unwrap_or(default)
    }

    fn get_string(&self, name: &str) -> Option<String> {
        self.get(name).and_then(Value::as_str).map(str::to_owned)
    }

    fn get_int(&self, name: &str, default: i32) -> i32 {
        self.get(name).and_then(Value::to_i32).unwrap_or(default)
    }

    fn get_string_array(&self, name: &str) -> Vec<String> {
        match self.get(name) {
            Some(Value::Array(items)) => items.iter().map(Value::to_text).collect(),
            Some(other) => {
                tracing::debug!(field = name, value = %other, "expected an array, ignoring");
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    fn try_get_string_array(&self, name: &str) -> Result<Vec<String>, FieldShapeError> {
        match self.get(name) {
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(index, item)| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(FieldShapeError::NotAString {
                        index,
                        found: other.to_string(),
                    }),
                })
                .collect(),
            Some(other) => Err(FieldShapeError::NotAnArray {
                found: other.to_string(),
            }),
            None => Ok(Vec::new()),
        }
    }

    fn get_subdocument(&self, name: &str) -> Vec<(String, Value)> {
        match self.get(name) {
            Some(Value::Document(doc)) => doc.fields.clone(),
            _ => Vec::new(),
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str("a handshake response value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(match i32::try_from(v) {
            Ok(small) => Value::Int32(small),
            Err(_) => Value::Int64(v),
        })
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        match i64::try_from(v) {
            Ok(signed) => self.visit_i64(signed),
            Err(_) => Ok(Value::Double(v as f64)),
        }
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Double(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Value, A::Error> {
        DocumentVisitor.visit_map(map).map(Value::Document)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = Document;

    fn expecting(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str("a handshake response document")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Document, A::Error> {
        let mut doc = Document::new();
        while let Some((name, value)) = map.next_entry::<String, Value>()? {
            doc.insert(name, value);
        }
        Ok(doc)
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(DocumentVisitor)
    }
}
