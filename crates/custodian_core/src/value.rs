//! Dynamic entity model.
//!
//! Governed entities cross the runtime as [`Value`]s. A record keeps its
//! schema name and an ordered field map; updates are persistent, so a
//! transform always yields a fresh value and never mutates its input.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::time::Duration;

/// Runtime representation of an entity or one of its fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Absent value of a nullable field
    Null,
    /// Boolean
    Bool(bool),
    /// 8-bit integer
    Byte(i8),
    /// 16-bit integer
    Short(i16),
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    Long(i64),
    /// 32-bit float
    Float(f32),
    /// 64-bit float
    Double(f64),
    /// Single character
    Char(char),
    /// UTF-8 string
    String(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Point in time
    Instant(DateTime<Utc>),
    /// Span of time
    Duration(Duration),
    /// Enum constant, by name
    Enum(String),
    /// List or array elements
    List(Vec<Value>),
    /// Positional tuple
    Tuple(Vec<Value>),
    /// Nested entity
    Record(Record),
    /// Unmodeled external value, carried by type name
    Opaque(String, serde_json::Value),
}

impl Value {
    /// Short name of the variant, for diagnostics
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Bool(_) => "Boolean",
            Self::Byte(_) => "Byte",
            Self::Short(_) => "Short",
            Self::Int(_) => "Integer",
            Self::Long(_) => "Long",
            Self::Float(_) => "Float",
            Self::Double(_) => "Double",
            Self::Char(_) => "Char",
            Self::String(_) => "String",
            Self::Bytes(_) => "ByteArray",
            Self::Instant(_) => "Instant",
            Self::Duration(_) => "Duration",
            Self::Enum(_) => "Enum",
            Self::List(_) => "List",
            Self::Tuple(_) => "Tuple",
            Self::Record(_) => "Record",
            Self::Opaque(..) => "Opaque",
        }
    }

    /// Whether the value is [`Value::Null`]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow as a string slice
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow as a record
    #[must_use]
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Borrow as list elements
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Read a 64-bit view of any integral variant
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Byte(v) => Some(i64::from(*v)),
            Self::Short(v) => Some(i64::from(*v)),
            Self::Int(v) => Some(i64::from(*v)),
            Self::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Field of a record value; `None` for non-records and missing fields
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.as_record().and_then(|r| r.get(name))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Self::Record(v)
    }
}

impl<V: Into<Value>> From<Vec<V>> for Value {
    fn from(items: Vec<V>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<V: Into<Value>> From<Option<V>> for Value {
    fn from(v: Option<V>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// An entity instance: schema name plus ordered fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    type_name: String,
    fields: IndexMap<String, Value>,
}

impl Record {
    /// Create an empty record of the named type
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: IndexMap::new(),
        }
    }

    /// Builder-style field assignment
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Copy of this record with one field replaced
    #[must_use]
    pub fn with_field(&self, name: &str, value: Value) -> Self {
        let mut next = self.clone();
        next.fields.insert(name.to_string(), value);
        next
    }

    /// Copy of this record re-labelled as another type
    #[must_use]
    pub fn retyped(&self, type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: self.fields.clone(),
        }
    }

    /// Schema name of the record
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Field value by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
