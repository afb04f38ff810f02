//! Field types.

use custodian_core::TypeTag;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed union of the shapes a descriptor field can take
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// `bool`
    Boolean,
    /// 8-bit integer
    Byte,
    /// 16-bit integer
    Short,
    /// 32-bit integer
    Integer,
    /// 64-bit integer
    Long,
    /// 32-bit float
    Float,
    /// 64-bit float
    Double,
    /// UTF-8 string
    String,
    /// Single character
    Char,
    /// Raw bytes
    ByteArray,
    /// Point in time
    Instant,
    /// Span of time
    Duration,
    /// Named enum with its constants
    Enum { name: String, values: Vec<String> },
    /// Fixed-shape sequence
    Array(Box<FieldType>),
    /// Growable sequence
    List(Box<FieldType>),
    /// Inline sibling descriptor, by name
    Nested(String),
    /// Descriptor defined elsewhere in the set, by name
    Reference(String),
    /// Optional value
    Nullable(Box<FieldType>),
    /// Unmodeled external type, resolved by name only
    Opaque(String),
    /// Positional product of field types
    Tuple(Vec<FieldType>),
}

impl FieldType {
    /// `Enum(name, values)`
    #[must_use]
    pub fn enumeration<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enum {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// `Array(item)`
    #[must_use]
    pub fn array(item: FieldType) -> Self {
        Self::Array(Box::new(item))
    }

    /// `List(item)`
    #[must_use]
    pub fn list(item: FieldType) -> Self {
        Self::List(Box::new(item))
    }

    /// `Nullable(item)`
    #[must_use]
    pub fn nullable(item: FieldType) -> Self {
        Self::Nullable(Box::new(item))
    }

    /// `Nested(name)`
    #[must_use]
    pub fn nested(name: impl Into<String>) -> Self {
        Self::Nested(name.into())
    }

    /// `Reference(name)`
    #[must_use]
    pub fn reference(name: impl Into<String>) -> Self {
        Self::Reference(name.into())
    }

    /// `Opaque(name)`
    #[must_use]
    pub fn opaque(name: impl Into<String>) -> Self {
        Self::Opaque(name.into())
    }

    /// Runtime tag of a primitive, enum or opaque field; `None` for
    /// containers, entity references and tuples.
    #[must_use]
    pub fn leaf_tag(&self) -> Option<TypeTag> {
        match self {
            Self::Boolean => Some(TypeTag::BOOLEAN),
            Self::Byte => Some(TypeTag::BYTE),
            Self::Short => Some(TypeTag::SHORT),
            Self::Integer => Some(TypeTag::INTEGER),
            Self::Long => Some(TypeTag::LONG),
            Self::Float => Some(TypeTag::FLOAT),
            Self::Double => Some(TypeTag::DOUBLE),
            Self::String => Some(TypeTag::STRING),
            Self::Char => Some(TypeTag::CHAR),
            Self::ByteArray => Some(TypeTag::BYTE_ARRAY),
            Self::Instant => Some(TypeTag::INSTANT),
            Self::Duration => Some(TypeTag::DURATION),
            Self::Enum { name, .. } | Self::Opaque(name) => Some(TypeTag::new(name.clone())),
            Self::Array(_)
            | Self::List(_)
            | Self::Nested(_)
            | Self::Reference(_)
            | Self::Nullable(_)
            | Self::Tuple(_) => None,
        }
    }

    /// Item type of a list or array
    #[must_use]
    pub fn item(&self) -> Option<&FieldType> {
        match self {
            Self::Array(item) | Self::List(item) => Some(item),
            _ => None,
        }
    }

    /// Strip every `Array`, `List` and `Nullable` layer.
    #[must_use]
    pub fn innermost(&self) -> &FieldType {
        match self {
            Self::Array(item) | Self::List(item) | Self::Nullable(item) => item.innermost(),
            other => other,
        }
    }

    /// Descriptor name this field points at, looking through containers
    #[must_use]
    pub fn entity_name(&self) -> Option<&str> {
        match self.innermost() {
            Self::Nested(name) | Self::Reference(name) => Some(name),
            _ => None,
        }
    }

    /// Whether this is one of the primitive leaf types
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Self::Boolean
                | Self::Byte
                | Self::Short
                | Self::Integer
                | Self::Long
                | Self::Float
                | Self::Double
                | Self::String
                | Self::Char
                | Self::ByteArray
                | Self::Instant
                | Self::Duration
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean => write!(f, "Boolean"),
            Self::Byte => write!(f, "Byte"),
            Self::Short => write!(f, "Short"),
            Self::Integer => write!(f, "Integer"),
            Self::Long => write!(f, "Long"),
            Self::Float => write!(f, "Float"),
            Self::Double => write!(f, "Double"),
            Self::String => write!(f, "String"),
            Self::Char => write!(f, "Char"),
            Self::ByteArray => write!(f, "ByteArray"),
            Self::Instant => write!(f, "Instant"),
            Self::Duration => write!(f, "Duration"),
            Self::Enum { name, .. } => write!(f, "Enum({})", name),
            Self::Array(item) => write!(f, "Array({})", item),
            Self::List(item) => write!(f, "List({})", item),
            Self::Nested(name) => write!(f, "Nested({})", name),
            Self::Reference(name) => write!(f, "Reference({})", name),
            Self::Nullable(item) => write!(f, "Nullable({})", item),
            Self::Opaque(name) => write!(f, "Opaque({})", name),
            Self::Tuple(items) => {
                write!(f, "Tuple(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}
