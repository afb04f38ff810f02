//! Explicit runtime type tags.
//!
//! Optics, operations and schema lookups are keyed by a [`TypeTag`]: an
//! interned type name built once at startup. Two tags denote the same
//! runtime type iff their names are equal.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Name of a runtime type.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeTag(Cow<'static, str>);

impl TypeTag {
    /// Top type: every tag is assignable to it.
    pub const ANY: TypeTag = TypeTag::from_static("Any");
    /// Bottom type, used by operations whose output fits any slot (e.g. `null`).
    pub const NOTHING: TypeTag = TypeTag::from_static("Nothing");
    /// `Boolean`
    pub const BOOLEAN: TypeTag = TypeTag::from_static("Boolean");
    /// `Byte`
    pub const BYTE: TypeTag = TypeTag::from_static("Byte");
    /// `Short`
    pub const SHORT: TypeTag = TypeTag::from_static("Short");
    /// `Integer`
    pub const INTEGER: TypeTag = TypeTag::from_static("Integer");
    /// `Long`
    pub const LONG: TypeTag = TypeTag::from_static("Long");
    /// `Float`
    pub const FLOAT: TypeTag = TypeTag::from_static("Float");
    /// `Double`
    pub const DOUBLE: TypeTag = TypeTag::from_static("Double");
    /// `String`
    pub const STRING: TypeTag = TypeTag::from_static("String");
    /// `Char`
    pub const CHAR: TypeTag = TypeTag::from_static("Char");
    /// `ByteArray`
    pub const BYTE_ARRAY: TypeTag = TypeTag::from_static("ByteArray");
    /// `Instant`
    pub const INSTANT: TypeTag = TypeTag::from_static("Instant");
    /// `Duration`
    pub const DURATION: TypeTag = TypeTag::from_static("Duration");

    /// Create a tag from a static name
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Create a tag from any name
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Tag of a list whose items carry `item`
    #[must_use]
    pub fn list_of(item: &TypeTag) -> Self {
        Self::new(format!("List<{}>", item))
    }

    /// Tag of an array whose items carry `item`
    #[must_use]
    pub fn array_of(item: &TypeTag) -> Self {
        Self::new(format!("Array<{}>", item))
    }

    /// Tag of a map whose values carry `value`
    #[must_use]
    pub fn map_of(key: &TypeTag, value: &TypeTag) -> Self {
        Self::new(format!("Map<{}, {}>", key, value))
    }

    /// The tag's name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Whether a value tagged `other` may be used where `self` is expected.
    #[must_use]
    pub fn is_assignable_from(&self, other: &TypeTag) -> bool {
        self == other || *self == Self::ANY || *other == Self::NOTHING
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag({})", self.0)
    }
}

impl From<&str> for TypeTag {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeTag {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}
