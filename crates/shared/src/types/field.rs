//! Field value model for schema-driven master data records.
//!
//! Master-data entities (banks, accounts, currencies, exposures, ...) are
//! structurally uniform: a mapping of attribute name to scalar value. A single
//! value type keeps the lifecycle engine generic across entity schemas.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Mapping of attribute name to current value.
///
/// `BTreeMap` keeps key order deterministic for diff output and serialization.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// A single scalar attribute value.
///
/// Untagged on the wire: JSON booleans, numbers, ISO dates, and strings map
/// onto the matching variant. Variant order matters for deserialization -
/// dates must be tried before free text, and text before numbers so that a
/// numeric string stays text (`normalized_eq` still compares it by value).
/// Numbers serialize as JSON numbers so they round-trip through the API;
/// a decimal beyond f64 precision falls back to its string rendering.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean flag.
    Flag(bool),
    /// Calendar date (no time component).
    Date(NaiveDate),
    /// Free text.
    Text(String),
    /// Numeric value with decimal precision.
    Number(Decimal),
}

impl FieldValue {
    /// Returns the numeric interpretation of this value, if any.
    ///
    /// Text that parses as a decimal counts as numeric so that `"42"` and
    /// `42` compare equal by value rather than by representation.
    #[must_use]
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Number(d) => Some(*d),
            Self::Text(s) => Decimal::from_str(s.trim()).ok(),
            Self::Flag(_) | Self::Date(_) => None,
        }
    }

    /// Type-normalized equality.
    ///
    /// Structurally equal values are equal; otherwise two values are equal if
    /// both have a numeric interpretation and the decimals match.
    #[must_use]
    pub fn normalized_eq(&self, other: &Self) -> bool {
        if self == other {
            return true;
        }
        match (self.as_decimal(), other.as_decimal()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Flag(b) => serializer.serialize_bool(*b),
            Self::Date(d) => d.serialize(serializer),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Number(d) => {
                if d.is_integer()
                    && let Some(n) = d.to_i64()
                {
                    return serializer.serialize_i64(n);
                }
                match d.to_f64() {
                    Some(f) => serializer.serialize_f64(f),
                    None => serializer.serialize_str(&d.to_string()),
                }
            }
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(b) => write!(f, "{b}"),
            Self::Number(d) => write!(f, "{d}"),
            Self::Date(d) => write!(f, "{d}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}
