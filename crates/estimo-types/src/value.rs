use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A dynamically typed value carried by calculator options and component metadata.
///
/// Serialized untagged, so it reads and writes as plain JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(untagged)]
pub enum OptionValue {
    /// Null / absent value
    #[default]
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
    /// Array of `OptionValues`
    Array(Vec<OptionValue>),
    /// Object/map of string keys to `OptionValues`
    Object(HashMap<String, OptionValue>),
}

// -------------------------------------------------------------------------------------------------
// Conversions between `OptionValue` and `serde_json::Value`.
// -------------------------------------------------------------------------------------------------

impl From<OptionValue> for serde_json::Value {
    fn from(value: OptionValue) -> Self {
        match value {
            OptionValue::String(s) => Self::String(s),
            OptionValue::Integer(i) => Self::Number(serde_json::Number::from(i)),
            OptionValue::Float(f) => {
                serde_json::Number::from_f64(f).map_or(Self::Null, Self::Number)
            }
            OptionValue::Boolean(b) => Self::Bool(b),
            OptionValue::Array(arr) => Self::Array(arr.into_iter().map(Into::into).collect()),
            OptionValue::Object(map) => Self::Object(
                map.into_iter()
                    .map(|(k, v)| (k, v.into()))
                    .collect::<serde_json::Map<String, Self>>(),
            ),
            OptionValue::Null => Self::Null,
        }
    }
}

impl From<&OptionValue> for serde_json::Value {
    fn from(value: &OptionValue) -> Self {
        value.clone().into()
    }
}

impl From<serde_json::Value> for OptionValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => n.as_f64().map_or(Self::Null, Self::Float),
            },
            serde_json::Value::Bool(b) => Self::Boolean(b),
            serde_json::Value::Array(arr) => Self::Array(arr.into_iter().map(Into::into).collect()),
            serde_json::Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
            serde_json::Value::Null => Self::Null,
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(fl) => write!(f, "{fl}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Array(arr) => {
                write!(f, "[")?;
                for (i, item) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Object(obj) => {
                let mut keys: Vec<_> = obj.keys().collect();
                keys.sort();
                write!(f, "{{")?;
                for (i, key) in keys.into_iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {}", obj[key])?;
                }
                write!(f, "}}")
            }
            Self::Null => write!(f, "null"),
        }
    }
}

impl OptionValue {
    /// Canonical boolean coercion used for boolean-typed options.
    ///
    /// Accepts `true`, non-zero numbers and the string spellings
    /// `"1"`, `"y"`, `"yes"`, `"true"`, `"on"` (case-insensitive).
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Boolean(b) => *b,
            Self::Integer(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::String(s) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "1" | "y" | "yes" | "true" | "on"
            ),
            Self::Array(_) | Self::Object(_) | Self::Null => false,
        }
    }

    /// Get the type name as a string
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Boolean(_) => "boolean",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Null => "null",
        }
    }

    /// Numeric view of the value. Numeric strings are parsed.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Borrow the inner string, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the inner array, if this is an array.
    #[must_use]
    pub fn as_array(&self) -> Option<&[OptionValue]> {
        match self {
            Self::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Returns `true` for `Null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Deserialize the value into a concrete type via its JSON form.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the shape does not match `T`.
    pub fn deserialize_into<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(serde_json::Value::from(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthy_spellings() {
        for v in ["1", "Y", "yes", "TRUE", " on "] {
            assert!(OptionValue::from(v).is_truthy(), "{v} should be truthy");
        }
        for v in ["0", "N", "no", "false", ""] {
            assert!(!OptionValue::from(v).is_truthy(), "{v} should be falsy");
        }
        assert!(OptionValue::Integer(1).is_truthy());
        assert!(!OptionValue::Null.is_truthy());
    }

    #[test]
    fn json_conversion_keeps_integers_and_floats_apart() {
        let value = OptionValue::from(json!({"a": 3, "b": 2.5, "c": [true, null]}));
        let OptionValue::Object(map) = &value else {
            panic!("expected object");
        };
        assert_eq!(map["a"], OptionValue::Integer(3));
        assert_eq!(map["b"], OptionValue::Float(2.5));
        assert_eq!(
            map["c"],
            OptionValue::Array(vec![OptionValue::Boolean(true), OptionValue::Null])
        );
        assert_eq!(serde_json::Value::from(value), json!({"a": 3, "b": 2.5, "c": [true, null]}));
    }

    #[test]
    fn untagged_serde_reads_plain_json() {
        let value: OptionValue = serde_json::from_str(r#"{"x": "1", "y": 10}"#).unwrap();
        assert_eq!(value.to_string(), "{x: 1, y: 10}");
    }

    #[test]
    fn numeric_strings_parse() {
        assert_eq!(OptionValue::from("12.5").as_f64(), Some(12.5));
        assert_eq!(OptionValue::from("abc").as_f64(), None);
    }
}
