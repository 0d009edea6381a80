//! Structural values and static types bound into operator contexts.
//!
//! [`Value`] is the call-site object graph an argument is lowered into, and
//! [`ValueType`] is its static counterpart. Both support dotted property
//! paths (`"profile.address.city"`) so a cache key or a template can reach
//! into nested records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Separator between the segments of a property path.
pub const PATH_SEPARATOR: char = '.';

// ============================================================================
// RUNTIME VALUES
// ============================================================================

/// A runtime argument value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    List(Vec<Value>),
    Record(BTreeMap<String, Value>),
}

impl Value {
    /// Build a record from `(field, value)` pairs.
    pub fn record<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Short kind name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Uuid(_) => "uuid",
            Value::Timestamp(_) => "timestamp",
            Value::List(_) => "list",
            Value::Record(_) => "record",
        }
    }

    /// Derive the static type of this value.
    ///
    /// Lists take the type of their elements when all elements agree and
    /// fall back to [`ValueType::Any`] otherwise. `Null` is `Any`.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Any,
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Text(_) => ValueType::Text,
            Value::Uuid(_) => ValueType::Uuid,
            Value::Timestamp(_) => ValueType::Timestamp,
            Value::List(items) => {
                let mut types = items.iter().map(Value::value_type);
                let element = match types.next() {
                    Some(first) if types.all(|t| t == first) => first,
                    _ => ValueType::Any,
                };
                ValueType::List(Box::new(element))
            }
            Value::Record(fields) => ValueType::Record(
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), value.value_type()))
                    .collect(),
            ),
        }
    }

    /// Walk a dotted property path into this value.
    ///
    /// An empty path yields the value itself. Every segment must name a field
    /// of a record; anything else is reported as a [`PathError`].
    pub fn resolve_path(&self, path: &str) -> Result<&Value, PathError> {
        if path.is_empty() {
            return Ok(self);
        }
        let mut current = self;
        for segment in path.split(PATH_SEPARATOR) {
            if segment.is_empty() {
                return Err(PathError::empty_segment());
            }
            current = match current {
                Value::Record(fields) => fields
                    .get(segment)
                    .ok_or_else(|| PathError::missing_field(segment))?,
                other => return Err(PathError::not_a_record(segment, other.kind())),
            };
        }
        Ok(current)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
            Value::Uuid(id) => write!(f, "{}", id.hyphenated()),
            Value::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Record(fields) => {
                write!(f, "{{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", name, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Uuid> for Value {
    fn from(id: Uuid) -> Self {
        Value::Uuid(id)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Value::Timestamp(ts)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

/// Lower a JSON document into a [`Value`].
///
/// Integral numbers that fit an `i64` become `Int`. Larger unsigned integers
/// become `Text` holding their exact decimal digits, so cache keys derived
/// from them stay exact. Other numbers become `Float`; objects become
/// records.
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => Value::Int(i),
                (None, Some(_)) => Value::Text(n.to_string()),
                (None, None) => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => Value::Record(
                fields
                    .into_iter()
                    .map(|(name, value)| (name, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

// ============================================================================
// STATIC TYPES
// ============================================================================

/// Static type of an argument, used when compiling query templates.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Shape unknown until call time
    #[default]
    Any,
    Bool,
    Int,
    Float,
    Text,
    Uuid,
    Timestamp,
    List(Box<ValueType>),
    Record(BTreeMap<String, ValueType>),
}

static ANY: ValueType = ValueType::Any;

impl ValueType {
    /// Build a record type from `(field, type)` pairs.
    pub fn record<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, ValueType)>,
    {
        ValueType::Record(fields.into_iter().map(|(k, t)| (k.into(), t)).collect())
    }

    /// Walk a dotted property path through this type.
    ///
    /// `Any` absorbs every remaining segment, since its shape is only known
    /// at call time.
    pub fn resolve_path(&self, path: &str) -> Result<&ValueType, PathError> {
        if path.is_empty() {
            return Ok(self);
        }
        let mut current = self;
        for segment in path.split(PATH_SEPARATOR) {
            if segment.is_empty() {
                return Err(PathError::empty_segment());
            }
            current = match current {
                ValueType::Any => return Ok(&ANY),
                ValueType::Record(fields) => fields
                    .get(segment)
                    .ok_or_else(|| PathError::missing_field(segment))?,
                other => return Err(PathError::not_a_record(segment, other.kind())),
            };
        }
        Ok(current)
    }

    fn kind(&self) -> &'static str {
        match self {
            ValueType::Any => "any",
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Text => "text",
            ValueType::Uuid => "uuid",
            ValueType::Timestamp => "timestamp",
            ValueType::List(_) => "list",
            ValueType::Record(_) => "record",
        }
    }
}

// ============================================================================
// PATH ERRORS
// ============================================================================

/// Failure to follow one segment of a property path.
///
/// Contexts attach the parameter name and full path before surfacing this as
/// a [`ResolutionError`](crate::ResolutionError).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathError {
    pub segment: String,
    pub reason: String,
}

impl PathError {
    fn empty_segment() -> Self {
        Self {
            segment: String::new(),
            reason: "empty path segment".to_string(),
        }
    }

    fn missing_field(segment: &str) -> Self {
        Self {
            segment: segment.to_string(),
            reason: "field not found".to_string(),
        }
    }

    fn not_a_record(segment: &str, kind: &str) -> Self {
        Self {
            segment: segment.to_string(),
            reason: format!("cannot read a field of a {} value", kind),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> Value {
        Value::record([
            ("id", Value::Int(42)),
            ("name", Value::from("x")),
            (
                "profile",
                Value::record([("city", Value::from("Lyon")), ("age", Value::Null)]),
            ),
        ])
    }

    #[test]
    fn test_resolve_empty_path_returns_whole_value() {
        let value = user();
        assert_eq!(value.resolve_path("").unwrap(), &value);
    }

    #[test]
    fn test_resolve_single_segment() {
        assert_eq!(user().resolve_path("id").unwrap(), &Value::Int(42));
    }

    #[test]
    fn test_resolve_nested_segment() {
        assert_eq!(
            user().resolve_path("profile.city").unwrap(),
            &Value::from("Lyon")
        );
    }

    #[test]
    fn test_resolve_missing_field() {
        let err = user().resolve_path("profile.zip").unwrap_err();
        assert_eq!(err.segment, "zip");
        assert_eq!(err.reason, "field not found");
    }

    #[test]
    fn test_resolve_through_scalar_fails() {
        let err = user().resolve_path("id.value").unwrap_err();
        assert_eq!(err.segment, "value");
        assert!(err.reason.contains("int"));
    }

    #[test]
    fn test_resolve_through_null_fails() {
        let err = user().resolve_path("profile.age.years").unwrap_err();
        assert_eq!(err.segment, "years");
        assert!(err.reason.contains("null"));
    }

    #[test]
    fn test_resolve_empty_segment_fails() {
        let err = user().resolve_path("profile..city").unwrap_err();
        assert_eq!(err.reason, "empty path segment");
    }

    #[test]
    fn test_display_scalars() {
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::from("abc").to_string(), "abc");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Float(1.5).to_string(), "1.5");
        assert_eq!(
            Value::Uuid(Uuid::nil()).to_string(),
            "00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_display_composites() {
        let list = Value::from(vec![1, 2, 3]);
        assert_eq!(list.to_string(), "[1, 2, 3]");

        let record = Value::record([("b", Value::Int(2)), ("a", Value::from("x"))]);
        assert_eq!(record.to_string(), "{a=x, b=2}");
    }

    #[test]
    fn test_value_type_of_record() {
        let ty = user().value_type();
        assert_eq!(ty.resolve_path("id").unwrap(), &ValueType::Int);
        assert_eq!(ty.resolve_path("profile.city").unwrap(), &ValueType::Text);
        assert_eq!(ty.resolve_path("profile.age").unwrap(), &ValueType::Any);
    }

    #[test]
    fn test_value_type_of_lists() {
        assert_eq!(
            Value::from(vec![1, 2]).value_type(),
            ValueType::List(Box::new(ValueType::Int))
        );
        assert_eq!(
            Value::List(vec![Value::Int(1), Value::from("a")]).value_type(),
            ValueType::List(Box::new(ValueType::Any))
        );
        assert_eq!(
            Value::List(vec![]).value_type(),
            ValueType::List(Box::new(ValueType::Any))
        );
    }

    #[test]
    fn test_type_path_through_any_is_any() {
        let ty = ValueType::record([("meta", ValueType::Any)]);
        assert_eq!(ty.resolve_path("meta.a.b").unwrap(), &ValueType::Any);
    }

    #[test]
    fn test_type_path_through_scalar_fails() {
        let ty = ValueType::record([("id", ValueType::Int)]);
        let err = ty.resolve_path("id.x").unwrap_err();
        assert_eq!(err.segment, "x");
    }

    #[test]
    fn test_from_json() {
        let json = serde_json::json!({"id": 7, "score": 0.5, "tags": ["a"], "gone": null});
        let value = Value::from(json);
        assert_eq!(value.resolve_path("id").unwrap(), &Value::Int(7));
        assert_eq!(value.resolve_path("score").unwrap(), &Value::Float(0.5));
        assert_eq!(
            value.resolve_path("tags").unwrap(),
            &Value::List(vec![Value::from("a")])
        );
        assert_eq!(value.resolve_path("gone").unwrap(), &Value::Null);
    }

    #[test]
    fn test_from_json_keeps_large_unsigned_exact() {
        let value = Value::from(serde_json::json!(u64::MAX));
        assert_eq!(value, Value::Text("18446744073709551615".to_string()));
        assert_eq!(value.to_string(), u64::MAX.to_string());

        let value = Value::from(serde_json::json!(i64::MAX));
        assert_eq!(value, Value::Int(i64::MAX));
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(3i64)), Value::Int(3));
    }
}
