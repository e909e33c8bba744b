//! Parameter values and the positional fallback translator.
//!
//! Context-carrying driver entry points take [`NamedValue`]s: ordinal-indexed
//! values that may carry a name. Drivers that only understand plain positional
//! parameters take `&[Value]`; [`named_to_positional`] bridges the two.

use crate::error::{DbError, DbResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single parameter or column value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
    Json(serde_json::Value),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short type name, used in logs and error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Timestamp(_) => "timestamp",
            Value::Json(_) => "json",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "'{v}'"),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Value::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
            Value::Json(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// A parameter with its 1-based ordinal and an optional name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedValue {
    /// 1-based position in the argument list.
    pub ordinal: usize,
    /// Parameter name, if the caller bound it by name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub value: Value,
}

impl NamedValue {
    /// A positional (unnamed) parameter.
    pub fn new(ordinal: usize, value: impl Into<Value>) -> Self {
        Self {
            ordinal,
            name: None,
            value: value.into(),
        }
    }

    /// A parameter bound by name.
    pub fn named(ordinal: usize, name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            ordinal,
            name: Some(name.into()),
            value: value.into(),
        }
    }

    /// Whether this parameter carries a non-empty name.
    pub fn has_name(&self) -> bool {
        self.name.as_deref().is_some_and(|n| !n.is_empty())
    }
}

/// Convert an ordinal-indexed argument list into plain positional values.
///
/// Position `i` of the output holds the value whose ordinal is `i + 1`.
/// Fails when any entry carries a name, or when the ordinals are not exactly
/// `1..=args.len()`.
pub fn named_to_positional(args: &[NamedValue]) -> DbResult<Vec<Value>> {
    let mut slots: Vec<Option<Value>> = vec![None; args.len()];

    for arg in args {
        if arg.has_name() {
            return Err(DbError::argument(format!(
                "driver does not support named parameters (got `{}`)",
                arg.name.as_deref().unwrap_or_default()
            )));
        }
        let slot = arg
            .ordinal
            .checked_sub(1)
            .and_then(|i| slots.get_mut(i))
            .ok_or_else(|| {
                DbError::argument(format!(
                    "ordinal {} out of range for {} arguments",
                    arg.ordinal,
                    args.len()
                ))
            })?;
        if slot.is_some() {
            return Err(DbError::argument(format!(
                "duplicate ordinal {}",
                arg.ordinal
            )));
        }
        *slot = Some(arg.value.clone());
    }

    // Every slot is filled: len entries, each unique and in range.
    Ok(slots.into_iter().flatten().collect())
}

/// Build the argument list for a positional call: ordinals `1..=len`, no names.
pub fn positional_to_named(values: &[Value]) -> Vec<NamedValue> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| NamedValue::new(i + 1, v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_ordinals_to_positions() {
        let named = vec![NamedValue::new(1, "foo"), NamedValue::new(2, 42)];
        let values = named_to_positional(&named).unwrap();
        assert_eq!(values, vec![Value::from("foo"), Value::Int(42)]);
    }

    #[test]
    fn orders_by_ordinal_not_input_position() {
        let named = vec![NamedValue::new(2, 42), NamedValue::new(1, "foo")];
        let values = named_to_positional(&named).unwrap();
        assert_eq!(values, vec![Value::from("foo"), Value::Int(42)]);
    }

    #[test]
    fn rejects_named_parameters() {
        let named = vec![NamedValue::new(1, 1), NamedValue::named(2, "id", 7)];
        let err = named_to_positional(&named).unwrap_err();
        assert!(matches!(err, DbError::Argument(_)));
    }

    #[test]
    fn empty_name_counts_as_positional() {
        let named = vec![NamedValue {
            ordinal: 1,
            name: Some(String::new()),
            value: Value::Bool(true),
        }];
        assert_eq!(named_to_positional(&named).unwrap(), vec![Value::Bool(true)]);
    }

    #[test]
    fn rejects_gaps_and_duplicates() {
        let gap = vec![NamedValue::new(1, 1), NamedValue::new(3, 3)];
        assert!(matches!(
            named_to_positional(&gap),
            Err(DbError::Argument(_))
        ));

        let dup = vec![NamedValue::new(1, 1), NamedValue::new(1, 2)];
        assert!(matches!(
            named_to_positional(&dup),
            Err(DbError::Argument(_))
        ));

        let zero = vec![NamedValue::new(0, 1)];
        assert!(matches!(
            named_to_positional(&zero),
            Err(DbError::Argument(_))
        ));
    }

    #[test]
    fn positional_round_trip_assigns_ordinals() {
        let named = positional_to_named(&[Value::Null, Value::from("x")]);
        assert_eq!(named[0].ordinal, 1);
        assert_eq!(named[1].ordinal, 2);
        assert!(named.iter().all(|n| n.name.is_none()));
    }

    #[test]
    fn option_maps_to_null() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some("a")), Value::from("a"));
    }

    #[test]
    fn serde_uses_adjacent_type_tag() {
        use chrono::TimeZone;
        use serde_json::json;

        assert_eq!(
            serde_json::to_value(Value::Int(42)).unwrap(),
            json!({"type": "int", "value": 42})
        );
        assert_eq!(serde_json::to_value(Value::Null).unwrap(), json!({"type": "null"}));
        assert_eq!(
            serde_json::from_value::<Value>(json!({"type": "text", "value": "foo"})).unwrap(),
            Value::from("foo")
        );

        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        for value in [
            Value::Null,
            Value::Bool(true),
            Value::Float(1.5),
            Value::Bytes(vec![0, 255]),
            Value::Timestamp(at),
            Value::Json(json!({"k": [1, 2]})),
        ] {
            let encoded = serde_json::to_string(&value).unwrap();
            assert_eq!(serde_json::from_str::<Value>(&encoded).unwrap(), value);
        }
    }

    #[test]
    fn serde_named_value_omits_missing_name() {
        use serde_json::json;

        let positional = NamedValue::new(1, 7);
        assert_eq!(
            serde_json::to_value(&positional).unwrap(),
            json!({"ordinal": 1, "value": {"type": "int", "value": 7}})
        );

        let named = NamedValue::named(2, "id", "abc");
        let encoded = serde_json::to_value(&named).unwrap();
        assert_eq!(encoded["name"], "id");
        assert_eq!(serde_json::from_value::<NamedValue>(encoded).unwrap(), named);

        let decoded: NamedValue =
            serde_json::from_value(json!({"ordinal": 3, "value": {"type": "bool", "value": false}}))
                .unwrap();
        assert_eq!(decoded, NamedValue::new(3, false));
    }
}
