//! Store keys and key validation
//!
//! A key is either a string or a 64-bit signed integer. On disk every key is
//! a JSON object field name, so keys are normalized to their string form:
//!
//! - `Key::Str("foo")` -> `foo`
//! - `Key::Int(42)` -> `42`
//!
//! The integer `1` and the string `"1"` normalize to the same field and are
//! the same entry as far as the store is concerned. Callers mixing the two
//! forms must expect them to collide.

use std::fmt;

use crate::domain::Value;
use crate::error::{Result, StoreError};

/// A store key, either a string or a 64-bit signed integer
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Str(String),
    Int(i64),
}

impl Key {
    /// Returns the document field name for this key
    pub fn normalize(&self) -> String {
        match self {
            Key::Str(s) => s.clone(),
            Key::Int(i) => i.to_string(),
        }
    }

    /// Returns true if both keys address the same document field
    pub fn collides_with(&self, other: &Key) -> bool {
        self.normalize() == other.normalize()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Str(s) => f.write_str(s),
            Key::Int(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s)
    }
}

impl From<&String> for Key {
    fn from(s: &String) -> Self {
        Key::Str(s.clone())
    }
}

macro_rules! key_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Key {
                fn from(i: $t) -> Self {
                    Key::Int(i64::from(i))
                }
            }
        )*
    };
}

key_from_int!(i8, i16, i32, i64, u8, u16, u32);

/// Conversion into a validated [`Key`]
///
/// Every store operation takes `K: IntoKey`, so validation happens before
/// the backend sees the call. Conversions that cannot fail are provided for
/// strings and integers that fit in `i64`; dynamic inputs (`u64`, `Value`,
/// `serde_json::Value`) fail with [`StoreError::InvalidKey`].
pub trait IntoKey {
    fn into_key(self) -> Result<Key>;
}

impl IntoKey for Key {
    fn into_key(self) -> Result<Key> {
        Ok(self)
    }
}

impl IntoKey for &Key {
    fn into_key(self) -> Result<Key> {
        Ok(self.clone())
    }
}

macro_rules! into_key_infallible {
    ($($t:ty),*) => {
        $(
            impl IntoKey for $t {
                fn into_key(self) -> Result<Key> {
                    Ok(Key::from(self))
                }
            }
        )*
    };
}

into_key_infallible!(&str, String, &String, i8, i16, i32, i64, u8, u16, u32);

impl IntoKey for u64 {
    fn into_key(self) -> Result<Key> {
        i64::try_from(self)
            .map(Key::Int)
            .map_err(|_| {
                StoreError::InvalidKey(format!(
                    "integer {} exceeds the 64-bit signed range",
                    self
                ))
            })
    }
}

impl IntoKey for usize {
    fn into_key(self) -> Result<Key> {
        (self as u64).into_key()
    }
}

impl IntoKey for Value {
    fn into_key(self) -> Result<Key> {
        match self {
            Value::String(s) => Ok(Key::Str(s)),
            Value::Int(i) => Ok(Key::Int(i)),
            other => Err(StoreError::InvalidKey(format!(
                "expected a string or integer, got {}",
                other.type_name()
            ))),
        }
    }
}

impl IntoKey for &Value {
    fn into_key(self) -> Result<Key> {
        self.clone().into_key()
    }
}

impl IntoKey for serde_json::Value {
    fn into_key(self) -> Result<Key> {
        match self {
            serde_json::Value::String(s) => Ok(Key::Str(s)),
            serde_json::Value::Number(n) => n.as_i64().map(Key::Int).ok_or_else(|| {
                StoreError::InvalidKey(format!("number {} is not a 64-bit signed integer", n))
            }),
            other => Err(StoreError::InvalidKey(format!(
                "expected a string or integer, got {}",
                json_type_name(&other)
            ))),
        }
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_string_and_int() {
        assert_eq!(Key::from("foo").normalize(), "foo");
        assert_eq!(Key::from(42).normalize(), "42");
        assert_eq!(Key::from(-7i64).normalize(), "-7");
    }

    #[test]
    fn int_and_numeric_string_collide() {
        let int_key = Key::from(1);
        let str_key = Key::from("1");

        assert_ne!(int_key, str_key);
        assert!(int_key.collides_with(&str_key));
    }

    #[test]
    fn display_matches_normalized_form() {
        assert_eq!(Key::from(12).to_string(), "12");
        assert_eq!(Key::from("a b").to_string(), "a b");
    }

    #[test]
    fn u64_above_i64_is_invalid() {
        assert_eq!(5u64.into_key().unwrap(), Key::Int(5));

        let err = u64::MAX.into_key().unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));
    }

    #[test]
    fn value_keys() {
        assert_eq!(Value::from("k").into_key().unwrap(), Key::from("k"));
        assert_eq!(Value::Int(3).into_key().unwrap(), Key::Int(3));

        for bad in [Value::Null, Value::Bool(true), Value::Float(1.5), Value::List(vec![])] {
            assert!(matches!(bad.into_key(), Err(StoreError::InvalidKey(_))));
        }
    }

    #[test]
    fn json_keys() {
        assert_eq!(serde_json::json!("k").into_key().unwrap(), Key::from("k"));
        assert_eq!(serde_json::json!(9).into_key().unwrap(), Key::Int(9));

        assert!(serde_json::json!(1.5).into_key().is_err());
        assert!(serde_json::json!(u64::MAX).into_key().is_err());
        assert!(serde_json::json!({"a": 1}).into_key().is_err());
    }
}
