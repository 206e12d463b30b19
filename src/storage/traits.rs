//! The key-value contract every backend implements

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::{IntoKey, Value};
use crate::error::Result;

/// Uniform key-value storage contract
///
/// Keys are validated (see [`IntoKey`]) before a backend touches storage,
/// so a malformed key never reaches I/O. Values are checked against the
/// storable domain before anything is written.
///
/// Keys that normalize to the same string address the same entry:
/// `store.set(1, ..)` and `store.set("1", ..)` write the same slot.
pub trait KeyValueStore {
    /// Stores `value` under `key`, overwriting any previous value
    fn set<K: IntoKey, V: Into<Value>>(&self, key: K, value: V) -> Result<()>;

    /// Returns the value stored under `key`, if any
    fn get<K: IntoKey>(&self, key: K) -> Result<Option<Value>>;

    /// Removes `key`. Returns true if it was present.
    fn remove<K: IntoKey>(&self, key: K) -> Result<bool>;

    /// Returns true if `key` is present
    fn has<K: IntoKey>(&self, key: K) -> Result<bool>;

    /// Removes every key
    fn clear(&self) -> Result<()>;

    /// Returns the value stored under `key`, or `default` when absent
    fn get_or<K: IntoKey>(&self, key: K, default: Value) -> Result<Value> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// Stores any serializable value under `key`
    fn set_serialized<K: IntoKey, T: Serialize + ?Sized>(&self, key: K, value: &T) -> Result<()> {
        let key = key.into_key()?;
        self.set(key, Value::from_serialize(value)?)
    }

    /// Reads the value under `key` back into a typed value
    fn get_deserialized<K: IntoKey, T: DeserializeOwned>(&self, key: K) -> Result<Option<T>> {
        self.get(key)?.map(Value::into_deserialize).transpose()
    }
}
