//! # Domain Model
//!
//! Keys and values as the store understands them, independent of any backend.
//!
//! ## Keys
//!
//! | Input | Key | Document field |
//! |-------|-----|----------------|
//! | `"foo"` | `Key::Str("foo")` | `foo` |
//! | `42` | `Key::Int(42)` | `42` |
//! | `"42"` | `Key::Str("42")` | `42` (collides with `42`) |
//! | `u64::MAX` | rejected | - |
//!
//! ## Values
//!
//! [`Value`] is closed: null, bool, i64, f64, string, list, string-keyed map.
//! Floats must be finite and within [`MAX_FLOAT`]. Binary data is refused.
//!
//! ## Key Types
//!
//! - [`Key`] / [`IntoKey`] - Keys and the key validator
//! - [`Value`] - Storable values and their JSON encoding

mod key;
mod serialize;
mod value;

pub use key::{IntoKey, Key};
pub use value::{Value, MAX_FLOAT};
