//! keystash - a durable key-value store kept in a single JSON document
//!
//! Values are stored under string or integer keys in one JSON object on
//! disk. Writers serialize through an advisory file lock and publish with an
//! atomic rename, so concurrent threads and processes can share one file
//! without lost updates or torn reads.
//!
//! ```no_run
//! use keystash::{FileStore, KeyValueStore, Value};
//!
//! let store = FileStore::new("data/store.json");
//! store.set("foo", "bar")?;
//! assert_eq!(store.get_or("missing", Value::from("def"))?, Value::from("def"));
//! # Ok::<(), keystash::StoreError>(())
//! ```

pub mod cli;
pub mod domain;
pub mod error;
pub mod storage;

pub use domain::{IntoKey, Key, Value, MAX_FLOAT};
pub use error::{Result, StoreError};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
