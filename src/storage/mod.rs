//! # Storage Layer
//!
//! Backends implementing the [`KeyValueStore`] contract.
//!
//! ## Backends
//!
//! | Backend | Persistence | Sharing |
//! |---------|-------------|---------|
//! | [`FileStore`] | One JSON object per file | Threads and processes |
//! | [`MemoryStore`] | None | Threads in one process |
//!
//! ## Concurrency Safety
//!
//! - [`FileStore`] coordinates through advisory file locks (`fs2`) on
//!   `<path>.lock`: shared for reads, exclusive for read-modify-write
//! - All writes are atomic (temp file + rename)
//! - No in-memory cache; every call re-reads the document
//! - Lock acquisition blocks without timeout
//!
//! ## File Layout
//!
//! ```text
//! data/
//! ├── store.json       # The document: {"key": <value>, ...}
//! ├── store.json.lock  # Advisory lock target (never removed)
//! └── store.json.tmp   # Transient, only during a write
//! ```
//!
//! ## Key Types
//!
//! - [`KeyValueStore`] - The shared contract
//! - [`FileStore`] - Durable store, reference implementation
//! - [`MemoryStore`] - In-process store
//! - [`Config`] / [`StoreConfig`] - TOML configuration

mod config;
mod document;
mod file;
mod memory;
mod traits;

pub use config::{Config, ConfigError, StoreConfig};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use traits::KeyValueStore;
