//! # Command-Line Interface
//!
//! A thin operator tool over [`FileStore`](crate::FileStore).
//!
//! ## Commands
//!
//! | Command | Store operation |
//! |---------|-----------------|
//! | `set <key> <json>` | `set` (`--string` stores the text verbatim) |
//! | `get <key> [--default <json>]` | `get_or` |
//! | `remove <key>` / `rm` | `remove` |
//! | `has <key>` | `has` |
//! | `clear` | `clear` |
//! | `keys` | list stored keys |
//! | `path` | show the resolved store path |
//!
//! ## Store Resolution
//!
//! `--store` (or `KEYSTASH_STORE`), then `store.path` from the config file,
//! then `<data dir>/keystash/store.json`.
//!
//! ## Output Formats
//!
//! All commands support `--format`:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! `--verbose` (or `-v`) prints progress notes and enables debug logging
//! for the store. `RUST_LOG` overrides the log filter.

mod app;
mod output;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
