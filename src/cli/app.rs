//! Main CLI application structure

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use super::output::{Output, OutputFormat};
use crate::storage::{Config, FileStore, KeyValueStore};
use crate::Value;

#[derive(Parser)]
#[command(name = "keystash")]
#[command(author, version, about = "Durable key-value store in a single JSON file")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the store document
    #[arg(long, short = 's', global = true, env = "KEYSTASH_STORE")]
    pub store: Option<PathBuf>,

    /// Configuration file (defaults to the global config)
    #[arg(long, global = true, env = "KEYSTASH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Fail instead of creating missing parent directories
    #[arg(long, global = true)]
    pub no_create_dirs: bool,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store a value
    Set {
        key: String,

        /// JSON literal (e.g. 42, "text", [1,2], {"a":true})
        value: String,

        /// Store the argument as a plain string instead of parsing JSON
        #[arg(long)]
        string: bool,
    },

    /// Print a stored value
    Get {
        key: String,

        /// JSON value printed when the key is absent (default: null)
        #[arg(long)]
        default: Option<String>,
    },

    /// Remove a key
    #[command(alias = "rm")]
    Remove { key: String },

    /// Check whether a key is present
    Has { key: String },

    /// Remove every key
    Clear,

    /// List stored keys
    Keys,

    /// Show the resolved store path
    Path,
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let output = Output::new(cli.format, cli.verbose);

    let config = Config::load(cli.config.as_deref())?;
    if let Some(source) = &config.source {
        output.verbose(&format!("Loaded config from {}", source.display()));
    }

    let path = config.resolve_store_path(cli.store.as_deref())?;
    let create_dirs = config.store.create_missing_directories && !cli.no_create_dirs;
    let store = FileStore::new(&path)
        .create_missing_directories(create_dirs)
        .pretty(config.store.pretty);
    output.verbose(&format!(
        "Using store at {} (create directories: {}, pretty: {})",
        store.path().display(),
        store.creates_missing_directories(),
        store.is_pretty()
    ));

    match cli.command {
        Commands::Set { key, value, string } => {
            let value = if string {
                Value::String(value)
            } else {
                parse_json(&value)?
            };
            output.verbose_ctx("set", &format!("{} = {}", key, value.type_name()));
            store.set(key.as_str(), value)?;
            output.success(&format!("Stored {}", key));
        }

        Commands::Get { key, default } => {
            let default = match default {
                Some(raw) => parse_json(&raw)?,
                None => Value::Null,
            };
            let value = store.get_or(key.as_str(), default)?;
            output.value(&value.to_json()?);
        }

        Commands::Remove { key } => {
            let removed = store.remove(key.as_str())?;
            output.verbose_ctx("remove", &format!("{} removed: {}", key, removed));
            if output.is_json() {
                output.data(&serde_json::json!({ "key": key, "removed": removed }));
            } else if removed {
                output.success(&format!("Removed {}", key));
            } else {
                output.success(&format!("{} was not present", key));
            }
        }

        Commands::Has { key } => {
            let present = store.has(key.as_str())?;
            if output.is_json() {
                output.data(&serde_json::json!({ "key": key, "present": present }));
            } else {
                println!("{}", present);
            }
        }

        Commands::Clear => {
            store.clear()?;
            output.success(&format!("Cleared {}", store.path().display()));
        }

        Commands::Keys => {
            let keys = store.keys()?;
            if output.is_json() {
                output.data(&keys);
            } else {
                for key in keys {
                    println!("{}", key);
                }
            }
        }

        Commands::Path => {
            if output.is_json() {
                output.data(&serde_json::json!({ "path": store.path() }));
            } else {
                println!("{}", store.path().display());
            }
        }
    }

    output.verbose("Command completed successfully");
    Ok(())
}

fn parse_json(raw: &str) -> Result<Value> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(json) => Ok(Value::from_json(json)),
        Err(e) => {
            // Numbers serde_json refuses as out of range are outside the
            // float domain, not text
            if let Some(f) = numeric_literal(raw) {
                Value::Float(f).validate()?;
            }
            Err(e).with_context(|| {
                format!("Invalid JSON value '{}' (use --string for plain text)", raw)
            })
        }
    }
}

fn numeric_literal(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let numeric = !raw.is_empty()
        && raw
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    numeric.then(|| raw.parse().ok()).flatten()
}

fn init_logging(verbose: bool) {
    let default = if verbose { "keystash=debug" } else { "keystash=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // Ignore the error if a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreError;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_json_values() {
        assert_eq!(parse_json("42").unwrap(), Value::Int(42));
        assert_eq!(parse_json("\"x\"").unwrap(), Value::from("x"));
        assert_eq!(parse_json("[1.5]").unwrap(), Value::from(vec![1.5]));
        assert!(parse_json("not json").is_err());
    }

    #[test]
    fn out_of_range_number_is_unsupported() {
        let err = parse_json("1.0e400").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::UnsupportedValue(_))
        ));

        let err = parse_json("-2e308").unwrap_err();
        assert!(err.to_string().contains("Unsupported value"));

        // Words that happen to parse as floats stay JSON errors
        let err = parse_json("inf").unwrap_err();
        assert!(err.downcast_ref::<StoreError>().is_none());
    }

    #[test]
    fn rm_is_an_alias() {
        let cli = Cli::try_parse_from(["keystash", "rm", "foo"]).unwrap();
        assert!(matches!(cli.command, Commands::Remove { ref key } if key == "foo"));
    }
}
