//! Locked, atomically replaced JSON document
//!
//! The whole key space lives in one JSON object at `path`. Coordination
//! happens through an advisory lock on a sibling `<path>.lock` file, which is
//! never renamed, so the lock stays meaningful while the document itself is
//! swapped out underneath it.
//!
//! Writers hold the exclusive lock for the full read-modify-write cycle and
//! publish by writing `<path>.tmp` and renaming it over `path`. Readers hold
//! the shared lock. A reader can only ever observe a complete document.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, warn};

use crate::error::{Result, StoreError};

/// Decoded document: normalized key -> encoded value
pub(crate) type Entries = BTreeMap<String, serde_json::Value>;

/// Whether a mutation needs the document rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Commit {
    Replace,
    Keep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
}

#[derive(Debug, Clone)]
pub(crate) struct DocumentFile {
    path: PathBuf,
    lock_path: PathBuf,
    temp_path: PathBuf,
    create_missing_directories: bool,
    pretty: bool,
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

impl DocumentFile {
    pub fn new(path: PathBuf, create_missing_directories: bool, pretty: bool) -> Self {
        Self {
            lock_path: sibling(&path, ".lock"),
            temp_path: sibling(&path, ".tmp"),
            path,
            create_missing_directories,
            pretty,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn creates_directories(&self) -> bool {
        self.create_missing_directories
    }

    pub fn set_create_missing_directories(&mut self, enabled: bool) {
        self.create_missing_directories = enabled;
    }

    pub fn is_pretty(&self) -> bool {
        self.pretty
    }

    pub fn set_pretty(&mut self, enabled: bool) {
        self.pretty = enabled;
    }

    /// Directory holding the document, `None` for a bare file name
    fn parent(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }

    /// Reads the current document under a shared lock
    pub fn read(&self) -> Result<Entries> {
        if let Some(parent) = self.parent() {
            if !parent.is_dir() {
                return Ok(Entries::new());
            }
        }

        let lock = match self.open_lock(Access::Read) {
            Ok(lock) => Some(lock),
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "cannot create lock file, reading without a lock"
                );
                None
            }
            Err(e) => return Err(StoreError::read(&self.lock_path, e)),
        };

        if let Some(lock) = &lock {
            lock.lock_shared()
                .map_err(|e| StoreError::read(&self.lock_path, e))?;
            debug!(path = %self.path.display(), "acquired shared lock");
        }

        let entries = self.load(Access::Read)?.unwrap_or_default();

        // Lock is released when the lock file is dropped
        drop(lock);
        Ok(entries)
    }

    /// Runs one read-modify-write cycle under the exclusive lock.
    ///
    /// The closure sees the current entries and decides whether the result
    /// must be written back. A missing document is always published, so the
    /// first mutation leaves at least `{}` on disk.
    pub fn update<T>(&self, mutate: impl FnOnce(&mut Entries) -> (T, Commit)) -> Result<T> {
        self.provision()?;

        let lock = self
            .open_lock(Access::Write)
            .map_err(|e| StoreError::write(&self.lock_path, e))?;
        lock.lock_exclusive()
            .map_err(|e| StoreError::write(&self.lock_path, e))?;
        debug!(path = %self.path.display(), "acquired exclusive lock");

        let existing = self.load(Access::Write)?;
        let missing = existing.is_none();
        let mut entries = existing.unwrap_or_default();
        let (output, commit) = mutate(&mut entries);

        if commit == Commit::Replace || missing {
            self.replace(&entries)?;
        }

        drop(lock);
        Ok(output)
    }

    /// Creates the parent directory when allowed to
    fn provision(&self) -> Result<()> {
        let Some(parent) = self.parent() else {
            return Ok(());
        };
        if parent.is_dir() {
            return Ok(());
        }

        if !self.create_missing_directories {
            return Err(StoreError::write(
                &self.path,
                io::Error::new(
                    ErrorKind::NotFound,
                    format!("parent directory {} does not exist", parent.display()),
                ),
            ));
        }

        fs::create_dir_all(parent).map_err(|e| StoreError::write(parent, e))?;
        debug!(dir = %parent.display(), "created store directory");
        Ok(())
    }

    fn open_lock(&self, access: Access) -> io::Result<File> {
        // Readers need write access only to create the file; flock itself
        // works on a read-only descriptor.
        OpenOptions::new()
            .read(true)
            .write(access == Access::Write || !self.lock_path.exists())
            .create(access == Access::Write || !self.lock_path.exists())
            .truncate(false)
            .open(&self.lock_path)
    }

    /// Loads and decodes the document, `None` if it does not exist yet.
    /// Caller holds the lock.
    fn load(&self, access: Access) -> Result<Option<Entries>> {
        let io_error = |e: io::Error| match access {
            Access::Read => StoreError::read(&self.path, e),
            Access::Write => StoreError::write(&self.path, e),
        };

        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(e)),
        };

        let entries = decode(&bytes).map_err(|reason| StoreError::Corrupt {
            path: self.path.clone(),
            reason,
        })?;
        debug!(path = %self.path.display(), keys = entries.len(), "loaded document");
        Ok(Some(entries))
    }

    /// Publishes a new document via temp file + rename. Caller holds the
    /// exclusive lock.
    fn replace(&self, entries: &Entries) -> Result<()> {
        let bytes = encode(entries, self.pretty)?;

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&self.temp_path)
                .map_err(|e| StoreError::write(&self.temp_path, e))?;

            let mut writer = BufWriter::new(&file);
            writer
                .write_all(&bytes)
                .and_then(|_| writer.flush())
                .map_err(|e| StoreError::write(&self.temp_path, e))?;
            drop(writer);

            file.sync_all()
                .map_err(|e| StoreError::write(&self.temp_path, e))?;
        }

        // Atomic rename
        fs::rename(&self.temp_path, &self.path).map_err(|e| StoreError::write(&self.path, e))?;
        if let Some(parent) = self.parent() {
            sync_dir(parent).map_err(|e| StoreError::write(parent, e))?;
        }
        debug!(path = %self.path.display(), keys = entries.len(), "replaced document");
        Ok(())
    }
}

/// Flushes the directory entry so the rename survives a crash
#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

fn decode(bytes: &[u8]) -> std::result::Result<Entries, String> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Entries::new());
    }

    match serde_json::from_slice::<serde_json::Value>(bytes) {
        Ok(serde_json::Value::Object(map)) => Ok(map.into_iter().collect()),
        Ok(other) => Err(format!(
            "top level must be a JSON object, found {}",
            match other {
                serde_json::Value::Array(_) => "an array",
                serde_json::Value::String(_) => "a string",
                serde_json::Value::Number(_) => "a number",
                serde_json::Value::Bool(_) => "a boolean",
                _ => "null",
            }
        )),
        Err(e) => Err(e.to_string()),
    }
}

fn encode(entries: &Entries, pretty: bool) -> Result<Vec<u8>> {
    let encoded = if pretty {
        serde_json::to_vec_pretty(entries)
    } else {
        serde_json::to_vec(entries)
    };
    encoded.map_err(|e| StoreError::SerializationFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn document(dir: &TempDir) -> DocumentFile {
        DocumentFile::new(dir.path().join("store.json"), true, false)
    }

    fn insert(doc: &DocumentFile, key: &str, value: serde_json::Value) {
        doc.update(|entries| {
            entries.insert(key.to_string(), value);
            ((), Commit::Replace)
        })
        .unwrap();
    }

    #[test]
    fn missing_document_reads_empty() {
        let dir = TempDir::new().unwrap();
        let doc = document(&dir);

        assert!(doc.read().unwrap().is_empty());
        assert!(!doc.path().exists());
    }

    #[test]
    fn missing_directory_reads_empty_without_creating_it() {
        let dir = TempDir::new().unwrap();
        let doc = DocumentFile::new(dir.path().join("a").join("store.json"), true, false);

        assert!(doc.read().unwrap().is_empty());
        assert!(!dir.path().join("a").exists());
    }

    #[test]
    fn update_writes_object_document() {
        let dir = TempDir::new().unwrap();
        let doc = document(&dir);

        insert(&doc, "b", json!(2));
        insert(&doc, "a", json!("one"));

        let text = fs::read_to_string(doc.path()).unwrap();
        assert_eq!(text, r#"{"a":"one","b":2}"#);
    }

    #[test]
    fn keep_skips_the_write() {
        let dir = TempDir::new().unwrap();
        let doc = document(&dir);
        fs::write(doc.path(), r#"{ "a" : 1 }"#).unwrap();

        let seen = doc.update(|entries| (entries.len(), Commit::Keep)).unwrap();
        assert_eq!(seen, 1);
        assert_eq!(fs::read_to_string(doc.path()).unwrap(), r#"{ "a" : 1 }"#);
    }

    #[test]
    fn keep_still_provisions_missing_document() {
        let dir = TempDir::new().unwrap();
        let doc = DocumentFile::new(dir.path().join("fresh").join("store.json"), true, false);

        let seen = doc.update(|entries| (entries.len(), Commit::Keep)).unwrap();
        assert_eq!(seen, 0);
        assert_eq!(fs::read_to_string(doc.path()).unwrap(), "{}");
    }

    #[cfg(unix)]
    #[test]
    fn reads_from_read_only_directory() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let data = dir.path().join("ro");
        fs::create_dir(&data).unwrap();
        fs::write(data.join("store.json"), r#"{"k": 1}"#).unwrap();
        fs::set_permissions(&data, fs::Permissions::from_mode(0o555)).unwrap();

        let doc = DocumentFile::new(data.join("store.json"), true, false);
        let result = doc.read();

        fs::set_permissions(&data, fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(result.unwrap()["k"], json!(1));
    }

    #[test]
    fn directory_in_place_of_document_is_an_os_error() {
        let dir = TempDir::new().unwrap();
        let doc = document(&dir);
        fs::create_dir(doc.path()).unwrap();

        let err = doc.read().unwrap_err();
        assert!(matches!(err, StoreError::ReadFailed { .. }));
        assert!(err.io_error().and_then(io::Error::raw_os_error).is_some());

        let err = doc.update(|_| ((), Commit::Replace)).unwrap_err();
        assert!(matches!(err, StoreError::WriteFailed { .. }));
        assert!(err.io_error().and_then(io::Error::raw_os_error).is_some());
    }

    #[test]
    fn temp_file_does_not_survive() {
        let dir = TempDir::new().unwrap();
        let doc = document(&dir);

        insert(&doc, "k", json!(true));

        assert!(!dir.path().join("store.json.tmp").exists());
        assert!(dir.path().join("store.json.lock").exists());
    }

    #[test]
    fn empty_file_reads_as_empty_object() {
        let dir = TempDir::new().unwrap();
        let doc = document(&dir);
        fs::write(doc.path(), "  \n").unwrap();

        assert!(doc.read().unwrap().is_empty());
    }

    #[test]
    fn corrupt_document_is_reported_and_kept() {
        let dir = TempDir::new().unwrap();
        let doc = document(&dir);
        fs::write(doc.path(), "{not json").unwrap();

        assert!(matches!(doc.read(), Err(StoreError::Corrupt { .. })));

        let result = doc.update(|entries| {
            entries.clear();
            ((), Commit::Replace)
        });
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
        assert_eq!(fs::read_to_string(doc.path()).unwrap(), "{not json");
    }

    #[test]
    fn non_object_document_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let doc = document(&dir);
        fs::write(doc.path(), "[1, 2]").unwrap();

        let err = doc.read().unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn pretty_documents_still_parse() {
        let dir = TempDir::new().unwrap();
        let doc = DocumentFile::new(dir.path().join("store.json"), true, true);

        insert(&doc, "k", json!({"nested": [1, 2]}));

        let text = fs::read_to_string(doc.path()).unwrap();
        assert!(text.contains('\n'));
        assert_eq!(doc.read().unwrap()["k"], json!({"nested": [1, 2]}));
    }

    #[test]
    fn creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("dir").join("store.json");
        let doc = DocumentFile::new(path, true, false);

        insert(&doc, "k", json!(1));

        assert!(doc.path().exists());
    }

    #[test]
    fn refuses_missing_directory_when_not_allowed() {
        let dir = TempDir::new().unwrap();
        let doc = DocumentFile::new(dir.path().join("nested").join("store.json"), false, false);

        let err = doc
            .update(|entries| {
                entries.insert("k".into(), json!(1));
                ((), Commit::Replace)
            })
            .unwrap_err();

        assert!(matches!(err, StoreError::WriteFailed { .. }));
        assert_eq!(err.io_error().map(|e| e.kind()), Some(ErrorKind::NotFound));
        assert!(!dir.path().join("nested").exists());
    }

    #[test]
    fn sibling_paths() {
        let doc = DocumentFile::new(PathBuf::from("data/store.json"), true, false);
        assert_eq!(doc.lock_path, PathBuf::from("data/store.json.lock"));
        assert_eq!(doc.temp_path, PathBuf::from("data/store.json.tmp"));
    }
}
