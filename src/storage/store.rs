use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, MutexGuard};
use serde_json::Value;
use tracing::warn;

use crate::core::error::{Error, ErrorKind, Result};
use crate::core::ident;
use crate::core::types::Document;
use crate::index::descriptor::IndexDescriptor;
use crate::storage::document;

/// Marker file name; existence means a writer holds the store.
const LOCK_FILE: &str = "_lock.ddl";

/// Poll period while waiting on the marker file.
const LOCK_POLL: Duration = Duration::from_micros(500);

/// Default lock-wait bound in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// One named document collection mapped to a directory.
///
/// Owns the index descriptors, the advisory write lock and all document
/// path construction. The lock is two layers with the same timeout policy:
/// a marker file coordinating writers across processes, and an in-process
/// mutex closing the marker file's check-then-create race between threads.
/// Both waits are bounded; after the timeout the writer proceeds anyway, so
/// the bound is a liveness fallback rather than a hard exclusion guarantee.
#[derive(Debug)]
pub struct Store {
    name: String,
    directory: PathBuf,
    indexes: HashMap<String, IndexDescriptor>,
    timeout: Duration,
    writer: Mutex<()>,
}

/// Held for the duration of one mutating operation; releases the marker
/// file and the in-process mutex on drop, so error paths unlock too.
pub struct WriteGuard<'a> {
    store: &'a Store,
    _writer: Option<MutexGuard<'a, ()>>,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.store.remove_write_lock();
    }
}

impl Store {
    /// Validate (and if needed create) `<root>/<name>`.
    ///
    /// `timeout_secs` bounds every lock wait; zero or negative values fall
    /// back to the default.
    pub fn new(root: &Path, name: &str, timeout_secs: i64) -> Result<Self> {
        let directory = root.join(name);

        if !directory.is_dir() {
            if !ident::valid_key(name) {
                return Err(Error::new(ErrorKind::StoreKeyMalformed, format!("invalid store name '{}'", name))
                    .with_store(name));
            }

            fs::create_dir_all(&directory).map_err(|err| {
                Error::new(ErrorKind::FailedDirectoryCreate, err.to_string()).with_store(name)
            })?;
        }

        if !document::is_writable(&directory) {
            return Err(Error::new(ErrorKind::NotWritable, format!("store directory {} is not writable", directory.display()))
                .with_store(name));
        }

        let timeout = if timeout_secs > 0 {
            Duration::from_secs(timeout_secs as u64)
        } else {
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        };

        Ok(Store {
            name: name.to_string(),
            directory,
            indexes: HashMap::new(),
            timeout,
            writer: Mutex::new(()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// `<store>/<id>.ddb`
    pub fn document_path(&self, id: &str) -> PathBuf {
        self.directory.join(format!("{}.ddb", id))
    }

    /// `<store>/indexes`
    pub fn indexes_dir(&self) -> PathBuf {
        self.directory.join("indexes")
    }

    fn lock_path(&self) -> PathBuf {
        self.directory.join(LOCK_FILE)
    }

    /// Register a validated index under `name`.
    pub fn add_index(&mut self, name: &str, config: &Value) -> Result<()> {
        let index = IndexDescriptor::new(&self.directory, &self.name, name, config)?;
        self.indexes.insert(name.to_string(), index);
        Ok(())
    }

    pub fn get_index(&self, name: &str) -> Result<&IndexDescriptor> {
        self.indexes.get(name).ok_or_else(|| {
            Error::new(ErrorKind::InvalidIndexKey, format!("no index named '{}'", name))
                .with_store(&self.name)
                .with_index(name)
        })
    }

    pub fn indexes(&self) -> impl Iterator<Item = &IndexDescriptor> {
        self.indexes.values()
    }

    /// True iff the marker file exists.
    pub fn has_write_lock(&self) -> bool {
        self.lock_path().exists()
    }

    /// Block until the marker file is absent or the timeout elapses.
    ///
    /// Does not acquire anything; the read path uses this to let an
    /// in-flight writer finish before scanning.
    pub fn wait_write_lock(&self) {
        let deadline = Instant::now() + self.timeout;

        while self.has_write_lock() {
            if Instant::now() > deadline {
                warn!(store = %self.name, "write lock wait timed out, proceeding");
                return;
            }
            std::thread::sleep(LOCK_POLL);
        }
    }

    /// Wait for the marker to clear, then create it.
    pub fn set_write_lock(&self) -> Result<()> {
        self.wait_write_lock();

        fs::write(self.lock_path(), b"").map_err(|err| {
            Error::new(ErrorKind::LockWriteFailure, err.to_string()).with_store(&self.name)
        })
    }

    /// Best-effort release. A failed unlink is recovered by the next
    /// acquirer's bounded wait, never by force-clearing.
    pub fn remove_write_lock(&self) {
        let lock = self.lock_path();
        if lock.exists() && document::is_writable(&lock) {
            let _ = fs::remove_file(lock);
        }
    }

    /// Acquire the write lock for one mutating operation.
    pub fn lock_write(&self) -> Result<WriteGuard<'_>> {
        let writer = self.writer.try_lock_for(self.timeout);
        if writer.is_none() {
            warn!(store = %self.name, "writer mutex wait timed out, proceeding");
        }

        self.set_write_lock()?;

        Ok(WriteGuard {
            store: self,
            _writer: writer,
        })
    }

    /// Write a document as pretty JSON.
    pub fn write_document(&self, path: &Path, document: &Document) -> io::Result<()> {
        document::write_json(path, document)
    }

    /// Load a JSON value with invalid-UTF-8 substitution.
    pub fn load_document(&self, path: &Path) -> io::Result<Value> {
        document::load_json(path)
    }
}
