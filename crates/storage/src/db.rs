//! The bucket store handle
//!
//! `BucketDb` is an ordered, byte-keyed, transactional key/value store with
//! named buckets and a per-bucket sequence counter. It sits on a redb
//! database that is either backed by a single file or held in memory.
//!
//! # Concurrency
//!
//! Any number of read transactions may run alongside one write transaction.
//! Write transactions are serialized through a writer lock so that waiting
//! for it can honor the configured timeout. Beginning a write transaction
//! while the same thread already holds one waits for that timeout (forever
//! without one).
//!
//! # Locking
//!
//! The data file is locked exclusively for the life of the handle, read-only
//! or not. A second open polls the lock until the timeout runs out.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use redb::{backends::InMemoryBackend, Builder, Database, DatabaseError, Durability};
use stowage_core::{StorageError, StorageResult};
use tracing::{debug, info};

use crate::options::OpenOptions;
use crate::schema::backend;
use crate::tx::Tx;

const LOCK_RETRY: Duration = Duration::from_millis(10);

/// Ordered transactional bucket store
pub struct BucketDb {
    db: Database,
    writer: Mutex<()>,
    path: Option<PathBuf>,
    options: OpenOptions,
}

impl BucketDb {
    /// Open (creating if missing) the data file at `path`
    ///
    /// A read-only open of a missing file fails with an I/O `NotFound` error.
    pub fn open(path: impl AsRef<Path>, options: OpenOptions) -> StorageResult<Self> {
        options.validate()?;
        let path = path.as_ref().to_path_buf();
        let builder = builder(&options);
        let started = Instant::now();

        let db = loop {
            let mut file_options = fs::OpenOptions::new();
            file_options
                .read(true)
                .write(true)
                .create(!options.read_only);
            let file = options.open_path(&path, &mut file_options)?;

            match builder.create_file(file) {
                Ok(db) => break db,
                Err(DatabaseError::DatabaseAlreadyOpen) => {
                    if let Some(timeout) = options.timeout {
                        if started.elapsed() >= timeout {
                            return Err(StorageError::Timeout(timeout, "file lock"));
                        }
                    }
                    debug!(target: "stowage::db", path = %path.display(), "Waiting for file lock");
                    thread::sleep(LOCK_RETRY);
                }
                Err(e) => return Err(backend(e)),
            }
        };

        info!(
            target: "stowage::db",
            path = %path.display(),
            read_only = options.read_only,
            no_sync = options.no_sync,
            "Opened store"
        );

        Ok(Self {
            db,
            writer: Mutex::new(()),
            path: Some(path),
            options,
        })
    }

    /// Create an empty in-memory store
    ///
    /// Nothing is persisted; the contents are lost when the store is dropped.
    pub fn ephemeral() -> StorageResult<Self> {
        Self::ephemeral_with(OpenOptions::default())
    }

    /// In-memory store honoring `timeout` and `read_only` from `options`
    pub fn ephemeral_with(options: OpenOptions) -> StorageResult<Self> {
        options.validate()?;
        let db = builder(&options)
            .create_with_backend(InMemoryBackend::new())
            .map_err(backend)?;
        Ok(Self {
            db,
            writer: Mutex::new(()),
            path: None,
            options,
        })
    }

    /// Backing file, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Options the store was opened with
    pub fn options(&self) -> &OpenOptions {
        &self.options
    }

    /// Whether write transactions are refused
    pub fn is_read_only(&self) -> bool {
        self.options.read_only
    }

    /// Begin a transaction
    ///
    /// Write transactions fail with `DatabaseReadOnly` on a read-only store
    /// and with `Timeout` if the writer lock is not available in time.
    pub fn begin(&self, writable: bool) -> StorageResult<Tx<'_>> {
        if !writable {
            let txn = self.db.begin_read().map_err(backend)?;
            return Ok(Tx::read(txn));
        }
        if self.options.read_only {
            return Err(StorageError::DatabaseReadOnly);
        }

        let guard = match self.options.timeout {
            Some(timeout) => self
                .writer
                .try_lock_for(timeout)
                .ok_or(StorageError::Timeout(timeout, "writer lock"))?,
            None => self.writer.lock(),
        };
        let mut txn = self.db.begin_write().map_err(backend)?;
        if self.options.no_sync {
            txn.set_durability(Durability::Eventual);
        }
        Ok(Tx::write(txn, guard))
    }

    /// Run `f` inside a read transaction
    pub fn view<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Tx<'_>) -> Result<T, E>,
        E: From<StorageError>,
    {
        let tx = self.begin(false)?;
        f(&tx)
    }

    /// Run `f` inside a write transaction
    ///
    /// Commits when `f` returns `Ok`, rolls back when it returns `Err`.
    pub fn update<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Tx<'_>) -> Result<T, E>,
        E: From<StorageError>,
    {
        let mut tx = self.begin(true)?;
        match f(&mut tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                tx.rollback();
                Err(e)
            }
        }
    }

    /// Close the store, releasing the file lock
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for BucketDb {
    fn drop(&mut self) {
        if let Some(path) = &self.path {
            info!(target: "stowage::db", path = %path.display(), "Closed store");
        }
    }
}

impl std::fmt::Debug for BucketDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BucketDb")
            .field("path", &self.path)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn builder(options: &OpenOptions) -> Builder {
    let mut builder = Database::builder();
    if let Some(cache_size) = options.cache_size {
        builder.set_cache_size(cache_size);
    }
    builder
}
