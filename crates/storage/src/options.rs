//! Open options for [`BucketDb`](crate::BucketDb)
//!
//! Everything here is consumed by the storage layer only; the object store
//! above forwards it untouched.

use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use stowage_core::{StorageError, StorageResult};

/// Default permission bits for files created by the store
pub const DEFAULT_FILE_MODE: u32 = 0o600;

/// Custom file-open hook
///
/// Receives the path and the prepared `std::fs::OpenOptions` (mode already
/// applied on unix). The default simply calls `options.open(path)`.
pub type OpenFileFn = Arc<dyn Fn(&Path, &fs::OpenOptions) -> io::Result<File> + Send + Sync>;

/// Options for opening a file-backed store
///
/// # Example
///
/// ```ignore
/// let options = OpenOptions::default()
///     .with_timeout(Duration::from_secs(1))
///     .with_no_sync(true);
/// let db = BucketDb::open("data.stow", options)?;
/// ```
#[derive(Clone)]
pub struct OpenOptions {
    /// Permission bits for created files (unix only)
    pub file_mode: u32,
    /// How long to wait for the file lock and the writer lock.
    /// `None` waits forever.
    pub timeout: Option<Duration>,
    /// Refuse write transactions. The file lock is still exclusive, so a
    /// read-only handle also keeps other processes out.
    pub read_only: bool,
    /// Commit without waiting for fsync; a crash may lose recent commits
    /// but never tears one
    pub no_sync: bool,
    /// Page cache size in bytes, `None` keeps the engine default
    pub cache_size: Option<usize>,
    /// Custom file-open hook
    pub open_file: Option<OpenFileFn>,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            file_mode: DEFAULT_FILE_MODE,
            timeout: None,
            read_only: false,
            no_sync: false,
            cache_size: None,
            open_file: None,
        }
    }
}

impl OpenOptions {
    /// Create options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the permission bits for created files
    pub fn with_file_mode(mut self, file_mode: u32) -> Self {
        self.file_mode = file_mode;
        self
    }

    /// Set the lock wait timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Open read-only
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Commit without fsync
    pub fn with_no_sync(mut self, no_sync: bool) -> Self {
        self.no_sync = no_sync;
        self
    }

    /// Set the page cache size in bytes
    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.cache_size = Some(cache_size);
        self
    }

    /// Install a custom file-open hook
    pub fn with_open_file<F>(mut self, open_file: F) -> Self
    where
        F: Fn(&Path, &fs::OpenOptions) -> io::Result<File> + Send + Sync + 'static,
    {
        self.open_file = Some(Arc::new(open_file));
        self
    }

    /// Check option values
    pub fn validate(&self) -> StorageResult<()> {
        if self.cache_size == Some(0) {
            return Err(StorageError::InvalidOptions(
                "cache_size must be positive".to_string(),
            ));
        }
        if self.file_mode > 0o7777 {
            return Err(StorageError::InvalidOptions(format!(
                "file_mode {:o} is not a permission mask",
                self.file_mode
            )));
        }
        Ok(())
    }

    /// Open `path` through the hook, applying `file_mode`
    pub(crate) fn open_path(&self, path: &Path, options: &mut fs::OpenOptions) -> io::Result<File> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(self.file_mode);
        }
        match &self.open_file {
            Some(open_file) => open_file(path, options),
            None => options.open(path),
        }
    }
}

impl fmt::Debug for OpenOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenOptions")
            .field("file_mode", &format_args!("{:o}", self.file_mode))
            .field("timeout", &self.timeout)
            .field("read_only", &self.read_only)
            .field("no_sync", &self.no_sync)
            .field("cache_size", &self.cache_size)
            .field("open_file", &self.open_file.is_some())
            .finish()
    }
}
