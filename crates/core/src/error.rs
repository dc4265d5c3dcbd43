//! Error types for stowage
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! - [`Error`]: what callers of the object store see
//! - [`StorageError`]: failures raised by the ordered bucket store
//! - [`CodecError`]: failures raised by an [`Encoding`](crate::Encoding)

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for stowage operations
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for the storage layer
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Error types for the object store
///
/// None of these are retried internally; retry policy belongs to the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// The bucket or the key is absent on a required read or delete
    #[error("not found: bucket \"{}\" key \"{}\"", .bucket.escape_ascii(), .key.escape_ascii())]
    NotFound {
        /// Bucket that was searched
        bucket: Vec<u8>,
        /// Key that was searched (empty when a scan found nothing)
        key: Vec<u8>,
    },

    /// A put guarded by `fail_if_exists` found an existing record
    #[error("already exists: bucket \"{}\" key \"{}\"", .bucket.escape_ascii(), .key.escape_ascii())]
    AlreadyExists {
        /// Bucket that holds the record
        bucket: Vec<u8>,
        /// Key of the existing record
        key: Vec<u8>,
    },

    /// Encoding an entity failed
    #[error("encode {type_name} \"{}\": {source}", .key.escape_ascii())]
    Encode {
        /// Rust type name of the entity
        type_name: &'static str,
        /// Key of the entity
        key: Vec<u8>,
        /// Underlying codec failure
        #[source]
        source: CodecError,
    },

    /// Decoding a record failed
    #[error("decode {type_name} \"{}\": {source}", .key.escape_ascii())]
    Decode {
        /// Rust type name of the entity
        type_name: &'static str,
        /// Key of the record
        key: Vec<u8>,
        /// Underlying codec failure
        #[source]
        source: CodecError,
    },

    /// A before-persist hook refused the entity
    #[error("rejected {type_name}: {reason}")]
    Rejected {
        /// Rust type name of the entity
        type_name: &'static str,
        /// Why the hook refused it
        reason: String,
    },

    /// Storage layer error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Build a `NotFound` error
    pub fn not_found(bucket: &[u8], key: &[u8]) -> Self {
        Error::NotFound {
            bucket: bucket.to_vec(),
            key: key.to_vec(),
        }
    }

    /// Build an `AlreadyExists` error
    pub fn already_exists(bucket: &[u8], key: &[u8]) -> Self {
        Error::AlreadyExists {
            bucket: bucket.to_vec(),
            key: key.to_vec(),
        }
    }

    /// Build a `Rejected` error for entity type `T`
    pub fn rejected<T: ?Sized>(reason: impl Into<String>) -> Self {
        Error::Rejected {
            type_name: std::any::type_name::<T>(),
            reason: reason.into(),
        }
    }

    /// Whether this is a `NotFound` error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Whether this is an `AlreadyExists` error
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Error::AlreadyExists { .. })
    }
}

/// Errors raised by the ordered bucket store
#[derive(Debug, Error)]
pub enum StorageError {
    /// Write attempted through a read-only transaction
    #[error("transaction is not writable")]
    TxNotWritable,

    /// Write transaction requested on a database opened read-only
    #[error("database is read-only")]
    DatabaseReadOnly,

    /// Bucket names must be non-empty
    #[error("bucket name required")]
    BucketNameRequired,

    /// Keys must be non-empty
    #[error("key required")]
    KeyRequired,

    /// Key exceeds the maximum key size
    #[error("key too large: {len} bytes (max {max})")]
    KeyTooLarge {
        /// Actual key length
        len: usize,
        /// Maximum key length
        max: usize,
    },

    /// Value exceeds the maximum value size
    #[error("value too large: {len} bytes (max {max})")]
    ValueTooLarge {
        /// Actual value length
        len: usize,
        /// Maximum value length
        max: usize,
    },

    /// Per-bucket sequence cannot advance further
    #[error("sequence overflow")]
    SequenceOverflow,

    /// A lock could not be acquired in time
    #[error("timed out after {0:?} waiting for {1}")]
    Timeout(Duration, &'static str),

    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Data corruption detected
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// Any other failure reported by the storage engine
    #[error("Storage engine error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    /// Rejected open options
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
}

/// Errors raised by an encoding strategy
#[derive(Debug, Error)]
pub enum CodecError {
    /// bincode failure
    #[error("bincode: {0}")]
    Bincode(#[from] bincode::Error),

    /// JSON failure
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// MessagePack encode failure
    #[error("msgpack: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    /// MessagePack decode failure
    #[error("msgpack: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    /// XML failure
    #[error("xml: {0}")]
    Xml(#[from] quick_xml::DeError),

    /// Reading or writing the underlying stream failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Unknown encoding name
    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),
}
