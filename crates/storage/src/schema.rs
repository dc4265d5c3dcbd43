//! Table layout and limits
//!
//! Each bucket is its own redb table. A single registry table maps every
//! bucket name to the bucket's sequence counter, so a bucket exists exactly
//! when it has a registry entry.

use std::fmt::Write;

use redb::TableDefinition;
use stowage_core::{StorageError, StorageResult};

/// Maximum key (and bucket name) length in bytes
pub const MAX_KEY_SIZE: usize = 32768;

/// Maximum value length in bytes
pub const MAX_VALUE_SIZE: usize = (1 << 31) - 2;

/// Bucket registry: name -> sequence
pub(crate) const REGISTRY: TableDefinition<&[u8], u64> = TableDefinition::new("stowage:buckets");

const DATA_PREFIX: &str = "bucket:";

/// Definition of one bucket's data table
pub(crate) type DataTable<'n> = TableDefinition<'n, &'static [u8], &'static [u8]>;

/// Table name for the bucket called `name`
///
/// Bucket names are arbitrary bytes; table names must be strings, so the
/// name is hex encoded.
pub(crate) fn table_name(name: &[u8]) -> String {
    let mut table = String::with_capacity(DATA_PREFIX.len() + name.len() * 2);
    table.push_str(DATA_PREFIX);
    for byte in name {
        let _ = write!(table, "{byte:02x}");
    }
    table
}

pub(crate) fn data_table(table: &str) -> DataTable<'_> {
    TableDefinition::new(table)
}

/// Map any redb failure onto the storage error type
pub(crate) fn backend(e: impl Into<redb::Error>) -> StorageError {
    match e.into() {
        redb::Error::Io(e) => StorageError::Io(e),
        redb::Error::Corrupted(msg) => StorageError::Corruption(msg),
        other => StorageError::Backend(Box::new(other)),
    }
}

/// Check a bucket name against the key rules
pub(crate) fn check_bucket_name(name: &[u8]) -> StorageResult<()> {
    if name.is_empty() {
        return Err(StorageError::BucketNameRequired);
    }
    if name.len() > MAX_KEY_SIZE {
        return Err(StorageError::KeyTooLarge {
            len: name.len(),
            max: MAX_KEY_SIZE,
        });
    }
    Ok(())
}

/// Check a key
pub(crate) fn check_key(key: &[u8]) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::KeyRequired);
    }
    if key.len() > MAX_KEY_SIZE {
        return Err(StorageError::KeyTooLarge {
            len: key.len(),
            max: MAX_KEY_SIZE,
        });
    }
    Ok(())
}

/// Check a value
pub(crate) fn check_value(value: &[u8]) -> StorageResult<()> {
    if value.len() > MAX_VALUE_SIZE {
        return Err(StorageError::ValueTooLarge {
            len: value.len(),
            max: MAX_VALUE_SIZE,
        });
    }
    Ok(())
}
