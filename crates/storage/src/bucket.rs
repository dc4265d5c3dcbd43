//! Bucket handles and cursors
//!
//! - [`Bucket`]: read view, valid for the life of its transaction borrow
//! - [`BucketMut`]: write view, only handed out by writable transactions
//! - [`Cursor`]: forward iterator in ascending byte-lexicographic key order
//!
//! Handles copy keys and values out of the engine, so nothing returned here
//! borrows an open table.

use std::fmt;
use std::ops::Bound;
use std::sync::Arc;

use redb::{ReadOnlyTable, ReadableTable, ReadableTableMetadata, WriteTransaction};
use stowage_core::{SequenceSource, StorageError, StorageResult};

use crate::schema::{backend, check_key, check_value, data_table, REGISTRY};

pub(crate) type Snapshot = ReadOnlyTable<&'static [u8], &'static [u8]>;

type Record = (Vec<u8>, Vec<u8>);

#[derive(Clone)]
pub(crate) enum Source<'t> {
    /// Table pinned by a read transaction
    Snapshot(Arc<Snapshot>),
    /// Opened on demand inside the write transaction
    Write(&'t WriteTransaction),
}

// Runs `$body` with `$t` bound to the bucket's table, whichever side it
// lives on.
macro_rules! with_table {
    ($source:expr, $table:expr, |$t:ident| $body:expr) => {
        match $source {
            Source::Snapshot(snapshot) => {
                let $t = snapshot.as_ref();
                $body
            }
            Source::Write(txn) => {
                let opened = txn.open_table(data_table($table)).map_err(backend)?;
                let $t = &opened;
                $body
            }
        }
    };
}

fn get_in<T>(table: &T, key: &[u8]) -> StorageResult<Option<Vec<u8>>>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    Ok(table.get(key).map_err(backend)?.map(|v| v.value().to_vec()))
}

fn first_from<T>(table: &T, lower: Bound<&[u8]>) -> StorageResult<Option<Record>>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    let upper: Bound<&[u8]> = Bound::Unbounded;
    let mut range = table.range::<&[u8]>((lower, upper)).map_err(backend)?;
    match range.next() {
        Some(entry) => {
            let (k, v) = entry.map_err(backend)?;
            Ok(Some((k.value().to_vec(), v.value().to_vec())))
        }
        None => Ok(None),
    }
}

/// Read-only view of a bucket
#[derive(Clone)]
pub struct Bucket<'t> {
    name: Vec<u8>,
    table: String,
    sequence: u64,
    source: Source<'t>,
}

impl<'t> Bucket<'t> {
    pub(crate) fn new(name: &[u8], table: String, sequence: u64, source: Source<'t>) -> Self {
        Self {
            name: name.to_vec(),
            table,
            sequence,
            source,
        }
    }

    /// Bucket name
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    /// Value stored at `key`
    pub fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        if key.is_empty() {
            return Ok(None);
        }
        with_table!(&self.source, &self.table, |t| get_in(t, key))
    }

    /// Whether `key` holds a value
    pub fn contains(&self, key: &[u8]) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Forward cursor over the bucket
    pub fn cursor(&self) -> Cursor<'t> {
        Cursor {
            bucket: self.clone(),
            position: Position::Start,
        }
    }

    /// Number of records
    pub fn len(&self) -> StorageResult<u64> {
        with_table!(&self.source, &self.table, |t| t.len().map_err(backend))
    }

    /// Whether the bucket holds no records
    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Last value handed out by `next_sequence`
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    fn first_from(&self, lower: Bound<&[u8]>) -> StorageResult<Option<Record>> {
        with_table!(&self.source, &self.table, |t| first_from(t, lower))
    }
}

impl fmt::Debug for Bucket<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bucket")
            .field("name", &self.name.escape_ascii().to_string())
            .field("sequence", &self.sequence)
            .field("writable", &matches!(self.source, Source::Write(_)))
            .finish()
    }
}

/// Writable view of a bucket
pub struct BucketMut<'t> {
    txn: &'t WriteTransaction,
    name: Vec<u8>,
    table: String,
}

impl<'t> BucketMut<'t> {
    pub(crate) fn new(txn: &'t WriteTransaction, name: &[u8], table: String) -> Self {
        Self {
            txn,
            name: name.to_vec(),
            table,
        }
    }

    /// Bucket name
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    /// Value stored at `key`
    pub fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        if key.is_empty() {
            return Ok(None);
        }
        let table = self.txn.open_table(data_table(&self.table)).map_err(backend)?;
        get_in(&table, key)
    }

    /// Whether `key` holds a value
    pub fn contains(&self, key: &[u8]) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Number of records
    pub fn len(&self) -> StorageResult<u64> {
        let table = self.txn.open_table(data_table(&self.table)).map_err(backend)?;
        table.len().map_err(backend)
    }

    /// Whether the bucket holds no records
    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Store `value` at `key`, replacing any previous value
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        check_key(key)?;
        check_value(value)?;
        let mut table = self.txn.open_table(data_table(&self.table)).map_err(backend)?;
        table.insert(key, value).map_err(backend)?;
        Ok(())
    }

    /// Remove `key`; returns whether it held a value
    pub fn delete(&mut self, key: &[u8]) -> StorageResult<bool> {
        check_key(key)?;
        let mut table = self.txn.open_table(data_table(&self.table)).map_err(backend)?;
        let removed = table.remove(key).map_err(backend)?;
        Ok(removed.is_some())
    }

    /// Last value handed out by `next_sequence`
    pub fn sequence(&self) -> StorageResult<u64> {
        let registry = self.txn.open_table(REGISTRY).map_err(backend)?;
        let sequence = registry.get(self.name.as_slice()).map_err(backend)?;
        Ok(sequence.map(|s| s.value()).unwrap_or(0))
    }

    /// Overwrite the sequence counter
    pub fn set_sequence(&mut self, sequence: u64) -> StorageResult<()> {
        let mut registry = self.txn.open_table(REGISTRY).map_err(backend)?;
        registry
            .insert(self.name.as_slice(), sequence)
            .map_err(backend)?;
        Ok(())
    }

    /// Advance the sequence counter and return the new value
    pub fn next_sequence(&mut self) -> StorageResult<u64> {
        let next = self
            .sequence()?
            .checked_add(1)
            .ok_or(StorageError::SequenceOverflow)?;
        self.set_sequence(next)?;
        Ok(next)
    }
}

impl SequenceSource for BucketMut<'_> {
    fn next_sequence(&mut self) -> StorageResult<u64> {
        BucketMut::next_sequence(self)
    }
}

impl fmt::Debug for BucketMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketMut")
            .field("name", &self.name.escape_ascii().to_string())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
enum Position {
    Start,
    After(Vec<u8>),
    End,
}

/// Forward cursor over a bucket
///
/// Unpositioned cursors start at the first key. `seek` repositions at the
/// first key `>=` the target; iteration then continues from there. Each
/// step looks up the successor of the last key returned, so the cursor
/// holds no engine iterator between steps.
#[derive(Debug)]
pub struct Cursor<'t> {
    bucket: Bucket<'t>,
    position: Position,
}

impl Cursor<'_> {
    /// Move to the first record
    pub fn first(&mut self) -> StorageResult<Option<Record>> {
        self.step(Bound::Unbounded)
    }

    /// Move to the first record whose key is `>= key`
    pub fn seek(&mut self, key: &[u8]) -> StorageResult<Option<Record>> {
        self.step(Bound::Included(key))
    }

    fn step(&mut self, lower: Bound<&[u8]>) -> StorageResult<Option<Record>> {
        let found = self.bucket.first_from(lower)?;
        self.position = match &found {
            Some((key, _)) => Position::After(key.clone()),
            None => Position::End,
        };
        Ok(found)
    }
}

impl Iterator for Cursor<'_> {
    type Item = StorageResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = match std::mem::replace(&mut self.position, Position::End) {
            Position::Start => self.step(Bound::Unbounded),
            Position::After(last) => self.step(Bound::Excluded(last.as_slice())),
            Position::End => return None,
        };
        result.transpose()
    }
}
