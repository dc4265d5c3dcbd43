//! Transactions over a [`BucketDb`]
//!
//! A read transaction pins a redb snapshot and never blocks. A write
//! transaction holds the writer guard and a redb write transaction;
//! `commit` makes its changes durable, anything else (explicit `rollback`,
//! an error, or drop) aborts it.
//!
//! [`BucketDb`]: crate::BucketDb

use std::sync::Arc;

use parking_lot::MutexGuard;
use redb::{ReadOnlyTable, ReadTransaction, ReadableTable, TableError, WriteTransaction};
use stowage_core::{StorageError, StorageResult};
use tracing::{debug, warn};

use crate::bucket::{Bucket, BucketMut, Source};
use crate::schema::{backend, check_bucket_name, data_table, table_name, REGISTRY};

enum TxState<'db> {
    Read(ReadTransaction),
    Write {
        txn: WriteTransaction,
        _guard: MutexGuard<'db, ()>,
    },
}

type Registry = ReadOnlyTable<&'static [u8], u64>;

/// A read or write transaction
pub struct Tx<'db> {
    state: Option<TxState<'db>>,
}

impl<'db> Tx<'db> {
    pub(crate) fn read(txn: ReadTransaction) -> Self {
        debug!(target: "stowage::txn", writable = false, "Transaction started");
        Self {
            state: Some(TxState::Read(txn)),
        }
    }

    pub(crate) fn write(txn: WriteTransaction, guard: MutexGuard<'db, ()>) -> Self {
        debug!(target: "stowage::txn", writable = true, "Transaction started");
        Self {
            state: Some(TxState::Write { txn, _guard: guard }),
        }
    }

    fn state(&self) -> &TxState<'db> {
        match &self.state {
            Some(state) => state,
            None => unreachable!("transaction used after completion"),
        }
    }

    fn write_txn(&self) -> StorageResult<&WriteTransaction> {
        match &self.state {
            Some(TxState::Write { txn, .. }) => Ok(txn),
            _ => Err(StorageError::TxNotWritable),
        }
    }

    /// Whether this transaction may write
    pub fn is_writable(&self) -> bool {
        matches!(self.state, Some(TxState::Write { .. }))
    }

    /// Read view of the named bucket, `None` if it does not exist
    pub fn bucket(&self, name: &[u8]) -> StorageResult<Option<Bucket<'_>>> {
        if name.is_empty() {
            return Ok(None);
        }
        match self.state() {
            TxState::Read(txn) => {
                let Some(registry) = read_registry(txn)? else {
                    return Ok(None);
                };
                let Some(sequence) = registry.get(name).map_err(backend)? else {
                    return Ok(None);
                };
                let table = table_name(name);
                let snapshot = txn.open_table(data_table(&table)).map_err(backend)?;
                let source = Source::Snapshot(Arc::new(snapshot));
                Ok(Some(Bucket::new(name, table, sequence.value(), source)))
            }
            TxState::Write { txn, .. } => {
                let sequence = {
                    let registry = txn.open_table(REGISTRY).map_err(backend)?;
                    let found = registry.get(name).map_err(backend)?;
                    found.map(|s| s.value())
                };
                Ok(sequence.map(|sequence| {
                    Bucket::new(name, table_name(name), sequence, Source::Write(txn))
                }))
            }
        }
    }

    /// Write view of the named bucket, if it exists
    pub fn bucket_mut(&mut self, name: &[u8]) -> StorageResult<Option<BucketMut<'_>>> {
        let txn = self.write_txn()?;
        if name.is_empty() || !registered(txn, name)? {
            return Ok(None);
        }
        Ok(Some(BucketMut::new(txn, name, table_name(name))))
    }

    /// Write view of the named bucket, creating it empty if needed
    pub fn create_bucket_if_absent(&mut self, name: &[u8]) -> StorageResult<BucketMut<'_>> {
        check_bucket_name(name)?;
        let txn = self.write_txn()?;
        let table = table_name(name);
        if !registered(txn, name)? {
            txn.open_table(REGISTRY)
                .map_err(backend)?
                .insert(name, 0u64)
                .map_err(backend)?;
            txn.open_table(data_table(&table)).map_err(backend)?;
            debug!(target: "stowage::txn", bucket = %name.escape_ascii(), "Bucket created");
        }
        Ok(BucketMut::new(txn, name, table))
    }

    /// Remove the named bucket and everything in it; returns whether it existed
    ///
    /// An empty name never names a bucket, so it reports `false`.
    pub fn delete_bucket(&mut self, name: &[u8]) -> StorageResult<bool> {
        let txn = self.write_txn()?;
        if name.is_empty() {
            return Ok(false);
        }
        let existed = {
            let mut registry = txn.open_table(REGISTRY).map_err(backend)?;
            let removed = registry.remove(name).map_err(backend)?;
            removed.is_some()
        };
        if existed {
            txn.delete_table(data_table(&table_name(name)))
                .map_err(backend)?;
        }
        Ok(existed)
    }

    /// Names of all buckets in ascending order
    pub fn bucket_names(&self) -> StorageResult<Vec<Vec<u8>>> {
        match self.state() {
            TxState::Read(txn) => match read_registry(txn)? {
                Some(registry) => names_in(&registry),
                None => Ok(Vec::new()),
            },
            TxState::Write { txn, .. } => {
                let registry = txn.open_table(REGISTRY).map_err(backend)?;
                names_in(&registry)
            }
        }
    }

    /// Make the changes durable and visible
    ///
    /// Committing a read transaction fails with `TxNotWritable`. A failed
    /// commit leaves the previously committed state in place.
    pub fn commit(mut self) -> StorageResult<()> {
        match self.state.take() {
            Some(TxState::Write { txn, _guard }) => match txn.commit() {
                Ok(()) => {
                    debug!(target: "stowage::txn", "Transaction committed");
                    Ok(())
                }
                Err(e) => {
                    warn!(target: "stowage::txn", error = %e, "Transaction aborted");
                    Err(backend(e))
                }
            },
            state => {
                self.state = state;
                Err(StorageError::TxNotWritable)
            }
        }
    }

    /// Discard the transaction
    pub fn rollback(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        match self.state.take() {
            Some(TxState::Write { txn, _guard }) => {
                if let Err(e) = txn.abort() {
                    warn!(target: "stowage::txn", error = %e, "Abort failed");
                }
                debug!(target: "stowage::txn", writable = true, "Transaction rolled back");
            }
            Some(TxState::Read(_)) => {
                debug!(target: "stowage::txn", writable = false, "Transaction rolled back");
            }
            None => {}
        }
    }
}

fn read_registry(txn: &ReadTransaction) -> StorageResult<Option<Registry>> {
    match txn.open_table(REGISTRY) {
        Ok(registry) => Ok(Some(registry)),
        // Nothing has been written yet
        Err(TableError::TableDoesNotExist(_)) => Ok(None),
        Err(e) => Err(backend(e)),
    }
}

fn registered(txn: &WriteTransaction, name: &[u8]) -> StorageResult<bool> {
    let registry = txn.open_table(REGISTRY).map_err(backend)?;
    let found = registry.get(name).map_err(backend)?;
    Ok(found.is_some())
}

fn names_in<T>(registry: &T) -> StorageResult<Vec<Vec<u8>>>
where
    T: ReadableTable<&'static [u8], u64>,
{
    registry
        .iter()
        .map_err(backend)?
        .map(|entry| {
            let (name, _) = entry.map_err(backend)?;
            Ok(name.value().to_vec())
        })
        .collect()
}

impl Drop for Tx<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}

impl std::fmt::Debug for Tx<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tx")
            .field("writable", &self.is_writable())
            .field("open", &self.state.is_some())
            .finish()
    }
}
