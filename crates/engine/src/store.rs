//! The object store
//!
//! [`Store`] persists typed entities in a [`BucketDb`]. Every operation runs
//! in exactly one transaction: read-only for reads, read-write for
//! mutations. A mutation commits only when every step succeeded; any error
//! drops the transaction, which rolls it back.
//!
//! # Example
//!
//! ```ignore
//! let store = Store::open("people.stow")?;
//!
//! let mut alice = Person { id: "alice".into(), age: 30 };
//! store.put(&mut alice, None)?;
//!
//! let adults = store.scan::<Person>(Some(&Filter::new().when(|p| Decision::keep_if(p.age >= 18))))?;
//! ```

use std::path::Path;
use std::sync::Arc;

use stowage_core::{
    CodecError, Condition, ConditionExt, Decision, Encoding, Entity, Error, Filter, HasBucket,
    Result, Storable,
};
use stowage_storage::{BucketDb, OpenOptions, Tx};
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::scan::Scanner;

/// Typed object store over a [`BucketDb`]
///
/// Cheap to clone; clones share the underlying store.
#[derive(Debug, Clone)]
pub struct Store {
    db: Arc<BucketDb>,
    encoding: Encoding,
}

fn decode_error(type_name: &'static str, key: &[u8], source: CodecError) -> Error {
    Error::Decode {
        type_name,
        key: key.to_vec(),
        source,
    }
}

fn decode_as<E: Entity>(encoding: Encoding, key: &[u8], value: &[u8]) -> Result<E> {
    encoding
        .from_slice(value)
        .map_err(|source| decode_error(std::any::type_name::<E>(), key, source))
}

impl Store {
    // ========================================================================
    // Construction
    // ========================================================================

    /// Open (creating if missing) a file-backed store with default options
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, OpenOptions::default(), Encoding::default())
    }

    /// Open a file-backed store with explicit options and default encoding
    pub fn open_with(
        path: impl AsRef<Path>,
        options: OpenOptions,
        encoding: Encoding,
    ) -> Result<Self> {
        let db = BucketDb::open(path, options)?;
        info!(target: "stowage::db", %encoding, "Store ready");
        Ok(Self::wrap(Arc::new(db)).with_encoding(encoding))
    }

    /// Open a file-backed store as described by `config`
    pub fn open_with_config(path: impl AsRef<Path>, config: &StoreConfig) -> Result<Self> {
        config.validate()?;
        Self::open_with(path, config.open_options(), config.encoding()?)
    }

    /// In-memory store, discarded on drop
    pub fn ephemeral() -> Result<Self> {
        Ok(Self::wrap(Arc::new(BucketDb::ephemeral()?)))
    }

    /// Wrap an already open bucket store, using the default encoding
    pub fn wrap(db: Arc<BucketDb>) -> Self {
        Self {
            db,
            encoding: Encoding::default(),
        }
    }

    /// Same store, different default encoding
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// The wrapped bucket store
    pub fn inner(&self) -> &Arc<BucketDb> {
        &self.db
    }

    /// Default encoding for entities without an override
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    fn encoding_for(&self, entity: &dyn Storable) -> Encoding {
        entity.preferred_encoding().unwrap_or(self.encoding)
    }

    // ========================================================================
    // Single-object operations
    // ========================================================================

    /// Load `entity` from the record at its key, decoding in place
    ///
    /// # Errors
    ///
    /// `NotFound` when the bucket or key is absent, unless the condition
    /// ignores absence (then `entity` is left untouched).
    pub fn get<E: Entity>(&self, entity: &mut E, condition: Option<&Condition>) -> Result<()> {
        let condition = condition.or_empty();
        self.db.view(|tx| self.get_in(tx, entity, condition))
    }

    /// Store `entity`, running its before-persist hook first
    ///
    /// # Errors
    ///
    /// `AlreadyExists` / `NotFound` per the condition, `Encode` if the
    /// entity cannot be encoded, or whatever the hook returns.
    pub fn put<E: Entity>(&self, entity: &mut E, condition: Option<&Condition>) -> Result<()> {
        let condition = condition.or_empty();
        self.db.update(|tx| self.put_in(tx, entity, condition))
    }

    /// Remove the record at `entity`'s key
    ///
    /// A missing record is only an error with `fail_if_absent`.
    pub fn delete<E: Entity>(&self, entity: &E, condition: Option<&Condition>) -> Result<()> {
        let condition = condition.or_empty();
        self.db.update(|tx| self.delete_in(tx, entity, condition))
    }

    /// Whether a record exists at `entity`'s key
    pub fn exist<E: Entity>(&self, entity: &E) -> Result<bool> {
        let bucket = entity.bucket();
        let key = entity.key();
        self.db.view(|tx| match tx.bucket(&bucket)? {
            Some(b) => Ok(b.contains(&key)?),
            None => Ok(false),
        })
    }

    // ========================================================================
    // Batches
    // ========================================================================

    /// `get` for each entity, inside one read transaction
    ///
    /// The first failure aborts the batch; entities before it keep the
    /// values they were loaded with.
    pub fn mget(&self, entities: &mut [&mut dyn Storable], condition: Option<&Condition>) -> Result<()> {
        let condition = condition.or_empty();
        self.db.view(|tx| {
            entities
                .iter_mut()
                .try_for_each(|entity| self.get_in(tx, &mut **entity, condition))
        })
    }

    /// `put` for each entity, all or nothing
    pub fn mput(&self, entities: &mut [&mut dyn Storable], condition: Option<&Condition>) -> Result<()> {
        let condition = condition.or_empty();
        self.db.update(|tx| {
            entities
                .iter_mut()
                .try_for_each(|entity| self.put_in(tx, &mut **entity, condition))
        })?;
        debug!(target: "stowage::db", count = entities.len(), "Batch stored");
        Ok(())
    }

    /// `delete` for each entity, all or nothing
    pub fn mdelete(&self, entities: &[&dyn Storable], condition: Option<&Condition>) -> Result<()> {
        let condition = condition.or_empty();
        self.db.update(|tx| {
            entities
                .iter()
                .try_for_each(|entity| self.delete_in(tx, *entity, condition))
        })
    }

    // ========================================================================
    // Scans
    // ========================================================================

    /// Every accepted entity of type `E`, in ascending key order
    ///
    /// The bucket comes from `E::default()`. An absent bucket yields an
    /// empty result.
    pub fn scan<E: Entity + Default>(&self, filter: Option<&Filter<E>>) -> Result<Vec<E>> {
        self.scan_like(&E::default(), filter)
    }

    /// [`Store::scan`] over the bucket and encoding of `prototype`
    pub fn scan_like<E: Entity>(&self, prototype: &E, filter: Option<&Filter<E>>) -> Result<Vec<E>> {
        let bucket_name = prototype.bucket();
        let encoding = self.encoding_for(prototype);
        self.db.view(|tx| {
            let mut out = Vec::new();
            let Some(bucket) = tx.bucket(&bucket_name)? else {
                return Ok(out);
            };
            let mut scanner = Scanner::new(bucket, filter);
            while let Some((key, value)) = scanner.next_candidate()? {
                let entity: E = decode_as(encoding, &key, &value)?;
                if scanner.judge(&entity).is_accept() {
                    out.push(entity);
                }
            }
            Ok(out)
        })
    }

    /// Replace `entity` with the first accepted record of its bucket
    ///
    /// # Errors
    ///
    /// `NotFound` (with an empty key) when nothing is accepted.
    pub fn first<E: Entity>(&self, entity: &mut E, filter: Option<&Filter<E>>) -> Result<()> {
        let bucket_name = entity.bucket();
        let encoding = self.encoding_for(entity);
        let found = self.db.view(|tx| {
            let Some(bucket) = tx.bucket(&bucket_name)? else {
                return Ok(None);
            };
            let mut scanner = Scanner::new(bucket, filter);
            while let Some((key, value)) = scanner.next_candidate()? {
                let candidate: E = decode_as(encoding, &key, &value)?;
                match scanner.judge(&candidate) {
                    Decision::Accept => return Ok(Some(candidate)),
                    Decision::Skip => continue,
                    Decision::Stop => break,
                }
            }
            Ok::<_, Error>(None)
        })?;

        match found {
            Some(value) => {
                *entity = value;
                Ok(())
            }
            None => Err(Error::not_found(&bucket_name, &[])),
        }
    }

    /// Number of accepted records in `entity`'s bucket
    ///
    /// Records are decoded only when the filter has entity predicates.
    pub fn count<E: Entity>(&self, entity: &E, filter: Option<&Filter<E>>) -> Result<u64> {
        let bucket_name = entity.bucket();
        let encoding = self.encoding_for(entity);
        self.db.view(|tx| {
            let Some(bucket) = tx.bucket(&bucket_name)? else {
                return Ok(0);
            };
            if filter.is_none() {
                return Ok(bucket.len()?);
            }

            let mut scanner = Scanner::new(bucket, filter);
            let decode = scanner.needs_decode();
            let mut count = 0u64;
            while let Some((key, value)) = scanner.next_candidate()? {
                if decode {
                    let candidate: E = decode_as(encoding, &key, &value)?;
                    if !scanner.judge(&candidate).is_accept() {
                        continue;
                    }
                }
                count += 1;
            }
            Ok(count)
        })
    }

    // ========================================================================
    // Buckets
    // ========================================================================

    /// Drop the buckets named by `buckets`; absent ones are ignored
    pub fn delete_bucket(&self, buckets: &[&dyn HasBucket]) -> Result<()> {
        self.db.update(|tx| {
            for owner in buckets {
                let name = owner.bucket();
                if tx.delete_bucket(&name)? {
                    debug!(target: "stowage::db", bucket = %name.escape_ascii(), "Bucket dropped");
                }
            }
            Ok(())
        })
    }

    /// Drop every bucket
    pub fn delete_all_buckets(&self) -> Result<()> {
        self.db.update(|tx| {
            let names = tx.bucket_names()?;
            for name in &names {
                tx.delete_bucket(name)?;
            }
            debug!(target: "stowage::db", count = names.len(), "All buckets dropped");
            Ok(())
        })
    }

    // ========================================================================
    // Raw transactions
    // ========================================================================

    /// Run `f` in a read transaction on the underlying store
    pub fn view<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Tx<'_>) -> Result<T>,
    {
        self.db.view(f)
    }

    /// Run `f` in a write transaction on the underlying store
    ///
    /// Commits when `f` returns `Ok`.
    pub fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Tx<'_>) -> Result<T>,
    {
        self.db.update(f)
    }

    // ========================================================================
    // Per-transaction steps
    // ========================================================================

    fn get_in(&self, tx: &Tx<'_>, entity: &mut dyn Storable, condition: Condition) -> Result<()> {
        let bucket_name = entity.bucket();
        let key = entity.storage_key();
        let record = match tx.bucket(&bucket_name)? {
            Some(bucket) => bucket.get(&key)?,
            None => None,
        };

        match record {
            Some(bytes) => {
                let type_name = entity.type_name();
                let encoding = self.encoding_for(entity);
                entity
                    .decode_record(encoding, &bytes)
                    .map_err(|source| decode_error(type_name, &key, source))
            }
            None if condition.ignores_absent() => Ok(()),
            None => Err(Error::not_found(&bucket_name, &key)),
        }
    }

    fn put_in(&self, tx: &mut Tx<'_>, entity: &mut dyn Storable, condition: Condition) -> Result<()> {
        let bucket_name = entity.bucket();
        if condition.fails_absent() && tx.bucket(&bucket_name)?.is_none() {
            return Err(Error::not_found(&bucket_name, &entity.storage_key()));
        }

        let mut bucket = tx.create_bucket_if_absent(&bucket_name)?;

        if condition.probes_existence() {
            let key = entity.storage_key();
            let exists = bucket.contains(&key)?;
            if exists && condition.ignores_existing() {
                return Ok(());
            }
            if exists && condition.fails_existing() {
                return Err(Error::already_exists(&bucket_name, &key));
            }
            if !exists && condition.fails_absent() {
                return Err(Error::not_found(&bucket_name, &key));
            }
        }

        entity.prepare(&mut bucket)?;

        let key = entity.storage_key();
        let bytes = entity
            .encode_record(self.encoding_for(entity))
            .map_err(|source| Error::Encode {
                type_name: entity.type_name(),
                key: key.clone(),
                source,
            })?;
        bucket.put(&key, &bytes)?;
        Ok(())
    }

    fn delete_in(&self, tx: &mut Tx<'_>, entity: &dyn Storable, condition: Condition) -> Result<()> {
        let bucket_name = entity.bucket();
        let key = entity.storage_key();

        // An empty key never holds a record
        let deleted = if key.is_empty() {
            false
        } else {
            match tx.bucket_mut(&bucket_name)? {
                Some(mut bucket) => bucket.delete(&key)?,
                None => false,
            }
        };
        if !deleted && condition.fails_absent() {
            return Err(Error::not_found(&bucket_name, &key));
        }
        Ok(())
    }
}
