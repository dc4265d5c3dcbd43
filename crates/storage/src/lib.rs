//! Storage layer for stowage
//!
//! This crate adapts redb into the ordered, transactional bucket store the
//! object layer sits on:
//! - BucketDb: store handle, file-backed or in-memory
//! - Tx: snapshot read transactions and a single serialized writer
//! - Bucket / BucketMut / Cursor: ordered key/value access per bucket
//! - OpenOptions: construction-time configuration
//!
//! # Layout
//!
//! Every bucket is a redb table. A registry table records which buckets
//! exist together with each bucket's sequence counter, so the counter
//! commits and rolls back with the records it numbered.
//!
//! # Durability
//!
//! Commits are copy-on-write page updates; a crash leaves either the old or
//! the new state. With `no_sync` a commit skips the fsync and may be lost,
//! but is never torn.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bucket;
pub mod db;
pub mod options;
mod schema;
pub mod tx;

pub use bucket::{Bucket, BucketMut, Cursor};
pub use db::BucketDb;
pub use options::{OpenFileFn, OpenOptions, DEFAULT_FILE_MODE};
pub use schema::{MAX_KEY_SIZE, MAX_VALUE_SIZE};
pub use tx::Tx;
