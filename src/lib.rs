//! Stowage - typed object persistence over an ordered bucket store
//!
//! Stowage stores Rust values in named buckets of an ordered, byte-keyed,
//! transactional key/value store. A type becomes storable by naming its
//! bucket and key; the store takes care of encoding, existence conditions,
//! batches and filtered scans.
//!
//! # Quick Start
//!
//! ```ignore
//! use stowage::{key, Condition, Entity, HasBucket, Store};
//!
//! #[derive(Default, Serialize, Deserialize)]
//! struct Person { id: String, age: u32 }
//!
//! impl HasBucket for Person {
//!     fn bucket(&self) -> Vec<u8> { b"person".to_vec() }
//! }
//!
//! impl Entity for Person {
//!     fn key(&self) -> Vec<u8> { key::str_key(&self.id) }
//! }
//!
//! let store = Store::open("people.stow")?;
//! store.put(&mut Person { id: "alice".into(), age: 30 }, Some(&Condition::new().fail_if_exists()))?;
//! let everyone: Vec<Person> = store.scan(None)?;
//! ```
//!
//! # Architecture
//!
//! - `stowage-core`: entity contract, encodings, filters, conditions, errors
//! - `stowage-storage`: the ordered transactional bucket store
//! - `stowage-engine`: the [`Store`] facade and its configuration

pub use stowage_core::*;
pub use stowage_engine::*;
pub use stowage_storage::{
    Bucket, BucketDb, BucketMut, Cursor, OpenOptions, Tx, MAX_KEY_SIZE, MAX_VALUE_SIZE,
};
