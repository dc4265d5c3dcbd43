//! Core types and traits for stowage
//!
//! This crate defines the foundational types used throughout the system:
//! - Error: Error type hierarchy (entity, codec and storage errors)
//! - Encoding: Serialization strategies for persisted records
//! - Entity / Storable: The capability contract a persisted object exposes
//! - Filter: Scan bounds and chained predicates
//! - Condition: Existence guards for single-object operations
//! - key: Fixed-width key helpers

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod condition;
pub mod encoding;
pub mod entity;
pub mod error;
pub mod filter;
pub mod key;

pub use condition::{Condition, ConditionExt};
pub use encoding::Encoding;
pub use entity::{Entity, HasBucket, SequenceSource, Storable};
pub use error::{CodecError, Error, Result, StorageError, StorageResult};
pub use filter::{goon, prefix_upper_bound, Decision, Filter};
