//! Object store engine for stowage
//!
//! This crate ties the entity contract to the bucket store:
//! - Store: get/put/delete, batches, filtered scans, counts, bucket drops
//! - Scanner: the filtered scan state machine
//! - StoreConfig: `stowage.toml` configuration
//!
//! The engine is the only component that knows about both encodings and
//! transactions.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod scan;
pub mod store;

pub use config::{StoreConfig, CONFIG_FILE_NAME};
pub use scan::{ScanPhase, Scanner};
pub use store::Store;
