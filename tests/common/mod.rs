//! Shared test utilities for the integration test suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;

use rand::Rng;
use serde::ser::{Error as _, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};
pub use stowage::{
    key, Condition, Decision, Encoding, Entity, Error, Filter, HasBucket, OpenOptions, Result,
    SequenceSource, Storable, Store, StoreConfig,
};
use tempfile::TempDir;

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Route store logs through the test harness (shown for failing tests only).
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

// ============================================================================
// Fixture entities
// ============================================================================

/// String-keyed entity using the store's default encoding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub name: String,
    pub age: u32,
}

impl Person {
    pub fn new(id: &str, name: &str, age: u32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            age,
        }
    }
}

impl HasBucket for Person {
    fn bucket(&self) -> Vec<u8> {
        b"person".to_vec()
    }
}

impl Entity for Person {
    fn key(&self) -> Vec<u8> {
        key::str_key(&self.id)
    }
}

/// Numeric-keyed entity with an encoding override and an id-assigning hook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Car {
    pub id: u32,
    pub name: String,
    pub year: u16,
}

impl Car {
    pub fn new(name: &str, year: u16) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            year,
        }
    }

    pub fn with_id(id: u32, name: &str, year: u16) -> Self {
        Self {
            id,
            name: name.to_string(),
            year,
        }
    }
}

impl HasBucket for Car {
    fn bucket(&self) -> Vec<u8> {
        b"car".to_vec()
    }
}

impl Entity for Car {
    fn key(&self) -> Vec<u8> {
        key::u32_key(self.id)
    }

    fn encoding(&self) -> Option<Encoding> {
        Some(Encoding::MsgPack)
    }

    fn before_persist(&mut self, seq: &mut dyn SequenceSource) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::rejected::<Car>("name required"));
        }
        if self.id == 0 {
            let next = seq.next_sequence()?;
            self.id = u32::try_from(next).map_err(|_| Error::rejected::<Car>("id space exhausted"))?;
        }
        Ok(())
    }
}

/// Entity whose bucket and key are fresh on every call, so it is never found.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wind;

fn random_name() -> Vec<u8> {
    let n: u64 = rand::thread_rng().gen();
    format!("wind {:016x}", n).into_bytes()
}

impl HasBucket for Wind {
    fn bucket(&self) -> Vec<u8> {
        random_name()
    }
}

impl Entity for Wind {
    fn key(&self) -> Vec<u8> {
        random_name()
    }
}

/// Entity that refuses to serialize while `poison` is set.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Glitch {
    pub id: String,
    pub poison: bool,
}

impl Serialize for Glitch {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if self.poison {
            return Err(S::Error::custom("poisoned record"));
        }
        let mut state = serializer.serialize_struct("Glitch", 2)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("poison", &self.poison)?;
        state.end()
    }
}

impl HasBucket for Glitch {
    fn bucket(&self) -> Vec<u8> {
        b"person".to_vec()
    }
}

impl Entity for Glitch {
    fn key(&self) -> Vec<u8> {
        key::str_key(&self.id)
    }
}

/// Named bucket without an entity, for bucket drops.
pub struct BucketName(pub &'static str);

impl HasBucket for BucketName {
    fn bucket(&self) -> Vec<u8> {
        self.0.as_bytes().to_vec()
    }
}

// ============================================================================
// TestStore - file-backed store in a temporary directory
// ============================================================================

pub const DATA_FILE: &str = "test.stow";

/// Test options: bounded lock waits so a deadlock fails instead of hanging.
pub fn test_options() -> OpenOptions {
    OpenOptions::default().with_timeout(Duration::from_secs(5))
}

/// File-backed store that cleans up after itself.
pub struct TestStore {
    pub store: Store,
    pub dir: TempDir,
    encoding: Encoding,
}

impl TestStore {
    /// Store with the default encoding.
    pub fn new() -> Self {
        Self::with_encoding(Encoding::default())
    }

    /// Store with `encoding` as its default.
    pub fn with_encoding(encoding: Encoding) -> Self {
        init_tracing();
        let dir = TempDir::new().expect("Failed to create temp dir");
        let store = Store::open_with(dir.path().join(DATA_FILE), test_options(), encoding)
            .expect("Failed to open store");
        Self {
            store,
            dir,
            encoding,
        }
    }

    /// Path of the data file.
    pub fn path(&self) -> PathBuf {
        self.dir.path().join(DATA_FILE)
    }

    /// Close and open the data file again.
    pub fn reopen(self) -> Self {
        let Self {
            store,
            dir,
            encoding,
        } = self;
        drop(store);
        let store = Store::open_with(dir.path().join(DATA_FILE), test_options(), encoding)
            .expect("Failed to reopen store");
        Self {
            store,
            dir,
            encoding,
        }
    }

    /// Seed the `person` bucket.
    pub fn with_people(self, people: &[(&str, &str, u32)]) -> Self {
        for (id, name, age) in people {
            self.store
                .put(&mut Person::new(id, name, *age), None)
                .expect("seed person");
        }
        self
    }
}

impl std::ops::Deref for TestStore {
    type Target = Store;

    fn deref(&self) -> &Store {
        &self.store
    }
}

/// Ids of a list of people, in order.
pub fn ids(people: &[Person]) -> Vec<String> {
    people.iter().map(|p| p.id.clone()).collect()
}
