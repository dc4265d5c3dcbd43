//! The entity contract
//!
//! An entity is any value that can name the bucket it lives in and the key
//! it lives at. Two optional capabilities ride on top, both as default
//! methods so most types only implement `bucket` and `key`:
//!
//! - an encoding override ([`Entity::encoding`]);
//! - a before-persist hook ([`Entity::before_persist`]) that can draw
//!   identifiers from the bucket's sequence counter.
//!
//! [`Storable`] is the object-safe view of an entity. It is implemented for
//! every [`Entity`], so heterogeneous batches can be passed as
//! `&mut [&mut dyn Storable]`.
//!
//! # Example
//!
//! ```ignore
//! #[derive(Serialize, Deserialize, Default)]
//! struct Car { id: u32, name: String }
//!
//! impl HasBucket for Car {
//!     fn bucket(&self) -> Vec<u8> { b"car".to_vec() }
//! }
//!
//! impl Entity for Car {
//!     fn key(&self) -> Vec<u8> { key::u32_key(self.id) }
//!
//!     fn before_persist(&mut self, seq: &mut dyn SequenceSource) -> Result<()> {
//!         if self.id == 0 {
//!             self.id = u32::try_from(seq.next_sequence()?).map_err(|_| Error::rejected::<Car>("id space exhausted"))?;
//!         }
//!         Ok(())
//!     }
//! }
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::encoding::Encoding;
use crate::error::{CodecError, Result, StorageResult};

/// Anything bound to a bucket
///
/// Enough to count or drop a bucket without a full entity.
pub trait HasBucket {
    /// Name of the bucket this value lives in
    fn bucket(&self) -> Vec<u8>;
}

/// Source of per-bucket sequence numbers handed to before-persist hooks
///
/// Values are strictly increasing within a bucket. A rolled-back
/// transaction leaves the counter where it was.
pub trait SequenceSource {
    /// Advance the bucket's counter and return the new value
    fn next_sequence(&mut self) -> StorageResult<u64>;
}

/// An object that can be persisted
pub trait Entity: HasBucket + Serialize + DeserializeOwned {
    /// Key of this entity inside its bucket
    ///
    /// Must be derived deterministically from the entity's identity.
    fn key(&self) -> Vec<u8>;

    /// Encoding override for this type; `None` uses the store default
    fn encoding(&self) -> Option<Encoding> {
        None
    }

    /// Called by `put` right before the entity is encoded
    ///
    /// `seq` allocates from the bucket's counter only when asked, so
    /// entities that ignore it never advance the sequence.
    fn before_persist(&mut self, seq: &mut dyn SequenceSource) -> Result<()> {
        let _ = seq;
        Ok(())
    }
}

/// Object-safe view of an [`Entity`]
///
/// Implemented for every `Entity`; there is no need to implement it by hand.
pub trait Storable: HasBucket {
    /// Key inside the bucket
    fn storage_key(&self) -> Vec<u8>;

    /// Rust type name, used in error context
    fn type_name(&self) -> &'static str;

    /// The entity's encoding override, if any
    fn preferred_encoding(&self) -> Option<Encoding>;

    /// Run the before-persist hook
    fn prepare(&mut self, seq: &mut dyn SequenceSource) -> Result<()>;

    /// Encode with `encoding`
    fn encode_record(&self, encoding: Encoding) -> std::result::Result<Vec<u8>, CodecError>;

    /// Replace `self` with the value decoded from `bytes`
    fn decode_record(
        &mut self,
        encoding: Encoding,
        bytes: &[u8],
    ) -> std::result::Result<(), CodecError>;
}

impl<T: Entity> Storable for T {
    fn storage_key(&self) -> Vec<u8> {
        self.key()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn preferred_encoding(&self) -> Option<Encoding> {
        self.encoding()
    }

    fn prepare(&mut self, seq: &mut dyn SequenceSource) -> Result<()> {
        self.before_persist(seq)
    }

    fn encode_record(&self, encoding: Encoding) -> std::result::Result<Vec<u8>, CodecError> {
        encoding.to_vec(self)
    }

    fn decode_record(
        &mut self,
        encoding: Encoding,
        bytes: &[u8],
    ) -> std::result::Result<(), CodecError> {
        *self = encoding.from_slice(bytes)?;
        Ok(())
    }
}
