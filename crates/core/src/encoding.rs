//! Record encodings
//!
//! An [`Encoding`] converts a typed object to and from the bytes stored at
//! a bucket key. Every variant is serde-backed, so any `Serialize +
//! DeserializeOwned` entity can use any of them, and each one is the exact
//! inverse of itself: `decode(encode(e)) == e`.
//!
//! A store carries one default encoding; an entity type may override it
//! through [`Entity::encoding`](crate::Entity::encoding).
//!
//! # Known Encodings
//!
//! - `"bincode"`: compact binary (default)
//! - `"json"` / `"json-pretty"`: UTF-8 JSON
//! - `"msgpack"`: MessagePack with named struct fields
//! - `"xml"`: UTF-8 XML, the root element named after the type
//!
//! XML needs a struct at the root. It trims surrounding whitespace from
//! text nodes and cannot carry most control characters, so it only
//! round-trips values that avoid both.

use std::fmt;
use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// Serialization strategy for persisted records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Encoding {
    /// bincode 1.x, fixed-width integers
    #[default]
    Bincode,
    /// JSON, optionally indented
    Json {
        /// Indent the output with tabs
        pretty: bool,
    },
    /// MessagePack, structs encoded as maps
    MsgPack,
    /// XML via quick-xml
    Xml,
}

impl Encoding {
    /// Compact JSON
    pub const JSON: Encoding = Encoding::Json { pretty: false };

    /// Write `value` to `writer`
    pub fn encode<T, W>(&self, mut writer: W, value: &T) -> Result<(), CodecError>
    where
        T: Serialize + ?Sized,
        W: Write,
    {
        match self {
            Encoding::Bincode => bincode::serialize_into(writer, value)?,
            Encoding::Json { pretty: false } => serde_json::to_writer(writer, value)?,
            Encoding::Json { pretty: true } => {
                let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
                let mut ser = serde_json::Serializer::with_formatter(writer, formatter);
                value.serialize(&mut ser)?;
            }
            Encoding::MsgPack => rmp_serde::encode::write_named(&mut writer, value)?,
            Encoding::Xml => writer.write_all(quick_xml::se::to_string(value)?.as_bytes())?,
        }
        Ok(())
    }

    /// Read a value from `reader`
    ///
    /// The reader is drained before decoding so that a corrupt length
    /// prefix is checked against the bytes actually available.
    pub fn decode<T, R>(&self, mut reader: R) -> Result<T, CodecError>
    where
        T: DeserializeOwned,
        R: Read,
    {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        self.from_slice(&buf)
    }

    /// Encode into a fresh buffer
    pub fn to_vec<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        let mut buf = Vec::new();
        self.encode(&mut buf, value)?;
        Ok(buf)
    }

    /// Decode from a byte slice
    pub fn from_slice<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        match self {
            Encoding::Bincode => Ok(bincode::deserialize(bytes)?),
            Encoding::Json { .. } => Ok(serde_json::from_slice(bytes)?),
            Encoding::MsgPack => Ok(rmp_serde::from_slice(bytes)?),
            Encoding::Xml => Ok(quick_xml::de::from_reader(bytes)?),
        }
    }

    /// Stable identifier, as accepted by [`Encoding::from_name`]
    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Bincode => "bincode",
            Encoding::Json { pretty: false } => "json",
            Encoding::Json { pretty: true } => "json-pretty",
            Encoding::MsgPack => "msgpack",
            Encoding::Xml => "xml",
        }
    }

    /// Look an encoding up by identifier
    pub fn from_name(name: &str) -> Result<Self, CodecError> {
        match name {
            "bincode" => Ok(Encoding::Bincode),
            "json" => Ok(Encoding::JSON),
            "json-pretty" => Ok(Encoding::Json { pretty: true }),
            "msgpack" => Ok(Encoding::MsgPack),
            "xml" => Ok(Encoding::Xml),
            other => Err(CodecError::UnknownEncoding(other.to_string())),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
