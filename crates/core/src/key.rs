//! Key helpers
//!
//! Numeric ids are stored big-endian and fixed-width so that byte order
//! equals numeric order, which is what range and prefix scans rely on.

/// Fixed-width big-endian key for a `u32` id
pub fn u32_key(id: u32) -> Vec<u8> {
    id.to_be_bytes().to_vec()
}

/// Fixed-width big-endian key for a `u64` id
pub fn u64_key(id: u64) -> Vec<u8> {
    id.to_be_bytes().to_vec()
}

/// Inverse of [`u32_key`]; `None` unless `key` is exactly 4 bytes
pub fn parse_u32_key(key: &[u8]) -> Option<u32> {
    Some(u32::from_be_bytes(key.try_into().ok()?))
}

/// Inverse of [`u64_key`]; `None` unless `key` is exactly 8 bytes
pub fn parse_u64_key(key: &[u8]) -> Option<u64> {
    Some(u64::from_be_bytes(key.try_into().ok()?))
}

/// Key for a string id
pub fn str_key(id: &str) -> Vec<u8> {
    id.as_bytes().to_vec()
}
