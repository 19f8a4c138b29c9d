//! Block header template codec
//!
//! A [`Blob`] owns the decoded hashing blob. Every byte is opaque to the worker
//! except the 4-byte nonce field at [`NONCE_OFFSET`], which the search loop
//! rewrites once per candidate.

use crate::{Error, Result};
use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Maximum decoded blob length in bytes
pub const MAX_BLOB_SIZE: usize = 512;

/// Offset of the nonce in the hashing blob
pub const NONCE_OFFSET: usize = 39;

/// Size of the nonce in bytes
pub const NONCE_SIZE: usize = 4;

/// Smallest blob that still holds the whole nonce field
pub const MIN_BLOB_SIZE: usize = NONCE_OFFSET + NONCE_SIZE;

const NONCE_RANGE: Range<usize> = NONCE_OFFSET..NONCE_OFFSET + NONCE_SIZE;

/// Decoded block header template
#[derive(Clone, PartialEq, Eq)]
pub struct Blob {
    bytes: Vec<u8>,
}

impl Blob {
    /// Create a blob from raw bytes, enforcing the size bounds
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() > MAX_BLOB_SIZE {
            return Err(Error::malformed_input(format!(
                "blob is {} bytes, maximum is {}",
                bytes.len(),
                MAX_BLOB_SIZE
            )));
        }

        if bytes.len() < MIN_BLOB_SIZE {
            return Err(Error::malformed_input(format!(
                "blob is {} bytes, too short for a nonce at offset {}",
                bytes.len(),
                NONCE_OFFSET
            )));
        }

        Ok(Self { bytes })
    }

    /// Decode a hex-encoded template
    pub fn decode(encoded: &str) -> Result<Self> {
        let bytes = hex::decode(encoded.trim())
            .map_err(|e| Error::malformed_input(format!("Invalid hex in blob: {}", e)))?;
        Self::from_bytes(bytes)
    }

    /// Encode back to hex
    pub fn encode(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Write `nonce` little-endian into the nonce field
    pub fn set_nonce(&mut self, nonce: u32) {
        LittleEndian::write_u32(&mut self.bytes[NONCE_RANGE], nonce);
    }

    /// Read the nonce field
    pub fn nonce(&self) -> u32 {
        LittleEndian::read_u32(&self.bytes[NONCE_RANGE])
    }

    /// The blob contents, exactly `len()` bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false: a valid blob holds at least the nonce field
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blob")
            .field("len", &self.bytes.len())
            .field("nonce", &self.nonce())
            .finish()
    }
}

impl fmt::Display for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl Serialize for Blob {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Blob {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Blob::decode(&s).map_err(serde::de::Error::custom)
    }
}
