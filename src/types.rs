//! Core types for the nonce search
//!
//! Work input, difficulty thresholds, digests and per-nonce outcomes, with the
//! validation that turns a raw [`WorkRequest`] into a [`WorkAssignment`].

use crate::blob::Blob;
use crate::{Error, Result};
use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU64;

/// Size of a proof-of-work digest in bytes
pub const DIGEST_SIZE: usize = 32;

/// A difficulty threshold.
///
/// Zero is not a valid difficulty, so it cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Difficulty(NonZeroU64);

impl Difficulty {
    /// Create a difficulty, rejecting zero
    pub fn new(value: u64) -> Result<Self> {
        NonZeroU64::new(value)
            .map(Self)
            .ok_or_else(|| Error::invalid_difficulty("difficulty must be greater than zero"))
    }

    /// Get the difficulty value
    pub fn value(&self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Difficulty {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u64(self.value())
    }
}

impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = u64::deserialize(deserializer)?;
        Difficulty::new(value).map_err(serde::de::Error::custom)
    }
}

/// Output of the proof-of-work hash, read as a little-endian 256-bit integer
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashDigest([u8; DIGEST_SIZE]);

impl HashDigest {
    /// Wrap raw digest bytes
    pub const fn from_bytes(bytes: [u8; DIGEST_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create a digest from a slice, which must be exactly 32 bytes
    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        let bytes: [u8; DIGEST_SIZE] = slice.try_into().map_err(|_| {
            Error::hash(format!(
                "Invalid digest length: expected {} bytes, got {}",
                DIGEST_SIZE,
                slice.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    /// Build a digest holding the given integer value
    pub fn from_words(words: [u64; 4]) -> Self {
        let mut bytes = [0u8; DIGEST_SIZE];
        LittleEndian::write_u64_into(&words, &mut bytes);
        Self(bytes)
    }

    /// Get the digest bytes
    pub fn as_bytes(&self) -> &[u8; DIGEST_SIZE] {
        &self.0
    }

    /// The digest as four 64-bit limbs, least significant first
    pub fn words(&self) -> [u64; 4] {
        let mut words = [0u64; 4];
        LittleEndian::read_u64_into(&self.0, &mut words);
        words
    }

    /// Convert to hexadecimal string (byte order as produced by the hasher)
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for HashDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashDigest({})", self.to_hex())
    }
}

impl fmt::Display for HashDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Classification of a single candidate nonce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchOutcome {
    /// Failed the pool threshold
    Rejected,
    /// Passed the pool threshold only
    Share,
    /// Passed both thresholds
    Solution,
}

impl SearchOutcome {
    /// Whether the pool threshold was met. True for `Share` and `Solution`.
    pub fn is_share(&self) -> bool {
        !matches!(self, SearchOutcome::Rejected)
    }
}

impl fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchOutcome::Rejected => write!(f, "rejected"),
            SearchOutcome::Share => write!(f, "share"),
            SearchOutcome::Solution => write!(f, "solution"),
        }
    }
}

/// Unvalidated work input as supplied by the scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkRequest {
    pub template_id: u32,
    pub nonce_from: u32,
    pub nonce_to: u32,
    pub pool_difficulty: u64,
    pub target_difficulty: u64,
    /// Hex-encoded header template
    pub blob: String,
}

/// A validated assignment: one template, one nonce range, two thresholds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkAssignment {
    pub(crate) template_id: u32,
    pub(crate) nonce_from: u32,
    pub(crate) nonce_to: u32,
    pub(crate) pool_difficulty: Difficulty,
    pub(crate) target_difficulty: Difficulty,
    pub(crate) blob: Blob,
}

impl WorkAssignment {
    /// Build an assignment from already-decoded parts
    pub fn new(
        template_id: u32,
        nonce_from: u32,
        nonce_to: u32,
        pool_difficulty: Difficulty,
        target_difficulty: Difficulty,
        blob: Blob,
    ) -> Result<Self> {
        if target_difficulty < pool_difficulty {
            return Err(Error::invalid_difficulty(format!(
                "target difficulty {} is below pool difficulty {}",
                target_difficulty, pool_difficulty
            )));
        }

        if nonce_to <= nonce_from {
            return Err(Error::invalid_range(format!(
                "nonce range [{}, {}) is empty",
                nonce_from, nonce_to
            )));
        }

        Ok(Self {
            template_id,
            nonce_from,
            nonce_to,
            pool_difficulty,
            target_difficulty,
            blob,
        })
    }

    pub fn template_id(&self) -> u32 {
        self.template_id
    }

    pub fn nonce_from(&self) -> u32 {
        self.nonce_from
    }

    pub fn nonce_to(&self) -> u32 {
        self.nonce_to
    }

    pub fn pool_difficulty(&self) -> Difficulty {
        self.pool_difficulty
    }

    pub fn target_difficulty(&self) -> Difficulty {
        self.target_difficulty
    }

    pub fn blob(&self) -> &Blob {
        &self.blob
    }

    /// Number of candidates in the range
    pub fn nonce_count(&self) -> u64 {
        u64::from(self.nonce_to - self.nonce_from)
    }
}

impl TryFrom<WorkRequest> for WorkAssignment {
    type Error = Error;

    /// The blob is checked first, so an oversized template is reported as
    /// malformed input even when other fields are also bad.
    fn try_from(request: WorkRequest) -> Result<Self> {
        let blob = Blob::decode(&request.blob)?;
        let pool_difficulty = Difficulty::new(request.pool_difficulty)
            .map_err(|_| Error::invalid_difficulty("pool difficulty must be greater than zero"))?;
        let target_difficulty = Difficulty::new(request.target_difficulty)
            .map_err(|_| Error::invalid_difficulty("target difficulty must be greater than zero"))?;

        Self::new(
            request.template_id,
            request.nonce_from,
            request.nonce_to,
            pool_difficulty,
            target_difficulty,
            blob,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::{MAX_BLOB_SIZE, MIN_BLOB_SIZE};
    use assert_matches::assert_matches;

    fn request() -> WorkRequest {
        WorkRequest {
            template_id: 7,
            nonce_from: 100,
            nonce_to: 103,
            pool_difficulty: 10,
            target_difficulty: 1_000,
            blob: "00".repeat(MIN_BLOB_SIZE),
        }
    }

    #[test]
    fn test_difficulty_rejects_zero() {
        assert_matches!(Difficulty::new(0), Err(Error::InvalidDifficulty { .. }));
        assert_eq!(Difficulty::new(5).unwrap().value(), 5);
    }

    #[test]
    fn test_difficulty_serde() {
        let difficulty: Difficulty = serde_json::from_str("42").unwrap();
        assert_eq!(difficulty.value(), 42);
        assert_eq!(serde_json::to_string(&difficulty).unwrap(), "42");
        assert!(serde_json::from_str::<Difficulty>("0").is_err());
    }

    #[test]
    fn test_digest_words_little_endian() {
        let mut bytes = [0u8; DIGEST_SIZE];
        bytes[0] = 0x01;
        bytes[8] = 0x02;
        bytes[31] = 0x80;
        let digest = HashDigest::from_bytes(bytes);

        assert_eq!(digest.words(), [1, 2, 0, 0x8000_0000_0000_0000]);
        assert_eq!(HashDigest::from_words(digest.words()), digest);
    }

    #[test]
    fn test_digest_from_slice() {
        assert!(HashDigest::from_slice(&[0u8; 32]).is_ok());
        assert_matches!(HashDigest::from_slice(&[0u8; 31]), Err(Error::Hash { .. }));
    }

    #[test]
    fn test_outcome_share_semantics() {
        assert!(!SearchOutcome::Rejected.is_share());
        assert!(SearchOutcome::Share.is_share());
        assert!(SearchOutcome::Solution.is_share());
        assert_eq!(SearchOutcome::Solution.to_string(), "solution");
    }

    #[test]
    fn test_assignment_from_request() {
        let assignment = WorkAssignment::try_from(request()).unwrap();
        assert_eq!(assignment.template_id(), 7);
        assert_eq!(assignment.nonce_count(), 3);
        assert_eq!(assignment.pool_difficulty().value(), 10);
        assert_eq!(assignment.target_difficulty().value(), 1_000);
        assert_eq!(assignment.blob().len(), MIN_BLOB_SIZE);
    }

    #[test]
    fn test_assignment_rejects_oversized_blob_first() {
        let mut req = request();
        req.blob = "00".repeat(MAX_BLOB_SIZE + 1);
        req.pool_difficulty = 0;
        assert_matches!(WorkAssignment::try_from(req), Err(Error::MalformedInput { .. }));
    }

    #[test]
    fn test_assignment_rejects_bad_difficulty() {
        let mut req = request();
        req.pool_difficulty = 0;
        assert_matches!(WorkAssignment::try_from(req), Err(Error::InvalidDifficulty { .. }));

        let mut req = request();
        req.target_difficulty = 0;
        assert_matches!(WorkAssignment::try_from(req), Err(Error::InvalidDifficulty { .. }));

        let mut req = request();
        req.target_difficulty = 5;
        assert_matches!(WorkAssignment::try_from(req), Err(Error::InvalidDifficulty { .. }));
    }

    #[test]
    fn test_assignment_rejects_empty_range() {
        let mut req = request();
        req.nonce_to = req.nonce_from;
        assert_matches!(WorkAssignment::try_from(req), Err(Error::InvalidRange { .. }));
    }

    #[test]
    fn test_work_request_json() {
        let json = format!(
            r#"{{"template_id":1,"nonce_from":0,"nonce_to":16,"pool_difficulty":2,"target_difficulty":8,"blob":"{}"}}"#,
            "ab".repeat(MIN_BLOB_SIZE)
        );
        let req: WorkRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(req.nonce_to, 16);
        assert!(WorkAssignment::try_from(req).is_ok());
    }
}
