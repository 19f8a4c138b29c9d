//! Proof-of-work hash capability
//!
//! The search loop only needs something that turns a candidate blob into a
//! 32-byte digest. [`PowHasher`] is that seam; [`Blake2sHasher`] is the
//! implementation the binary ships with.

use crate::types::{HashDigest, DIGEST_SIZE};
use crate::Result;
use blake2::{Blake2s256, Digest};

/// Hash capability used to evaluate candidates.
///
/// Implementations hash exactly the bytes they are given. Errors abort the run.
pub trait PowHasher: Send {
    /// Short name for logging
    fn name(&self) -> &'static str;

    /// Compute the digest of `data`
    fn digest(&mut self, data: &[u8]) -> Result<HashDigest>;
}

/// Blake2s-256 hasher, reusing its state between candidates
pub struct Blake2sHasher {
    hasher: Blake2s256,
}

impl Blake2sHasher {
    /// Create a new Blake2s hasher
    pub fn new() -> Self {
        Self {
            hasher: Blake2s256::new(),
        }
    }
}

impl Default for Blake2sHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PowHasher for Blake2sHasher {
    fn name(&self) -> &'static str {
        "blake2s-256"
    }

    fn digest(&mut self, data: &[u8]) -> Result<HashDigest> {
        self.hasher.update(data);
        let result: [u8; DIGEST_SIZE] = self.hasher.finalize_reset().into();
        Ok(HashDigest::from_bytes(result))
    }
}
