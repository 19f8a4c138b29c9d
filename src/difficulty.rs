//! Difficulty evaluation
//!
//! A digest `H` passes difficulty `d` when `H * d` still fits in 256 bits,
//! i.e. `H <= (2^256 - 1) / d`.

use crate::types::{Difficulty, HashDigest, SearchOutcome};

/// Check a digest against a single difficulty threshold
pub fn passes(digest: &HashDigest, difficulty: Difficulty) -> bool {
    let d = difficulty.value() as u128;
    let mut carry = 0u128;

    // Least significant limb first; any carry out of the top limb means
    // the product overflowed 256 bits.
    for word in digest.words() {
        let product = word as u128 * d + carry;
        carry = product >> 64;
    }

    carry == 0
}

/// Classify a digest against the pool and target thresholds.
///
/// The pool threshold is checked first since it is the cheaper, more common
/// test. A `Solution` has always passed the pool threshold as well.
pub fn classify(
    digest: &HashDigest,
    pool_difficulty: Difficulty,
    target_difficulty: Difficulty,
) -> SearchOutcome {
    if !passes(digest, pool_difficulty) {
        return SearchOutcome::Rejected;
    }

    if passes(digest, target_difficulty) {
        SearchOutcome::Solution
    } else {
        SearchOutcome::Share
    }
}
