//! 128-bit ring hashing and the clockwise ordering predicate.
//!
//! Ring positions are the first 16 bytes of a Blake3 digest, read big-endian,
//! so plain `u128` ordering is ring ordering.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RingError;

/// Width of a ring hash in bytes.
pub const RING_HASH_LEN: usize = 16;

/// A position on the 128-bit hash ring.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RingHash(pub u128);

impl RingHash {
    /// Hash arbitrary bytes onto the ring.
    pub fn of(data: &[u8]) -> Self {
        let digest = blake3::hash(data);
        let mut head = [0u8; RING_HASH_LEN];
        head.copy_from_slice(&digest.as_bytes()[..RING_HASH_LEN]);
        Self(u128::from_be_bytes(head))
    }

    /// Hash a partition identity: `name ++ be32(index)`.
    pub fn of_partition(name: &str, index: u32) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(name.as_bytes());
        hasher.update(&index.to_be_bytes());
        let mut head = [0u8; RING_HASH_LEN];
        head.copy_from_slice(&hasher.finalize().as_bytes()[..RING_HASH_LEN]);
        Self(u128::from_be_bytes(head))
    }

    /// Create from big-endian bytes.
    pub const fn from_bytes(bytes: [u8; RING_HASH_LEN]) -> Self {
        Self(u128::from_be_bytes(bytes))
    }

    /// Big-endian bytes.
    pub const fn to_bytes(&self) -> [u8; RING_HASH_LEN] {
        self.0.to_be_bytes()
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub const MIN: Self = Self(0);
    pub const MAX: Self = Self(u128::MAX);
}

impl fmt::Debug for RingHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RingHash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for RingHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<u128> for RingHash {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

/// Check whether `b` lies strictly clockwise of `a` before reaching `c`.
///
/// Walking the ring upward from `a` (wrapping past the maximum), returns true
/// iff `b` is met before `c`:
///
/// ```text
/// order      clockwise
/// a < b < c  true
/// b < c < a  true
/// c < a < b  true
/// a < c < b  false
/// b < a < c  false
/// c < b < a  false
/// ```
///
/// Equal inputs have no defined ring order and yield [`RingError::Collision`].
pub fn clockwise(a: RingHash, b: RingHash, c: RingHash) -> Result<bool, RingError> {
    if a == b || a == c {
        return Err(RingError::Collision(a));
    }
    if b == c {
        return Err(RingError::Collision(b));
    }

    // Exactly two of the three cyclic comparisons hold for a clockwise triple.
    let ascending = (a < b) as u8 + (b < c) as u8 + (c < a) as u8;
    Ok(ascending == 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SMALLEST: RingHash = RingHash(0);
    const SMALL: RingHash = RingHash(0xFF);
    const BIG: RingHash = RingHash(u128::MAX >> 8);
    const BIGGEST: RingHash = RingHash(u128::MAX);

    #[test]
    fn test_hash_deterministic() {
        assert_eq!(RingHash::of(b"key"), RingHash::of(b"key"));
        assert_ne!(RingHash::of(b"key"), RingHash::of(b"other"));
    }

    #[test]
    fn test_partition_hash_matches_concatenation() {
        let mut raw = b"node1".to_vec();
        raw.extend_from_slice(&7u32.to_be_bytes());
        assert_eq!(RingHash::of_partition("node1", 7), RingHash::of(&raw));
    }

    #[test]
    fn test_bytes_roundtrip_is_big_endian() {
        let mut bytes = [0u8; RING_HASH_LEN];
        bytes[15] = 1;
        assert_eq!(RingHash::from_bytes(bytes), RingHash(1));
        assert_eq!(RingHash(1).to_bytes(), bytes);
    }

    #[test]
    fn test_clockwise_rotations() {
        let ordered = [SMALLEST, SMALL, BIG, BIGGEST];
        let n = ordered.len();

        for i in 0..n {
            let (a, b, c) = (ordered[i], ordered[(i + 1) % n], ordered[(i + 2) % n]);
            assert!(clockwise(a, b, c).unwrap(), "clockwise at {}", i);
        }

        for i in 0..n {
            let (a, b, c) = (ordered[(i + 1) % n], ordered[i], ordered[(i + 2) % n]);
            assert!(!clockwise(a, b, c).unwrap(), "counter-clockwise at {}", i);
        }
    }

    #[test]
    fn test_clockwise_rejects_equal_hashes() {
        assert_eq!(clockwise(SMALL, SMALL, BIG), Err(RingError::Collision(SMALL)));
        assert_eq!(clockwise(SMALL, BIG, BIG), Err(RingError::Collision(BIG)));
        assert_eq!(clockwise(BIG, SMALL, BIG), Err(RingError::Collision(BIG)));
    }

    proptest! {
        #[test]
        fn prop_exactly_one_orientation(a: u128, b: u128, c: u128) {
            prop_assume!(a != b && b != c && a != c);
            let (a, b, c) = (RingHash(a), RingHash(b), RingHash(c));

            // Rotations agree with each other, and the reverse disagrees.
            let forward = clockwise(a, b, c).unwrap();
            prop_assert_eq!(forward, clockwise(b, c, a).unwrap());
            prop_assert_eq!(forward, clockwise(c, a, b).unwrap());
            prop_assert_ne!(forward, clockwise(c, b, a).unwrap());
        }
    }
}
