//! # Hashing Utilities
//!
//! Keccak-256 is the only hash function in FISSION, and that is on purpose.
//! The voucher encoding follows the Ethereum structured-data scheme, address
//! derivation is keccak-of-pubkey, and mixing in a second hash function
//! would buy us nothing except a bigger audit surface.
//!
//! Note: Keccak-256 is *not* NIST SHA-3 — the padding differs. The `sha3`
//! crate's `Keccak256` type is the pre-standardization variant Ethereum
//! settled on, which is exactly what we need for byte-for-byte compatible
//! digests.

use sha3::{Digest, Keccak256};

/// Compute the Keccak-256 hash of the input data.
///
/// Returns a 32-byte digest as a fixed-size array. This is the workhorse
/// of the voucher codec: type hashes, struct hashes, domain separators,
/// and address derivation all come through here.
///
/// # Example
///
/// ```
/// use fission_protocol::crypto::keccak256;
///
/// let digest = keccak256(b"fission");
/// assert_eq!(digest.len(), 32);
/// ```
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash multiple byte slices together without concatenation overhead.
///
/// Instead of allocating a buffer to concatenate inputs, we feed them
/// sequentially into the hasher. Same result, less allocation. This is
/// how the voucher codec assembles `typehash || field || field || ...`
/// encodings without a temporary `Vec` per digest.
pub fn keccak256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak256_known_vector() {
        // Keccak-256 of the empty string. If this ever fails, the `sha3`
        // crate silently switched us to NIST SHA-3 and every signature in
        // existence just broke.
        let digest = keccak256(b"");
        let expected =
            hex::decode("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")
                .unwrap();
        assert_eq!(digest.as_slice(), expected.as_slice());
    }

    #[test]
    fn keccak256_deterministic() {
        let a = keccak256(b"fission");
        let b = keccak256(b"fission");
        assert_eq!(a, b);
    }

    #[test]
    fn keccak256_different_inputs() {
        let a = keccak256(b"fission");
        let b = keccak256(b"Fission"); // case sensitive!
        assert_ne!(a, b);
    }

    #[test]
    fn multi_matches_concatenated() {
        // Feeding parts via update() must equal hashing the concatenation —
        // the voucher codec depends on this equivalence.
        let multi = keccak256_multi(&[b"hello", b" world"]);
        let single = keccak256(b"hello world");
        assert_eq!(multi, single);
    }

    #[test]
    fn multi_empty_parts() {
        assert_eq!(keccak256_multi(&[]), keccak256(b""));
    }
}
