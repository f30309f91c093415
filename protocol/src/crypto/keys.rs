//! # Addresses & Issuer Keys
//!
//! The identity layer of FISSION: Ethereum-style 20-byte addresses and the
//! secp256k1 keypair the issuer uses to sign vouchers off-chain.
//!
//! Addresses are derived the standard way — the last 20 bytes of
//! keccak256 over the uncompressed public key (without the 0x04 prefix).
//! We keep the address a dedicated newtype rather than a `String` or
//! `[u8; 20]` alias so the compiler stops you from passing a token URI
//! where an owner belongs.

use std::fmt;
use std::str::FromStr;

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use rand_core::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use super::hash::keccak256;
use crate::config::{ADDRESS_LENGTH, SECRET_KEY_LENGTH, SIGNATURE_LENGTH};

/// Errors during key construction and parsing.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid secret key bytes")]
    InvalidSecretKey,

    #[error("invalid address: expected 20 bytes of hex, got {0:?}")]
    InvalidAddress(String),
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 20-byte Ethereum-style account address.
///
/// Used for the issuer, the administrator, redeemers, parent-NFT owners,
/// and parent-NFT contract addresses. Compared purely by value — an address
/// on another chain is still just these 20 bytes to us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; ADDRESS_LENGTH]);

impl Address {
    /// The all-zero address. Appears as the `from` side of mint events and
    /// is rejected everywhere a real role holder is required.
    pub const ZERO: Address = Address([0u8; ADDRESS_LENGTH]);

    /// Returns true for the all-zero sentinel.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LENGTH]
    }

    /// Raw bytes of the address.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Derives the address from an uncompressed secp256k1 public key.
    ///
    /// `pubkey` is the 65-byte SEC1 encoding (0x04 || x || y). The address
    /// is the last 20 bytes of keccak256(x || y).
    pub fn from_uncompressed_pubkey(pubkey: &[u8; 65]) -> Self {
        let digest = keccak256(&pubkey[1..]);
        let mut out = [0u8; ADDRESS_LENGTH];
        out.copy_from_slice(&digest[12..32]);
        Address(out)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped).map_err(|_| KeyError::InvalidAddress(s.to_string()))?;
        let arr: [u8; ADDRESS_LENGTH] = bytes
            .try_into()
            .map_err(|_| KeyError::InvalidAddress(s.to_string()))?;
        Ok(Address(arr))
    }
}

// Addresses travel as "0x…" hex strings on the wire — the same shape every
// wallet and block explorer expects.
impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Issuer Keypair
// ---------------------------------------------------------------------------

/// A secp256k1 keypair for signing redemption vouchers.
///
/// Only the current issuer's signatures authorize minting, so treat the
/// secret material accordingly: generate with [`IssuerKeypair::generate`],
/// store hex in a mode-0600 file, and rotate via the role registry when
/// compromised.
#[derive(Clone)]
pub struct IssuerKeypair {
    signing_key: SigningKey,
}

impl fmt::Debug for IssuerKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the secret key, not even in debug output.
        write!(f, "IssuerKeypair {{ address: {} }}", self.address())
    }
}

impl IssuerKeypair {
    /// Generates a fresh keypair from the OS entropy source.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut OsRng),
        }
    }

    /// Constructs a keypair from raw 32-byte secret key material.
    pub fn from_bytes(bytes: &[u8; SECRET_KEY_LENGTH]) -> Result<Self, KeyError> {
        let signing_key =
            SigningKey::from_slice(bytes).map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self { signing_key })
    }

    /// Constructs a keypair from a hex-encoded secret key, with or without
    /// a `0x` prefix. This is the format `fission-node init` writes to disk.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let stripped = s.trim().strip_prefix("0x").unwrap_or(s.trim());
        let bytes = hex::decode(stripped).map_err(|_| KeyError::InvalidSecretKey)?;
        let arr: [u8; SECRET_KEY_LENGTH] =
            bytes.try_into().map_err(|_| KeyError::InvalidSecretKey)?;
        Self::from_bytes(&arr)
    }

    /// Hex-encoded secret key bytes, for persistence by the node's `init`
    /// command. Handle with care.
    pub fn secret_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    /// The uncompressed SEC1 public key (65 bytes: 0x04 || x || y).
    pub fn public_key_uncompressed(&self) -> [u8; 65] {
        let point = self.signing_key.verifying_key().to_encoded_point(false);
        let mut out = [0u8; 65];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// The address derived from this keypair's public key.
    pub fn address(&self) -> Address {
        Address::from_uncompressed_pubkey(&self.public_key_uncompressed())
    }

    /// Signs a 32-byte digest, returning the 65-byte recoverable signature
    /// `r (32) || s (32) || v (1)` with `v` in {27, 28}.
    ///
    /// The digest is expected to already be the full structured-data hash —
    /// this function applies no prefixing of its own.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> [u8; SIGNATURE_LENGTH] {
        let (signature, recovery_id): (Signature, RecoveryId) = self
            .signing_key
            .sign_prehash_recoverable(digest)
            .expect("signing cannot fail with a valid key and 32-byte digest");

        let mut out = [0u8; SIGNATURE_LENGTH];
        out[..64].copy_from_slice(&signature.to_bytes());
        out[64] = recovery_id.to_byte() + 27;
        out
    }

    /// Borrow of the inner verifying key, for callers that need to interact
    /// with `k256` directly.
    pub fn verifying_key(&self) -> &VerifyingKey {
        self.signing_key.verifying_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keypairs_are_distinct() {
        let a = IssuerKeypair::generate();
        let b = IssuerKeypair::generate();
        assert_ne!(a.address(), b.address());
    }

    #[test]
    fn secret_hex_roundtrip() {
        let kp = IssuerKeypair::generate();
        let restored = IssuerKeypair::from_hex(&kp.secret_hex()).unwrap();
        assert_eq!(kp.address(), restored.address());
    }

    #[test]
    fn from_hex_accepts_0x_prefix() {
        let kp = IssuerKeypair::generate();
        let prefixed = format!("0x{}", kp.secret_hex());
        let restored = IssuerKeypair::from_hex(&prefixed).unwrap();
        assert_eq!(kp.address(), restored.address());
    }

    #[test]
    fn invalid_secret_rejected() {
        assert!(IssuerKeypair::from_hex("not hex at all").is_err());
        // Zero is not a valid scalar.
        assert!(IssuerKeypair::from_bytes(&[0u8; 32]).is_err());
    }

    #[test]
    fn address_display_and_parse_roundtrip() {
        let addr = IssuerKeypair::generate().address();
        let parsed: Address = addr.to_string().parse().unwrap();
        assert_eq!(addr, parsed);
    }

    #[test]
    fn address_parse_rejects_garbage() {
        assert!("0xzz".parse::<Address>().is_err());
        assert!("0x1234".parse::<Address>().is_err()); // too short
    }

    #[test]
    fn zero_address_is_zero() {
        assert!(Address::ZERO.is_zero());
        assert!(!IssuerKeypair::generate().address().is_zero());
    }

    #[test]
    fn address_serde_as_hex_string() {
        let addr: Address = "0x1000000000000000000000000000000000000777"
            .parse()
            .unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"0x1000000000000000000000000000000000000777\"");
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(addr, back);
    }

    #[test]
    fn signature_has_recovery_byte() {
        let kp = IssuerKeypair::generate();
        let sig = kp.sign_digest(&[7u8; 32]);
        assert!(sig[64] == 27 || sig[64] == 28);
    }
}
