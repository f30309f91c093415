//! # Signature Recovery
//!
//! ECDSA public-key recovery over secp256k1 — the authentication backbone
//! of the redemption pipeline.
//!
//! Vouchers carry a 65-byte recoverable signature instead of a signer
//! public key. Recovery gives us the signing address directly from the
//! digest and signature, and the orchestrator then compares that address
//! against the *current* issuer. Nothing is cached: rotate the issuer role
//! and every outstanding voucher signed by the old key dies instantly.
//!
//! ## Strictness
//!
//! We accept `v` as 27/28 (the Ethereum convention) or the raw recovery id
//! 0/1. Anything else is malformed. We intentionally don't distinguish
//! "bad signature bytes" from "recovery produced a different key" in the
//! caller-facing error — both are just "nope." Giving attackers a detailed
//! error oracle is a bad idea.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use thiserror::Error;

use super::keys::Address;
use crate::config::SIGNATURE_LENGTH;

/// Errors during signature recovery.
///
/// Intentionally vague — callers surface a single opaque authentication
/// failure regardless of which variant fired.
#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("invalid signature: expected {SIGNATURE_LENGTH} bytes, got {0}")]
    InvalidLength(usize),

    #[error("invalid recovery byte")]
    InvalidRecoveryId,

    #[error("signature recovery failed")]
    RecoveryFailed,
}

/// Recovers the signing address from a 32-byte digest and a 65-byte
/// recoverable signature (`r || s || v`).
///
/// This is the "I got these bytes off the wire and need to know who signed
/// them" function. It does *not* decide whether the signer is authorized —
/// that comparison belongs to the orchestrator, which must re-read the
/// current issuer on every call.
///
/// # Errors
///
/// Any malformed component — wrong length, out-of-range `v`, non-canonical
/// `r`/`s`, or a point that fails to recover — yields an error. Callers
/// should collapse all of them into their single authentication failure.
pub fn recover_address(digest: &[u8; 32], signature: &[u8]) -> Result<Address, SignatureError> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(SignatureError::InvalidLength(signature.len()));
    }

    let v = signature[64];
    let recovery_byte = if v >= 27 { v - 27 } else { v };
    let recovery_id =
        RecoveryId::try_from(recovery_byte).map_err(|_| SignatureError::InvalidRecoveryId)?;

    let sig = Signature::from_slice(&signature[..64])
        .map_err(|_| SignatureError::RecoveryFailed)?;

    let verifying_key = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map_err(|_| SignatureError::RecoveryFailed)?;

    let point = verifying_key.to_encoded_point(false);
    let mut pubkey = [0u8; 65];
    pubkey.copy_from_slice(point.as_bytes());
    Ok(Address::from_uncompressed_pubkey(&pubkey))
}
