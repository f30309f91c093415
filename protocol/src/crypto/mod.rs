//! # Cryptographic Primitives for FISSION
//!
//! This module is the foundation of everything security-related in the
//! engine. Every voucher digest, every signature, every address flows
//! through here.
//!
//! We deliberately chose boring, well-audited cryptography:
//!
//! - **Keccak-256** for hashing — the structured-data encoding is
//!   Ethereum-shaped, so the hash function is too.
//! - **secp256k1 ECDSA with recovery** for signatures — vouchers are signed
//!   off-chain by wallets that speak exactly one curve.
//!
//! ## A note on "rolling your own crypto"
//!
//! We don't. Everything here is a thin, type-safe wrapper around audited
//! implementations (`sha3`, `k256`). If you're tempted to optimize these
//! functions, please reconsider. Then reconsider again.

pub mod hash;
pub mod keys;
pub mod signatures;

// Re-export the things people actually need so they don't have to memorize
// our module hierarchy.
pub use hash::{keccak256, keccak256_multi};
pub use keys::{Address, IssuerKeypair};
pub use signatures::{recover_address, SignatureError};
