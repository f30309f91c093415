//! # FISSION Protocol — Core Library
//!
//! The low-level foundation of FISSION, a voucher-based lazy-minting engine
//! for non-fungible warheads. Everything here is deliberately boring: hash
//! functions, secp256k1 keys, signature recovery, and the protocol constants
//! that define the issuance economics.
//!
//! ## Architecture
//!
//! - **crypto** — Keccak-256 hashing, Ethereum-style addresses, issuer
//!   keypairs, and ECDSA public-key recovery. Don't roll your own.
//! - **config** — Protocol constants: the supply cap, the radioactivity
//!   ceiling, the signing domain, default ports. Every magic number lives
//!   here and nowhere else.
//!
//! The actual redemption state machine lives in the `fission-contracts`
//! crate, which builds on these primitives.
//!
//! ## Design Philosophy
//!
//! 1. Correctness over performance — a redemption is worth real money.
//! 2. No unsafe code in crypto paths.
//! 3. If it touches money, it has tests. Plural.

pub mod config;
pub mod crypto;
