//! # FISSION Contracts
//!
//! The redemption engine: a voucher-based lazy-minting issuer for
//! non-fungible warheads, with a chained-provenance "radioactivity"
//! mechanic, tiered pricing, a hard supply cap, and rotatable roles.
//!
//! The modules mirror the actual concerns of the engine:
//!
//! - **voucher** — the structured-data encoding of a redemption claim and
//!   its deterministic, domain-separated digest.
//! - **ledger** — the provenance ledger: which NFT references have been
//!   nuked, and what radioactivity level each minted token carries.
//! - **pricing** — the monotonic step function from cumulative issuance
//!   to required payment.
//! - **roles** — singleton issuer/administrator slots with atomic rotation.
//! - **token** — a minimal non-fungible ownership ledger with a transfer
//!   event log.
//! - **warhead** — the orchestrator: the single atomic `redeem` operation
//!   that composes everything above.
//!
//! ## Design Principles
//!
//! 1. All monetary and supply arithmetic is checked or saturating —
//!    wrapping arithmetic and money do not mix.
//! 2. Validation happens before any mutation: a failed redemption leaves
//!    no observable state change, ever.
//! 3. Signature verification gates minting; role lookups are never cached.
//! 4. Every public type is serializable (serde) for wire transport.

pub mod ledger;
pub mod pricing;
pub mod roles;
pub mod token;
pub mod voucher;
pub mod warhead;
