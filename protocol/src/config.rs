//! # Protocol Configuration & Constants
//!
//! Every magic number in FISSION lives here. If you're hardcoding a constant
//! somewhere else, you're doing it wrong and you owe the team coffee.
//!
//! These values define the issuance economics of the engine. Changing them
//! after vouchers have been signed in the wild is somewhere between
//! "difficult" and "career-ending", so choose wisely during devnet.

// ---------------------------------------------------------------------------
// Supply & Levels
// ---------------------------------------------------------------------------

/// Hard cap on cumulative issuance — one token per warhead, and there are
/// only so many warheads. Once `minted == MAX_SUPPLY`, every further
/// redemption fails with the capacity error, forever.
pub const MAX_SUPPLY: u64 = 13_080;

/// Ceiling on the chained radioactivity level. A provenance chain of
/// same-contract redemptions yields levels 0, 1, 2, ... up to this value;
/// a redemption that would compute level 6 is rejected outright.
pub const MAX_RADIOACTIVITY_LEVEL: u8 = 5;

// ---------------------------------------------------------------------------
// Signing Domain
// ---------------------------------------------------------------------------

/// Structured-data signing domain name. Off-chain voucher producers must
/// reproduce this exact string or their signatures will never validate.
pub const SIGNING_DOMAIN_NAME: &str = "Fission-Voucher";

/// Signing domain version. Bump on any change to the voucher encoding —
/// it invalidates every outstanding voucher, which is the point.
pub const SIGNING_DOMAIN_VERSION: &str = "1";

/// Chain id used by the development network. Production deployments pass
/// their real chain id at construction time; this is only a default.
pub const DEV_CHAIN_ID: u64 = 1337;

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// secp256k1 ECDSA with public-key recovery — the only curve that makes
/// sense when vouchers must interoperate with Ethereum-style tooling.
pub const SIGNING_ALGORITHM: &str = "secp256k1-ECDSA";

/// Recoverable signature length: r (32) + s (32) + v (1).
pub const SIGNATURE_LENGTH: usize = 65;

/// Address length in bytes — the last 20 bytes of keccak256(pubkey).
pub const ADDRESS_LENGTH: usize = 20;

/// Keccak-256 digest length.
pub const DIGEST_LENGTH: usize = 32;

/// Secret key length for issuer keypairs.
pub const SECRET_KEY_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Network Parameters
// ---------------------------------------------------------------------------

/// Default HTTP API port for the node binary.
pub const DEFAULT_RPC_PORT: u16 = 8560;

/// Default metrics (Prometheus) port.
pub const DEFAULT_METRICS_PORT: u16 = 8561;

/// The full version string, assembled at compile time so we don't allocate
/// for something this trivial at runtime.
pub const PROTOCOL_VERSION: &str = "0.1.0";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supply_cap_covers_price_tiers() {
        // The top pricing tier starts at 13,070 — the cap must sit above it
        // or that tier could never be reached.
        assert!(MAX_SUPPLY > 13_070);
    }

    #[test]
    fn level_ceiling_is_five() {
        assert_eq!(MAX_RADIOACTIVITY_LEVEL, 5);
    }

    #[test]
    fn signing_domain_is_versioned() {
        assert!(!SIGNING_DOMAIN_NAME.is_empty());
        assert!(!SIGNING_DOMAIN_VERSION.is_empty());
    }

    #[test]
    fn crypto_parameter_sizes() {
        assert_eq!(SIGNATURE_LENGTH, 65);
        assert_eq!(ADDRESS_LENGTH, 20);
        assert_eq!(DIGEST_LENGTH, 32);
        assert_eq!(SECRET_KEY_LENGTH, 32);
    }
}
