//! # Voucher Codec
//!
//! The canonical structured-data encoding of a redemption claim, and its
//! deterministic digest.
//!
//! A voucher is produced off-chain: the issuer signs the digest of the
//! semantic fields (token URI, parent NFT reference, claimed parent owner)
//! bound to a *signing domain* — the engine's own address and chain id.
//! Domain separation is what stops a voucher signed for one deployment
//! from being replayed against another, and the field-by-field hashing is
//! what makes any post-signing mutation invalidate the signature.
//!
//! The encoding follows the Ethereum typed-structured-data scheme
//! (type hash + encoded fields, `0x19 0x01` prefix) so that standard
//! wallet tooling can produce byte-for-byte identical digests. Off-chain
//! producers must reproduce this encoding exactly.
//!
//! The *new* token's id is deliberately absent from the signed payload —
//! ids are assigned by the orchestrator at redemption time, so outstanding
//! vouchers can be redeemed in any order.

use serde::{Deserialize, Serialize};

use fission_protocol::config::{SIGNING_DOMAIN_NAME, SIGNING_DOMAIN_VERSION};
use fission_protocol::crypto::{keccak256, keccak256_multi, Address, IssuerKeypair};

/// The struct type string for the domain separator. Field order matters;
/// changing a single character here invalidates every signature.
const DOMAIN_TYPE: &[u8] =
    b"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

/// The struct type string for a voucher. Field names follow the off-chain
/// issuance tooling verbatim.
const VOUCHER_TYPE: &[u8] = b"NFTVoucher(string uri,uint256 parentNFTChainId,address parentNFTcontractAddress,uint256 parentNFTtokenId,address parentNFTownerAddress)";

// ---------------------------------------------------------------------------
// NFT Reference
// ---------------------------------------------------------------------------

/// Identifies any NFT, on any chain, by pure value equality.
///
/// There is no cross-chain proof attached to a reference — `{1, 0x999…, 7}`
/// names a token on Ethereum mainnet whether or not it exists there. The
/// engine treats references as opaque keys into the provenance ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NftReference {
    /// Chain id of the network the referenced NFT lives on.
    pub chain_id: u64,
    /// Contract address of the referenced NFT's collection.
    pub contract_address: Address,
    /// Token id within that collection.
    pub token_id: u64,
}

impl std::fmt::Display for NftReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.chain_id, self.contract_address, self.token_id
        )
    }
}

// ---------------------------------------------------------------------------
// Signing Domain
// ---------------------------------------------------------------------------

/// The domain a voucher digest is bound to: this engine, on this chain.
///
/// Two deployments of the same code never share a domain, so signatures
/// cannot leak between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningDomain {
    /// Domain name ("Fission-Voucher").
    pub name: String,
    /// Encoding version.
    pub version: String,
    /// Chain id of the deployment.
    pub chain_id: u64,
    /// The engine's own contract address.
    pub verifying_contract: Address,
}

impl SigningDomain {
    /// The canonical domain for a deployment at `verifying_contract` on
    /// `chain_id`, using the protocol-wide name and version.
    pub fn for_deployment(chain_id: u64, verifying_contract: Address) -> Self {
        Self {
            name: SIGNING_DOMAIN_NAME.to_string(),
            version: SIGNING_DOMAIN_VERSION.to_string(),
            chain_id,
            verifying_contract,
        }
    }

    /// The 32-byte domain separator mixed into every voucher digest.
    pub fn separator(&self) -> [u8; 32] {
        keccak256_multi(&[
            &keccak256(DOMAIN_TYPE),
            &keccak256(self.name.as_bytes()),
            &keccak256(self.version.as_bytes()),
            &encode_u64(self.chain_id),
            &encode_address(&self.verifying_contract),
        ])
    }
}

// ---------------------------------------------------------------------------
// Voucher
// ---------------------------------------------------------------------------

/// An off-chain signed claim authorizing creation of one token.
///
/// Immutable once signed: any field change produces a different digest, so
/// the recovered signer no longer matches the issuer and the orchestrator
/// rejects the claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voucher {
    /// Metadata URI for the token to be minted (typically `ipfs://…`).
    pub uri: String,
    /// The parent NFT this redemption consumes.
    pub parent_nft: NftReference,
    /// The address the issuer believes owns the parent NFT. Asserted, not
    /// proven — cross-chain ownership verification is explicitly out of
    /// scope, and the redeemer must match this address.
    pub parent_owner: Address,
    /// 65-byte recoverable secp256k1 signature over the digest.
    #[serde(with = "hex")]
    pub signature: Vec<u8>,
}

impl Voucher {
    /// Creates and signs a voucher in one step. This is what the off-chain
    /// issuance tooling (and the test suite) uses.
    pub fn new_signed(
        uri: impl Into<String>,
        parent_nft: NftReference,
        parent_owner: Address,
        domain: &SigningDomain,
        issuer: &IssuerKeypair,
    ) -> Self {
        let mut voucher = Self {
            uri: uri.into(),
            parent_nft,
            parent_owner,
            signature: Vec::new(),
        };
        let digest = voucher.digest(domain);
        voucher.signature = issuer.sign_digest(&digest).to_vec();
        voucher
    }

    /// The hash of the voucher's semantic fields (everything except the
    /// signature itself), per the typed-data encoding: string fields are
    /// hashed, integers and addresses are left-padded to 32 bytes.
    fn struct_hash(&self) -> [u8; 32] {
        keccak256_multi(&[
            &keccak256(VOUCHER_TYPE),
            &keccak256(self.uri.as_bytes()),
            &encode_u64(self.parent_nft.chain_id),
            &encode_address(&self.parent_nft.contract_address),
            &encode_u64(self.parent_nft.token_id),
            &encode_address(&self.parent_owner),
        ])
    }

    /// The full signing digest: `keccak256(0x19 || 0x01 || domain || struct)`.
    ///
    /// Pure function — same voucher, same domain, same digest, forever.
    pub fn digest(&self, domain: &SigningDomain) -> [u8; 32] {
        keccak256_multi(&[&[0x19, 0x01], &domain.separator(), &self.struct_hash()])
    }
}

/// Big-endian encoding of a u64 left-padded to a 32-byte word.
fn encode_u64(value: u64) -> [u8; 32] {
    let mut out = [0u8; 32];
    out[24..].copy_from_slice(&value.to_be_bytes());
    out
}

/// An address left-padded to a 32-byte word.
fn encode_address(address: &Address) -> [u8; 32] {
    let mut out = [0u8; 32];
    out[12..].copy_from_slice(address.as_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use fission_protocol::crypto::recover_address;

    fn test_domain() -> SigningDomain {
        SigningDomain::for_deployment(
            1337,
            "0x00000000000000000000000000000000000000aa".parse().unwrap(),
        )
    }

    fn parent() -> NftReference {
        NftReference {
            chain_id: 1,
            contract_address: "0x1000000000000000000000000000000000000777"
                .parse()
                .unwrap(),
            token_id: 3,
        }
    }

    #[test]
    fn digest_is_deterministic() {
        let issuer = IssuerKeypair::generate();
        let domain = test_domain();
        let v = Voucher::new_signed("ipfs://meta", parent(), issuer.address(), &domain, &issuer);
        assert_eq!(v.digest(&domain), v.digest(&domain));
    }

    #[test]
    fn signature_recovers_to_issuer() {
        let issuer = IssuerKeypair::generate();
        let domain = test_domain();
        let v = Voucher::new_signed("ipfs://meta", parent(), issuer.address(), &domain, &issuer);
        let recovered = recover_address(&v.digest(&domain), &v.signature).unwrap();
        assert_eq!(recovered, issuer.address());
    }

    #[test]
    fn every_field_is_signature_relevant() {
        let issuer = IssuerKeypair::generate();
        let domain = test_domain();
        let base = Voucher::new_signed("ipfs://meta", parent(), issuer.address(), &domain, &issuer);
        let d0 = base.digest(&domain);

        let mut mutated = base.clone();
        mutated.uri = "ipfs://other".into();
        assert_ne!(mutated.digest(&domain), d0);

        let mut mutated = base.clone();
        mutated.parent_nft.chain_id = 2;
        assert_ne!(mutated.digest(&domain), d0);

        let mut mutated = base.clone();
        mutated.parent_nft.token_id = 4;
        assert_ne!(mutated.digest(&domain), d0);

        let mut mutated = base.clone();
        mutated.parent_nft.contract_address =
            "0x2000000000000000000000000000000000000888".parse().unwrap();
        assert_ne!(mutated.digest(&domain), d0);

        let mut mutated = base;
        mutated.parent_owner = Address::ZERO;
        assert_ne!(mutated.digest(&domain), d0);
    }

    #[test]
    fn digest_is_domain_separated() {
        let issuer = IssuerKeypair::generate();
        let domain_a = test_domain();
        let mut domain_b = test_domain();
        domain_b.chain_id = 1;
        let mut domain_c = test_domain();
        domain_c.verifying_contract =
            "0x00000000000000000000000000000000000000bb".parse().unwrap();

        let v = Voucher::new_signed("ipfs://meta", parent(), issuer.address(), &domain_a, &issuer);
        assert_ne!(v.digest(&domain_a), v.digest(&domain_b));
        assert_ne!(v.digest(&domain_a), v.digest(&domain_c));
    }

    #[test]
    fn voucher_serde_roundtrip_preserves_digest() {
        let issuer = IssuerKeypair::generate();
        let domain = test_domain();
        let v = Voucher::new_signed("ipfs://meta", parent(), issuer.address(), &domain, &issuer);

        let json = serde_json::to_string(&v).unwrap();
        let restored: Voucher = serde_json::from_str(&json).unwrap();
        assert_eq!(v, restored);
        assert_eq!(v.digest(&domain), restored.digest(&domain));
    }
}
