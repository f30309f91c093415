//! # Warhead Contract
//!
//! The orchestrator: owns every piece of engine state and exposes the one
//! atomic mutation that matters, [`WarheadContract::redeem`].
//!
//! Redemption runs a fixed validation pipeline; the order is part of the
//! public contract because callers distinguish failures by message:
//!
//! 1. signature — recover the signer from the voucher digest, require the
//!    current issuer;
//! 2. ownership — the redeemer must be the voucher's asserted parent owner;
//! 3. replay — the parent reference must not already be nuked;
//! 4. capacity — the hard supply cap must not be reached;
//! 5. payment — the offered amount must cover the current tier price;
//! 6. level — the would-be radioactivity level must not exceed the maximum;
//! 7. mint — create the token to the issuer, then transfer it to the
//!    redeemer (two events, so history shows who authorized the mint);
//! 8. record — nuke the parent, store the new token's level, take payment,
//!    bump the supply counter.
//!
//! Steps 1 through 6 are pure reads. Nothing is written until every check
//! has passed, so a failed redemption leaves no observable trace.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use fission_protocol::config::{MAX_RADIOACTIVITY_LEVEL, MAX_SUPPLY};
use fission_protocol::crypto::{recover_address, Address};

use crate::ledger::ProvenanceLedger;
use crate::pricing::price_of;
use crate::roles::{RoleError, RoleRegistry};
use crate::token::{TokenError, TokenLedger};
use crate::voucher::{NftReference, SigningDomain, Voucher};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a redemption was rejected. The display strings are stable — clients
/// and the RPC layer match on them verbatim.
#[derive(Debug, Error)]
pub enum RedeemError {
    /// The signature does not recover to the current issuer (or does not
    /// recover at all). Deliberately does not say which.
    #[error("Signature invalid or unauthorized")]
    InvalidSignature,

    /// The redeemer is not the address the voucher asserts as parent owner.
    #[error("The redeemer should own this NFT")]
    NotParentOwner,

    /// The parent reference was already consumed by an earlier redemption.
    #[error("This NFT has already been nuked")]
    AlreadyNuked,

    /// The hard supply cap has been reached.
    #[error("All the nucleart warheads have been used")]
    SupplyExhausted,

    /// The offered payment does not cover the current tier price.
    #[error("Insufficient funds to redeem")]
    InsufficientFunds,

    /// The chained radioactivity level would exceed the maximum.
    #[error("This NFT reached its maximum level of radioactivity")]
    MaxRadioactivity,

    /// A token-layer invariant failed during minting. With the pipeline's
    /// own guards in front this should never surface, but the token ledger
    /// keeps its checks and we propagate rather than unwrap.
    #[error(transparent)]
    Token(#[from] TokenError),
}

/// Errors from withdrawals.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WithdrawError {
    /// Only the administrator may withdraw.
    #[error(transparent)]
    Unauthorized(#[from] RoleError),

    /// The requested amount exceeds the treasury balance.
    #[error("withdrawal of {requested} exceeds treasury balance {available}")]
    InsufficientTreasury {
        /// Amount asked for.
        requested: u128,
        /// What the treasury actually holds.
        available: u128,
    },

    /// Funds cannot be sent to the zero address.
    #[error("cannot withdraw to the zero address")]
    ZeroRecipient,
}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

/// The deployed engine: roles, ledgers, counters and treasury under one
/// root, mutated only through its methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarheadContract {
    /// This deployment's own address, used for the signing domain and for
    /// recognizing chained parents.
    address: Address,
    /// Chain id of the deployment.
    chain_id: u64,
    roles: RoleRegistry,
    ledger: ProvenanceLedger,
    tokens: TokenLedger,
    /// Tokens minted so far; also the next token id.
    minted: u64,
    /// Hard issuance cap. [`MAX_SUPPLY`] in production deployments.
    max_supply: u64,
    /// Payments accumulated and not yet withdrawn.
    treasury: u128,
}

impl WarheadContract {
    /// Deploys a fresh engine at `address` on `chain_id` with the given
    /// initial role holders.
    pub fn new(
        address: Address,
        chain_id: u64,
        issuer: Address,
        administrator: Address,
    ) -> Result<Self, RoleError> {
        Ok(Self {
            address,
            chain_id,
            roles: RoleRegistry::new(issuer, administrator)?,
            ledger: ProvenanceLedger::new(),
            tokens: TokenLedger::new(),
            minted: 0,
            max_supply: MAX_SUPPLY,
            treasury: 0,
        })
    }

    /// Overrides the supply cap. Intended for tests; exhausting 13k+
    /// redemptions to exercise the cap is not a reasonable test budget.
    pub fn with_max_supply(mut self, max_supply: u64) -> Self {
        self.max_supply = max_supply;
        self
    }

    /// The signing domain vouchers for this deployment must be bound to.
    pub fn signing_domain(&self) -> SigningDomain {
        SigningDomain::for_deployment(self.chain_id, self.address)
    }

    // -- Queries ------------------------------------------------------------

    /// This deployment's address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The chain id this engine considers its own.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// How many warheads have been minted so far.
    pub fn minted(&self) -> u64 {
        self.minted
    }

    /// The configured supply cap.
    pub fn max_supply(&self) -> u64 {
        self.max_supply
    }

    /// Accumulated, unwithdrawn payments.
    pub fn treasury(&self) -> u128 {
        self.treasury
    }

    /// The current issuer address.
    pub fn issuer(&self) -> Address {
        self.roles.issuer()
    }

    /// The current administrator address.
    pub fn administrator(&self) -> Address {
        self.roles.administrator()
    }

    /// The radioactivity level recorded for any NFT reference. Defaults to
    /// 0 for references the engine has never seen.
    pub fn get_level(&self, reference: &NftReference) -> u8 {
        self.ledger.level_of(reference)
    }

    /// Whether `reference` has already been consumed as a parent.
    pub fn is_nuked(&self, reference: &NftReference) -> bool {
        self.ledger.is_nuked(reference)
    }

    /// Read access to the token ledger (owners, URIs, event history).
    pub fn tokens(&self) -> &TokenLedger {
        &self.tokens
    }

    // -- Redemption ---------------------------------------------------------

    /// Redeems a voucher: validates everything, then mints the next token
    /// id to the redeemer and consumes the parent reference. Returns the
    /// minted token id.
    ///
    /// # Errors
    ///
    /// One [`RedeemError`] per pipeline step, checked strictly in order, so
    /// a voucher failing several checks reports the earliest one.
    pub fn redeem(
        &mut self,
        redeemer: Address,
        voucher: &Voucher,
        payment: u128,
    ) -> Result<u64, RedeemError> {
        // 1. Signature. Recovery failures collapse into the same error as
        //    wrong-signer: callers learn nothing about which byte was off.
        let digest = voucher.digest(&self.signing_domain());
        let signer = recover_address(&digest, &voucher.signature)
            .map_err(|_| RedeemError::InvalidSignature)?;
        if signer != self.roles.issuer() {
            return Err(RedeemError::InvalidSignature);
        }

        // 2. Ownership assertion.
        if redeemer != voucher.parent_owner {
            return Err(RedeemError::NotParentOwner);
        }

        // 3. Replay.
        if self.ledger.is_nuked(&voucher.parent_nft) {
            return Err(RedeemError::AlreadyNuked);
        }

        // 4. Capacity.
        if self.minted >= self.max_supply {
            return Err(RedeemError::SupplyExhausted);
        }

        // 5. Payment, priced at the index this token will occupy.
        let price = price_of(self.minted);
        if payment < price {
            return Err(RedeemError::InsufficientFunds);
        }

        // 6. Level.
        let level = self.next_level(&voucher.parent_nft);
        if level > MAX_RADIOACTIVITY_LEVEL {
            return Err(RedeemError::MaxRadioactivity);
        }

        // All checks passed; from here on every write must succeed.
        let token_id = self.minted;
        let issuer = self.roles.issuer();

        // 7. Mint to the issuer, then hand over to the redeemer.
        self.tokens.mint(issuer, token_id, voucher.uri.clone())?;
        self.tokens.transfer(issuer, redeemer, token_id)?;

        // 8. Record provenance, take payment, bump supply.
        let minted_ref = NftReference {
            chain_id: self.chain_id,
            contract_address: self.address,
            token_id,
        };
        self.ledger
            .record_redemption(voucher.parent_nft, minted_ref, level)
            .map_err(|_| RedeemError::AlreadyNuked)?;
        self.treasury = self.treasury.saturating_add(payment);
        self.minted += 1;

        info!(
            token_id,
            level,
            price,
            parent = %voucher.parent_nft,
            %redeemer,
            "warhead redeemed"
        );
        Ok(token_id)
    }

    /// The radioactivity level a redemption of `parent` would produce:
    /// one above the parent when the parent is a warhead this very engine
    /// minted, otherwise 0. An arbitrary reference that merely *names* our
    /// address but was never issued here stays at 0 — the ledger entry is
    /// the proof of issuance.
    fn next_level(&self, parent: &NftReference) -> u8 {
        let is_ours = parent.chain_id == self.chain_id
            && parent.contract_address == self.address
            && self.ledger.has_entry(parent);
        if is_ours {
            self.ledger.level_of(parent) + 1
        } else {
            0
        }
    }

    // -- Administration -----------------------------------------------------

    /// Rotates the issuer role. Administrator only. Takes effect on the
    /// next redemption: outstanding vouchers from the old issuer die
    /// immediately.
    pub fn rotate_issuer(
        &mut self,
        caller: Address,
        old: Address,
        new: Address,
    ) -> Result<(), RoleError> {
        self.roles.rotate_issuer(caller, old, new)?;
        info!(%old, %new, "issuer rotated");
        Ok(())
    }

    /// Rotates the administrator role. Administrator only.
    pub fn rotate_administrator(
        &mut self,
        caller: Address,
        old: Address,
        new: Address,
    ) -> Result<(), RoleError> {
        self.roles.rotate_administrator(caller, old, new)?;
        info!(%old, %new, "administrator rotated");
        Ok(())
    }

    /// Withdraws `amount` from the treasury to `to`. Administrator only.
    pub fn withdraw(
        &mut self,
        caller: Address,
        to: Address,
        amount: u128,
    ) -> Result<(), WithdrawError> {
        self.roles.require_administrator(caller)?;
        if to.is_zero() {
            return Err(WithdrawError::ZeroRecipient);
        }
        if amount > self.treasury {
            return Err(WithdrawError::InsufficientTreasury {
                requested: amount,
                available: self.treasury,
            });
        }
        self.treasury -= amount;
        debug!(amount, %to, remaining = self.treasury, "treasury withdrawal");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fission_protocol::crypto::IssuerKeypair;

    fn addr(byte: u8) -> Address {
        Address([byte; 20])
    }

    struct Fixture {
        issuer: IssuerKeypair,
        contract: WarheadContract,
    }

    impl Fixture {
        fn new() -> Self {
            let issuer = IssuerKeypair::generate();
            let contract =
                WarheadContract::new(addr(0xEE), 1337, issuer.address(), addr(0xAD)).unwrap();
            Self { issuer, contract }
        }

        fn voucher_for(&self, parent: NftReference, owner: Address) -> Voucher {
            Voucher::new_signed(
                "ipfs://warhead",
                parent,
                owner,
                &self.contract.signing_domain(),
                &self.issuer,
            )
        }
    }

    fn external_parent(token_id: u64) -> NftReference {
        NftReference {
            chain_id: 1,
            contract_address: addr(0x99),
            token_id,
        }
    }

    #[test]
    fn successful_redemption_mints_token_zero() {
        let mut f = Fixture::new();
        let redeemer = addr(0x01);
        let voucher = f.voucher_for(external_parent(7), redeemer);

        let id = f.contract.redeem(redeemer, &voucher, 0).unwrap();
        assert_eq!(id, 0);
        assert_eq!(f.contract.minted(), 1);
        assert_eq!(f.contract.tokens().owner_of(0).unwrap(), redeemer);
        assert!(f.contract.is_nuked(&external_parent(7)));
    }

    #[test]
    fn redemption_emits_mint_then_handover() {
        let mut f = Fixture::new();
        let redeemer = addr(0x01);
        let issuer_addr = f.issuer.address();
        let voucher = f.voucher_for(external_parent(7), redeemer);
        f.contract.redeem(redeemer, &voucher, 0).unwrap();

        let events = f.contract.tokens().events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].from, Address::ZERO);
        assert_eq!(events[0].to, issuer_addr);
        assert_eq!(events[1].from, issuer_addr);
        assert_eq!(events[1].to, redeemer);
    }

    #[test]
    fn wrong_signer_is_rejected_first() {
        let mut f = Fixture::new();
        let stranger = IssuerKeypair::generate();
        let redeemer = addr(0x01);
        // Signed by a non-issuer AND naming the wrong owner: the signature
        // failure must win.
        let voucher = Voucher::new_signed(
            "ipfs://warhead",
            external_parent(7),
            addr(0x02),
            &f.contract.signing_domain(),
            &stranger,
        );
        let err = f.contract.redeem(redeemer, &voucher, 0).unwrap_err();
        assert_eq!(err.to_string(), "Signature invalid or unauthorized");
    }

    #[test]
    fn mutated_voucher_is_rejected() {
        let mut f = Fixture::new();
        let redeemer = addr(0x01);
        let mut voucher = f.voucher_for(external_parent(7), redeemer);
        voucher.uri = "ipfs://tampered".into();

        let err = f.contract.redeem(redeemer, &voucher, 0).unwrap_err();
        assert!(matches!(err, RedeemError::InvalidSignature));
    }

    #[test]
    fn redeemer_must_match_asserted_owner() {
        let mut f = Fixture::new();
        let voucher = f.voucher_for(external_parent(7), addr(0x01));
        let err = f.contract.redeem(addr(0x02), &voucher, 0).unwrap_err();
        assert_eq!(err.to_string(), "The redeemer should own this NFT");
    }

    #[test]
    fn replay_fails_and_leaves_no_trace() {
        let mut f = Fixture::new();
        let redeemer = addr(0x01);
        let voucher = f.voucher_for(external_parent(7), redeemer);
        f.contract.redeem(redeemer, &voucher, 0).unwrap();

        let minted_before = f.contract.minted();
        let treasury_before = f.contract.treasury();
        let err = f.contract.redeem(redeemer, &voucher, 0).unwrap_err();
        assert_eq!(err.to_string(), "This NFT has already been nuked");
        assert_eq!(f.contract.minted(), minted_before);
        assert_eq!(f.contract.treasury(), treasury_before);
        assert!(!f.contract.tokens().exists(1));
    }

    #[test]
    fn supply_cap_is_enforced() {
        let mut f = Fixture::new();
        f.contract = f.contract.clone().with_max_supply(2);
        let redeemer = addr(0x01);

        for parent_id in 0..2 {
            let voucher = f.voucher_for(external_parent(parent_id), redeemer);
            f.contract.redeem(redeemer, &voucher, 0).unwrap();
        }
        let voucher = f.voucher_for(external_parent(99), redeemer);
        let err = f.contract.redeem(redeemer, &voucher, 0).unwrap_err();
        assert_eq!(err.to_string(), "All the nucleart warheads have been used");
        assert_eq!(f.contract.minted(), 2);
    }

    #[test]
    fn payment_is_checked_against_current_tier() {
        let mut f = Fixture::new();
        let redeemer = addr(0x01);

        // Burn through the free tier.
        for parent_id in 0..80 {
            let voucher = f.voucher_for(external_parent(parent_id), redeemer);
            f.contract.redeem(redeemer, &voucher, 0).unwrap();
        }

        // Index 80 costs 1.
        let voucher = f.voucher_for(external_parent(1000), redeemer);
        let err = f.contract.redeem(redeemer, &voucher, 0).unwrap_err();
        assert_eq!(err.to_string(), "Insufficient funds to redeem");

        f.contract.redeem(redeemer, &voucher, 1).unwrap();
        assert_eq!(f.contract.treasury(), 1);
    }

    #[test]
    fn overpayment_is_kept() {
        let mut f = Fixture::new();
        let redeemer = addr(0x01);
        let voucher = f.voucher_for(external_parent(7), redeemer);
        f.contract.redeem(redeemer, &voucher, 500).unwrap();
        assert_eq!(f.contract.treasury(), 500);
    }

    #[test]
    fn chaining_increments_radioactivity() {
        let mut f = Fixture::new();
        let redeemer = addr(0x01);

        // Level 0 from an external parent.
        let voucher = f.voucher_for(external_parent(7), redeemer);
        let id0 = f.contract.redeem(redeemer, &voucher, 0).unwrap();

        // Redeem the freshly minted warhead as the next parent.
        let chained = NftReference {
            chain_id: f.contract.chain_id(),
            contract_address: f.contract.address(),
            token_id: id0,
        };
        let voucher = f.voucher_for(chained, redeemer);
        let id1 = f.contract.redeem(redeemer, &voucher, 0).unwrap();

        let minted_ref = NftReference {
            chain_id: f.contract.chain_id(),
            contract_address: f.contract.address(),
            token_id: id1,
        };
        assert_eq!(f.contract.get_level(&minted_ref), 1);
    }

    #[test]
    fn self_addressed_but_never_minted_parent_stays_level_zero() {
        let mut f = Fixture::new();
        let redeemer = addr(0x01);
        // Names our chain and address, but token 555 was never issued.
        let impostor = NftReference {
            chain_id: f.contract.chain_id(),
            contract_address: f.contract.address(),
            token_id: 555,
        };
        let voucher = f.voucher_for(impostor, redeemer);
        let id = f.contract.redeem(redeemer, &voucher, 0).unwrap();

        let minted_ref = NftReference {
            chain_id: f.contract.chain_id(),
            contract_address: f.contract.address(),
            token_id: id,
        };
        assert_eq!(f.contract.get_level(&minted_ref), 0);
    }

    #[test]
    fn radioactivity_caps_at_maximum() {
        let mut f = Fixture::new();
        let redeemer = addr(0x01);

        let mut parent = external_parent(7);
        // Walk the chain up to the maximum level.
        for expected_level in 0..=MAX_RADIOACTIVITY_LEVEL {
            let voucher = f.voucher_for(parent, redeemer);
            let id = f.contract.redeem(redeemer, &voucher, 0).unwrap();
            let minted_ref = NftReference {
                chain_id: f.contract.chain_id(),
                contract_address: f.contract.address(),
                token_id: id,
            };
            assert_eq!(f.contract.get_level(&minted_ref), expected_level);
            parent = minted_ref;
        }

        // One more hop would be level 6.
        let voucher = f.voucher_for(parent, redeemer);
        let err = f.contract.redeem(redeemer, &voucher, 0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "This NFT reached its maximum level of radioactivity"
        );
    }

    #[test]
    fn issuer_rotation_invalidates_outstanding_vouchers() {
        let mut f = Fixture::new();
        let redeemer = addr(0x01);
        let stale = f.voucher_for(external_parent(7), redeemer);

        let new_issuer = IssuerKeypair::generate();
        f.contract
            .rotate_issuer(addr(0xAD), f.issuer.address(), new_issuer.address())
            .unwrap();

        let err = f.contract.redeem(redeemer, &stale, 0).unwrap_err();
        assert!(matches!(err, RedeemError::InvalidSignature));

        // A voucher from the new issuer works.
        let fresh = Voucher::new_signed(
            "ipfs://warhead",
            external_parent(7),
            redeemer,
            &f.contract.signing_domain(),
            &new_issuer,
        );
        f.contract.redeem(redeemer, &fresh, 0).unwrap();
    }

    #[test]
    fn withdraw_is_administrator_gated() {
        let mut f = Fixture::new();
        let redeemer = addr(0x01);
        let voucher = f.voucher_for(external_parent(7), redeemer);
        f.contract.redeem(redeemer, &voucher, 100).unwrap();

        assert!(matches!(
            f.contract.withdraw(addr(0x01), addr(0x02), 50),
            Err(WithdrawError::Unauthorized(_))
        ));
        f.contract.withdraw(addr(0xAD), addr(0x02), 60).unwrap();
        assert_eq!(f.contract.treasury(), 40);

        assert!(matches!(
            f.contract.withdraw(addr(0xAD), addr(0x02), 41),
            Err(WithdrawError::InsufficientTreasury { .. })
        ));
    }
}
