//! # Token Ledger
//!
//! A minimal non-fungible ownership ledger: one owner per token id, a
//! metadata URI per token, per-address balances, and an append-only
//! transfer event log.
//!
//! Mints are modelled as transfers from the zero address, so the event log
//! alone reconstructs full ownership history. The redemption orchestrator
//! mints to the issuer and immediately transfers to the redeemer, which is
//! why a single redemption appends *two* events.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use fission_protocol::crypto::Address;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from token ledger operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// A token with this id already exists. Ids are never reused.
    #[error("token already minted")]
    AlreadyMinted(u64),

    /// The token id does not exist.
    #[error("token {0} does not exist")]
    NonexistentToken(u64),

    /// `from` is not the current owner of the token.
    #[error("transfer of token {token_id} from non-owner {from}")]
    NotOwner {
        /// The claimed sender.
        from: Address,
        /// The token being transferred.
        token_id: u64,
    },

    /// Tokens cannot be minted to or transferred to the zero address.
    #[error("invalid zero address recipient")]
    ZeroRecipient,
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One entry in the append-only transfer log. Mints carry
/// `from == Address::ZERO`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEvent {
    /// Previous owner, or the zero address for a mint.
    pub from: Address,
    /// New owner.
    pub to: Address,
    /// The token that moved.
    pub token_id: u64,
}

/// Ownership, metadata and event state for the non-fungible collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenLedger {
    owners: HashMap<u64, Address>,
    uris: HashMap<u64, String>,
    balances: HashMap<Address, u64>,
    events: Vec<TransferEvent>,
}

impl TokenLedger {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current owner of `token_id`.
    pub fn owner_of(&self, token_id: u64) -> Result<Address, TokenError> {
        self.owners
            .get(&token_id)
            .copied()
            .ok_or(TokenError::NonexistentToken(token_id))
    }

    /// How many tokens `owner` currently holds. Default 0.
    pub fn balance_of(&self, owner: Address) -> u64 {
        self.balances.get(&owner).copied().unwrap_or(0)
    }

    /// The metadata URI recorded at mint time.
    pub fn token_uri(&self, token_id: u64) -> Result<&str, TokenError> {
        self.uris
            .get(&token_id)
            .map(String::as_str)
            .ok_or(TokenError::NonexistentToken(token_id))
    }

    /// Whether `token_id` has been minted.
    pub fn exists(&self, token_id: u64) -> bool {
        self.owners.contains_key(&token_id)
    }

    /// Mints `token_id` to `to` with the given metadata URI, appending a
    /// zero-origin transfer event.
    ///
    /// # Errors
    ///
    /// Fails with [`TokenError::AlreadyMinted`] if the id exists — ids are
    /// assigned once and never recycled — and [`TokenError::ZeroRecipient`]
    /// for a zero-address recipient.
    pub fn mint(
        &mut self,
        to: Address,
        token_id: u64,
        uri: impl Into<String>,
    ) -> Result<(), TokenError> {
        if to.is_zero() {
            return Err(TokenError::ZeroRecipient);
        }
        if self.owners.contains_key(&token_id) {
            return Err(TokenError::AlreadyMinted(token_id));
        }
        self.owners.insert(token_id, to);
        self.uris.insert(token_id, uri.into());
        *self.balances.entry(to).or_insert(0) += 1;
        self.events.push(TransferEvent {
            from: Address::ZERO,
            to,
            token_id,
        });
        Ok(())
    }

    /// Transfers `token_id` from its current owner to `to`, appending a
    /// transfer event. `from` must be the current owner.
    pub fn transfer(&mut self, from: Address, to: Address, token_id: u64) -> Result<(), TokenError> {
        if to.is_zero() {
            return Err(TokenError::ZeroRecipient);
        }
        let owner = self.owner_of(token_id)?;
        if owner != from {
            return Err(TokenError::NotOwner { from, token_id });
        }
        self.owners.insert(token_id, to);
        if let Some(balance) = self.balances.get_mut(&from) {
            *balance = balance.saturating_sub(1);
        }
        *self.balances.entry(to).or_insert(0) += 1;
        self.events.push(TransferEvent { from, to, token_id });
        Ok(())
    }

    /// The full transfer history, oldest first.
    pub fn events(&self) -> &[TransferEvent] {
        &self.events
    }

    /// Total number of tokens ever minted.
    pub fn total_minted(&self) -> u64 {
        self.owners.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address([byte; 20])
    }

    #[test]
    fn mint_assigns_owner_uri_and_event() {
        let mut tokens = TokenLedger::new();
        tokens.mint(addr(1), 0, "ipfs://zero").unwrap();

        assert_eq!(tokens.owner_of(0).unwrap(), addr(1));
        assert_eq!(tokens.token_uri(0).unwrap(), "ipfs://zero");
        assert_eq!(tokens.balance_of(addr(1)), 1);
        assert_eq!(
            tokens.events(),
            &[TransferEvent {
                from: Address::ZERO,
                to: addr(1),
                token_id: 0
            }]
        );
    }

    #[test]
    fn duplicate_mint_rejected() {
        let mut tokens = TokenLedger::new();
        tokens.mint(addr(1), 0, "ipfs://zero").unwrap();
        let err = tokens.mint(addr(2), 0, "ipfs://again").unwrap_err();
        assert_eq!(err, TokenError::AlreadyMinted(0));
        assert_eq!(err.to_string(), "token already minted");

        // Original state untouched.
        assert_eq!(tokens.owner_of(0).unwrap(), addr(1));
        assert_eq!(tokens.token_uri(0).unwrap(), "ipfs://zero");
    }

    #[test]
    fn transfer_moves_ownership_and_balances() {
        let mut tokens = TokenLedger::new();
        tokens.mint(addr(1), 0, "ipfs://zero").unwrap();
        tokens.transfer(addr(1), addr(2), 0).unwrap();

        assert_eq!(tokens.owner_of(0).unwrap(), addr(2));
        assert_eq!(tokens.balance_of(addr(1)), 0);
        assert_eq!(tokens.balance_of(addr(2)), 1);
        assert_eq!(tokens.events().len(), 2);
    }

    #[test]
    fn transfer_from_non_owner_rejected() {
        let mut tokens = TokenLedger::new();
        tokens.mint(addr(1), 0, "ipfs://zero").unwrap();
        let err = tokens.transfer(addr(3), addr(2), 0).unwrap_err();
        assert!(matches!(err, TokenError::NotOwner { .. }));
        assert_eq!(tokens.owner_of(0).unwrap(), addr(1));
    }

    #[test]
    fn zero_address_never_receives() {
        let mut tokens = TokenLedger::new();
        assert_eq!(
            tokens.mint(Address::ZERO, 0, "ipfs://zero").unwrap_err(),
            TokenError::ZeroRecipient
        );
        tokens.mint(addr(1), 0, "ipfs://zero").unwrap();
        assert_eq!(
            tokens.transfer(addr(1), Address::ZERO, 0).unwrap_err(),
            TokenError::ZeroRecipient
        );
    }

    #[test]
    fn nonexistent_token_queries_fail() {
        let tokens = TokenLedger::new();
        assert_eq!(
            tokens.owner_of(42).unwrap_err(),
            TokenError::NonexistentToken(42)
        );
        assert_eq!(
            tokens.token_uri(42).unwrap_err(),
            TokenError::NonexistentToken(42)
        );
        assert!(!tokens.exists(42));
    }
}
