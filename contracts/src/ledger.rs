//! # Provenance Ledger
//!
//! The keyed store behind both the anti-replay guard and the radioactivity
//! chain. Every [`NftReference`] maps to at most one [`LedgerEntry`]; a
//! reference with no entry implicitly has `nuked = false, level = 0`.
//!
//! Entries are written exactly once per fact and never deleted:
//!
//! - a parent reference's `nuked` flag flips false→true the first (and
//!   only) time it is redeemed against;
//! - a minted token's `level` is recorded at mint time and never changes.
//!
//! Keying is by *value* — `NftReference` equality across chains is exactly
//! field equality, with no notion of object identity.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::voucher::NftReference;

/// Errors from ledger writes.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The reference was already consumed by an earlier redemption.
    #[error("This NFT has already been nuked")]
    AlreadyNuked(NftReference),
}

/// Per-reference provenance state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Whether this reference has been consumed as a redemption parent.
    pub nuked: bool,
    /// Radioactivity level recorded when this reference was minted by the
    /// engine. 0 for external references.
    pub level: u8,
}

/// The provenance ledger: an explicit keyed store over NFT references.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvenanceLedger {
    entries: HashMap<NftReference, LedgerEntry>,
}

impl ProvenanceLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `reference` has already been consumed as a parent. O(1),
    /// default false.
    pub fn is_nuked(&self, reference: &NftReference) -> bool {
        self.entries.get(reference).map_or(false, |e| e.nuked)
    }

    /// The recorded radioactivity level of `reference`. O(1), default 0.
    pub fn level_of(&self, reference: &NftReference) -> u8 {
        self.entries.get(reference).map_or(0, |e| e.level)
    }

    /// Whether the ledger knows this reference at all. Used by the level
    /// computation to tell an engine-minted token apart from an arbitrary
    /// same-address reference that was never issued.
    pub fn has_entry(&self, reference: &NftReference) -> bool {
        self.entries.contains_key(reference)
    }

    /// Records a successful redemption: marks `parent` as nuked and stores
    /// `level` against the freshly `minted` reference.
    ///
    /// The parent's previously recorded level (if it was itself minted by
    /// the engine) is preserved — levels are set once and never change.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AlreadyNuked`] if `parent` was already
    /// consumed. The orchestrator checks this earlier in the pipeline; the
    /// guard here keeps the ledger self-consistent no matter who calls it.
    pub fn record_redemption(
        &mut self,
        parent: NftReference,
        minted: NftReference,
        level: u8,
    ) -> Result<(), LedgerError> {
        let parent_entry = self.entries.entry(parent).or_default();
        if parent_entry.nuked {
            return Err(LedgerError::AlreadyNuked(parent));
        }
        parent_entry.nuked = true;

        let minted_entry = self.entries.entry(minted).or_default();
        minted_entry.level = level;

        Ok(())
    }

    /// Number of references the ledger has seen.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no redemption has ever been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fission_protocol::crypto::Address;

    fn reference(token_id: u64) -> NftReference {
        NftReference {
            chain_id: 1,
            contract_address: Address([0x77; 20]),
            token_id,
        }
    }

    #[test]
    fn unknown_reference_defaults() {
        let ledger = ProvenanceLedger::new();
        assert!(!ledger.is_nuked(&reference(0)));
        assert_eq!(ledger.level_of(&reference(0)), 0);
        assert!(!ledger.has_entry(&reference(0)));
    }

    #[test]
    fn record_marks_parent_and_levels_minted() {
        let mut ledger = ProvenanceLedger::new();
        ledger.record_redemption(reference(0), reference(100), 3).unwrap();

        assert!(ledger.is_nuked(&reference(0)));
        assert!(!ledger.is_nuked(&reference(100)));
        assert_eq!(ledger.level_of(&reference(100)), 3);
        assert!(ledger.has_entry(&reference(100)));
    }

    #[test]
    fn double_nuke_rejected() {
        let mut ledger = ProvenanceLedger::new();
        ledger.record_redemption(reference(0), reference(100), 0).unwrap();
        let err = ledger
            .record_redemption(reference(0), reference(101), 0)
            .unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyNuked(_)));
    }

    #[test]
    fn nuking_a_minted_token_preserves_its_level() {
        let mut ledger = ProvenanceLedger::new();
        // Token 100 minted at level 2, then later consumed as a parent.
        ledger.record_redemption(reference(0), reference(100), 2).unwrap();
        ledger.record_redemption(reference(100), reference(101), 3).unwrap();

        assert!(ledger.is_nuked(&reference(100)));
        assert_eq!(ledger.level_of(&reference(100)), 2);
        assert_eq!(ledger.level_of(&reference(101)), 3);
    }

    #[test]
    fn references_differ_by_any_field() {
        let mut ledger = ProvenanceLedger::new();
        ledger.record_redemption(reference(0), reference(100), 0).unwrap();

        let other_chain = NftReference {
            chain_id: 2,
            ..reference(0)
        };
        assert!(!ledger.is_nuked(&other_chain));

        let other_contract = NftReference {
            contract_address: Address([0x88; 20]),
            ..reference(0)
        };
        assert!(!ledger.is_nuked(&other_contract));
    }

    #[test]
    fn failed_write_leaves_no_trace() {
        let mut ledger = ProvenanceLedger::new();
        ledger.record_redemption(reference(0), reference(100), 0).unwrap();
        let before = ledger.len();

        // Replayed parent: the minted side must not be created either.
        assert!(ledger
            .record_redemption(reference(0), reference(200), 1)
            .is_err());
        assert_eq!(ledger.len(), before);
        assert!(!ledger.has_entry(&reference(200)));
    }
}
