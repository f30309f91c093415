//! # Role Registry
//!
//! Exactly two singleton roles, each held by exactly one non-zero address
//! at any time:
//!
//! - **issuer** — the only key whose voucher signatures authorize minting;
//! - **administrator** — rotates both roles and withdraws the treasury.
//!
//! Rotation is atomic: the old holder loses the role in the same state
//! transition the new holder gains it. There is no grant/revoke split and
//! no multi-holder mode — the registry is a pair of explicit fields, not
//! an access-control matrix, which keeps the orchestrator testable as a
//! plain function over state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use fission_protocol::crypto::Address;

/// Authorization failures from role operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoleError {
    /// The caller does not hold the administrator role.
    #[error("caller {0} is not the administrator")]
    NotAdministrator(Address),

    /// The `old` argument does not match the current role holder. Rotation
    /// is compare-and-swap shaped so two racing rotations can't silently
    /// clobber each other.
    #[error("stale rotation: {expected} holds the role, not {provided}")]
    StaleIncumbent {
        /// The actual current holder.
        expected: Address,
        /// The address the caller thought held the role.
        provided: Address,
    },

    /// Roles must always be held by a real address.
    #[error("the zero address cannot hold a role")]
    ZeroAddress,
}

/// Holds the two role slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRegistry {
    issuer: Address,
    administrator: Address,
}

impl RoleRegistry {
    /// Creates the registry with its initial holders.
    ///
    /// # Errors
    ///
    /// Returns [`RoleError::ZeroAddress`] if either initial holder is the
    /// zero address — the "both roles always held" invariant starts here.
    pub fn new(issuer: Address, administrator: Address) -> Result<Self, RoleError> {
        if issuer.is_zero() || administrator.is_zero() {
            return Err(RoleError::ZeroAddress);
        }
        Ok(Self {
            issuer,
            administrator,
        })
    }

    /// The current issuer. Callers must not cache this — authentication
    /// re-reads it on every redemption so rotation takes effect instantly.
    pub fn issuer(&self) -> Address {
        self.issuer
    }

    /// The current administrator.
    pub fn administrator(&self) -> Address {
        self.administrator
    }

    /// Returns an error unless `caller` is the current administrator.
    pub fn require_administrator(&self, caller: Address) -> Result<(), RoleError> {
        if caller != self.administrator {
            return Err(RoleError::NotAdministrator(caller));
        }
        Ok(())
    }

    /// Rotates the issuer role from `old` to `new`. Administrator-gated.
    pub fn rotate_issuer(
        &mut self,
        caller: Address,
        old: Address,
        new: Address,
    ) -> Result<(), RoleError> {
        self.require_administrator(caller)?;
        if new.is_zero() {
            return Err(RoleError::ZeroAddress);
        }
        if old != self.issuer {
            return Err(RoleError::StaleIncumbent {
                expected: self.issuer,
                provided: old,
            });
        }
        self.issuer = new;
        Ok(())
    }

    /// Rotates the administrator role from `old` to `new`. Only the current
    /// administrator may hand the role off, and the handoff is effective
    /// immediately — the old administrator cannot even undo it.
    pub fn rotate_administrator(
        &mut self,
        caller: Address,
        old: Address,
        new: Address,
    ) -> Result<(), RoleError> {
        self.require_administrator(caller)?;
        if new.is_zero() {
            return Err(RoleError::ZeroAddress);
        }
        if old != self.administrator {
            return Err(RoleError::StaleIncumbent {
                expected: self.administrator,
                provided: old,
            });
        }
        self.administrator = new;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address([byte; 20])
    }

    #[test]
    fn new_rejects_zero_holders() {
        assert_eq!(
            RoleRegistry::new(Address::ZERO, addr(2)).unwrap_err(),
            RoleError::ZeroAddress
        );
        assert_eq!(
            RoleRegistry::new(addr(1), Address::ZERO).unwrap_err(),
            RoleError::ZeroAddress
        );
    }

    #[test]
    fn rotation_is_atomic() {
        let mut roles = RoleRegistry::new(addr(1), addr(2)).unwrap();
        roles.rotate_issuer(addr(2), addr(1), addr(3)).unwrap();
        // Old holder is out, new holder is in — same transition.
        assert_eq!(roles.issuer(), addr(3));
    }

    #[test]
    fn non_administrator_cannot_rotate() {
        let mut roles = RoleRegistry::new(addr(1), addr(2)).unwrap();
        let err = roles.rotate_issuer(addr(9), addr(1), addr(3)).unwrap_err();
        assert_eq!(err, RoleError::NotAdministrator(addr(9)));

        // The issuer itself isn't enough either.
        assert!(roles.rotate_issuer(addr(1), addr(1), addr(3)).is_err());
    }

    #[test]
    fn stale_incumbent_rejected() {
        let mut roles = RoleRegistry::new(addr(1), addr(2)).unwrap();
        let err = roles.rotate_issuer(addr(2), addr(7), addr(3)).unwrap_err();
        assert!(matches!(err, RoleError::StaleIncumbent { .. }));
        assert_eq!(roles.issuer(), addr(1));
    }

    #[test]
    fn cannot_rotate_to_zero() {
        let mut roles = RoleRegistry::new(addr(1), addr(2)).unwrap();
        assert_eq!(
            roles
                .rotate_issuer(addr(2), addr(1), Address::ZERO)
                .unwrap_err(),
            RoleError::ZeroAddress
        );
    }

    #[test]
    fn old_administrator_loses_all_capability() {
        let mut roles = RoleRegistry::new(addr(1), addr(2)).unwrap();
        roles.rotate_administrator(addr(2), addr(2), addr(5)).unwrap();
        assert_eq!(roles.administrator(), addr(5));

        // The previous administrator can no longer rotate anything.
        assert!(roles.rotate_issuer(addr(2), addr(1), addr(3)).is_err());
        assert!(roles
            .rotate_administrator(addr(2), addr(5), addr(2))
            .is_err());
        // The new one can.
        roles.rotate_issuer(addr(5), addr(1), addr(3)).unwrap();
    }
}
