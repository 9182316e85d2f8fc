//! The types of errors that might occur throughout invariant checking.

use crate::validate::{DeltaReport, OwnerReport};
use statefence_types::{delta::InvalidDeltaConstraint, Address, Hash, Key, Word};
use thiserror::Error;

/// The top-level error type for invariant checking.
///
/// Every variant is fatal to the protected operation it was raised from.
#[derive(Debug, Error)]
pub enum InvariantError {
    #[error("position list and expected deltas differ in length")]
    LengthMismatch,
    #[error("{0} positions exceed the maximum of {max}", max = crate::MAX_POSITIONS)]
    ArrayTooLarge(usize),
    #[error("nonce invariants are not supported")]
    UnsupportedInvariant,
    #[error(transparent)]
    InvalidDeltaConstraint(#[from] InvalidDeltaConstraint),
    #[error("code hash changed from {before:?} to {after:?}")]
    Code { before: Hash, after: Hash },
    #[error("native balance invariant violated: {0}")]
    Balance(DeltaReport),
    #[error("storage invariant violated: {report}")]
    Storage { keys: Vec<Key>, report: DeltaReport },
    #[error("transient storage invariant violated: {report}")]
    TransientStorage { keys: Vec<Key>, report: DeltaReport },
    #[error("external balance invariant violated: {report}")]
    ExtEthBalance {
        accounts: Vec<Address>,
        report: DeltaReport,
    },
    #[error("ERC-20 balance invariant of {account:?} violated: {report}")]
    Erc20Balance {
        account: Address,
        tokens: Vec<Address>,
        report: DeltaReport,
    },
    #[error("ERC-721 balance invariant of {account:?} violated: {report}")]
    Erc721Balance {
        account: Address,
        tokens: Vec<Address>,
        report: DeltaReport,
    },
    #[error("ERC-721 owner invariant violated: {report}")]
    Erc721Owner {
        tokens: Vec<(Address, Word)>,
        report: OwnerReport,
    },
    #[error("failed to read state: {0}")]
    State(#[from] anyhow::Error),
}

impl InvariantError {
    /// Whether this error reports an observed violation, as opposed to a
    /// misconfigured check or a failed read.
    pub fn is_violation(&self) -> bool {
        matches!(
            self,
            Self::Code { .. }
                | Self::Balance(_)
                | Self::Storage { .. }
                | Self::TransientStorage { .. }
                | Self::ExtEthBalance { .. }
                | Self::Erc20Balance { .. }
                | Self::Erc721Balance { .. }
                | Self::Erc721Owner { .. }
        )
    }

    /// The delta report carried by a numeric violation.
    pub fn delta_report(&self) -> Option<&DeltaReport> {
        match self {
            Self::Balance(report)
            | Self::Storage { report, .. }
            | Self::TransientStorage { report, .. }
            | Self::ExtEthBalance { report, .. }
            | Self::Erc20Balance { report, .. }
            | Self::Erc721Balance { report, .. } => Some(report),
            _ => None,
        }
    }
}
