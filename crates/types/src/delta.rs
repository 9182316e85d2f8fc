//! The delta constraint tag.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How the after-value of a checked position must relate to its before-value.
///
/// `Increase*` and `Decrease*` variants also fix the direction of the change:
/// an observed change in the opposite direction is a violation in itself.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum DeltaConstraint {
    /// `before == after`.
    NoChange = 0,
    /// `after - before == delta`.
    IncreaseExact = 1,
    /// `after - before <= delta`.
    IncreaseMax = 2,
    /// `after - before >= delta`.
    IncreaseMin = 3,
    /// `before - after == delta`.
    DecreaseExact = 4,
    /// `before - after <= delta`.
    DecreaseMax = 5,
    /// `before - after >= delta`.
    DecreaseMin = 6,
}

/// A raw tag that does not name a [`DeltaConstraint`].
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error("invalid delta constraint tag {0}")]
pub struct InvalidDeltaConstraint(pub u8);

impl DeltaConstraint {
    /// All constraints in tag order.
    pub const ALL: [Self; 7] = [
        Self::NoChange,
        Self::IncreaseExact,
        Self::IncreaseMax,
        Self::IncreaseMin,
        Self::DecreaseExact,
        Self::DecreaseMax,
        Self::DecreaseMin,
    ];
}

impl From<DeltaConstraint> for u8 {
    fn from(constraint: DeltaConstraint) -> Self {
        constraint as u8
    }
}

impl TryFrom<u8> for DeltaConstraint {
    type Error = InvalidDeltaConstraint;
    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(tag))
            .copied()
            .ok_or(InvalidDeltaConstraint(tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_match_declaration_order() {
        for (tag, constraint) in DeltaConstraint::ALL.iter().enumerate() {
            assert_eq!(u8::from(*constraint) as usize, tag);
            assert_eq!(DeltaConstraint::try_from(tag as u8), Ok(*constraint));
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert_eq!(
            DeltaConstraint::try_from(7),
            Err(InvalidDeltaConstraint(7))
        );
        assert_eq!(
            DeltaConstraint::try_from(u8::MAX),
            Err(InvalidDeltaConstraint(u8::MAX))
        );
    }
}
