//! The delta constraint evaluator.

use crate::error::InvariantError;
use serde::{Deserialize, Serialize};
use statefence_types::{DeltaConstraint, Word};

/// A constraint paired with the delta it is checked against.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Expect {
    /// How the after-value must relate to the before-value.
    pub constraint: DeltaConstraint,
    /// The delta the constraint is measured against. Ignored by `NoChange`.
    pub delta: Word,
}

impl Expect {
    /// The value must not change.
    pub fn unchanged() -> Self {
        Self::new(DeltaConstraint::NoChange, Word::zero())
    }

    /// The value must increase by exactly `delta`.
    pub fn exact_increase(delta: impl Into<Word>) -> Self {
        Self::new(DeltaConstraint::IncreaseExact, delta.into())
    }

    /// The value must not decrease, and increase by at most `delta`.
    pub fn max_increase(delta: impl Into<Word>) -> Self {
        Self::new(DeltaConstraint::IncreaseMax, delta.into())
    }

    /// The value must increase by at least `delta`.
    pub fn min_increase(delta: impl Into<Word>) -> Self {
        Self::new(DeltaConstraint::IncreaseMin, delta.into())
    }

    /// The value must decrease by exactly `delta`.
    pub fn exact_decrease(delta: impl Into<Word>) -> Self {
        Self::new(DeltaConstraint::DecreaseExact, delta.into())
    }

    /// The value must not increase, and decrease by at most `delta`.
    pub fn max_decrease(delta: impl Into<Word>) -> Self {
        Self::new(DeltaConstraint::DecreaseMax, delta.into())
    }

    /// The value must decrease by at least `delta`.
    pub fn min_decrease(delta: impl Into<Word>) -> Self {
        Self::new(DeltaConstraint::DecreaseMin, delta.into())
    }

    fn new(constraint: DeltaConstraint, delta: Word) -> Self {
        Self { constraint, delta }
    }
}

/// Whether the observed change from `before` to `after` violates the constraint.
///
/// Returns `true` on violation. Differences are only taken in the asserted
/// direction, so a change the other way is itself a violation and never wraps.
pub fn evaluate(before: Word, after: Word, delta: Word, constraint: DeltaConstraint) -> bool {
    use DeltaConstraint::*;
    match constraint {
        NoChange => before != after,
        IncreaseExact => after.checked_sub(before).map_or(true, |d| d != delta),
        IncreaseMax => after.checked_sub(before).map_or(true, |d| d > delta),
        IncreaseMin => after.checked_sub(before).map_or(true, |d| d < delta),
        DecreaseExact => before.checked_sub(after).map_or(true, |d| d != delta),
        DecreaseMax => before.checked_sub(after).map_or(true, |d| d > delta),
        DecreaseMin => before.checked_sub(after).map_or(true, |d| d < delta),
    }
}

/// [`evaluate`] with the constraint given as its raw tag.
pub fn evaluate_tag(before: Word, after: Word, delta: Word, tag: u8) -> Result<bool, InvariantError> {
    let constraint = DeltaConstraint::try_from(tag)?;
    Ok(evaluate(before, after, delta, constraint))
}

#[cfg(test)]
mod tests {
    use super::*;
    use DeltaConstraint::*;

    fn w(n: u64) -> Word {
        Word::from(n)
    }

    #[test]
    fn no_change() {
        for x in [w(0), w(1), w(u64::MAX), Word::MAX] {
            assert!(!evaluate(x, x, w(0), NoChange));
        }
        assert!(evaluate(w(1), w(2), w(0), NoChange));
        assert!(evaluate(w(2), w(1), w(0), NoChange));
        assert!(evaluate(Word::zero(), Word::MAX, w(0), NoChange));
        // The delta is ignored.
        assert!(!evaluate(w(5), w(5), w(9), NoChange));
    }

    #[test]
    fn opposite_direction_never_wraps() {
        assert!(evaluate(w(5), w(3), w(2), IncreaseExact));
        assert!(evaluate(w(5), w(3), Word::MAX, IncreaseMax));
        assert!(evaluate(w(5), w(3), w(0), IncreaseMin));
        assert!(evaluate(w(3), w(5), w(2), DecreaseExact));
        assert!(evaluate(w(3), w(5), Word::MAX, DecreaseMax));
        assert!(evaluate(w(3), w(5), w(0), DecreaseMin));
    }

    #[test]
    fn exact() {
        assert!(!evaluate(w(100), w(150), w(50), IncreaseExact));
        assert!(evaluate(w(100), w(150), w(10), IncreaseExact));
        assert!(evaluate(w(100), w(100), w(1), IncreaseExact));
        assert!(!evaluate(w(100), w(100), w(0), IncreaseExact));
        assert!(!evaluate(w(150), w(100), w(50), DecreaseExact));
        assert!(evaluate(w(150), w(100), w(49), DecreaseExact));
    }

    #[test]
    fn bounds_are_inclusive() {
        let before = w(7);
        for d in [w(0), w(1), w(1_000)] {
            assert!(!evaluate(before, before + d, d, IncreaseMax));
            assert!(!evaluate(before, before + d, d, IncreaseMin));
            assert!(!evaluate(before + d, before, d, DecreaseMax));
            assert!(!evaluate(before + d, before, d, DecreaseMin));
        }
        let d = Word::MAX;
        assert!(!evaluate(Word::zero(), d, d, IncreaseMax));
        assert!(!evaluate(d, Word::zero(), d, DecreaseMin));
    }

    #[test]
    fn max_and_min() {
        assert!(evaluate(w(10), w(21), w(10), IncreaseMax));
        assert!(!evaluate(w(10), w(15), w(10), IncreaseMax));
        assert!(evaluate(w(10), w(15), w(10), IncreaseMin));
        assert!(!evaluate(w(10), w(25), w(10), IncreaseMin));
        assert!(evaluate(w(21), w(10), w(10), DecreaseMax));
        assert!(!evaluate(w(15), w(10), w(10), DecreaseMax));
        assert!(evaluate(w(15), w(10), w(10), DecreaseMin));
        assert!(!evaluate(w(25), w(10), w(10), DecreaseMin));
    }

    #[test]
    fn unchanged_value_under_directional_constraints() {
        // A zero change satisfies MAX constraints and zero-delta MIN/EXACT ones.
        for constraint in [IncreaseMax, DecreaseMax] {
            assert!(!evaluate(w(4), w(4), w(3), constraint));
        }
        for constraint in [IncreaseMin, DecreaseMin, IncreaseExact, DecreaseExact] {
            assert!(evaluate(w(4), w(4), w(3), constraint));
            assert!(!evaluate(w(4), w(4), w(0), constraint));
        }
    }

    #[test]
    fn tagged_evaluation() {
        assert_eq!(evaluate_tag(w(1), w(1), w(0), 0).unwrap(), false);
        assert_eq!(evaluate_tag(w(1), w(3), w(2), 1).unwrap(), false);
        assert!(matches!(
            evaluate_tag(w(1), w(1), w(0), 7),
            Err(InvariantError::InvalidDeltaConstraint(_))
        ));
    }

    #[test]
    fn expect_constructors() {
        assert_eq!(Expect::unchanged().constraint, NoChange);
        assert_eq!(Expect::exact_increase(50u64).delta, w(50));
        assert_eq!(Expect::min_decrease(1u64).constraint, DecreaseMin);
    }
}
