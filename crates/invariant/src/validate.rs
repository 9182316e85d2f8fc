//! Validation of before/after samples against a delta constraint.

use crate::{delta, error::InvariantError, MAX_POSITIONS};
use serde::{Deserialize, Serialize};
use statefence_types::{Address, DeltaConstraint, Word};
use std::fmt;

/// The values observed at one checked position.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct ValuePerPosition {
    pub before: Word,
    pub after: Word,
    pub delta: Word,
}

/// The owners observed for one checked token.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct OwnerPerPosition {
    pub before_owner: Address,
    pub after_owner: Address,
}

/// The outcome of validating a list of positions.
///
/// `positions` holds one entry per checked position in the order the
/// positions were given, whether or not that position violated.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Report<T> {
    /// Indices into `positions` of the entries that violated.
    pub violations: Vec<usize>,
    pub positions: Vec<T>,
}

/// A report over numeric positions.
pub type DeltaReport = Report<ValuePerPosition>;

/// A report over token owners.
pub type OwnerReport = Report<OwnerPerPosition>;

impl<T> Report<T> {
    /// Whether any position violated.
    pub fn is_violated(&self) -> bool {
        !self.violations.is_empty()
    }

    /// The number of positions that violated.
    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }

    /// The violating entries, paired with their position index.
    pub fn violating(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.violations
            .iter()
            .filter_map(|&ix| self.positions.get(ix).map(|p| (ix, p)))
    }
}

impl fmt::Display for Report<ValuePerPosition> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} positions violated", self.violation_count(), self.positions.len())?;
        for (ix, p) in self.violating() {
            write!(f, "\n  {ix}: before {}, after {}, delta {}", p.before, p.after, p.delta)?;
        }
        Ok(())
    }
}

impl fmt::Display for Report<OwnerPerPosition> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} owners changed", self.violation_count(), self.positions.len())?;
        for (ix, p) in self.violating() {
            write!(f, "\n  {ix}: {:?} -> {:?}", p.before_owner, p.after_owner)?;
        }
        Ok(())
    }
}

/// Check that a list of positions is within bounds and matches the number of
/// expected deltas.
pub fn check_lengths(positions: usize, deltas: usize) -> Result<(), InvariantError> {
    if positions > MAX_POSITIONS {
        return Err(InvariantError::ArrayTooLarge(positions));
    }
    if positions != deltas {
        return Err(InvariantError::LengthMismatch);
    }
    Ok(())
}

/// Validate each position's change against the constraint and its expected delta.
pub fn validate_deltas(
    before: &[Word],
    after: &[Word],
    deltas: &[Word],
    constraint: DeltaConstraint,
) -> Result<DeltaReport, InvariantError> {
    check_lengths(before.len(), deltas.len())?;
    check_lengths(after.len(), deltas.len())?;
    let mut report = DeltaReport::default();
    for (ix, ((&before, &after), &delta)) in before.iter().zip(after).zip(deltas).enumerate() {
        if delta::evaluate(before, after, delta, constraint) {
            report.violations.push(ix);
        }
        report.positions.push(ValuePerPosition {
            before,
            after,
            delta,
        });
    }
    Ok(report)
}

/// [`validate_deltas`] with the constraint given as its raw tag.
pub fn validate_deltas_tag(
    before: &[Word],
    after: &[Word],
    deltas: &[Word],
    tag: u8,
) -> Result<DeltaReport, InvariantError> {
    let constraint = DeltaConstraint::try_from(tag)?;
    validate_deltas(before, after, deltas, constraint)
}

/// Validate that every position kept its owner.
pub fn validate_owners(before: &[Address], after: &[Address]) -> Result<OwnerReport, InvariantError> {
    check_lengths(before.len(), after.len())?;
    let mut report = OwnerReport::default();
    for (ix, (&before_owner, &after_owner)) in before.iter().zip(after).enumerate() {
        if before_owner != after_owner {
            report.violations.push(ix);
        }
        report.positions.push(OwnerPerPosition {
            before_owner,
            after_owner,
        });
    }
    Ok(report)
}
