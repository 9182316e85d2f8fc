//! The snapshot, execute, verify protocol shared by every category of guard.
//!
//! A guard samples its positions, runs the protected operation, samples the
//! same positions again and validates the pair. The protected operation is
//! handed the world mutably and may run further guards; an inner failure is
//! returned through `?` before the outer guard takes its after sample.

use crate::{
    access::{self, Accessor},
    error::InvariantError,
    validate::{self, DeltaReport, OwnerReport},
};
use statefence_types::{Address, DeltaConstraint, Hash, Word};

/// Guard a list of numeric positions with one constraint and a delta per position.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(skip_all, fields(positions = positions.len(), constraint = ?constraint), err)
)]
pub fn guard_deltas<W, A, T>(
    world: &mut W,
    accessor: &A,
    positions: &[A::Position],
    constraint: DeltaConstraint,
    deltas: &[Word],
    violation: impl FnOnce(DeltaReport) -> InvariantError,
    protected: impl FnOnce(&mut W) -> Result<T, InvariantError>,
) -> Result<T, InvariantError>
where
    A: Accessor<W, Value = Word>,
{
    validate::check_lengths(positions.len(), deltas.len())?;
    let before = access::sample(&*world, accessor, positions)?;
    let output = protected(world)?;
    let after = access::sample(&*world, accessor, positions)?;
    let report = validate::validate_deltas(&before, &after, deltas, constraint)?;
    if report.is_violated() {
        #[cfg(feature = "tracing")]
        tracing::debug!(violations = ?report.violations, "delta invariant violated");
        return Err(violation(report));
    }
    Ok(output)
}

/// Guard a list of numeric positions against caller supplied after-values.
///
/// The expected values stand in for the before sample and are compared to the
/// actual after sample under `NoChange`.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(skip_all, fields(positions = positions.len()), err)
)]
pub fn guard_equals<W, A, T>(
    world: &mut W,
    accessor: &A,
    positions: &[A::Position],
    expected: &[Word],
    violation: impl FnOnce(DeltaReport) -> InvariantError,
    protected: impl FnOnce(&mut W) -> Result<T, InvariantError>,
) -> Result<T, InvariantError>
where
    A: Accessor<W, Value = Word>,
{
    validate::check_lengths(positions.len(), expected.len())?;
    let output = protected(world)?;
    let after = access::sample(&*world, accessor, positions)?;
    let deltas = vec![Word::zero(); expected.len()];
    let report = validate::validate_deltas(expected, &after, &deltas, DeltaConstraint::NoChange)?;
    if report.is_violated() {
        #[cfg(feature = "tracing")]
        tracing::debug!(violations = ?report.violations, "expected values not met");
        return Err(violation(report));
    }
    Ok(output)
}

/// Guard a list of address-valued positions, requiring each to be unchanged.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(skip_all, fields(positions = positions.len()), err)
)]
pub fn guard_owners<W, A, T>(
    world: &mut W,
    accessor: &A,
    positions: &[A::Position],
    violation: impl FnOnce(OwnerReport) -> InvariantError,
    protected: impl FnOnce(&mut W) -> Result<T, InvariantError>,
) -> Result<T, InvariantError>
where
    A: Accessor<W, Value = Address>,
{
    validate::check_lengths(positions.len(), positions.len())?;
    let before = access::sample(&*world, accessor, positions)?;
    let output = protected(world)?;
    let after = access::sample(&*world, accessor, positions)?;
    check_owners(&before, &after, violation)?;
    Ok(output)
}

/// Guard a list of address-valued positions against caller supplied owners.
pub fn guard_owners_equal<W, A, T>(
    world: &mut W,
    accessor: &A,
    positions: &[A::Position],
    expected: &[Address],
    violation: impl FnOnce(OwnerReport) -> InvariantError,
    protected: impl FnOnce(&mut W) -> Result<T, InvariantError>,
) -> Result<T, InvariantError>
where
    A: Accessor<W, Value = Address>,
{
    validate::check_lengths(positions.len(), expected.len())?;
    let output = protected(world)?;
    let after = access::sample(&*world, accessor, positions)?;
    check_owners(expected, &after, violation)?;
    Ok(output)
}

/// Guard a single hash-valued position, requiring it to be unchanged.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, err))]
pub fn guard_hash<W, A, T>(
    world: &mut W,
    accessor: &A,
    position: &A::Position,
    protected: impl FnOnce(&mut W) -> Result<T, InvariantError>,
) -> Result<T, InvariantError>
where
    A: Accessor<W, Value = Hash>,
{
    let before = accessor.read(&*world, position)?;
    let output = protected(world)?;
    let after = accessor.read(&*world, position)?;
    if before != after {
        #[cfg(feature = "tracing")]
        tracing::debug!(?before, ?after, "code hash changed");
        return Err(InvariantError::Code { before, after });
    }
    Ok(output)
}

fn check_owners(
    before: &[Address],
    after: &[Address],
    violation: impl FnOnce(OwnerReport) -> InvariantError,
) -> Result<(), InvariantError> {
    let report = validate::validate_owners(before, after)?;
    if report.is_violated() {
        #[cfg(feature = "tracing")]
        tracing::debug!(violations = ?report.violations, "owner invariant violated");
        return Err(violation(report));
    }
    Ok(())
}
