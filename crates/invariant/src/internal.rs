//! Guards over the state of a single account: its native balance, storage,
//! transient storage and code.

use crate::{
    access::{CodeHash, NativeBalance, StorageSlots, TransientSlots},
    delta::Expect,
    error::InvariantError,
    guard,
};
use statefence_storage::{QueryState, QueryTransient};
use statefence_types::{Address, DeltaConstraint, Key, Word};

/// Require the account's native balance to change as expected.
pub fn balance<W, T>(
    world: &mut W,
    account: Address,
    expect: Expect,
    protected: impl FnOnce(&mut W) -> Result<T, InvariantError>,
) -> Result<T, InvariantError>
where
    W: QueryState,
{
    guard::guard_deltas(
        world,
        &NativeBalance,
        &[account],
        expect.constraint,
        &[expect.delta],
        InvariantError::Balance,
        protected,
    )
}

/// Require the account's native balance to equal `expected` afterwards.
pub fn balance_eq<W, T>(
    world: &mut W,
    account: Address,
    expected: Word,
    protected: impl FnOnce(&mut W) -> Result<T, InvariantError>,
) -> Result<T, InvariantError>
where
    W: QueryState,
{
    guard::guard_equals(
        world,
        &NativeBalance,
        &[account],
        &[expected],
        InvariantError::Balance,
        protected,
    )
}

/// Require each storage slot of the account to change by its delta.
pub fn storage<W, T>(
    world: &mut W,
    account: Address,
    keys: &[Key],
    constraint: DeltaConstraint,
    deltas: &[Word],
    protected: impl FnOnce(&mut W) -> Result<T, InvariantError>,
) -> Result<T, InvariantError>
where
    W: QueryState,
{
    guard::guard_deltas(
        world,
        &StorageSlots(account),
        keys,
        constraint,
        deltas,
        |report| InvariantError::Storage {
            keys: keys.to_vec(),
            report,
        },
        protected,
    )
}

/// Require each storage slot of the account to hold its expected value afterwards.
pub fn storage_eq<W, T>(
    world: &mut W,
    account: Address,
    keys: &[Key],
    expected: &[Word],
    protected: impl FnOnce(&mut W) -> Result<T, InvariantError>,
) -> Result<T, InvariantError>
where
    W: QueryState,
{
    guard::guard_equals(
        world,
        &StorageSlots(account),
        keys,
        expected,
        |report| InvariantError::Storage {
            keys: keys.to_vec(),
            report,
        },
        protected,
    )
}

/// Require each transient storage slot of the account to change by its delta.
pub fn transient_storage<W, T>(
    world: &mut W,
    account: Address,
    keys: &[Key],
    constraint: DeltaConstraint,
    deltas: &[Word],
    protected: impl FnOnce(&mut W) -> Result<T, InvariantError>,
) -> Result<T, InvariantError>
where
    W: QueryTransient,
{
    guard::guard_deltas(
        world,
        &TransientSlots(account),
        keys,
        constraint,
        deltas,
        |report| InvariantError::TransientStorage {
            keys: keys.to_vec(),
            report,
        },
        protected,
    )
}

/// Require each transient storage slot of the account to hold its expected value afterwards.
pub fn transient_storage_eq<W, T>(
    world: &mut W,
    account: Address,
    keys: &[Key],
    expected: &[Word],
    protected: impl FnOnce(&mut W) -> Result<T, InvariantError>,
) -> Result<T, InvariantError>
where
    W: QueryTransient,
{
    guard::guard_equals(
        world,
        &TransientSlots(account),
        keys,
        expected,
        |report| InvariantError::TransientStorage {
            keys: keys.to_vec(),
            report,
        },
        protected,
    )
}

/// Require the account's code hash to be unchanged.
pub fn code<W, T>(
    world: &mut W,
    account: Address,
    protected: impl FnOnce(&mut W) -> Result<T, InvariantError>,
) -> Result<T, InvariantError>
where
    W: QueryState,
{
    guard::guard_hash(world, &CodeHash, &account, protected)
}

/// Nonce invariants are not supported. The protected operation is never run.
pub fn nonce<W, T>(
    _world: &mut W,
    _account: Address,
    _protected: impl FnOnce(&mut W) -> Result<T, InvariantError>,
) -> Result<T, InvariantError> {
    #[cfg(feature = "tracing")]
    tracing::debug!("rejected nonce invariant");
    Err(InvariantError::UnsupportedInvariant)
}
