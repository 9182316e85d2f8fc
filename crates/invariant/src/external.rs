//! Guards over the native balances of arbitrary accounts.

use crate::{access::NativeBalance, error::InvariantError, guard};
use statefence_storage::QueryState;
use statefence_types::{Address, DeltaConstraint, Word};

/// Require each account's native balance to change by its delta.
pub fn eth_balances<W, T>(
    world: &mut W,
    accounts: &[Address],
    constraint: DeltaConstraint,
    deltas: &[Word],
    protected: impl FnOnce(&mut W) -> Result<T, InvariantError>,
) -> Result<T, InvariantError>
where
    W: QueryState,
{
    guard::guard_deltas(
        world,
        &NativeBalance,
        accounts,
        constraint,
        deltas,
        |report| InvariantError::ExtEthBalance {
            accounts: accounts.to_vec(),
            report,
        },
        protected,
    )
}

/// Require each account's native balance to equal its expected value afterwards.
pub fn eth_balances_eq<W, T>(
    world: &mut W,
    accounts: &[Address],
    expected: &[Word],
    protected: impl FnOnce(&mut W) -> Result<T, InvariantError>,
) -> Result<T, InvariantError>
where
    W: QueryState,
{
    guard::guard_equals(
        world,
        &NativeBalance,
        accounts,
        expected,
        |report| InvariantError::ExtEthBalance {
            accounts: accounts.to_vec(),
            report,
        },
        protected,
    )
}
