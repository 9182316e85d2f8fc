//! Guards over an account's fungible token balances.

use crate::{
    access::{Erc20Balance, Erc20Query},
    error::InvariantError,
    guard,
};
use statefence_types::{Address, DeltaConstraint, Word};

/// Require the account's balance of each token to change by its delta.
pub fn balances<W, T>(
    world: &mut W,
    account: Address,
    tokens: &[Address],
    constraint: DeltaConstraint,
    deltas: &[Word],
    protected: impl FnOnce(&mut W) -> Result<T, InvariantError>,
) -> Result<T, InvariantError>
where
    W: Erc20Query,
{
    guard::guard_deltas(
        world,
        &Erc20Balance(account),
        tokens,
        constraint,
        deltas,
        |report| InvariantError::Erc20Balance {
            account,
            tokens: tokens.to_vec(),
            report,
        },
        protected,
    )
}

/// Require the account's balance of each token to equal its expected value afterwards.
pub fn balances_eq<W, T>(
    world: &mut W,
    account: Address,
    tokens: &[Address],
    expected: &[Word],
    protected: impl FnOnce(&mut W) -> Result<T, InvariantError>,
) -> Result<T, InvariantError>
where
    W: Erc20Query,
{
    guard::guard_equals(
        world,
        &Erc20Balance(account),
        tokens,
        expected,
        |report| InvariantError::Erc20Balance {
            account,
            tokens: tokens.to_vec(),
            report,
        },
        protected,
    )
}
