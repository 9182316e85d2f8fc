//! Guards over non-fungible token balances and ownership.

use crate::{
    access::{Erc721Balance, Erc721Owner, Erc721Query},
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
    W: Erc721Query,
{
    guard::guard_deltas(
        world,
        &Erc721Balance(account),
        tokens,
        constraint,
        deltas,
        |report| InvariantError::Erc721Balance {
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
    W: Erc721Query,
{
    guard::guard_equals(
        world,
        &Erc721Balance(account),
        tokens,
        expected,
        |report| InvariantError::Erc721Balance {
            account,
            tokens: tokens.to_vec(),
            report,
        },
        protected,
    )
}

/// Require every `(token, id)` to keep its owner.
pub fn owners<W, T>(
    world: &mut W,
    tokens: &[(Address, Word)],
    protected: impl FnOnce(&mut W) -> Result<T, InvariantError>,
) -> Result<T, InvariantError>
where
    W: Erc721Query,
{
    guard::guard_owners(
        world,
        &Erc721Owner,
        tokens,
        |report| InvariantError::Erc721Owner {
            tokens: tokens.to_vec(),
            report,
        },
        protected,
    )
}

/// Require every `(token, id)` to be owned by its expected owner afterwards.
pub fn owners_eq<W, T>(
    world: &mut W,
    tokens: &[(Address, Word)],
    expected: &[Address],
    protected: impl FnOnce(&mut W) -> Result<T, InvariantError>,
) -> Result<T, InvariantError>
where
    W: Erc721Query,
{
    guard::guard_owners_equal(
        world,
        &Erc721Owner,
        tokens,
        expected,
        |report| InvariantError::Erc721Owner {
            tokens: tokens.to_vec(),
            report,
        },
        protected,
    )
}
