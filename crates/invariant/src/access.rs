//! State accessors sampled before and after a protected operation.
//!
//! Token contracts are queried through [`Erc20Query`] and [`Erc721Query`].
//! Their answers are trusted: a token whose code can change between the two
//! samples may report values that do not reflect what the protected operation
//! actually did, and no guard can detect that.

use statefence_storage::{QueryState, QueryTransient};
use statefence_types::{Address, Hash, Key, Word};

/// Reads the current value of one category of state at a position.
pub trait Accessor<W: ?Sized> {
    /// Identifies what is read, e.g. a slot key or an account.
    type Position;
    /// The value found at a position.
    type Value;

    /// Read the value at `position`.
    fn read(&self, world: &W, position: &Self::Position) -> anyhow::Result<Self::Value>;
}

/// Balance queries against fungible token contracts.
pub trait Erc20Query {
    /// `token.balanceOf(account)`.
    fn erc20_balance_of(&self, token: &Address, account: &Address) -> anyhow::Result<Word>;
}

/// Balance and owner queries against non-fungible token contracts.
pub trait Erc721Query {
    /// `token.balanceOf(account)`.
    fn erc721_balance_of(&self, token: &Address, account: &Address) -> anyhow::Result<Word>;

    /// `token.ownerOf(id)`.
    fn erc721_owner_of(&self, token: &Address, id: &Word) -> anyhow::Result<Address>;
}

/// The native balance of each position's account.
#[derive(Clone, Copy, Debug)]
pub struct NativeBalance;

/// The persistent storage slots of one account.
#[derive(Clone, Copy, Debug)]
pub struct StorageSlots(pub Address);

/// The transient storage slots of one account.
#[derive(Clone, Copy, Debug)]
pub struct TransientSlots(pub Address);

/// The code hash of each position's account.
#[derive(Clone, Copy, Debug)]
pub struct CodeHash;

/// The balance one account holds of each position's fungible token.
#[derive(Clone, Copy, Debug)]
pub struct Erc20Balance(pub Address);

/// The balance one account holds of each position's non-fungible token.
#[derive(Clone, Copy, Debug)]
pub struct Erc721Balance(pub Address);

/// The owner of each position's `(token, id)`.
#[derive(Clone, Copy, Debug)]
pub struct Erc721Owner;

impl<W: QueryState + ?Sized> Accessor<W> for NativeBalance {
    type Position = Address;
    type Value = Word;
    fn read(&self, world: &W, account: &Address) -> anyhow::Result<Word> {
        world.balance(account)
    }
}

impl<W: QueryState + ?Sized> Accessor<W> for StorageSlots {
    type Position = Key;
    type Value = Word;
    fn read(&self, world: &W, key: &Key) -> anyhow::Result<Word> {
        world.storage(&self.0, key)
    }
}

impl<W: QueryTransient + ?Sized> Accessor<W> for TransientSlots {
    type Position = Key;
    type Value = Word;
    fn read(&self, world: &W, key: &Key) -> anyhow::Result<Word> {
        world.transient(&self.0, key)
    }
}

impl<W: QueryState + ?Sized> Accessor<W> for CodeHash {
    type Position = Address;
    type Value = Hash;
    fn read(&self, world: &W, account: &Address) -> anyhow::Result<Hash> {
        world.code_hash(account)
    }
}

impl<W: Erc20Query + ?Sized> Accessor<W> for Erc20Balance {
    type Position = Address;
    type Value = Word;
    fn read(&self, world: &W, token: &Address) -> anyhow::Result<Word> {
        world.erc20_balance_of(token, &self.0)
    }
}

impl<W: Erc721Query + ?Sized> Accessor<W> for Erc721Balance {
    type Position = Address;
    type Value = Word;
    fn read(&self, world: &W, token: &Address) -> anyhow::Result<Word> {
        world.erc721_balance_of(token, &self.0)
    }
}

impl<W: Erc721Query + ?Sized> Accessor<W> for Erc721Owner {
    type Position = (Address, Word);
    type Value = Address;
    fn read(&self, world: &W, (token, id): &(Address, Word)) -> anyhow::Result<Address> {
        world.erc721_owner_of(token, id)
    }
}

/// Read every position in order.
pub fn sample<W, A>(world: &W, accessor: &A, positions: &[A::Position]) -> anyhow::Result<Vec<A::Value>>
where
    W: ?Sized,
    A: Accessor<W>,
{
    positions.iter().map(|p| accessor.read(world, p)).collect()
}
