//! Invariant guards over account state.
//!
//! Each guard wraps a protected operation: it samples a category of state,
//! runs the operation, samples again and checks the change against a
//! [`DeltaConstraint`]. All violating positions are collected before the guard
//! fails, and the failure carries a report of every checked position.
//!
//! ```
//! # use statefence_invariant::{internal, Expect};
//! # use statefence_memory_storage::MemoryStorage;
//! # use statefence_transaction_storage::TransactionStorage;
//! # use statefence_types::{Address, Word};
//! let account = Address::repeat_byte(1);
//! let mut world = TransactionStorage::new(MemoryStorage::new());
//! let res = internal::balance(&mut world, account, Expect::exact_increase(5u64), |w| {
//!     w.set_balance(account, Word::from(5));
//!     Ok(())
//! });
//! assert!(res.is_ok());
//! ```

#[doc(inline)]
pub use access::{Accessor, Erc20Query, Erc721Query};
#[doc(inline)]
pub use delta::{evaluate, Expect};
pub use error::InvariantError;
#[doc(inline)]
pub use statefence_types::DeltaConstraint;
#[doc(inline)]
pub use validate::{DeltaReport, OwnerPerPosition, OwnerReport, Report, ValuePerPosition};

pub mod access;
pub mod delta;
pub mod erc20;
pub mod erc721;
pub mod error;
pub mod external;
pub mod guard;
pub mod internal;
pub mod validate;


/// The largest number of positions a single guard may check.
pub const MAX_POSITIONS: usize = 0xFFFF;
