//! A stack VM whose call frames can restrict their own state mutations.
//!
//! ## Executing Transactions
//!
//! The primary entrypoint for this crate is [`execute`], which runs the code
//! of a transaction's target account as the top-level frame over a
//! [`TransactionStorage`][statefence_transaction_storage::TransactionStorage].
//! Frames call into one another with `Call`, `StaticCall`, `DelegateCall` and
//! `Create`. Each child frame runs against a snapshot of the transaction and
//! its changes are discarded unless it ends successfully. Whether the
//! transaction's changes are committed is left to the caller.
//!
//! ## Restricting Mutation
//!
//! The `Restrict` operation declares the only mutations a frame, and every
//! frame it calls, may perform. The declaration is an RLP encoded
//! [`MutableSetList`][statefence_types::MutableSetList] read from memory. See
//! the [`guard`] module for how restrictions propagate to child frames and
//! the [`enforce`] module for what is checked at each mutation.
//!
//! Any operation that fails, including a denied mutation, ends its frame in an
//! abnormal halt. A halted frame consumes all of its gas and its changes are
//! discarded. Why it halted is never observable by the calling frame.

#![deny(missing_docs, unsafe_code)]

#[doc(inline)]
pub use bytecode::{BytecodeMapped, BytecodeMappedLazy, BytecodeMappedSlice};
#[doc(inline)]
pub use error::{ExecError, OpError};
#[doc(inline)]
pub use exec::{execute, execute_with, ExecOutcome, Status, Transaction};
pub use frame::create_address;
#[doc(inline)]
pub use gas::{GasLimit, GasSchedule, OpGasCost};
#[doc(inline)]
pub use guard::{FrameGuard, GuardOrigin};
pub use memory::Memory;
#[doc(inline)]
pub use permission::PermissionSet;
pub use stack::Stack;
pub use statefence_types as types;

use asm::Op;

pub mod asm;
mod bytecode;
mod ctrl_flow;
pub mod enforce;
pub mod error;
mod exec;
mod frame;
pub mod gas;
pub mod guard;
mod memory;
pub mod permission;
mod restrict;
mod stack;
mod state;

/// The maximum depth of nested frames. The top-level frame has depth `0`.
///
/// A call or create that would exceed this depth fails without running.
pub const MAX_CALL_DEPTH: usize = 1024;

/// The operation execution state of a single frame.
#[derive(Debug, Default, PartialEq)]
pub struct Vm {
    /// The "program counter", i.e. index of the current operation within the program.
    pub pc: usize,
    /// The stack machine.
    pub stack: Stack,
    /// The frame's byte-addressed memory.
    pub memory: Memory,
}

/// Types that provide access to operations.
///
/// Implementations are included for `&[Op]`, `&BytecodeMapped` and
/// [`BytecodeMappedLazy`].
pub trait OpAccess {
    /// Any error that might occur during access.
    type Error: std::error::Error;
    /// Access the operation at the given index.
    ///
    /// Mutable access to self is required in case operations are lazily parsed.
    ///
    /// Any implementation should ensure the same index always returns the same operation.
    fn op_access(&mut self, index: usize) -> Option<Result<Op, Self::Error>>;
}

impl<'a> OpAccess for &'a [Op] {
    type Error = core::convert::Infallible;
    fn op_access(&mut self, index: usize) -> Option<Result<Op, Self::Error>> {
        self.get(index).copied().map(Ok)
    }
}

impl<'a> OpAccess for &'a BytecodeMapped {
    type Error = core::convert::Infallible;
    fn op_access(&mut self, index: usize) -> Option<Result<Op, Self::Error>> {
        self.op(index).map(Ok)
    }
}
