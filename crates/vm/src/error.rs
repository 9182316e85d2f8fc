//! The types of errors that might occur throughout execution.
//!
//! Every [`OpError`] other than [`OpError::State`] ends the frame in an
//! abnormal halt. Which error caused a halt is only ever logged; a parent
//! frame or the caller of [`execute`][crate::execute] only observes that the
//! frame halted.

use crate::{asm::FromBytesError, enforce::Denied};
use statefence_types::{Address, Gas, Word};
use thiserror::Error;

/// Shorthand for a `Result` where the error type is a `StackError`.
pub type StackResult<T> = Result<T, StackError>;

/// Shorthand for a `Result` where the error type is a `MemoryError`.
pub type MemoryResult<T> = Result<T, MemoryError>;

/// Shorthand for a `Result` where the error type is an `OpError`.
pub type OpResult<T> = Result<T, OpError>;

/// Errors that abort a whole execution.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The transaction's value could not be moved from its caller.
    #[error("caller {caller:?} cannot cover the transferred value {value}")]
    InsufficientBalance {
        /// The transaction's caller.
        caller: Address,
        /// The value the transaction tried to transfer.
        value: Word,
    },
    /// The backing state could not be read.
    #[error("failed to access state: {0}")]
    State(#[from] anyhow::Error),
}

/// An individual operation failed.
#[derive(Debug, Error)]
pub enum OpError {
    /// A stack operation failed.
    #[error("stack error: {0}")]
    Stack(#[from] StackError),
    /// A memory operation failed.
    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),
    /// A jump was malformed.
    #[error("control flow error: {0}")]
    ControlFlow(#[from] ControlFlowError),
    /// The frame's code could not be parsed.
    #[error("bytecode error: {0}")]
    FromBytes(#[from] FromBytesError),
    /// The frame ran out of gas.
    #[error("{0}")]
    OutOfGas(#[from] OutOfGasError),
    /// A `Restrict` operand was malformed.
    #[error("restriction error: {0}")]
    Restrict(#[from] RestrictError),
    /// The frame's guard denied a mutation.
    #[error("{0}")]
    Denied(#[from] Denied),
    /// A static frame attempted to mutate state.
    #[error("attempted to mutate state from a static call")]
    StaticStateChange,
    /// The backing state could not be read. Never halts a frame; it aborts execution.
    #[error("failed to access state: {0}")]
    State(#[from] anyhow::Error),
}

/// Stack operation error.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum StackError {
    /// Popped from an empty stack.
    #[error("attempted to pop an empty stack")]
    Empty,
    /// Pushed beyond [`Stack::SIZE_LIMIT`][crate::Stack::SIZE_LIMIT].
    #[error("stack exceeded its size limit")]
    Overflow,
}

/// Memory operation error.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum MemoryError {
    /// Grew beyond [`Memory::SIZE_LIMIT`][crate::Memory::SIZE_LIMIT].
    #[error("memory exceeded its size limit")]
    Overflow,
    /// Accessed bytes outside of memory.
    #[error("index out of bounds")]
    IndexOutOfBounds,
}

/// Control flow operation error.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum ControlFlowError {
    /// The condition was not a boolean.
    #[error("invalid condition {0} for `JumpIf`, expected `0` or `1`")]
    InvalidJumpIfCondition(Word),
    /// The destination does not fit an operation index.
    #[error("jump destination {0} out of range")]
    InvalidJumpDestination(Word),
}

/// `Restrict` operation error.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum RestrictError {
    /// The enable flag was not a boolean.
    #[error("invalid enable flag {0}, expected `0` or `1`")]
    InvalidFlag(Word),
    /// The declared list could not be decoded within its maximum length.
    #[error("malformed mutable set list: {0}")]
    Decode(#[from] rlp::DecoderError),
}

/// An operation would have exceeded the frame's gas limit.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error("operation cost {op_gas} exceeds the remaining gas ({spent} of {limit} spent)")]
pub struct OutOfGasError {
    /// Gas spent before the operation.
    pub spent: Gas,
    /// The frame's gas limit.
    pub limit: Gas,
    /// The cost that could not be covered.
    pub op_gas: Gas,
}

impl OpError {
    /// Whether the error ends the frame in an abnormal halt, as opposed to
    /// aborting the whole execution.
    pub fn is_halt(&self) -> bool {
        !matches!(self, OpError::State(_))
    }
}
