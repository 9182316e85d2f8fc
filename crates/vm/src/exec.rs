//! Top-level transaction execution.

use crate::{
    error::ExecError,
    frame::{Frame, FrameResult, Machine},
    gas::{GasLimit, GasSchedule, OpGasCost},
    guard::FrameGuard,
};
use serde::{Deserialize, Serialize};
use statefence_storage::QueryState;
use statefence_transaction_storage::TransactionStorage;
use statefence_types::{Address, Gas, Word};

/// A call into an account's code from outside the VM.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The account sending the transaction and its value.
    pub caller: Address,
    /// The account whose code runs as the top-level frame.
    pub to: Address,
    /// Value moved from `caller` to `to` before any code runs.
    pub value: Word,
    /// Gas available to the top-level frame.
    pub gas_limit: GasLimit,
}

/// How a frame, or a whole transaction, ended.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum Status {
    /// Ended with `Halt`, `Return`, `SelfDestruct` or by running off the end of its code.
    Success,
    /// Ended with `Revert`. Unused gas is returned.
    Reverted,
    /// An operation failed. All gas is consumed.
    Halted,
}

/// The result of executing a transaction.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ExecOutcome {
    /// How the top-level frame ended.
    pub status: Status,
    /// Gas spent by the top-level frame, including that spent by its children.
    pub gas_used: Gas,
    /// Bytes returned by the top-level frame.
    pub output: Vec<u8>,
}

/// Execute a transaction, costing operations with the given schedule.
///
/// See [`execute_with`].
pub fn execute<S>(
    storage: &mut TransactionStorage<S>,
    tx: &Transaction,
    schedule: &GasSchedule,
) -> Result<ExecOutcome, ExecError>
where
    S: QueryState,
{
    execute_with(storage, tx, schedule, schedule)
}

/// Execute a transaction, costing each operation with `op_gas_cost`.
///
/// The top-level frame starts without any restriction. Its changes, including
/// the transfer of the transaction's value, are left in `storage` only if it
/// ends with [`Status::Success`]. Committing them is up to the caller.
///
/// Returns an error without running any code if the caller cannot cover the
/// value, or if the backing state fails at any point. In the latter case
/// every change made by the transaction is discarded.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(skip_all, fields(caller = ?tx.caller, to = ?tx.to), err)
)]
pub fn execute_with<S, C>(
    storage: &mut TransactionStorage<S>,
    tx: &Transaction,
    op_gas_cost: &C,
    schedule: &GasSchedule,
) -> Result<ExecOutcome, ExecError>
where
    S: QueryState,
    C: OpGasCost + ?Sized,
{
    let snapshot = storage.snapshot();
    if !storage.transfer(tx.caller, tx.to, tx.value)? {
        return Err(ExecError::InsufficientBalance {
            caller: tx.caller,
            value: tx.value,
        });
    }
    let frame = Frame {
        address: tx.to,
        caller: tx.caller,
        value: tx.value,
        is_static: false,
        depth: 0,
        guard: FrameGuard::default(),
    };
    let result = storage.code(&tx.to).and_then(|code| {
        let mut machine = Machine {
            state: &mut *storage,
            op_gas_cost,
            schedule,
        };
        machine.run(frame, &code, tx.gas_limit.total)
    });
    let FrameResult {
        status,
        gas_left,
        output,
    } = match result {
        Ok(result) => result,
        Err(err) => {
            storage.rollback_to(snapshot);
            return Err(err.into());
        }
    };
    if status != Status::Success {
        storage.rollback_to(snapshot);
    }
    #[cfg(feature = "tracing")]
    tracing::debug!(?status, gas_left, "transaction executed");
    Ok(ExecOutcome {
        status,
        gas_used: tx.gas_limit.total - gas_left,
        output,
    })
}
