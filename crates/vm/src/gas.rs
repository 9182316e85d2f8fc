//! Gas costs and metering.

use crate::{asm::Op, error::OutOfGasError};
use serde::{Deserialize, Serialize};
use statefence_types::Gas;

/// A mapping from an operation to its gas cost.
///
/// This is the static part of an operation's cost, charged before the
/// operation runs. Memory growth, the restriction decode cost and the gas
/// handed to child frames are charged separately as the operation runs.
pub trait OpGasCost {
    /// The gas cost associated with the given op.
    fn op_gas_cost(&self, op: &Op) -> Gas;
}

/// Gas limits.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct GasLimit {
    /// The total amount of gas that may be spent.
    pub total: Gas,
}

/// The cost of every operation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GasSchedule {
    /// Stack, arithmetic, control flow, memory and environment operations.
    pub base: Gas,
    /// Reading balances, code hashes and storage.
    pub state_read: Gas,
    /// Writing persistent or transient storage.
    pub state_write: Gas,
    /// Entering any kind of call.
    pub call: Gas,
    /// Creating an account.
    pub create: Gas,
    /// Destroying an account.
    pub self_destruct: Gas,
    /// Linear cost per word of memory.
    pub memory_word: Gas,
    /// Divisor of the quadratic term of memory cost.
    pub memory_quadratic_divisor: Gas,
    /// Fixed cost of `Restrict`.
    pub restrict_base: Gas,
    /// Cost of `Restrict` per word of its declared maximum length.
    pub restrict_per_word: Gas,
}

/// Tracks gas spent by a single frame against its limit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GasMeter {
    limit: Gas,
    spent: Gas,
}

impl GasLimit {
    /// Unlimited gas limit.
    pub const UNLIMITED: Self = Self { total: Gas::MAX };
}

impl Default for GasSchedule {
    fn default() -> Self {
        Self {
            base: 3,
            state_read: 100,
            state_write: 2_900,
            call: 700,
            create: 32_000,
            self_destruct: 5_000,
            memory_word: 3,
            memory_quadratic_divisor: 512,
            restrict_base: 100,
            restrict_per_word: 3,
        }
    }
}

impl GasSchedule {
    /// The total cost of memory of the given size in words.
    pub fn memory_cost(&self, words: usize) -> Gas {
        let words = Gas::try_from(words).unwrap_or(Gas::MAX);
        let linear = words.saturating_mul(self.memory_word);
        let quadratic = words.saturating_mul(words) / self.memory_quadratic_divisor.max(1);
        linear.saturating_add(quadratic)
    }

    /// The cost of decoding a restriction of up to `max_len` bytes.
    pub fn restrict_decode_cost(&self, max_len: usize) -> Gas {
        let words = Gas::try_from(max_len.div_ceil(32)).unwrap_or(Gas::MAX);
        words.saturating_mul(self.restrict_per_word)
    }
}

impl OpGasCost for GasSchedule {
    fn op_gas_cost(&self, op: &Op) -> Gas {
        match op {
            Op::Halt | Op::Revert | Op::Return => 0,
            Op::Push(_)
            | Op::Pop
            | Op::Dup
            | Op::Swap
            | Op::Add
            | Op::Sub
            | Op::Eq
            | Op::Lt
            | Op::Not
            | Op::Jump
            | Op::JumpIf
            | Op::MLoad
            | Op::MStore
            | Op::MStore8
            | Op::Address
            | Op::Caller
            | Op::CallValue => self.base,
            Op::Balance | Op::SelfBalance | Op::CodeHash | Op::SLoad | Op::TLoad => self.state_read,
            Op::SStore | Op::TStore => self.state_write,
            Op::Call | Op::StaticCall | Op::DelegateCall => self.call,
            Op::Create => self.create,
            Op::SelfDestruct => self.self_destruct,
            Op::Restrict => self.restrict_base,
        }
    }
}

impl<F> OpGasCost for F
where
    F: Fn(&Op) -> Gas,
{
    fn op_gas_cost(&self, op: &Op) -> Gas {
        (*self)(op)
    }
}

impl GasMeter {
    /// A meter with nothing spent.
    pub fn new(limit: Gas) -> Self {
        Self { limit, spent: 0 }
    }

    /// Spend `gas`, failing without spending anything if it would exceed the limit.
    pub fn charge(&mut self, gas: Gas) -> Result<(), OutOfGasError> {
        let next_spent = self
            .spent
            .checked_add(gas)
            .filter(|&spent| spent <= self.limit)
            .ok_or(OutOfGasError {
                spent: self.spent,
                limit: self.limit,
                op_gas: gas,
            })?;
        self.spent = next_spent;
        Ok(())
    }

    /// Return unspent gas, e.g. gas left over by a child frame.
    pub fn refund(&mut self, gas: Gas) {
        self.spent = self.spent.saturating_sub(gas);
    }

    /// Gas still available.
    pub fn remaining(&self) -> Gas {
        self.limit - self.spent
    }

    /// Gas spent so far.
    pub fn spent(&self) -> Gas {
        self.spent
    }

    /// Spend everything that remains.
    pub fn exhaust(&mut self) {
        self.spent = self.limit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meter() {
        let mut meter = GasMeter::new(10);
        meter.charge(4).unwrap();
        assert_eq!(meter.remaining(), 6);
        let err = meter.charge(7).unwrap_err();
        assert_eq!(err.spent, 4);
        assert_eq!(meter.spent(), 4);
        meter.refund(2);
        assert_eq!(meter.spent(), 2);
        meter.exhaust();
        assert_eq!(meter.remaining(), 0);
    }

    #[test]
    fn memory_cost_is_monotonic() {
        let schedule = GasSchedule::default();
        assert_eq!(schedule.memory_cost(0), 0);
        assert_eq!(schedule.memory_cost(1), 3);
        let mut last = 0;
        for words in [1, 2, 100, 1_000, 32_768] {
            let cost = schedule.memory_cost(words);
            assert!(cost > last);
            last = cost;
        }
    }

    #[test]
    fn restrict_decode_cost_rounds_up() {
        let schedule = GasSchedule::default();
        assert_eq!(schedule.restrict_decode_cost(0), 0);
        assert_eq!(schedule.restrict_decode_cost(1), 3);
        assert_eq!(schedule.restrict_decode_cost(32), 3);
        assert_eq!(schedule.restrict_decode_cost(33), 6);
    }

    #[test]
    fn closures_supply_op_costs() {
        let cost = |op: &Op| if matches!(op, Op::Restrict) { 9 } else { 1 };
        assert_eq!(cost.op_gas_cost(&Op::Restrict), 9);
        assert_eq!(cost.op_gas_cost(&Op::Pop), 1);
    }

    #[test]
    fn schedule_config_from_json() {
        let schedule: GasSchedule =
            serde_json::from_str(r#"{ "restrict_base": 250, "state_write": 5000 }"#).unwrap();
        assert_eq!(schedule.restrict_base, 250);
        assert_eq!(schedule.state_write, 5000);
        assert_eq!(schedule.base, GasSchedule::default().base);
    }
}
