//! Frame execution.
//!
//! A [`Machine`] runs one frame at a time, recursing into child frames for
//! calls and creates. Every child runs against a snapshot of the transaction
//! and its changes are rolled back unless it ends with [`Status::Success`].

use crate::{
    asm::Op,
    bytecode::BytecodeMappedLazy,
    ctrl_flow, enforce,
    error::{OpError, OpResult},
    exec::Status,
    gas::{GasMeter, GasSchedule, OpGasCost},
    guard::FrameGuard,
    memory, restrict, state, OpAccess, Vm, MAX_CALL_DEPTH,
};
use statefence_storage::{Code, QueryState};
use statefence_transaction_storage::TransactionStorage;
use statefence_types::{
    convert::{address_from_word, word_from_address},
    Address, Gas, Word,
};

/// Shared across every frame of an execution.
pub(crate) struct Machine<'a, S, C: ?Sized> {
    pub(crate) state: &'a mut TransactionStorage<S>,
    pub(crate) op_gas_cost: &'a C,
    pub(crate) schedule: &'a GasSchedule,
}

/// The context a frame's code runs in.
#[derive(Clone, Debug)]
pub(crate) struct Frame {
    /// The account whose state the code reads and writes.
    pub(crate) address: Address,
    pub(crate) caller: Address,
    pub(crate) value: Word,
    /// Whether state mutation is forbidden outright.
    pub(crate) is_static: bool,
    pub(crate) depth: usize,
    pub(crate) guard: FrameGuard,
}

/// How a frame ended.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct FrameResult {
    pub(crate) status: Status,
    pub(crate) gas_left: Gas,
    pub(crate) output: Vec<u8>,
}

/// The outcome of stepping a single operation.
enum Step {
    Continue(usize),
    Exit(Status, Vec<u8>),
}

impl Frame {
    fn child(&self, address: Address, value: Word, is_static: bool) -> Self {
        Self {
            address,
            caller: self.address,
            value,
            is_static,
            depth: self.depth + 1,
            guard: self.guard.child(),
        }
    }

    fn at_max_depth(&self) -> bool {
        self.depth >= MAX_CALL_DEPTH
    }
}

impl<S, C> Machine<'_, S, C>
where
    S: QueryState,
    C: OpGasCost + ?Sized,
{
    /// Run `code` in the given frame with up to `gas_limit` gas.
    ///
    /// Only a failure of the backing state is returned as an error. Every
    /// other failure ends the frame as [`Status::Halted`] with no gas left.
    pub(crate) fn run(&mut self, mut frame: Frame, code: &[u8], gas_limit: Gas) -> anyhow::Result<FrameResult> {
        let mut vm = Vm::default();
        let mut gas = GasMeter::new(gas_limit);
        let mut ops = BytecodeMappedLazy::new(code.iter().copied());
        loop {
            match self.step(&mut frame, &mut vm, &mut gas, &mut ops) {
                Ok(Step::Continue(pc)) => vm.pc = pc,
                Ok(Step::Exit(status, output)) => {
                    #[cfg(feature = "tracing")]
                    tracing::trace!(depth = frame.depth, ?status, spent = gas.spent(), "frame exited");
                    return Ok(FrameResult {
                        status,
                        gas_left: gas.remaining(),
                        output,
                    });
                }
                Err(OpError::State(err)) => return Err(err),
                Err(_err) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(depth = frame.depth, pc = vm.pc, err = %_err, "frame halted");
                    gas.exhaust();
                    return Ok(FrameResult {
                        status: Status::Halted,
                        gas_left: gas.remaining(),
                        output: vec![],
                    });
                }
            }
        }
    }

    fn step<OA>(
        &mut self,
        frame: &mut Frame,
        vm: &mut Vm,
        gas: &mut GasMeter,
        ops: &mut OA,
    ) -> OpResult<Step>
    where
        OA: OpAccess,
        OA::Error: Into<OpError>,
    {
        let op = match ops.op_access(vm.pc) {
            // Running off the end of the code ends the frame successfully.
            None => return Ok(Step::Exit(Status::Success, vec![])),
            Some(res) => res.map_err(Into::into)?,
        };
        gas.charge(self.op_gas_cost.op_gas_cost(&op))?;
        let schedule = self.schedule;
        match op {
            Op::Halt => return Ok(Step::Exit(Status::Success, vec![])),
            Op::Push(word) => vm.stack.push(word)?,
            Op::Pop => {
                vm.stack.pop()?;
            }
            Op::Dup => vm.stack.dup()?,
            Op::Swap => vm.stack.swap()?,
            Op::Add => vm.stack.pop2_push1(|a, b| a.overflowing_add(b).0)?,
            Op::Sub => vm.stack.pop2_push1(|a, b| a.overflowing_sub(b).0)?,
            Op::Eq => vm.stack.pop2_push1(|a, b| Word::from(u8::from(a == b)))?,
            Op::Lt => vm.stack.pop2_push1(|a, b| Word::from(u8::from(a < b)))?,
            Op::Not => vm.stack.pop1_push1(|a| Word::from(u8::from(a.is_zero())))?,
            Op::Jump => return ctrl_flow::jump(vm).map(Step::Continue),
            Op::JumpIf => return ctrl_flow::jump_if(vm).map(Step::Continue),
            Op::MLoad => memory::mload(vm, gas, schedule)?,
            Op::MStore => memory::mstore(vm, gas, schedule)?,
            Op::MStore8 => memory::mstore8(vm, gas, schedule)?,
            Op::Address => state::address(frame, vm)?,
            Op::Caller => state::caller(frame, vm)?,
            Op::CallValue => state::call_value(frame, vm)?,
            Op::Balance => state::balance(&*self.state, vm)?,
            Op::SelfBalance => state::self_balance(&*self.state, frame, vm)?,
            Op::CodeHash => state::code_hash(&*self.state, vm)?,
            Op::SLoad => state::sload(&*self.state, frame, vm)?,
            Op::SStore => state::sstore(self.state, frame, vm)?,
            Op::TLoad => state::tload(&*self.state, frame, vm)?,
            Op::TStore => state::tstore(self.state, frame, vm)?,
            Op::Call => self.call(frame, vm, gas)?,
            Op::StaticCall => self.static_call(frame, vm, gas)?,
            Op::DelegateCall => self.delegate_call(frame, vm, gas)?,
            Op::Create => self.create(frame, vm, gas)?,
            Op::SelfDestruct => {
                self.self_destruct(frame, vm)?;
                return Ok(Step::Exit(Status::Success, vec![]));
            }
            Op::Revert => return Ok(Step::Exit(Status::Reverted, vec![])),
            Op::Return => {
                let output = memory::pop_range(vm, gas, schedule)?;
                return Ok(Step::Exit(Status::Success, output));
            }
            Op::Restrict => restrict::restrict(&mut frame.guard, vm, gas, schedule)?,
        }
        // Every operation besides control flow steps forward program counter by 1.
        let new_pc = vm.pc.checked_add(1).expect("pc can never exceed `usize`");
        Ok(Step::Continue(new_pc))
    }

    /// Run a child frame against a snapshot of the transaction.
    ///
    /// `prepare` runs after the snapshot is taken and before the child's code.
    /// If it returns `false` the call fails without running and everything it
    /// wrote is discarded. The gas handed to the child is charged up front and
    /// whatever it leaves is refunded.
    fn enter(
        &mut self,
        child: Frame,
        code: &[u8],
        requested_gas: Word,
        gas: &mut GasMeter,
        prepare: impl FnOnce(&mut TransactionStorage<S>) -> anyhow::Result<bool>,
    ) -> OpResult<Option<FrameResult>> {
        let child_gas = Gas::try_from(requested_gas)
            .unwrap_or(Gas::MAX)
            .min(gas.remaining());
        gas.charge(child_gas)?;
        let snapshot = self.state.snapshot();
        if !prepare(&mut *self.state)? {
            self.state.rollback_to(snapshot);
            gas.refund(child_gas);
            return Ok(None);
        }
        let result = self.run(child, code, child_gas)?;
        if result.status != Status::Success {
            self.state.rollback_to(snapshot);
        }
        gas.refund(result.gas_left);
        Ok(Some(result))
    }

    /// `Op::Call` implementation.
    fn call(&mut self, frame: &Frame, vm: &mut Vm, gas: &mut GasMeter) -> OpResult<()> {
        let [requested_gas, to, value] = vm.stack.pop3()?;
        let to = address_from_word(to);
        if frame.is_static && !value.is_zero() {
            return Err(OpError::StaticStateChange);
        }
        enforce::value_call(&frame.guard, frame.address, to, value)?;
        if frame.at_max_depth() {
            return Ok(vm.stack.push_bool(false)?);
        }
        let code = self.state.code(&to)?;
        let child = frame.child(to, value, frame.is_static);
        let from = frame.address;
        let result = self.enter(child, &code, requested_gas, gas, |state| {
            state.transfer(from, to, value)
        })?;
        Ok(vm.stack.push_bool(succeeded(&result))?)
    }

    /// `Op::StaticCall` implementation.
    fn static_call(&mut self, frame: &Frame, vm: &mut Vm, gas: &mut GasMeter) -> OpResult<()> {
        let [requested_gas, to] = vm.stack.pop2()?;
        let to = address_from_word(to);
        if frame.at_max_depth() {
            return Ok(vm.stack.push_bool(false)?);
        }
        let code = self.state.code(&to)?;
        let child = frame.child(to, Word::zero(), true);
        let result = self.enter(child, &code, requested_gas, gas, |_| Ok(true))?;
        Ok(vm.stack.push_bool(succeeded(&result))?)
    }

    /// `Op::DelegateCall` implementation.
    ///
    /// The target's code runs against this frame's address, caller and value.
    fn delegate_call(&mut self, frame: &Frame, vm: &mut Vm, gas: &mut GasMeter) -> OpResult<()> {
        let [requested_gas, target] = vm.stack.pop2()?;
        let target = address_from_word(target);
        enforce::delegate_call(&frame.guard)?;
        if frame.at_max_depth() {
            return Ok(vm.stack.push_bool(false)?);
        }
        let code = self.state.code(&target)?;
        let child = Frame {
            caller: frame.caller,
            ..frame.child(frame.address, frame.value, frame.is_static)
        };
        let result = self.enter(child, &code, requested_gas, gas, |_| Ok(true))?;
        Ok(vm.stack.push_bool(succeeded(&result))?)
    }

    /// `Op::Create` implementation.
    ///
    /// The bytes in memory are run as init code in a child frame with all
    /// remaining gas. If it succeeds, its output is installed as the new
    /// account's code and the new address is pushed, otherwise `0` is pushed.
    fn create(&mut self, frame: &Frame, vm: &mut Vm, gas: &mut GasMeter) -> OpResult<()> {
        let init_code = memory::pop_range(vm, gas, self.schedule)?;
        let value = vm.stack.pop()?;
        if frame.is_static {
            return Err(OpError::StaticStateChange);
        }
        let creator = frame.address;
        let nonce = self.state.nonce(&creator)?;
        let created = create_address(&creator, nonce);
        enforce::create(&frame.guard, creator, created, value)?;
        let Some(next_nonce) = nonce.checked_add(1) else {
            return Ok(vm.stack.push_bool(false)?);
        };
        if frame.at_max_depth() {
            return Ok(vm.stack.push_bool(false)?);
        }
        self.state.set_nonce(creator, next_nonce);
        if self.state.nonce(&created)? != 0 || !self.state.code(&created)?.is_empty() {
            return Ok(vm.stack.push_bool(false)?);
        }
        let child = frame.child(created, value, false);
        let result = self.enter(child, &init_code, Word::MAX, gas, |state| {
            state.set_nonce(created, 1);
            state.transfer(creator, created, value)
        })?;
        match result {
            Some(result) if result.status == Status::Success => {
                self.state.set_code(created, Code::from(result.output));
                Ok(vm.stack.push(word_from_address(&created))?)
            }
            _ => Ok(vm.stack.push_bool(false)?),
        }
    }

    /// `Op::SelfDestruct` implementation.
    ///
    /// Moves the whole balance to the beneficiary and erases the account.
    fn self_destruct(&mut self, frame: &Frame, vm: &mut Vm) -> OpResult<()> {
        let beneficiary = address_from_word(vm.stack.pop()?);
        if frame.is_static {
            return Err(OpError::StaticStateChange);
        }
        enforce::self_destruct(&frame.guard, frame.address)?;
        let balance = self.state.balance(&frame.address)?;
        // The balance is known to cover itself, so this only fails if the
        // beneficiary's balance would overflow, in which case it is burned.
        self.state.transfer(frame.address, beneficiary, balance)?;
        self.state.destroy(frame.address);
        Ok(())
    }
}

/// The address of the account created by `creator` at the given nonce.
pub fn create_address(creator: &Address, nonce: u64) -> Address {
    let hash = statefence_utils::hash(&(creator, nonce));
    Address::from_slice(&hash.as_bytes()[12..])
}

fn succeeded(result: &Option<FrameResult>) -> bool {
    matches!(result, Some(r) if r.status == Status::Success)
}
