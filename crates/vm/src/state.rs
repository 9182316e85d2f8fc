//! Environment and state access operation implementations.

use crate::{
    enforce,
    error::{OpError, OpResult},
    frame::Frame,
    Vm,
};
use statefence_storage::{QueryState, QueryTransient};
use statefence_transaction_storage::TransactionStorage;
use statefence_types::convert::{address_from_word, key_from_word, word_from_address, word_from_key};

/// `Op::Address` implementation.
pub(crate) fn address(frame: &Frame, vm: &mut Vm) -> OpResult<()> {
    Ok(vm.stack.push(word_from_address(&frame.address))?)
}

/// `Op::Caller` implementation.
pub(crate) fn caller(frame: &Frame, vm: &mut Vm) -> OpResult<()> {
    Ok(vm.stack.push(word_from_address(&frame.caller))?)
}

/// `Op::CallValue` implementation.
pub(crate) fn call_value(frame: &Frame, vm: &mut Vm) -> OpResult<()> {
    Ok(vm.stack.push(frame.value)?)
}

/// `Op::Balance` implementation.
pub(crate) fn balance(state: &impl QueryState, vm: &mut Vm) -> OpResult<()> {
    let address = address_from_word(vm.stack.pop()?);
    let balance = state.balance(&address)?;
    Ok(vm.stack.push(balance)?)
}

/// `Op::SelfBalance` implementation.
pub(crate) fn self_balance(state: &impl QueryState, frame: &Frame, vm: &mut Vm) -> OpResult<()> {
    let balance = state.balance(&frame.address)?;
    Ok(vm.stack.push(balance)?)
}

/// `Op::CodeHash` implementation.
pub(crate) fn code_hash(state: &impl QueryState, vm: &mut Vm) -> OpResult<()> {
    let address = address_from_word(vm.stack.pop()?);
    let hash = state.code_hash(&address)?;
    Ok(vm.stack.push(word_from_key(&hash))?)
}

/// `Op::SLoad` implementation.
pub(crate) fn sload(state: &impl QueryState, frame: &Frame, vm: &mut Vm) -> OpResult<()> {
    let key = key_from_word(vm.stack.pop()?);
    let value = state.storage(&frame.address, &key)?;
    Ok(vm.stack.push(value)?)
}

/// `Op::TLoad` implementation.
pub(crate) fn tload(state: &impl QueryTransient, frame: &Frame, vm: &mut Vm) -> OpResult<()> {
    let key = key_from_word(vm.stack.pop()?);
    let value = state.transient(&frame.address, &key)?;
    Ok(vm.stack.push(value)?)
}

/// `Op::SStore` implementation.
pub(crate) fn sstore<S>(state: &mut TransactionStorage<S>, frame: &Frame, vm: &mut Vm) -> OpResult<()> {
    let [key, value] = vm.stack.pop2()?;
    if frame.is_static {
        return Err(OpError::StaticStateChange);
    }
    let key = key_from_word(key);
    enforce::storage_write(&frame.guard, frame.address, key)?;
    state.set_storage(frame.address, key, value);
    Ok(())
}

/// `Op::TStore` implementation.
pub(crate) fn tstore<S>(state: &mut TransactionStorage<S>, frame: &Frame, vm: &mut Vm) -> OpResult<()> {
    let [key, value] = vm.stack.pop2()?;
    if frame.is_static {
        return Err(OpError::StaticStateChange);
    }
    let key = key_from_word(key);
    enforce::transient_write(&frame.guard, frame.address, key)?;
    state.set_transient(frame.address, key, value);
    Ok(())
}
