use statefence_memory_storage::MemoryStorage;
use statefence_storage::Account;
use statefence_transaction_storage::TransactionStorage;
use statefence_types::{
    convert::{key_from_word, word_from_address},
    Address, Category, Gas, Key, MutableSet, MutableSetList, PolicyEntry, Word,
};
use statefence_vm::{asm::Op, GasLimit, Transaction};

pub const ALICE: Address = Address::repeat_byte(0xA1);
pub const BOB: Address = Address::repeat_byte(0xB0);
pub const GUARDED: Address = Address::repeat_byte(0xC0);
pub const TARGET: Address = Address::repeat_byte(0xC1);
pub const NESTED: Address = Address::repeat_byte(0xC2);

pub const GAS: Gas = 10_000_000;

/// Gas requested by the call helpers. A halted callee burns only this much,
/// leaving its caller enough to carry on.
pub const CALL_GAS: Gas = GAS / 4;

pub fn slot(n: u64) -> Key {
    key_from_word(Word::from(n))
}

pub fn account(balance: u64, ops: impl IntoIterator<Item = Op>) -> Account {
    Account {
        nonce: 1,
        balance: Word::from(balance),
        code: statefence_vm::asm::to_bytes(ops).collect(),
    }
}

/// Storage where ALICE and BOB hold 1_000 each.
pub fn funded_storage() -> MemoryStorage {
    let storage = MemoryStorage::new();
    storage.insert_account(ALICE, account(1_000, []));
    storage.insert_account(BOB, account(1_000, []));
    storage
}

/// A transaction over `funded_storage` with each contract deployed holding 100.
pub fn with_contracts(contracts: Vec<(Address, Vec<Op>)>) -> TransactionStorage<MemoryStorage> {
    let storage = funded_storage();
    for (address, ops) in contracts {
        storage.insert_account(address, account(100, ops));
    }
    TransactionStorage::new(storage)
}

pub fn tx(to: Address) -> Transaction {
    Transaction {
        caller: ALICE,
        to,
        value: Word::zero(),
        gas_limit: GasLimit { total: GAS },
    }
}

pub fn list(sets: Vec<(Address, Vec<PolicyEntry>)>) -> MutableSetList {
    sets.into_iter()
        .map(|(address, entries)| MutableSet { address, entries })
        .collect::<Vec<_>>()
        .into()
}

pub fn allow(category: Category) -> PolicyEntry {
    PolicyEntry::scalar(category, true)
}

pub fn storage_slots(slots: &[u64]) -> PolicyEntry {
    PolicyEntry::storage(slots.iter().copied().map(slot))
}

pub fn transient_slots(slots: &[u64]) -> PolicyEntry {
    PolicyEntry::transient_storage(slots.iter().copied().map(slot))
}

pub fn push(w: u64) -> Op {
    Op::Push(Word::from(w))
}

pub fn push_address(address: Address) -> Op {
    Op::Push(word_from_address(&address))
}

/// Write `bytes` into memory from `offset`, one word at a time.
pub fn store_bytes(offset: u64, bytes: &[u8]) -> Vec<Op> {
    bytes
        .chunks(32)
        .enumerate()
        .flat_map(|(i, chunk)| {
            let mut word = [0u8; 32];
            word[..chunk.len()].copy_from_slice(chunk);
            [
                push(offset + 32 * i as u64),
                Op::Push(Word::from_big_endian(&word)),
                Op::MStore,
            ]
        })
        .collect()
}

/// Restrict the running frame to the given list, encoded at memory offset 0.
pub fn restrict(list: &MutableSetList) -> Vec<Op> {
    let bytes = list.to_rlp();
    let mut ops = store_bytes(0, &bytes);
    ops.extend([push(0), push(bytes.len() as u64), push(1), Op::Restrict]);
    ops
}

/// Release the running frame's restriction.
pub fn unrestrict() -> Vec<Op> {
    vec![push(0), push(0), push(0), Op::Restrict]
}

pub fn sstore(key: u64, value: u64) -> Vec<Op> {
    vec![push(key), push(value), Op::SStore]
}

pub fn tstore(key: u64, value: u64) -> Vec<Op> {
    vec![push(key), push(value), Op::TStore]
}

/// Call `to` with `CALL_GAS`, leaving `1` or `0` on the stack.
pub fn call(to: Address, value: u64) -> Vec<Op> {
    call_with_gas(to, value, CALL_GAS)
}

pub fn call_with_gas(to: Address, value: u64, gas: Gas) -> Vec<Op> {
    vec![push(gas), push_address(to), push(value), Op::Call]
}

pub fn delegate_call(to: Address) -> Vec<Op> {
    vec![push(CALL_GAS), push_address(to), Op::DelegateCall]
}

pub fn static_call(to: Address) -> Vec<Op> {
    vec![push(CALL_GAS), push_address(to), Op::StaticCall]
}

/// Create an account whose code is `code`, leaving its address or `0` on the stack.
///
/// The init code is written to memory from offset `4096` so it does not
/// overlap an encoded restriction.
pub fn create(value: u64, code: &[u8]) -> Vec<Op> {
    const OFFSET: u64 = 4096;
    let init = deploy_code(code);
    let mut ops = store_bytes(OFFSET, &init);
    ops.extend([push(value), push(OFFSET), push(init.len() as u64), Op::Create]);
    ops
}

/// Init code returning `code`.
pub fn deploy_code(code: &[u8]) -> Vec<u8> {
    let mut ops = store_bytes(0, code);
    ops.extend([push(0), push(code.len() as u64), Op::Return]);
    statefence_vm::asm::to_bytes(ops).collect()
}

/// Store the top of the stack at memory `8192` and return it.
pub fn return_top() -> Vec<Op> {
    vec![
        push(8192),
        Op::Swap,
        Op::MStore,
        push(8192),
        push(32),
        Op::Return,
    ]
}

pub fn returned_word(output: &[u8]) -> Word {
    Word::from_big_endian(output)
}

/// Concatenate program fragments.
pub fn program(parts: impl IntoIterator<Item = Vec<Op>>) -> Vec<Op> {
    parts.into_iter().flatten().collect()
}
