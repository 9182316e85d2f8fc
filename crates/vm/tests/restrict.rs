use statefence_memory_storage::MemoryStorage;
use statefence_storage::QueryState;
use statefence_transaction_storage::TransactionStorage;
use statefence_types::{convert::word_from_address, Address, Category, MutableSetList, PolicyEntry, Word};
use statefence_vm::{asm::Op, create_address, execute, ExecOutcome, GasSchedule, Status};
use test_utils::*;

fn run(state: &mut TransactionStorage<MemoryStorage>) -> ExecOutcome {
    execute(state, &tx(GUARDED), &GasSchedule::default()).unwrap()
}

fn stored(state: &TransactionStorage<MemoryStorage>, address: Address, n: u64) -> Word {
    state.storage(&address, &slot(n)).unwrap()
}

fn own_slots(slots: &[u64]) -> MutableSetList {
    list(vec![(GUARDED, vec![storage_slots(slots)])])
}

#[test]
fn denied_write_halts_the_frame() {
    let restricted = own_slots(&[5]);

    let ops = program([restrict(&restricted), sstore(5, 1), sstore(6, 1)]);
    let mut state = with_contracts(vec![(GUARDED, ops)]);
    let outcome = run(&mut state);
    assert_eq!(outcome.status, Status::Halted);
    assert_eq!(outcome.gas_used, GAS);
    // The permitted write before the halt is discarded too.
    assert_eq!(stored(&state, GUARDED, 5), Word::zero());
    assert_eq!(stored(&state, GUARDED, 6), Word::zero());

    let ops = program([restrict(&restricted), sstore(5, 1), vec![Op::Halt]]);
    let mut state = with_contracts(vec![(GUARDED, ops)]);
    assert_eq!(run(&mut state).status, Status::Success);
    assert_eq!(stored(&state, GUARDED, 5), Word::one());
}

#[test]
fn unlisted_address_is_read_only() {
    let ops = program([
        restrict(&list(vec![(TARGET, vec![storage_slots(&[1])])])),
        vec![push(1), Op::SLoad, Op::Pop],
        sstore(1, 1),
    ]);
    let mut state = with_contracts(vec![(GUARDED, ops)]);
    assert_eq!(run(&mut state).status, Status::Halted);
}

#[test]
fn transient_storage_is_checked_per_slot() {
    let restricted = list(vec![(GUARDED, vec![transient_slots(&[1])])]);
    let ops = program([restrict(&restricted), tstore(1, 1), vec![Op::Halt]]);
    let mut state = with_contracts(vec![(GUARDED, ops)]);
    assert_eq!(run(&mut state).status, Status::Success);

    let ops = program([restrict(&restricted), tstore(2, 1)]);
    let mut state = with_contracts(vec![(GUARDED, ops)]);
    assert_eq!(run(&mut state).status, Status::Halted);
}

#[test]
fn callee_inherits_the_restriction() {
    let restricted = list(vec![(TARGET, vec![storage_slots(&[5])])]);
    let caller = program([restrict(&restricted), call(TARGET, 0), return_top()]);

    let mut state = with_contracts(vec![(GUARDED, caller.clone()), (TARGET, sstore(5, 1))]);
    let outcome = run(&mut state);
    assert_eq!(outcome.status, Status::Success);
    assert_eq!(returned_word(&outcome.output), Word::one());
    assert_eq!(stored(&state, TARGET, 5), Word::one());

    let mut state = with_contracts(vec![(GUARDED, caller), (TARGET, sstore(6, 1))]);
    let outcome = run(&mut state);
    assert_eq!(outcome.status, Status::Success);
    assert_eq!(returned_word(&outcome.output), Word::zero());
    assert_eq!(stored(&state, TARGET, 6), Word::zero());
}

#[test]
fn restriction_reaches_nested_callees() {
    let restricted = list(vec![
        (TARGET, vec![storage_slots(&[7, 8])]),
        (NESTED, vec![storage_slots(&[1])]),
    ]);
    let caller = program([restrict(&restricted), call(TARGET, 0)]);
    // TARGET records whether its call into NESTED succeeded in slot 7, then
    // marks that it finished in slot 8.
    let target = program([
        call_with_gas(NESTED, 0, CALL_GAS / 4),
        vec![push(7), Op::Swap, Op::SStore],
        sstore(8, 1),
    ]);

    let mut state = with_contracts(vec![
        (GUARDED, caller.clone()),
        (TARGET, target.clone()),
        (NESTED, sstore(1, 1)),
    ]);
    assert_eq!(run(&mut state).status, Status::Success);
    assert_eq!(stored(&state, TARGET, 7), Word::one());
    assert_eq!(stored(&state, TARGET, 8), Word::one());
    assert_eq!(stored(&state, NESTED, 1), Word::one());

    let nested = program([unrestrict(), sstore(2, 1)]);
    let mut state = with_contracts(vec![(GUARDED, caller), (TARGET, target), (NESTED, nested)]);
    assert_eq!(run(&mut state).status, Status::Success);
    // TARGET carried on after NESTED halted and recorded the failure.
    assert_eq!(stored(&state, TARGET, 7), Word::zero());
    assert_eq!(stored(&state, TARGET, 8), Word::one());
    assert_eq!(stored(&state, NESTED, 2), Word::zero());
}

#[test]
fn callee_cannot_release_an_inherited_restriction() {
    let caller = program([
        restrict(&list(vec![(TARGET, vec![storage_slots(&[5])])])),
        call(TARGET, 0),
        return_top(),
    ]);
    let target = program([unrestrict(), sstore(6, 1)]);
    let mut state = with_contracts(vec![(GUARDED, caller), (TARGET, target)]);
    let outcome = run(&mut state);
    assert_eq!(outcome.status, Status::Success);
    assert_eq!(returned_word(&outcome.output), Word::zero());
    assert_eq!(stored(&state, TARGET, 6), Word::zero());
}

#[test]
fn callee_can_only_narrow_an_inherited_restriction() {
    let caller = program([
        restrict(&list(vec![(TARGET, vec![storage_slots(&[1, 2])])])),
        call(TARGET, 0),
        return_top(),
    ]);
    let narrowed = list(vec![(TARGET, vec![storage_slots(&[2, 3])])]);
    for (key, allowed) in [(1, false), (2, true), (3, false)] {
        let target = program([restrict(&narrowed), sstore(key, 1)]);
        let mut state = with_contracts(vec![(GUARDED, caller.clone()), (TARGET, target)]);
        let outcome = run(&mut state);
        assert_eq!(outcome.status, Status::Success);
        assert_eq!(
            returned_word(&outcome.output),
            Word::from(u8::from(allowed)),
            "slot {key}"
        );
    }
}

#[test]
fn local_restriction_can_be_released() {
    let ops = program([restrict(&own_slots(&[5])), unrestrict(), sstore(6, 1), vec![Op::Halt]]);
    let mut state = with_contracts(vec![(GUARDED, ops)]);
    assert_eq!(run(&mut state).status, Status::Success);
    assert_eq!(stored(&state, GUARDED, 6), Word::one());
}

#[test]
fn local_restriction_can_be_replaced() {
    let ops = program([
        restrict(&own_slots(&[5])),
        restrict(&own_slots(&[6])),
        sstore(6, 1),
        sstore(5, 1),
    ]);
    let mut state = with_contracts(vec![(GUARDED, ops)]);
    assert_eq!(run(&mut state).status, Status::Halted);
}

#[test]
fn restriction_ends_with_its_frame() {
    // The callee restricts itself to nothing, then returns.
    let target = program([restrict(&list(vec![])), vec![Op::Halt]]);
    let caller = program([call(TARGET, 0), sstore(1, 1), vec![Op::Halt]]);
    let mut state = with_contracts(vec![(GUARDED, caller), (TARGET, target)]);
    assert_eq!(run(&mut state).status, Status::Success);
    assert_eq!(stored(&state, GUARDED, 1), Word::one());
}

#[test]
fn unrestricted_callee_is_unrestricted() {
    let caller = program([call(TARGET, 0), return_top()]);
    let mut state = with_contracts(vec![(GUARDED, caller), (TARGET, sstore(9, 1))]);
    let outcome = run(&mut state);
    assert_eq!(returned_word(&outcome.output), Word::one());
    assert_eq!(stored(&state, TARGET, 9), Word::one());
}

fn everything_on(address: Address) -> Vec<(Address, Vec<PolicyEntry>)> {
    vec![(
        address,
        vec![
            allow(Category::Code),
            allow(Category::Nonce),
            allow(Category::Balance),
            storage_slots(&[0, 1, 2]),
        ],
    )]
}

#[test]
fn delegate_call_is_always_denied() {
    let ops = program([
        restrict(&list(everything_on(GUARDED))),
        delegate_call(TARGET),
        vec![Op::Halt],
    ]);
    let mut state = with_contracts(vec![(GUARDED, ops), (TARGET, vec![Op::Halt])]);
    let outcome = run(&mut state);
    assert_eq!(outcome.status, Status::Halted);
    assert_eq!(outcome.gas_used, GAS);
}

#[test]
fn self_destruct_is_always_denied() {
    let ops = program([
        restrict(&list(everything_on(GUARDED))),
        vec![push_address(BOB), Op::SelfDestruct],
    ]);
    let mut state = with_contracts(vec![(GUARDED, ops)]);
    assert_eq!(run(&mut state).status, Status::Halted);
    assert_eq!(state.balance(&GUARDED).unwrap(), Word::from(100));

    let ops = vec![push_address(BOB), Op::SelfDestruct];
    let mut state = with_contracts(vec![(GUARDED, ops)]);
    assert_eq!(run(&mut state).status, Status::Success);
    assert_eq!(state.balance(&BOB).unwrap(), Word::from(1_100));
}

#[test]
fn value_calls_need_balance_on_both_sides() {
    let own = list(vec![(GUARDED, vec![allow(Category::Balance)])]);

    let ops = program([restrict(&own), call(TARGET, 0), return_top()]);
    let mut state = with_contracts(vec![(GUARDED, ops), (TARGET, vec![])]);
    assert_eq!(returned_word(&run(&mut state).output), Word::one());

    let ops = program([restrict(&own), call(TARGET, 5), return_top()]);
    let mut state = with_contracts(vec![(GUARDED, ops), (TARGET, vec![])]);
    assert_eq!(run(&mut state).status, Status::Halted);

    let both = list(vec![
        (GUARDED, vec![allow(Category::Balance)]),
        (TARGET, vec![allow(Category::Balance)]),
    ]);
    let ops = program([restrict(&both), call(TARGET, 5), return_top()]);
    let mut state = with_contracts(vec![(GUARDED, ops), (TARGET, vec![])]);
    let outcome = run(&mut state);
    assert_eq!(returned_word(&outcome.output), Word::one());
    assert_eq!(state.balance(&TARGET).unwrap(), Word::from(105));
}

#[test]
fn create_needs_code_and_nonce_permissions() {
    let created = create_address(&GUARDED, 1);
    let deployed = vec![statefence_vm::asm::Opcode::Halt as u8];

    let permitted = list(vec![
        (created, vec![allow(Category::Code), allow(Category::Nonce)]),
        (GUARDED, vec![allow(Category::Nonce)]),
    ]);
    let ops = program([restrict(&permitted), create(0, &deployed), return_top()]);
    let mut state = with_contracts(vec![(GUARDED, ops)]);
    let outcome = run(&mut state);
    assert_eq!(outcome.status, Status::Success);
    assert_eq!(
        returned_word(&outcome.output),
        word_from_address(&created)
    );
    assert_eq!(&state.code(&created).unwrap()[..], &deployed[..]);

    let creator_nonce_missing = list(vec![(
        created,
        vec![allow(Category::Code), allow(Category::Nonce)],
    )]);
    let ops = program([restrict(&creator_nonce_missing), create(0, &deployed), return_top()]);
    let mut state = with_contracts(vec![(GUARDED, ops)]);
    assert_eq!(run(&mut state).status, Status::Halted);
    assert_eq!(state.nonce(&GUARDED).unwrap(), 1);

    // Endowing the new account also needs balance permissions.
    let ops = program([restrict(&permitted), create(5, &deployed), return_top()]);
    let mut state = with_contracts(vec![(GUARDED, ops)]);
    assert_eq!(run(&mut state).status, Status::Halted);
}

#[test]
fn static_frames_may_restrict_but_not_write() {
    let caller = program([static_call(TARGET), return_top()]);

    let target = program([restrict(&list(vec![])), vec![Op::Halt]]);
    let mut state = with_contracts(vec![(GUARDED, caller.clone()), (TARGET, target)]);
    let outcome = run(&mut state);
    assert_eq!(outcome.status, Status::Success);
    assert_eq!(returned_word(&outcome.output), Word::one());

    let permitted = list(vec![(TARGET, vec![storage_slots(&[1])])]);
    let target = program([restrict(&permitted), sstore(1, 1)]);
    let mut state = with_contracts(vec![(GUARDED, caller), (TARGET, target)]);
    let outcome = run(&mut state);
    assert_eq!(outcome.status, Status::Success);
    assert_eq!(returned_word(&outcome.output), Word::zero());
}

#[test]
fn malformed_list_halts() {
    let garbage = program([store_bytes(0, &[0xFF, 0x01]), vec![push(0), push(2), push(1), Op::Restrict]]);
    let mut state = with_contracts(vec![(GUARDED, garbage)]);
    let outcome = run(&mut state);
    assert_eq!(outcome.status, Status::Halted);
    assert_eq!(outcome.gas_used, GAS);

    // A valid encoding that does not fit within the declared maximum length.
    let bytes = own_slots(&[5]).to_rlp();
    let truncated = program([
        store_bytes(0, &bytes),
        vec![push(0), push(bytes.len() as u64 - 1), push(1), Op::Restrict],
    ]);
    let mut state = with_contracts(vec![(GUARDED, truncated)]);
    assert_eq!(run(&mut state).status, Status::Halted);

    let bad_flag = vec![push(0), push(0), push(2), Op::Restrict];
    let mut state = with_contracts(vec![(GUARDED, bad_flag)]);
    assert_eq!(run(&mut state).status, Status::Halted);

    let underflow = vec![push(0), push(1), Op::Restrict];
    let mut state = with_contracts(vec![(GUARDED, underflow)]);
    assert_eq!(run(&mut state).status, Status::Halted);
}

#[test]
fn declared_length_may_exceed_the_encoding() {
    let bytes = own_slots(&[5]).to_rlp();
    let ops = program([
        store_bytes(0, &bytes),
        vec![push(0), push(bytes.len() as u64 + 32), push(1), Op::Restrict],
        sstore(5, 1),
        vec![Op::Halt],
    ]);
    let mut state = with_contracts(vec![(GUARDED, ops)]);
    assert_eq!(run(&mut state).status, Status::Success);
    assert_eq!(stored(&state, GUARDED, 5), Word::one());

    // The padding does not widen the restriction.
    let ops = program([
        store_bytes(0, &bytes),
        vec![push(0), push(bytes.len() as u64 + 32), push(1), Op::Restrict],
        sstore(6, 1),
    ]);
    let mut state = with_contracts(vec![(GUARDED, ops)]);
    assert_eq!(run(&mut state).status, Status::Halted);
}

#[test]
fn restrict_is_charged_per_declared_word() {
    let schedule = GasSchedule::default();
    let spent = |max_len: u64| {
        let ops = vec![push(0), push(max_len), push(0), Op::Restrict];
        let mut state = with_contracts(vec![(GUARDED, ops)]);
        let outcome = run(&mut state);
        assert_eq!(outcome.status, Status::Success);
        outcome.gas_used
    };
    let base = 3 * schedule.base + schedule.restrict_base;
    assert_eq!(spent(0), base);
    assert_eq!(
        spent(64),
        base + schedule.restrict_decode_cost(64) + schedule.memory_cost(2)
    );
    assert_eq!(
        spent(65),
        base + schedule.restrict_decode_cost(65) + schedule.memory_cost(3)
    );
}

#[test]
fn denials_are_logged() {
    let _ = tracing_subscriber::fmt::try_init();
    let ops = program([restrict(&own_slots(&[5])), sstore(6, 1)]);
    let mut state = with_contracts(vec![(GUARDED, ops)]);
    assert_eq!(run(&mut state).status, Status::Halted);
}
