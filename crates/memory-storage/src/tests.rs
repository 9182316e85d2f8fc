use super::*;

fn address(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

fn key(n: u64) -> Key {
    Key::from_low_u64_be(n)
}

#[test]
fn test_unknown_account_reads_empty() {
    let storage = MemoryStorage::new();
    let a = address(1);
    assert_eq!(storage.balance(&a).unwrap(), Word::zero());
    assert_eq!(storage.nonce(&a).unwrap(), 0);
    assert!(storage.code(&a).unwrap().is_empty());
    assert_eq!(storage.storage(&a, &key(1)).unwrap(), Word::zero());
    assert_eq!(
        storage.code_hash(&a).unwrap(),
        statefence_storage::code_hash(&[])
    );
}

#[test]
fn test_insert_account() {
    let storage = MemoryStorage::new();
    let a = address(1);
    storage.insert_account(
        a,
        Account {
            nonce: 3,
            balance: Word::from(100),
            code: vec![0x00],
        },
    );
    assert_eq!(storage.balance(&a).unwrap(), Word::from(100));
    assert_eq!(storage.nonce(&a).unwrap(), 3);
    assert_eq!(&storage.code(&a).unwrap()[..], &[0x00]);
}

#[test]
fn test_clones_share_state() {
    let storage = MemoryStorage::new();
    let clone = storage.clone();
    clone.insert_storage(address(1), key(2), Word::from(7));
    assert_eq!(storage.storage(&address(1), &key(2)).unwrap(), Word::from(7));
}

#[test]
fn test_update_state_batch() {
    let storage = MemoryStorage::new();
    let a = address(1);
    storage
        .update_state_batch([
            StateUpdate::Balance(a, Word::from(50)),
            StateUpdate::Nonce(a, 1),
            StateUpdate::Code(a, Code::from(vec![1, 2, 3])),
            StateUpdate::Storage(a, key(1), Word::from(10)),
            StateUpdate::Storage(a, key(2), Word::from(20)),
        ])
        .unwrap();
    assert_eq!(storage.balance(&a).unwrap(), Word::from(50));
    assert_eq!(storage.nonce(&a).unwrap(), 1);
    assert_eq!(&storage.code(&a).unwrap()[..], &[1, 2, 3]);
    assert_eq!(storage.storage_len(&a), 2);

    // Writing zero clears the slot.
    storage
        .update_state_batch([StateUpdate::Storage(a, key(1), Word::zero())])
        .unwrap();
    assert_eq!(storage.storage(&a, &key(1)).unwrap(), Word::zero());
    assert_eq!(storage.storage_len(&a), 1);
}

#[test]
fn test_destroy_erases_account_and_storage() {
    let storage = MemoryStorage::new();
    let a = address(1);
    storage.insert_account(
        a,
        Account {
            nonce: 1,
            balance: Word::from(5),
            code: vec![0x00],
        },
    );
    storage.insert_storage(a, key(1), Word::from(1));
    storage
        .update_state_batch([StateUpdate::Destroy(a)])
        .unwrap();
    assert_eq!(storage.balance(&a).unwrap(), Word::zero());
    assert_eq!(storage.nonce(&a).unwrap(), 0);
    assert!(storage.code(&a).unwrap().is_empty());
    assert_eq!(storage.storage_len(&a), 0);
}
