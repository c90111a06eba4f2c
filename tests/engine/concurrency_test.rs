// Concurrency tests
// Racing transitions against one unit: the store lets exactly one through

use plasma_ledger::identity::{Address, Hash256, SpendSigner};
use plasma_ledger::storage::{LedgerStore, MemoryStore, SledStore};
use plasma_ledger::{DepositRequest, LedgerConfig, LedgerError, TransitionEngine};
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

const RACERS: usize = 8;

fn race_spends(store: Arc<dyn LedgerStore>) {
    let engine = Arc::new(TransitionEngine::new(store, LedgerConfig::default()).unwrap());
    let alice = Arc::new(SpendSigner::generate());
    let root = Hash256::from_bytes([0x10; 32]);
    engine
        .record_deposit(DepositRequest::new(alice.address(), 100, root))
        .unwrap();

    let barrier = Arc::new(Barrier::new(RACERS));
    let handles: Vec<_> = (0..RACERS)
        .map(|i| {
            let engine = engine.clone();
            let alice = alice.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                // Every racer pays a different recipient, so outputs never collide
                let to = Address::from_bytes([i as u8 + 1; 20]);
                let sig = alice.sign_spend(&root, &to, 10);
                barrier.wait();
                engine.spend(&root, &to, 10, &sig)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for result in results.iter().filter(|r| r.is_err()) {
        assert_eq!(result.as_ref().unwrap_err(), &LedgerError::AlreadySpent(root));
    }

    assert_eq!(engine.store().stats().unwrap().spends, 1);
    assert_eq!(engine.units().balance_of(&alice.address()).unwrap(), 90);
}

#[test]
fn test_racing_spends_sled() {
    let temp_dir = TempDir::new().unwrap();
    race_spends(Arc::new(SledStore::open(temp_dir.path()).unwrap()));
}

#[test]
fn test_racing_spends_memory() {
    race_spends(Arc::new(MemoryStore::new()));
}

#[test]
fn test_racing_identical_replays() {
    let temp_dir = TempDir::new().unwrap();
    let store: Arc<dyn LedgerStore> = Arc::new(SledStore::open(temp_dir.path()).unwrap());
    let engine = Arc::new(TransitionEngine::new(store, LedgerConfig::default()).unwrap());
    let alice = SpendSigner::generate();
    let bob = Address::from_bytes([0xb0; 20]);
    let root = Hash256::from_bytes([0x20; 32]);
    engine
        .record_deposit(DepositRequest::new(alice.address(), 50, root))
        .unwrap();
    let sig = alice.sign_spend(&root, &bob, 20);

    let barrier = Arc::new(Barrier::new(RACERS));
    let handles: Vec<_> = (0..RACERS)
        .map(|_| {
            let engine = engine.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                engine.spend(&root, &bob, 20, &sig)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().filter_map(|r| r.as_ref().err()).all(|e| matches!(
        e,
        LedgerError::AlreadySpent(_) | LedgerError::DuplicateId(_)
    )));
    assert_eq!(engine.units().balance_of(&bob).unwrap(), 20);
    assert_eq!(engine.units().balance_of(&alice.address()).unwrap(), 30);
}

#[test]
fn test_racing_merges_share_an_input() {
    let temp_dir = TempDir::new().unwrap();
    let store: Arc<dyn LedgerStore> = Arc::new(SledStore::open(temp_dir.path()).unwrap());
    let engine = Arc::new(TransitionEngine::new(store, LedgerConfig::default()).unwrap());
    let carol = SpendSigner::generate();
    let ids: Vec<Hash256> = (1..=3u8).map(|b| Hash256::from_bytes([b; 32])).collect();
    for id in &ids {
        engine
            .record_deposit(DepositRequest::new(carol.address(), 5, *id))
            .unwrap();
    }

    // Both merges consume ids[0]
    let sig_a = carol.sign_merge(&ids[0], &ids[1]);
    let sig_b = carol.sign_merge(&ids[0], &ids[2]);
    let barrier = Arc::new(Barrier::new(2));
    let (e1, b1, i0, i1) = (engine.clone(), barrier.clone(), ids[0], ids[1]);
    let first = thread::spawn(move || {
        b1.wait();
        e1.merge(&i0, &i1, &sig_a)
    });
    let (e2, b2, i2) = (engine.clone(), barrier.clone(), ids[2]);
    let second = thread::spawn(move || {
        b2.wait();
        e2.merge(&i0, &i2, &sig_b)
    });

    let results = [first.join().unwrap(), second.join().unwrap()];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(engine.units().balance_of(&carol.address()).unwrap(), 15);
}
