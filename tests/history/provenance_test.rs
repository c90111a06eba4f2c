// Provenance tests
// Backward walks over the spend log to the originating deposit

use plasma_ledger::identity::{Hash256, SpendSigner};
use plasma_ledger::storage::{LedgerStore, MemoryStore, SledStore};
use plasma_ledger::{DepositRequest, LedgerConfig, LedgerError, TransitionEngine};
use std::sync::Arc;
use tempfile::TempDir;

/// Deposit `value` to `owner`, then pass the full unit around `hops` times
/// between the given signers. Returns (deposit id, final unit id).
fn build_chain(engine: &TransitionEngine, signers: &[SpendSigner], value: u64, hops: usize) -> (Hash256, Hash256) {
    let root = Hash256::from_bytes(rand::random::<[u8; 32]>());
    engine
        .record_deposit(DepositRequest::new(signers[0].address(), value, root))
        .unwrap();

    let mut current = root;
    for hop in 0..hops {
        let from = &signers[hop % signers.len()];
        let to = signers[(hop + 1) % signers.len()].address();
        let sig = from.sign_spend(&current, &to, value);
        current = engine.spend(&current, &to, value, &sig).unwrap().new_id1;
    }
    (root, current)
}

fn memory_engine(config: LedgerConfig) -> TransitionEngine {
    TransitionEngine::new(Arc::new(MemoryStore::new()), config).unwrap()
}

#[test]
fn test_deposit_root_has_empty_provenance() {
    let engine = memory_engine(LedgerConfig::default());
    let signers = vec![SpendSigner::generate()];
    let (root, _) = build_chain(&engine, &signers, 10, 0);

    assert!(engine.trace_provenance(&root).unwrap().is_empty());
    assert_eq!(engine.provenance().root_of(&root).unwrap(), root);
}

#[test]
fn test_k_spends_give_k_records() {
    let engine = memory_engine(LedgerConfig::default());
    let signers = vec![SpendSigner::generate(), SpendSigner::generate()];
    let (root, tip) = build_chain(&engine, &signers, 10, 5);

    let chain = engine.trace_provenance(&tip).unwrap();
    assert_eq!(chain.len(), 5);
    assert_eq!(chain[0].new_tx1, tip);
    assert_eq!(chain.last().unwrap().old_tx, root);

    // Most recent first
    let seqs: Vec<u64> = chain.iter().map(|s| s.seq).collect();
    assert_eq!(seqs, vec![5, 4, 3, 2, 1]);

    // Each record consumed what the next-older one produced
    for pair in chain.windows(2) {
        assert!(pair[1].produced(&pair[0].old_tx));
    }
}

#[test]
fn test_change_output_traces_back() {
    let engine = memory_engine(LedgerConfig::default());
    let owner = SpendSigner::generate();
    let bob = SpendSigner::generate();
    let root = Hash256::from_bytes([0x31; 32]);
    engine
        .record_deposit(DepositRequest::new(owner.address(), 10, root))
        .unwrap();

    let outcome = engine
        .spend(&root, &bob.address(), 4, &owner.sign_spend(&root, &bob.address(), 4))
        .unwrap();

    let chain = engine.trace_provenance(&outcome.new_id2.unwrap()).unwrap();
    assert_eq!(chain.len(), 1);
    assert_eq!(chain[0].old_tx, root);
    assert_eq!(chain, engine.trace_provenance(&outcome.new_id1).unwrap());
}

#[test]
fn test_provenance_on_sled() {
    let temp_dir = TempDir::new().unwrap();
    let store: Arc<dyn LedgerStore> = Arc::new(SledStore::open(temp_dir.path()).unwrap());
    let engine = TransitionEngine::new(store, LedgerConfig::default()).unwrap();
    let signers = vec![SpendSigner::generate(), SpendSigner::generate(), SpendSigner::generate()];
    let (root, tip) = build_chain(&engine, &signers, 7, 4);

    let chain = engine.trace_provenance(&tip).unwrap();
    assert_eq!(chain.len(), 4);
    assert_eq!(engine.provenance().root_of(&tip).unwrap(), root);
}

#[test]
fn test_depth_guard() {
    let engine = memory_engine(LedgerConfig::new().with_max_provenance_depth(3));
    let signers = vec![SpendSigner::generate(), SpendSigner::generate()];
    let (_, tip) = build_chain(&engine, &signers, 10, 4);

    assert_eq!(
        engine.trace_provenance(&tip).unwrap_err(),
        LedgerError::ProvenanceTooDeep { unit: tip, depth: 3 }
    );
}

#[test]
fn test_depth_guard_allows_exact_limit() {
    let engine = memory_engine(LedgerConfig::new().with_max_provenance_depth(3));
    let signers = vec![SpendSigner::generate(), SpendSigner::generate()];
    let (_, tip) = build_chain(&engine, &signers, 10, 3);

    assert_eq!(engine.trace_provenance(&tip).unwrap().len(), 3);
}

#[test]
fn test_merge_output_is_a_root() {
    let engine = memory_engine(LedgerConfig::default());
    let carol = SpendSigner::generate();
    let a = Hash256::from_bytes([0xa1; 32]);
    let b = Hash256::from_bytes([0xb1; 32]);
    engine.record_deposit(DepositRequest::new(carol.address(), 3, a)).unwrap();
    engine.record_deposit(DepositRequest::new(carol.address(), 5, b)).unwrap();

    let merged = engine.merge(&a, &b, &carol.sign_merge(&a, &b)).unwrap().new_id;
    assert!(engine.trace_provenance(&merged).unwrap().is_empty());
}
