// Authorization verifier tests
// Signer recovery from (v, r, s) over spend and merge messages

use plasma_ledger::identity::{
    Address, AuthorizationVerifier, Hash256, SignatureError, SpendSignature, SpendSigner,
};

fn unit_id() -> Hash256 {
    Hash256::from_bytes([0x42; 32])
}

// ============================================================================
// KEYS AND ADDRESSES
// ============================================================================

#[test]
fn test_known_key_address() {
    let mut secret = [0u8; 32];
    secret[31] = 1;
    let signer = SpendSigner::from_bytes(&secret).unwrap();

    assert_eq!(
        signer.address(),
        Address::parse("0x7e5f4552091a69125d5dfcb7b8c2659029395bdf").unwrap()
    );
}

#[test]
fn test_key_hex_roundtrip() {
    let signer = SpendSigner::generate();
    let hex_key = format!("0x{}", hex::encode(signer.secret_bytes()));
    let restored = SpendSigner::from_hex(&hex_key).unwrap();

    assert_eq!(signer.address(), restored.address());
}

#[test]
fn test_zero_key_rejected() {
    assert!(SpendSigner::from_bytes(&[0u8; 32]).is_err());
}

// ============================================================================
// SPEND RECOVERY
// ============================================================================

#[test]
fn test_recover_spend_signer() {
    let signer = SpendSigner::generate();
    let to = Address::from_bytes([7; 20]);
    let sig = signer.sign_spend(&unit_id(), &to, 10);

    let verifier = AuthorizationVerifier::new();
    assert_eq!(
        verifier.verify_spend_authorization(&unit_id(), &to, 10, &sig).unwrap(),
        signer.address()
    );
}

#[test]
fn test_tampered_recipient_recovers_other_address() {
    let signer = SpendSigner::generate();
    let to = Address::from_bytes([7; 20]);
    let sig = signer.sign_spend(&unit_id(), &to, 10);

    let verifier = AuthorizationVerifier::new();
    let other = Address::from_bytes([8; 20]);
    match verifier.verify_spend_authorization(&unit_id(), &other, 10, &sig) {
        Ok(recovered) => assert_ne!(recovered, signer.address()),
        Err(SignatureError::RecoveryFailed(_)) => {}
        Err(e) => panic!("unexpected error: {}", e),
    }
}

#[test]
fn test_legacy_v_recovers_same_signer() {
    let signer = SpendSigner::generate();
    let to = Address::from_bytes([7; 20]);
    let sig = signer.sign_spend(&unit_id(), &to, 10);
    let legacy = SpendSignature::new(sig.v() + 27, *sig.r(), *sig.s()).unwrap();

    let verifier = AuthorizationVerifier::new();
    assert_eq!(
        verifier.verify_spend_authorization(&unit_id(), &to, 10, &legacy).unwrap(),
        signer.address()
    );
}

#[test]
fn test_hex_components_roundtrip() {
    let signer = SpendSigner::generate();
    let to = Address::from_bytes([7; 20]);
    let sig = signer.sign_spend(&unit_id(), &to, 10);

    let parsed = SpendSignature::from_hex(sig.v(), &hex::encode(sig.r()), &hex::encode(sig.s())).unwrap();
    assert_eq!(parsed, sig);
}

#[test]
fn test_zero_signature_fails_recovery() {
    let sig = SpendSignature::new(0, [0; 32], [0; 32]).unwrap();
    let verifier = AuthorizationVerifier::new();

    let result = verifier.verify_spend_authorization(&unit_id(), &Address::from_bytes([1; 20]), 1, &sig);
    assert!(matches!(result, Err(SignatureError::RecoveryFailed(_))));
}

#[test]
fn test_malformed_hex_rejected() {
    let result = SpendSignature::from_hex(27, "zz", "00");
    assert!(matches!(result, Err(SignatureError::InvalidComponent { .. })));
}

// ============================================================================
// MERGE RECOVERY
// ============================================================================

#[test]
fn test_recover_merge_signer() {
    let signer = SpendSigner::generate();
    let id2 = Hash256::from_bytes([0x43; 32]);
    let sig = signer.sign_merge(&unit_id(), &id2);

    let verifier = AuthorizationVerifier::new();
    assert_eq!(
        verifier.verify_merge_authorization(&unit_id(), &id2, &sig).unwrap(),
        signer.address()
    );
}
