// Authorization Verifier - answers "who signed this message"
//
// Ownership is not checked here; the transition engine compares the
// recovered address with the unit owner.

use crate::identity::derive::{keccak256, merge_message, spend_message};
use crate::identity::{Address, Hash256, SignatureError, SpendSignature, UnitId};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, VerifyOnly};

/// Ethereum-style address of a public key: the last 20 bytes of the
/// Keccak-256 of its uncompressed encoding (without the `0x04` tag).
pub fn address_of(public_key: &PublicKey) -> Address {
    let uncompressed = public_key.serialize_uncompressed();
    let hash = keccak256(&[&uncompressed[1..]]);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash.as_bytes()[12..]);
    Address::from_bytes(bytes)
}

/// Recovers signer addresses from spend and merge signatures
pub struct AuthorizationVerifier {
    secp: Secp256k1<VerifyOnly>,
}

impl AuthorizationVerifier {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::verification_only(),
        }
    }

    /// Recover the address that signed `hash`
    pub fn recover(&self, hash: &Hash256, signature: &SpendSignature) -> Result<Address, SignatureError> {
        let recovery_id = RecoveryId::from_i32(i32::from(signature.v()))
            .map_err(|e| SignatureError::RecoveryFailed(e.to_string()))?;
        let recoverable = RecoverableSignature::from_compact(&signature.compact(), recovery_id)
            .map_err(|e| SignatureError::RecoveryFailed(e.to_string()))?;
        let message = Message::from_digest(*hash.as_bytes());
        let public_key = self
            .secp
            .recover_ecdsa(&message, &recoverable)
            .map_err(|e| SignatureError::RecoveryFailed(e.to_string()))?;
        Ok(address_of(&public_key))
    }

    /// Recover the signer of a spend of `value` from `unit_id` to `recipient`
    pub fn verify_spend_authorization(
        &self,
        unit_id: &UnitId,
        recipient: &Address,
        value: u64,
        signature: &SpendSignature,
    ) -> Result<Address, SignatureError> {
        self.recover(&spend_message(unit_id, recipient, value), signature)
    }

    /// Recover the signer of a merge of `id1` and `id2`
    pub fn verify_merge_authorization(
        &self,
        id1: &UnitId,
        id2: &UnitId,
        signature: &SpendSignature,
    ) -> Result<Address, SignatureError> {
        self.recover(&merge_message(id1, id2), signature)
    }
}

impl Default for AuthorizationVerifier {
    fn default() -> Self {
        Self::new()
    }
}
