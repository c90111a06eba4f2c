// Client-side signing of spends and merges

use crate::identity::derive::{merge_message, spend_message};
use crate::identity::verifier::address_of;
use crate::identity::{Address, Hash256, SpendSignature, UnitId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey, SignOnly};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid secret key: {0}")]
    InvalidSecretKey(String),
}

/// Holds a secret key and produces signatures the ledger accepts
pub struct SpendSigner {
    secp: Secp256k1<SignOnly>,
    secret: SecretKey,
    address: Address,
}

impl SpendSigner {
    /// Generate a fresh random key
    pub fn generate() -> Self {
        let secret = SecretKey::new(&mut rand::thread_rng());
        Self::from_secret(secret)
    }

    /// Load a key from 32 raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let secret =
            SecretKey::from_slice(bytes).map_err(|e| KeyError::InvalidSecretKey(e.to_string()))?;
        Ok(Self::from_secret(secret))
    }

    /// Load a key from hex, with or without the `0x` prefix
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(trimmed).map_err(|e| KeyError::InvalidSecretKey(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    fn from_secret(secret: SecretKey) -> Self {
        let secp = Secp256k1::signing_only();
        let public_key = PublicKey::from_secret_key(&secp, &secret);
        Self {
            secp,
            secret,
            address: address_of(&public_key),
        }
    }

    /// Address that signatures from this key recover to
    pub fn address(&self) -> Address {
        self.address
    }

    /// Secret key bytes (for backup)
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret.secret_bytes()
    }

    /// Sign an arbitrary 32-byte hash
    pub fn sign_hash(&self, hash: &Hash256) -> SpendSignature {
        let message = Message::from_digest(*hash.as_bytes());
        let (recovery_id, compact) = self
            .secp
            .sign_ecdsa_recoverable(&message, &self.secret)
            .serialize_compact();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&compact[..32]);
        s.copy_from_slice(&compact[32..]);
        SpendSignature::from_recovered(recovery_id.to_i32() as u8, r, s)
    }

    /// Authorize moving `value` from `unit_id` to `recipient`
    pub fn sign_spend(&self, unit_id: &UnitId, recipient: &Address, value: u64) -> SpendSignature {
        self.sign_hash(&spend_message(unit_id, recipient, value))
    }

    /// Authorize merging `id1` and `id2`
    pub fn sign_merge(&self, id1: &UnitId, id2: &UnitId) -> SpendSignature {
        self.sign_hash(&merge_message(id1, id2))
    }
}
