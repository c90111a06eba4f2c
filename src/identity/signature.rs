use crate::identity::address::{decode_fixed, HexError};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Offset Ethereum-style signers add to the recovery id
const LEGACY_V_OFFSET: u8 = 27;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    #[error("Invalid signature component {component}: {source}")]
    InvalidComponent {
        component: &'static str,
        source: HexError,
    },

    #[error("Signature recovery failed: {0}")]
    RecoveryFailed(String),
}

/// Recoverable ECDSA signature over a spend or merge message, as the
/// `(v, r, s)` triple wallets hand over.
///
/// `v` is kept normalised to `0` or `1`.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendSignature {
    v: u8,
    r: [u8; 32],
    s: [u8; 32],
}

impl SpendSignature {
    /// Build from raw parts. `v` may be `0`/`1` or `27`/`28`.
    pub fn new(v: u8, r: [u8; 32], s: [u8; 32]) -> Result<Self, SignatureError> {
        let v = match v {
            0 | 1 => v,
            27 | 28 => v - LEGACY_V_OFFSET,
            other => return Err(SignatureError::InvalidRecoveryId(other)),
        };
        Ok(Self { v, r, s })
    }

    /// Build from a recovery id the curve library produced itself
    pub(crate) fn from_recovered(v: u8, r: [u8; 32], s: [u8; 32]) -> Self {
        Self { v, r, s }
    }

    /// Build from hex-encoded `r` and `s`
    pub fn from_hex(v: u8, r: &str, s: &str) -> Result<Self, SignatureError> {
        let r = decode_fixed::<32>(r)
            .map_err(|source| SignatureError::InvalidComponent { component: "r", source })?;
        let s = decode_fixed::<32>(s)
            .map_err(|source| SignatureError::InvalidComponent { component: "s", source })?;
        Self::new(v, r, s)
    }

    /// Recovery id, `0` or `1`
    pub fn v(&self) -> u8 {
        self.v
    }

    pub fn r(&self) -> &[u8; 32] {
        &self.r
    }

    pub fn s(&self) -> &[u8; 32] {
        &self.s
    }

    /// `r || s`, the compact form the curve library expects
    pub fn compact(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.r);
        out[32..].copy_from_slice(&self.s);
        out
    }
}

impl fmt::Debug for SpendSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpendSignature")
            .field("v", &self.v)
            .field("r", &hex::encode(self.r))
            .field("s", &hex::encode(self.s))
            .finish()
    }
}
