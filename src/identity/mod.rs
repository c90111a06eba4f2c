// Identity module - addresses, unit ids, signatures
// Derivation of content-addressed ids and secp256k1 signer recovery

mod address;
pub mod derive;
mod signature;
mod signer;
mod verifier;

pub use address::{Address, Hash256, HexError, TxHash, UnitId};
pub use derive::{derive_id, derive_merge_id, merge_message, spend_message};
pub use signature::{SignatureError, SpendSignature};
pub use signer::{KeyError, SpendSigner};
pub use verifier::{address_of, AuthorizationVerifier};
