//! Bitcoin transaction and proof-of-ownership signing engine.
//!
//! Builds BIP-322 virtual transactions to prove address ownership over an
//! arbitrary message, computes the segwit (BIP-143-style) and taproot
//! (BIP-341-style) signing digests, produces ECDSA and tweaked-key Schnorr
//! witness blobs, and constructs/signs real P2WPKH deposit transactions.

pub mod bip322;
pub mod deposit;
pub mod sighash;
pub mod signature;
pub mod signer;

pub use deposit::{build_and_sign_deposit_tx, estimate_deposit_fee, DepositTransaction};
pub use sighash::{SIGHASH_ALL, SIGHASH_DEFAULT};
pub use signature::{BitcoinSignature, WitnessBlob};
pub use signer::{sign_der_prehashed, sign_message, verify_message};
