//! Core Bitcoin types for the signing engine.
//!
//! Provides address classification and scriptPubKey derivation for the four
//! supported families (P2PKH, P2SH, P2WPKH, P2TR), low-level script
//! encoding helpers, the UTXO model, and randomized coin selection.

pub mod address;
pub mod config;
pub mod encode;
pub mod error;
pub mod key;
pub mod network;
pub mod utxo;

pub use address::{AddressKind, BitcoinAddress};
pub use config::{BitcoinConfig, FeeEstimationSettings};
pub use error::BtcError;
pub use network::BtcNetwork;
pub use utxo::{InputSelector, SelectionStrategy, UnspentOutput, UtxoId};
