use thiserror::Error;

/// Bitcoin signing-engine errors.
#[derive(Debug, Error)]
pub enum BtcError {
    #[error("unrecognized address: {0}")]
    UnrecognizedAddress(String),

    #[error("unsupported address type: expected {expected}, got {got}")]
    UnsupportedAddressType {
        expected: &'static str,
        got: &'static str,
    },

    #[error("insufficient funds: needed {needed_sat} sat, but only {available_sat} sat available")]
    InsufficientFunds { needed_sat: u64, available_sat: u64 },

    #[error("malformed utxo id: {0}")]
    MalformedUtxoId(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("transaction build error: {0}")]
    TransactionBuild(String),
}
